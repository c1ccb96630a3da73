//! Attachments and their encoding into multipart sections.

use base64::Engine;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::path::Path;

use crate::error::MailError;
use crate::header::HeaderTable;
use crate::multipart::Part;

/// Line length for base64 bodies (RFC 2045 §6.8).
const BASE64_LINE_LEN: usize = 76;

/// An email attachment: a display name plus a path resolved at compose time.
///
/// Nothing is read when the attachment is created. The bytes are fetched
/// through an [`AttachmentSource`] while the message is being composed.
///
/// ```
/// use courier::Attachment;
///
/// let report = Attachment::new("Q3 report.pdf", "/srv/reports/q3.pdf");
/// assert_eq!(report.name, "Q3 report.pdf");
/// assert_eq!(report.content_type(), "application/pdf");
///
/// let notes = Attachment::from_path("/tmp/notes.txt");
/// assert_eq!(notes.name, "notes.txt");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Filename shown to the recipient
    pub name: String,
    /// Source path handed to the [`AttachmentSource`]
    pub path: String,
    /// Explicit MIME type; guessed from the path extension when unset
    #[serde(default)]
    pub content_type: Option<String>,
}

impl Attachment {
    /// Create an attachment with an explicit display name.
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            content_type: None,
        }
    }

    /// Create an attachment named after the file at `path`.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("attachment")
            .to_string();
        Self::new(name, path.to_string_lossy())
    }

    /// Set the content type explicitly.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// The MIME type for this attachment.
    ///
    /// Uses the explicit type if set, otherwise guesses from the path's
    /// extension, falling back to `application/octet-stream`.
    pub fn content_type(&self) -> String {
        match &self.content_type {
            Some(ct) => ct.clone(),
            None => mime_guess::from_path(&self.path)
                .first_or_octet_stream()
                .to_string(),
        }
    }
}

/// File-retrieval capability: resolves an attachment path to bytes.
pub trait AttachmentSource: Send + Sync {
    fn read(&self, path: &str) -> std::io::Result<Vec<u8>>;
}

/// Reads attachments from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSource;

impl AttachmentSource for FsSource {
    fn read(&self, path: &str) -> std::io::Result<Vec<u8>> {
        std::fs::read(path)
    }
}

impl<F> AttachmentSource for F
where
    F: Fn(&str) -> std::io::Result<Vec<u8>> + Send + Sync,
{
    fn read(&self, path: &str) -> std::io::Result<Vec<u8>> {
        (self)(path)
    }
}

/// How attachment bytes are written into their part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AttachmentEncoding {
    /// Base64 with 76-column lines and `Content-Transfer-Encoding: base64`.
    #[default]
    Base64,
    /// Raw bytes appended verbatim, no transfer encoding header.
    ///
    /// Only safe for 7-bit text content; binary data may be mangled in transit.
    Raw,
}

/// Read an attachment and build its multipart section.
///
/// A read failure aborts with [`MailError::AttachmentReadFailed`] naming the
/// path; the attachment is never skipped.
pub fn encode_attachment(
    attachment: &Attachment,
    source: &dyn AttachmentSource,
    encoding: AttachmentEncoding,
) -> Result<Part, MailError> {
    let data = source
        .read(&attachment.path)
        .map_err(|e| MailError::attachment_read(&attachment.path, e.to_string()))?;

    tracing::debug!(
        name = %attachment.name,
        path = %attachment.path,
        size = data.len(),
        "Encoding attachment"
    );

    let mut headers = HeaderTable::new();
    headers.set("Content-Type", attachment.content_type());
    headers.set(
        "Content-Disposition",
        format!("attachment; filename=\"{}\"", quote_param(&attachment.name)),
    );

    let body = match encoding {
        AttachmentEncoding::Base64 => {
            headers.set("Content-Transfer-Encoding", "base64");
            base64_lines(&data)
        }
        AttachmentEncoding::Raw => data,
    };

    Ok(Part::new(headers, body))
}

/// Backslash-escape `"` and `\` for a quoted-string parameter value.
fn quote_param(value: &str) -> Cow<'_, str> {
    if !value.contains(['"', '\\']) {
        return Cow::Borrowed(value);
    }
    let mut out = String::with_capacity(value.len() + 2);
    for c in value.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    Cow::Owned(out)
}

/// Base64-encode and wrap at [`BASE64_LINE_LEN`] with CRLF between lines.
fn base64_lines(data: &[u8]) -> Vec<u8> {
    let encoded = base64::engine::general_purpose::STANDARD.encode(data);
    let mut out = Vec::with_capacity(encoded.len() + encoded.len() / BASE64_LINE_LEN * 2);
    for (i, line) in encoded.as_bytes().chunks(BASE64_LINE_LEN).enumerate() {
        if i > 0 {
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(line);
    }
    out
}
