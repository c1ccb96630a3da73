//! Message composition: template rendering, headers, body and attachment
//! parts, serialized into one `multipart/mixed` payload.
//!
//! All state for a message (header table, boundary, output buffer) lives
//! inside a single [`Composer::compose`] call, so one composer can be shared
//! by any number of concurrent callers.
//!
//! # Example
//!
//! ```
//! use courier::{Composer, EmailMessage, FixedBoundary};
//!
//! let composer = Composer::new("smtp.example.com").boundary_source(FixedBoundary::new("b1"));
//! let message = EmailMessage::new()
//!     .from("Ada <ada@example.com>")
//!     .to("bob@example.com")
//!     .subject("Hi")
//!     .body("Hello Bob");
//!
//! let composed = composer.compose(&message).unwrap();
//! let text = String::from_utf8(composed.into_bytes()).unwrap();
//! assert!(text.contains("From: Ada <ada@example.com>\r\n"));
//! assert!(text.ends_with("\r\n--b1--\r\n"));
//! ```

use std::borrow::Cow;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::address::{extract_bare_address, Address};
use crate::attachment::{encode_attachment, AttachmentEncoding, AttachmentSource, FsSource};
use crate::boundary::{BoundarySource, RandomBoundary};
use crate::error::MailError;
use crate::header::{assemble_headers, HeaderContext, HeaderFields, HeaderTable};
use crate::message::EmailMessage;
use crate::multipart::{MultipartPayload, Part};
use crate::sniff::sniff;
use crate::template::{default_renderer, TemplateRenderer};

/// How many boundaries to try before giving up on finding one that does
/// not occur in the content.
const BOUNDARY_ATTEMPTS: usize = 8;

/// Bare addresses used by the transport for routing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Envelope sender (MAIL FROM)
    pub from: String,
    /// Envelope recipients (RCPT TO): to, cc and bcc, without duplicates
    pub recipients: Vec<String>,
}

/// A fully composed message, ready for a transport.
#[derive(Debug, Clone)]
pub struct ComposedMessage {
    pub envelope: Envelope,
    /// Value of the `Message-ID` header
    pub message_id: String,
    /// Boundary separating the parts
    pub boundary: String,
    bytes: Vec<u8>,
}

impl ComposedMessage {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Builds the wire form of an [`EmailMessage`].
///
/// Collaborators (template renderer, attachment source, boundary source)
/// are shared handles; the composer itself holds no per-message state.
#[derive(Clone)]
pub struct Composer {
    host: String,
    account: Option<Address>,
    renderer: Arc<dyn TemplateRenderer>,
    files: Arc<dyn AttachmentSource>,
    boundaries: Arc<dyn BoundarySource>,
    encoding: AttachmentEncoding,
}

impl std::fmt::Debug for Composer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Composer")
            .field("host", &self.host)
            .field("account", &self.account)
            .field("encoding", &self.encoding)
            .finish_non_exhaustive()
    }
}

impl Composer {
    /// Create a composer for messages sent through `host`.
    ///
    /// Defaults: no account identity, the default template renderer,
    /// filesystem attachments, random boundaries, base64 attachments.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            account: None,
            renderer: default_renderer(),
            files: Arc::new(FsSource),
            boundaries: Arc::new(RandomBoundary),
            encoding: AttachmentEncoding::default(),
        }
    }

    /// Sender used when a message has no From.
    pub fn account(mut self, account: impl Into<Option<Address>>) -> Self {
        self.account = account.into();
        self
    }

    pub fn renderer(mut self, renderer: impl TemplateRenderer + 'static) -> Self {
        self.renderer = Arc::new(renderer);
        self
    }

    pub fn renderer_arc(mut self, renderer: Arc<dyn TemplateRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn attachment_source(mut self, source: impl AttachmentSource + 'static) -> Self {
        self.files = Arc::new(source);
        self
    }

    pub fn boundary_source(mut self, source: impl BoundarySource + 'static) -> Self {
        self.boundaries = Arc::new(source);
        self
    }

    pub fn attachment_encoding(mut self, encoding: AttachmentEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn account_identity(&self) -> Option<&Address> {
        self.account.as_ref()
    }

    /// Compose `message` at the current time.
    pub fn compose(&self, message: &EmailMessage) -> Result<ComposedMessage, MailError> {
        self.compose_at(message, Utc::now())
    }

    /// Compose `message` as of `now` (used for `Date` and `Message-ID`).
    ///
    /// All-or-nothing: any failure returns an error and no bytes.
    pub fn compose_at(
        &self,
        message: &EmailMessage,
        now: DateTime<Utc>,
    ) -> Result<ComposedMessage, MailError> {
        let mut sender = self.resolve_sender(message)?;
        if !message.to.iter().any(|a| !a.email.trim().is_empty()) {
            return Err(MailError::MissingRecipients);
        }

        let (body, used_template) = self.render_body(message)?;

        if let Some(name) = message.sender_name.as_deref().filter(|n| !n.is_empty()) {
            sender.name = Some(name.to_string());
        }
        let from = sender.formatted();

        let mut payload = MultipartPayload::new(String::new());
        payload.push(body_part(&body, used_template));
        for attachment in &message.attachments {
            payload.push(encode_attachment(attachment, self.files.as_ref(), self.encoding)?);
        }
        self.pick_boundary(&mut payload)?;
        let boundary = payload.boundary().to_string();

        let fields = HeaderFields {
            from: &from,
            to: message.to.iter().map(Address::formatted).collect(),
            subject: &message.subject,
            cc: message.cc.iter().map(Address::formatted).collect(),
            bcc: message.bcc.iter().map(Address::formatted).collect(),
            reply_to: message.reply_to.as_ref().map(Address::formatted),
            extra: &message.headers,
        };
        let ctx = HeaderContext {
            boundary: &boundary,
            host: &self.host,
            now,
        };
        let headers = assemble_headers(&fields, &ctx);
        let message_id = headers.get("Message-ID").unwrap_or_default().to_string();

        let mut bytes = Vec::new();
        headers.write_to(&mut bytes);
        bytes.extend_from_slice(b"\r\n");
        payload.write_to(&mut bytes);

        let envelope = envelope_for(&from, message);

        tracing::debug!(
            parts = payload.parts().len(),
            size = bytes.len(),
            used_template,
            message_id = %message_id,
            "Composed message"
        );

        Ok(ComposedMessage {
            envelope,
            message_id,
            boundary,
            bytes,
        })
    }

    fn resolve_sender(&self, message: &EmailMessage) -> Result<Address, MailError> {
        message
            .from
            .as_ref()
            .filter(|a| !a.email.is_empty())
            .or_else(|| self.account.as_ref().filter(|a| !a.email.is_empty()))
            .cloned()
            .ok_or(MailError::MissingSender)
    }

    /// Body bytes and whether they came from a template.
    fn render_body<'m>(&self, message: &'m EmailMessage) -> Result<(Cow<'m, [u8]>, bool), MailError> {
        let Some(template) = message.template.as_ref().filter(|t| t.is_active()) else {
            return Ok((Cow::Borrowed(message.body.as_slice()), false));
        };

        let data = template
            .data
            .as_ref()
            .filter(|d| !d.is_null())
            .ok_or_else(|| MailError::MissingTemplateData(template.identifier.clone()))?;

        tracing::debug!(template = %template.identifier, "Rendering template body");
        let rendered = self.renderer.render(&template.identifier, data)?;
        Ok((Cow::Owned(rendered), true))
    }

    fn pick_boundary(&self, payload: &mut MultipartPayload) -> Result<(), MailError> {
        for attempt in 1..=BOUNDARY_ATTEMPTS {
            payload.set_boundary(self.boundaries.generate());
            if payload.boundary_is_distinct() {
                return Ok(());
            }
            tracing::warn!(attempt, "Boundary occurs in message content, regenerating");
        }
        Err(MailError::BoundaryCollision)
    }
}

fn body_part(body: &[u8], used_template: bool) -> Part {
    let mut headers = HeaderTable::new();
    headers.set("Content-Type", sniff(body, used_template).header_value());
    Part::new(headers, body.to_vec())
}

fn envelope_for(from: &str, message: &EmailMessage) -> Envelope {
    let mut recipients: Vec<String> = Vec::new();
    for addr in message.all_recipients() {
        let bare = addr.bare();
        if !bare.is_empty() && !recipients.contains(&bare) {
            recipients.push(bare);
        }
    }
    Envelope {
        from: extract_bare_address(from),
        recipients,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachment::Attachment;
    use crate::boundary::FixedBoundary;
    use serde_json::json;
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn composer() -> Composer {
        Composer::new("smtp.example.com").boundary_source(FixedBoundary::new("BOUNDARY"))
    }

    fn message() -> EmailMessage {
        EmailMessage::new()
            .from("Ada <ada@example.com>")
            .to("bob@example.com")
            .subject("Hi")
            .body("Hello Bob")
    }

    fn text(composed: ComposedMessage) -> String {
        String::from_utf8(composed.into_bytes()).unwrap()
    }

    #[test]
    fn test_missing_sender() {
        let message = EmailMessage::new().to("bob@example.com").body("x");
        assert_eq!(composer().compose(&message).unwrap_err(), MailError::MissingSender);
    }

    #[test]
    fn test_sender_from_account() {
        let composer = composer().account(Address::new("noreply@example.com"));
        let message = EmailMessage::new().to("bob@example.com").body("x");
        let composed = composer.compose(&message).unwrap();
        assert_eq!(composed.envelope.from, "noreply@example.com");
        assert!(text(composed).contains("From: noreply@example.com\r\n"));
    }

    #[test]
    fn test_sender_name_applies_to_account() {
        let composer = composer().account(Address::new("noreply@example.com"));
        let message = EmailMessage::new()
            .sender_name("Example App")
            .to("bob@example.com");
        let out = text(composer.compose(&message).unwrap());
        assert!(out.contains("From: Example App <noreply@example.com>\r\n"));
    }

    #[test]
    fn test_missing_recipients() {
        let message = EmailMessage::new().from("ada@example.com").body("x");
        assert_eq!(composer().compose(&message).unwrap_err(), MailError::MissingRecipients);
    }

    #[test]
    fn test_blank_recipients_are_missing() {
        let message = EmailMessage::new()
            .from("ada@example.com")
            .to("")
            .to(Address::new("  "))
            .body("x");
        assert_eq!(composer().compose(&message).unwrap_err(), MailError::MissingRecipients);
    }

    #[test]
    fn test_null_template_data_is_missing() {
        let composer = composer().renderer(|_: &str, _: &serde_json::Value| -> Result<Vec<u8>, MailError> {
            Ok(b"rendered null".to_vec())
        });
        let message = message().template("welcome.txt", serde_json::Value::Null);
        assert_eq!(
            composer.compose(&message).unwrap_err(),
            MailError::MissingTemplateData("welcome.txt".into())
        );
    }

    #[test]
    fn test_missing_template_data_skips_render() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let composer = composer().renderer(move |_: &str, _: &serde_json::Value| -> Result<Vec<u8>, MailError> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        });
        let message = message().template_request(crate::message::TemplateRequest::without_data("welcome.html"));

        let err = composer.compose(&message).unwrap_err();
        assert_eq!(err, MailError::MissingTemplateData("welcome.html".into()));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_render_error_propagates_unchanged() {
        let composer = composer().renderer(|id: &str, _: &serde_json::Value| -> Result<Vec<u8>, MailError> {
            Err(MailError::render(id, "boom"))
        });
        let message = message().template("welcome.html", json!({"name": "Ada"}));
        assert_eq!(
            composer.compose(&message).unwrap_err(),
            MailError::render("welcome.html", "boom")
        );
    }

    #[test]
    fn test_template_replaces_body() {
        let composer = composer().renderer(|_: &str, data: &serde_json::Value| -> Result<Vec<u8>, MailError> {
            Ok(format!("<html><body>Hi {}</body></html>", data["name"].as_str().unwrap_or_default()).into_bytes())
        });
        let message = message().template("welcome.html", json!({"name": "Ada"}));
        let out = text(composer.compose(&message).unwrap());
        assert!(out.contains("Content-Type: text/html; charset=utf-8\r\n\r\n<html><body>Hi Ada</body></html>\r\n--BOUNDARY--"));
        assert!(!out.contains("Hello Bob"));
    }

    #[test]
    fn test_attachment_failure_aborts() {
        let composer = composer()
            .attachment_source(|path: &str| -> io::Result<Vec<u8>> {
                Err(io::Error::new(io::ErrorKind::NotFound, format!("{path} not found")))
            });
        let message = message().attachment(Attachment::new("report.txt", "missing/report.txt"));
        match composer.compose(&message).unwrap_err() {
            MailError::AttachmentReadFailed { path, .. } => assert_eq!(path, "missing/report.txt"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_boundary_collision_regenerates() {
        let calls = AtomicUsize::new(0);
        let composer = composer().boundary_source(move || {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                "Bob".to_string()
            } else {
                "fresh".to_string()
            }
        });
        let composed = composer.compose(&message()).unwrap();
        assert_eq!(composed.boundary, "fresh");
    }

    #[test]
    fn test_boundary_collision_gives_up() {
        let composer = composer().boundary_source(FixedBoundary::new("Hello"));
        assert_eq!(
            composer.compose(&message()).unwrap_err(),
            MailError::BoundaryCollision
        );
    }

    #[test]
    fn test_envelope_includes_cc_and_bcc_once() {
        let message = message()
            .to("Carol <carol@example.com>")
            .cc("carol@example.com")
            .bcc("dave@example.com");
        let composed = composer().compose(&message).unwrap();
        assert_eq!(composed.envelope.from, "ada@example.com");
        assert_eq!(
            composed.envelope.recipients,
            vec!["bob@example.com", "carol@example.com", "dave@example.com"]
        );
    }

    #[test]
    fn test_message_id_matches_header() {
        let composed = composer().compose(&message()).unwrap();
        let id = composed.message_id.clone();
        assert!(id.ends_with("@smtp.example.com>"));
        assert!(text(composed).contains(&format!("Message-ID: {id}\r\n")));
    }
}
