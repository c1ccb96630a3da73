//! Ordered header tables and top-level header assembly.

use chrono::{DateTime, Utc};

/// An ordered header table.
///
/// Insertion order is transmission order. Setting a name that is already
/// present (compared case-insensitively) replaces the value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderTable {
    entries: Vec<(String, String)>,
}

impl HeaderTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a header, overwriting any existing value for the same name.
    ///
    /// CR and LF in the value are replaced with spaces so a value can never
    /// start a new header line. The name keeps only printable ASCII other
    /// than `:`; a name with nothing left is ignored.
    pub fn set(&mut self, name: impl Into<String>, value: impl AsRef<str>) {
        let name = clean_name(name.into());
        if name.is_empty() {
            tracing::warn!("Ignoring header with an empty or unprintable name");
            return;
        }
        let value = sanitize(value.as_ref());
        match self
            .entries
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&name))
        {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Get a header value by name (case-insensitive).
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Iterate in transmission order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append `Name: value\r\n` lines to `out`.
    pub fn write_to(&self, out: &mut Vec<u8>) {
        for (name, value) in &self.entries {
            out.extend_from_slice(name.as_bytes());
            out.extend_from_slice(b": ");
            out.extend_from_slice(value.as_bytes());
            out.extend_from_slice(b"\r\n");
        }
    }
}

fn sanitize(value: &str) -> String {
    value.replace(['\r', '\n'], " ")
}

/// Field names are printable ASCII without `:` (RFC 5322 `ftext`).
fn clean_name(name: String) -> String {
    if name.bytes().all(|b| b.is_ascii_graphic() && b != b':') {
        return name;
    }
    name.chars()
        .filter(|c| c.is_ascii_graphic() && *c != ':')
        .collect()
}

/// Headers that describe the multipart structure itself. Caller-supplied
/// headers never replace them.
const STRUCTURAL: &[&str] = &["MIME-Version", "Content-Type", "Content-Transfer-Encoding"];

fn is_structural(name: &str) -> bool {
    STRUCTURAL.iter().any(|s| s.eq_ignore_ascii_case(name.trim()))
}

/// `X-Mailer` label for a sending host.
///
/// Well-known providers get a friendly label; anything else gets the crate
/// name. A provider matches on its bare domain or any subdomain of it.
pub fn mailer_label(host: &str) -> &'static str {
    const KNOWN: &[(&str, &str)] = &[
        ("gmail.com", "Google Gmail"),
        ("yahoo.com", "Yahoo Mail"),
        ("outlook.com", "Microsoft Outlook"),
    ];

    let host = host.trim().trim_end_matches('.').to_ascii_lowercase();
    KNOWN
        .iter()
        .find(|(domain, _)| host == *domain || host.ends_with(&format!(".{}", domain)))
        .map(|(_, label)| *label)
        .unwrap_or("Courier")
}

/// Build a `Message-ID` from the current time and the sending host.
pub fn message_id(now: DateTime<Utc>, host: &str) -> String {
    let host = if host.is_empty() { "localhost" } else { host };
    format!(
        "<{}.{}.{}@{}>",
        now.timestamp(),
        now.timestamp_subsec_nanos(),
        uuid::Uuid::new_v4().simple(),
        host
    )
}

/// Everything the assembler needs besides the message itself.
#[derive(Debug, Clone)]
pub struct HeaderContext<'a> {
    /// Multipart boundary referenced by `Content-Type`.
    pub boundary: &'a str,
    /// Sending host, for `X-Mailer` and `Message-ID`.
    pub host: &'a str,
    /// Time of composition, for `Date` and `Message-ID`.
    pub now: DateTime<Utc>,
}

/// Header values already resolved by the composer.
#[derive(Debug, Clone, Default)]
pub struct HeaderFields<'a> {
    /// Formatted sender (`Name <address>` or bare).
    pub from: &'a str,
    pub to: Vec<String>,
    pub subject: &'a str,
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
    pub reply_to: Option<String>,
    /// Caller-supplied headers, applied last.
    pub extra: &'a [(String, String)],
}

/// Populate the top-level headers in transmission order.
///
/// `Reply-To` defaults to `From` and is replaced in place by an explicit
/// reply address. `Cc` and `Bcc` are only written when non-empty. Extra
/// headers overwrite same-named headers or are appended, except the
/// structural `MIME-Version`, `Content-Type` and `Content-Transfer-Encoding`.
pub fn assemble_headers(fields: &HeaderFields<'_>, ctx: &HeaderContext<'_>) -> HeaderTable {
    let mut headers = HeaderTable::new();

    headers.set("MIME-Version", "1.0");
    headers.set("From", fields.from);
    headers.set("To", fields.to.join(", "));
    headers.set("Subject", fields.subject);
    headers.set(
        "Content-Type",
        format!("multipart/mixed; boundary=\"{}\"", ctx.boundary),
    );
    headers.set("Content-Transfer-Encoding", "8bit");
    headers.set("X-Mailer", mailer_label(ctx.host));
    headers.set("Date", ctx.now.to_rfc2822());
    headers.set("Message-ID", message_id(ctx.now, ctx.host));
    headers.set("List-Id", fields.from);
    headers.set("Reply-To", fields.from);

    if !fields.cc.is_empty() {
        headers.set("Cc", fields.cc.join(", "));
    }
    if !fields.bcc.is_empty() {
        headers.set("Bcc", fields.bcc.join(", "));
    }
    if let Some(reply_to) = fields.reply_to.as_deref().filter(|r| !r.is_empty()) {
        headers.set("Reply-To", reply_to);
    }

    for (name, value) in fields.extra {
        if is_structural(name) {
            tracing::warn!(header = %name, "Ignoring override of a structural header");
            continue;
        }
        headers.set(name.as_str(), value);
    }

    headers
}
