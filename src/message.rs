//! Outbound message with builder pattern.

use serde::{Deserialize, Serialize};

use crate::address::{Address, ToAddress};
use crate::attachment::Attachment;

/// A template to render into the message body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateRequest {
    /// Template path or name, passed to the renderer as-is
    pub identifier: String,
    /// Data bound during rendering. Required when the template is used.
    pub data: Option<serde_json::Value>,
}

impl TemplateRequest {
    pub fn new(identifier: impl Into<String>, data: impl Into<serde_json::Value>) -> Self {
        Self {
            identifier: identifier.into(),
            data: Some(data.into()),
        }
    }

    /// A request with nothing bound. Composing it fails with
    /// [`MailError::MissingTemplateData`](crate::MailError::MissingTemplateData).
    pub fn without_data(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            data: None,
        }
    }

    /// An empty identifier means "no template".
    pub fn is_active(&self) -> bool {
        !self.identifier.is_empty()
    }
}

/// An outbound email message.
///
/// ```
/// use courier::{Attachment, EmailMessage};
///
/// let message = EmailMessage::new()
///     .from(("Ada", "ada@example.com"))
///     .to("bob@example.com")
///     .cc("carol@example.com")
///     .subject("Hi")
///     .body("Hello Bob")
///     .attachment(Attachment::new("report.txt", "/srv/report.txt"));
///
/// assert!(message.is_valid());
/// assert_eq!(message.all_recipients().len(), 2);
/// ```
///
/// The body is either set literally with [`body`](Self::body) or produced
/// at compose time from a [`template`](Self::template), which replaces it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmailMessage {
    /// Sender; falls back to the account identity when unset
    pub from: Option<Address>,
    /// Display name applied to whichever sender is used
    pub sender_name: Option<String>,
    /// Primary recipients
    pub to: Vec<Address>,
    /// Carbon copy recipients
    pub cc: Vec<Address>,
    /// Blind carbon copy recipients
    pub bcc: Vec<Address>,
    /// Reply-to address; defaults to the sender
    pub reply_to: Option<Address>,
    /// Subject line
    pub subject: String,
    /// Literal body bytes
    pub body: Vec<u8>,
    /// Attachments, in the order they will appear
    pub attachments: Vec<Attachment>,
    /// Optional template that produces the body
    pub template: Option<TemplateRequest>,
    /// Extra headers, applied after the standard ones
    pub headers: Vec<(String, String)>,
}

impl EmailMessage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sender address.
    ///
    /// Accepts `"ada@example.com"`, `"Ada <ada@example.com>"`,
    /// `("Ada", "ada@example.com")` or any [`ToAddress`] type.
    pub fn from(mut self, addr: impl ToAddress) -> Self {
        self.from = Some(addr.to_address());
        self
    }

    /// Set the sender's display name.
    pub fn sender_name(mut self, name: impl Into<String>) -> Self {
        self.sender_name = Some(name.into());
        self
    }

    /// Add a recipient.
    pub fn to(mut self, addr: impl ToAddress) -> Self {
        self.to.push(addr.to_address());
        self
    }

    /// Replace all recipients.
    pub fn put_to(mut self, addrs: Vec<Address>) -> Self {
        self.to = addrs;
        self
    }

    /// Add a CC recipient.
    pub fn cc(mut self, addr: impl ToAddress) -> Self {
        self.cc.push(addr.to_address());
        self
    }

    /// Add a BCC recipient.
    pub fn bcc(mut self, addr: impl ToAddress) -> Self {
        self.bcc.push(addr.to_address());
        self
    }

    /// Set the reply-to address.
    pub fn reply_to(mut self, addr: impl ToAddress) -> Self {
        self.reply_to = Some(addr.to_address());
        self
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    /// Set the literal body (plain text or HTML).
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Render the body from a template with the given data.
    ///
    /// ```rust,ignore
    /// EmailMessage::new()
    ///     .template("emails/welcome.html", serde_json::json!({ "name": "Ada" }))
    /// ```
    pub fn template(
        mut self,
        identifier: impl Into<String>,
        data: impl Into<serde_json::Value>,
    ) -> Self {
        self.template = Some(TemplateRequest::new(identifier, data));
        self
    }

    pub fn template_request(mut self, request: TemplateRequest) -> Self {
        self.template = Some(request);
        self
    }

    /// Add or replace a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        match self
            .headers
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&name))
        {
            Some(entry) => entry.1 = value,
            None => self.headers.push((name, value)),
        }
        self
    }

    /// Has a sender and at least one recipient.
    pub fn is_valid(&self) -> bool {
        self.from.as_ref().is_some_and(|f| !f.email.is_empty())
            && self.to.iter().any(|a| !a.email.trim().is_empty())
    }

    /// Whether a template will produce the body.
    pub fn uses_template(&self) -> bool {
        self.template.as_ref().is_some_and(TemplateRequest::is_active)
    }

    /// All recipients (to + cc + bcc).
    pub fn all_recipients(&self) -> Vec<&Address> {
        self.to
            .iter()
            .chain(self.cc.iter())
            .chain(self.bcc.iter())
            .collect()
    }

    pub fn has_attachments(&self) -> bool {
        !self.attachments.is_empty()
    }
}
