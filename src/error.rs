//! Error types for courier.

use thiserror::Error;

/// Errors that can occur while composing or sending an email.
///
/// Every variant aborts the whole operation: no bytes are produced and
/// nothing is handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MailError {
    /// No sender on the message and no account identity configured.
    #[error("Missing sender: no From address on the message or the account")]
    MissingSender,

    /// The message has no primary recipients.
    #[error("Missing recipients: at least one To address is required")]
    MissingRecipients,

    /// A template was requested without any data to bind.
    #[error("Template data is required when using template '{0}'")]
    MissingTemplateData(String),

    /// The template-render capability failed.
    #[error("Failed to render template '{template}': {message}")]
    TemplateRenderFailed { template: String, message: String },

    /// The file-retrieval capability failed for an attachment.
    #[error("Failed to read attachment '{path}': {message}")]
    AttachmentReadFailed { path: String, message: String },

    /// No boundary token absent from every part body could be generated.
    #[error("Could not generate a multipart boundary distinct from the message content")]
    BoundaryCollision,

    /// The transport capability failed.
    #[error("Transport error: {0}")]
    TransportFailed(String),

    /// Invalid email address format.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Configuration error (missing env var, invalid value, etc.)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// No mailer has been configured.
    #[error("Mailer not configured")]
    NotConfigured,
}

impl MailError {
    /// Create a template render error.
    pub fn render(template: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TemplateRenderFailed {
            template: template.into(),
            message: message.into(),
        }
    }

    /// Create an attachment read error for the given path.
    pub fn attachment_read(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::AttachmentReadFailed {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Short name of the stage that failed, for logging.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::MissingSender | Self::MissingRecipients | Self::InvalidAddress(_) => "validate",
            Self::MissingTemplateData(_) | Self::TemplateRenderFailed { .. } => "render",
            Self::AttachmentReadFailed { .. } => "attachment",
            Self::BoundaryCollision => "compose",
            Self::TransportFailed(_) => "transport",
            Self::Configuration(_) | Self::NotConfigured => "config",
        }
    }
}

#[cfg(feature = "smtp")]
impl From<lettre::transport::smtp::Error> for MailError {
    fn from(err: lettre::transport::smtp::Error) -> Self {
        Self::TransportFailed(err.to_string())
    }
}

#[cfg(feature = "smtp")]
impl From<lettre::error::Error> for MailError {
    fn from(err: lettre::error::Error) -> Self {
        Self::TransportFailed(err.to_string())
    }
}

#[cfg(feature = "smtp")]
impl From<lettre::address::AddressError> for MailError {
    fn from(err: lettre::address::AddressError) -> Self {
        Self::InvalidAddress(err.to_string())
    }
}
