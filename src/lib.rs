//! # Courier
//!
//! Compose multipart emails (text or HTML body, optionally rendered from a
//! template, plus file attachments) and hand them to a pluggable transport.
//!
//! ## Quick Start
//!
//! Set environment variables:
//! ```bash
//! SMTP_HOST=smtp.example.com
//! SMTP_USERNAME=noreply@example.com
//! SMTP_PASSWORD=secret
//! EMAIL_FROM_NAME=My App
//! ```
//!
//! Send from anywhere:
//! ```rust,ignore
//! use courier::{send_mail, Attachment, EmailMessage};
//!
//! let message = EmailMessage::new()
//!     .to("user@example.com")
//!     .subject("Your report")
//!     .template("emails/report.html", serde_json::json!({ "name": "Ada" }))
//!     .attachment(Attachment::from_path("/srv/reports/q3.pdf"));
//!
//! send_mail(&message).await?;
//! ```
//!
//! ## Explicit Mailer
//!
//! ```rust,ignore
//! use courier::{Mailer, MailerConfig};
//!
//! let config = MailerConfig::new("smtp.example.com", 587).credentials("user", "pass");
//! let mailer = Mailer::smtp(&config)?;
//! mailer.send_mail(&message).await?;
//! ```
//!
//! ## Wire Format
//!
//! Every message is `multipart/mixed`: the body is the first part
//! (`text/plain` or `text/html`, detected from the content), followed by one
//! part per attachment, base64-encoded by default.
//!
//! ## Environment Variables
//!
//! | Variable | Description |
//! |----------|-------------|
//! | `EMAIL_TRANSPORT` | `smtp` (default), `logger`, `logger_full`, `local` |
//! | `SMTP_HOST` | SMTP server host |
//! | `SMTP_PORT` | SMTP server port (default: 587) |
//! | `SMTP_USERNAME` | SMTP username |
//! | `SMTP_PASSWORD` | SMTP password |
//! | `SMTP_SECURE` | `true` for implicit TLS |
//! | `EMAIL_FROM` | Default sender email |
//! | `EMAIL_FROM_NAME` | Default sender name |
//!
//! ## Feature Flags
//!
//! - `smtp` - SMTP transport via lettre
//! - `templates` (default) - file templates rendered with minijinja

/// The version of the courier crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

mod address;
mod attachment;
mod boundary;
mod compose;
mod config;
mod error;
mod header;
mod mailer;
mod message;
mod multipart;
mod sniff;
mod template;
mod transport;

pub mod providers;

use parking_lot::RwLock;
use std::env;
use std::sync::{Arc, OnceLock};

// Re-exports
pub use address::{extract_bare_address, format_mailbox, Address, ToAddress};
pub use attachment::{encode_attachment, Attachment, AttachmentEncoding, AttachmentSource, FsSource};
pub use boundary::{BoundarySource, FixedBoundary, RandomBoundary};
pub use compose::{ComposedMessage, Composer, Envelope};
pub use config::MailerConfig;
pub use error::MailError;
pub use header::{assemble_headers, mailer_label, HeaderContext, HeaderFields, HeaderTable};
pub use mailer::Mailer;
pub use message::{EmailMessage, TemplateRequest};
pub use multipart::{MultipartPayload, Part};
pub use sniff::{sniff, BodyType};
pub use template::{default_renderer, NoTemplates, TemplateRenderer};
pub use transport::{DeliveryResult, Transport};

#[cfg(feature = "templates")]
pub use template::{FileTemplateRenderer, InlineTemplates};

// ============================================================================
// Global Mailer Configuration
// ============================================================================

/// Global mailer - swappable for testing
static MAILER: RwLock<Option<Arc<Mailer>>> = RwLock::new(None);

/// Transport shared by every mailer created with `EMAIL_TRANSPORT=local`.
static LOCAL_TRANSPORT: OnceLock<providers::LocalTransport> = OnceLock::new();

/// The in-memory transport used when `EMAIL_TRANSPORT=local`.
///
/// Returns `None` until the global mailer has been created with it.
pub fn local_transport() -> Option<providers::LocalTransport> {
    LOCAL_TRANSPORT.get().cloned()
}

fn transport_kind() -> String {
    env::var("EMAIL_TRANSPORT")
        .map(|t| t.to_lowercase())
        .unwrap_or_else(|_| "smtp".to_string())
}

/// Settings for the non-network transports: SMTP settings when `SMTP_HOST`
/// is set, otherwise just the sender identity. Other SMTP settings errors
/// are returned.
fn dev_config() -> Result<MailerConfig, MailError> {
    dev_config_from(|key| env::var(key).ok())
}

fn dev_config_from<F>(lookup: F) -> Result<MailerConfig, MailError>
where
    F: Fn(&str) -> Option<String>,
{
    if lookup("SMTP_HOST").is_some_and(|h| !h.is_empty()) {
        return MailerConfig::from_lookup(lookup);
    }
    let mut config = MailerConfig::new("localhost", 25);
    config.from = lookup("EMAIL_FROM").filter(|s| !s.is_empty());
    config.from_name = lookup("EMAIL_FROM_NAME").filter(|s| !s.is_empty());
    Ok(config)
}

/// Create mailer from environment variables.
fn create_mailer_from_env() -> Result<Mailer, MailError> {
    let kind = transport_kind();
    tracing::debug!(transport = %kind, "Creating mailer from environment");

    match kind.as_str() {
        #[cfg(feature = "smtp")]
        "smtp" => Mailer::smtp(&MailerConfig::from_env()?),
        #[cfg(not(feature = "smtp"))]
        "smtp" => Err(MailError::Configuration(
            "EMAIL_TRANSPORT=smtp but 'smtp' feature is not enabled. \
            Add `features = [\"smtp\"]` to Cargo.toml"
                .into(),
        )),

        "local" => {
            let transport = LOCAL_TRANSPORT.get_or_init(providers::LocalTransport::new);
            Mailer::from_config(&dev_config()?, transport.clone())
        }
        "logger" => Mailer::from_config(&dev_config()?, providers::LoggerTransport::new()),
        "logger_full" => Mailer::from_config(&dev_config()?, providers::LoggerTransport::full()),

        other => Err(MailError::Configuration(format!(
            "Unknown EMAIL_TRANSPORT: {other}. Valid transports are: smtp, local, logger, logger_full"
        ))),
    }
}

/// Get or initialize the global mailer.
fn get_mailer() -> Result<Arc<Mailer>, MailError> {
    // Fast path: already configured
    if let Some(mailer) = MAILER.read().as_ref() {
        return Ok(Arc::clone(mailer));
    }

    // Slow path: need to configure
    let created = Arc::new(create_mailer_from_env()?);
    let mut guard = MAILER.write();

    // Double-check after acquiring write lock
    match guard.as_ref() {
        Some(existing) => Ok(Arc::clone(existing)),
        None => {
            *guard = Some(Arc::clone(&created));
            Ok(created)
        }
    }
}

/// Check if sending is configured: a mailer was set with [`configure`],
/// or the environment names a usable transport.
///
/// Logs a warning if `smtp` is selected but the feature flag is not enabled.
pub fn is_configured() -> bool {
    if MAILER.read().is_some() {
        return true;
    }
    match transport_kind().as_str() {
        #[cfg(feature = "smtp")]
        "smtp" => env::var("SMTP_HOST").is_ok_and(|h| !h.is_empty()),
        #[cfg(not(feature = "smtp"))]
        "smtp" => {
            tracing::warn!(
                "EMAIL_TRANSPORT=smtp but 'smtp' feature is not enabled. \
                Add `features = [\"smtp\"]` to Cargo.toml"
            );
            false
        }
        "local" | "logger" | "logger_full" => true,
        _ => false,
    }
}

/// Initialize the global mailer from environment variables.
///
/// Call this at startup to surface configuration errors early.
///
/// ```rust,ignore
/// // In main.rs
/// courier::init().ok(); // Ignore error if email not configured
/// ```
pub fn init() -> Result<(), MailError> {
    if !is_configured() {
        return Err(MailError::NotConfigured);
    }
    get_mailer().map(|_| ())
}

/// Compose and send a message with the global mailer.
///
/// Auto-configures from environment variables on first call.
/// Messages without a sender use `EMAIL_FROM` (or the SMTP username).
///
/// ```rust,ignore
/// use courier::{send_mail, EmailMessage};
///
/// let message = EmailMessage::new()
///     .to("user@example.com")
///     .subject("Hello!")
///     .body("Hi there");
///
/// send_mail(&message).await?;
/// ```
pub async fn send_mail(message: &EmailMessage) -> Result<DeliveryResult, MailError> {
    let mailer = get_mailer()?;
    mailer.send_mail(message).await
}

// ============================================================================
// Manual Configuration (for testing or custom setups)
// ============================================================================

/// Manually configure the global mailer.
///
/// Later calls replace the previous mailer.
///
/// ```rust,ignore
/// use courier::{configure, Composer, Mailer, providers::LocalTransport};
///
/// configure(Mailer::new(Composer::new("smtp.example.com"), LocalTransport::new()));
/// ```
pub fn configure(mailer: Mailer) {
    *MAILER.write() = Some(Arc::new(mailer));
}

/// Reset the global mailer (useful for tests).
///
/// After calling this, the next `send_mail()` will re-initialize from env vars.
pub fn reset() {
    *MAILER.write() = None;
}

/// Get the configured global mailer (if initialized).
pub fn mailer() -> Option<Arc<Mailer>> {
    MAILER.read().as_ref().cloned()
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::Address;
    pub use crate::Attachment;
    pub use crate::Composer;
    pub use crate::DeliveryResult;
    pub use crate::EmailMessage;
    pub use crate::MailError;
    pub use crate::Mailer;
    pub use crate::MailerConfig;
    pub use crate::ToAddress;
    pub use crate::Transport;
    pub use crate::{configure, is_configured, send_mail};
}
