//! SMTP transport using lettre.
//!
//! The composed bytes are handed to the server unchanged with
//! `send_raw`; lettre only handles the connection, TLS and authentication.
//!
//! # Example
//!
//! ```rust,ignore
//! use courier::providers::SmtpTransport;
//!
//! // With authentication
//! let transport = SmtpTransport::new("smtp.example.com", 587)
//!     .credentials("username", "password")
//!     .build()?;
//!
//! // Without authentication (local relay)
//! let transport = SmtpTransport::localhost();
//! ```

use async_trait::async_trait;
use lettre::{
    transport::smtp::authentication::Credentials, AsyncSmtpTransport, AsyncTransport,
    Tokio1Executor,
};

use crate::compose::Envelope;
use crate::config::MailerConfig;
use crate::error::MailError;
use crate::transport::Transport;

/// SMTP transport.
pub struct SmtpTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpTransport {
    /// Create a new SMTP transport builder with TLS (STARTTLS on port 587).
    pub fn new(host: &str, port: u16) -> SmtpBuilder {
        SmtpBuilder {
            host: host.to_string(),
            port,
            credentials: None,
            tls: TlsMode::StartTls,
        }
    }

    /// Create a new SMTP transport for localhost (no TLS, no auth).
    pub fn localhost() -> Self {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous("localhost")
            .port(25)
            .build();

        Self { transport }
    }

    /// Build from configuration: implicit TLS when `secure`, STARTTLS
    /// otherwise, credentials when a username is set.
    pub fn from_config(config: &MailerConfig) -> Result<Self, MailError> {
        let mut builder = Self::new(&config.host, config.port).tls(if config.secure {
            TlsMode::Tls
        } else {
            TlsMode::StartTls
        });
        if !config.username.is_empty() {
            builder = builder.credentials(&config.username, &config.password);
        }
        builder.build()
    }
}

#[async_trait]
impl Transport for SmtpTransport {
    async fn send(&self, envelope: &Envelope, payload: &[u8]) -> Result<(), MailError> {
        let envelope = to_lettre_envelope(envelope)?;

        let response = self.transport.send_raw(&envelope, payload).await?;
        tracing::debug!(
            code = %response.code(),
            "SMTP server accepted message"
        );
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "smtp"
    }
}

/// TLS mode for SMTP connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsMode {
    /// No TLS (dangerous, only for localhost)
    None,
    /// STARTTLS - upgrade to TLS after connecting (port 587)
    StartTls,
    /// Implicit TLS - connect with TLS from start (port 465)
    Tls,
}

/// Builder for SmtpTransport.
pub struct SmtpBuilder {
    host: String,
    port: u16,
    credentials: Option<Credentials>,
    tls: TlsMode,
}

impl SmtpBuilder {
    /// Set SMTP credentials.
    pub fn credentials(mut self, username: &str, password: &str) -> Self {
        self.credentials = Some(Credentials::new(username.to_string(), password.to_string()));
        self
    }

    /// Set TLS mode.
    pub fn tls(mut self, mode: TlsMode) -> Self {
        self.tls = mode;
        self
    }

    /// Disable TLS (dangerous, only for localhost/testing).
    pub fn no_tls(mut self) -> Self {
        self.tls = TlsMode::None;
        self
    }

    /// Build the SmtpTransport.
    pub fn build(self) -> Result<SmtpTransport, MailError> {
        let builder = match self.tls {
            TlsMode::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&self.host),
            TlsMode::StartTls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.host)?,
            TlsMode::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&self.host)?,
        };

        let mut builder = builder.port(self.port);
        if let Some(creds) = self.credentials {
            builder = builder.credentials(creds);
        }

        Ok(SmtpTransport {
            transport: builder.build(),
        })
    }
}

/// Convert our envelope to lettre's, parsing every address.
fn to_lettre_envelope(envelope: &Envelope) -> Result<lettre::address::Envelope, MailError> {
    let from: lettre::Address = envelope.from.parse()?;
    let recipients = envelope
        .recipients
        .iter()
        .map(|r| r.parse::<lettre::Address>())
        .collect::<Result<Vec<_>, _>>()?;

    Ok(lettre::address::Envelope::new(Some(from), recipients)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_conversion() {
        let envelope = Envelope {
            from: "ada@example.com".into(),
            recipients: vec!["bob@example.com".into(), "carol@example.com".into()],
        };
        let converted = to_lettre_envelope(&envelope).unwrap();
        assert_eq!(converted.from().map(|a| a.to_string()).as_deref(), Some("ada@example.com"));
        assert_eq!(converted.to().len(), 2);
    }

    #[test]
    fn test_envelope_rejects_bad_address() {
        let envelope = Envelope {
            from: "not an address".into(),
            recipients: vec!["bob@example.com".into()],
        };
        assert!(matches!(
            to_lettre_envelope(&envelope),
            Err(MailError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_envelope_requires_recipients() {
        let envelope = Envelope {
            from: "ada@example.com".into(),
            recipients: Vec::new(),
        };
        assert!(matches!(
            to_lettre_envelope(&envelope),
            Err(MailError::TransportFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_builder_modes() {
        assert!(SmtpTransport::new("localhost", 2525).no_tls().build().is_ok());
        let transport = SmtpTransport::new("smtp.example.com", 587)
            .credentials("user", "pass")
            .build()
            .unwrap();
        assert_eq!(transport.provider_name(), "smtp");
    }
}
