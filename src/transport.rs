//! Transport capability and delivery result types.
//!
//! A transport receives the finished bytes of a message plus the envelope
//! (bare sender and recipient addresses) and is responsible for getting
//! them to a mail server. It never looks inside the payload.
//!
//! The trait uses `#[async_trait]` so it stays object-safe: the
//! [`Mailer`](crate::Mailer) and the global mailer hold an
//! `Arc<dyn Transport>` chosen at runtime.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::compose::Envelope;
use crate::error::MailError;

/// Result of a successful send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryResult {
    /// `Message-ID` header of the delivered message
    pub message_id: String,
    /// Name of the transport that accepted it
    pub transport: String,
}

impl DeliveryResult {
    pub fn new(message_id: impl Into<String>, transport: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            transport: transport.into(),
        }
    }
}

/// Delivers composed messages.
///
/// # Example
///
/// ```
/// use async_trait::async_trait;
/// use courier::{Envelope, MailError, Transport};
///
/// struct Discard;
///
/// #[async_trait]
/// impl Transport for Discard {
///     async fn send(&self, _envelope: &Envelope, _payload: &[u8]) -> Result<(), MailError> {
///         Ok(())
///     }
///
///     fn provider_name(&self) -> &'static str {
///         "discard"
///     }
/// }
/// ```
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `payload` from `envelope.from` to every `envelope.recipients`.
    ///
    /// Failures are reported as [`MailError::TransportFailed`].
    async fn send(&self, envelope: &Envelope, payload: &[u8]) -> Result<(), MailError>;

    /// Get the provider name (for logging/debugging).
    fn provider_name(&self) -> &'static str {
        "unknown"
    }

    /// Check that the transport has what it needs before first use.
    fn validate_config(&self) -> Result<(), MailError> {
        Ok(())
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, envelope: &Envelope, payload: &[u8]) -> Result<(), MailError> {
        (**self).send(envelope, payload).await
    }

    fn provider_name(&self) -> &'static str {
        (**self).provider_name()
    }

    fn validate_config(&self) -> Result<(), MailError> {
        (**self).validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Reject;

    #[async_trait]
    impl Transport for Reject {
        async fn send(&self, _envelope: &Envelope, _payload: &[u8]) -> Result<(), MailError> {
            Err(MailError::TransportFailed("550 mailbox unavailable".into()))
        }
    }

    #[tokio::test]
    async fn test_default_provider_name() {
        assert_eq!(Reject.provider_name(), "unknown");
        assert!(Reject.validate_config().is_ok());
    }

    #[tokio::test]
    async fn test_arc_forwards() {
        let transport: Arc<dyn Transport> = Arc::new(Reject);
        let envelope = Envelope {
            from: "a@example.com".into(),
            recipients: vec!["b@example.com".into()],
        };
        let err = transport.send(&envelope, b"data").await.unwrap_err();
        assert_eq!(err, MailError::TransportFailed("550 mailbox unavailable".into()));
    }
}
