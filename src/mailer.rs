//! The mailer: a composer bound to a transport.
//!
//! [`Mailer::send_mail`] is the whole pipeline: compose the message
//! (template, headers, parts) and hand the bytes plus envelope to the
//! transport. A composition failure means nothing is sent.

use std::sync::Arc;

use tracing::Instrument;

use crate::compose::Composer;
use crate::config::MailerConfig;
use crate::error::MailError;
use crate::message::EmailMessage;
use crate::transport::{DeliveryResult, Transport};

/// Composes and sends messages through one transport.
///
/// Cheap to clone; clones share the transport and the composer's
/// collaborators.
///
/// # Example
///
/// ```
/// use courier::providers::LocalTransport;
/// use courier::{Composer, EmailMessage, Mailer};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let transport = LocalTransport::new();
/// let mailer = Mailer::new(Composer::new("smtp.example.com"), transport.clone());
///
/// let message = EmailMessage::new()
///     .from("ada@example.com")
///     .to("bob@example.com")
///     .subject("Hello")
///     .body("World");
///
/// let result = mailer.send_mail(&message).await.unwrap();
/// assert_eq!(transport.count(), 1);
/// assert_eq!(result.transport, "local");
/// # }
/// ```
#[derive(Clone)]
pub struct Mailer {
    composer: Composer,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for Mailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mailer")
            .field("composer", &self.composer)
            .field("transport", &self.transport.provider_name())
            .finish()
    }
}

impl Mailer {
    pub fn new(composer: Composer, transport: impl Transport + 'static) -> Self {
        Self {
            composer,
            transport: Arc::new(transport),
        }
    }

    /// Create a mailer with an already shared transport.
    pub fn with_transport_arc(composer: Composer, transport: Arc<dyn Transport>) -> Self {
        Self {
            composer,
            transport,
        }
    }

    /// Create a mailer for `config` that sends through `transport`.
    ///
    /// The composer uses the configured host and account identity.
    pub fn from_config(
        config: &MailerConfig,
        transport: impl Transport + 'static,
    ) -> Result<Self, MailError> {
        config.validate()?;
        transport.validate_config()?;
        let composer = Composer::new(config.host.clone()).account(config.account());
        Ok(Self::new(composer, transport))
    }

    /// Create an SMTP mailer for `config`.
    #[cfg(feature = "smtp")]
    pub fn smtp(config: &MailerConfig) -> Result<Self, MailError> {
        let transport = crate::providers::SmtpTransport::from_config(config)?;
        Self::from_config(config, transport)
    }

    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn provider_name(&self) -> &'static str {
        self.transport.provider_name()
    }

    /// Compose `message` and send it.
    ///
    /// Composition errors are returned before the transport is touched.
    /// Transport errors come back as [`MailError::TransportFailed`].
    pub async fn send_mail(&self, message: &EmailMessage) -> Result<DeliveryResult, MailError> {
        let provider = self.transport.provider_name();

        let span = tracing::info_span!(
            "courier.send",
            transport = provider,
            to = ?message.to.iter().map(|a| &a.email).collect::<Vec<_>>(),
            subject = %message.subject,
        );

        async move {
            let composed = match self.composer.compose(message) {
                Ok(composed) => composed,
                Err(e) => {
                    tracing::error!(error = %e, stage = e.stage(), "Message composition failed");
                    return Err(e);
                }
            };

            tracing::debug!(
                message_id = %composed.message_id,
                recipients = composed.envelope.recipients.len(),
                "Sending message"
            );

            let result = self
                .transport
                .send(&composed.envelope, composed.as_bytes())
                .await
                .map(|()| DeliveryResult::new(composed.message_id.clone(), provider));

            match &result {
                Ok(r) => tracing::info!(message_id = %r.message_id, "Message sent"),
                Err(e) => tracing::error!(error = %e, "Message delivery failed"),
            }

            result
        }
        .instrument(span)
        .await
    }
}
