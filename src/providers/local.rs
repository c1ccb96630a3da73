//! Local transport for development and testing.
//!
//! Keeps every sent message in memory, envelope and raw bytes, so tests
//! can assert on exactly what would have gone over the wire.
//!
//! # Testing Usage
//!
//! ```rust,ignore
//! use courier::providers::LocalTransport;
//! use courier::{Composer, Mailer};
//!
//! #[tokio::test]
//! async fn test_sends_welcome_email() {
//!     let transport = LocalTransport::new();
//!     let mailer = Mailer::new(Composer::new("smtp.example.com"), transport.clone());
//!
//!     // Code under test
//!     send_welcome_email(&mailer, "user@example.com").await;
//!
//!     assert!(transport.sent_to("user@example.com"));
//!     assert_eq!(transport.last().unwrap().header("Subject").as_deref(), Some("Welcome"));
//! }
//! ```

use std::borrow::Cow;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::compose::Envelope;
use crate::error::MailError;
use crate::transport::Transport;

/// A message captured by [`LocalTransport`].
#[derive(Debug, Clone)]
pub struct SentMessage {
    /// Capture id, unique per transport
    pub id: String,
    pub envelope: Envelope,
    /// Raw message bytes as handed to the transport
    pub payload: Vec<u8>,
    pub sent_at: DateTime<Utc>,
}

impl SentMessage {
    /// The payload as text (lossy for non-UTF-8 bytes).
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }

    /// Value of a top-level header, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<String> {
        let text = self.text();
        text.split("\r\n")
            .take_while(|line| !line.is_empty())
            .find_map(|line| {
                let (key, value) = line.split_once(':')?;
                key.eq_ignore_ascii_case(name)
                    .then(|| value.trim_start().to_string())
            })
    }
}

/// Transport that stores messages in memory instead of sending them.
///
/// Clones share the same mailbox and failure state.
#[derive(Clone, Default)]
pub struct LocalTransport {
    sent: Arc<RwLock<Vec<SentMessage>>>,
    /// If set, send() returns this error (for testing error paths).
    fail_with: Arc<RwLock<Option<String>>>,
}

impl LocalTransport {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Failure Simulation (for testing)
    // =========================================================================

    /// Make every following send fail with [`MailError::TransportFailed`].
    ///
    /// ```rust,ignore
    /// let transport = LocalTransport::new();
    /// transport.set_failure("SMTP connection refused");
    ///
    /// let result = mailer.send_mail(&message).await;
    /// assert!(result.is_err());
    /// ```
    pub fn set_failure(&self, message: impl Into<String>) {
        *self.fail_with.write() = Some(message.into());
    }

    /// Clear the failure state.
    pub fn clear_failure(&self) {
        *self.fail_with.write() = None;
    }

    // =========================================================================
    // Message Access (for testing assertions)
    // =========================================================================

    /// All captured messages, oldest first.
    pub fn messages(&self) -> Vec<SentMessage> {
        self.sent.read().clone()
    }

    /// The most recently sent message.
    pub fn last(&self) -> Option<SentMessage> {
        self.sent.read().last().cloned()
    }

    pub fn count(&self) -> usize {
        self.sent.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sent.read().is_empty()
    }

    /// Clear all captured messages.
    pub fn clear(&self) {
        self.sent.write().clear();
    }

    /// Remove and return all captured messages.
    pub fn flush(&self) -> Vec<SentMessage> {
        std::mem::take(&mut *self.sent.write())
    }

    /// Whether any message was routed to `address` (envelope recipients,
    /// which include cc and bcc).
    pub fn sent_to(&self, address: &str) -> bool {
        self.sent.read().iter().any(|m| {
            m.envelope
                .recipients
                .iter()
                .any(|r| r.eq_ignore_ascii_case(address))
        })
    }
}

impl std::fmt::Debug for LocalTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalTransport")
            .field("count", &self.count())
            .field("fail_with", &*self.fail_with.read())
            .finish()
    }
}

#[async_trait]
impl Transport for LocalTransport {
    async fn send(&self, envelope: &Envelope, payload: &[u8]) -> Result<(), MailError> {
        if let Some(message) = self.fail_with.read().clone() {
            return Err(MailError::TransportFailed(message));
        }

        let captured = SentMessage {
            id: uuid::Uuid::new_v4().to_string(),
            envelope: envelope.clone(),
            payload: payload.to_vec(),
            sent_at: Utc::now(),
        };
        tracing::debug!(id = %captured.id, size = payload.len(), "Captured message");
        self.sent.write().push(captured);
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "local"
    }
}
