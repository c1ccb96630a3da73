//! Logger transport that only logs messages.
//!
//! Useful for staging environments or when you want to see what would be sent
//! without actually sending or storing anything.

use async_trait::async_trait;

use crate::compose::Envelope;
use crate::error::MailError;
use crate::transport::Transport;

/// Transport that emits tracing events instead of sending.
#[derive(Debug, Clone, Default)]
pub struct LoggerTransport {
    /// If true, also log the raw payload. If false, just the envelope.
    log_full: bool,
}

impl LoggerTransport {
    /// Create a logger transport with brief output (envelope only).
    pub fn new() -> Self {
        Self { log_full: false }
    }

    /// Create a logger transport that also logs the payload.
    pub fn full() -> Self {
        Self { log_full: true }
    }

    pub fn log_full(mut self, full: bool) -> Self {
        self.log_full = full;
        self
    }
}

#[async_trait]
impl Transport for LoggerTransport {
    async fn send(&self, envelope: &Envelope, payload: &[u8]) -> Result<(), MailError> {
        tracing::info!(
            from = %envelope.from,
            recipients = ?envelope.recipients,
            size = payload.len(),
            "Message logged"
        );

        if self.log_full {
            tracing::debug!(payload = %String::from_utf8_lossy(payload), "Message payload");
        }

        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "logger"
    }
}
