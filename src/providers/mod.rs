//! Transport implementations.
//!
//! Each provider implements the [`Transport`](crate::Transport) trait.
//!
//! ## Available Providers
//!
//! | Provider | Feature Flag | Description |
//! |----------|-------------|-------------|
//! | [`SmtpTransport`] | `smtp` | SMTP via lettre |
//! | [`LocalTransport`] | (none) | In-memory capture for dev/testing |
//! | [`LoggerTransport`] | (none) | Logs messages without storing |

#[cfg(feature = "smtp")]
mod smtp;
#[cfg(feature = "smtp")]
pub use smtp::{SmtpBuilder, SmtpTransport, TlsMode};

mod local;
pub use local::{LocalTransport, SentMessage};

mod logger;
pub use logger::LoggerTransport;
