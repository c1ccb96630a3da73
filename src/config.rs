//! Mail server settings.
//!
//! [`MailerConfig`] can be deserialized as part of a host application's
//! configuration or read from environment variables:
//!
//! | Variable | Description |
//! |----------|-------------|
//! | `SMTP_HOST` | SMTP server host (required) |
//! | `SMTP_PORT` | SMTP server port (default: 587) |
//! | `SMTP_USERNAME` | SMTP username |
//! | `SMTP_PASSWORD` | SMTP password |
//! | `SMTP_SECURE` | `true`/`1` for implicit TLS, otherwise STARTTLS |
//! | `EMAIL_FROM` | Default sender address |
//! | `EMAIL_FROM_NAME` | Default sender name |

use std::env;
use std::fmt;

use serde::Deserialize;

use crate::address::Address;
use crate::error::MailError;

const DEFAULT_PORT: u16 = 587;

fn default_port() -> u16 {
    DEFAULT_PORT
}

/// Connection and identity settings for a mailer.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct MailerConfig {
    /// SMTP server host; also used in `Message-ID` and the `X-Mailer` lookup
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Implicit TLS instead of STARTTLS
    #[serde(default)]
    pub secure: bool,
    /// Default sender address
    #[serde(default)]
    pub from: Option<String>,
    /// Default sender display name
    #[serde(default)]
    pub from_name: Option<String>,
}

impl MailerConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            username: String::new(),
            password: String::new(),
            secure: false,
            from: None,
            from_name: None,
        }
    }

    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    pub fn from_name(mut self, name: impl Into<String>) -> Self {
        self.from_name = Some(name.into());
        self
    }

    /// Load from environment variables.
    pub fn from_env() -> Result<Self, MailError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load using `lookup` in place of the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, MailError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("SMTP_HOST")
            .filter(|h| !h.is_empty())
            .ok_or_else(|| MailError::Configuration("SMTP_HOST not set".into()))?;

        let port = match lookup("SMTP_PORT") {
            Some(p) => p.trim().parse().map_err(|_| {
                MailError::Configuration(format!("SMTP_PORT is not a valid port: {p}"))
            })?,
            None => DEFAULT_PORT,
        };

        let secure = lookup("SMTP_SECURE")
            .map(|s| matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            host,
            port,
            username: lookup("SMTP_USERNAME").unwrap_or_default(),
            password: lookup("SMTP_PASSWORD").unwrap_or_default(),
            secure,
            from: lookup("EMAIL_FROM").filter(|s| !s.is_empty()),
            from_name: lookup("EMAIL_FROM_NAME").filter(|s| !s.is_empty()),
        })
    }

    /// Check required fields.
    pub fn validate(&self) -> Result<(), MailError> {
        if self.host.trim().is_empty() {
            return Err(MailError::Configuration("host must not be empty".into()));
        }
        if self.port == 0 {
            return Err(MailError::Configuration("port must not be 0".into()));
        }
        Ok(())
    }

    /// The sender used when a message has none.
    ///
    /// `from` when set, otherwise the username if it is an address.
    pub fn account(&self) -> Option<Address> {
        let email = match &self.from {
            Some(from) => from.clone(),
            None if self.username.contains('@') => self.username.clone(),
            None => return None,
        };
        Some(match &self.from_name {
            Some(name) => Address::with_name(name, email),
            None => Address::new(email),
        })
    }
}

impl fmt::Debug for MailerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &if self.password.is_empty() { "" } else { "[REDACTED]" })
            .field("secure", &self.secure)
            .field("from", &self.from)
            .field("from_name", &self.from_name)
            .finish()
    }
}
