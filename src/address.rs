//! Mailbox formatting: display name + address for headers, bare address for the envelope.

use crate::error::MailError;
use email_address::EmailAddress;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Format a display name and address as a header mailbox value.
///
/// An empty name yields the address unchanged; otherwise `Name <address>`.
/// The name is not quoted or escaped.
///
/// ```
/// use courier::format_mailbox;
///
/// assert_eq!(format_mailbox("", "ada@example.com"), "ada@example.com");
/// assert_eq!(format_mailbox("Ada", "ada@example.com"), "Ada <ada@example.com>");
/// ```
pub fn format_mailbox(name: &str, address: &str) -> String {
    if name.is_empty() {
        address.to_string()
    } else {
        format!("{} <{}>", name, address)
    }
}

/// Recover the bare address from a formatted mailbox.
///
/// Takes the last whitespace-separated token and drops any `<` or `>`.
/// Accepts both `address` and `Name <address>` forms.
///
/// ```
/// use courier::extract_bare_address;
///
/// assert_eq!(extract_bare_address("Ada Lovelace <ada@example.com>"), "ada@example.com");
/// assert_eq!(extract_bare_address("ada@example.com"), "ada@example.com");
/// ```
pub fn extract_bare_address(formatted: &str) -> String {
    formatted
        .split_whitespace()
        .last()
        .unwrap_or_default()
        .chars()
        .filter(|c| *c != '<' && *c != '>')
        .collect()
}

/// An email address with an optional display name.
///
/// # Examples
///
/// ```
/// use courier::Address;
///
/// let addr: Address = "user@example.com".into();
/// assert_eq!(addr.email, "user@example.com");
/// assert_eq!(addr.name, None);
///
/// let addr: Address = ("Alice", "alice@example.com").into();
/// assert_eq!(addr.formatted(), "Alice <alice@example.com>");
///
/// let addr: Address = "Ada <ada@example.com>".into();
/// assert_eq!(addr.name.as_deref(), Some("Ada"));
/// assert_eq!(addr.email, "ada@example.com");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Optional display name (e.g., "Alice Smith")
    pub name: Option<String>,
    /// Email address (e.g., "alice@example.com")
    pub email: String,
}

impl Address {
    /// Create a new address with just an email.
    ///
    /// Logs a warning if the email fails a basic sanity check. For strict
    /// validation, use [`Address::parse`] instead.
    pub fn new(email: impl Into<String>) -> Self {
        let email = email.into();

        if !Self::basic_sanity_check(&email) {
            tracing::warn!(
                email = %email,
                "Creating address with potentially invalid email. Use Address::parse() for strict validation."
            );
        }

        Self { name: None, email }
    }

    /// Create a new address with a name and email.
    pub fn with_name(name: impl Into<String>, email: impl Into<String>) -> Self {
        let name = name.into();
        let mut addr = Self::new(email);
        if !name.is_empty() {
            addr.name = Some(name);
        }
        addr
    }

    /// Build an address from either `address` or `Name <address>`.
    ///
    /// Surrounding double quotes on the display name are dropped.
    pub fn from_formatted(formatted: &str) -> Self {
        let trimmed = formatted.trim();
        if let (Some(open), true) = (trimmed.rfind('<'), trimmed.ends_with('>')) {
            let name = trimmed[..open].trim().trim_matches('"').trim();
            let email = &trimmed[open + 1..trimmed.len() - 1];
            return Self::with_name(name, email.trim());
        }
        Self::new(trimmed)
    }

    /// Non-empty and contains `@`. Not a full validation.
    fn basic_sanity_check(email: &str) -> bool {
        !email.is_empty() && email.contains('@')
    }

    /// Set the display name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Parse and validate an email address.
    ///
    /// ```
    /// use courier::Address;
    ///
    /// assert!(Address::parse("user@example.com").is_ok());
    /// assert!(Address::parse("not-an-email").is_err());
    /// ```
    pub fn parse(email: &str) -> Result<Self, MailError> {
        if !EmailAddress::is_valid(email) {
            return Err(MailError::InvalidAddress(format!(
                "'{}' is not a valid email address",
                email
            )));
        }

        Ok(Self {
            name: None,
            email: email.to_string(),
        })
    }

    /// Parse and validate an email address with a display name.
    pub fn parse_with_name(name: &str, email: &str) -> Result<Self, MailError> {
        let addr = Self::parse(email)?;
        Ok(Self {
            name: if name.is_empty() {
                None
            } else {
                Some(name.to_string())
            },
            ..addr
        })
    }

    /// Format as `Name <email>`, or just `email` when there is no name.
    pub fn formatted(&self) -> String {
        format_mailbox(self.name.as_deref().unwrap_or_default(), &self.email)
    }

    /// The bare address used for envelope routing.
    pub fn bare(&self) -> String {
        extract_bare_address(&self.email)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.formatted())
    }
}

impl From<&str> for Address {
    fn from(formatted: &str) -> Self {
        Self::from_formatted(formatted)
    }
}

impl From<String> for Address {
    fn from(formatted: String) -> Self {
        Self::from_formatted(&formatted)
    }
}

impl From<(&str, &str)> for Address {
    fn from((name, email): (&str, &str)) -> Self {
        Self::with_name(name, email)
    }
}

impl From<(String, String)> for Address {
    fn from((name, email): (String, String)) -> Self {
        Self::with_name(name, email)
    }
}

/// Trait for types that can be converted to an email address.
///
/// Implement this for your own types to pass them straight to the
/// [`EmailMessage`](crate::EmailMessage) builder.
///
/// ```rust
/// use courier::{Address, ToAddress};
///
/// struct User {
///     name: String,
///     email: String,
/// }
///
/// impl ToAddress for User {
///     fn to_address(&self) -> Address {
///         Address::with_name(&self.name, &self.email)
///     }
/// }
/// ```
pub trait ToAddress {
    fn to_address(&self) -> Address;
}

impl<T: ToAddress + ?Sized> ToAddress for &T {
    fn to_address(&self) -> Address {
        (*self).to_address()
    }
}

impl ToAddress for Address {
    fn to_address(&self) -> Address {
        self.clone()
    }
}

impl ToAddress for str {
    fn to_address(&self) -> Address {
        Address::from_formatted(self)
    }
}

impl ToAddress for String {
    fn to_address(&self) -> Address {
        Address::from_formatted(self)
    }
}

impl<N: AsRef<str>, E: AsRef<str>> ToAddress for (N, E) {
    fn to_address(&self) -> Address {
        Address::with_name(self.0.as_ref(), self.1.as_ref())
    }
}
