//! Multipart boundary tokens.

/// Source of multipart boundary tokens.
///
/// The composer asks for one token per message and uses it for every
/// delimiter of that message. Implementations must be safe to share across
/// concurrent compose calls.
pub trait BoundarySource: Send + Sync {
    /// Produce a boundary token.
    fn generate(&self) -> String;
}

/// Random boundaries from a v4 UUID, prefixed with `=_`.
///
/// The `=_` prefix cannot occur in base64 or quoted-printable output, so an
/// encoded part can never contain the delimiter.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomBoundary;

impl BoundarySource for RandomBoundary {
    fn generate(&self) -> String {
        format!("=_{}", uuid::Uuid::new_v4().simple())
    }
}

/// Always returns the same token. Intended for reproducible output in tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedBoundary(String);

impl FixedBoundary {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl BoundarySource for FixedBoundary {
    fn generate(&self) -> String {
        self.0.clone()
    }
}

impl<F> BoundarySource for F
where
    F: Fn() -> String + Send + Sync,
{
    fn generate(&self) -> String {
        (self)()
    }
}
