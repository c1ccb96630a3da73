//! Plain-text vs HTML detection for the primary body part.
//!
//! This is a substring heuristic, not HTML detection: a body is treated as
//! markup when it contains the ASCII sequence `html`. A plain-text body that
//! mentions "html" is sent as `text/html`, and an HTML fragment without an
//! `<html>` element is sent as `text/plain`.

use serde::{Deserialize, Serialize};
use std::fmt;

const MARKUP_MARKER: &[u8] = b"html";

/// Content type of the primary body part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyType {
    /// `text/plain`
    Plain,
    /// `text/html`
    Html,
}

impl BodyType {
    /// The MIME type, without parameters.
    pub fn mime(&self) -> &'static str {
        match self {
            Self::Plain => "text/plain",
            Self::Html => "text/html",
        }
    }

    /// The full `Content-Type` header value for the body part.
    pub fn header_value(&self) -> String {
        format!("{}; charset=utf-8", self.mime())
    }
}

impl fmt::Display for BodyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

/// Decide whether a body is markup or plain text.
///
/// `used_template` records whether the body came from template rendering.
/// A rendered body is still only HTML when the marker is present, so the
/// flag never changes the outcome on its own.
pub fn sniff(body: &[u8], used_template: bool) -> BodyType {
    let has_marker = contains_marker(body);
    tracing::trace!(used_template, has_marker, "Sniffed body content type");
    if has_marker {
        BodyType::Html
    } else {
        BodyType::Plain
    }
}

fn contains_marker(body: &[u8]) -> bool {
    body.windows(MARKUP_MARKER.len())
        .any(|window| window == MARKUP_MARKER)
}
