//! Parts and their `multipart/mixed` serialization.

use crate::header::HeaderTable;

/// One section of a multipart payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub headers: HeaderTable,
    pub body: Vec<u8>,
}

impl Part {
    pub fn new(headers: HeaderTable, body: Vec<u8>) -> Self {
        Self { headers, body }
    }

    /// Whether `token` occurs anywhere in this part's headers or body.
    pub fn contains(&self, token: &str) -> bool {
        if token.is_empty() {
            return false;
        }
        let needle = token.as_bytes();
        self.body.windows(needle.len()).any(|w| w == needle)
            || self
                .headers
                .iter()
                .any(|(name, value)| name.contains(token) || value.contains(token))
    }
}

/// Ordered parts plus the boundary that separates them.
#[derive(Debug, Clone)]
pub struct MultipartPayload {
    boundary: String,
    parts: Vec<Part>,
}

impl MultipartPayload {
    pub fn new(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            parts: Vec::new(),
        }
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// Replace the boundary, keeping the parts.
    pub fn set_boundary(&mut self, boundary: impl Into<String>) {
        self.boundary = boundary.into();
    }

    pub fn push(&mut self, part: Part) {
        self.parts.push(part);
    }

    /// Whether the boundary is non-empty and absent from every part.
    pub fn boundary_is_distinct(&self) -> bool {
        !self.boundary.is_empty() && !self.parts.iter().any(|p| p.contains(&self.boundary))
    }

    /// Append the body of the message: each part opened by `--boundary`,
    /// then the closing `--boundary--`.
    ///
    /// The CRLF before each delimiter belongs to the delimiter, so part
    /// bodies come back out byte-for-byte.
    pub fn write_to(&self, out: &mut Vec<u8>) {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                out.extend_from_slice(b"\r\n");
            }
            out.extend_from_slice(b"--");
            out.extend_from_slice(self.boundary.as_bytes());
            out.extend_from_slice(b"\r\n");
            part.headers.write_to(out);
            out.extend_from_slice(b"\r\n");
            out.extend_from_slice(&part.body);
        }
        out.extend_from_slice(b"\r\n--");
        out.extend_from_slice(self.boundary.as_bytes());
        out.extend_from_slice(b"--\r\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_part(body: &str) -> Part {
        let mut headers = HeaderTable::new();
        headers.set("Content-Type", "text/plain; charset=utf-8");
        Part::new(headers, body.as_bytes().to_vec())
    }

    #[test]
    fn test_write_single_part() {
        let mut payload = MultipartPayload::new("XYZ");
        payload.push(text_part("Hello"));

        let mut out = Vec::new();
        payload.write_to(&mut out);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "--XYZ\r\nContent-Type: text/plain; charset=utf-8\r\n\r\nHello\r\n--XYZ--\r\n"
        );
    }

    #[test]
    fn test_write_two_parts() {
        let mut payload = MultipartPayload::new("XYZ");
        payload.push(text_part("one"));
        payload.push(text_part("two"));

        let mut out = Vec::new();
        payload.write_to(&mut out);
        let out = String::from_utf8(out).unwrap();
        assert_eq!(out.matches("--XYZ\r\n").count(), 2);
        assert_eq!(out.matches("--XYZ--").count(), 1);
        assert!(out.contains("\r\n\r\none\r\n--XYZ\r\n"));
        assert!(out.ends_with("two\r\n--XYZ--\r\n"));
    }

    #[test]
    fn test_boundary_collision_detected() {
        let mut payload = MultipartPayload::new("XYZ");
        payload.push(text_part("nothing here"));
        assert!(payload.boundary_is_distinct());

        payload.push(text_part("contains XYZ inside"));
        assert!(!payload.boundary_is_distinct());

        payload.set_boundary("ABC");
        assert!(payload.boundary_is_distinct());

        payload.set_boundary("");
        assert!(!payload.boundary_is_distinct());
    }

    #[test]
    fn test_part_contains_checks_headers() {
        let mut headers = HeaderTable::new();
        headers.set("Content-Disposition", "attachment; filename=\"XYZ.txt\"");
        let part = Part::new(headers, Vec::new());
        assert!(part.contains("XYZ"));
        assert!(!part.contains(""));
    }
}
