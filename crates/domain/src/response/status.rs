//! Status code classification

use std::fmt;

use serde::{Deserialize, Serialize};

/// Status codes treated as "redirect with body".
///
/// 201 is included because frameworks use it interchangeably with 3xx codes
/// after a resource is created.
pub const REDIRECT_CODES: [u16; 6] = [201, 301, 302, 303, 307, 308];

/// HTTP status code with classification helpers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusCode(pub u16);

impl StatusCode {
    /// 200 OK
    pub const OK: Self = Self(200);
    /// 201 Created
    pub const CREATED: Self = Self(201);
    /// 204 No Content
    pub const NO_CONTENT: Self = Self(204);
    /// 404 Not Found
    pub const NOT_FOUND: Self = Self(404);

    /// Creates a new `StatusCode`.
    #[must_use]
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Returns the numeric status code.
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// 2xx
    #[must_use]
    pub const fn is_successful(self) -> bool {
        self.0 >= 200 && self.0 < 300
    }

    /// 4xx
    #[must_use]
    pub const fn is_client_error(self) -> bool {
        self.0 >= 400 && self.0 < 500
    }

    /// 5xx
    #[must_use]
    pub const fn is_server_error(self) -> bool {
        self.0 >= 500 && self.0 < 600
    }

    /// Returns true if the code is one of [`REDIRECT_CODES`].
    ///
    /// This only classifies the number; a response is a redirect only if it
    /// also carries redirect history.
    #[must_use]
    pub fn is_redirect_code(self) -> bool {
        REDIRECT_CODES.contains(&self.0)
    }

    /// Returns the canonical reason phrase for common status codes.
    #[must_use]
    pub const fn reason_phrase(self) -> &'static str {
        match self.0 {
            200 => "OK",
            201 => "Created",
            202 => "Accepted",
            204 => "No Content",
            301 => "Moved Permanently",
            302 => "Found",
            303 => "See Other",
            304 => "Not Modified",
            307 => "Temporary Redirect",
            308 => "Permanent Redirect",
            400 => "Bad Request",
            401 => "Unauthorized",
            403 => "Forbidden",
            404 => "Not Found",
            405 => "Method Not Allowed",
            409 => "Conflict",
            422 => "Unprocessable Entity",
            429 => "Too Many Requests",
            500 => "Internal Server Error",
            502 => "Bad Gateway",
            503 => "Service Unavailable",
            504 => "Gateway Timeout",
            _ => "Unknown",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.0, self.reason_phrase())
    }
}

impl From<u16> for StatusCode {
    fn from(code: u16) -> Self {
        Self(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_buckets() {
        assert!(StatusCode::new(200).is_successful());
        assert!(StatusCode::new(299).is_successful());
        assert!(!StatusCode::new(300).is_successful());
        assert!(StatusCode::new(500).is_server_error());
        assert!(!StatusCode::new(600).is_server_error());
        assert!(StatusCode::NOT_FOUND.is_client_error());
    }

    #[test]
    fn test_redirect_codes_are_a_set() {
        assert!(StatusCode::CREATED.is_redirect_code());
        assert!(StatusCode::new(308).is_redirect_code());
        assert!(!StatusCode::new(304).is_redirect_code());
        assert!(!StatusCode::new(300).is_redirect_code());
    }

    #[test]
    fn test_display() {
        assert_eq!(StatusCode::new(404).to_string(), "404 Not Found");
        assert_eq!(StatusCode::new(599).to_string(), "599 Unknown");
    }
}
