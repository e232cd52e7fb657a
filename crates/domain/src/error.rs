//! Domain error types

use thiserror::Error;

/// Domain-level errors that can occur while building requests.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The provided URL is invalid or malformed.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The HTTP method is not supported.
    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    /// The request body could not be encoded.
    #[error("invalid body: {0}")]
    InvalidBody(String),
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;

/// A failed check raised by one of the response assertions.
///
/// "Not found" and "assertion failed" are distinct variants so callers can
/// invert a [`AssertionError::PathNotFound`] into a success when absence is
/// what they expected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AssertionError {
    /// The response body could not be decoded as JSON.
    #[error("Invalid JSON was returned from the route: {reason}.\n\n[{body}]")]
    InvalidJson {
        /// Decoder error message.
        reason: String,
        /// The raw body (lossy UTF-8).
        body: String,
    },

    /// An addressed path does not exist in the document.
    #[error("The key [{path}] was not found in the response.")]
    PathNotFound {
        /// The dot-delimited path that failed to resolve.
        path: String,
    },

    /// The document does not have the declared shape.
    #[error("Failed asserting JSON structure at [{}]: {message}", display_location(.location))]
    ShapeMismatch {
        /// Dot-delimited location of the level that failed.
        location: String,
        /// What was expected at that level.
        message: String,
    },

    /// A fragment pair was not present in the canonical document.
    #[error("Unable to find JSON fragment:\n\n[{fragment}]\n\nwithin\n\n[{haystack}].")]
    FragmentNotFound {
        /// The pair that was searched for.
        fragment: String,
        /// The canonicalized document.
        haystack: String,
    },

    /// A fragment that should be absent was found.
    #[error("Found unexpected JSON fragment:\n\n[{fragment}]\n\nwithin\n\n[{haystack}].")]
    UnexpectedFragmentFound {
        /// The fragment that was found.
        fragment: String,
        /// The canonicalized document.
        haystack: String,
    },

    /// Generic value mismatch.
    #[error("{message}\nExpected: {expected}\nActual:   {actual}")]
    AssertionFailed {
        /// Human-readable description of the failed check.
        message: String,
        /// Expected value, rendered for display.
        expected: String,
        /// Actual value, rendered for display.
        actual: String,
    },

    /// A JSON fixture file could not be read or decoded.
    #[error("Unable to load JSON fixture [{path}]: {reason}")]
    Fixture {
        /// Fixture path as given by the caller.
        path: String,
        /// Underlying I/O or decode error.
        reason: String,
    },
}

impl AssertionError {
    /// Builds an [`AssertionError::AssertionFailed`].
    #[must_use]
    pub fn failed(
        message: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::AssertionFailed {
            message: message.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Returns true if this error only signals a missing path.
    #[must_use]
    pub const fn is_path_not_found(&self) -> bool {
        matches!(self, Self::PathNotFound { .. })
    }
}

fn display_location(location: &str) -> &str {
    if location.is_empty() { "(root)" } else { location }
}

/// Result type alias for assertion operations.
pub type AssertResult<T> = Result<T, AssertionError>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_shape_mismatch_root_location() {
        let err = AssertionError::ShapeMismatch {
            location: String::new(),
            message: "missing key [id]".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Failed asserting JSON structure at [(root)]: missing key [id]"
        );
    }

    #[test]
    fn test_assertion_failed_display() {
        let err = AssertionError::failed("Status mismatch.", "200", "404");
        assert_eq!(
            err.to_string(),
            "Status mismatch.\nExpected: 200\nActual:   404"
        );
        assert!(!err.is_path_not_found());
    }
}
