//! Outgoing request description.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use super::{Headers, HttpMethod};
use crate::error::{DomainError, DomainResult};

/// A fully-resolved request, ready for a transport.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RequestSpec {
    /// HTTP method.
    pub method: HttpMethod,
    /// Absolute request URL.
    pub url: String,
    /// Request headers, in sending order.
    #[serde(default)]
    pub headers: Headers,
    /// JSON payload, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl RequestSpec {
    /// Creates a request without headers or body.
    #[must_use]
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Headers::new(),
            body: None,
        }
    }

    /// Creates a GET request.
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    /// Appends a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.add(name, value);
        self
    }

    /// Sets the JSON payload.
    #[must_use]
    pub fn with_json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Parses and validates the request URL.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidUrl`] if the URL is not absolute.
    pub fn parsed_url(&self) -> DomainResult<Url> {
        Url::parse(&self.url).map_err(|e| DomainError::InvalidUrl(format!("{}: {e}", self.url)))
    }

    /// Serialized payload bytes, if a body is set.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidBody`] if the payload cannot be encoded.
    pub fn body_bytes(&self) -> DomainResult<Option<Vec<u8>>> {
        self.body
            .as_ref()
            .map(|body| serde_json::to_vec(body).map_err(|e| DomainError::InvalidBody(e.to_string())))
            .transpose()
    }
}

/// Joins a base URL and a request URI.
///
/// Absolute URIs are returned unchanged. Otherwise exactly one `/` separates
/// the two parts. An empty URI yields the base URL.
///
/// # Errors
///
/// Returns [`DomainError::InvalidUrl`] if the result is not a valid absolute URL.
pub fn join_url(base: &str, uri: &str) -> DomainResult<String> {
    if let Ok(absolute) = Url::parse(uri) {
        return Ok(absolute.to_string());
    }

    let joined = if uri.is_empty() {
        base.to_string()
    } else {
        format!(
            "{}/{}",
            base.trim_end_matches('/'),
            uri.trim_start_matches('/')
        )
    };

    Url::parse(&joined)
        .map(|_| joined.clone())
        .map_err(|e| DomainError::InvalidUrl(format!("{joined}: {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_join_normalizes_slashes() {
        assert_eq!(
            join_url("http://localhost:8080/", "/api/users").unwrap(),
            "http://localhost:8080/api/users"
        );
        assert_eq!(
            join_url("http://localhost:8080/v1", "users?page=2").unwrap(),
            "http://localhost:8080/v1/users?page=2"
        );
    }

    #[test]
    fn test_join_absolute_uri_passes_through() {
        assert_eq!(
            join_url("http://localhost", "https://example.com/x").unwrap(),
            "https://example.com/x"
        );
    }

    #[test]
    fn test_join_empty_uri() {
        assert_eq!(join_url("http://localhost", "").unwrap(), "http://localhost");
    }

    #[test]
    fn test_join_invalid_base() {
        assert!(matches!(
            join_url("not a url", "/x"),
            Err(DomainError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_body_bytes() {
        let request = RequestSpec::new(HttpMethod::Post, "http://localhost/users")
            .with_header("Accept", "application/json")
            .with_json(json!({"name": "Jo"}));
        assert_eq!(
            request.body_bytes().unwrap(),
            Some(br#"{"name":"Jo"}"#.to_vec())
        );
        assert_eq!(RequestSpec::get("http://localhost").body_bytes().unwrap(), None);
    }

    #[test]
    fn test_parsed_url() {
        assert!(RequestSpec::get("http://localhost/a").parsed_url().is_ok());
        assert!(RequestSpec::get("/relative").parsed_url().is_err());
    }
}
