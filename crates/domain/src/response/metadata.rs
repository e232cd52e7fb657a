//! Response metadata captured once per exchange.

use std::borrow::Cow;
use std::time::Duration;

use serde_json::Value;

use super::{ContentDisposition, StatusCode};
use crate::cookie::{Cookie, CookieJar};
use crate::error::AssertResult;
use crate::request::Headers;

/// Comma-separated URIs visited while following redirects.
pub const REDIRECT_HISTORY_HEADER: &str = "X-Redirect-History";

/// Comma-separated status codes of the redirect hops, first hop first.
pub const REDIRECT_STATUS_HISTORY_HEADER: &str = "X-Redirect-Status-History";

/// Present on a successful precognitive request.
pub const PRECOGNITION_SUCCESS_HEADER: &str = "Precognition-Success";

/// Everything the transport hands over about a response.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResponseMetadata {
    /// Final status code.
    pub status: StatusCode,
    /// Response headers, in received order.
    pub headers: Headers,
    /// Cookies set by the response, including expired ones.
    pub cookies: CookieJar,
    /// Raw body bytes.
    pub body: Vec<u8>,
    /// Time from dispatch to the last body byte.
    pub duration: Duration,
}

impl ResponseMetadata {
    /// Creates metadata without cookies or timing.
    #[must_use]
    pub fn new(status: impl Into<StatusCode>, headers: Headers, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: status.into(),
            headers,
            cookies: CookieJar::new(),
            body: body.into(),
            duration: Duration::ZERO,
        }
    }

    /// Sets the cookie set.
    #[must_use]
    pub fn with_cookies(mut self, cookies: CookieJar) -> Self {
        self.cookies = cookies;
        self
    }

    /// Sets the response time.
    #[must_use]
    pub const fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// First value of a header.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Looks up a cookie set by this response.
    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<&Cookie> {
        self.cookies.get(name)
    }

    /// Body as text, with invalid UTF-8 replaced.
    #[must_use]
    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Strictly decodes the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`crate::AssertionError::InvalidJson`] if the body is not JSON or
    /// decodes to `null`.
    pub fn decode_json(&self) -> AssertResult<Value> {
        crate::json::decode(&self.body)
    }

    /// Status in [200, 300).
    #[must_use]
    pub const fn is_successful(&self) -> bool {
        self.status.is_successful()
    }

    /// Status in [500, 600).
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        self.status.is_server_error()
    }

    /// URIs visited while following redirects, in order.
    #[must_use]
    pub fn redirect_history(&self) -> Vec<&str> {
        split_list(self.header(REDIRECT_HISTORY_HEADER))
    }

    /// Status codes of the redirect hops, in order. Unparseable entries are
    /// skipped.
    #[must_use]
    pub fn redirect_status_history(&self) -> Vec<StatusCode> {
        split_list(self.header(REDIRECT_STATUS_HISTORY_HEADER))
            .into_iter()
            .filter_map(|code| code.parse::<u16>().ok().map(StatusCode::new))
            .collect()
    }

    /// The status that started the redirect chain: the first recorded hop,
    /// or the final status if no hops were recorded.
    #[must_use]
    pub fn redirect_status(&self) -> StatusCode {
        self.redirect_status_history()
            .first()
            .copied()
            .unwrap_or(self.status)
    }

    /// Returns true if redirect history is present and the redirect status is
    /// one of the redirect codes.
    #[must_use]
    pub fn is_redirect(&self) -> bool {
        self.headers.contains(REDIRECT_HISTORY_HEADER) && self.redirect_status().is_redirect_code()
    }

    /// Parsed Content-Disposition header.
    #[must_use]
    pub fn content_disposition(&self) -> Option<ContentDisposition> {
        self.header("Content-Disposition").map(ContentDisposition::parse)
    }
}

fn split_list(header: Option<&str>) -> Vec<&str> {
    header
        .map(|value| {
            value
                .split(',')
                .map(str::trim)
                .filter(|entry| !entry.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::error::AssertionError;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn response(status: u16, headers: &[(&str, &str)], body: &str) -> ResponseMetadata {
        ResponseMetadata::new(
            status,
            headers.iter().copied().collect(),
            body.as_bytes().to_vec(),
        )
    }

    #[test]
    fn test_created_with_history_is_redirect() {
        let res = response(201, &[(REDIRECT_HISTORY_HEADER, "/users/1")], "");
        assert!(res.is_redirect());
    }

    #[test]
    fn test_created_without_history_is_not_redirect() {
        assert!(!response(201, &[], "").is_redirect());
    }

    #[test]
    fn test_redirect_status_uses_first_hop() {
        let res = response(
            200,
            &[
                (REDIRECT_HISTORY_HEADER, "http://a/1, http://a/2"),
                (REDIRECT_STATUS_HISTORY_HEADER, "302, 301"),
            ],
            "",
        );
        assert_eq!(res.redirect_status(), StatusCode::new(302));
        assert_eq!(res.redirect_history(), vec!["http://a/1", "http://a/2"]);
        assert!(res.is_redirect());
    }

    #[test]
    fn test_history_with_non_redirect_status() {
        let res = response(
            200,
            &[
                (REDIRECT_HISTORY_HEADER, "http://a/1"),
                (REDIRECT_STATUS_HISTORY_HEADER, "304"),
            ],
            "",
        );
        assert!(!res.is_redirect());
    }

    #[test]
    fn test_decode_json() {
        assert_eq!(
            response(200, &[], r#"{"a":1}"#).decode_json().unwrap(),
            json!({"a": 1})
        );
    }

    #[test]
    fn test_decode_null_is_invalid() {
        let err = response(200, &[], "null").decode_json().unwrap_err();
        assert!(matches!(err, AssertionError::InvalidJson { .. }));
    }

    #[test]
    fn test_decode_malformed_keeps_body() {
        let err = response(200, &[], "<html>").decode_json().unwrap_err();
        match err {
            AssertionError::InvalidJson { body, .. } => assert_eq!(body, "<html>"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_content_disposition_lookup() {
        let res = response(200, &[("content-disposition", "attachment; filename=a.txt")], "");
        let cd = res.content_disposition().unwrap();
        assert_eq!(cd.filename(), Some("a.txt"));
        assert!(response(200, &[], "").content_disposition().is_none());
    }
}
