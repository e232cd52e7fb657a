//! Assertions over a complete HTTP response.

use std::borrow::Cow;
use std::cell::OnceCell;
use std::path::Path;
use std::sync::Arc;

use hitest_domain::json::StructureSpec;
use hitest_domain::response::{PRECOGNITION_SUCCESS_HEADER, REDIRECT_CODES, REDIRECT_HISTORY_HEADER};
use hitest_domain::{AssertResult, AssertionError, Cookie, ResponseMetadata, StatusCode};
use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use super::{JsonAssert, ensure, logged};
use crate::ports::Clock;

/// Fluent assertions over one response.
///
/// The body is decoded as JSON on the first JSON assertion and the outcome
/// is kept for the lifetime of the instance: a body that fails to decode
/// fails every later JSON assertion with the same error.
pub struct ResponseAssert {
    response: ResponseMetadata,
    decoded: OnceCell<AssertResult<JsonAssert>>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for ResponseAssert {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseAssert")
            .field("response", &self.response)
            .field("decoded", &self.decoded)
            .finish_non_exhaustive()
    }
}

impl ResponseAssert {
    /// Wraps a response. `clock` is used for cookie expiry checks.
    #[must_use]
    pub fn new(response: ResponseMetadata, clock: Arc<dyn Clock>) -> Self {
        Self {
            response,
            decoded: OnceCell::new(),
            clock,
        }
    }

    /// The wrapped response.
    #[must_use]
    pub const fn response(&self) -> &ResponseMetadata {
        &self.response
    }

    /// The decoded body.
    ///
    /// # Errors
    ///
    /// Returns [`AssertionError::InvalidJson`] if the body is not JSON.
    pub fn decoded(&self) -> AssertResult<&JsonAssert> {
        self.decoded
            .get_or_init(|| {
                let decoded = self.response.decode_json().map(JsonAssert::new);
                match &decoded {
                    Ok(_) => debug!(bytes = self.response.body.len(), "decoded response body"),
                    Err(error) => warn!(%error, "response body is not valid JSON"),
                }
                decoded
            })
            .as_ref()
            .map_err(Clone::clone)
    }

    // ---- status -------------------------------------------------------

    /// The final status code.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.response.status
    }

    /// Asserts an exact status code.
    ///
    /// # Errors
    ///
    /// Fails if the status differs.
    pub fn assert_status(&self, expected: u16) -> AssertResult<&Self> {
        self.expect_status(expected.to_string(), self.status().as_u16() == expected)
    }

    /// Asserts a status in [200, 300).
    ///
    /// # Errors
    ///
    /// Fails for any other status.
    pub fn assert_successful(&self) -> AssertResult<&Self> {
        self.expect_status(">=200, <300".to_string(), self.response.is_successful())
    }

    /// Asserts a status in [500, 600).
    ///
    /// # Errors
    ///
    /// Fails for any other status.
    pub fn assert_server_error(&self) -> AssertResult<&Self> {
        self.expect_status(">=500, <600".to_string(), self.response.is_server_error())
    }

    /// Asserts 200.
    ///
    /// # Errors
    ///
    /// Fails for any other status.
    pub fn assert_ok(&self) -> AssertResult<&Self> {
        self.assert_status(StatusCode::OK.as_u16())
    }

    /// Asserts 201.
    ///
    /// # Errors
    ///
    /// Fails for any other status.
    pub fn assert_created(&self) -> AssertResult<&Self> {
        self.assert_status(StatusCode::CREATED.as_u16())
    }

    /// Asserts 404.
    ///
    /// # Errors
    ///
    /// Fails for any other status.
    pub fn assert_not_found(&self) -> AssertResult<&Self> {
        self.assert_status(StatusCode::NOT_FOUND.as_u16())
    }

    /// Asserts `status` and an empty body.
    ///
    /// # Errors
    ///
    /// Fails if the status differs or the body is not empty.
    pub fn assert_no_content(&self, status: u16) -> AssertResult<&Self> {
        self.assert_status(status)?;
        ensure(self.response.body.is_empty(), || {
            AssertionError::failed("Response content is not empty.", "", self.content())
        })?;
        Ok(self)
    }

    /// Asserts a successful precognitive request: 204, an empty body and the
    /// `Precognition-Success` header.
    ///
    /// # Errors
    ///
    /// Fails if any of the three is missing.
    pub fn assert_successful_precognition(&self) -> AssertResult<&Self> {
        self.assert_no_content(StatusCode::NO_CONTENT.as_u16())?;
        ensure(self.response.headers.contains(PRECOGNITION_SUCCESS_HEADER), || {
            AssertionError::failed(
                format!("Header [{PRECOGNITION_SUCCESS_HEADER}] not present on response."),
                "present",
                "(missing)",
            )
        })?;
        Ok(self)
    }

    fn expect_status(&self, expected: String, condition: bool) -> AssertResult<&Self> {
        let actual = self.status().as_u16();
        ensure(condition, || {
            AssertionError::failed(
                format!("Expected response status code [{expected}] but received {actual}."),
                expected.clone(),
                actual.to_string(),
            )
        })?;
        Ok(self)
    }

    // ---- redirects ----------------------------------------------------

    /// Returns true if redirect history is present and the redirect status
    /// is one of 201, 301, 302, 303, 307 or 308.
    #[must_use]
    pub fn is_redirect(&self) -> bool {
        self.response.is_redirect()
    }

    /// Asserts a redirect, and optionally where it ended.
    ///
    /// # Errors
    ///
    /// Fails if the response is not a redirect or `uri` does not match
    /// [`Self::assert_location`].
    pub fn assert_redirect(&self, uri: Option<&str>) -> AssertResult<&Self> {
        self.expect_redirect()?;
        if let Some(uri) = uri {
            self.assert_location(uri)?;
        }
        Ok(self)
    }

    /// Asserts a redirect whose history mentions `uri`.
    ///
    /// # Errors
    ///
    /// Fails if the response is not a redirect or no hop contains `uri`.
    pub fn assert_redirect_contains(&self, uri: &str) -> AssertResult<&Self> {
        self.expect_redirect()?;
        let history = self.response.header(REDIRECT_HISTORY_HEADER).unwrap_or_default();
        ensure(history.contains(uri), || {
            AssertionError::failed(
                "Redirect location does not contain the given URI.",
                uri,
                history,
            )
        })?;
        Ok(self)
    }

    /// Asserts where the response was redirected to: the last history entry,
    /// or the `Location` header when redirects were not followed.
    ///
    /// # Errors
    ///
    /// Fails if neither is present or the location differs.
    pub fn assert_location(&self, uri: &str) -> AssertResult<&Self> {
        let location = self
            .response
            .redirect_history()
            .last()
            .copied()
            .or_else(|| self.response.header("Location"));
        ensure(location == Some(uri), || {
            AssertionError::failed(
                "Response location does not match.",
                uri,
                location.unwrap_or("(none)"),
            )
        })?;
        Ok(self)
    }

    fn expect_redirect(&self) -> AssertResult<&Self> {
        let actual = self.response.redirect_status().as_u16();
        ensure(self.is_redirect(), || {
            let expected = REDIRECT_CODES.map(|code| code.to_string()).join(", ");
            AssertionError::failed(
                format!("Expected response status code [{expected}] but received {actual}."),
                expected,
                actual.to_string(),
            )
        })?;
        Ok(self)
    }

    // ---- headers ------------------------------------------------------

    /// First value of a header.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.response.header(name)
    }

    /// Asserts a header is present and, optionally, its value.
    ///
    /// # Errors
    ///
    /// Fails if the header is missing or its value differs.
    pub fn assert_header(&self, name: &str, value: Option<&str>) -> AssertResult<&Self> {
        let actual = self.present_header(name)?;
        if let Some(value) = value {
            ensure(actual == value, || {
                AssertionError::failed(
                    format!("Header [{name}] was found, but value [{actual}] does not match [{value}]."),
                    value,
                    actual,
                )
            })?;
        }
        Ok(self)
    }

    /// Asserts a header is absent.
    ///
    /// # Errors
    ///
    /// Fails if the header is present.
    pub fn assert_header_missing(&self, name: &str) -> AssertResult<&Self> {
        let actual = self.header(name);
        ensure(actual.is_none(), || {
            AssertionError::failed(
                format!("Unexpected header [{name}] is present on response."),
                "(missing)",
                actual.unwrap_or_default(),
            )
        })?;
        Ok(self)
    }

    /// Asserts a header is present and matches a regular expression.
    ///
    /// # Errors
    ///
    /// Fails if the header is missing, the pattern is invalid or the value
    /// does not match.
    pub fn assert_header_matches(&self, name: &str, pattern: &str) -> AssertResult<&Self> {
        let actual = self.present_header(name)?;
        let regex = logged(Regex::new(pattern).map_err(|e| {
            AssertionError::failed(format!("Invalid regex pattern '{pattern}': {e}"), pattern, actual)
        }))?;
        ensure(regex.is_match(actual), || {
            AssertionError::failed(
                format!("Header [{name}] value does not match pattern '{pattern}'."),
                pattern,
                actual,
            )
        })?;
        Ok(self)
    }

    fn present_header(&self, name: &str) -> AssertResult<&str> {
        let actual = self.header(name);
        ensure(actual.is_some(), || {
            AssertionError::failed(
                format!("Header [{name}] not present on response."),
                "present",
                "(missing)",
            )
        })?;
        Ok(actual.unwrap_or_default())
    }

    // ---- downloads ----------------------------------------------------

    /// Asserts the response offers a file download, optionally with a
    /// specific file name.
    ///
    /// # Errors
    ///
    /// Fails if the disposition is not `attachment`, the first parameter is
    /// not `filename`, or the name differs.
    pub fn assert_download(&self, filename: Option<&str>) -> AssertResult<&Self> {
        let disposition = self.response.content_disposition();
        let found = disposition.as_ref().map_or("", |cd| cd.disposition());
        ensure(disposition.as_ref().is_some_and(|cd| cd.is_attachment()), || {
            AssertionError::failed(
                format!(
                    "Response does not offer a file download.\nDisposition [{found}] found in header, [attachment] expected."
                ),
                "attachment",
                found,
            )
        })?;

        let (Some(expected), Some(disposition)) = (filename, disposition) else {
            return Ok(self);
        };

        if let Some(parameter) = disposition.parameter_name() {
            ensure(parameter == "filename", || {
                AssertionError::failed(
                    format!(
                        "Unsupported Content-Disposition header provided.\nDisposition [{parameter}] found in header, [filename] expected."
                    ),
                    "filename",
                    parameter,
                )
            })?;
        }

        let actual = disposition.filename();
        ensure(actual == Some(expected), || {
            AssertionError::failed(
                format!("Expected file [{expected}] is not present in Content-Disposition header."),
                expected,
                actual.unwrap_or("(none)"),
            )
        })?;
        Ok(self)
    }

    // ---- cookies ------------------------------------------------------

    /// Asserts a cookie was set and, optionally, its value.
    ///
    /// # Errors
    ///
    /// Fails if the cookie is missing or its value differs.
    pub fn assert_cookie(&self, name: &str, value: Option<&str>) -> AssertResult<&Self> {
        let cookie = self.present_cookie(name)?;
        if let Some(value) = value {
            ensure(cookie.value == value, || {
                AssertionError::failed(
                    format!(
                        "Cookie [{name}] was found, but value [{}] does not match [{value}].",
                        cookie.value
                    ),
                    value,
                    cookie.value.clone(),
                )
            })?;
        }
        Ok(self)
    }

    /// Same as [`Self::assert_cookie`]; cookie values are never decrypted.
    ///
    /// # Errors
    ///
    /// Fails if the cookie is missing or its value differs.
    pub fn assert_plain_cookie(&self, name: &str, value: Option<&str>) -> AssertResult<&Self> {
        self.assert_cookie(name, value)
    }

    /// Asserts a cookie was set with an expiry that has passed.
    ///
    /// # Errors
    ///
    /// Fails if the cookie is missing, is a session cookie or expires later.
    pub fn assert_cookie_expired(&self, name: &str) -> AssertResult<&Self> {
        let cookie = self.present_cookie(name)?;
        let now = self.clock.now();
        ensure(cookie.is_expired_at(now), || {
            AssertionError::failed(
                format!("Cookie [{name}] is not expired, it expires at [{}].", expiry(cookie)),
                format!("expired at or before {}", now.to_rfc3339()),
                expiry(cookie),
            )
        })?;
        Ok(self)
    }

    /// Asserts a cookie was set and has not expired.
    ///
    /// # Errors
    ///
    /// Fails if the cookie is missing or already expired.
    pub fn assert_cookie_not_expired(&self, name: &str) -> AssertResult<&Self> {
        let cookie = self.present_cookie(name)?;
        let now = self.clock.now();
        ensure(!cookie.is_expired_at(now), || {
            AssertionError::failed(
                format!("Cookie [{name}] is expired, it expired at [{}].", expiry(cookie)),
                format!("valid after {}", now.to_rfc3339()),
                expiry(cookie),
            )
        })?;
        Ok(self)
    }

    /// Asserts a cookie was not set.
    ///
    /// # Errors
    ///
    /// Fails if the cookie is present.
    pub fn assert_cookie_missing(&self, name: &str) -> AssertResult<&Self> {
        let cookie = self.response.cookie(name);
        ensure(cookie.is_none(), || {
            AssertionError::failed(
                format!("Cookie [{name}] is present on response."),
                "(missing)",
                cookie.map(Cookie::to_cookie_header).unwrap_or_default(),
            )
        })?;
        Ok(self)
    }

    fn present_cookie(&self, name: &str) -> AssertResult<&Cookie> {
        logged(self.response.cookie(name).ok_or_else(|| {
            AssertionError::failed(
                format!("Cookie [{name}] not present on response."),
                "present",
                "(missing)",
            )
        }))
    }

    // ---- content ------------------------------------------------------

    /// The body as text.
    #[must_use]
    pub fn content(&self) -> Cow<'_, str> {
        self.response.body_text()
    }

    /// Asserts the body equals `expected` exactly.
    ///
    /// # Errors
    ///
    /// Fails if the body differs.
    pub fn assert_content(&self, expected: &str) -> AssertResult<&Self> {
        let content = self.content();
        ensure(content == expected, || {
            AssertionError::failed("Response content does not match.", expected, content.as_ref())
        })?;
        Ok(self)
    }

    /// Asserts the fully-read streamed body equals `expected`.
    ///
    /// # Errors
    ///
    /// Fails if the body differs.
    pub fn assert_streamed_content(&self, expected: &str) -> AssertResult<&Self> {
        self.assert_content(expected)
    }

    /// Asserts each value occurs in the body.
    ///
    /// # Errors
    ///
    /// Fails on the first value not found.
    pub fn assert_see(&self, values: &[&str]) -> AssertResult<&Self> {
        see(&self.content(), values, true)?;
        Ok(self)
    }

    /// Asserts each value occurs in the body with HTML tags removed.
    ///
    /// # Errors
    ///
    /// Fails on the first value not found.
    pub fn assert_see_text(&self, values: &[&str]) -> AssertResult<&Self> {
        see(&strip_tags(&self.content()), values, true)?;
        Ok(self)
    }

    /// Asserts no value occurs in the body.
    ///
    /// # Errors
    ///
    /// Fails on the first value found.
    pub fn assert_dont_see(&self, values: &[&str]) -> AssertResult<&Self> {
        see(&self.content(), values, false)?;
        Ok(self)
    }

    /// Asserts no value occurs in the body with HTML tags removed.
    ///
    /// # Errors
    ///
    /// Fails on the first value found.
    pub fn assert_dont_see_text(&self, values: &[&str]) -> AssertResult<&Self> {
        see(&strip_tags(&self.content()), values, false)?;
        Ok(self)
    }

    // ---- JSON ---------------------------------------------------------

    /// Resolves `key` in the decoded body, or returns the whole document.
    ///
    /// # Errors
    ///
    /// Fails if the body is not JSON or the path does not exist.
    pub fn json(&self, key: Option<&str>) -> AssertResult<Value> {
        Ok(self.decoded()?.json(key)?.into_owned())
    }

    /// See [`JsonAssert::assert_json_path`].
    ///
    /// # Errors
    ///
    /// Fails if the body is not JSON, or as the delegate fails.
    pub fn assert_json_path(&self, path: &str, expected: &Value) -> AssertResult<&Self> {
        self.decoded()?.assert_json_path(path, expected)?;
        Ok(self)
    }

    /// See [`JsonAssert::assert_json_path_matches`].
    ///
    /// # Errors
    ///
    /// Fails if the body is not JSON, or as the delegate fails.
    pub fn assert_json_path_matches<F>(&self, path: &str, predicate: F) -> AssertResult<&Self>
    where
        F: FnOnce(&Value) -> bool,
    {
        self.decoded()?.assert_json_path_matches(path, predicate)?;
        Ok(self)
    }

    /// See [`JsonAssert::assert_json_path_canonicalizing`].
    ///
    /// # Errors
    ///
    /// Fails if the body is not JSON, or as the delegate fails.
    pub fn assert_json_path_canonicalizing(
        &self,
        path: &str,
        expected: &[Value],
    ) -> AssertResult<&Self> {
        self.decoded()?.assert_json_path_canonicalizing(path, expected)?;
        Ok(self)
    }

    /// See [`JsonAssert::assert_exact_json`].
    ///
    /// # Errors
    ///
    /// Fails if the body is not JSON, or as the delegate fails.
    pub fn assert_exact_json(&self, expected: &Value) -> AssertResult<&Self> {
        self.decoded()?.assert_exact_json(expected)?;
        Ok(self)
    }

    /// See [`JsonAssert::assert_similar_json`].
    ///
    /// # Errors
    ///
    /// Fails if the body is not JSON, or as the delegate fails.
    pub fn assert_similar_json(&self, expected: &Value) -> AssertResult<&Self> {
        self.decoded()?.assert_similar_json(expected)?;
        Ok(self)
    }

    /// See [`JsonAssert::assert_json_fragment`].
    ///
    /// # Errors
    ///
    /// Fails if the body is not JSON, or as the delegate fails.
    pub fn assert_json_fragment(&self, fragment: &Value) -> AssertResult<&Self> {
        self.decoded()?.assert_json_fragment(fragment)?;
        Ok(self)
    }

    /// See [`JsonAssert::assert_json_missing`].
    ///
    /// # Errors
    ///
    /// Fails if the body is not JSON, or as the delegate fails.
    pub fn assert_json_missing(&self, fragment: &Value, exact: bool) -> AssertResult<&Self> {
        self.decoded()?.assert_json_missing(fragment, exact)?;
        Ok(self)
    }

    /// See [`JsonAssert::assert_json_missing_exact`].
    ///
    /// # Errors
    ///
    /// Fails if the body is not JSON, or as the delegate fails.
    pub fn assert_json_missing_exact(&self, fragment: &Value) -> AssertResult<&Self> {
        self.decoded()?.assert_json_missing_exact(fragment)?;
        Ok(self)
    }

    /// See [`JsonAssert::assert_json_missing_path`].
    ///
    /// # Errors
    ///
    /// Fails if the body is not JSON, or as the delegate fails.
    pub fn assert_json_missing_path(&self, path: &str) -> AssertResult<&Self> {
        self.decoded()?.assert_json_missing_path(path)?;
        Ok(self)
    }

    /// See [`JsonAssert::assert_json_structure`].
    ///
    /// # Errors
    ///
    /// Fails if the body is not JSON, or as the delegate fails.
    pub fn assert_json_structure(&self, structure: Option<&StructureSpec>) -> AssertResult<&Self> {
        self.decoded()?.assert_json_structure(structure)?;
        Ok(self)
    }

    /// See [`JsonAssert::assert_json_is_array`].
    ///
    /// # Errors
    ///
    /// Fails if the body is not JSON, or as the delegate fails.
    pub fn assert_json_is_array(&self, key: Option<&str>) -> AssertResult<&Self> {
        self.decoded()?.assert_json_is_array(key)?;
        Ok(self)
    }

    /// See [`JsonAssert::assert_json_is_object`].
    ///
    /// # Errors
    ///
    /// Fails if the body is not JSON, or as the delegate fails.
    pub fn assert_json_is_object(&self, key: Option<&str>) -> AssertResult<&Self> {
        self.decoded()?.assert_json_is_object(key)?;
        Ok(self)
    }

    /// See [`JsonAssert::assert_json_equals`].
    ///
    /// # Errors
    ///
    /// Fails if the body is not JSON, or as the delegate fails.
    pub fn assert_json_equals(&self, expected: &Value, keys_to_remove: &[&str]) -> AssertResult<&Self> {
        self.decoded()?.assert_json_equals(expected, keys_to_remove)?;
        Ok(self)
    }

    /// See [`JsonAssert::assert_json_equals_file`].
    ///
    /// # Errors
    ///
    /// Fails if the body is not JSON, or as the delegate fails.
    pub fn assert_json_equals_file(
        &self,
        path: impl AsRef<Path>,
        keys_to_remove: &[&str],
    ) -> AssertResult<&Self> {
        self.decoded()?.assert_json_equals_file(path, keys_to_remove)?;
        Ok(self)
    }
}

fn expiry(cookie: &Cookie) -> String {
    cookie
        .expires
        .map_or_else(|| "session".to_string(), |at| at.to_rfc3339())
}

fn see(haystack: &str, values: &[&str], present: bool) -> AssertResult<()> {
    for value in values {
        ensure(haystack.contains(value) == present, || {
            let message = if present {
                format!("Failed asserting that [{value}] is contained in the response.")
            } else {
                format!("Failed asserting that [{value}] is not contained in the response.")
            };
            AssertionError::failed(message, *value, haystack)
        })?;
    }
    Ok(())
}

// Drops everything between `<` and the next `>`.
fn strip_tags(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }
    text
}
