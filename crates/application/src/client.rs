//! Request issuing with a per-client cookie session.

use std::sync::Arc;

use hitest_domain::request::join_url;
use hitest_domain::{Cookie, CookieJar, Headers, HttpMethod, RequestSpec};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::assertions::ResponseAssert;
use crate::error::ApplicationResult;
use crate::ports::{Clock, HttpClient};

/// Issues requests against one base URL and wraps each response for
/// assertions.
///
/// Cookies set by a response are sent back on later requests from the same
/// client. Each client owns its session; nothing is shared between clients.
pub struct TestClient<C> {
    http: C,
    clock: Arc<dyn Clock>,
    base_url: String,
    default_headers: Headers,
    session: Mutex<CookieJar>,
}

impl<C: HttpClient> TestClient<C> {
    /// Creates a client for `base_url`.
    #[must_use]
    pub fn new(http: C, clock: Arc<dyn Clock>, base_url: impl Into<String>) -> Self {
        Self {
            http,
            clock,
            base_url: base_url.into(),
            default_headers: Headers::new(),
            session: Mutex::new(CookieJar::new()),
        }
    }

    /// Adds a header sent with every request.
    #[must_use]
    pub fn with_default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(name, value);
        self
    }

    /// Replaces the headers sent with every request.
    #[must_use]
    pub fn with_default_headers(mut self, headers: Headers) -> Self {
        self.default_headers = headers;
        self
    }

    /// The base URL requests are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issues a GET request.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the transport fails.
    pub async fn get(&self, uri: &str) -> ApplicationResult<ResponseAssert> {
        self.send(HttpMethod::Get, uri, None).await
    }

    /// Issues a POST request with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the transport fails.
    pub async fn post(&self, uri: &str, body: Value) -> ApplicationResult<ResponseAssert> {
        self.send(HttpMethod::Post, uri, Some(body)).await
    }

    /// Issues a PUT request with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the transport fails.
    pub async fn put(&self, uri: &str, body: Value) -> ApplicationResult<ResponseAssert> {
        self.send(HttpMethod::Put, uri, Some(body)).await
    }

    /// Issues a PATCH request with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the transport fails.
    pub async fn patch(&self, uri: &str, body: Value) -> ApplicationResult<ResponseAssert> {
        self.send(HttpMethod::Patch, uri, Some(body)).await
    }

    /// Issues a DELETE request.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the transport fails.
    pub async fn delete(&self, uri: &str) -> ApplicationResult<ResponseAssert> {
        self.send(HttpMethod::Delete, uri, None).await
    }

    /// Issues an OPTIONS request.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the transport fails.
    pub async fn options(&self, uri: &str) -> ApplicationResult<ResponseAssert> {
        self.send(HttpMethod::Options, uri, None).await
    }

    /// Issues a HEAD request.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the transport fails.
    pub async fn head(&self, uri: &str) -> ApplicationResult<ResponseAssert> {
        self.send(HttpMethod::Head, uri, None).await
    }

    /// Issues a request. A body is only sent for POST, PUT and PATCH.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ApplicationError::Domain`] if the URL is invalid and
    /// [`crate::ApplicationError::Http`] if the transport fails.
    pub async fn send(
        &self,
        method: HttpMethod,
        uri: &str,
        body: Option<Value>,
    ) -> ApplicationResult<ResponseAssert> {
        let mut request = RequestSpec::new(method, join_url(&self.base_url, uri)?);

        for header in &self.default_headers {
            request.headers.add(header.name.clone(), header.value.clone());
        }
        if let Some(body) = body.filter(|_| method.has_body()) {
            if !request.headers.contains("Content-Type") {
                request.headers.add("Content-Type", "application/json");
            }
            request.body = Some(body);
        }
        if let Some(cookies) = self.session.lock().await.cookie_header(self.clock.now()) {
            request.headers.insert("Cookie", cookies);
        }

        debug!(%method, url = %request.url, "dispatching request");
        let response = self.http.execute(&request).await?;
        info!(
            %method,
            url = %request.url,
            status = response.status.as_u16(),
            elapsed_ms = u64::try_from(response.duration.as_millis()).unwrap_or(u64::MAX),
            "request completed"
        );

        self.session
            .lock()
            .await
            .apply(&response.cookies, self.clock.now());

        Ok(ResponseAssert::new(response, Arc::clone(&self.clock)))
    }

    /// Snapshot of the session cookies.
    pub async fn cookies(&self) -> CookieJar {
        self.session.lock().await.clone()
    }

    /// Seeds the session with a cookie.
    pub async fn set_cookie(&self, cookie: Cookie) {
        self.session.lock().await.insert(cookie);
    }

    /// Forgets every session cookie.
    pub async fn clear_cookies(&self) {
        self.session.lock().await.clear();
    }
}
