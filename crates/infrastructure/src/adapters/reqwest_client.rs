//! HTTP Client implementation using reqwest.
//!
//! This adapter implements the `HttpClient` port using the reqwest library.
//! Redirects are followed by hand so every hop can be recorded in the
//! redirect history headers of the returned metadata.

use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};

use chrono::Utc;
use hitest_application::ports::{HttpClient, HttpClientError};
use hitest_domain::{
    CookieJar, DomainError, Headers, HttpMethod, RequestSpec, ResponseMetadata,
    response::{REDIRECT_HISTORY_HEADER, REDIRECT_STATUS_HISTORY_HEADER},
};
use reqwest::header::{LOCATION, SET_COOKIE};
use reqwest::{Client, Method, StatusCode, Url};
use tracing::debug;

use crate::config::ClientConfig;

/// HTTP client implementation using reqwest.
///
/// Wraps `reqwest::Client` with automatic redirects disabled and follows
/// them itself, up to `max_redirects` hops.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: Client,
    timeout_ms: u64,
    follow_redirects: bool,
    max_redirects: usize,
}

impl ReqwestHttpClient {
    /// Creates a new HTTP client with default settings.
    ///
    /// Default configuration:
    /// - Request timeout: 30 seconds
    /// - Follow redirects: up to 10
    /// - User-Agent: "hitest/<version>"
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be created.
    pub fn new() -> Result<Self, HttpClientError> {
        Self::from_config(&ClientConfig::default())
    }

    /// Creates a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be created.
    pub fn from_config(config: &ClientConfig) -> Result<Self, HttpClientError> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| HttpClientError::Other(e.to_string()))?;

        Ok(Self {
            client,
            timeout_ms: config.timeout_ms,
            follow_redirects: config.follow_redirects,
            max_redirects: config.max_redirects,
        })
    }

    /// Creates a new HTTP client with a custom reqwest client.
    ///
    /// The client should not follow redirects itself, or no history is
    /// recorded.
    #[must_use]
    pub const fn with_client(client: Client) -> Self {
        Self {
            client,
            timeout_ms: 30_000,
            follow_redirects: true,
            max_redirects: 10,
        }
    }

    /// Converts domain `HttpMethod` to reqwest `Method`.
    const fn to_reqwest_method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
            HttpMethod::Head => Method::HEAD,
            HttpMethod::Options => Method::OPTIONS,
        }
    }

    /// 303 always, and 301/302 after a POST, continue as a bodiless GET.
    fn switches_to_get(status: StatusCode, method: &Method) -> bool {
        status == StatusCode::SEE_OTHER
            || (matches!(status, StatusCode::MOVED_PERMANENTLY | StatusCode::FOUND)
                && *method == Method::POST)
    }

    fn map_domain_error(error: DomainError) -> HttpClientError {
        match error {
            DomainError::InvalidUrl(message) => HttpClientError::InvalidUrl(message),
            DomainError::InvalidBody(message) => HttpClientError::InvalidBody(message),
            other => HttpClientError::Other(other.to_string()),
        }
    }

    /// Maps reqwest errors to port `HttpClientError`.
    fn map_error(&self, error: reqwest::Error) -> HttpClientError {
        if error.is_timeout() {
            return HttpClientError::Timeout {
                timeout_ms: self.timeout_ms,
            };
        }

        let host = || {
            error
                .url()
                .and_then(Url::host_str)
                .unwrap_or("unknown")
                .to_string()
        };

        if error.is_connect() {
            let message = error.to_string();
            let lower = message.to_lowercase();
            if lower.contains("dns") || lower.contains("resolve") {
                return HttpClientError::DnsError {
                    host: host(),
                    message,
                };
            }
            if lower.contains("refused") {
                return HttpClientError::ConnectionRefused {
                    host: host(),
                    port: error
                        .url()
                        .and_then(Url::port_or_known_default)
                        .unwrap_or(80),
                };
            }
            return HttpClientError::ConnectionFailed(message);
        }

        HttpClientError::Other(error.to_string())
    }
}

impl HttpClient for ReqwestHttpClient {
    fn execute(
        &self,
        request: &RequestSpec,
    ) -> Pin<Box<dyn Future<Output = Result<ResponseMetadata, HttpClientError>> + Send + '_>> {
        let parsed = request.parsed_url().map_err(Self::map_domain_error);
        let body = request.body_bytes().map_err(Self::map_domain_error);
        let mut method = Self::to_reqwest_method(request.method);
        let mut headers = request.headers.clone();

        Box::pin(async move {
            let mut current = parsed?;
            let mut body = body?;
            let timeout = Duration::from_millis(self.timeout_ms);

            let mut history: Vec<String> = Vec::new();
            let mut statuses: Vec<String> = Vec::new();
            let mut set_cookies: Vec<String> = Vec::new();

            let start = Instant::now();

            loop {
                let mut builder = self
                    .client
                    .request(method.clone(), current.clone())
                    .timeout(timeout);
                for header in &headers {
                    builder = builder.header(&header.name, &header.value);
                }
                if let Some(bytes) = &body {
                    builder = builder.body(bytes.clone());
                }

                let response = builder.send().await.map_err(|e| self.map_error(e))?;
                let status = response.status();

                set_cookies.extend(
                    response
                        .headers()
                        .get_all(SET_COOKIE)
                        .iter()
                        .filter_map(|v| v.to_str().ok())
                        .map(str::to_owned),
                );

                if self.follow_redirects
                    && status.is_redirection()
                    && let Some(location) = response
                        .headers()
                        .get(LOCATION)
                        .and_then(|v| v.to_str().ok())
                {
                    if history.len() >= self.max_redirects {
                        return Err(HttpClientError::TooManyRedirects {
                            max: self.max_redirects,
                        });
                    }
                    let next = current.join(location).map_err(|e| {
                        HttpClientError::InvalidUrl(format!("{e}: {location}"))
                    })?;
                    debug!(status = status.as_u16(), from = %current, to = %next, "following redirect");

                    if Self::switches_to_get(status, &method) {
                        method = Method::GET;
                        body = None;
                        headers = headers
                            .iter()
                            .filter(|h| !h.name.eq_ignore_ascii_case("content-type"))
                            .map(|h| (h.name.clone(), h.value.clone()))
                            .collect();
                    }

                    history.push(next.to_string());
                    statuses.push(status.as_u16().to_string());
                    current = next;
                    continue;
                }

                let mut response_headers: Headers = response
                    .headers()
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.to_str().unwrap_or("<binary>")))
                    .collect();
                if !history.is_empty() {
                    response_headers.insert(REDIRECT_HISTORY_HEADER, history.join(", "));
                    response_headers.insert(REDIRECT_STATUS_HISTORY_HEADER, statuses.join(", "));
                }

                let body_bytes = response
                    .bytes()
                    .await
                    .map_err(|e| HttpClientError::Other(format!("Failed to read body: {e}")))?
                    .to_vec();

                let cookies = CookieJar::from_set_cookie_headers(
                    set_cookies.iter().map(String::as_str),
                    current.host_str().unwrap_or_default(),
                    Utc::now(),
                );

                return Ok(ResponseMetadata::new(status.as_u16(), response_headers, body_bytes)
                    .with_cookies(cookies)
                    .with_duration(start.elapsed()));
            }
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_to_reqwest_method() {
        assert_eq!(
            ReqwestHttpClient::to_reqwest_method(HttpMethod::Get),
            Method::GET
        );
        assert_eq!(
            ReqwestHttpClient::to_reqwest_method(HttpMethod::Post),
            Method::POST
        );
        assert_eq!(
            ReqwestHttpClient::to_reqwest_method(HttpMethod::Options),
            Method::OPTIONS
        );
        assert_eq!(
            ReqwestHttpClient::to_reqwest_method(HttpMethod::Delete),
            Method::DELETE
        );
    }

    #[test]
    fn test_client_creation() {
        let client = ReqwestHttpClient::new().unwrap();
        assert_eq!(client.max_redirects, 10);
        assert!(client.follow_redirects);
    }

    #[test]
    fn test_redirect_method_switch() {
        assert!(ReqwestHttpClient::switches_to_get(StatusCode::SEE_OTHER, &Method::PUT));
        assert!(ReqwestHttpClient::switches_to_get(StatusCode::FOUND, &Method::POST));
        assert!(!ReqwestHttpClient::switches_to_get(StatusCode::FOUND, &Method::GET));
        assert!(!ReqwestHttpClient::switches_to_get(
            StatusCode::TEMPORARY_REDIRECT,
            &Method::POST
        ));
    }

    #[tokio::test]
    async fn test_invalid_url_is_reported() {
        let client = ReqwestHttpClient::new().unwrap();
        let request = RequestSpec::get("not a url");
        let err = client.execute(&request).await.unwrap_err();
        assert!(matches!(err, HttpClientError::InvalidUrl(_)));
    }
}
