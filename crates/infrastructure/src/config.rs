//! Client configuration.
//!
//! Read from YAML, then optionally overridden from the environment:
//!
//! ```yaml
//! base_url: http://localhost:8000/api
//! timeout_ms: 5000
//! follow_redirects: false
//! default_headers:
//!   Accept: application/json
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use hitest_application::TestClient;
use hitest_application::ports::HttpClientError;
use hitest_domain::Headers;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::adapters::{ReqwestHttpClient, SystemClock};

/// Overrides [`ClientConfig::base_url`].
pub const ENV_BASE_URL: &str = "HITEST_BASE_URL";
/// Overrides [`ClientConfig::timeout_ms`].
pub const ENV_TIMEOUT_MS: &str = "HITEST_TIMEOUT_MS";
/// Overrides [`ClientConfig::follow_redirects`].
pub const ENV_FOLLOW_REDIRECTS: &str = "HITEST_FOLLOW_REDIRECTS";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The YAML is malformed or has the wrong shape.
    #[error("invalid config: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// An override holds a value of the wrong type.
    #[error("invalid value for {key}: {value}")]
    InvalidValue {
        /// Environment variable name.
        key: String,
        /// Rejected value.
        value: String,
    },
}

/// Settings for the HTTP client behind a [`TestClient`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Prefix for relative request URIs.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Follow 3xx responses and record the hops.
    #[serde(default = "default_follow_redirects")]
    pub follow_redirects: bool,
    /// Hop limit when following redirects.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    /// User-Agent header value.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Headers sent with every request.
    #[serde(default)]
    pub default_headers: BTreeMap<String, String>,
}

fn default_base_url() -> String {
    "http://localhost".to_string()
}

const fn default_timeout_ms() -> u64 {
    30_000
}

const fn default_follow_redirects() -> bool {
    true
}

const fn default_max_redirects() -> usize {
    10
}

fn default_user_agent() -> String {
    format!("hitest/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
            follow_redirects: default_follow_redirects(),
            max_redirects: default_max_redirects(),
            user_agent: default_user_agent(),
            default_headers: BTreeMap::new(),
        }
    }
}

impl ClientConfig {
    /// Parses YAML. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed YAML.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Reads and parses a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Parse`] on malformed YAML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&yaml)
    }

    /// Applies `HITEST_*` environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if an override cannot be parsed.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Applies overrides read through `lookup`, keyed by environment
    /// variable name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if an override cannot be parsed.
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base_url) = lookup(ENV_BASE_URL) {
            self.base_url = base_url;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_MS) {
            self.timeout_ms = raw
                .trim()
                .parse()
                .map_err(|_| invalid(ENV_TIMEOUT_MS, &raw))?;
        }
        if let Some(raw) = lookup(ENV_FOLLOW_REDIRECTS) {
            self.follow_redirects =
                parse_flag(&raw).ok_or_else(|| invalid(ENV_FOLLOW_REDIRECTS, &raw))?;
        }
        Ok(self)
    }

    /// Default headers in key order.
    #[must_use]
    pub fn headers(&self) -> Headers {
        self.default_headers
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
            .collect()
    }

    /// Builds a reqwest-backed [`TestClient`] on the system clock.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn build_client(&self) -> Result<TestClient<ReqwestHttpClient>, HttpClientError> {
        let http = ReqwestHttpClient::from_config(self)?;
        Ok(
            TestClient::new(http, Arc::new(SystemClock::new()), self.base_url.clone())
                .with_default_headers(self.headers()),
        )
    }
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://localhost");
        assert_eq!(config.timeout_ms, 30_000);
        assert!(config.follow_redirects);
        assert_eq!(config.max_redirects, 10);
        assert!(config.user_agent.starts_with("hitest/"));
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = ClientConfig::from_yaml_str(
            "base_url: http://api.test\ndefault_headers:\n  Accept: application/json\n",
        )
        .unwrap();
        assert_eq!(config.base_url, "http://api.test");
        assert_eq!(config.timeout_ms, 30_000);
        assert_eq!(config.headers().get("Accept"), Some("application/json"));
    }

    #[test]
    fn test_malformed_yaml() {
        let err = ClientConfig::from_yaml_str("timeout_ms: [").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_overrides() {
        let config = ClientConfig::default()
            .with_overrides_from(env(&[
                (ENV_BASE_URL, "http://ci:9000"),
                (ENV_TIMEOUT_MS, " 1500 "),
                (ENV_FOLLOW_REDIRECTS, "off"),
            ]))
            .unwrap();
        assert_eq!(config.base_url, "http://ci:9000");
        assert_eq!(config.timeout_ms, 1500);
        assert!(!config.follow_redirects);
    }

    #[test]
    fn test_invalid_override() {
        let err = ClientConfig::default()
            .with_overrides_from(env(&[(ENV_TIMEOUT_MS, "soon")]))
            .unwrap_err();
        assert_eq!(err.to_string(), "invalid value for HITEST_TIMEOUT_MS: soon");
    }

    #[test]
    fn test_build_client() {
        let config = ClientConfig::from_yaml_str("base_url: http://api.test/v1").unwrap();
        let client = config.build_client().unwrap();
        assert_eq!(client.base_url(), "http://api.test/v1");
    }
}
