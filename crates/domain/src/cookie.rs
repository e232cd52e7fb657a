//! Cookie types.
//!
//! Cookies are keyed by name only: a test session talks to a single host, so
//! domain and path scoping are recorded but not used for lookup.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A single HTTP cookie.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Cookie {
    /// Cookie name.
    pub name: String,
    /// Cookie value.
    pub value: String,
    /// Domain the cookie was set for.
    #[serde(default)]
    pub domain: String,
    /// Path the cookie applies to.
    #[serde(default = "default_path")]
    pub path: String,
    /// Expiration time (None for session cookies).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<DateTime<Utc>>,
    /// HttpOnly flag.
    #[serde(default)]
    pub http_only: bool,
    /// Secure flag.
    #[serde(default)]
    pub secure: bool,
    /// SameSite attribute.
    #[serde(default)]
    pub same_site: SameSite,
}

fn default_path() -> String {
    "/".to_string()
}

impl Cookie {
    /// Creates a session cookie.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: String::new(),
            path: default_path(),
            expires: None,
            http_only: false,
            secure: false,
            same_site: SameSite::default(),
        }
    }

    /// Sets the domain.
    #[must_use]
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    /// Sets the path.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Sets the expiration.
    #[must_use]
    pub fn with_expires(mut self, expires: DateTime<Utc>) -> Self {
        self.expires = Some(expires);
        self
    }

    /// Returns true if the cookie has an expiry at or before `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires.is_some_and(|exp| exp <= now)
    }

    /// Returns true if this is a session cookie (no expiration).
    #[must_use]
    pub const fn is_session(&self) -> bool {
        self.expires.is_none()
    }

    /// Formats the `name=value` pair for a Cookie header.
    #[must_use]
    pub fn to_cookie_header(&self) -> String {
        format!("{}={}", self.name, self.value)
    }

    /// Parses a Set-Cookie header value.
    ///
    /// `Max-Age` is resolved against `now` and takes precedence over
    /// `Expires`. Returns `None` when there is no `name=value` pair.
    #[must_use]
    pub fn from_set_cookie(header: &str, request_domain: &str, now: DateTime<Utc>) -> Option<Self> {
        let mut parts = header.split(';');
        let (name, value) = parts.next()?.split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        let mut cookie = Self::new(name, value.trim().trim_matches('"')).with_domain(request_domain);
        let mut max_age = None;

        for part in parts.map(str::trim).filter(|p| !p.is_empty()) {
            let (attr, val) = part.split_once('=').unwrap_or((part, ""));
            let val = val.trim();
            match attr.trim().to_ascii_lowercase().as_str() {
                "domain" => cookie.domain = val.trim_start_matches('.').to_string(),
                "path" => cookie.path = val.to_string(),
                "expires" => {
                    if let Ok(exp) = DateTime::parse_from_rfc2822(val) {
                        cookie.expires = Some(exp.with_timezone(&Utc));
                    }
                }
                "max-age" => max_age = val.parse::<i64>().ok(),
                "samesite" => cookie.same_site = val.parse().unwrap_or_default(),
                "httponly" => cookie.http_only = true,
                "secure" => cookie.secure = true,
                _ => {}
            }
        }

        if let Some(secs) = max_age {
            cookie.expires = Some(expiry_after(now, secs));
        }

        Some(cookie)
    }
}

/// Resolves `Max-Age` against `now`, clamping instead of overflowing.
fn expiry_after(now: DateTime<Utc>, secs: i64) -> DateTime<Utc> {
    Duration::try_seconds(secs)
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or(if secs > 0 { DateTime::<Utc>::MAX_UTC } else { now })
}

/// SameSite attribute values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SameSite {
    /// Sent with all requests.
    #[default]
    None,
    /// Sent with top-level navigations.
    Lax,
    /// First-party only.
    Strict,
}

impl std::str::FromStr for SameSite {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "lax" => Ok(Self::Lax),
            "strict" => Ok(Self::Strict),
            _ => Err(()),
        }
    }
}

/// Cookies by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookieJar {
    cookies: BTreeMap<String, Cookie>,
}

impl CookieJar {
    /// Creates an empty jar.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cookies: BTreeMap::new(),
        }
    }

    /// Captures every cookie set by a response, expired ones included.
    #[must_use]
    pub fn from_set_cookie_headers<'a>(
        headers: impl IntoIterator<Item = &'a str>,
        request_domain: &str,
        now: DateTime<Utc>,
    ) -> Self {
        let mut jar = Self::new();
        for header in headers {
            if let Some(cookie) = Cookie::from_set_cookie(header, request_domain, now) {
                jar.insert(cookie);
            }
        }
        jar
    }

    /// Stores a cookie as-is, replacing any cookie with the same name.
    pub fn insert(&mut self, cookie: Cookie) {
        self.cookies.insert(cookie.name.clone(), cookie);
    }

    /// Stores a cookie with browser session semantics: an already-expired
    /// cookie deletes the stored one instead.
    pub fn add(&mut self, cookie: Cookie, now: DateTime<Utc>) {
        if cookie.is_expired_at(now) {
            self.cookies.remove(&cookie.name);
        } else {
            self.insert(cookie);
        }
    }

    /// Applies the cookies a response set, with session semantics.
    pub fn apply(&mut self, response_cookies: &Self, now: DateTime<Utc>) {
        for cookie in response_cookies.iter() {
            self.add(cookie.clone(), now);
        }
    }

    /// Looks up a cookie by exact name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Cookie> {
        self.cookies.get(name)
    }

    /// Removes a cookie by name.
    pub fn remove(&mut self, name: &str) -> Option<Cookie> {
        self.cookies.remove(name)
    }

    /// Iterates over cookies in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Cookie> {
        self.cookies.values()
    }

    /// Number of stored cookies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    /// Returns true if the jar is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// Removes every cookie.
    pub fn clear(&mut self) {
        self.cookies.clear();
    }

    /// Builds the Cookie header from cookies still valid at `now`.
    #[must_use]
    pub fn cookie_header(&self, now: DateTime<Utc>) -> Option<String> {
        let pairs: Vec<String> = self
            .cookies
            .values()
            .filter(|c| !c.is_expired_at(now))
            .map(Cookie::to_cookie_header)
            .collect();

        if pairs.is_empty() {
            None
        } else {
            Some(pairs.join("; "))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_set_cookie_attributes() {
        let header = "session=abc123; Path=/app; Domain=.example.com; HttpOnly; Secure; SameSite=Strict";
        let cookie = Cookie::from_set_cookie(header, "localhost", now()).unwrap();

        assert_eq!(cookie.name, "session");
        assert_eq!(cookie.value, "abc123");
        assert_eq!(cookie.path, "/app");
        assert_eq!(cookie.domain, "example.com");
        assert!(cookie.http_only);
        assert!(cookie.secure);
        assert_eq!(cookie.same_site, SameSite::Strict);
        assert!(cookie.is_session());
    }

    #[test]
    fn test_parse_expires() {
        let header = "id=1; Expires=Sat, 01 Jun 2024 11:00:00 GMT";
        let cookie = Cookie::from_set_cookie(header, "localhost", now()).unwrap();
        assert_eq!(cookie.expires, Some(Utc.with_ymd_and_hms(2024, 6, 1, 11, 0, 0).unwrap()));
        assert!(cookie.is_expired_at(now()));
    }

    #[test]
    fn test_max_age_overrides_expires() {
        let header = "id=1; Max-Age=3600; Expires=Sat, 01 Jun 2024 11:00:00 GMT";
        let cookie = Cookie::from_set_cookie(header, "localhost", now()).unwrap();
        assert_eq!(cookie.expires, Some(now() + Duration::hours(1)));
        assert!(!cookie.is_expired_at(now()));
    }

    #[test]
    fn test_huge_max_age_is_clamped() {
        let cookie =
            Cookie::from_set_cookie("a=1; Max-Age=9223372036854775807", "localhost", now()).unwrap();
        assert_eq!(cookie.expires, Some(DateTime::<Utc>::MAX_UTC));

        let cookie =
            Cookie::from_set_cookie("a=1; Max-Age=99999999999999", "localhost", now()).unwrap();
        assert_eq!(cookie.expires, Some(DateTime::<Utc>::MAX_UTC));
        assert!(!cookie.is_expired_at(now()));
    }

    #[test]
    fn test_huge_negative_max_age_expires_now() {
        let cookie =
            Cookie::from_set_cookie("a=1; Max-Age=-9223372036854775808", "localhost", now()).unwrap();
        assert_eq!(cookie.expires, Some(now()));
        assert!(cookie.is_expired_at(now()));
    }

    #[test]
    fn test_parse_rejects_missing_pair() {
        assert!(Cookie::from_set_cookie("garbage", "localhost", now()).is_none());
        assert!(Cookie::from_set_cookie("=value", "localhost", now()).is_none());
    }

    #[test]
    fn test_expiry_boundary_is_expired() {
        let cookie = Cookie::new("a", "1").with_expires(now());
        assert!(cookie.is_expired_at(now()));
    }

    #[test]
    fn test_capture_keeps_expired_cookies() {
        let jar = CookieJar::from_set_cookie_headers(
            ["a=1", "gone=x; Max-Age=0"],
            "localhost",
            now(),
        );
        assert_eq!(jar.len(), 2);
        assert!(jar.get("gone").unwrap().is_expired_at(now()));
    }

    #[test]
    fn test_session_semantics_delete_on_expiry() {
        let mut jar = CookieJar::new();
        let login = CookieJar::from_set_cookie_headers(["token=abc"], "localhost", now());
        jar.apply(&login, now());
        assert_eq!(jar.get("token").unwrap().value, "abc");

        let logout = CookieJar::from_set_cookie_headers(["token=; Max-Age=0"], "localhost", now());
        jar.apply(&logout, now());
        assert!(jar.get("token").is_none());
    }

    #[test]
    fn test_cookie_header_is_name_ordered() {
        let mut jar = CookieJar::new();
        jar.insert(Cookie::new("b", "2"));
        jar.insert(Cookie::new("a", "1"));
        jar.insert(Cookie::new("old", "x").with_expires(now() - Duration::seconds(1)));
        assert_eq!(jar.cookie_header(now()), Some("a=1; b=2".to_string()));
        assert_eq!(CookieJar::new().cookie_header(now()), None);
    }
}
