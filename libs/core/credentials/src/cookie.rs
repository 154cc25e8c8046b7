//! Refresh cookie directives.
//!
//! The refresh token never reaches page script: it only travels in an
//! `HttpOnly; Secure; SameSite=Strict` cookie. Logout is a client-side
//! deletion instruction, since there is no server-side session to revoke.

use crate::policy::CredentialPolicy;
use axum::http::{
    HeaderMap, HeaderValue,
    header::{COOKIE, InvalidHeaderValue},
};
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;

/// IMF-fixdate, as required for the `Expires` attribute.
const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SameSite::Strict => write!(f, "Strict"),
            SameSite::Lax => write!(f, "Lax"),
        }
    }
}

/// A structured `Set-Cookie` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshCookie {
    pub name: String,
    pub value: String,
    pub path: String,
    pub domain: String,
    pub expires: DateTime<Utc>,
    /// Seconds. Negative means "delete now".
    pub max_age: i64,
    pub same_site: SameSite,
    pub http_only: bool,
    pub secure: bool,
}

impl RefreshCookie {
    pub fn to_header_value(&self) -> Result<HeaderValue, InvalidHeaderValue> {
        HeaderValue::from_str(&self.to_string())
    }
}

impl fmt::Display for RefreshCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)?;
        if !self.path.is_empty() {
            write!(f, "; Path={}", self.path)?;
        }
        if !self.domain.is_empty() {
            write!(f, "; Domain={}", self.domain.trim_start_matches('.'))?;
        }
        write!(f, "; Expires={}", self.expires.format(HTTP_DATE_FORMAT))?;
        write!(f, "; Max-Age={}", self.max_age.max(0))?;
        if self.http_only {
            f.write_str("; HttpOnly")?;
        }
        if self.secure {
            f.write_str("; Secure")?;
        }
        write!(f, "; SameSite={}", self.same_site)
    }
}

/// Renders refresh tokens into hardened cookies and back out of requests.
#[derive(Clone, Debug)]
pub struct RefreshCookieManager {
    policy: Arc<CredentialPolicy>,
}

impl RefreshCookieManager {
    pub fn new(policy: Arc<CredentialPolicy>) -> Self {
        Self { policy }
    }

    pub fn build_set_cookie(&self, refresh_token: &str) -> RefreshCookie {
        self.build_set_cookie_at(refresh_token, Utc::now())
    }

    pub fn build_set_cookie_at(&self, refresh_token: &str, now: DateTime<Utc>) -> RefreshCookie {
        let lifetime = self.policy.refresh_ttl();
        let expires = now
            .checked_add_signed(lifetime)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.directive(refresh_token.to_string(), expires, lifetime.num_seconds())
    }

    /// Same placement and flags, empty value, expired at the Unix epoch.
    pub fn build_clear_cookie(&self) -> RefreshCookie {
        self.directive(String::new(), DateTime::<Utc>::UNIX_EPOCH, -1)
    }

    /// Find the refresh cookie among the request's `Cookie` headers.
    pub fn read_refresh_token(&self, headers: &HeaderMap) -> Option<String> {
        let name = self.policy.cookie().name.as_str();
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|cookies| cookies.split(';'))
            .find_map(|pair| {
                let (key, value) = pair.trim().split_once('=')?;
                (key == name).then(|| value.to_string())
            })
    }

    fn directive(&self, value: String, expires: DateTime<Utc>, max_age: i64) -> RefreshCookie {
        let placement = self.policy.cookie();
        RefreshCookie {
            name: placement.name.clone(),
            value,
            path: placement.path.clone(),
            domain: placement.domain.clone(),
            expires,
            max_age,
            same_site: SameSite::Strict,
            http_only: true,
            secure: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::CookieSettings;
    use chrono::{Duration, TimeZone};

    fn manager() -> RefreshCookieManager {
        let policy = CredentialPolicy::new(
            "example.com",
            "example.com",
            "cookie-test-secret",
            Duration::minutes(15),
            Duration::hours(24),
            CookieSettings::default(),
        )
        .unwrap();
        RefreshCookieManager::new(Arc::new(policy))
    }

    #[test]
    fn test_set_cookie_attributes() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let cookie = manager().build_set_cookie_at("a.b.c", now);

        assert_eq!(cookie.name, "refresh_token");
        assert_eq!(cookie.value, "a.b.c");
        assert_eq!(cookie.path, "/");
        assert_eq!(cookie.domain, "localhost");
        assert_eq!(cookie.expires, now + Duration::hours(24));
        assert_eq!(cookie.max_age, 86_400);
        assert_eq!(cookie.same_site, SameSite::Strict);
        assert!(cookie.http_only);
        assert!(cookie.secure);
    }

    #[test]
    fn test_set_cookie_rendering() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let cookie = manager().build_set_cookie_at("a.b.c", now);

        assert_eq!(
            cookie.to_string(),
            "refresh_token=a.b.c; Path=/; Domain=localhost; \
             Expires=Thu, 02 May 2024 12:00:00 GMT; Max-Age=86400; \
             HttpOnly; Secure; SameSite=Strict"
        );
        assert!(cookie.to_header_value().is_ok());
    }

    #[test]
    fn test_set_cookie_expiry_saturates_at_end_of_calendar() {
        let cookie = manager().build_set_cookie_at("a.b.c", DateTime::<Utc>::MAX_UTC);
        assert_eq!(cookie.expires, DateTime::<Utc>::MAX_UTC);
        assert_eq!(cookie.max_age, 86_400);
    }

    #[test]
    fn test_clear_cookie() {
        let cookie = manager().build_clear_cookie();

        assert_eq!(cookie.value, "");
        assert!(cookie.max_age < 0);
        assert_eq!(cookie.expires.timestamp(), 0);
        assert!(cookie.http_only);
        assert!(cookie.secure);
        assert_eq!(cookie.same_site, SameSite::Strict);
        assert_eq!(
            cookie.to_string(),
            "refresh_token=; Path=/; Domain=localhost; \
             Expires=Thu, 01 Jan 1970 00:00:00 GMT; Max-Age=0; \
             HttpOnly; Secure; SameSite=Strict"
        );
    }

    #[test]
    fn test_read_refresh_token() {
        let manager = manager();
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("theme=dark"));
        headers.append(
            COOKIE,
            HeaderValue::from_static("session=xyz; refresh_token=a.b.c; lang=en"),
        );

        assert_eq!(manager.read_refresh_token(&headers).as_deref(), Some("a.b.c"));
    }

    #[test]
    fn test_read_refresh_token_absent() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("refresh_token_old=zzz"));
        assert_eq!(manager().read_refresh_token(&headers), None);
        assert_eq!(manager().read_refresh_token(&HeaderMap::new()), None);
    }
}
