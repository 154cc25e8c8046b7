//! Credential policy: the immutable bundle shared by issuance, verification
//! and cookie handling.

use crate::error::{CookieAttribute, PolicyError, TokenKind};
use chrono::Duration;
use std::fmt;

/// Upper bound on either token lifetime: one year.
pub const MAX_LIFETIME_SECS: i64 = 365 * 24 * 60 * 60;

/// HMAC signing key.
///
/// Deliberately has no `Display` or `Serialize`, and `Debug` is redacted.
#[derive(Clone)]
pub struct SigningSecret(Vec<u8>);

impl SigningSecret {
    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningSecret(<redacted>)")
    }
}

impl From<Vec<u8>> for SigningSecret {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<String> for SigningSecret {
    fn from(secret: String) -> Self {
        Self(secret.into_bytes())
    }
}

impl From<&str> for SigningSecret {
    fn from(secret: &str) -> Self {
        Self(secret.as_bytes().to_vec())
    }
}

/// Where the refresh cookie lives on the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieSettings {
    pub name: String,
    pub path: String,
    pub domain: String,
}

impl CookieSettings {
    /// Reject values that would break out of their attribute when rendered
    /// into a `Set-Cookie` header.
    fn validate(&self) -> Result<(), PolicyError> {
        // RFC 6265 cookie-name: a token, so no separators, spaces or controls.
        let name_ok = !self.name.is_empty()
            && self
                .name
                .bytes()
                .all(|b| b.is_ascii_graphic() && !b"()<>@,;:\\\"/[]?={}".contains(&b));
        if !name_ok {
            return Err(PolicyError::InvalidCookieAttribute(CookieAttribute::Name));
        }

        // path-value: any CHAR except CTLs or ";"
        if self.path.bytes().any(|b| b.is_ascii_control() || b == b';' || !b.is_ascii()) {
            return Err(PolicyError::InvalidCookieAttribute(CookieAttribute::Path));
        }

        if !self
            .domain
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'.')
        {
            return Err(PolicyError::InvalidCookieAttribute(CookieAttribute::Domain));
        }

        Ok(())
    }
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self {
            name: "refresh_token".to_string(),
            path: "/".to_string(),
            domain: "localhost".to_string(),
        }
    }
}

/// Issuer/audience identities, signing secret, token lifetimes and cookie
/// placement. Built once at startup and shared behind an `Arc`.
///
/// Invariants: `0 < access_ttl < refresh_ttl <= MAX_LIFETIME_SECS`, and the
/// cookie placement renders as exactly its own attributes.
#[derive(Debug, Clone)]
pub struct CredentialPolicy {
    issuer: String,
    audience: String,
    secret: SigningSecret,
    access_ttl: Duration,
    refresh_ttl: Duration,
    cookie: CookieSettings,
}

impl CredentialPolicy {
    pub fn new(
        issuer: impl Into<String>,
        audience: impl Into<String>,
        secret: impl Into<SigningSecret>,
        access_ttl: Duration,
        refresh_ttl: Duration,
        cookie: CookieSettings,
    ) -> Result<Self, PolicyError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(PolicyError::EmptySecret);
        }
        if access_ttl <= Duration::zero() {
            return Err(PolicyError::NonPositiveLifetime(access_ttl.num_seconds()));
        }
        if access_ttl >= refresh_ttl {
            return Err(PolicyError::LifetimeOrder {
                access: access_ttl.num_seconds(),
                refresh: refresh_ttl.num_seconds(),
            });
        }
        if refresh_ttl > Duration::seconds(MAX_LIFETIME_SECS) {
            return Err(PolicyError::LifetimeTooLong {
                kind: TokenKind::Refresh,
                got: refresh_ttl.num_seconds(),
                max: MAX_LIFETIME_SECS,
            });
        }
        cookie.validate()?;

        Ok(Self {
            issuer: issuer.into(),
            audience: audience.into(),
            secret,
            access_ttl,
            refresh_ttl,
            cookie,
        })
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    pub(crate) fn secret(&self) -> &SigningSecret {
        &self.secret
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    pub fn cookie(&self) -> &CookieSettings {
        &self.cookie
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(access: i64, refresh: i64, secret: &str) -> Result<CredentialPolicy, PolicyError> {
        CredentialPolicy::new(
            "example.com",
            "example.com",
            secret,
            Duration::seconds(access),
            Duration::seconds(refresh),
            CookieSettings::default(),
        )
    }

    #[test]
    fn test_policy_accepts_valid_lifetimes() {
        let policy = policy(900, 86_400, "secret").unwrap();
        assert_eq!(policy.issuer(), "example.com");
        assert_eq!(policy.access_ttl(), Duration::minutes(15));
        assert_eq!(policy.refresh_ttl(), Duration::hours(24));
        assert_eq!(policy.cookie().name, "refresh_token");
    }

    #[test]
    fn test_policy_rejects_empty_secret() {
        assert_eq!(policy(900, 86_400, "").unwrap_err(), PolicyError::EmptySecret);
    }

    #[test]
    fn test_policy_rejects_access_not_shorter_than_refresh() {
        assert_eq!(
            policy(3600, 3600, "secret").unwrap_err(),
            PolicyError::LifetimeOrder {
                access: 3600,
                refresh: 3600
            }
        );
        assert!(policy(7200, 3600, "secret").is_err());
    }

    #[test]
    fn test_policy_rejects_non_positive_access_lifetime() {
        assert_eq!(
            policy(-1, 3600, "secret").unwrap_err(),
            PolicyError::NonPositiveLifetime(-1)
        );
        assert!(policy(0, 3600, "secret").is_err());
    }

    #[test]
    fn test_policy_rejects_refresh_lifetime_beyond_maximum() {
        assert_eq!(
            policy(900, 10_000_000_000_000, "secret").unwrap_err(),
            PolicyError::LifetimeTooLong {
                kind: TokenKind::Refresh,
                got: 10_000_000_000_000,
                max: MAX_LIFETIME_SECS,
            }
        );
        assert!(policy(900, MAX_LIFETIME_SECS, "secret").is_ok());
        assert!(policy(900, MAX_LIFETIME_SECS + 1, "secret").is_err());
    }

    fn with_cookie(cookie: CookieSettings) -> Result<CredentialPolicy, PolicyError> {
        CredentialPolicy::new(
            "example.com",
            "example.com",
            "secret",
            Duration::minutes(15),
            Duration::hours(24),
            cookie,
        )
    }

    #[test]
    fn test_policy_rejects_cookie_attribute_injection() {
        let cases = [
            ("refresh_token", "/; SameSite=None", "localhost", CookieAttribute::Path),
            ("refresh_token", "/\r\nSet-Cookie: x=y", "localhost", CookieAttribute::Path),
            ("refresh=token", "/", "localhost", CookieAttribute::Name),
            ("refresh token", "/", "localhost", CookieAttribute::Name),
            ("", "/", "localhost", CookieAttribute::Name),
            ("refresh_token", "/", "example.com; Secure", CookieAttribute::Domain),
        ];

        for (name, path, domain, attribute) in cases {
            let cookie = CookieSettings {
                name: name.to_string(),
                path: path.to_string(),
                domain: domain.to_string(),
            };
            assert_eq!(
                with_cookie(cookie).unwrap_err(),
                PolicyError::InvalidCookieAttribute(attribute),
                "{name:?} {path:?} {domain:?}"
            );
        }
    }

    #[test]
    fn test_policy_accepts_ordinary_cookie_placement() {
        let cookie = CookieSettings {
            name: "__Host-refresh".to_string(),
            path: "/auth/v1".to_string(),
            domain: ".example.org".to_string(),
        };
        assert!(with_cookie(cookie).is_ok());

        let no_domain = CookieSettings {
            domain: String::new(),
            ..CookieSettings::default()
        };
        assert!(with_cookie(no_domain).is_ok());
    }

    #[test]
    fn test_debug_output_redacts_secret() {
        let policy = policy(900, 86_400, "hunter2-hunter2").unwrap();
        let rendered = format!("{:?}", policy);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }
}
