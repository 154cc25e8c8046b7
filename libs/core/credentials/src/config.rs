//! Loading [`CredentialPolicy`] from the environment.
//!
//! Variables:
//! - `JWT_SECRET` (required) - at least 32 characters
//! - `JWT_ISSUER` / `JWT_AUDIENCE` - default `example.com`
//! - `JWT_ACCESS_TTL_SECS` - default 900 (15 minutes)
//! - `JWT_REFRESH_TTL_SECS` - default 86400 (24 hours), at most one year
//! - `COOKIE_NAME` / `COOKIE_PATH` / `COOKIE_DOMAIN` - default
//!   `refresh_token`, `/`, `localhost`
//!
//! ```ignore
//! use core_config::FromEnv;
//! use credentials::CredentialPolicy;
//!
//! let policy = std::sync::Arc::new(CredentialPolicy::from_env()?);
//! ```

use crate::error::{CookieAttribute, PolicyError, TokenKind};
use crate::policy::{CookieSettings, CredentialPolicy};
use chrono::Duration;
use core_config::{ConfigError, FromEnv, env_or_default, env_parse_or_default, env_required};

pub const MIN_SECRET_LEN: usize = 32;
pub const DEFAULT_ACCESS_TTL_SECS: i64 = 900;
pub const DEFAULT_REFRESH_TTL_SECS: i64 = 86_400;

impl FromEnv for CredentialPolicy {
    fn from_env() -> Result<Self, ConfigError> {
        let secret = env_required("JWT_SECRET")?;
        if secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::parse(
                "JWT_SECRET",
                format!(
                    "must be at least {} characters for security (got {}). Generate one with: openssl rand -base64 32",
                    MIN_SECRET_LEN,
                    secret.len()
                ),
            ));
        }

        let access_ttl = env_parse_or_default("JWT_ACCESS_TTL_SECS", DEFAULT_ACCESS_TTL_SECS)?;
        let refresh_ttl = env_parse_or_default("JWT_REFRESH_TTL_SECS", DEFAULT_REFRESH_TTL_SECS)?;

        let cookie = CookieSettings {
            name: env_or_default("COOKIE_NAME", "refresh_token"),
            path: env_or_default("COOKIE_PATH", "/"),
            domain: env_or_default("COOKIE_DOMAIN", "localhost"),
        };

        CredentialPolicy::new(
            env_or_default("JWT_ISSUER", "example.com"),
            env_or_default("JWT_AUDIENCE", "example.com"),
            secret,
            seconds("JWT_ACCESS_TTL_SECS", access_ttl)?,
            seconds("JWT_REFRESH_TTL_SECS", refresh_ttl)?,
            cookie,
        )
        .map_err(|e| ConfigError::parse(env_key(&e), e))
    }
}

fn seconds(key: &str, secs: i64) -> Result<Duration, ConfigError> {
    Duration::try_seconds(secs)
        .ok_or_else(|| ConfigError::parse(key, format!("{} seconds is out of range", secs)))
}

/// The variable an operator should look at for a rejected policy.
fn env_key(error: &PolicyError) -> &'static str {
    match error {
        PolicyError::EmptySecret => "JWT_SECRET",
        PolicyError::NonPositiveLifetime(_) => "JWT_ACCESS_TTL_SECS",
        PolicyError::LifetimeTooLong {
            kind: TokenKind::Access,
            ..
        } => "JWT_ACCESS_TTL_SECS",
        PolicyError::LifetimeOrder { .. } | PolicyError::LifetimeTooLong { .. } => {
            "JWT_REFRESH_TTL_SECS"
        }
        PolicyError::InvalidCookieAttribute(CookieAttribute::Name) => "COOKIE_NAME",
        PolicyError::InvalidCookieAttribute(CookieAttribute::Path) => "COOKIE_PATH",
        PolicyError::InvalidCookieAttribute(CookieAttribute::Domain) => "COOKIE_DOMAIN",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "this-is-a-valid-secret-with-32-chars!";

    const ALL_VARS: [&str; 8] = [
        "JWT_SECRET",
        "JWT_ISSUER",
        "JWT_AUDIENCE",
        "JWT_ACCESS_TTL_SECS",
        "JWT_REFRESH_TTL_SECS",
        "COOKIE_NAME",
        "COOKIE_PATH",
        "COOKIE_DOMAIN",
    ];

    fn with_env<F: FnOnce()>(vars: &[(&str, &str)], f: F) {
        let pairs: Vec<(&str, Option<&str>)> = ALL_VARS
            .iter()
            .map(|key| {
                let value = vars.iter().find(|(k, _)| k == key).map(|(_, v)| *v);
                (*key, value)
            })
            .collect();
        temp_env::with_vars(pairs, f);
    }

    #[test]
    fn test_policy_from_env_defaults() {
        with_env(&[("JWT_SECRET", SECRET)], || {
            let policy = CredentialPolicy::from_env().unwrap();
            assert_eq!(policy.issuer(), "example.com");
            assert_eq!(policy.audience(), "example.com");
            assert_eq!(policy.access_ttl(), Duration::minutes(15));
            assert_eq!(policy.refresh_ttl(), Duration::hours(24));
            assert_eq!(policy.cookie(), &CookieSettings::default());
        });
    }

    #[test]
    fn test_policy_from_env_custom_values() {
        with_env(
            &[
                ("JWT_SECRET", SECRET),
                ("JWT_ISSUER", "auth.example.org"),
                ("JWT_AUDIENCE", "app.example.org"),
                ("JWT_ACCESS_TTL_SECS", "60"),
                ("JWT_REFRESH_TTL_SECS", "3600"),
                ("COOKIE_NAME", "__Host-refresh"),
                ("COOKIE_PATH", "/auth"),
                ("COOKIE_DOMAIN", "example.org"),
            ],
            || {
                let policy = CredentialPolicy::from_env().unwrap();
                assert_eq!(policy.issuer(), "auth.example.org");
                assert_eq!(policy.audience(), "app.example.org");
                assert_eq!(policy.access_ttl(), Duration::seconds(60));
                assert_eq!(policy.refresh_ttl(), Duration::seconds(3600));
                assert_eq!(policy.cookie().name, "__Host-refresh");
                assert_eq!(policy.cookie().path, "/auth");
                assert_eq!(policy.cookie().domain, "example.org");
            },
        );
    }

    #[test]
    fn test_policy_from_env_missing_secret() {
        with_env(&[], || {
            let err = CredentialPolicy::from_env().unwrap_err();
            assert!(err.to_string().contains("JWT_SECRET"));
        });
    }

    #[test]
    fn test_policy_from_env_short_secret_is_not_echoed() {
        with_env(&[("JWT_SECRET", "tiny-secret")], || {
            let err = CredentialPolicy::from_env().unwrap_err().to_string();
            assert!(err.contains("32 characters"));
            assert!(!err.contains("tiny-secret"));
        });
    }

    #[test]
    fn test_policy_from_env_rejects_inverted_lifetimes() {
        with_env(
            &[
                ("JWT_SECRET", SECRET),
                ("JWT_ACCESS_TTL_SECS", "7200"),
                ("JWT_REFRESH_TTL_SECS", "3600"),
            ],
            || {
                let err = CredentialPolicy::from_env().unwrap_err().to_string();
                assert!(err.contains("shorter than refresh"));
                assert!(err.contains("JWT_REFRESH_TTL_SECS"));
            },
        );
    }

    #[test]
    fn test_policy_from_env_rejects_unparseable_ttl() {
        with_env(
            &[("JWT_SECRET", SECRET), ("JWT_REFRESH_TTL_SECS", "a day")],
            || {
                let err = CredentialPolicy::from_env().unwrap_err();
                assert!(err.to_string().contains("JWT_REFRESH_TTL_SECS"));
            },
        );
    }

    #[test]
    fn test_policy_from_env_rejects_out_of_range_ttl() {
        with_env(
            &[
                ("JWT_SECRET", SECRET),
                ("JWT_REFRESH_TTL_SECS", "9223372036854775807"),
            ],
            || {
                let err = CredentialPolicy::from_env().unwrap_err().to_string();
                assert!(err.contains("JWT_REFRESH_TTL_SECS"));
                assert!(err.contains("out of range"));
            },
        );
    }

    #[test]
    fn test_policy_from_env_rejects_refresh_ttl_beyond_a_year() {
        with_env(
            &[
                ("JWT_SECRET", SECRET),
                ("JWT_REFRESH_TTL_SECS", "10000000000000"),
            ],
            || {
                let err = CredentialPolicy::from_env().unwrap_err().to_string();
                assert!(err.contains("JWT_REFRESH_TTL_SECS"));
                assert!(err.contains("exceeds the maximum"));
            },
        );
    }

    #[test]
    fn test_policy_from_env_rejects_injected_cookie_path() {
        with_env(
            &[("JWT_SECRET", SECRET), ("COOKIE_PATH", "/; SameSite=None")],
            || {
                let err = CredentialPolicy::from_env().unwrap_err().to_string();
                assert!(err.contains("COOKIE_PATH"));
            },
        );
    }
}
