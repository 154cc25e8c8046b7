use crate::claims::{ACCESS_TOKEN_TYPE, AccessClaims, RefreshClaims, TokenPair, UserIdentity};
use crate::error::{IssueError, TokenKind};
use crate::policy::CredentialPolicy;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::Serialize;
use std::sync::Arc;

/// Algorithm used for every token this service signs.
pub const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;

/// Mints access/refresh token pairs.
///
/// Stateless: two calls for the same identity yield two independent pairs and
/// neither invalidates the other.
#[derive(Clone)]
pub struct TokenIssuer {
    policy: Arc<CredentialPolicy>,
    key: EncodingKey,
}

impl TokenIssuer {
    pub fn new(policy: Arc<CredentialPolicy>) -> Self {
        let key = EncodingKey::from_secret(policy.secret().as_bytes());
        Self { policy, key }
    }

    pub fn policy(&self) -> &CredentialPolicy {
        &self.policy
    }

    /// Issue a pair stamped with the current UTC time.
    pub fn issue_pair(&self, identity: &UserIdentity) -> Result<TokenPair, IssueError> {
        self.issue_pair_at(identity, Utc::now())
    }

    /// Issue a pair as if the clock read `now`.
    pub fn issue_pair_at(
        &self,
        identity: &UserIdentity,
        now: DateTime<Utc>,
    ) -> Result<TokenPair, IssueError> {
        let subject = identity.id.to_string();
        let iat = now.timestamp();

        let access = AccessClaims {
            sub: subject.clone(),
            name: identity.display_name(),
            iss: self.policy.issuer().to_string(),
            aud: self.policy.audience().to_string(),
            iat,
            exp: expiry(now, self.policy.access_ttl(), TokenKind::Access)?,
            typ: ACCESS_TOKEN_TYPE.to_string(),
        };

        let refresh = RefreshClaims {
            sub: subject,
            iat,
            exp: expiry(now, self.policy.refresh_ttl(), TokenKind::Refresh)?,
        };

        let pair = TokenPair {
            access_token: self.sign(TokenKind::Access, &access)?,
            refresh_token: self.sign(TokenKind::Refresh, &refresh)?,
        };

        tracing::debug!(
            sub = %access.sub,
            access_exp = access.exp,
            refresh_exp = refresh.exp,
            "Issued token pair"
        );

        Ok(pair)
    }

    fn sign<C: Serialize>(&self, kind: TokenKind, claims: &C) -> Result<String, IssueError> {
        encode(&Header::new(SIGNING_ALGORITHM), claims, &self.key)
            .map_err(|source| IssueError::Signing { kind, source })
    }
}

fn expiry(now: DateTime<Utc>, ttl: Duration, kind: TokenKind) -> Result<i64, IssueError> {
    now.checked_add_signed(ttl)
        .map(|at| at.timestamp())
        .ok_or(IssueError::ExpiryOutOfRange { kind })
}
