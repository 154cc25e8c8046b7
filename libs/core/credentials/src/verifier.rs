use crate::claims::{AccessClaims, RefreshClaims, TokenClaims};
use crate::error::VerifyError;
use crate::policy::CredentialPolicy;
use axum::http::{
    HeaderMap, HeaderValue,
    header::{AUTHORIZATION, VARY},
};
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, errors::ErrorKind};
use std::sync::Arc;

/// The only authorization scheme accepted.
pub const BEARER_SCHEME: &str = "Bearer";

/// HMAC family accepted on inbound tokens. Anything else (including `none`
/// and every asymmetric algorithm) is refused before the signature is checked.
pub const ACCEPTED_ALGORITHMS: [Algorithm; 3] =
    [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// Validates bearer headers and refresh cookie values against the policy.
#[derive(Clone)]
pub struct TokenVerifier {
    policy: Arc<CredentialPolicy>,
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(policy: Arc<CredentialPolicy>) -> Self {
        let key = DecodingKey::from_secret(policy.secret().as_bytes());

        // Expiry and issuer are checked here rather than by the decoder so
        // that "at or past exp" is exact and every failure maps to one variant.
        // Audience is embedded at issuance but intentionally not validated.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = ACCEPTED_ALGORITHMS.to_vec();
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.leeway = 0;

        Self {
            policy,
            key,
            validation,
        }
    }

    pub fn policy(&self) -> &CredentialPolicy {
        &self.policy
    }

    /// Verify a request's `Authorization` header.
    ///
    /// Always appends `Vary: Authorization` to `response` first, so caches
    /// key on the header whether or not the request is let through.
    pub fn verify_request(
        &self,
        request: &HeaderMap,
        response: &mut HeaderMap,
    ) -> Result<AccessClaims, VerifyError> {
        response.append(VARY, HeaderValue::from_static("Authorization"));

        let header_value = match request.get(AUTHORIZATION) {
            None => "",
            Some(value) => value.to_str().map_err(|_| VerifyError::MalformedHeader)?,
        };

        self.verify_bearer(header_value)
    }

    /// Verify a raw `Authorization` header value against the current time.
    pub fn verify_bearer(&self, header_value: &str) -> Result<AccessClaims, VerifyError> {
        self.verify_bearer_at(header_value, Utc::now())
    }

    pub fn verify_bearer_at(
        &self,
        header_value: &str,
        now: DateTime<Utc>,
    ) -> Result<AccessClaims, VerifyError> {
        if header_value.is_empty() {
            return Err(VerifyError::MissingHeader);
        }

        let parts: Vec<&str> = header_value.split(' ').collect();
        let [scheme, token] = parts.as_slice() else {
            return Err(VerifyError::MalformedHeader);
        };
        if *scheme != BEARER_SCHEME {
            return Err(VerifyError::MalformedHeader);
        }

        let claims: AccessClaims = self.open(token, now)?;

        if claims.iss != self.policy.issuer() {
            return Err(VerifyError::InvalidIssuer);
        }

        Ok(claims)
    }

    /// Verify a refresh cookie value against the current time.
    ///
    /// Refresh claims carry no issuer, so only signature and expiry apply.
    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, VerifyError> {
        self.verify_refresh_at(token, Utc::now())
    }

    pub fn verify_refresh_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<RefreshClaims, VerifyError> {
        self.open(token, now)
    }

    /// Signature, algorithm family and expiry shared by both token kinds.
    fn open<C: TokenClaims>(&self, token: &str, now: DateTime<Utc>) -> Result<C, VerifyError> {
        let data = decode::<C>(token, &self.key, &self.validation).map_err(|e| classify(e.kind()))?;

        if now.timestamp() >= data.claims.expires_at() {
            return Err(VerifyError::ExpiredToken);
        }

        Ok(data.claims)
    }
}

fn classify(kind: &ErrorKind) -> VerifyError {
    match kind {
        ErrorKind::ExpiredSignature => VerifyError::ExpiredToken,
        ErrorKind::InvalidIssuer => VerifyError::InvalidIssuer,
        // Bad signature, foreign algorithm, and undecodable segments alike.
        _ => VerifyError::InvalidSignature,
    }
}
