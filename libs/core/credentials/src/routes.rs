//! Login, refresh and logout endpoints built on the credential core.
//!
//! The identity lookup is a collaborator: anything implementing
//! [`IdentityDirectory`] can back these routes.

use crate::claims::{TokenPair, UserIdentity};
use crate::cookie::RefreshCookieManager;
use crate::error::{AuthError, AuthResult};
use crate::issuer::TokenIssuer;
use crate::policy::CredentialPolicy;
use crate::verifier::TokenVerifier;
use async_trait::async_trait;
use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{AppendHeaders, IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Persistence collaborator that resolves users for issuance.
#[async_trait]
pub trait IdentityDirectory: Send + Sync + 'static {
    /// Check an email/password pair. `Ok(None)` means "no such user or wrong
    /// password"; the two are not distinguished to the caller.
    async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> eyre::Result<Option<UserIdentity>>;

    async fn find_by_id(&self, id: i64) -> eyre::Result<Option<UserIdentity>>;
}

/// Issuer, verifier and cookie manager sharing one policy.
#[derive(Clone)]
pub struct Credentials {
    pub issuer: TokenIssuer,
    pub verifier: TokenVerifier,
    pub cookies: RefreshCookieManager,
}

impl Credentials {
    pub fn new(policy: Arc<CredentialPolicy>) -> Self {
        Self {
            issuer: TokenIssuer::new(policy.clone()),
            verifier: TokenVerifier::new(policy.clone()),
            cookies: RefreshCookieManager::new(policy),
        }
    }
}

/// State for the auth routes
pub struct AuthState<D: IdentityDirectory> {
    pub credentials: Credentials,
    pub directory: Arc<D>,
}

impl<D: IdentityDirectory> AuthState<D> {
    pub fn new(credentials: Credentials, directory: Arc<D>) -> Self {
        Self {
            credentials,
            directory,
        }
    }
}

// Manual impl: `D` itself need not be `Clone`.
impl<D: IdentityDirectory> Clone for AuthState<D> {
    fn clone(&self) -> Self {
        Self {
            credentials: self.credentials.clone(),
            directory: self.directory.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Public auth routes: `POST /authenticate`, `GET /refresh`, `GET /logout`.
pub fn routes<D: IdentityDirectory>(state: AuthState<D>) -> Router {
    Router::new()
        .route("/authenticate", post(authenticate::<D>))
        .route("/refresh", get(refresh::<D>))
        .route("/logout", get(logout::<D>))
        .with_state(state)
}

/// Exchange email/password for a token pair plus refresh cookie.
async fn authenticate<D: IdentityDirectory>(
    State(state): State<AuthState<D>>,
    Json(input): Json<LoginRequest>,
) -> AuthResult<Response> {
    let identity = state
        .directory
        .verify_credentials(&input.email, &input.password)
        .await
        .map_err(|e| {
            tracing::error!("Failed to verify credentials: {:?}", e);
            AuthError::Internal("Failed to verify credentials".to_string())
        })?
        .ok_or(AuthError::InvalidCredentials)?;

    tracing::info!(sub = identity.id, "User authenticated");
    issue_with_cookie(&state.credentials, &identity, StatusCode::ACCEPTED)
}

/// Mint a fresh pair from a valid refresh cookie.
async fn refresh<D: IdentityDirectory>(
    State(state): State<AuthState<D>>,
    headers: HeaderMap,
) -> AuthResult<Response> {
    let credentials = &state.credentials;

    let token = credentials
        .cookies
        .read_refresh_token(&headers)
        .ok_or(AuthError::MissingRefreshCookie)?;

    let claims = credentials.verifier.verify_refresh(&token)?;

    let user_id: i64 = claims.sub.parse().map_err(|_| AuthError::UnknownSubject)?;

    let identity = state
        .directory
        .find_by_id(user_id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to look up user {}: {:?}", user_id, e);
            AuthError::Internal("Failed to look up user".to_string())
        })?
        .ok_or(AuthError::UnknownSubject)?;

    tracing::debug!(sub = identity.id, "Refreshed token pair");
    issue_with_cookie(credentials, &identity, StatusCode::OK)
}

/// Instruct the client to drop its refresh cookie.
async fn logout<D: IdentityDirectory>(State(state): State<AuthState<D>>) -> AuthResult<Response> {
    let clear = state
        .credentials
        .cookies
        .build_clear_cookie()
        .to_header_value()
        .map_err(|e| AuthError::Internal(format!("Failed to create cookie: {}", e)))?;

    Ok((
        StatusCode::ACCEPTED,
        AppendHeaders([(header::SET_COOKIE, clear)]),
    )
        .into_response())
}

fn issue_with_cookie(
    credentials: &Credentials,
    identity: &UserIdentity,
    status: StatusCode,
) -> AuthResult<Response> {
    let pair: TokenPair = credentials.issuer.issue_pair(identity)?;

    let cookie = credentials
        .cookies
        .build_set_cookie(&pair.refresh_token)
        .to_header_value()
        .map_err(|e| AuthError::Internal(format!("Failed to create cookie: {}", e)))?;

    Ok((status, AppendHeaders([(header::SET_COOKIE, cookie)]), Json(pair)).into_response())
}
