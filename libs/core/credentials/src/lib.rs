//! # Credentials
//!
//! Stateless bearer credentials: a short-lived access token sent per request
//! and a longer-lived refresh token that only ever travels in a hardened
//! cookie. Both are compact HS256 JWTs signed with the policy secret.
//!
//! ## Modules
//!
//! - **[`policy`]**: issuer/audience, secret, lifetimes, cookie placement
//! - **[`issuer`]**: [`TokenIssuer`] mints access/refresh pairs
//! - **[`verifier`]**: [`TokenVerifier`] checks bearer headers and refresh cookies
//! - **[`cookie`]**: [`RefreshCookieManager`] builds set/clear cookie directives
//! - **[`middleware`]**: [`require_bearer`] gate for protected routes
//! - **[`routes`]**: `/authenticate`, `/refresh`, `/logout`
//!
//! There is no revocation list: a token stays valid until its `exp`. The
//! audience claim is written at issuance but not validated on verification,
//! which suits a single-audience deployment.
//!
//! ## Quick Start
//!
//! ```ignore
//! use axum::{Router, middleware::from_fn_with_state};
//! use core_config::FromEnv;
//! use credentials::{AuthState, CredentialPolicy, Credentials, require_bearer, routes};
//! use std::sync::Arc;
//!
//! let policy = Arc::new(CredentialPolicy::from_env()?);
//! let credentials = Credentials::new(policy);
//!
//! let app = Router::new()
//!     .merge(routes(AuthState::new(credentials.clone(), directory)))
//!     .nest("/admin", admin_routes.layer(from_fn_with_state(
//!         credentials.verifier.clone(),
//!         require_bearer,
//!     )));
//! ```

pub mod claims;
pub mod config;
pub mod cookie;
pub mod error;
pub mod issuer;
pub mod middleware;
pub mod policy;
pub mod routes;
pub mod verifier;

pub use claims::{AccessClaims, RefreshClaims, TokenClaims, TokenPair, UserIdentity};
pub use cookie::{RefreshCookie, RefreshCookieManager, SameSite};
pub use error::{
    AuthError, AuthResult, CookieAttribute, IssueError, PolicyError, TokenKind, VerifyError,
};
pub use issuer::TokenIssuer;
pub use middleware::require_bearer;
pub use policy::{CookieSettings, CredentialPolicy, SigningSecret};
pub use routes::{AuthState, Credentials, IdentityDirectory, LoginRequest, routes};
pub use verifier::TokenVerifier;
