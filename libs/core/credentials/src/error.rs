use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;
use thiserror::Error;

/// Which half of a token pair an operation was working on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Access => write!(f, "access"),
            TokenKind::Refresh => write!(f, "refresh"),
        }
    }
}

/// Rejected policy construction. Messages never include the secret.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("signing secret must not be empty")]
    EmptySecret,

    #[error("access token lifetime must be positive (got {0}s)")]
    NonPositiveLifetime(i64),

    #[error("access token lifetime ({access}s) must be shorter than refresh token lifetime ({refresh}s)")]
    LifetimeOrder { access: i64, refresh: i64 },

    #[error("{kind} token lifetime ({got}s) exceeds the maximum of {max}s")]
    LifetimeTooLong { kind: TokenKind, got: i64, max: i64 },

    #[error("cookie {0} contains characters not allowed in a Set-Cookie header")]
    InvalidCookieAttribute(CookieAttribute),
}

/// A configurable part of the refresh cookie's placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CookieAttribute {
    Name,
    Path,
    Domain,
}

impl fmt::Display for CookieAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CookieAttribute::Name => write!(f, "name"),
            CookieAttribute::Path => write!(f, "path"),
            CookieAttribute::Domain => write!(f, "domain"),
        }
    }
}

/// Issuance failed: an encoder fault or an expiry past the end of the
/// calendar. Callers treat it as an internal error rather than a client problem.
#[derive(Debug, Error)]
pub enum IssueError {
    #[error("failed to sign {kind} token")]
    Signing {
        kind: TokenKind,
        #[source]
        source: jsonwebtoken::errors::Error,
    },

    #[error("{kind} token expiry is outside the representable time range")]
    ExpiryOutOfRange { kind: TokenKind },
}

/// Why a presented credential was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("no authorization header present")]
    MissingHeader,

    #[error("authorization header is not of the form 'Bearer <token>'")]
    MalformedHeader,

    #[error("token signature or algorithm is not acceptable")]
    InvalidSignature,

    #[error("token has expired")]
    ExpiredToken,

    #[error("token was not issued by this service")]
    InvalidIssuer,
}

impl VerifyError {
    /// Stable code for log fields.
    pub fn reason(&self) -> &'static str {
        match self {
            VerifyError::MissingHeader => "missing_header",
            VerifyError::MalformedHeader => "malformed_header",
            VerifyError::InvalidSignature => "invalid_signature",
            VerifyError::ExpiredToken => "expired_token",
            VerifyError::InvalidIssuer => "invalid_issuer",
        }
    }
}

/// Errors surfaced by the authentication routes and the bearer gate.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Unauthorized: {0}")]
    Unauthorized(#[from] VerifyError),

    #[error("Refresh cookie missing")]
    MissingRefreshCookie,

    #[error("Unknown subject")]
    UnknownSubject,

    #[error("Issuance error: {0}")]
    Issue(#[from] IssueError),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type AuthResult<T> = Result<T, AuthError>;

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            AuthError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "invalid_credentials",
                "Invalid email or password",
            ),
            AuthError::Unauthorized(reason) => {
                tracing::debug!(reason = reason.reason(), "Rejected credential");
                (StatusCode::UNAUTHORIZED, "unauthorized", "Unauthorized")
            }
            AuthError::MissingRefreshCookie | AuthError::UnknownSubject => {
                tracing::debug!(error = %self, "Rejected refresh");
                (StatusCode::UNAUTHORIZED, "unauthorized", "Unauthorized")
            }
            AuthError::Issue(e) => {
                tracing::error!(error = ?e, "Token issuance failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred",
                )
            }
            AuthError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred",
                )
            }
        };

        (
            status,
            Json(json!({
                "error": {
                    "type": error_type,
                    "message": message
                }
            })),
        )
            .into_response()
    }
}
