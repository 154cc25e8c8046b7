use crate::error::AuthError;
use crate::verifier::TokenVerifier;
use axum::{
    extract::{Request, State},
    http::{HeaderMap, header::VARY},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Bearer gate for protected routes.
///
/// Verifies the `Authorization` header, inserts the verified
/// [`AccessClaims`](crate::AccessClaims) into request extensions and runs the
/// inner service. Rejections are 401 with a generic body; the reason is only
/// logged. Every response carries `Vary: Authorization`.
///
/// # Example
///
/// ```ignore
/// use axum::{Router, routing::get, middleware::from_fn_with_state};
/// use credentials::{TokenVerifier, require_bearer};
///
/// let admin = Router::new()
///     .route("/movies", get(list_movies))
///     .layer(from_fn_with_state(verifier.clone(), require_bearer));
/// ```
pub async fn require_bearer(
    State(verifier): State<TokenVerifier>,
    mut request: Request,
    next: Next,
) -> Response {
    let mut vary = HeaderMap::new();

    let mut response = match verifier.verify_request(request.headers(), &mut vary) {
        Ok(claims) => {
            tracing::debug!(sub = %claims.sub, "Bearer token accepted");
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(reason) => AuthError::Unauthorized(reason).into_response(),
    };

    for value in vary.get_all(VARY) {
        response.headers_mut().append(VARY, value.clone());
    }

    response
}
