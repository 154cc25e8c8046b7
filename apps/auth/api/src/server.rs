//! Router assembly and the serve loop.

use axum::{
    Json, Router,
    extract::{Extension, Request},
    http::{
        HeaderValue,
        header::{self, HeaderName},
    },
    middleware::{self, Next},
    response::Response,
    routing::get,
};
use core_config::server::ServerConfig;
use credentials::{
    AccessClaims, AuthState, Credentials, IdentityDirectory, require_bearer, routes,
};
use std::io;
use std::sync::Arc;
use tokio::signal;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{Level, info};

/// Public auth routes at the root, bearer-protected routes under `/admin`.
pub fn build_router<D: IdentityDirectory>(credentials: Credentials, directory: Arc<D>) -> Router {
    let admin = Router::new()
        .route("/whoami", get(whoami))
        .layer(middleware::from_fn_with_state(
            credentials.verifier.clone(),
            require_bearer,
        ));

    Router::new()
        .merge(routes(AuthState::new(credentials, directory)))
        .nest("/admin", admin)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(middleware::from_fn(security_headers))
}

/// Echo the verified access claims back to the caller.
async fn whoami(Extension(claims): Extension<AccessClaims>) -> Json<AccessClaims> {
    Json(claims)
}

/// Adds hardening headers to every response. Token-bearing bodies must never
/// be cached, hence `Cache-Control: no-store`.
async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;

    let headers = response.headers_mut();
    headers.insert(header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    headers.insert(
        HeaderName::from_static("permissions-policy"),
        HeaderValue::from_static("geolocation=(), microphone=(), camera=()"),
    );

    response
}

/// Bind and serve until SIGINT/SIGTERM, letting in-flight requests finish.
pub async fn serve(router: Router, server_config: &ServerConfig) -> io::Result<()> {
    let listener = tokio::net::TcpListener::bind(server_config.address()).await?;

    info!("Server starting on {}", listener.local_addr()?);
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .inspect_err(|e| {
            tracing::error!("Server encountered an error: {:?}", e);
        })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal, shutting down gracefully");
        },
        _ = terminate => {
            info!("Received SIGTERM signal, shutting down gracefully");
        },
    }
}
