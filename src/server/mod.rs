//! HTTP endpoint for journal entry analysis.
//!
//! - `POST /` and `POST /processEntry` - authenticate, analyse, respond
//! - `OPTIONS` on the same paths - CORS preflight (204)
//! - `GET /healthz` - liveness and build info

use std::sync::Arc;

use axum::Router;
use axum::http::HeaderValue;
use axum::http::header::ACCESS_CONTROL_ALLOW_ORIGIN;
use axum::routing::{get, post};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::analysis::{Analyzer, InferenceClient};

pub mod auth;
pub mod handlers;

pub use auth::{
    AuthError, Authenticator, ConfiguredAuthenticator, FirebaseAuthenticator,
    StaticTokenAuthenticator,
};
pub use handlers::ApiError;

/// Collaborators shared by every request. Read-only after startup.
#[derive(Debug)]
pub struct AppState<C, A> {
    pub analyzer: Analyzer<C>,
    pub authenticator: A,
}

impl<C, A> AppState<C, A> {
    pub fn new(analyzer: Analyzer<C>, authenticator: A) -> Self {
        Self {
            analyzer,
            authenticator,
        }
    }
}

pub fn create_router<C, A>(state: Arc<AppState<C, A>>) -> Router
where
    C: InferenceClient + 'static,
    A: Authenticator + 'static,
{
    let entry = post(handlers::process_entry::<C, A>).options(handlers::preflight);

    Router::new()
        .route("/", entry.clone())
        .route("/processEntry", entry)
        .route("/healthz", get(handlers::healthz))
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds `addr` and serves until Ctrl-C.
pub async fn serve<C, A>(addr: &str, state: AppState<C, A>) -> Result<(), String>
where
    C: InferenceClient + 'static,
    A: Authenticator + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| format!("Failed to bind {addr}: {err}"))?;
    info!(
        %addr,
        version = env!("CARGO_PKG_VERSION"),
        git_sha = env!("MOODLENS_GIT_SHA"),
        build_ts = env!("MOODLENS_BUILD_TS"),
        "moodlens listening"
    );

    axum::serve(listener, create_router(Arc::new(state)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| format!("Server error: {err}"))
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received");
    }
}
