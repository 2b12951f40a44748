use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::{ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::analysis::{InferenceClient, InferenceError};
use crate::server::AppState;
use crate::server::auth::{AuthError, Authenticator, bearer_token};

/// Failures surfaced to the caller as `{ok: false, error}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("missing_text")]
    MissingText,
    #[error(transparent)]
    Inference(#[from] InferenceError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Auth(AuthError::MissingToken | AuthError::InvalidToken) => {
                StatusCode::UNAUTHORIZED
            }
            Self::MissingText => StatusCode::BAD_REQUEST,
            Self::Auth(_) | Self::Inference(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "entry processing failed");
        } else {
            warn!(error = %self, %status, "entry rejected");
        }
        (status, Json(json!({ "ok": false, "error": self.to_string() }))).into_response()
    }
}

pub(crate) async fn preflight() -> impl IntoResponse {
    (
        StatusCode::NO_CONTENT,
        [
            (ACCESS_CONTROL_ALLOW_METHODS, "POST"),
            (ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type, Authorization"),
        ],
    )
}

pub(crate) async fn healthz() -> Json<Value> {
    Json(json!({
        "ok": true,
        "version": env!("CARGO_PKG_VERSION"),
        "git_sha": env!("MOODLENS_GIT_SHA"),
    }))
}

/// Authenticates, validates the body and runs the analysis.
pub(crate) async fn process_entry<C, A>(
    State(state): State<Arc<AppState<C, A>>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError>
where
    C: InferenceClient + 'static,
    A: Authenticator + 'static,
{
    let token = bearer_token(&headers)?;
    let uid = state.authenticator.verify(token).await?;

    let text = entry_text(&body).ok_or(ApiError::MissingText)?;
    info!(%uid, chars = text.chars().count(), "processing entry");

    let ai = state.analyzer.analyze(&text).await?;
    Ok(Json(json!({ "ok": true, "uid": uid, "ai": ai })))
}

/// Non-empty `text` string from a JSON body; anything else counts as missing.
fn entry_text(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    value
        .get("text")
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}
