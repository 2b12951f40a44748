use std::collections::HashMap;
use std::fmt;
use std::future::Future;

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::warn;

pub const FIREBASE_LOOKUP_URL: &str = "https://identitytoolkit.googleapis.com/v1/accounts:lookup";

const BEARER_PREFIX: &str = "Bearer ";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing_id_token")]
    MissingToken,
    #[error("invalid_id_token")]
    InvalidToken,
    #[error("identity provider request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("identity provider error {status}: {body}")]
    Provider { status: StatusCode, body: String },
}

/// Verifies a bearer credential and yields the caller's uid.
pub trait Authenticator: Send + Sync {
    fn verify(&self, token: &str) -> impl Future<Output = Result<String, AuthError>> + Send;
}

/// Pulls the token out of an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix(BEARER_PREFIX))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::MissingToken)
}

/// Fixed token to uid table, for local and test deployments.
#[derive(Clone, Default)]
pub struct StaticTokenAuthenticator {
    tokens: HashMap<String, String>,
}

impl StaticTokenAuthenticator {
    pub fn new(tokens: HashMap<String, String>) -> Self {
        Self { tokens }
    }
}

impl fmt::Debug for StaticTokenAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticTokenAuthenticator")
            .field("tokens", &self.tokens.len())
            .finish()
    }
}

impl Authenticator for StaticTokenAuthenticator {
    async fn verify(&self, token: &str) -> Result<String, AuthError> {
        self.tokens
            .get(token)
            .cloned()
            .ok_or(AuthError::InvalidToken)
    }
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    local_id: String,
}

/// Verifies Firebase ID tokens through the Identity Toolkit lookup endpoint.
#[derive(Clone)]
pub struct FirebaseAuthenticator {
    api_key: String,
    lookup_url: String,
    client: reqwest::Client,
}

impl FirebaseAuthenticator {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_lookup_url(api_key, FIREBASE_LOOKUP_URL)
    }

    pub fn with_lookup_url(api_key: impl Into<String>, lookup_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            lookup_url: lookup_url.into(),
            client: reqwest::Client::new(),
        }
    }
}

impl fmt::Debug for FirebaseAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FirebaseAuthenticator")
            .field("lookup_url", &self.lookup_url)
            .finish_non_exhaustive()
    }
}

impl Authenticator for FirebaseAuthenticator {
    async fn verify(&self, token: &str) -> Result<String, AuthError> {
        let response = self
            .client
            .post(&self.lookup_url)
            .query(&[("key", self.api_key.as_str())])
            .json(&json!({ "idToken": token }))
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::BAD_REQUEST {
            let body = response.text().await.unwrap_or_default();
            warn!(%body, "identity provider rejected token");
            return Err(AuthError::InvalidToken);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Provider { status, body });
        }

        let lookup: LookupResponse = response.json().await?;
        lookup
            .users
            .into_iter()
            .next()
            .map(|user| user.local_id)
            .ok_or(AuthError::InvalidToken)
    }
}

/// Authenticator selected from configuration at startup.
#[derive(Debug, Clone)]
pub enum ConfiguredAuthenticator {
    Static(StaticTokenAuthenticator),
    Firebase(FirebaseAuthenticator),
}

impl Authenticator for ConfiguredAuthenticator {
    async fn verify(&self, token: &str) -> Result<String, AuthError> {
        match self {
            Self::Static(inner) => inner.verify(token).await,
            Self::Firebase(inner) => inner.verify(token).await,
        }
    }
}
