use std::fmt;
use std::future::Future;
use std::time::Duration;

use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

/// One outbound call: target model plus JSON payload.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct InferenceRequest {
    pub model: String,
    pub payload: Value,
}

impl InferenceRequest {
    pub fn new(model: impl Into<String>, payload: Value) -> Self {
        Self {
            model: model.into(),
            payload,
        }
    }
}

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("inference request to {model} failed: {source}")]
    Transport {
        model: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("non-JSON response from {model} (status {status}): {body}")]
    MalformedResponse {
        model: String,
        status: StatusCode,
        body: String,
    },
    #[error("inference error from {model} ({status}): {payload}")]
    RemoteError {
        model: String,
        status: StatusCode,
        payload: Value,
    },
}

impl InferenceError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "transport",
            Self::MalformedResponse { .. } => "malformed_response",
            Self::RemoteError { .. } => "remote_error",
        }
    }
}

/// Issues a single inference call and returns the parsed JSON body.
pub trait InferenceClient: Send + Sync {
    fn invoke(
        &self,
        request: &InferenceRequest,
    ) -> impl Future<Output = Result<Value, InferenceError>> + Send;
}

/// Hugging Face style hosted inference: `POST {base_url}/{model}`.
#[derive(Clone)]
pub struct HfInferenceClient {
    base_url: String,
    api_key: String,
    timeout: Option<Duration>,
    client: reqwest::Client,
}

impl HfInferenceClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout_secs: Option<u64>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            timeout: timeout_secs.map(Duration::from_secs),
            client: reqwest::Client::new(),
        }
    }

    pub fn endpoint(&self, model: &str) -> String {
        endpoint(&self.base_url, model)
    }
}

impl fmt::Debug for HfInferenceClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HfInferenceClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl InferenceClient for HfInferenceClient {
    async fn invoke(&self, request: &InferenceRequest) -> Result<Value, InferenceError> {
        let url = self.endpoint(&request.model);
        info!(%url, "calling inference model");

        let mut builder = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request.payload);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        let transport = |source: reqwest::Error| InferenceError::Transport {
            model: request.model.clone(),
            source,
        };
        let response = builder.send().await.map_err(transport)?;
        let status = response.status();
        let body = response.text().await.map_err(transport)?;
        info!(%status, model = %request.model, "inference response received");
        debug!(%body, "inference response body");

        classify_response(&request.model, status, &body)
    }
}

pub fn endpoint(base_url: &str, model: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), model)
}

fn classify_response(model: &str, status: StatusCode, body: &str) -> Result<Value, InferenceError> {
    let json: Value =
        serde_json::from_str(body).map_err(|_| InferenceError::MalformedResponse {
            model: model.to_string(),
            status,
            body: body.to_string(),
        })?;

    let carries_error = json
        .get("error")
        .is_some_and(|error| !error.is_null());
    if !status.is_success() || carries_error {
        return Err(InferenceError::RemoteError {
            model: model.to_string(),
            status,
            payload: json,
        });
    }

    Ok(json)
}
