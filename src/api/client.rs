//! HTTP client for the Ollama API.

use std::error::Error as StdError;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::debug;

use crate::api::{GenerateRequest, GenerateResponse, ModelEntry, TagsResponse};
use crate::utils::url::construct_api_url;

/// Errors that can occur when talking to the model backend.
#[derive(Debug)]
pub enum BackendError {
    /// Network-level failure: connection refused, timeout, or a response
    /// body that did not match the expected shape.
    Transport(reqwest::Error),

    /// The backend answered with a non-success status.
    Status { status: StatusCode, body: String },
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::Transport(source) => {
                write!(f, "request to backend failed: {source}")
            }
            BackendError::Status { status, body } => {
                write!(f, "backend returned {status}: {body}")
            }
        }
    }
}

impl StdError for BackendError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            BackendError::Transport(source) => Some(source),
            BackendError::Status { .. } => None,
        }
    }
}

/// The chat/generate surface the core depends on. Production code uses
/// [`OllamaClient`]; tests inject stubs.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn list_models(&self) -> Result<Vec<ModelEntry>, BackendError>;

    async fn generate(&self, model: &str, prompt: &str) -> Result<String, BackendError>;
}

#[derive(Clone)]
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
}

impl OllamaClient {
    /// Every request carries `timeout` so a hung backend resolves into the
    /// normal error path instead of leaving a turn pending forever.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(BackendError::Transport)?;
        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(BackendError::Status { status, body })
    }
}

#[async_trait]
impl ChatBackend for OllamaClient {
    async fn list_models(&self) -> Result<Vec<ModelEntry>, BackendError> {
        let url = construct_api_url(&self.base_url, "api/tags");
        debug!(%url, "listing models");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(BackendError::Transport)?;
        let response = Self::check_status(response).await?;
        let tags = response
            .json::<TagsResponse>()
            .await
            .map_err(BackendError::Transport)?;
        Ok(tags.models)
    }

    async fn generate(&self, model: &str, prompt: &str) -> Result<String, BackendError> {
        let url = construct_api_url(&self.base_url, "api/generate");
        debug!(%url, model, "sending generate request");
        let request = GenerateRequest {
            model,
            prompt,
            stream: false,
        };
        let response = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(BackendError::Transport)?;
        let response = Self::check_status(response).await?;
        let body = response
            .json::<GenerateResponse>()
            .await
            .map_err(BackendError::Transport)?;
        Ok(body.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_errors_render_code_and_body() {
        let err = BackendError::Status {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: "Error talking to Ollama".to_string(),
        };
        let rendered = err.to_string();
        assert!(rendered.contains("500"));
        assert!(rendered.contains("Error talking to Ollama"));
    }
}
