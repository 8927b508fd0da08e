//! Ollama wire payloads and the HTTP client.
//!
//! The client speaks the non-streaming generate contract: model listing
//! via `GET /api/tags` and completions via `POST /api/generate` with
//! `stream: false`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod client;

pub use client::{BackendError, ChatBackend, OllamaClient};

#[derive(Serialize)]
pub struct GenerateRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub stream: bool,
}

#[derive(Deserialize)]
pub struct GenerateResponse {
    pub response: String,
}

/// One entry from the server's model listing.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelEntry {
    pub name: String,
    #[serde(default)]
    pub modified_at: Option<DateTime<Utc>>,
}

impl ModelEntry {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            modified_at: None,
        }
    }
}

/// Response shape of `GET /api/tags`. A missing `models` field is an
/// empty list, not an error.
#[derive(Deserialize)]
pub struct TagsResponse {
    #[serde(default)]
    pub models: Vec<ModelEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_without_models_field_is_empty() {
        let tags: TagsResponse = serde_json::from_str("{}").unwrap();
        assert!(tags.models.is_empty());
    }

    #[test]
    fn tags_parse_names_and_timestamps() {
        let body = r#"{"models":[
            {"name":"phi","modified_at":"2024-03-01T12:00:00Z"},
            {"name":"llama2"}
        ]}"#;
        let tags: TagsResponse = serde_json::from_str(body).unwrap();
        assert_eq!(tags.models.len(), 2);
        assert_eq!(tags.models[0].name, "phi");
        assert!(tags.models[0].modified_at.is_some());
        assert!(tags.models[1].modified_at.is_none());
    }

    #[test]
    fn generate_request_is_non_streaming() {
        let request = GenerateRequest {
            model: "phi",
            prompt: "hello",
            stream: false,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "phi");
        assert_eq!(value["stream"], false);
    }

    #[test]
    fn generate_response_parses_reply() {
        let body: GenerateResponse = serde_json::from_str(r#"{"response":"hi"}"#).unwrap();
        assert_eq!(body.response, "hi");
    }
}
