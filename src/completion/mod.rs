//! AI completion gateway.
//!
//! Wraps the single external text-generation call the pipeline depends on.
//! The HTTP-backed client speaks an OpenAI-style completions endpoint; the
//! trait seam lets tests substitute a recording fake without touching global
//! state.

use crate::config::CompletionSettings;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

/// Separator placed between documents in a combined prompt.
pub const DOCUMENT_SEPARATOR: &str = "\n\n---\n\n";

const DEFAULT_INSTRUCTION: &str = "Summarize the key information";

/// Errors surfaced while requesting a completion.
#[derive(Debug, Error)]
pub enum CompletionClientError {
    /// Completion endpoint could not be reached.
    #[error("Completion provider unreachable: {0}")]
    Unreachable(String),
    /// Provider returned an error response.
    #[error("Failed to generate completion: {0}")]
    GenerationFailed(String),
    /// Provider response could not be parsed.
    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),
}

/// Request payload passed to the completion provider.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Prompt assembled by the pipeline.
    pub prompt: String,
    /// Maximum token budget requested for the response.
    pub max_tokens: u32,
}

/// Interface implemented by completion providers.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Generate a response for the supplied prompt.
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionClientError>;
}

/// Assemble the instruction frame around the joined document text.
///
/// When no query is supplied the provider is asked for a generic summary.
pub fn build_prompt(documents: &[String], query: Option<&str>) -> String {
    let joined = documents.join(DOCUMENT_SEPARATOR);
    let instruction = query.unwrap_or(DEFAULT_INSTRUCTION);
    format!("Below are documents:\n\n{joined}\n\n{instruction}")
}

/// HTTP-backed completion client for OpenAI-style endpoints.
pub struct HttpCompletionClient {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl HttpCompletionClient {
    /// Construct a client from gateway settings.
    pub fn new(settings: &CompletionSettings) -> Result<Self, CompletionClientError> {
        let http = Client::builder()
            .user_agent("docbridge/completion")
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|error| {
                CompletionClientError::Unreachable(format!(
                    "failed to construct HTTP client: {error}"
                ))
            })?;
        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/completions", self.base_url)
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    text: String,
}

#[async_trait]
impl CompletionClient for HttpCompletionClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionClientError> {
        let payload = json!({
            "model": self.model,
            "prompt": request.prompt,
            "max_tokens": request.max_tokens,
        });

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|error| {
                CompletionClientError::Unreachable(format!(
                    "failed to reach completion endpoint at {}: {error}",
                    self.base_url
                ))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionClientError::GenerationFailed(format!(
                "completion endpoint returned {status}: {body}"
            )));
        }

        let body: CompletionResponse = response.json().await.map_err(|error| {
            CompletionClientError::InvalidResponse(format!(
                "failed to decode completion response: {error}"
            ))
        })?;

        let choice = body.choices.into_iter().next().ok_or_else(|| {
            CompletionClientError::InvalidResponse("response contained no choices".into())
        })?;

        Ok(choice.text.trim().to_string())
    }
}
