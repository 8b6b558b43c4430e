//! Google Docs adapter.
//!
//! Walks the document body's structural elements and concatenates every
//! paragraph text run. Non-paragraph elements (tables, section breaks) carry
//! no extractable text runs and are skipped.

use crate::config::SourceSettings;
use crate::sources::types::{require_str, DocumentPayload, FetchParams, SourceError, SourceId};
use crate::sources::SourceAdapter;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

/// Adapter fetching document text through the Google Docs API.
pub struct GdocAdapter {
    http: Client,
    base_url: String,
    api_key: String,
}

impl GdocAdapter {
    /// Construct an adapter from its connection settings.
    pub fn new(settings: &SourceSettings) -> Result<Self, SourceError> {
        let http = Client::builder()
            .user_agent("docbridge/0.1")
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|cause| SourceError::Transport {
                source_id: SourceId::Gdoc,
                cause,
            })?;
        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
        })
    }
}

/// Concatenate every paragraph text run in document order.
fn extract_text(document: &Value) -> String {
    let mut text = String::new();
    let Some(content) = document
        .pointer("/body/content")
        .and_then(Value::as_array)
    else {
        return text;
    };
    for element in content {
        let Some(elements) = element
            .pointer("/paragraph/elements")
            .and_then(Value::as_array)
        else {
            continue;
        };
        for piece in elements {
            if let Some(run) = piece.pointer("/textRun/content").and_then(Value::as_str) {
                text.push_str(run);
            }
        }
    }
    text
}

#[async_trait]
impl SourceAdapter for GdocAdapter {
    fn id(&self) -> SourceId {
        SourceId::Gdoc
    }

    async fn fetch(&self, params: &FetchParams) -> Result<DocumentPayload, SourceError> {
        let document_id = require_str(params, "document_id")?;
        let url = format!("{}/v1/documents/{document_id}", self.base_url);

        let response = self
            .http
            .get(url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|cause| SourceError::Transport {
                source_id: SourceId::Gdoc,
                cause,
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = SourceError::UnexpectedStatus {
                source_id: SourceId::Gdoc,
                status,
                body,
            };
            tracing::error!(document_id, error = %error, "Google Docs fetch failed");
            return Err(error);
        }

        let document: Value = response
            .json()
            .await
            .map_err(|cause| SourceError::Transport {
                source_id: SourceId::Gdoc,
                cause,
            })?;

        let text = extract_text(&document);
        tracing::debug!(document_id, chars = text.len(), "Fetched Google Doc");
        Ok(DocumentPayload::Text(text))
    }
}
