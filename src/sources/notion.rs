//! Notion block-tree adapter.
//!
//! A Notion page is a list of typed blocks. Only text-bearing block kinds
//! contribute to the fetched content; images, dividers, and other non-text
//! blocks are discarded without error. Provider block order is preserved,
//! one block's text per line.

use crate::config::SourceSettings;
use crate::sources::types::{require_str, DocumentPayload, FetchParams, SourceError, SourceId};
use crate::sources::SourceAdapter;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

/// Block kinds whose `rich_text` is extracted.
const TEXT_BLOCK_TYPES: [&str; 7] = [
    "paragraph",
    "heading_1",
    "heading_2",
    "heading_3",
    "bulleted_list_item",
    "numbered_list_item",
    "toggle",
];

const NOTION_VERSION: &str = "2022-06-28";
const PAGE_SIZE: u32 = 100;

/// Adapter fetching page content through the Notion block-children API.
pub struct NotionAdapter {
    http: Client,
    base_url: String,
    api_key: String,
}

impl NotionAdapter {
    /// Construct an adapter from its connection settings.
    pub fn new(settings: &SourceSettings) -> Result<Self, SourceError> {
        let http = Client::builder()
            .user_agent("docbridge/0.1")
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|cause| SourceError::Transport {
                source_id: SourceId::Notion,
                cause,
            })?;
        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
        })
    }
}

#[derive(Deserialize)]
struct BlockChildren {
    #[serde(default)]
    results: Vec<Value>,
}

/// Concatenate the text content of text-bearing blocks, one block per line.
fn extract_text(blocks: &[Value]) -> String {
    let mut lines = Vec::new();
    for block in blocks {
        let Some(block_type) = block.get("type").and_then(Value::as_str) else {
            continue;
        };
        if !TEXT_BLOCK_TYPES.contains(&block_type) {
            continue;
        }
        let spans = block
            .get(block_type)
            .and_then(|body| body.get("rich_text"))
            .and_then(Value::as_array);
        let Some(spans) = spans else { continue };
        let line: String = spans
            .iter()
            .filter_map(|span| {
                span.get("text")
                    .and_then(|text| text.get("content"))
                    .and_then(Value::as_str)
            })
            .collect();
        lines.push(line);
    }
    lines.join("\n")
}

#[async_trait]
impl SourceAdapter for NotionAdapter {
    fn id(&self) -> SourceId {
        SourceId::Notion
    }

    async fn fetch(&self, params: &FetchParams) -> Result<DocumentPayload, SourceError> {
        let page_id = require_str(params, "page_id")?;
        let url = format!("{}/v1/blocks/{page_id}/children", self.base_url);

        let response = self
            .http
            .get(url)
            .query(&[("page_size", PAGE_SIZE)])
            .bearer_auth(&self.api_key)
            .header("Notion-Version", NOTION_VERSION)
            .send()
            .await
            .map_err(|cause| SourceError::Transport {
                source_id: SourceId::Notion,
                cause,
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = SourceError::UnexpectedStatus {
                source_id: SourceId::Notion,
                status,
                body,
            };
            tracing::error!(page_id, error = %error, "Notion fetch failed");
            return Err(error);
        }

        let payload: BlockChildren =
            response
                .json()
                .await
                .map_err(|cause| SourceError::Transport {
                    source_id: SourceId::Notion,
                    cause,
                })?;

        let text = extract_text(&payload.results);
        tracing::debug!(page_id, blocks = payload.results.len(), "Fetched Notion page");
        Ok(DocumentPayload::Text(text))
    }
}
