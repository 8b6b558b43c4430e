//! Remote document store adapter ("google-drive").
//!
//! Talks to a document gateway that fronts Google Drive. Fetch responses
//! carry a `content` field whose shape decides the payload variant: a string
//! becomes text, an array of rows becomes a table, anything else is a
//! contract violation. This is the only source that supports browsing
//! (`list`/`metadata`).

use crate::config::SourceSettings;
use crate::sources::types::{
    optional_str, require_str, DocumentPayload, FetchParams, FileMetadata, SourceError, SourceId,
};
use crate::sources::SourceAdapter;
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

const LIST_FIELDS: &str = "files(id, name, mimeType, modifiedTime)";
const METADATA_FIELDS: &str = "id, name, mimeType, size, modifiedTime";

/// Adapter for the remote document store.
pub struct GoogleDriveAdapter {
    http: Client,
    base_url: String,
    api_key: String,
}

impl GoogleDriveAdapter {
    /// Construct an adapter from its connection settings.
    pub fn new(settings: &SourceSettings) -> Result<Self, SourceError> {
        let http = Client::builder()
            .user_agent("docbridge/0.1")
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|cause| SourceError::Transport {
                source_id: SourceId::GoogleDrive,
                cause,
            })?;
        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
        })
    }

    async fn ensure_success(&self, response: Response) -> Result<Response, SourceError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let error = SourceError::UnexpectedStatus {
            source_id: SourceId::GoogleDrive,
            status,
            body,
        };
        tracing::error!(error = %error, "Document store request failed");
        Err(error)
    }
}

#[derive(Deserialize)]
struct DocumentEnvelope {
    #[serde(default)]
    content: Value,
}

#[derive(Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<FileMetadata>,
}

/// Decode the envelope's `content` field into a payload variant.
fn decode_content(content: Value) -> Result<DocumentPayload, SourceError> {
    match content {
        Value::String(text) => Ok(DocumentPayload::Text(text)),
        Value::Array(rows) => {
            let mut table = Vec::with_capacity(rows.len());
            for row in rows {
                match row {
                    Value::Array(cells) => table.push(cells),
                    other => {
                        return Err(SourceError::UnsupportedShape {
                            source_id: SourceId::GoogleDrive,
                            detail: format!("table row is not an array: {other}"),
                        });
                    }
                }
            }
            Ok(DocumentPayload::Table(table))
        }
        // An absent content field reads as an empty document, not an error.
        Value::Null => Ok(DocumentPayload::Text(String::new())),
        other => Err(SourceError::UnsupportedShape {
            source_id: SourceId::GoogleDrive,
            detail: format!("content is neither text nor rows: {other}"),
        }),
    }
}

#[async_trait]
impl SourceAdapter for GoogleDriveAdapter {
    fn id(&self) -> SourceId {
        SourceId::GoogleDrive
    }

    async fn fetch(&self, params: &FetchParams) -> Result<DocumentPayload, SourceError> {
        let document_id = require_str(params, "document_id")?;
        let url = format!("{}/v1/documents/get", self.base_url);

        let response = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&json!({ "document_id": document_id }))
            .send()
            .await
            .map_err(|cause| SourceError::Transport {
                source_id: SourceId::GoogleDrive,
                cause,
            })?;
        let response = self.ensure_success(response).await?;

        let envelope: DocumentEnvelope =
            response
                .json()
                .await
                .map_err(|cause| SourceError::Transport {
                    source_id: SourceId::GoogleDrive,
                    cause,
                })?;

        tracing::debug!(document_id, "Fetched document from store");
        decode_content(envelope.content)
    }

    async fn list(&self, params: &FetchParams) -> Result<Vec<FileMetadata>, SourceError> {
        let url = format!("{}/files", self.base_url);
        let mut request = self
            .http
            .get(url)
            .bearer_auth(&self.api_key)
            .query(&[("fields", LIST_FIELDS)]);
        if let Some(folder_id) = optional_str(params, "folder_id") {
            request = request.query(&[("q", format!("'{folder_id}' in parents"))]);
        }

        let response = request
            .send()
            .await
            .map_err(|cause| SourceError::Transport {
                source_id: SourceId::GoogleDrive,
                cause,
            })?;
        let response = self.ensure_success(response).await?;

        let listing: FileList = response
            .json()
            .await
            .map_err(|cause| SourceError::Transport {
                source_id: SourceId::GoogleDrive,
                cause,
            })?;

        tracing::debug!(files = listing.files.len(), "Listed document store files");
        Ok(listing.files)
    }

    async fn metadata(&self, params: &FetchParams) -> Result<FileMetadata, SourceError> {
        let file_id = require_str(params, "file_id")?;
        let url = format!("{}/files/{file_id}", self.base_url);

        let response = self
            .http
            .get(url)
            .bearer_auth(&self.api_key)
            .query(&[("fields", METADATA_FIELDS)])
            .send()
            .await
            .map_err(|cause| SourceError::Transport {
                source_id: SourceId::GoogleDrive,
                cause,
            })?;
        let response = self.ensure_success(response).await?;

        response
            .json()
            .await
            .map_err(|cause| SourceError::Transport {
                source_id: SourceId::GoogleDrive,
                cause,
            })
    }
}
