//! HTTP surface for docbridge.
//!
//! This module exposes a compact Axum router with a handful of endpoints:
//!
//! - `POST /process` – Fetch one document from a source, normalize it, and return a content
//!   preview alongside an AI-generated answer or summary.
//! - `POST /batch_process` – Fetch an ordered list of documents and return one combined
//!   AI response; individual source failures are absorbed, not surfaced.
//! - `GET /list` – Enumerate files available to a browsable source.
//! - `GET /metadata` – Fetch metadata for one file.
//! - `GET /metrics` – Observe fetch/batch counters.
//! - `GET /` and `GET /health` – Liveness probes.
//!
//! Handlers are generic over [`DocumentApi`] so tests can substitute a stub
//! service without patching global state.

use crate::processing::{DocumentApi, DocumentRequest, ProcessingError};
use crate::sources::{DispatchError, FetchParams, FetchRequest, FileMetadata, SourceError};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

/// Build the HTTP router exposing the document API surface.
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: DocumentApi + 'static,
{
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/process", post(process_document::<S>))
        .route("/batch_process", post(batch_process::<S>))
        .route("/list", get(list_files::<S>))
        .route("/metadata", get(get_metadata::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .with_state(service)
}

/// Request body for `POST /process` and the elements of `POST /batch_process`.
#[derive(Deserialize)]
struct DocumentRequestBody {
    /// Source to fetch from (e.g. `"notion"`, `"google-drive"`).
    source: String,
    /// Source-specific parameters.
    #[serde(default)]
    params: FetchParams,
    /// Optional question to ask about the content.
    #[serde(default)]
    query: Option<String>,
}

impl DocumentRequestBody {
    fn into_request(self) -> DocumentRequest {
        DocumentRequest {
            fetch: FetchRequest {
                source: self.source,
                params: self.params,
            },
            query: self.query,
        }
    }
}

/// Success response for `POST /process`.
#[derive(Serialize)]
struct DocumentResponse {
    /// Content preview, truncated for display.
    content: String,
    /// AI-generated answer or summary for the full content.
    ai_response: String,
}

/// Success response for `POST /batch_process`.
#[derive(Serialize)]
struct BatchResponse {
    ai_response: String,
}

/// Fetch a document and generate an AI response for it.
async fn process_document<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<DocumentRequestBody>,
) -> Result<Json<DocumentResponse>, AppError>
where
    S: DocumentApi,
{
    let outcome = service.process_document(request.into_request()).await?;
    Ok(Json(DocumentResponse {
        content: outcome.content,
        ai_response: outcome.ai_response,
    }))
}

/// Process a batch of document requests into one combined AI response.
async fn batch_process<S>(
    State(service): State<Arc<S>>,
    Json(requests): Json<Vec<DocumentRequestBody>>,
) -> Result<Json<BatchResponse>, AppError>
where
    S: DocumentApi,
{
    let requests = requests
        .into_iter()
        .map(DocumentRequestBody::into_request)
        .collect();
    let outcome = service.batch_process(requests).await?;
    Ok(Json(BatchResponse {
        ai_response: outcome.ai_response,
    }))
}

/// Query string for `GET /list`.
#[derive(Deserialize)]
struct ListQuery {
    source: String,
    #[serde(default)]
    folder_id: Option<String>,
}

/// Response body for `GET /list`.
#[derive(Serialize)]
struct ListResponse {
    files: Vec<FileMetadata>,
}

/// List files from the named source.
async fn list_files<S>(
    State(service): State<Arc<S>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse>, AppError>
where
    S: DocumentApi,
{
    let files = service
        .list_files(&query.source, query.folder_id.as_deref())
        .await?;
    Ok(Json(ListResponse { files }))
}

/// Query string for `GET /metadata`.
#[derive(Deserialize)]
struct MetadataQuery {
    source: String,
    file_id: String,
}

/// Response body for `GET /metadata`.
#[derive(Serialize)]
struct MetadataResponse {
    metadata: FileMetadata,
}

/// Fetch metadata for a single file from the named source.
async fn get_metadata<S>(
    State(service): State<Arc<S>>,
    Query(query): Query<MetadataQuery>,
) -> Result<Json<MetadataResponse>, AppError>
where
    S: DocumentApi,
{
    let metadata = service
        .file_metadata(&query.source, &query.file_id)
        .await?;
    Ok(Json(MetadataResponse { metadata }))
}

/// Return a concise snapshot of fetch and batch counters.
async fn get_metrics<S>(State(service): State<Arc<S>>) -> Json<crate::metrics::MetricsSnapshot>
where
    S: DocumentApi,
{
    Json(service.metrics_snapshot())
}

/// Root endpoint.
async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "message": "docbridge API is running"
    }))
}

/// Health check endpoint.
async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy" }))
}

struct AppError(ProcessingError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        let body = Json(json!({ "error": self.0.to_string() }));
        (status, body).into_response()
    }
}

impl From<ProcessingError> for AppError {
    fn from(inner: ProcessingError) -> Self {
        Self(inner)
    }
}

/// Map the error taxonomy onto response statuses: caller errors are 4xx,
/// upstream failures 502, a blown batch budget 504.
fn status_for(error: &ProcessingError) -> StatusCode {
    match error {
        ProcessingError::Dispatch(DispatchError::UnsupportedSource(_)) => StatusCode::BAD_REQUEST,
        ProcessingError::Dispatch(DispatchError::Source(source_error)) => match source_error {
            SourceError::MissingParameter(_) | SourceError::UnsupportedOperation { .. } => {
                StatusCode::BAD_REQUEST
            }
            SourceError::Transport { .. }
            | SourceError::UnexpectedStatus { .. }
            | SourceError::UnsupportedShape { .. } => StatusCode::BAD_GATEWAY,
        },
        ProcessingError::Completion(_) => StatusCode::BAD_GATEWAY,
        ProcessingError::BatchCancelled { .. } => StatusCode::GATEWAY_TIMEOUT,
    }
}
