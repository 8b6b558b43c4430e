//! Core data types and error definitions for the document pipeline.

use crate::completion::CompletionClientError;
use crate::sources::{DispatchError, FetchRequest};
use thiserror::Error;

/// Response returned when a batch yields no usable content.
pub const NO_CONTENT_SENTINEL: &str = "No content to analyze";

/// A single document request, optionally carrying a question about it.
#[derive(Debug, Clone)]
pub struct DocumentRequest {
    /// Source and parameters routed through the dispatcher.
    pub fetch: FetchRequest,
    /// Optional question to ask about the fetched content.
    pub query: Option<String>,
}

/// Errors emitted by the document pipeline.
#[derive(Debug, Error)]
pub enum ProcessingError {
    /// Routing or adapter failure while fetching.
    #[error("Failed to fetch document: {0}")]
    Dispatch(#[from] DispatchError),
    /// Completion gateway failure.
    #[error("Completion request failed: {0}")]
    Completion(#[from] CompletionClientError),
    /// The whole-batch deadline elapsed before every fetch settled.
    #[error("Batch cancelled after exceeding the {budget_secs}s batch budget")]
    BatchCancelled {
        /// Whole-batch budget that was exceeded, in seconds.
        budget_secs: u64,
    },
}

/// Outcome of a single-document request.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    /// Caller-facing content preview (possibly truncated).
    pub content: String,
    /// AI-generated response for the full content.
    pub ai_response: String,
}

/// Outcome of a batch request.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    /// Combined AI response built from every usable document.
    pub ai_response: String,
    /// Sources that failed and were skipped; never surfaced in the success
    /// payload, but available to embedders and logged per entry.
    pub failures: Vec<SourceFailure>,
}

/// A per-source failure absorbed by the batch partial-failure policy.
#[derive(Debug, Clone)]
pub struct SourceFailure {
    /// Source name from the failing request.
    pub source: String,
    /// Human-readable failure description.
    pub message: String,
}
