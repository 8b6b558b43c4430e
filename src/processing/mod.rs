//! Document pipeline: dispatch, normalization, and batch summarization.

pub mod normalize;
mod service;
pub mod types;

pub use normalize::{normalize, NormalizedText, PREVIEW_LIMIT};
pub use service::{DocumentApi, DocumentService, ServiceLimits};
pub use types::{
    BatchOutcome, DocumentRequest, FetchOutcome, ProcessingError, SourceFailure,
    NO_CONTENT_SENTINEL,
};
