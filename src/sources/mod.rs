//! Source adapters translating provider responses into normalized payloads.
//!
//! One adapter exists per document source. Each owns its HTTP client and
//! credentials, performs no caching, and reports every failure through the
//! [`SourceError`] taxonomy. The [`dispatcher::SourceDispatcher`] is the
//! single routing point from an inbound source name to an adapter.

pub mod dispatcher;
/// Remote document store adapter.
pub mod drive;
/// Google Docs adapter.
pub mod gdoc;
/// Google Sheets adapter.
pub mod gsheet;
/// Notion block-tree adapter.
pub mod notion;
pub mod types;

use async_trait::async_trait;

pub use dispatcher::{DispatchError, SourceDispatcher};
pub use drive::GoogleDriveAdapter;
pub use gdoc::GdocAdapter;
pub use gsheet::GsheetAdapter;
pub use notion::NotionAdapter;
pub use types::{
    DocumentPayload, FetchParams, FetchRequest, FileMetadata, SourceError, SourceId,
};

/// Capability set implemented by a document source.
///
/// `fetch` is mandatory; `list` and `metadata` default to
/// [`SourceError::UnsupportedOperation`] for sources that cannot browse.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Identifier this adapter is registered under.
    fn id(&self) -> SourceId;

    /// Fetch a document and return its normalized payload.
    async fn fetch(&self, params: &FetchParams) -> Result<DocumentPayload, SourceError>;

    /// Enumerate files available to this source.
    async fn list(&self, _params: &FetchParams) -> Result<Vec<FileMetadata>, SourceError> {
        Err(SourceError::UnsupportedOperation {
            source_id: self.id(),
            operation: "list",
        })
    }

    /// Fetch metadata for a single file.
    async fn metadata(&self, _params: &FetchParams) -> Result<FileMetadata, SourceError> {
        Err(SourceError::UnsupportedOperation {
            source_id: self.id(),
            operation: "metadata",
        })
    }
}
