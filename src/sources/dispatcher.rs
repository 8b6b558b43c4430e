//! Routing from inbound source names to registered adapters.

use crate::sources::types::{
    DocumentPayload, FetchParams, FetchRequest, FileMetadata, SourceError, SourceId,
};
use crate::sources::SourceAdapter;
use std::collections::HashMap;
use thiserror::Error;

/// Errors raised while resolving or delegating a request.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The request named a source no adapter is registered for.
    #[error("Unsupported document source `{0}`")]
    UnsupportedSource(String),
    /// The resolved adapter failed.
    #[error("{0}")]
    Source(#[from] SourceError),
}

/// Single point of truth mapping [`SourceId`] to its adapter.
///
/// The registry is assembled once at process start and is read-only
/// afterwards; dispatch itself holds no per-call state.
pub struct SourceDispatcher {
    adapters: HashMap<SourceId, Box<dyn SourceAdapter>>,
}

impl SourceDispatcher {
    /// Create an empty dispatcher.
    pub fn new() -> Self {
        Self {
            adapters: HashMap::new(),
        }
    }

    /// Register an adapter under its own identifier.
    pub fn register(&mut self, adapter: Box<dyn SourceAdapter>) {
        let id = adapter.id();
        if self.adapters.insert(id, adapter).is_some() {
            tracing::warn!(source = %id, "Replaced previously registered adapter");
        }
    }

    /// Resolve a source name to its registered adapter.
    pub fn resolve(&self, source: &str) -> Result<&dyn SourceAdapter, DispatchError> {
        let id: SourceId = source
            .parse()
            .map_err(|()| DispatchError::UnsupportedSource(source.to_string()))?;
        self.adapters
            .get(&id)
            .map(|adapter| adapter.as_ref())
            .ok_or_else(|| DispatchError::UnsupportedSource(source.to_string()))
    }

    /// Route a fetch request to the adapter for its source.
    pub async fn dispatch_fetch(
        &self,
        request: &FetchRequest,
    ) -> Result<DocumentPayload, DispatchError> {
        let adapter = self.resolve(&request.source)?;
        tracing::debug!(source = %adapter.id(), "Dispatching fetch");
        Ok(adapter.fetch(&request.params).await?)
    }

    /// Route a list request to the adapter for the named source.
    pub async fn dispatch_list(
        &self,
        source: &str,
        params: &FetchParams,
    ) -> Result<Vec<FileMetadata>, DispatchError> {
        let adapter = self.resolve(source)?;
        tracing::debug!(source = %adapter.id(), "Dispatching list");
        Ok(adapter.list(params).await?)
    }

    /// Route a metadata request to the adapter for the named source.
    pub async fn dispatch_metadata(
        &self,
        source: &str,
        params: &FetchParams,
    ) -> Result<FileMetadata, DispatchError> {
        let adapter = self.resolve(source)?;
        tracing::debug!(source = %adapter.id(), "Dispatching metadata");
        Ok(adapter.metadata(params).await?)
    }
}

impl Default for SourceDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct StubAdapter {
        id: SourceId,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl SourceAdapter for StubAdapter {
        fn id(&self) -> SourceId {
            self.id
        }

        async fn fetch(&self, _params: &FetchParams) -> Result<DocumentPayload, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(DocumentPayload::Text("stub content".into()))
        }
    }

    fn dispatcher_with_stub(id: SourceId) -> (SourceDispatcher, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut dispatcher = SourceDispatcher::new();
        dispatcher.register(Box::new(StubAdapter {
            id,
            calls: calls.clone(),
        }));
        (dispatcher, calls)
    }

    #[tokio::test]
    async fn fetch_routes_to_registered_adapter() {
        let (dispatcher, calls) = dispatcher_with_stub(SourceId::Notion);
        let request = FetchRequest {
            source: "notion".into(),
            params: FetchParams::new(),
        };

        let payload = dispatcher.dispatch_fetch(&request).await.expect("payload");
        assert_eq!(payload, DocumentPayload::Text("stub content".into()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unknown_source_fails_with_unsupported_source() {
        let (dispatcher, _) = dispatcher_with_stub(SourceId::Notion);
        let request = FetchRequest {
            source: "sharepoint".into(),
            params: FetchParams::new(),
        };

        let error = dispatcher
            .dispatch_fetch(&request)
            .await
            .expect_err("unsupported source");
        assert!(
            matches!(error, DispatchError::UnsupportedSource(name) if name == "sharepoint")
        );
    }

    #[tokio::test]
    async fn registered_but_unimplemented_capability_is_unsupported_operation() {
        let (dispatcher, _) = dispatcher_with_stub(SourceId::Notion);

        let error = dispatcher
            .dispatch_list("notion", &FetchParams::new())
            .await
            .expect_err("list unsupported");
        assert!(matches!(
            error,
            DispatchError::Source(SourceError::UnsupportedOperation {
                source_id: SourceId::Notion,
                operation: "list",
            })
        ));
    }

    #[tokio::test]
    async fn unregistered_id_is_unsupported_even_when_name_parses() {
        let (dispatcher, _) = dispatcher_with_stub(SourceId::Notion);
        let request = FetchRequest {
            source: "gsheet".into(),
            params: FetchParams::new(),
        };

        let error = dispatcher
            .dispatch_fetch(&request)
            .await
            .expect_err("unregistered source");
        assert!(matches!(error, DispatchError::UnsupportedSource(name) if name == "gsheet"));
    }
}
