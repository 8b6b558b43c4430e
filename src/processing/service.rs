//! Document service coordinating dispatch, normalization, and summarization.

use crate::{
    completion::{
        build_prompt, CompletionClient, CompletionRequest, HttpCompletionClient,
    },
    config::Config,
    metrics::{DocumentMetrics, MetricsSnapshot},
    processing::{
        normalize::normalize,
        types::{
            BatchOutcome, DocumentRequest, FetchOutcome, ProcessingError, SourceFailure,
            NO_CONTENT_SENTINEL,
        },
    },
    sources::{
        DispatchError, FetchParams, FileMetadata, GdocAdapter, GoogleDriveAdapter, GsheetAdapter,
        NotionAdapter, SourceDispatcher, SourceError,
    },
};
use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Budgets applied by the batch orchestrator.
#[derive(Debug, Clone, Copy)]
pub struct ServiceLimits {
    /// Deadline applied to each dispatched fetch.
    pub fetch_timeout: Duration,
    /// Deadline applied to the batch as a whole.
    pub batch_timeout: Duration,
    /// Maximum number of fetches in flight at once.
    pub fetch_concurrency: usize,
    /// Token budget forwarded to the completion gateway.
    pub completion_max_tokens: u32,
}

impl ServiceLimits {
    /// Derive limits from the loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            fetch_timeout: Duration::from_secs(config.fetch_timeout_secs),
            batch_timeout: Duration::from_secs(config.batch_timeout_secs),
            fetch_concurrency: config.fetch_concurrency,
            completion_max_tokens: config.completion.max_tokens,
        }
    }
}

/// Coordinates the full pipeline: dispatch, normalization, and the combined
/// summarization call.
///
/// The service owns the adapter registry and the completion client so the
/// HTTP surface reuses the same components for every request. Construct it
/// once near process start and share it through an `Arc`.
pub struct DocumentService {
    dispatcher: SourceDispatcher,
    completion: Box<dyn CompletionClient>,
    limits: ServiceLimits,
    metrics: Arc<DocumentMetrics>,
}

/// Abstraction over the pipeline used by external surfaces.
#[async_trait]
pub trait DocumentApi: Send + Sync {
    /// Fetch one document, normalize it, and answer or summarize it.
    async fn process_document(
        &self,
        request: DocumentRequest,
    ) -> Result<FetchOutcome, ProcessingError>;

    /// Process an ordered batch of requests into one combined response.
    async fn batch_process(
        &self,
        requests: Vec<DocumentRequest>,
    ) -> Result<BatchOutcome, ProcessingError>;

    /// Enumerate files available to the named source.
    async fn list_files(
        &self,
        source: &str,
        folder_id: Option<&str>,
    ) -> Result<Vec<FileMetadata>, ProcessingError>;

    /// Fetch metadata for one file from the named source.
    async fn file_metadata(
        &self,
        source: &str,
        file_id: &str,
    ) -> Result<FileMetadata, ProcessingError>;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

impl DocumentService {
    /// Build the service with every supported adapter registered.
    pub fn new(config: &Config) -> Result<Self, ProcessingError> {
        let dispatcher = build_dispatcher(config).map_err(DispatchError::from)?;
        let completion = Box::new(HttpCompletionClient::new(&config.completion)?);
        Ok(Self::from_parts(
            dispatcher,
            completion,
            ServiceLimits::from_config(config),
        ))
    }

    /// Assemble a service from explicit parts.
    pub fn from_parts(
        dispatcher: SourceDispatcher,
        completion: Box<dyn CompletionClient>,
        limits: ServiceLimits,
    ) -> Self {
        Self {
            dispatcher,
            completion,
            limits,
            metrics: Arc::new(DocumentMetrics::new()),
        }
    }

    /// Fetch one document and generate an AI response for it.
    ///
    /// Unlike batches, every failure surfaces directly to the caller. Empty
    /// content short-circuits to the sentinel without a gateway call.
    pub async fn process_document(
        &self,
        request: DocumentRequest,
    ) -> Result<FetchOutcome, ProcessingError> {
        let DocumentRequest { fetch, query } = request;
        tracing::info!(source = %fetch.source, "Processing document");

        let payload = self.dispatcher.dispatch_fetch(&fetch).await?;
        let normalized = normalize(payload);
        self.metrics.record_document();

        if normalized.text.is_empty() {
            tracing::debug!(source = %fetch.source, "Fetch produced no content");
            return Ok(FetchOutcome {
                content: String::new(),
                ai_response: NO_CONTENT_SENTINEL.to_string(),
            });
        }

        tracing::debug!(
            source = %fetch.source,
            chars = normalized.original_length,
            "Normalized document"
        );
        let prompt = build_prompt(std::slice::from_ref(&normalized.text), query.as_deref());
        let ai_response = self
            .completion
            .complete(CompletionRequest {
                prompt,
                max_tokens: self.limits.completion_max_tokens,
            })
            .await?;

        let preview = normalized.preview();
        Ok(FetchOutcome {
            content: preview.text,
            ai_response,
        })
    }

    /// Fan a batch out to the dispatcher and produce one combined response.
    ///
    /// A single failing source never aborts the batch; its failure is
    /// recorded and the remaining requests proceed. Output order always
    /// matches request order regardless of completion order.
    pub async fn batch_process(
        &self,
        requests: Vec<DocumentRequest>,
    ) -> Result<BatchOutcome, ProcessingError> {
        tracing::info!(requests = requests.len(), "Processing document batch");

        let budget = self.limits.batch_timeout;
        let (documents, failures) =
            tokio::time::timeout(budget, self.collect_documents(&requests))
                .await
                .map_err(|_| {
                    tracing::warn!(budget_secs = budget.as_secs(), "Batch budget exceeded");
                    ProcessingError::BatchCancelled {
                        budget_secs: budget.as_secs(),
                    }
                })?;

        for failure in &failures {
            tracing::warn!(
                source = %failure.source,
                error = %failure.message,
                "Skipping failed batch source"
            );
        }
        self.metrics.record_batch(failures.len() as u64);

        if documents.is_empty() {
            tracing::debug!("Batch produced no usable content");
            return Ok(BatchOutcome {
                ai_response: NO_CONTENT_SENTINEL.to_string(),
                failures,
            });
        }

        let query = requests
            .iter()
            .find_map(|request| request.query.as_deref().map(str::trim))
            .filter(|query| !query.is_empty());
        let prompt = build_prompt(&documents, query);
        let ai_response = self
            .completion
            .complete(CompletionRequest {
                prompt,
                max_tokens: self.limits.completion_max_tokens,
            })
            .await?;

        tracing::info!(
            documents = documents.len(),
            failures = failures.len(),
            "Batch completed"
        );
        Ok(BatchOutcome {
            ai_response,
            failures,
        })
    }

    /// Dispatch every fetch concurrently and normalize the results.
    ///
    /// The bounded stream preserves request order in its output. Per-call
    /// timeouts and adapter errors are downgraded to entries in the failure
    /// list; empty documents are dropped silently.
    async fn collect_documents(
        &self,
        requests: &[DocumentRequest],
    ) -> (Vec<String>, Vec<SourceFailure>) {
        let fetch_timeout = self.limits.fetch_timeout;
        let pending: Vec<_> = requests
            .iter()
            .map(|request| self.fetch_one(request, fetch_timeout))
            .collect();
        let results: Vec<Result<String, SourceFailure>> = stream::iter(pending)
            .buffered(self.limits.fetch_concurrency.max(1))
            .collect()
            .await;

        let mut documents = Vec::new();
        let mut failures = Vec::new();
        for result in results {
            match result {
                Ok(text) => {
                    if !text.is_empty() {
                        documents.push(text);
                    }
                }
                Err(failure) => failures.push(failure),
            }
        }
        (documents, failures)
    }

    /// Fetch and normalize a single request, downgrading failures and timeouts
    /// to [`SourceFailure`] entries.
    async fn fetch_one(
        &self,
        request: &DocumentRequest,
        fetch_timeout: Duration,
    ) -> Result<String, SourceFailure> {
        match tokio::time::timeout(fetch_timeout, self.dispatcher.dispatch_fetch(&request.fetch))
            .await
        {
            Ok(Ok(payload)) => {
                self.metrics.record_document();
                Ok(normalize(payload).text)
            }
            Ok(Err(error)) => Err(SourceFailure {
                source: request.fetch.source.clone(),
                message: error.to_string(),
            }),
            Err(_) => Err(SourceFailure {
                source: request.fetch.source.clone(),
                message: format!("fetch timed out after {}s", fetch_timeout.as_secs()),
            }),
        }
    }

    /// Enumerate files available to the named source.
    pub async fn list_files(
        &self,
        source: &str,
        folder_id: Option<&str>,
    ) -> Result<Vec<FileMetadata>, ProcessingError> {
        let mut params = FetchParams::new();
        if let Some(folder_id) = folder_id {
            params.insert("folder_id".into(), Value::String(folder_id.to_string()));
        }
        Ok(self.dispatcher.dispatch_list(source, &params).await?)
    }

    /// Fetch metadata for one file from the named source.
    pub async fn file_metadata(
        &self,
        source: &str,
        file_id: &str,
    ) -> Result<FileMetadata, ProcessingError> {
        let mut params = FetchParams::new();
        params.insert("file_id".into(), Value::String(file_id.to_string()));
        Ok(self.dispatcher.dispatch_metadata(source, &params).await?)
    }

    /// Return the current request metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

fn build_dispatcher(config: &Config) -> Result<SourceDispatcher, SourceError> {
    let mut dispatcher = SourceDispatcher::new();
    dispatcher.register(Box::new(NotionAdapter::new(&config.notion)?));
    dispatcher.register(Box::new(GdocAdapter::new(&config.google_docs)?));
    dispatcher.register(Box::new(GsheetAdapter::new(&config.google_sheets)?));
    dispatcher.register(Box::new(GoogleDriveAdapter::new(&config.google_drive)?));
    Ok(dispatcher)
}

#[async_trait]
impl DocumentApi for DocumentService {
    async fn process_document(
        &self,
        request: DocumentRequest,
    ) -> Result<FetchOutcome, ProcessingError> {
        DocumentService::process_document(self, request).await
    }

    async fn batch_process(
        &self,
        requests: Vec<DocumentRequest>,
    ) -> Result<BatchOutcome, ProcessingError> {
        DocumentService::batch_process(self, requests).await
    }

    async fn list_files(
        &self,
        source: &str,
        folder_id: Option<&str>,
    ) -> Result<Vec<FileMetadata>, ProcessingError> {
        DocumentService::list_files(self, source, folder_id).await
    }

    async fn file_metadata(
        &self,
        source: &str,
        file_id: &str,
    ) -> Result<FileMetadata, ProcessingError> {
        DocumentService::file_metadata(self, source, file_id).await
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        DocumentService::metrics_snapshot(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::CompletionClientError;
    use crate::sources::{DocumentPayload, FetchRequest, SourceAdapter, SourceId};
    use std::sync::Mutex;

    enum StubBehavior {
        Text(&'static str),
        Empty,
        Fail,
        Slow(&'static str, Duration),
    }

    struct StubAdapter {
        id: SourceId,
        behavior: StubBehavior,
    }

    #[async_trait]
    impl SourceAdapter for StubAdapter {
        fn id(&self) -> SourceId {
            self.id
        }

        async fn fetch(&self, _params: &FetchParams) -> Result<DocumentPayload, SourceError> {
            match &self.behavior {
                StubBehavior::Text(content) => Ok(DocumentPayload::Text((*content).into())),
                StubBehavior::Empty => Ok(DocumentPayload::Text(String::new())),
                StubBehavior::Fail => Err(SourceError::UnsupportedShape {
                    source_id: self.id,
                    detail: "stubbed transport failure".into(),
                }),
                StubBehavior::Slow(content, delay) => {
                    tokio::time::sleep(*delay).await;
                    Ok(DocumentPayload::Text((*content).into()))
                }
            }
        }
    }

    #[derive(Clone, Default)]
    struct RecordingCompletion {
        prompts: Arc<Mutex<Vec<String>>>,
    }

    impl RecordingCompletion {
        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().expect("prompts lock").clone()
        }
    }

    #[async_trait]
    impl CompletionClient for RecordingCompletion {
        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> Result<String, CompletionClientError> {
            self.prompts
                .lock()
                .expect("prompts lock")
                .push(request.prompt);
            Ok("stubbed response".into())
        }
    }

    fn limits() -> ServiceLimits {
        ServiceLimits {
            fetch_timeout: Duration::from_millis(200),
            batch_timeout: Duration::from_secs(5),
            fetch_concurrency: 4,
            completion_max_tokens: 256,
        }
    }

    fn service_with(
        adapters: Vec<StubAdapter>,
        limits: ServiceLimits,
    ) -> (DocumentService, RecordingCompletion) {
        let mut dispatcher = SourceDispatcher::new();
        for adapter in adapters {
            dispatcher.register(Box::new(adapter));
        }
        let completion = RecordingCompletion::default();
        let service =
            DocumentService::from_parts(dispatcher, Box::new(completion.clone()), limits);
        (service, completion)
    }

    fn request(source: &str, query: Option<&str>) -> DocumentRequest {
        DocumentRequest {
            fetch: FetchRequest {
                source: source.into(),
                params: FetchParams::new(),
            },
            query: query.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn single_fetch_returns_preview_and_response() {
        let (service, completion) = service_with(
            vec![StubAdapter {
                id: SourceId::Notion,
                behavior: StubBehavior::Text("Page body"),
            }],
            limits(),
        );

        let outcome = service
            .process_document(request("notion", Some("What is this?")))
            .await
            .expect("outcome");

        assert_eq!(outcome.content, "Page body");
        assert_eq!(outcome.ai_response, "stubbed response");
        let prompts = completion.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Page body"));
        assert!(prompts[0].ends_with("What is this?"));
    }

    #[tokio::test]
    async fn single_fetch_with_empty_content_skips_gateway() {
        let (service, completion) = service_with(
            vec![StubAdapter {
                id: SourceId::Notion,
                behavior: StubBehavior::Empty,
            }],
            limits(),
        );

        let outcome = service
            .process_document(request("notion", None))
            .await
            .expect("outcome");

        assert_eq!(outcome.ai_response, NO_CONTENT_SENTINEL);
        assert!(completion.prompts().is_empty());
    }

    #[tokio::test]
    async fn single_fetch_surfaces_dispatch_errors() {
        let (service, _) = service_with(Vec::new(), limits());

        let error = service
            .process_document(request("notion", None))
            .await
            .expect_err("unsupported source");
        assert!(matches!(
            error,
            ProcessingError::Dispatch(DispatchError::UnsupportedSource(_))
        ));
    }

    #[tokio::test]
    async fn batch_continues_past_failing_source() {
        let (service, completion) = service_with(
            vec![
                StubAdapter {
                    id: SourceId::Notion,
                    behavior: StubBehavior::Text("alpha doc"),
                },
                StubAdapter {
                    id: SourceId::Gdoc,
                    behavior: StubBehavior::Fail,
                },
                StubAdapter {
                    id: SourceId::Gsheet,
                    behavior: StubBehavior::Text("gamma doc"),
                },
            ],
            limits(),
        );

        let outcome = service
            .batch_process(vec![
                request("notion", None),
                request("gdoc", None),
                request("gsheet", None),
            ])
            .await
            .expect("outcome");

        assert_eq!(outcome.ai_response, "stubbed response");
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].source, "gdoc");

        let prompts = completion.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("alpha doc\n\n---\n\ngamma doc"));
        assert!(!prompts[0].contains("gdoc"));
    }

    #[tokio::test]
    async fn batch_preserves_request_order_despite_completion_order() {
        let (service, completion) = service_with(
            vec![
                StubAdapter {
                    id: SourceId::Notion,
                    behavior: StubBehavior::Slow("slow first", Duration::from_millis(80)),
                },
                StubAdapter {
                    id: SourceId::Gdoc,
                    behavior: StubBehavior::Text("fast second"),
                },
            ],
            limits(),
        );

        service
            .batch_process(vec![request("notion", None), request("gdoc", None)])
            .await
            .expect("outcome");

        let prompts = completion.prompts();
        assert!(prompts[0].contains("slow first\n\n---\n\nfast second"));
    }

    #[tokio::test]
    async fn batch_with_no_usable_content_short_circuits() {
        let (service, completion) = service_with(
            vec![
                StubAdapter {
                    id: SourceId::Notion,
                    behavior: StubBehavior::Empty,
                },
                StubAdapter {
                    id: SourceId::Gdoc,
                    behavior: StubBehavior::Fail,
                },
            ],
            limits(),
        );

        let outcome = service
            .batch_process(vec![request("notion", None), request("gdoc", None)])
            .await
            .expect("outcome");

        assert_eq!(outcome.ai_response, NO_CONTENT_SENTINEL);
        assert!(completion.prompts().is_empty());
    }

    #[tokio::test]
    async fn batch_uses_first_specified_query() {
        let (service, completion) = service_with(
            vec![
                StubAdapter {
                    id: SourceId::Notion,
                    behavior: StubBehavior::Text("doc one"),
                },
                StubAdapter {
                    id: SourceId::Gdoc,
                    behavior: StubBehavior::Text("doc two"),
                },
                StubAdapter {
                    id: SourceId::Gsheet,
                    behavior: StubBehavior::Text("doc three"),
                },
            ],
            limits(),
        );

        service
            .batch_process(vec![
                request("notion", None),
                request("gdoc", Some("Q1")),
                request("gsheet", Some("Q2")),
            ])
            .await
            .expect("outcome");

        let prompts = completion.prompts();
        assert!(prompts[0].ends_with("Q1"));
    }

    #[tokio::test]
    async fn per_call_timeout_is_an_ordinary_source_failure() {
        let mut limits = limits();
        limits.fetch_timeout = Duration::from_millis(20);
        let (service, completion) = service_with(
            vec![
                StubAdapter {
                    id: SourceId::Notion,
                    behavior: StubBehavior::Slow("too slow", Duration::from_millis(200)),
                },
                StubAdapter {
                    id: SourceId::Gdoc,
                    behavior: StubBehavior::Text("on time"),
                },
            ],
            limits,
        );

        let outcome = service
            .batch_process(vec![request("notion", None), request("gdoc", None)])
            .await
            .expect("outcome");

        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].source, "notion");
        assert!(outcome.failures[0].message.contains("timed out"));
        assert!(completion.prompts()[0].contains("on time"));
    }

    #[tokio::test]
    async fn batch_budget_expiry_cancels_the_whole_batch() {
        let mut limits = limits();
        limits.batch_timeout = Duration::from_millis(30);
        let (service, completion) = service_with(
            vec![StubAdapter {
                id: SourceId::Notion,
                behavior: StubBehavior::Slow("never seen", Duration::from_millis(150)),
            }],
            limits,
        );

        let error = service
            .batch_process(vec![request("notion", None)])
            .await
            .expect_err("cancelled batch");

        assert!(matches!(error, ProcessingError::BatchCancelled { .. }));
        assert!(completion.prompts().is_empty());
    }
}
