use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing fetch and batch activity.
#[derive(Default)]
pub struct DocumentMetrics {
    documents_fetched: AtomicU64,
    batches_processed: AtomicU64,
    source_failures: AtomicU64,
}

impl DocumentMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successfully fetched and normalized document.
    pub fn record_document(&self) {
        self.documents_fetched.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a completed batch and the per-source failures it absorbed.
    pub fn record_batch(&self, failed_sources: u64) {
        self.batches_processed.fetch_add(1, Ordering::Relaxed);
        self.source_failures
            .fetch_add(failed_sources, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            documents_fetched: self.documents_fetched.load(Ordering::Relaxed),
            batches_processed: self.batches_processed.load(Ordering::Relaxed),
            source_failures: self.source_failures.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of request counters used for reporting.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Number of documents fetched and normalized since startup.
    pub documents_fetched: u64,
    /// Number of batch requests processed since startup.
    pub batches_processed: u64,
    /// Number of per-source failures absorbed by batches.
    pub source_failures: u64,
}
