#![deny(missing_docs)]

//! Core library for the docbridge document gateway.

/// HTTP routing and REST handlers.
pub mod api;
/// AI completion gateway.
pub mod completion;
/// Environment-driven configuration management.
pub mod config;
/// Structured logging and tracing setup.
pub mod logging;
/// Request counters for observability.
pub mod metrics;
/// Fetch, normalization, and batch summarization pipeline.
pub mod processing;
/// Document source adapters and dispatch.
pub mod sources;
