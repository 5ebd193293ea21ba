//! Alternate document-store execution backend
//!
//! When a `DocumentBackend` is configured, scan-table queries are compiled
//! to Mongo-style filter documents and answered by the backend instead of
//! the in-memory object store.
//!
//! - **document**: filter compilation and `DocumentExecutor`

mod document;

pub use document::{compile_filter, query_document, DocumentExecutor};

use serde_json::Value as Json;
use thiserror::Error;

/// Errors raised by document backends
#[derive(Error, Debug)]
pub enum BackendError {
    /// The backend could not be reached or refused the request
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// The backend rejected a filter or pipeline
    #[error("Backend rejected request: {0}")]
    Rejected(String),

    /// A returned document did not have the expected shape
    #[error("Unexpected document: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Document store holding one collection per scan table
pub trait DocumentBackend: Send + Sync {
    /// Documents of `collection` matching `filter`, at most `limit`
    fn find(&self, collection: &str, filter: &Json, limit: Option<usize>) -> BackendResult<Vec<Json>>;

    /// Run an aggregation pipeline
    fn aggregate(&self, collection: &str, pipeline: &[Json]) -> BackendResult<Vec<Json>>;

    /// Number of documents matching `filter`
    fn count(&self, collection: &str, filter: &Json) -> BackendResult<u64>;
}
