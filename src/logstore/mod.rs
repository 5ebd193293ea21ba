//! Log history store
//!
//! - **filter**: SQL push-down filter built while parsing `GET log`
//! - **sqlite**: `SqliteLogStore`, the bundled implementation

mod filter;
mod sqlite;

pub use filter::LogFilter;
pub use sqlite::SqliteLogStore;

use crate::model::LogLine;
use thiserror::Error;

/// Errors raised by log store implementations
#[derive(Error, Debug)]
pub enum LogStoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type LogStoreResult<T> = Result<T, LogStoreError>;

/// Source of log lines for the `log` table
pub trait LogStore: Send + Sync {
    /// Lines matching at least `filter`, oldest first, at most `limit`
    fn log_lines(&self, filter: &LogFilter, limit: Option<usize>) -> LogStoreResult<Vec<LogLine>>;
}
