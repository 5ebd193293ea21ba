//! Query error types
//!
//! Every error is fatal for the request it belongs to. Each variant maps to
//! one LQL wire status code.

use crate::backend::BackendError;
use crate::logstore::LogStoreError;
use crate::model::StoreError;
use crate::schema::Table;
use thiserror::Error;

/// Errors that can occur while parsing or executing a request
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    /// `GET` named a table that does not exist
    #[error("Invalid GET request, no such table '{0}'")]
    UnknownTable(String),

    /// A `Columns`, `Filter` or `Stats` line named an unknown attribute
    #[error("Table '{table}' has no column '{column}'")]
    UnknownColumn { table: Table, column: String },

    /// Bad operator, reference, or stack depth in a filter or stats line
    #[error("Malformed filter: {0}")]
    MalformedFilter(String),

    /// Request is structurally invalid
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Unexpected failure during execution or formatting
    #[error("Internal error: {0}")]
    Internal(String),
}

impl QueryError {
    /// LQL status code sent in the fixed16 response header
    pub fn status_code(&self) -> u16 {
        match self {
            QueryError::BadRequest(_) => 400,
            QueryError::UnknownTable(_) => 404,
            QueryError::UnknownColumn { .. } => 450,
            QueryError::MalformedFilter(_) => 452,
            QueryError::Internal(_) => 500,
        }
    }

    pub fn unknown_column(table: Table, column: impl Into<String>) -> Self {
        QueryError::UnknownColumn {
            table,
            column: column.into(),
        }
    }
}

impl From<StoreError> for QueryError {
    fn from(e: StoreError) -> Self {
        QueryError::Internal(e.to_string())
    }
}

impl From<LogStoreError> for QueryError {
    fn from(e: LogStoreError) -> Self {
        QueryError::Internal(e.to_string())
    }
}

impl From<BackendError> for QueryError {
    fn from(e: BackendError) -> Self {
        QueryError::Internal(e.to_string())
    }
}

/// Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(QueryError::UnknownTable("x".into()).status_code(), 404);
        assert_eq!(
            QueryError::unknown_column(Table::Hosts, "nope").status_code(),
            450
        );
        assert_eq!(QueryError::MalformedFilter("x".into()).status_code(), 452);
        assert_eq!(QueryError::BadRequest("x".into()).status_code(), 400);
        assert_eq!(QueryError::Internal("x".into()).status_code(), 500);
    }

    #[test]
    fn test_messages() {
        let err = QueryError::unknown_column(Table::Services, "bogus");
        assert_eq!(err.to_string(), "Table 'services' has no column 'bogus'");
    }
}
