//! # Livestatus
//!
//! An LQL (Livestatus Query Language) engine: parses line-oriented
//! requests against a live monitoring object model and answers them in
//! CSV, JSON or Python literal syntax.
//!
//! ## Modules
//!
//! - [`schema`]: Tables, columns and the column registry
//! - [`model`]: Monitoring entities and the `ObjectStore` interface
//! - [`query`]: LQL parser, filter stacks, executor and response formatting
//! - [`logstore`]: SQLite-backed log history for `GET log`
//! - [`backend`]: Optional document-store execution backend
//! - [`request`]: Splitting requests into commands, query and wait lines
//! - [`engine`]: The `LiveStatus` facade answering raw requests
//! - [`config`]: TOML configuration with environment overrides
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use livestatus::{Host, LiveStatus, MemoryStore, RequestOutcome, StoreSnapshot};
//! use std::sync::Arc;
//!
//! let store = MemoryStore::build(
//!     StoreSnapshot::default()
//!         .host(Host::new("web01").state(0))
//!         .host(Host::new("db01").state(1)),
//! )?;
//! let engine = LiveStatus::new(Arc::new(store));
//!
//! if let RequestOutcome::Response(response) =
//!     engine.handle_request("GET hosts\nColumns: name state\nFilter: state = 1\n")
//! {
//!     print!("{}", response.body);
//! }
//! # Ok::<(), livestatus::StoreError>(())
//! ```

pub mod backend;
pub mod config;
pub mod engine;
pub mod logstore;
pub mod model;
pub mod query;
pub mod request;
pub mod schema;

// Re-export top-level types for convenience
pub use engine::{CommandSink, LiveStatus, LoggingCommandSink, RequestOutcome, Response};

pub use config::{Config, ConfigError, LiveStatusConfig, LogStoreConfig, LoggingConfig};

pub use model::{
    Comment, Contact, ContactGroup, Downtime, Host, HostGroup, Item, LogLine, MemoryStore,
    ObjectStore, Service, ServiceGroup, StoreError, StoreResult, StoreSnapshot, Value,
};

pub use query::{
    format_result, parse_query, Executor, OutputFormat, Query, QueryError, QueryParser,
    QueryResult, ResultSet, WaitQuery,
};

pub use logstore::{LogFilter, LogStore, LogStoreError, SqliteLogStore};

pub use backend::{BackendError, DocumentBackend, DocumentExecutor};

pub use request::LiveStatusRequest;

pub use schema::{Column, Datatype, Registry, Table};
