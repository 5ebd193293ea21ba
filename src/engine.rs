//! Request handling facade
//!
//! `LiveStatus` ties the pieces together for one raw request:
//!
//! ```text
//! text ─▶ LiveStatusRequest ─┬─ commands ─▶ CommandSink
//!                            ├─ query ────▶ QueryParser ─▶ Executor ─▶ format ─▶ Response
//!                            └─ wait ─────▶ WaitQuery (returned to the caller's wait loop)
//! ```
//!
//! Errors never escape: every failure becomes an error `Response`, and a
//! panic during execution is reported as status 500.

use crate::backend::{DocumentBackend, DocumentExecutor};
use crate::config::LiveStatusConfig;
use crate::logstore::LogStore;
use crate::model::ObjectStore;
use crate::query::{
    format_error, format_result, frame, split_keyword, Executor, Query, QueryError, QueryParser,
    QueryResult, ResponseHeader, WaitQuery,
};
use crate::request::LiveStatusRequest;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::info_span;
use uuid::Uuid;

/// Receiver of external command text
pub trait CommandSink: Send + Sync {
    fn forward(&self, command: &str);
}

/// Sink that only logs commands
#[derive(Debug, Default)]
pub struct LoggingCommandSink;

impl CommandSink for LoggingCommandSink {
    fn forward(&self, command: &str) {
        tracing::info!(command, "External command received");
    }
}

/// Wire response for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    /// Payload, including the fixed16 header when requested
    pub body: String,
    pub keep_alive: bool,
}

impl Response {
    fn error(error: &QueryError, header: ResponseHeader) -> Self {
        Self {
            status: error.status_code(),
            body: format_error(error, header),
            keep_alive: false,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Result of handling a request
#[derive(Debug)]
pub enum RequestOutcome {
    Response(Response),
    /// The caller must poll `wait` until it holds or times out, then call
    /// `LiveStatus::answer`
    Wait { wait: WaitQuery, query: Box<Query> },
}

/// Livestatus query engine
pub struct LiveStatus {
    store: Arc<dyn ObjectStore>,
    log_store: Option<Arc<dyn LogStore>>,
    backend: Option<Arc<dyn DocumentBackend>>,
    commands: Arc<dyn CommandSink>,
    config: LiveStatusConfig,
}

impl LiveStatus {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            log_store: None,
            backend: None,
            commands: Arc::new(LoggingCommandSink),
            config: LiveStatusConfig::default(),
        }
    }

    /// Builder method: answer `GET log` from this store
    pub fn with_log_store(mut self, log_store: Arc<dyn LogStore>) -> Self {
        self.log_store = Some(log_store);
        self
    }

    /// Builder method: answer scan tables through a document backend
    pub fn with_backend(mut self, backend: Arc<dyn DocumentBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Builder method: where `COMMAND` lines are forwarded
    pub fn with_command_sink(mut self, sink: Arc<dyn CommandSink>) -> Self {
        self.commands = sink;
        self
    }

    pub fn with_config(mut self, config: LiveStatusConfig) -> Self {
        self.config = config;
        self
    }

    fn executor(&self) -> Executor<'_> {
        let executor = Executor::new(self.store.as_ref()).max_rows(self.config.max_response_rows);
        match &self.log_store {
            Some(log_store) => executor.with_log_store(log_store.as_ref()),
            None => executor,
        }
    }

    fn parser(&self) -> QueryParser {
        QueryParser::new()
            .default_format(self.config.default_output_format)
            .debug(self.config.debug_queries)
    }

    /// Handle one raw request
    pub fn handle_request(&self, text: &str) -> RequestOutcome {
        let span = info_span!("request", id = %Uuid::new_v4());
        let _guard = span.enter();

        // Known before parsing so that parse errors are framed too
        let header = if text
            .lines()
            .any(|l| split_keyword(l.trim()) == ("ResponseHeader", "fixed16"))
        {
            ResponseHeader::Fixed16
        } else {
            ResponseHeader::Off
        };

        let request = match LiveStatusRequest::parse(text) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(error = %e, "Rejected request");
                return RequestOutcome::Response(Response::error(&e, header));
            }
        };

        for command in &request.commands {
            self.commands.forward(command);
        }
        if !request.has_query() {
            return RequestOutcome::Response(Response {
                status: 200,
                body: String::new(),
                keep_alive: false,
            });
        }

        let query = match self.parser().parse(&request.query_text()) {
            Ok(query) => query,
            Err(e) => {
                tracing::warn!(error = %e, "Query rejected");
                return RequestOutcome::Response(Response::error(&e, header));
            }
        };

        if request.has_wait() {
            return match WaitQuery::parse(query.table, &request.wait) {
                Ok(wait) => RequestOutcome::Wait {
                    wait,
                    query: Box::new(query),
                },
                Err(e) => RequestOutcome::Response(Response::error(&e, header)),
            };
        }

        RequestOutcome::Response(self.answer(&query))
    }

    /// Check a wait condition once
    pub fn wait_fulfilled(&self, wait: &WaitQuery) -> QueryResult<bool> {
        wait.condition_fulfilled(&self.executor())
    }

    /// Execute a compiled query into a response
    pub fn answer(&self, query: &Query) -> Response {
        let outcome = catch_unwind(AssertUnwindSafe(|| self.run(query)))
            .unwrap_or_else(|_| Err(QueryError::Internal("query execution panicked".to_string())));

        match outcome {
            Ok(body) => Response {
                status: 200,
                body: frame(200, body, query.response_header),
                keep_alive: query.keep_alive,
            },
            Err(e) => {
                if e.status_code() == 500 {
                    tracing::error!(error = %e, table = %query.table, "Query execution failed");
                }
                Response::error(&e, query.response_header)
            }
        }
    }

    fn run(&self, query: &Query) -> QueryResult<String> {
        let executor = self.executor();
        let result = match &self.backend {
            Some(backend) => DocumentExecutor::new(backend.as_ref(), executor).execute(query)?,
            None => executor.execute(query)?,
        };
        Ok(format_result(&result, query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Host, MemoryStore, StoreSnapshot};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Collect(Mutex<Vec<String>>);

    impl CommandSink for Collect {
        fn forward(&self, command: &str) {
            self.0.lock().unwrap().push(command.to_string());
        }
    }

    fn engine() -> LiveStatus {
        let store = MemoryStore::build(
            StoreSnapshot::default()
                .host(Host::new("web01").state(0))
                .host(Host::new("db01").state(1)),
        )
        .unwrap();
        LiveStatus::new(Arc::new(store))
    }

    fn respond(engine: &LiveStatus, text: &str) -> Response {
        match engine.handle_request(text) {
            RequestOutcome::Response(response) => response,
            RequestOutcome::Wait { .. } => panic!("unexpected wait"),
        }
    }

    #[test]
    fn test_query_response() {
        let response = respond(&engine(), "GET hosts\nColumns: name\nFilter: state = 1\nKeepAlive: on\n");
        assert_eq!(response.status, 200);
        assert_eq!(response.body, "db01\n");
        assert!(response.keep_alive);
    }

    #[test]
    fn test_errors_are_framed() {
        let response = respond(&engine(), "GET nosuch\nResponseHeader: fixed16\n");
        assert_eq!(response.status, 404);
        assert!(response.body.starts_with("404 "));
        assert_eq!(&response.body[15..16], "\n");
        assert!(!response.keep_alive);
    }

    #[test]
    fn test_errors_framed_without_space_after_colon() {
        let response = respond(&engine(), "GET nosuch\nResponseHeader:fixed16\n");
        assert_eq!(response.status, 404);
        assert!(response.body.starts_with("404 "));
        let length: usize = response.body[4..15].trim().parse().unwrap();
        assert_eq!(length, response.body.len() - 16);
    }

    #[test]
    fn test_commands_only() {
        let sink = Arc::new(Collect::default());
        let engine = engine().with_command_sink(sink.clone());
        let response = respond(&engine, "COMMAND [1] DISABLE_NOTIFICATIONS\n");
        assert_eq!(response.body, "");
        assert!(!response.keep_alive);
        assert_eq!(sink.0.lock().unwrap().as_slice(), ["[1] DISABLE_NOTIFICATIONS"]);
    }

    #[test]
    fn test_wait_is_returned_to_caller() {
        let engine = engine();
        match engine.handle_request("GET hosts\nWaitObject: db01\nWaitCondition: state = 0\nColumns: name\n") {
            RequestOutcome::Wait { wait, query } => {
                assert!(!engine.wait_fulfilled(&wait).unwrap());
                assert_eq!(engine.answer(&query).body, "db01\nweb01\n");
            }
            RequestOutcome::Response(r) => panic!("expected wait, got {:?}", r),
        }
    }

    #[test]
    fn test_default_format_from_config() {
        let engine = engine().with_config(LiveStatusConfig {
            default_output_format: crate::query::OutputFormat::Json,
            ..Default::default()
        });
        let response = respond(&engine, "GET hosts\nColumns: name\nLimit: 1\n");
        assert_eq!(response.body, "[[\"db01\"]]\n");
    }
}
