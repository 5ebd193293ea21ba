//! Combined requests: commands, wait lines, log history and the document backend

use livestatus::backend::BackendResult;
use livestatus::{
    CommandSink, DocumentBackend, Host, LiveStatus, LogLine, MemoryStore, RequestOutcome,
    Response, Service, SqliteLogStore, StoreSnapshot,
};
use serde_json::{json, Value as Json};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::tempdir;

#[derive(Default)]
struct CollectCommands(Mutex<Vec<String>>);

impl CommandSink for CollectCommands {
    fn forward(&self, command: &str) {
        self.0.lock().unwrap().push(command.to_string());
    }
}

fn store() -> Arc<MemoryStore> {
    Arc::new(
        MemoryStore::build(
            StoreSnapshot::default()
                .host(Host::new("web01").state(0))
                .service(Service::new("web01", "http").state(2))
                .service(Service::new("web01", "ssh").state(0)),
        )
        .unwrap(),
    )
}

fn respond(engine: &LiveStatus, request: &str) -> Response {
    match engine.handle_request(request) {
        RequestOutcome::Response(response) => response,
        RequestOutcome::Wait { .. } => panic!("unexpected wait"),
    }
}

#[test]
fn test_commands_forwarded_before_query() {
    let sink = Arc::new(CollectCommands::default());
    let engine = LiveStatus::new(store()).with_command_sink(sink.clone());

    let response = respond(
        &engine,
        "COMMAND [1700000000] ACKNOWLEDGE_SVC_PROBLEM;web01;http;1;1;0;admin;ok\nCOMMAND [1700000001] DISABLE_NOTIFICATIONS\nGET services\nColumns: description\nFilter: state = 2\n",
    );
    assert_eq!(response.body, "http\n");
    assert_eq!(
        sink.0.lock().unwrap().as_slice(),
        [
            "[1700000000] ACKNOWLEDGE_SVC_PROBLEM;web01;http;1;1;0;admin;ok",
            "[1700000001] DISABLE_NOTIFICATIONS",
        ]
    );
}

#[test]
fn test_commands_with_wait_but_no_query_rejected() {
    let sink = Arc::new(CollectCommands::default());
    let engine = LiveStatus::new(store()).with_command_sink(sink.clone());
    let response = respond(&engine, "COMMAND [1] DISABLE_NOTIFICATIONS\nWaitTimeout: 100\n");
    assert_eq!(response.status, 400);
    assert!(sink.0.lock().unwrap().is_empty());
}

#[test]
fn test_wait_on_service_object() {
    let engine = LiveStatus::new(store());
    let outcome = engine.handle_request(
        "GET services\nWaitObject: web01;http\nWaitCondition: state = 2\nWaitTrigger: check\nWaitTimeout: 2500\nColumns: host_name description state\n",
    );
    let RequestOutcome::Wait { wait, query } = outcome else {
        panic!("expected a wait outcome");
    };
    assert_eq!(wait.trigger.as_deref(), Some("check"));
    assert_eq!(wait.timeout, Duration::from_millis(2500));
    assert!(engine.wait_fulfilled(&wait).unwrap());

    let response = engine.answer(&query);
    assert_eq!(response.body, "web01;http;2\nweb01;ssh;0\n");
}

#[test]
fn test_wait_condition_not_met() {
    let engine = LiveStatus::new(store());
    let RequestOutcome::Wait { wait, .. } = engine.handle_request(
        "GET services\nWaitObject: web01 ssh\nWaitCondition: state = 2\nWaitCondition: state = 3\nWaitConditionOr: 2\n",
    ) else {
        panic!("expected a wait outcome");
    };
    assert!(!engine.wait_fulfilled(&wait).unwrap());
    assert_eq!(wait.timeout_secs(), 0.0);
}

#[test]
fn test_wait_with_bad_condition() {
    let engine = LiveStatus::new(store());
    let response = respond(&engine, "GET hosts\nWaitObject: web01\nWaitCondition: nosuch = 1\n");
    assert_eq!(response.status, 450);
}

#[test]
fn test_log_table_from_sqlite() {
    let dir = tempdir().unwrap();
    let logs = SqliteLogStore::open(&dir.path().join("logs.db")).unwrap();
    for (time, class, host, message) in [
        (100, 1, "web01", "HOST ALERT: web01;DOWN;HARD;1;timeout"),
        (200, 3, "web01", "HOST NOTIFICATION: admin;web01;DOWN"),
        (300, 1, "db01", "HOST ALERT: db01;UP;HARD;1;ok"),
    ] {
        logs.insert(&LogLine {
            time,
            class,
            host_name: host.to_string(),
            message: message.to_string(),
            ..Default::default()
        })
        .unwrap();
    }

    let engine = LiveStatus::new(store()).with_log_store(Arc::new(logs));
    let response = respond(
        &engine,
        "GET log\nColumns: time host_name\nFilter: time >= 150\nFilter: class = 1\nAnd: 2\n",
    );
    assert_eq!(response.body, "300;db01\n");

    let regex = respond(
        &engine,
        "GET log\nColumns: time\nFilter: message ~ NOTIFICATION\nFilter: host_name = db01\nOr: 2\n",
    );
    assert_eq!(regex.body, "200\n300\n");
}

#[test]
fn test_log_case_insensitive_match_beyond_ascii() {
    let logs = SqliteLogStore::open_in_memory().unwrap();
    for (time, host) in [(100, "Ürün"), (200, "ürün"), (300, "urun")] {
        logs.insert(&LogLine {
            time,
            class: 1,
            host_name: host.to_string(),
            ..Default::default()
        })
        .unwrap();
    }
    let engine = LiveStatus::new(store()).with_log_store(Arc::new(logs));

    let equal = respond(&engine, "GET log\nColumns: host_name\nFilter: host_name =~ ÜRÜN\nLimit: 5\n");
    assert_eq!(equal.body, "Ürün\nürün\n");

    let unequal = respond(&engine, "GET log\nColumns: time\nFilter: host_name !=~ ürün\n");
    assert_eq!(unequal.body, "300\n");
}

struct StaticBackend {
    services: Vec<Json>,
}

impl DocumentBackend for StaticBackend {
    fn find(&self, collection: &str, _filter: &Json, limit: Option<usize>) -> BackendResult<Vec<Json>> {
        assert_eq!(collection, "services");
        Ok(self
            .services
            .iter()
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    fn aggregate(&self, _collection: &str, _pipeline: &[Json]) -> BackendResult<Vec<Json>> {
        Ok(vec![json!({"_id": null, "value": 1.5})])
    }

    fn count(&self, _collection: &str, _filter: &Json) -> BackendResult<u64> {
        Ok(self.services.len() as u64)
    }
}

#[test]
fn test_document_backend_answers_scan_tables() {
    let backend = StaticBackend {
        services: vec![
            json!({"host_name": "remote01", "service_description": "disk", "state": 1}),
            json!({"host_name": "remote02", "service_description": "load", "state": 0}),
        ],
    };
    let engine = LiveStatus::new(store()).with_backend(Arc::new(backend));

    let response = respond(&engine, "GET services\nColumns: host_name description state\nLimit: 1\n");
    assert_eq!(response.body, "remote01;disk;1\n");

    let stats = respond(&engine, "GET services\nStats: state >= 0\nStats: avg latency\n");
    assert_eq!(stats.body, "2;1.5\n");

    // Not a scan table: answered from the object store
    let status = respond(&engine, "GET status\nColumns: num_services\n");
    assert_eq!(status.body, "2\n");
}
