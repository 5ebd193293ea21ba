//! Benchmarks for the LQL engine
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use livestatus::{
    parse_query, Executor, Host, LiveStatus, MemoryStore, RequestOutcome, Service, StoreSnapshot,
};
use std::sync::Arc;

fn create_store(hosts: usize) -> MemoryStore {
    let mut snapshot = StoreSnapshot::default();
    for i in 0..hosts {
        let name = format!("host_{:05}", i);
        snapshot = snapshot.host(
            Host::new(name.clone())
                .state((i % 3) as i64)
                .group(if i % 2 == 0 { "even" } else { "odd" }),
        );
        for svc in ["cpu", "disk", "http"] {
            snapshot = snapshot.service(
                Service::new(name.clone(), svc)
                    .state((i % 4) as i64)
                    .max_check_attempts(3),
            );
        }
    }
    MemoryStore::build(snapshot).unwrap()
}

fn bench_parse(c: &mut Criterion) {
    let request = "GET services\nColumns: host_name description state plugin_output\n\
                   Filter: state = 1\nFilter: state = 2\nOr: 2\nFilter: host_groups >= even\n\
                   Filter: description ~~ ^HT\nNegate: 1\nAnd: 3\nOutputFormat: json\n";

    c.bench_function("parse_query", |b| {
        b.iter(|| parse_query(black_box(request)).unwrap())
    });
}

fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter");

    for size in [100, 1000, 5000] {
        let store = create_store(size);
        let executor = Executor::new(&store);
        let query = parse_query(
            "GET services\nColumns: host_name description\nFilter: state = 2\nFilter: host_groups >= even\nAnd: 2\n",
        )
        .unwrap();

        group.throughput(Throughput::Elements((size * 3) as u64));
        group.bench_function(format!("services_{}", size), |b| {
            b.iter(|| executor.execute(black_box(&query)).unwrap())
        });
    }

    group.finish();
}

fn bench_stats(c: &mut Criterion) {
    let store = create_store(1000);
    let executor = Executor::new(&store);
    let query = parse_query(
        "GET services\nStats: state = 1\nStats: state = 2\nStatsOr: 2\nStats: max_check_attempts = 3\nStatsAnd: 2\nStats: avg latency\n",
    )
    .unwrap();

    c.bench_function("stats_services_3000", |b| {
        b.iter(|| executor.execute(black_box(&query)).unwrap())
    });
}

fn bench_request(c: &mut Criterion) {
    let engine = LiveStatus::new(Arc::new(create_store(1000)));
    let request = "GET hostsbygroup\nColumns: name hostgroup_name state\nFilter: state != 0\nResponseHeader: fixed16\n";

    c.bench_function("request_roundtrip", |b| {
        b.iter(|| match engine.handle_request(black_box(request)) {
            RequestOutcome::Response(response) => response,
            RequestOutcome::Wait { .. } => unreachable!(),
        })
    });
}

criterion_group!(benches, bench_parse, bench_filter, bench_stats, bench_request);
criterion_main!(benches);
