use chrono::{TimeZone, Utc};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rand::SeedableRng;
use rand::rngs::StdRng;

use cqrsbench::executor;
use cqrsbench::payload;
use cqrsbench::report;
use cqrsbench::stats;
use cqrsbench::types::{OperationResult, OperationType};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// `size` results split evenly between INSERT and QUERY, every tenth one
/// failed, with deterministic pseudo-random latencies.
fn make_results(size: usize) -> Vec<OperationResult> {
    let base = Utc.timestamp_opt(1_760_000_000, 0).unwrap();
    (0..size)
        .map(|i| {
            let (operation_type, number) = if i < size / 2 {
                (OperationType::Insert, i + 1)
            } else {
                (OperationType::Query, i - size / 2 + 1)
            };
            let success = i % 10 != 9;
            OperationResult {
                operation_type,
                operation_number: number,
                duration_ms: ((i * 7919) % 997) as f64 / 10.0 + 1.0,
                success,
                status_code: if success { 200 } else { 500 },
                post_id: Some(format!("{}", i)),
                error_message: if success {
                    String::new()
                } else {
                    "{\"error\": \"internal, retry\"}".to_string()
                },
                timestamp: base + chrono::TimeDelta::milliseconds(i as i64),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_summarize(c: &mut Criterion) {
    let mut group = c.benchmark_group("summarize");
    for size in [100, 10_000] {
        let results = make_results(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &results, |b, r| {
            b.iter(|| stats::summarize(r));
        });
    }
    group.finish();
}

fn bench_quantile(c: &mut Criterion) {
    let mut sorted: Vec<f64> = make_results(10_000).iter().map(|r| r.duration_ms).collect();
    sorted.sort_by(|a, b| a.total_cmp(b));

    c.bench_function("quantile_p99_10000", |b| {
        b.iter(|| stats::quantile(&sorted, 0.99));
    });
}

fn bench_csv(c: &mut Criterion) {
    let results = make_results(1_000);
    let text = report::format_csv(&results);

    let mut group = c.benchmark_group("csv");
    group.bench_function("format_1000", |b| {
        b.iter(|| report::format_csv(&results));
    });
    group.bench_function("parse_1000", |b| {
        b.iter(|| report::parse_csv(&text).unwrap());
    });
    group.finish();
}

fn bench_payload(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(1);

    let mut group = c.benchmark_group("payload");
    group.bench_function("post", |b| {
        b.iter(|| payload::generate_post(42, &mut rng));
    });
    group.bench_function("comment", |b| {
        b.iter(|| payload::generate_comment(&mut rng));
    });
    group.finish();
}

fn bench_extract_id(c: &mut Criterion) {
    let bodies = [
        ("numeric", r#"{"id": 12345, "content": "Benchmark post"}"#),
        ("oid", r#"{"_id": {"$oid": "65f0c0ffee65f0c0ffee65f0"}}"#),
        ("invalid", "<html>Created</html>"),
    ];

    let mut group = c.benchmark_group("extract_id");
    for (name, body) in &bodies {
        group.bench_with_input(BenchmarkId::new("body", name), body, |b, body| {
            b.iter(|| executor::extract_id(body));
        });
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// Criterion groups
// ---------------------------------------------------------------------------

criterion_group!(
    benches,
    bench_summarize,
    bench_quantile,
    bench_csv,
    bench_payload,
    bench_extract_id,
);
criterion_main!(benches);
