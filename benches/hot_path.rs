//! Hot-path benchmarks for the storage and aggregation core.
//!
//! # Test Scenarios
//!
//! 1. **Counter increment**: the cheapest write path. Measures label
//!    validation + key normalization + one locked map update.
//! 2. **Labeled increment**: same path with two call-site labels, which is
//!    the common instrumentation shape.
//! 3. **Histogram observe**: the widest write path; one observation fans
//!    out into bucket cells, `+Inf`, and `sum`.
//! 4. **Read-back**: `get` and full `values()` snapshots at varying series
//!    counts, the exporter-facing paths.
//!
//! Validation dominates the write paths by design: the store update is a
//! single hash-map operation behind an uncontended lock.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;
use tallycraft::store::InMemoryStore;
use tallycraft::{Counter, Histogram, Labels, Summary};

fn bench_counter_increment(c: &mut Criterion) {
    let counter = Counter::builder("bench_plain_total", "Unlabeled counter")
        .store(Arc::new(InMemoryStore::new()))
        .build()
        .unwrap();

    c.bench_function("counter_increment_no_labels", |b| {
        b.iter(|| counter.increment(black_box(Labels::new())).unwrap())
    });
}

fn bench_counter_increment_labeled(c: &mut Criterion) {
    let counter = Counter::builder("bench_labeled_total", "Labeled counter")
        .labels(&["service", "code"])
        .store(Arc::new(InMemoryStore::new()))
        .build()
        .unwrap();

    c.bench_function("counter_increment_two_labels", |b| {
        b.iter(|| {
            counter
                .increment(black_box(
                    Labels::new().with("service", "web").with("code", 200),
                ))
                .unwrap()
        })
    });
}

fn bench_histogram_observe(c: &mut Criterion) {
    let mut group = c.benchmark_group("histogram_observe");
    for bucket_count in [4usize, 11, 32] {
        let bounds: Vec<f64> = (1..=bucket_count).map(|i| i as f64).collect();
        let histogram = Histogram::builder("bench_latency", "Latency")
            .buckets(bounds)
            .store(Arc::new(InMemoryStore::new()))
            .build()
            .unwrap();

        group.throughput(Throughput::Elements(1));
        group.bench_with_input(
            BenchmarkId::from_parameter(bucket_count),
            &bucket_count,
            |b, &count| {
                // Middle of the range: roughly half the buckets match.
                let value = count as f64 / 2.0;
                b.iter(|| histogram.observe(black_box(value), Labels::new()).unwrap())
            },
        );
    }
    group.finish();
}

fn bench_summary_observe(c: &mut Criterion) {
    let summary = Summary::builder("bench_sizes", "Sizes")
        .store(Arc::new(InMemoryStore::new()))
        .build()
        .unwrap();

    c.bench_function("summary_observe", |b| {
        b.iter(|| summary.observe(black_box(42.0), Labels::new()).unwrap())
    });
}

fn bench_read_back(c: &mut Criterion) {
    let counter = Counter::builder("bench_read_total", "Read-back")
        .labels(&["series"])
        .store(Arc::new(InMemoryStore::new()))
        .build()
        .unwrap();

    let mut group = c.benchmark_group("read_back");
    for series in [1usize, 100, 1000] {
        for i in 0..series {
            counter
                .increment(Labels::new().with("series", i))
                .unwrap();
        }

        group.bench_with_input(
            BenchmarkId::new("values_snapshot", series),
            &series,
            |b, _| b.iter(|| black_box(counter.values())),
        );
    }
    group.bench_function("get_single_series", |b| {
        b.iter(|| counter.get(black_box(Labels::new().with("series", 0))).unwrap())
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_counter_increment,
    bench_counter_increment_labeled,
    bench_histogram_observe,
    bench_summary_observe,
    bench_read_back
);
criterion_main!(benches);
