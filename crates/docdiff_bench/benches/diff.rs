//! Diff engine benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use docdiff_bench::utils::{derived_side, sorted_entries};
use docdiff_core::{DiffEngine, Entry};

/// Benchmark a full pass collecting every record.
fn bench_diff_collect(c: &mut Criterion) {
    let mut group = c.benchmark_group("diff_collect");

    for count in [1_000, 10_000, 100_000].iter() {
        let a = sorted_entries(*count, 1);
        let b = derived_side(&a, 0.05, 0.05, 2);
        group.throughput(Throughput::Elements((a.len() + b.len()) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &(a, b), |bench, (a, b)| {
            let engine = DiffEngine::new();
            bench.iter(|| {
                let report = engine.diff(black_box(a), black_box(b));
                black_box(report.summary);
            });
        });
    }

    group.finish();
}

/// Benchmark a streaming pass that only counts.
fn bench_diff_streaming(c: &mut Criterion) {
    let mut group = c.benchmark_group("diff_streaming");

    for count in [1_000, 10_000, 100_000].iter() {
        let a = sorted_entries(*count, 3);
        let b = derived_side(&a, 0.05, 0.05, 4);
        group.throughput(Throughput::Elements((a.len() + b.len()) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &(a, b), |bench, (a, b)| {
            let engine = DiffEngine::new();
            bench.iter(|| black_box(engine.iter(black_box(a), black_box(b)).finish()));
        });
    }

    group.finish();
}

/// Benchmark how the share of differing keys affects a pass.
fn bench_diff_divergence(c: &mut Criterion) {
    let mut group = c.benchmark_group("diff_divergence");
    let a = sorted_entries(50_000, 5);

    for percent in [0u32, 10, 50, 90].iter() {
        let ratio = f64::from(*percent) / 100.0;
        let b: Vec<Entry> = derived_side(&a, ratio, ratio, 6);
        group.bench_with_input(BenchmarkId::from_parameter(percent), &b, |bench, b| {
            let engine = DiffEngine::new();
            bench.iter(|| {
                let summary = engine.diff_with(&a, black_box(b), |c| {
                    black_box(c);
                });
                black_box(summary);
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_diff_collect,
    bench_diff_streaming,
    bench_diff_divergence,
);

criterion_main!(benches);
