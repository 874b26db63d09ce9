//! Store reader benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use docdiff_bench::utils::store_image;
use docdiff_core::DiffEngine;
use docdiff_storage::{FileBackend, InMemoryBackend};
use docdiff_store::{Db, DocReadMode, StoreConfig};
use tempfile::TempDir;

fn open_image(image: &[u8], config: &StoreConfig) -> Db {
    Db::open_backend(Box::new(InMemoryBackend::with_data(image.to_vec())), "bench", config)
        .unwrap()
}

/// Benchmark opening a store: header scan plus index load.
fn bench_open(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_open");

    for count in [1_000, 10_000].iter() {
        let image = store_image(*count, 128, 7);
        group.throughput(Throughput::Bytes(image.len() as u64));

        for (name, verify) in [("checked", true), ("unchecked", false)] {
            let config = StoreConfig::new().verify_checksums(verify);
            group.bench_with_input(BenchmarkId::new(name, count), &image, |b, image| {
                b.iter(|| black_box(open_image(black_box(image), &config)));
            });
        }
    }

    group.finish();
}

/// Benchmark opening a file-backed store and diffing it against a sibling.
fn bench_file_diff(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_file_diff");
    group.sample_size(20);

    let temp_dir = TempDir::new().unwrap();
    let path_a = temp_dir.path().join("a.ddb");
    let path_b = temp_dir.path().join("b.ddb");
    std::fs::write(&path_a, store_image(10_000, 64, 8)).unwrap();
    std::fs::write(&path_b, store_image(10_000, 64, 9)).unwrap();
    let config = StoreConfig::default();

    group.bench_function("10000", |b| {
        b.iter(|| {
            let db_a = Db::open(&path_a, &config).unwrap();
            let db_b = Db::open(&path_b, &config).unwrap();
            black_box(DiffEngine::new().diff_with(db_a.all_docs(), db_b.all_docs(), |_| {}))
        });
    });

    group.finish();
}

/// Benchmark reading every body of a store.
fn bench_read_bodies(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_read_bodies");
    let image = store_image(1_000, 1024, 10);
    let db = open_image(&image, &StoreConfig::default());

    group.throughput(Throughput::Elements(db.all_docs().len() as u64));
    group.bench_function("1000x1KB", |b| {
        b.iter(|| {
            for info in db.all_docs() {
                black_box(db.open_doc(info, DocReadMode::Decompress).unwrap());
            }
        });
    });

    group.finish();
}

/// Benchmark reading a store through the file backend.
fn bench_file_open(c: &mut Criterion) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("bench.ddb");
    std::fs::write(&path, store_image(10_000, 64, 11)).unwrap();
    let config = StoreConfig::default();

    c.bench_function("file_backend_open", |b| {
        b.iter(|| {
            let backend = FileBackend::open_read_only(&path).unwrap();
            black_box(Db::open_backend(Box::new(backend), "bench", &config).unwrap())
        });
    });
}

criterion_group!(
    benches,
    bench_open,
    bench_file_diff,
    bench_read_bodies,
    bench_file_open,
);

criterion_main!(benches);
