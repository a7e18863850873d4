use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use prime_search::{DiagnosticLog, MemorySink, SecureRandomSource};

fn bench_next_int(c: &mut Criterion) {
    let mut rng = SecureRandomSource::open().unwrap();

    c.bench_function("next_int", |b| b.iter(|| rng.next_int().unwrap()));
}

fn bench_bounded_int(c: &mut Criterion) {
    let mut rng = SecureRandomSource::open().unwrap();

    c.bench_function("bounded_int_10", |b| {
        b.iter(|| rng.bounded_int(black_box(10)).unwrap())
    });
}

fn bench_next_unit_double(c: &mut Criterion) {
    let mut rng = SecureRandomSource::open().unwrap();

    c.bench_function("next_unit_double", |b| {
        b.iter(|| rng.next_unit_double().unwrap())
    });
}

fn bench_log_scope(c: &mut Criterion) {
    let log = DiagnosticLog::new(MemorySink::new());

    let mut group = c.benchmark_group("log_scope");
    group.bench_function("disabled", |b| {
        b.iter(|| {
            let _scope = log.scope("bench", &[&black_box(64)]);
        })
    });
    log.set_enabled(true);
    group.bench_function("enabled", |b| {
        b.iter(|| {
            let _scope = log.scope("bench", &[&black_box(64)]);
        })
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_next_int,
    bench_bounded_int,
    bench_next_unit_double,
    bench_log_scope
);
criterion_main!(benches);
