//! Benchmarks for the GCRA step and the in-process backend.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tokio::runtime::Runtime;

use freqlimit::{gcra_step, Backend, FreqLimitParams, Key, MemoryBackend};

fn bench_gcra_step(c: &mut Criterion) {
    let params = FreqLimitParams::new(1000, 1.0).unwrap().with_burst(100).unwrap();

    c.bench_function("gcra_step", |b| {
        let mut tat = None;
        let mut now = 0.0f64;
        b.iter(|| {
            now += 0.0005;
            let (new_tat, delay) = gcra_step(black_box(now), black_box(tat), &params);
            tat = Some(new_tat);
            black_box(delay)
        })
    });
}

fn bench_memory_reserve(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let params = FreqLimitParams::new(1000, 1.0).unwrap().with_burst(100).unwrap();

    let mut group = c.benchmark_group("memory_backend");

    group.bench_function("reserve_single_key", |b| {
        let backend = MemoryBackend::new();
        let key = Key::from("bench");
        let mut now = 0.0f64;
        b.iter(|| {
            now += 0.0005;
            rt.block_on(async { black_box(backend.reserve(&key, now, &params).await) })
        })
    });

    group.bench_function("reserve_spread_keys", |b| {
        let backend = MemoryBackend::new();
        let mut i = 0u64;
        let mut now = 0.0f64;
        b.iter(|| {
            i += 1;
            now += 0.0005;
            let key = Key::from(format!("bench:{}", i % 100));
            rt.block_on(async { black_box(backend.reserve(&key, now, &params).await) })
        })
    });

    group.finish();
}

criterion_group!(benches, bench_gcra_step, bench_memory_reserve);
criterion_main!(benches);
