//! Microbenchmarks for the bus accessor and an uncontended transfer

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use monobus::{Bus, BusConfig};
use std::time::Duration;

fn accessor_fast_path(c: &mut Criterion) {
    // Force construction so the benchmark measures the resolved path only
    let _ = Bus::instance();

    c.bench_function("instance_resolved", |b| {
        b.iter(|| criterion::black_box(Bus::instance()).peak_occupancy())
    });
}

fn uncontended_send(c: &mut Criterion) {
    let config = BusConfig {
        work_duration: Duration::ZERO,
    };

    c.bench_function("send_data_uncontended", |b| {
        b.iter_batched(
            || Bus::with_config(config.clone()),
            |bus| bus.send_data("bench"),
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, accessor_fast_path, uncontended_send);
criterion_main!(benches);
