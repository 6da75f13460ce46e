//! Performance benchmarks for the query registry.

use courier_registry::{
    Capacity, Courier, CourierId, CourierRegistry, CourierService, LookupOptions, MemoryStore,
    WriterNotifier,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;

fn courier(id: u64, capacity: u32) -> Courier {
    Courier::new(CourierId(id), Capacity::from(capacity))
}

/// Benchmark a register/deregister round trip on a single key
fn bench_register_deregister(c: &mut Criterion) {
    let registry = CourierRegistry::new();
    let key = Capacity::from(40);

    c.bench_function("register_deregister", |b| {
        b.iter(|| {
            let token = registry.register(black_box(key));
            black_box(registry.deregister(token));
        });
    });
}

/// Benchmark publishing against a growing number of registered keys
fn bench_publish(c: &mut Criterion) {
    let mut group = c.benchmark_group("publish");

    for key_count in [1u32, 10, 100, 1000] {
        group.bench_with_input(
            BenchmarkId::new("keys", key_count),
            &key_count,
            |b, &count| {
                let registry = Arc::new(CourierRegistry::new());
                let notifier = WriterNotifier::new(Arc::clone(&registry));
                // One token per key; deregistering every few publishes keeps
                // the buffers from growing across iterations.
                let mut tokens: Vec<_> =
                    (0..count).map(|k| registry.register(Capacity::from(k))).collect();
                let mut n = 0u64;

                b.iter(|| {
                    n += 1;
                    black_box(notifier.notify_committed(&courier(n, count / 2)));
                    if n % 64 == 0 {
                        for token in tokens.drain(..) {
                            registry.deregister(token);
                        }
                        tokens = (0..count).map(|k| registry.register(Capacity::from(k))).collect();
                    }
                });

                for token in tokens {
                    registry.deregister(token);
                }
            },
        );
    }

    group.finish();
}

/// Benchmark a full lookup with no grace window
fn bench_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("lookup");

    for store_size in [100u64, 1000, 10000] {
        group.bench_with_input(
            BenchmarkId::new("store_size", store_size),
            &store_size,
            |b, &size| {
                let store =
                    MemoryStore::with_couriers((0..size).map(|i| courier(i, (i % 100) as u32)));
                let service = CourierService::new(store);
                let options = LookupOptions::default();

                b.iter(|| {
                    black_box(service.lookup_with(Capacity::from(90), &options).unwrap());
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_register_deregister, bench_publish, bench_lookup);
criterion_main!(benches);
