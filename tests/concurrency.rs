//! Concurrency properties of the registry and lookups.

use courier_registry::{
    Capacity, Courier, CourierId, CourierRegistry, CourierService, LookupOptions, MemoryStore,
    QueryRegistry, WriterNotifier,
};
use crossbeam_channel::bounded;
use proptest::prelude::*;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn courier(id: u64, capacity: u32) -> Courier {
    Courier::new(CourierId(id), Capacity::from(capacity))
}

#[test]
fn test_writer_does_not_wait_for_grace_window() {
    let service = Arc::new(CourierService::new(MemoryStore::new()));
    let required = Capacity::from(10);

    let lookup = {
        let service = Arc::clone(&service);
        thread::spawn(move || {
            service
                .lookup_with(required, &LookupOptions::with_grace(Duration::from_millis(1500)))
                .unwrap()
        })
    };
    while service.registry().stats().live_readers == 0 {
        thread::sleep(Duration::from_millis(1));
    }

    let started = Instant::now();
    service
        .register_courier(CourierId(1), Capacity::from(20))
        .unwrap();
    assert!(started.elapsed() < Duration::from_millis(500));

    let outcome = lookup.join().unwrap();
    assert_eq!(outcome.late_count, 1);
}

#[test]
fn test_grace_windows_run_in_parallel() {
    let service = Arc::new(CourierService::new(MemoryStore::with_couriers([courier(1, 50)])));
    let grace = Duration::from_millis(300);

    let started = Instant::now();
    let lookups: Vec<_> = (0..8u32)
        .map(|i| {
            let service = Arc::clone(&service);
            thread::spawn(move || {
                service
                    .lookup_with(Capacity::from(i * 5), &LookupOptions::with_grace(grace))
                    .unwrap()
                    .into_records()
            })
        })
        .collect();
    for lookup in lookups {
        assert_eq!(lookup.join().unwrap(), vec![courier(1, 50)]);
    }

    // Sequential waits would take 8 * 300ms.
    assert!(started.elapsed() < Duration::from_millis(1500));
}

#[test]
fn test_cancelled_lookup_releases_key() {
    let service = Arc::new(CourierService::new(MemoryStore::new()));
    let (cancel_tx, cancel_rx) = bounded(1);

    let lookup = {
        let service = Arc::clone(&service);
        thread::spawn(move || {
            let options =
                LookupOptions::with_grace(Duration::from_secs(30)).cancellable(cancel_rx);
            service.lookup_with(Capacity::from(40), &options)
        })
    };
    while service.registry().stats().live_readers == 0 {
        thread::sleep(Duration::from_millis(1));
    }
    cancel_tx.send(()).unwrap();

    assert!(lookup.join().unwrap().is_err());
    assert_eq!(service.registry().stats().live_readers, 0);
}

#[test]
fn test_many_writers_many_readers() {
    let registry = Arc::new(CourierRegistry::new());
    let notifier = WriterNotifier::new(Arc::clone(&registry));
    let tokens: Vec<_> = (0..10u32)
        .map(|t| registry.register(Capacity::from(t * 10)))
        .collect();

    let writers: Vec<_> = (0..4u64)
        .map(|w| {
            let notifier = notifier.clone();
            thread::spawn(move || {
                for i in 0..50u64 {
                    let capacity = ((w * 50 + i) % 100) as u32;
                    notifier.notify_committed(&courier(w * 1000 + i, capacity));
                }
            })
        })
        .collect();
    for writer in writers {
        writer.join().unwrap();
    }

    for token in tokens {
        let required = *token.key();
        let matches = registry.deregister(token);
        assert!(matches.iter().all(|c| c.can_carry(required)));
        // 200 writes with capacities spread evenly over 0..100.
        let expected = (0..200u64)
            .filter(|n| Capacity::from((n % 100) as u32).satisfies(required))
            .count();
        assert_eq!(matches.len(), expected);
    }
}

proptest! {
    #[test]
    fn prop_integral_representations_share_key(n in 0u32..1_000_000) {
        let registry: QueryRegistry<Capacity, u32> = QueryRegistry::new();
        let from_int = registry.register(Capacity::from(n));
        let from_float = registry.register(Capacity::new(f64::from(n)).unwrap());
        let from_str = registry.register(format!("{}.0", n).parse().unwrap());
        let from_json = registry.register(Capacity::from_json(&serde_json::json!(n)).unwrap());

        prop_assert_eq!(registry.len(), 1);
        prop_assert_eq!(registry.stats().live_readers, 4);
        for token in [from_int, from_float, from_str, from_json] {
            registry.deregister(token);
        }
    }

    #[test]
    fn prop_no_miss(
        required in 0u32..100,
        before in proptest::collection::vec(0u32..100, 0..10),
        during in proptest::collection::vec(0u32..100, 0..10),
    ) {
        let registry = Arc::new(CourierRegistry::new());
        let notifier = WriterNotifier::new(Arc::clone(&registry));
        let required = Capacity::from(required);

        for (i, capacity) in before.iter().enumerate() {
            notifier.notify_committed(&courier(i as u64, *capacity));
        }

        let token = registry.register(required);
        let mut expected = Vec::new();
        for (i, capacity) in during.iter().enumerate() {
            let c = courier(1000 + i as u64, *capacity);
            notifier.notify_committed(&c);
            if c.can_carry(required) {
                expected.push(c);
            }
        }

        // Writes before registration never leak in; every satisfying write during it does.
        prop_assert_eq!(registry.deregister(token), expected);
        prop_assert_eq!(registry.stats().pending_matches, 0);
    }
}
