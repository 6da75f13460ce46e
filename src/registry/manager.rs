//! Registry of outstanding lookups keyed by predicate.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace, warn};

use super::buffer::MatchBuffer;
use super::types::{BufferStats, LookupId, LookupToken, RegistryConfig, RegistryStats};

/// Tracks in-flight lookups and collects writes that race them.
///
/// Every operation is a short critical section on a single lock. Nothing
/// here performs I/O, so the lock is never held across a store query or a
/// grace window.
pub struct QueryRegistry<K, R> {
    /// Match buffers by predicate key. Keys are never removed.
    buffers: Mutex<HashMap<K, MatchBuffer<R>>>,
    /// Counter for generating lookup IDs.
    next_id: AtomicU64,
    config: RegistryConfig,
}

impl<K, R> QueryRegistry<K, R>
where
    K: Eq + Hash + Clone + Debug,
    R: Clone,
{
    /// Create an unbounded registry.
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            buffers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            config,
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Register a lookup under `key`.
    ///
    /// Creating the buffer and counting the reader happen in one critical
    /// section, so a publish either lands before both or after both.
    pub fn register(&self, key: K) -> LookupToken<K> {
        let id = LookupId(self.next_id.fetch_add(1, Ordering::SeqCst));

        let mut buffers = self.buffers.lock();
        let buffer = buffers.entry(key.clone()).or_insert_with(MatchBuffer::new);
        let stale = buffer.attach();
        let live_readers = buffer.live_readers();
        drop(buffers);

        debug!(lookup = %id, ?key, live_readers, stale, "registered lookup");

        LookupToken { id, key }
    }

    /// Release a registration and return the matches pending for its key.
    ///
    /// Every reader gets all pending matches, not only the ones published
    /// after it registered. The list is cleared when the last reader leaves.
    ///
    /// # Panics
    ///
    /// Panics if the token's key has no live reader, which can only happen
    /// when a token from another registry is passed in.
    pub fn deregister(&self, token: LookupToken<K>) -> Vec<R> {
        let LookupToken { id, key } = token;

        let mut buffers = self.buffers.lock();
        let buffer = match buffers.get_mut(&key) {
            Some(buffer) => buffer,
            None => panic!("registration leak: {} deregistered unknown key {:?}", id, key),
        };
        let matches = buffer.detach();
        let live_readers = buffer.live_readers();
        drop(buffers);

        debug!(
            lookup = %id,
            ?key,
            live_readers,
            late_matches = matches.len(),
            "deregistered lookup"
        );

        matches
    }

    /// Append `record` to every key that `satisfied` accepts.
    ///
    /// Buffers with no live reader still receive the record. Returns the
    /// number of buffers it was appended to.
    pub fn publish<F>(&self, record: &R, satisfied: F) -> usize
    where
        F: Fn(&K) -> bool,
    {
        let cap = self.config.max_pending_matches;
        let mut delivered = 0;

        let mut buffers = self.buffers.lock();
        for (key, buffer) in buffers.iter_mut() {
            if !satisfied(key) {
                continue;
            }
            if buffer.push(record.clone(), cap) {
                warn!(
                    ?key,
                    live_readers = buffer.live_readers(),
                    cap = ?cap,
                    "match buffer full, evicted oldest pending match"
                );
            }
            delivered += 1;
        }
        drop(buffers);

        trace!(delivered, "published record");
        delivered
    }

    /// Keys currently known to the registry.
    pub fn keys(&self) -> Vec<K> {
        self.buffers.lock().keys().cloned().collect()
    }

    /// Number of keys ever registered.
    pub fn len(&self) -> usize {
        self.buffers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.lock().is_empty()
    }

    /// Stats for a single key, if it has ever been registered.
    pub fn buffer_stats(&self, key: &K) -> Option<BufferStats> {
        self.buffers.lock().get(key).map(MatchBuffer::stats)
    }

    /// Totals across every key.
    pub fn stats(&self) -> RegistryStats {
        let buffers = self.buffers.lock();
        buffers.values().fold(
            RegistryStats {
                keys: buffers.len(),
                ..Default::default()
            },
            |mut acc, buffer| {
                acc.live_readers += buffer.live_readers();
                acc.pending_matches += buffer.pending_len();
                acc.evicted += buffer.stats().evicted;
                acc
            },
        )
    }
}

impl<K, R> Default for QueryRegistry<K, R>
where
    K: Eq + Hash + Clone + Debug,
    R: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
