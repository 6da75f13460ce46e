//! Per-key staging area for matches that arrive while lookups are in flight.

use std::collections::VecDeque;

use super::types::BufferStats;

/// Match buffer for a single predicate key.
///
/// Only ever touched under the registry lock.
#[derive(Debug)]
pub(crate) struct MatchBuffer<R> {
    /// Lookups currently registered under this key.
    live_readers: usize,
    /// Records published since the earliest still-live lookup registered.
    pending: VecDeque<R>,
    /// Matches dropped because the buffer hit its cap.
    evicted: u64,
    /// Records ever appended to this buffer.
    published: u64,
}

impl<R: Clone> MatchBuffer<R> {
    pub(crate) fn new() -> Self {
        Self {
            live_readers: 0,
            pending: VecDeque::new(),
            evicted: 0,
            published: 0,
        }
    }

    /// Add a reader. Returns the number of stale matches discarded, which is
    /// non-zero only when the buffer had no live readers and something was
    /// published in the meantime.
    pub(crate) fn attach(&mut self) -> usize {
        let stale = if self.live_readers == 0 {
            let stale = self.pending.len();
            self.pending.clear();
            stale
        } else {
            0
        };
        self.live_readers += 1;
        stale
    }

    /// Remove a reader and hand back everything pending.
    ///
    /// The list is cleared once the last reader leaves.
    ///
    /// # Panics
    ///
    /// Panics if no reader is attached: a deregistration without a matching
    /// registration means the caller broke the token contract.
    pub(crate) fn detach(&mut self) -> Vec<R> {
        assert!(
            self.live_readers > 0,
            "registration leak: deregister on a match buffer with no live readers"
        );
        self.live_readers -= 1;

        if self.live_readers == 0 {
            self.pending.drain(..).collect()
        } else {
            self.pending.iter().cloned().collect()
        }
    }

    /// Append a record. Returns true if the oldest pending match had to be
    /// evicted to stay within `cap`.
    pub(crate) fn push(&mut self, record: R, cap: Option<usize>) -> bool {
        self.published += 1;
        self.pending.push_back(record);

        match cap {
            Some(cap) if self.pending.len() > cap => {
                self.pending.pop_front();
                self.evicted += 1;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn live_readers(&self) -> usize {
        self.live_readers
    }

    pub(crate) fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub(crate) fn stats(&self) -> BufferStats {
        BufferStats {
            live_readers: self.live_readers,
            pending_matches: self.pending.len(),
            published: self.published,
            evicted: self.evicted,
        }
    }
}
