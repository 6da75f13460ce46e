//! Reader sessions: the register, query, wait, drain lifecycle of one lookup.

use crossbeam_channel::{after, select, Receiver};
use std::fmt::Debug;
use std::hash::Hash;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::error::{RegistryError, Result};
use crate::registry::{LookupToken, QueryRegistry};

/// Per-lookup options.
#[derive(Clone, Debug, Default)]
pub struct LookupOptions {
    /// How long to wait for racing writes after the snapshot query.
    /// Default: zero (answer immediately)
    pub grace: Duration,

    /// Signal that aborts the grace window early.
    pub cancel: Option<Receiver<()>>,
}

impl LookupOptions {
    pub fn with_grace(grace: Duration) -> Self {
        Self {
            grace,
            cancel: None,
        }
    }

    pub fn cancellable(mut self, cancel: Receiver<()>) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

/// Result of a lookup.
#[derive(Clone, Debug, PartialEq)]
pub struct LookupOutcome<R> {
    /// Snapshot results followed by late matches.
    pub records: Vec<R>,
    /// How many of `records` came from the snapshot query.
    pub base_count: usize,
    /// How many were appended from the match buffer.
    pub late_count: usize,
}

impl<R> LookupOutcome<R> {
    pub fn into_records(self) -> Vec<R> {
        self.records
    }

    /// Records that arrived during the grace window.
    pub fn late_matches(&self) -> &[R] {
        &self.records[self.base_count..]
    }
}

/// One registration with a query registry.
///
/// Deregisters on drop if not finished explicitly, so a failed or panicking
/// snapshot query never leaks a live reader.
pub struct ReaderSession<'a, K, R>
where
    K: Eq + Hash + Clone + Debug,
    R: Clone,
{
    registry: &'a QueryRegistry<K, R>,
    token: Option<LookupToken<K>>,
}

impl<'a, K, R> ReaderSession<'a, K, R>
where
    K: Eq + Hash + Clone + Debug,
    R: Clone,
{
    /// Register under `key`. Must happen before the snapshot query.
    pub fn begin(registry: &'a QueryRegistry<K, R>, key: K) -> Self {
        let token = registry.register(key);
        Self {
            registry,
            token: Some(token),
        }
    }

    pub fn key(&self) -> Option<&K> {
        self.token.as_ref().map(LookupToken::key)
    }

    /// Deregister and return the late matches.
    pub fn finish(mut self) -> Vec<R> {
        self.release()
    }

    fn release(&mut self) -> Vec<R> {
        match self.token.take() {
            Some(token) => self.registry.deregister(token),
            None => Vec::new(),
        }
    }

    /// Run a complete lookup.
    ///
    /// `snapshot` queries the store. Its error is returned unchanged after
    /// the registration is released. The grace wait suspends only the calling
    /// thread.
    pub fn run<F>(
        registry: &'a QueryRegistry<K, R>,
        key: K,
        options: &LookupOptions,
        snapshot: F,
    ) -> Result<LookupOutcome<R>>
    where
        F: FnOnce(&K) -> Result<Vec<R>>,
    {
        let session = Self::begin(registry, key.clone());

        let mut records = snapshot(&key)?;
        let base_count = records.len();

        if let Err(e) = wait_grace(options) {
            let discarded = session.finish();
            warn!(?key, discarded = discarded.len(), "lookup cancelled during grace window");
            return Err(e);
        }

        let late = session.finish();
        let late_count = late.len();
        records.extend(late);

        debug!(?key, base_count, late_count, "lookup complete");

        Ok(LookupOutcome {
            records,
            base_count,
            late_count,
        })
    }
}

impl<K, R> Drop for ReaderSession<'_, K, R>
where
    K: Eq + Hash + Clone + Debug,
    R: Clone,
{
    fn drop(&mut self) {
        self.release();
    }
}

/// Sleep for the grace window, or until cancelled.
fn wait_grace(options: &LookupOptions) -> Result<()> {
    if options.grace.is_zero() {
        return Ok(());
    }

    let cancel = match &options.cancel {
        Some(cancel) => cancel,
        None => {
            thread::sleep(options.grace);
            return Ok(());
        }
    };

    let deadline = Instant::now() + options.grace;
    let timeout = after(options.grace);
    select! {
        recv(cancel) -> msg => match msg {
            Ok(()) => Err(RegistryError::LookupCancelled),
            // Sender gone: nobody can cancel any more, finish the window.
            Err(_) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                thread::sleep(remaining);
                Ok(())
            }
        },
        recv(timeout) -> _ => Ok(()),
    }
}
