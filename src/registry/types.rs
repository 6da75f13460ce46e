//! Types shared by the registry and its callers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Configuration for a query registry.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Max pending matches per key before the oldest is evicted.
    /// Default: None (unbounded)
    pub max_pending_matches: Option<usize>,
}

/// Unique identifier for a registered lookup.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LookupId(pub u64);

impl fmt::Debug for LookupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LookupId({})", self.0)
    }
}

impl fmt::Display for LookupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lookup-{}", self.0)
    }
}

/// Proof of registration, consumed by `QueryRegistry::deregister`.
///
/// Not `Clone`: one registration can only be released once.
#[must_use = "a registered lookup must be deregistered or its key leaks a live reader"]
#[derive(Debug)]
pub struct LookupToken<K> {
    pub(crate) id: LookupId,
    pub(crate) key: K,
}

impl<K> LookupToken<K> {
    pub fn id(&self) -> LookupId {
        self.id
    }

    pub fn key(&self) -> &K {
        &self.key
    }
}

/// Point-in-time view of one match buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BufferStats {
    pub live_readers: usize,
    pub pending_matches: usize,
    /// Records appended since the key was first registered.
    pub published: u64,
    /// Matches dropped to respect `max_pending_matches`.
    pub evicted: u64,
}

/// Aggregate view of the whole registry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RegistryStats {
    /// Keys ever registered (keys are never removed).
    pub keys: usize,
    pub live_readers: usize,
    pub pending_matches: usize,
    pub evicted: u64,
}
