//! Outstanding-query registry.
//!
//! A lookup's round trip to the store takes an unpredictable amount of time.
//! A write that commits after the store took its snapshot, but before the
//! lookup answers, would otherwise be missed. The registry closes that gap:
//!
//! - Lookups register under their predicate key *before* querying the store
//! - Writes publish each committed record to every key it satisfies
//! - Lookups deregister after their grace window and append what arrived
//!
//! # Example
//!
//! ```
//! use courier_registry::QueryRegistry;
//!
//! let registry: QueryRegistry<u32, &str> = QueryRegistry::new();
//! let token = registry.register(40);
//!
//! // A write for a courier with capacity 50 commits meanwhile.
//! registry.publish(&"courier-50", |required| *required <= 50);
//!
//! assert_eq!(registry.deregister(token), vec!["courier-50"]);
//! ```

mod buffer;
mod manager;
mod types;

pub use manager::QueryRegistry;
pub use types::{BufferStats, LookupId, LookupToken, RegistryConfig, RegistryStats};
