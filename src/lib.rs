//! # Courier Registry
//!
//! Capacity lookups over a courier store that don't miss writes racing the
//! store query.
//!
//! ## Core Concepts
//!
//! - **Query registry**: predicate-keyed match buffers with live-reader counts
//! - **Reader session**: register, snapshot query, grace window, drain
//! - **Writer notifier**: publishes each committed courier to satisfied keys
//! - **Courier store**: the persistence seam, with an in-memory implementation
//!
//! ## Example
//!
//! ```
//! use courier_registry::{Capacity, CourierId, CourierService, MemoryStore};
//!
//! let service = CourierService::new(MemoryStore::new());
//! service.register_courier(CourierId(1234), Capacity::from(45))?;
//!
//! let couriers = service.lookup(Capacity::from(40))?;
//! assert_eq!(couriers.len(), 1);
//! # Ok::<(), courier_registry::RegistryError>(())
//! ```

pub mod error;
pub mod notifier;
pub mod registry;
pub mod service;
pub mod session;
pub mod store;
pub mod types;

// Re-exports
pub use error::{RegistryError, Result};
pub use notifier::{CourierRegistry, WriterNotifier};
pub use registry::{
    BufferStats, LookupId, LookupToken, QueryRegistry, RegistryConfig, RegistryStats,
};
pub use service::{CourierService, ServiceConfig};
pub use session::{LookupOptions, LookupOutcome, ReaderSession};
pub use store::{CourierStore, MemoryStore};
pub use types::*;
