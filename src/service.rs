//! Courier service tying the store, registry and notifier together.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::Result;
use crate::notifier::{CourierRegistry, WriterNotifier};
use crate::registry::RegistryConfig;
use crate::session::{LookupOptions, LookupOutcome, ReaderSession};
use crate::store::CourierStore;
use crate::types::{Capacity, Courier, CourierId};

/// Service configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Grace window for lookups that don't specify one.
    /// Default: zero
    #[serde(rename = "default_grace_ms", with = "duration_ms")]
    pub default_grace: Duration,

    /// Registry configuration.
    pub registry: RegistryConfig,
}

impl ServiceConfig {
    /// Parse a configuration from JSON, e.g.
    /// `{"default_grace_ms": 250, "registry": {"max_pending_matches": 1000}}`.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

/// Courier operations with lookups that catch racing writes.
///
/// Cheap to share behind an `Arc` across request handlers: the store
/// handles its own locking and the registry is the only shared state here.
pub struct CourierService<S> {
    store: S,
    registry: Arc<CourierRegistry>,
    notifier: WriterNotifier,
    config: ServiceConfig,
}

impl<S: CourierStore> CourierService<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, ServiceConfig::default())
    }

    pub fn with_config(store: S, config: ServiceConfig) -> Self {
        let registry = Arc::new(CourierRegistry::with_config(config.registry.clone()));
        let notifier = WriterNotifier::new(Arc::clone(&registry));
        info!(
            default_grace_ms = config.default_grace.as_millis() as u64,
            max_pending_matches = ?config.registry.max_pending_matches,
            "courier service ready"
        );
        Self {
            store,
            registry,
            notifier,
            config,
        }
    }

    // --- Writes ---

    /// Register a new courier and publish it to outstanding lookups.
    pub fn register_courier(&self, id: CourierId, max_capacity: Capacity) -> Result<Courier> {
        let courier = self.store.insert(Courier::new(id, max_capacity))?;
        self.notifier.notify_committed(&courier);
        debug!(courier = %id, %max_capacity, "registered courier");
        Ok(courier)
    }

    /// Change a courier's capacity and publish the new state.
    pub fn update_courier(&self, id: CourierId, max_capacity: Capacity) -> Result<Courier> {
        let courier = self.store.update(id, max_capacity)?;
        self.notifier.notify_committed(&courier);
        debug!(courier = %id, %max_capacity, "updated courier");
        Ok(courier)
    }

    /// Remove a courier.
    ///
    /// Removals are not published. A lookup in flight may still return the
    /// courier if it was published before the removal.
    pub fn remove_courier(&self, id: CourierId) -> Result<Courier> {
        let courier = self.store.delete(id)?;
        debug!(courier = %id, "removed courier");
        Ok(courier)
    }

    pub fn get_courier(&self, id: CourierId) -> Result<Option<Courier>> {
        self.store.get(id)
    }

    // --- Lookups ---

    /// Find couriers able to carry `required`, using the configured grace
    /// window.
    pub fn lookup(&self, required: Capacity) -> Result<Vec<Courier>> {
        let options = LookupOptions::with_grace(self.config.default_grace);
        Ok(self.lookup_with(required, &options)?.into_records())
    }

    /// Find couriers able to carry `required` with explicit options.
    pub fn lookup_with(
        &self,
        required: Capacity,
        options: &LookupOptions,
    ) -> Result<LookupOutcome<Courier>> {
        ReaderSession::run(&*self.registry, required, options, |key| {
            self.store.find_matching(*key)
        })
    }

    /// Lookup from a raw request value such as `40`, `40.0` or `"40"`.
    ///
    /// The value is normalized before the registry is touched, so an invalid
    /// one leaves it unchanged. `grace` overrides the configured window.
    pub fn lookup_json(
        &self,
        capacity_required: &serde_json::Value,
        grace: Option<Duration>,
    ) -> Result<Vec<Courier>> {
        let required = Capacity::from_json(capacity_required)?;
        let options = LookupOptions::with_grace(grace.unwrap_or(self.config.default_grace));
        Ok(self.lookup_with(required, &options)?.into_records())
    }

    // --- Accessors ---

    pub fn registry(&self) -> &Arc<CourierRegistry> {
        &self.registry
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }
}
