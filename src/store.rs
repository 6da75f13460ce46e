//! Courier storage.
//!
//! [`CourierStore`] is the seam to whatever persists couriers. The registry
//! only needs a snapshot query and confirmed writes from it. [`MemoryStore`]
//! is an in-process implementation for tests and embedding.

use parking_lot::RwLock;
use std::collections::BTreeMap;

use crate::error::{RegistryError, Result};
use crate::types::{Capacity, Courier, CourierId};

/// Persistent store of couriers.
///
/// A write method returning `Ok` means the write is committed and visible to
/// subsequent `find_matching` calls.
pub trait CourierStore: Send + Sync {
    /// Couriers whose capacity is at least `required`, ordered by id.
    fn find_matching(&self, required: Capacity) -> Result<Vec<Courier>>;

    fn get(&self, id: CourierId) -> Result<Option<Courier>>;

    /// Insert a new courier. Fails with `CourierExists` on a duplicate id.
    fn insert(&self, courier: Courier) -> Result<Courier>;

    /// Change a courier's capacity. Fails with `CourierNotFound`.
    fn update(&self, id: CourierId, max_capacity: Capacity) -> Result<Courier>;

    /// Remove a courier, returning it. Fails with `CourierNotFound`.
    fn delete(&self, id: CourierId) -> Result<Courier>;
}

/// In-memory courier store.
#[derive(Default)]
pub struct MemoryStore {
    couriers: RwLock<BTreeMap<CourierId, Courier>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `couriers`. Later duplicates win.
    pub fn with_couriers(couriers: impl IntoIterator<Item = Courier>) -> Self {
        let map = couriers.into_iter().map(|c| (c.id, c)).collect();
        Self {
            couriers: RwLock::new(map),
        }
    }

    pub fn len(&self) -> usize {
        self.couriers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.couriers.read().is_empty()
    }
}

impl CourierStore for MemoryStore {
    fn find_matching(&self, required: Capacity) -> Result<Vec<Courier>> {
        Ok(self
            .couriers
            .read()
            .values()
            .filter(|c| c.can_carry(required))
            .copied()
            .collect())
    }

    fn get(&self, id: CourierId) -> Result<Option<Courier>> {
        Ok(self.couriers.read().get(&id).copied())
    }

    fn insert(&self, courier: Courier) -> Result<Courier> {
        let mut couriers = self.couriers.write();
        if couriers.contains_key(&courier.id) {
            return Err(RegistryError::CourierExists(courier.id));
        }
        couriers.insert(courier.id, courier);
        Ok(courier)
    }

    fn update(&self, id: CourierId, max_capacity: Capacity) -> Result<Courier> {
        let mut couriers = self.couriers.write();
        let courier = couriers
            .get_mut(&id)
            .ok_or(RegistryError::CourierNotFound(id))?;
        courier.max_capacity = max_capacity;
        Ok(*courier)
    }

    fn delete(&self, id: CourierId) -> Result<Courier> {
        self.couriers
            .write()
            .remove(&id)
            .ok_or(RegistryError::CourierNotFound(id))
    }
}
