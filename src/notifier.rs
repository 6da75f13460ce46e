//! Writer notifier: broadcasts committed couriers to outstanding lookups.

use std::sync::Arc;
use tracing::trace;

use crate::registry::QueryRegistry;
use crate::types::{Capacity, Courier};

/// Registry of capacity lookups awaiting late couriers.
pub type CourierRegistry = QueryRegistry<Capacity, Courier>;

/// Publishes committed writes to every lookup whose threshold they meet.
///
/// Call only after the store has confirmed the write. Publishing takes the
/// registry lock briefly and never waits on a reader's grace window.
#[derive(Clone)]
pub struct WriterNotifier {
    registry: Arc<CourierRegistry>,
}

impl WriterNotifier {
    pub fn new(registry: Arc<CourierRegistry>) -> Self {
        Self { registry }
    }

    /// Publish a committed courier. Returns the number of lookup keys it
    /// satisfied.
    pub fn notify_committed(&self, courier: &Courier) -> usize {
        let delivered = self
            .registry
            .publish(courier, |required| courier.can_carry(*required));

        trace!(
            courier = %courier.id,
            max_capacity = %courier.max_capacity,
            delivered,
            "notified outstanding lookups"
        );
        delivered
    }

    pub fn registry(&self) -> &Arc<CourierRegistry> {
        &self.registry
    }
}
