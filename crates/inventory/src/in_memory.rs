//! In-memory inventory service for tests/dev.

use std::collections::HashMap;
use std::sync::RwLock;

use tracing::debug;

use ticketflow_core::{EventId, Money};

use crate::gateway::{InventoryError, InventoryGateway, InventorySnapshot};

#[derive(Debug, Clone)]
struct EventInventory {
    capacity: u32,
    unit_price: Money,
}

/// In-memory inventory with atomic conditional decrement.
///
/// The whole map sits behind one `RwLock`, so check-and-decrement happens
/// under the write lock, the same atomicity the real collaborator is
/// assumed to provide.
#[derive(Debug, Default)]
pub struct InMemoryInventoryService {
    inner: RwLock<HashMap<EventId, EventInventory>>,
}

impl InMemoryInventoryService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed capacity and unit price for one event.
    pub fn with_event(self, event_id: EventId, capacity: u32, unit_price: Money) -> Self {
        if let Ok(mut map) = self.inner.write() {
            map.insert(
                event_id,
                EventInventory {
                    capacity,
                    unit_price,
                },
            );
        }
        self
    }

    fn poisoned() -> InventoryError {
        InventoryError::Unavailable("inventory store poisoned".into())
    }
}

impl InventoryGateway for InMemoryInventoryService {
    fn get_inventory(&self, event_id: &EventId) -> Result<InventorySnapshot, InventoryError> {
        let map = self.inner.read().map_err(|_| Self::poisoned())?;
        let record = map.get(event_id).ok_or(InventoryError::NotFound)?;
        Ok(InventorySnapshot {
            event_id: event_id.clone(),
            capacity: record.capacity,
            unit_price: record.unit_price,
        })
    }

    fn update_inventory(
        &self,
        event_id: &EventId,
        ticket_count: u32,
    ) -> Result<(), InventoryError> {
        let mut map = self.inner.write().map_err(|_| Self::poisoned())?;
        let record = map.get_mut(event_id).ok_or(InventoryError::NotFound)?;

        if record.capacity < ticket_count {
            return Err(InventoryError::InsufficientCapacity {
                requested: ticket_count,
                available: record.capacity,
            });
        }

        record.capacity -= ticket_count;
        debug!(event_id = %event_id, sold = ticket_count, remaining = record.capacity, "inventory decremented");
        Ok(())
    }
}
