use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use ticketflow_core::{EventId, Money};

/// Point-in-time view of one ticketed event's inventory.
///
/// Read-mutate-read through the gateway only; holding a snapshot confers no
/// lock, and capacity may have changed by the time the holder acts on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventorySnapshot {
    pub event_id: EventId,
    pub capacity: u32,
    pub unit_price: Money,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InventoryError {
    /// The inventory service knows nothing about this event.
    #[error("unknown event")]
    NotFound,

    /// A decrement would take capacity below zero.
    #[error("insufficient capacity: requested {requested}, available {available}")]
    InsufficientCapacity { requested: u32, available: u32 },

    #[error("inventory service unavailable: {0}")]
    Unavailable(String),

    #[error("inventory call timed out")]
    Timeout,
}

/// Synchronous inventory query/update contract.
///
/// `update_inventory` is "decrement by N if at least N remain", and the
/// collaborator guarantees that check-and-decrement is atomic on its side;
/// this system performs no distributed locking of its own. A failed call
/// means no decrement happened, so retrying after a failure is safe.
pub trait InventoryGateway: Send + Sync {
    fn get_inventory(&self, event_id: &EventId) -> Result<InventorySnapshot, InventoryError>;

    fn update_inventory(&self, event_id: &EventId, ticket_count: u32)
    -> Result<(), InventoryError>;
}

impl<G> InventoryGateway for Arc<G>
where
    G: InventoryGateway + ?Sized,
{
    fn get_inventory(&self, event_id: &EventId) -> Result<InventorySnapshot, InventoryError> {
        (**self).get_inventory(event_id)
    }

    fn update_inventory(
        &self,
        event_id: &EventId,
        ticket_count: u32,
    ) -> Result<(), InventoryError> {
        (**self).update_inventory(event_id, ticket_count)
    }
}
