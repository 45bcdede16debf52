use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ticketflow_booking::BookingRecorded;
use ticketflow_core::{BookingId, CustomerId, DomainError, DomainResult, Entity, EventId, Money, OrderId};

/// Reconciliation status of an order.
///
/// ```text
/// Created → InventoryUpdatePending → InventoryUpdated        (terminal)
///                                  → InventoryUpdateFailed   (terminal)
/// ```
///
/// The decrement never reorders before persistence: an order reaches
/// `InventoryUpdatePending` in storage before the first gateway call, so a
/// crash in between leaves an operator-visible record instead of a lost
/// intent. `InventoryUpdateFailed` requires manual reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Created,
    InventoryUpdatePending,
    InventoryUpdated,
    InventoryUpdateFailed { reason: String, attempts: u32 },
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::InventoryUpdated | OrderStatus::InventoryUpdateFailed { .. }
        )
    }
}

/// Order derived from exactly one `BookingRecorded` event.
///
/// `booking_id` is the natural dedup key: one order per booking token, no
/// matter how many times the channel redelivers the event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    order_id: OrderId,
    booking_id: BookingId,
    customer_id: CustomerId,
    event_id: EventId,
    ticket_count: u32,
    total_price: Money,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Order {
    /// Build a fresh order from a consumed booking event.
    ///
    /// The price is taken verbatim from the event, never re-fetched, so
    /// the customer pays what they were quoted at booking time.
    pub fn from_event(event: &BookingRecorded) -> Self {
        let now = Utc::now();
        Self {
            order_id: OrderId::new(),
            booking_id: event.booking_id,
            customer_id: event.user_id.clone(),
            event_id: event.event_id.clone(),
            ticket_count: event.ticket_count,
            total_price: event.total_price,
            status: OrderStatus::Created,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    pub fn booking_id(&self) -> BookingId {
        self.booking_id
    }

    pub fn customer_id(&self) -> &CustomerId {
        &self.customer_id
    }

    pub fn event_id(&self) -> &EventId {
        &self.event_id
    }

    pub fn ticket_count(&self) -> u32 {
        self.ticket_count
    }

    pub fn total_price(&self) -> Money {
        self.total_price
    }

    pub fn status(&self) -> &OrderStatus {
        &self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// The order is persisted; the inventory decrement is about to start.
    pub fn mark_inventory_update_pending(&mut self) -> DomainResult<()> {
        if self.status != OrderStatus::Created {
            return Err(self.illegal_transition("inventory_update_pending"));
        }
        self.transition(OrderStatus::InventoryUpdatePending);
        Ok(())
    }

    /// The decrement landed; the order is fully reconciled.
    pub fn mark_inventory_updated(&mut self) -> DomainResult<()> {
        if self.status != OrderStatus::InventoryUpdatePending {
            return Err(self.illegal_transition("inventory_updated"));
        }
        self.transition(OrderStatus::InventoryUpdated);
        Ok(())
    }

    /// The retry budget is spent; the order needs manual reconciliation.
    pub fn mark_inventory_update_failed(
        &mut self,
        reason: impl Into<String>,
        attempts: u32,
    ) -> DomainResult<()> {
        if self.status != OrderStatus::InventoryUpdatePending {
            return Err(self.illegal_transition("inventory_update_failed"));
        }
        self.transition(OrderStatus::InventoryUpdateFailed {
            reason: reason.into(),
            attempts,
        });
        Ok(())
    }

    fn transition(&mut self, status: OrderStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }

    fn illegal_transition(&self, target: &str) -> DomainError {
        DomainError::invariant(format!(
            "illegal order transition from {:?} to {target}",
            self.status
        ))
    }
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.order_id
    }
}
