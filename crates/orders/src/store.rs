//! Order persistence.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use ticketflow_core::BookingId;

use crate::order::Order;

/// What `insert_new` found when it looked for the natural key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// An order for this booking token already exists (a redelivery).
    AlreadyExists,
}

/// Order store error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OrderStoreError {
    #[error("order not found for booking {0}")]
    NotFound(BookingId),
    #[error("storage error: {0}")]
    Storage(String),
}

/// Order that exhausted its retry budget, parked for manual review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadLetterEntry {
    pub order: Order,
    pub reason: String,
    pub dead_lettered_at: DateTime<Utc>,
}

impl DeadLetterEntry {
    pub fn new(order: Order, reason: impl Into<String>) -> Self {
        Self {
            order,
            reason: reason.into(),
            dead_lettered_at: Utc::now(),
        }
    }
}

/// Order persistence contract.
///
/// `insert_new` is the idempotency anchor of the whole pipeline: it must be
/// atomic on the booking token, independent of whatever delivery guarantee
/// the channel provides. Everything downstream leans on that.
pub trait OrderStore: Send + Sync {
    /// Insert iff no order with the same booking id exists (atomic
    /// check-and-insert).
    fn insert_new(&self, order: Order) -> Result<InsertOutcome, OrderStoreError>;

    /// Persist a status change for an existing order.
    fn update(&self, order: &Order) -> Result<(), OrderStoreError>;

    fn get_by_booking_id(&self, booking_id: BookingId) -> Result<Option<Order>, OrderStoreError>;

    fn list(&self) -> Result<Vec<Order>, OrderStoreError>;

    /// Park an order on the dead-letter path for operator review.
    fn dead_letter(&self, entry: DeadLetterEntry) -> Result<(), OrderStoreError>;

    fn list_dead_letters(&self) -> Result<Vec<DeadLetterEntry>, OrderStoreError>;
}

impl<S> OrderStore for Arc<S>
where
    S: OrderStore + ?Sized,
{
    fn insert_new(&self, order: Order) -> Result<InsertOutcome, OrderStoreError> {
        (**self).insert_new(order)
    }

    fn update(&self, order: &Order) -> Result<(), OrderStoreError> {
        (**self).update(order)
    }

    fn get_by_booking_id(&self, booking_id: BookingId) -> Result<Option<Order>, OrderStoreError> {
        (**self).get_by_booking_id(booking_id)
    }

    fn list(&self) -> Result<Vec<Order>, OrderStoreError> {
        (**self).list()
    }

    fn dead_letter(&self, entry: DeadLetterEntry) -> Result<(), OrderStoreError> {
        (**self).dead_letter(entry)
    }

    fn list_dead_letters(&self) -> Result<Vec<DeadLetterEntry>, OrderStoreError> {
        (**self).list_dead_letters()
    }
}

/// In-memory order store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
    orders: RwLock<HashMap<BookingId, Order>>,
    dead_letters: RwLock<Vec<DeadLetterEntry>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> OrderStoreError {
        OrderStoreError::Storage("order store poisoned".into())
    }
}

impl OrderStore for InMemoryOrderStore {
    fn insert_new(&self, order: Order) -> Result<InsertOutcome, OrderStoreError> {
        let mut map = self.orders.write().map_err(|_| Self::poisoned())?;
        match map.entry(order.booking_id()) {
            std::collections::hash_map::Entry::Occupied(_) => Ok(InsertOutcome::AlreadyExists),
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(order);
                Ok(InsertOutcome::Inserted)
            }
        }
    }

    fn update(&self, order: &Order) -> Result<(), OrderStoreError> {
        let mut map = self.orders.write().map_err(|_| Self::poisoned())?;
        match map.get_mut(&order.booking_id()) {
            Some(stored) => {
                *stored = order.clone();
                Ok(())
            }
            None => Err(OrderStoreError::NotFound(order.booking_id())),
        }
    }

    fn get_by_booking_id(&self, booking_id: BookingId) -> Result<Option<Order>, OrderStoreError> {
        let map = self.orders.read().map_err(|_| Self::poisoned())?;
        Ok(map.get(&booking_id).cloned())
    }

    fn list(&self) -> Result<Vec<Order>, OrderStoreError> {
        let map = self.orders.read().map_err(|_| Self::poisoned())?;
        Ok(map.values().cloned().collect())
    }

    fn dead_letter(&self, entry: DeadLetterEntry) -> Result<(), OrderStoreError> {
        let mut entries = self.dead_letters.write().map_err(|_| Self::poisoned())?;
        entries.push(entry);
        Ok(())
    }

    fn list_dead_letters(&self) -> Result<Vec<DeadLetterEntry>, OrderStoreError> {
        let entries = self.dead_letters.read().map_err(|_| Self::poisoned())?;
        Ok(entries.clone())
    }
}
