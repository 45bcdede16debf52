use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use ticketflow_core::{BookingId, CustomerId, DomainError, EventId, Money};
use ticketflow_customers::{CustomerDirectory, DirectoryError};
use ticketflow_events::{ChannelError, EventChannel};
use ticketflow_inventory::{InventoryError, InventoryGateway};

use crate::event::BookingRecorded;

/// A request to reserve tickets. Transient; validated once, on construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingRequest {
    user_id: CustomerId,
    event_id: EventId,
    ticket_count: u32,
}

impl BookingRequest {
    pub fn new(user_id: CustomerId, event_id: EventId, ticket_count: u32) -> Result<Self, DomainError> {
        if ticket_count == 0 {
            return Err(DomainError::validation("ticket_count must be positive"));
        }
        Ok(Self {
            user_id,
            event_id,
            ticket_count,
        })
    }

    pub fn user_id(&self) -> &CustomerId {
        &self.user_id
    }

    pub fn event_id(&self) -> &EventId {
        &self.event_id
    }

    pub fn ticket_count(&self) -> u32 {
        self.ticket_count
    }
}

/// Synchronous answer to the booking caller.
///
/// Returned optimistically, before the order is durably reconciled
/// downstream: it signals "booking accepted", not "order fulfilled".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingResponse {
    pub booking_id: BookingId,
    pub user_id: CustomerId,
    pub event_id: EventId,
    pub ticket_count: u32,
    pub total_price: Money,
}

/// Failures surfaced synchronously to the booking caller.
///
/// Validation rejections (`CustomerNotFound`, `InsufficientInventory`) are
/// terminal; the request is simply refused. Infrastructure failures are also
/// surfaced here because nothing durable exists yet: a failed publish leaves
/// no trace to compensate for. Downstream reconciliation failures never
/// appear in this enum; the caller has already been answered by then.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BookingError {
    #[error("customer not found")]
    CustomerNotFound,

    #[error("insufficient inventory: requested {requested}, available {available}")]
    InsufficientInventory { requested: u32, available: u32 },

    #[error("event channel unavailable: {0}")]
    ChannelUnavailable(String),

    #[error("timed out calling {0}")]
    Timeout(&'static str),

    #[error("customer directory failed: {0}")]
    Directory(#[source] DirectoryError),

    #[error("inventory service failed: {0}")]
    Inventory(#[source] InventoryError),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Validates booking requests and hands accepted bookings off to the channel.
///
/// Stateless: every call runs against the collaborators alone, so concurrent
/// `create_booking` calls are safe. That also means two concurrent requests
/// for the same event can both pass the capacity check before either
/// downstream decrement lands. This check-then-act race is accepted and
/// delegated to the inventory collaborator's atomic conditional decrement,
/// rather than pretended away with a lock this side doesn't hold.
#[derive(Debug)]
pub struct BookingCoordinator<D, G, C> {
    directory: D,
    inventory: G,
    channel: C,
}

impl<D, G, C> BookingCoordinator<D, G, C>
where
    D: CustomerDirectory,
    G: InventoryGateway,
    C: EventChannel<BookingRecorded>,
{
    pub fn new(directory: D, inventory: G, channel: C) -> Self {
        Self {
            directory,
            inventory,
            channel,
        }
    }

    /// Validate, price, and record a booking.
    ///
    /// Check order is fixed: customer first, then inventory. Exactly one
    /// publish attempt per call; on publish failure the caller is told the
    /// booking did NOT happen (nothing was persisted, no compensation
    /// needed). Capacity is read point-in-time with no lock held; exact fit
    /// (`ticket_count == capacity`) is accepted.
    pub fn create_booking(
        &self,
        request: &BookingRequest,
    ) -> Result<BookingResponse, BookingError> {
        let customer = self
            .directory
            .find_by_id(request.user_id())
            .map_err(|e| match e {
                DirectoryError::Timeout => BookingError::Timeout("customer directory"),
                e => BookingError::Directory(e),
            })?
            .ok_or(BookingError::CustomerNotFound)?;

        let snapshot = self
            .inventory
            .get_inventory(request.event_id())
            .map_err(|e| match e {
                InventoryError::Timeout => BookingError::Timeout("inventory service"),
                e => BookingError::Inventory(e),
            })?;
        debug!(
            event_id = %snapshot.event_id,
            capacity = snapshot.capacity,
            unit_price = %snapshot.unit_price,
            "inventory snapshot"
        );

        if snapshot.capacity < request.ticket_count() {
            return Err(BookingError::InsufficientInventory {
                requested: request.ticket_count(),
                available: snapshot.capacity,
            });
        }

        let total_price = snapshot.unit_price.checked_mul(request.ticket_count())?;

        let event = BookingRecorded {
            booking_id: BookingId::new(),
            user_id: customer.id_typed().clone(),
            event_id: request.event_id().clone(),
            ticket_count: request.ticket_count(),
            total_price,
            occurred_at: Utc::now(),
        };

        // Partition by event id so downstream decrements for one event stay
        // ordered relative to each other.
        self.channel
            .publish(event.event_id.as_str(), event.clone())
            .map_err(|e| match e {
                ChannelError::Timeout => BookingError::Timeout("event channel"),
                ChannelError::Unavailable(reason) => BookingError::ChannelUnavailable(reason),
            })?;
        info!(
            booking_id = %event.booking_id,
            user_id = %event.user_id,
            event_id = %event.event_id,
            ticket_count = event.ticket_count,
            total_price = %event.total_price,
            "booking recorded"
        );

        Ok(BookingResponse {
            booking_id: event.booking_id,
            user_id: event.user_id,
            event_id: event.event_id,
            ticket_count: event.ticket_count,
            total_price: event.total_price,
        })
    }
}
