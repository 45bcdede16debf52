use std::thread;

use thiserror::Error;
use tracing::{error, info, warn};

use ticketflow_booking::BookingRecorded;
use ticketflow_core::DomainError;
use ticketflow_events::EventEnvelope;
use ticketflow_inventory::InventoryGateway;

use crate::order::{Order, OrderStatus};
use crate::retry::RetryPolicy;
use crate::store::{DeadLetterEntry, InsertOutcome, OrderStore, OrderStoreError};

/// How one delivery was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Order persisted and inventory decremented.
    Completed,
    /// A terminal order for this booking token already existed; redelivery
    /// acknowledged without touching inventory again.
    Duplicate,
    /// Retry budget spent; order parked terminal on the dead-letter path.
    DeadLettered,
}

/// Failures the reconciler cannot resolve by itself.
///
/// These never reach the original booking caller; that caller was answered
/// long ago. An `Err` here means the delivery was not acknowledged, so the
/// channel will redeliver it; the idempotent insert makes that safe.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("order persistence failed: {0}")]
    Persistence(#[from] OrderStoreError),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Consumes `BookingRecorded` events and reconciles them into orders.
///
/// Per delivery: dedup on the booking token, persist the order, then
/// decrement inventory, in that exact sequence. Persistence comes first so
/// that a crash after the order is written but before the decrement lands
/// leaves an `InventoryUpdatePending` record, never a silently lost booking.
/// A redelivery that finds such a non-terminal order resumes the decrement
/// instead of no-op'ing, so the written intent is eventually reconciled;
/// only terminal orders make a redelivery a pure duplicate.
#[derive(Debug)]
pub struct OrderReconciler<S, G> {
    store: S,
    inventory: G,
    retry: RetryPolicy,
}

impl<S, G> OrderReconciler<S, G>
where
    S: OrderStore,
    G: InventoryGateway,
{
    pub fn new(store: S, inventory: G) -> Self {
        Self {
            store,
            inventory,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Handle one delivered (possibly redelivered) booking event.
    pub fn handle_event(
        &self,
        envelope: &EventEnvelope<BookingRecorded>,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        let event = envelope.payload();
        info!(
            message_id = %envelope.message_id(),
            booking_id = %event.booking_id,
            event_id = %event.event_id,
            ticket_count = event.ticket_count,
            "booking event received"
        );

        let mut order = Order::from_event(event);
        if self.store.insert_new(order.clone())? == InsertOutcome::AlreadyExists {
            let stored = self
                .store
                .get_by_booking_id(event.booking_id)?
                .ok_or(OrderStoreError::NotFound(event.booking_id))?;
            if stored.status().is_terminal() {
                info!(booking_id = %event.booking_id, "duplicate delivery, order already reconciled");
                return Ok(ReconcileOutcome::Duplicate);
            }
            // An earlier delivery wrote the order but its inventory effect
            // never landed (crash or persistence failure in between). The
            // redelivery is the replay: resume from the written intent.
            warn!(
                booking_id = %event.booking_id,
                status = ?stored.status(),
                "resuming order whose inventory update never landed"
            );
            order = stored;
        }

        // Written intent first; only then the side effect.
        if *order.status() == OrderStatus::Created {
            order.mark_inventory_update_pending()?;
            self.store.update(&order)?;
        }

        self.decrement_with_retries(order)
    }

    fn decrement_with_retries(&self, mut order: Order) -> Result<ReconcileOutcome, ReconcileError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self
                .inventory
                .update_inventory(order.event_id(), order.ticket_count())
            {
                Ok(()) => {
                    order.mark_inventory_updated()?;
                    self.store.update(&order)?;
                    info!(
                        order_id = %order.order_id(),
                        event_id = %order.event_id(),
                        sold = order.ticket_count(),
                        "inventory updated"
                    );
                    return Ok(ReconcileOutcome::Completed);
                }
                Err(err) if self.retry.should_retry(attempt) => {
                    warn!(
                        order_id = %order.order_id(),
                        attempt,
                        error = %err,
                        "inventory decrement failed, backing off"
                    );
                    thread::sleep(self.retry.delay_for_attempt(attempt));
                }
                Err(err) => {
                    order.mark_inventory_update_failed(err.to_string(), attempt)?;
                    self.store.update(&order)?;
                    self.store
                        .dead_letter(DeadLetterEntry::new(order.clone(), err.to_string()))?;
                    error!(
                        order_id = %order.order_id(),
                        booking_id = %order.booking_id(),
                        attempts = attempt,
                        error = %err,
                        "inventory decrement exhausted retries, order dead-lettered"
                    );
                    return Ok(ReconcileOutcome::DeadLettered);
                }
            }
        }
    }
}
