//! Integration tests for the full booking pipeline.
//!
//! Coordinator → channel → reconciler worker → order store + inventory.
//!
//! Verifies:
//! - the end-to-end scenario (book, reconcile, drain capacity, refuse more)
//! - at-least-once deliveries collapse to one order and one decrement
//! - persist-first ordering and the dead-letter path under gateway failure

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

use chrono::Utc;
use uuid::Uuid;

use ticketflow_booking::{BookingCoordinator, BookingError, BookingRecorded, BookingRequest};
use ticketflow_core::{BookingId, CustomerId, EventId, Money};
use ticketflow_customers::{Customer, InMemoryCustomerDirectory};
use ticketflow_events::{EventEnvelope, InMemoryEventChannel};
use ticketflow_inventory::{
    InMemoryInventoryService, InventoryError, InventoryGateway, InventorySnapshot,
};

use crate::order::{Order, OrderStatus};
use crate::reconciler::{OrderReconciler, ReconcileOutcome};
use crate::retry::RetryPolicy;
use crate::store::{InMemoryOrderStore, OrderStore};
use crate::worker::{ReconcilerConfig, ReconcilerWorker};

fn user(s: &str) -> CustomerId {
    CustomerId::new(s).unwrap()
}

fn event(s: &str) -> EventId {
    EventId::new(s).unwrap()
}

fn request(user_id: &str, event_id: &str, count: u32) -> BookingRequest {
    BookingRequest::new(user(user_id), event(event_id), count).unwrap()
}

fn booking_event(count: u32, total_minor: u64) -> BookingRecorded {
    BookingRecorded {
        booking_id: BookingId::new(),
        user_id: user("u1"),
        event_id: event("e1"),
        ticket_count: count,
        total_price: Money::from_minor(total_minor),
        occurred_at: Utc::now(),
    }
}

fn envelope(payload: BookingRecorded) -> EventEnvelope<BookingRecorded> {
    let key = payload.event_id.to_string();
    EventEnvelope::new(Uuid::now_v7(), key, Utc::now(), payload)
}

/// Poll until `check` passes or the deadline elapses.
fn wait_until(timeout: Duration, check: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if check() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    check()
}

#[test]
fn end_to_end_booking_drains_capacity_and_persists_the_order() {
    // Structured logs for the whole pipeline, visible via RUST_LOG.
    ticketflow_observability::init();

    // Customer "u1" exists; event "e1" has capacity 5 at 10.00 a ticket.
    let directory = Arc::new(InMemoryCustomerDirectory::with_customers([Customer::new(
        user("u1"),
        "Ada",
        None,
    )]));
    let inventory = Arc::new(
        InMemoryInventoryService::new().with_event(event("e1"), 5, Money::from_minor(1000)),
    );
    let channel: Arc<InMemoryEventChannel<BookingRecorded>> = Arc::new(InMemoryEventChannel::new());
    let store = Arc::new(InMemoryOrderStore::new());

    // Worker subscribes before the first booking, so nothing is missed.
    let worker = ReconcilerWorker::spawn(
        ReconcilerConfig::default().with_tick(Duration::from_millis(20)),
        &channel,
        OrderReconciler::new(store.clone(), inventory.clone()),
    );

    let coordinator = BookingCoordinator::new(directory, inventory.clone(), channel.clone());

    // Booking all 5 tickets is an exact fit and must be accepted.
    let response = coordinator.create_booking(&request("u1", "e1", 5)).unwrap();
    assert_eq!(response.ticket_count, 5);
    assert_eq!(response.total_price, Money::from_minor(5000));
    assert_eq!(response.total_price.to_string(), "50.00");

    let booking_id = response.booking_id;
    assert!(
        wait_until(Duration::from_secs(2), || {
            store
                .get_by_booking_id(booking_id)
                .ok()
                .flatten()
                .is_some_and(|order| *order.status() == OrderStatus::InventoryUpdated)
        }),
        "order never reached InventoryUpdated"
    );

    assert_eq!(inventory.get_inventory(&event("e1")).unwrap().capacity, 0);

    let order = store.get_by_booking_id(booking_id).unwrap().unwrap();
    assert_eq!(order.customer_id(), &user("u1"));
    assert_eq!(order.event_id(), &event("e1"));
    assert_eq!(order.total_price(), Money::from_minor(5000));

    // The event is sold out now; the next request is refused synchronously.
    let err = coordinator
        .create_booking(&request("u1", "e1", 1))
        .unwrap_err();
    assert_eq!(
        err,
        BookingError::InsufficientInventory {
            requested: 1,
            available: 0
        }
    );

    worker.shutdown();
    assert_eq!(store.list().unwrap().len(), 1);
}

#[test]
fn redelivered_event_yields_one_order_and_one_decrement() {
    let inventory = Arc::new(
        InMemoryInventoryService::new().with_event(event("e1"), 10, Money::from_minor(1000)),
    );
    let store = Arc::new(InMemoryOrderStore::new());
    let reconciler = OrderReconciler::new(store.clone(), inventory.clone());

    let payload = booking_event(4, 4000);
    let first_delivery = envelope(payload.clone());
    // A redelivery arrives in a fresh envelope but carries the same token.
    let second_delivery = envelope(payload);

    assert_eq!(
        reconciler.handle_event(&first_delivery).unwrap(),
        ReconcileOutcome::Completed
    );
    assert_eq!(
        reconciler.handle_event(&second_delivery).unwrap(),
        ReconcileOutcome::Duplicate
    );

    assert_eq!(store.list().unwrap().len(), 1);
    assert_eq!(inventory.get_inventory(&event("e1")).unwrap().capacity, 6);
}

#[test]
fn redelivery_resumes_an_order_whose_decrement_never_landed() {
    let inventory = Arc::new(
        InMemoryInventoryService::new().with_event(event("e1"), 10, Money::from_minor(1000)),
    );
    let store = Arc::new(InMemoryOrderStore::new());

    // A previous consumer wrote the order and marked the decrement pending,
    // then died before calling the gateway.
    let payload = booking_event(3, 3000);
    let mut stranded = Order::from_event(&payload);
    store.insert_new(stranded.clone()).unwrap();
    stranded.mark_inventory_update_pending().unwrap();
    store.update(&stranded).unwrap();

    let reconciler = OrderReconciler::new(store.clone(), inventory.clone());
    assert_eq!(
        reconciler.handle_event(&envelope(payload)).unwrap(),
        ReconcileOutcome::Completed
    );

    // One order, decremented exactly once, now terminal.
    assert_eq!(store.list().unwrap().len(), 1);
    assert_eq!(inventory.get_inventory(&event("e1")).unwrap().capacity, 7);
    let order = store.get_by_booking_id(stranded.booking_id()).unwrap().unwrap();
    assert_eq!(*order.status(), OrderStatus::InventoryUpdated);

    // A further redelivery of the same token is now a pure duplicate.
    let second = BookingRecorded {
        booking_id: stranded.booking_id(),
        ..booking_event(3, 3000)
    };
    assert_eq!(
        reconciler.handle_event(&envelope(second)).unwrap(),
        ReconcileOutcome::Duplicate
    );
    assert_eq!(inventory.get_inventory(&event("e1")).unwrap().capacity, 7);
}

#[test]
fn redelivery_resumes_an_order_stranded_before_the_pending_mark() {
    let inventory = Arc::new(
        InMemoryInventoryService::new().with_event(event("e1"), 10, Money::from_minor(1000)),
    );
    let store = Arc::new(InMemoryOrderStore::new());

    // Consumer died right after the insert, before even the pending mark.
    let payload = booking_event(2, 2000);
    let stranded = Order::from_event(&payload);
    store.insert_new(stranded.clone()).unwrap();

    let reconciler = OrderReconciler::new(store.clone(), inventory.clone());
    assert_eq!(
        reconciler.handle_event(&envelope(payload)).unwrap(),
        ReconcileOutcome::Completed
    );

    let order = store.get_by_booking_id(stranded.booking_id()).unwrap().unwrap();
    assert_eq!(*order.status(), OrderStatus::InventoryUpdated);
    assert_eq!(inventory.get_inventory(&event("e1")).unwrap().capacity, 8);
}

#[test]
fn two_genuine_bookings_with_identical_fields_both_persist() {
    let inventory = Arc::new(
        InMemoryInventoryService::new().with_event(event("e1"), 10, Money::from_minor(1000)),
    );
    let store = Arc::new(InMemoryOrderStore::new());
    let reconciler = OrderReconciler::new(store.clone(), inventory.clone());

    // Same customer, same event, same count, but separate bookings, so
    // each carries its own token and neither collapses into the other.
    reconciler.handle_event(&envelope(booking_event(2, 2000))).unwrap();
    reconciler.handle_event(&envelope(booking_event(2, 2000))).unwrap();

    assert_eq!(store.list().unwrap().len(), 2);
    assert_eq!(inventory.get_inventory(&event("e1")).unwrap().capacity, 6);
}

/// Gateway whose decrement always fails.
struct FailingGateway;

impl InventoryGateway for FailingGateway {
    fn get_inventory(&self, event_id: &EventId) -> Result<InventorySnapshot, InventoryError> {
        Ok(InventorySnapshot {
            event_id: event_id.clone(),
            capacity: 100,
            unit_price: Money::from_minor(1000),
        })
    }

    fn update_inventory(&self, _event_id: &EventId, _n: u32) -> Result<(), InventoryError> {
        Err(InventoryError::Unavailable("inventory service down".into()))
    }
}

#[test]
fn exhausted_retries_park_the_order_on_the_dead_letter_path() {
    let store = Arc::new(InMemoryOrderStore::new());
    let reconciler = OrderReconciler::new(store.clone(), FailingGateway)
        .with_retry_policy(RetryPolicy::fixed(3, Duration::from_millis(1)));

    let payload = booking_event(1, 1000);
    let booking_id = payload.booking_id;

    assert_eq!(
        reconciler.handle_event(&envelope(payload)).unwrap(),
        ReconcileOutcome::DeadLettered
    );

    // The order itself survived (persistence came first) and carries the
    // operator-visible failure marker.
    let order = store.get_by_booking_id(booking_id).unwrap().unwrap();
    match order.status() {
        OrderStatus::InventoryUpdateFailed { attempts, .. } => assert_eq!(*attempts, 3),
        other => panic!("expected InventoryUpdateFailed, got {other:?}"),
    }

    let dead = store.list_dead_letters().unwrap();
    assert_eq!(dead.len(), 1);
    assert_eq!(dead[0].order.booking_id(), booking_id);
}

/// Gateway that fails a fixed number of decrements, then recovers.
struct FlakyGateway {
    inner: InMemoryInventoryService,
    failures_left: AtomicU32,
}

impl InventoryGateway for FlakyGateway {
    fn get_inventory(&self, event_id: &EventId) -> Result<InventorySnapshot, InventoryError> {
        self.inner.get_inventory(event_id)
    }

    fn update_inventory(&self, event_id: &EventId, n: u32) -> Result<(), InventoryError> {
        if self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| {
                left.checked_sub(1)
            })
            .is_ok()
        {
            return Err(InventoryError::Timeout);
        }
        self.inner.update_inventory(event_id, n)
    }
}

#[test]
fn decrement_retries_until_the_gateway_recovers() {
    let gateway = Arc::new(FlakyGateway {
        inner: InMemoryInventoryService::new().with_event(event("e1"), 5, Money::from_minor(1000)),
        failures_left: AtomicU32::new(2),
    });
    let store = Arc::new(InMemoryOrderStore::new());
    let reconciler = OrderReconciler::new(store.clone(), gateway.clone())
        .with_retry_policy(RetryPolicy::fixed(5, Duration::from_millis(1)));

    let payload = booking_event(2, 2000);
    let booking_id = payload.booking_id;

    assert_eq!(
        reconciler.handle_event(&envelope(payload)).unwrap(),
        ReconcileOutcome::Completed
    );

    let order = store.get_by_booking_id(booking_id).unwrap().unwrap();
    assert_eq!(*order.status(), OrderStatus::InventoryUpdated);
    // Two failed attempts, one successful decrement.
    assert_eq!(gateway.get_inventory(&event("e1")).unwrap().capacity, 3);
}
