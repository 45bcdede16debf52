//! Order reconciliation.
//!
//! The asynchronous half of the booking workflow: consume `BookingRecorded`
//! events from the channel, persist an `Order` exactly once per booking
//! (idempotent on the booking's token), then decrement inventory. Persistence
//! always comes first, so a crash between the two leaves a written order
//! whose pending inventory effect is visible and replayable, never a silent
//! loss of intent.

pub mod order;
pub mod reconciler;
pub mod retry;
pub mod store;
pub mod worker;

#[cfg(test)]
mod integration_tests;

pub use order::{Order, OrderStatus};
pub use reconciler::{OrderReconciler, ReconcileError, ReconcileOutcome};
pub use retry::{BackoffStrategy, RetryPolicy};
pub use store::{DeadLetterEntry, InMemoryOrderStore, InsertOutcome, OrderStore, OrderStoreError};
pub use worker::{ReconcilerConfig, ReconcilerWorker, WorkerHandle};
