//! Background reconciler worker.

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use ticketflow_booking::BookingRecorded;
use ticketflow_events::{EventChannel, Subscription};
use ticketflow_inventory::InventoryGateway;

use crate::reconciler::OrderReconciler;
use crate::store::OrderStore;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Thread name for logging.
    pub name: String,
    /// How long one `recv_timeout` blocks before re-checking shutdown.
    pub tick: Duration,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            name: "order-reconciler".to_string(),
            tick: Duration::from_millis(250),
        }
    }
}

impl ReconcilerConfig {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }
}

/// Handle to control and join a background worker.
#[derive(Debug)]
pub struct WorkerHandle {
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
}

impl WorkerHandle {
    /// Request graceful shutdown and wait for the worker to stop.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
    }
}

/// Consumer loop around an [`OrderReconciler`].
///
/// One worker drains one subscription, so all side effects are serialized,
/// which is exactly the per-partition-key ordering the channel promises and
/// the capacity decrements need. Scaling out means one worker per partition,
/// never two workers on one subscription's key range.
#[derive(Debug)]
pub struct ReconcilerWorker;

impl ReconcilerWorker {
    /// Subscribe to the channel and spawn the consumer thread.
    ///
    /// The subscription is opened before the thread starts, so events
    /// published from this point on are never missed.
    pub fn spawn<S, G, C>(
        config: ReconcilerConfig,
        channel: &C,
        reconciler: OrderReconciler<S, G>,
    ) -> WorkerHandle
    where
        S: OrderStore + 'static,
        G: InventoryGateway + 'static,
        C: EventChannel<BookingRecorded>,
    {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let sub: Subscription<BookingRecorded> = channel.subscribe();

        let name = config.name.clone();
        let join = thread::Builder::new()
            .name(name)
            .spawn(move || worker_loop(config, sub, shutdown_rx, reconciler))
            .expect("failed to spawn reconciler worker thread");

        WorkerHandle {
            shutdown: shutdown_tx,
            join: Some(join),
        }
    }
}

fn worker_loop<S, G>(
    config: ReconcilerConfig,
    sub: Subscription<BookingRecorded>,
    shutdown_rx: mpsc::Receiver<()>,
    reconciler: OrderReconciler<S, G>,
) where
    S: OrderStore,
    G: InventoryGateway,
{
    info!(worker = %config.name, "reconciler worker started");

    loop {
        // Shutdown check (non-blocking)
        if shutdown_rx.try_recv().is_ok() {
            break;
        }

        match sub.recv_timeout(config.tick) {
            Ok(envelope) => match reconciler.handle_event(&envelope) {
                Ok(outcome) => {
                    debug!(
                        worker = %config.name,
                        message_id = %envelope.message_id(),
                        outcome = ?outcome,
                        "delivery reconciled"
                    );
                }
                // Not acknowledged; the channel will redeliver and the
                // idempotent insert makes the retry safe.
                Err(err) => {
                    warn!(
                        worker = %config.name,
                        message_id = %envelope.message_id(),
                        error = ?err,
                        "reconcile failed, awaiting redelivery"
                    );
                }
            },
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    info!(worker = %config.name, "reconciler worker stopped");
}
