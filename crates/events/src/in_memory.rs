//! In-memory event channel for tests/dev.

use std::sync::{Mutex, mpsc};

use chrono::Utc;
use uuid::Uuid;

use crate::channel::{ChannelError, EventChannel, Subscription};
use crate::envelope::EventEnvelope;

/// In-memory partition-keyed channel.
///
/// - No IO / no async
/// - Broadcast fan-out to every live subscriber
/// - Each subscriber sees events in global publish order, which subsumes the
///   per-partition-key ordering guarantee
/// - At-least-once acceptable (subscribers must be idempotent)
#[derive(Debug)]
pub struct InMemoryEventChannel<E> {
    subscribers: Mutex<Vec<mpsc::Sender<EventEnvelope<E>>>>,
}

impl<E> InMemoryEventChannel<E> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<E> Default for InMemoryEventChannel<E> {
    fn default() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
        }
    }
}

impl<E> EventChannel<E> for InMemoryEventChannel<E>
where
    E: Clone + Send + 'static,
{
    fn publish(&self, partition_key: &str, event: E) -> Result<(), ChannelError> {
        let envelope = EventEnvelope::new(Uuid::now_v7(), partition_key, Utc::now(), event);

        let mut subs = self
            .subscribers
            .lock()
            .map_err(|_| ChannelError::Unavailable("subscriber registry poisoned".into()))?;

        // Drop any dead subscribers while publishing.
        subs.retain(|tx| tx.send(envelope.clone()).is_ok());

        Ok(())
    }

    fn subscribe(&self) -> Subscription<E> {
        let (tx, rx) = mpsc::channel();

        // If the lock is poisoned, we still return a subscription;
        // it just won't receive messages until the process restarts.
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.push(tx);
        }

        Subscription::new(rx)
    }
}
