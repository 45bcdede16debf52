//! Event publishing/subscription abstraction (mechanics only).
//!
//! The channel contract, as seen from both ends:
//!
//! - **Producers**: `publish(key, event)` returns only once the channel has
//!   durably accepted the event, or with an error. Exactly one publish attempt
//!   per call; the caller decides whether a failure is retryable.
//! - **Consumers**: every published event is delivered **at least once**.
//!   Duplicates are possible, silent loss is not. Order is preserved only
//!   between events sharing a partition key; consumers must be idempotent.
//!
//! No exactly-once guarantee is assumed or required anywhere; dedup is the
//! consumer's job, keyed on an idempotency token inside the payload.

use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::time::Duration;

use thiserror::Error;

use crate::envelope::EventEnvelope;

/// Why a publish (or the channel itself) failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChannelError {
    /// The channel rejected or could not accept the event.
    #[error("channel unavailable: {0}")]
    Unavailable(String),

    /// The channel did not acknowledge within the publish deadline.
    #[error("publish timed out")]
    Timeout,
}

/// A subscription to an event stream.
///
/// Each subscription receives a copy of every event published to the channel
/// (broadcast semantics), wrapped in its envelope. Designed for
/// single-threaded consumption: one subscription, one consumer loop.
///
/// ```ignore
/// let sub = channel.subscribe();
/// loop {
///     match sub.recv_timeout(Duration::from_millis(250)) {
///         Ok(envelope) => process(envelope)?,
///         Err(RecvTimeoutError::Timeout) => continue,      // check shutdown
///         Err(RecvTimeoutError::Disconnected) => break,    // channel closed
///     }
/// }
/// ```
#[derive(Debug)]
pub struct Subscription<E> {
    receiver: Receiver<EventEnvelope<E>>,
}

impl<E> Subscription<E> {
    pub fn new(receiver: Receiver<EventEnvelope<E>>) -> Self {
        Self { receiver }
    }

    /// Block until the next envelope is available.
    pub fn recv(&self) -> Result<EventEnvelope<E>, std::sync::mpsc::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive an envelope without blocking.
    pub fn try_recv(&self) -> Result<EventEnvelope<E>, std::sync::mpsc::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Block for up to `timeout` waiting for an envelope.
    pub fn recv_timeout(
        &self,
        timeout: Duration,
    ) -> Result<EventEnvelope<E>, std::sync::mpsc::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }
}

/// Ordered, partition-keyed, at-least-once event channel.
///
/// Implementations must be safe to publish to from many threads at once; the
/// booking side is stateless and concurrent.
pub trait EventChannel<E>: Send + Sync {
    /// Publish one event under a partition key.
    ///
    /// Returns `Ok(())` only after the event has been durably accepted.
    fn publish(&self, partition_key: &str, event: E) -> Result<(), ChannelError>;

    /// Open a new broadcast subscription.
    fn subscribe(&self) -> Subscription<E>;
}

impl<E, C> EventChannel<E> for Arc<C>
where
    C: EventChannel<E> + ?Sized,
{
    fn publish(&self, partition_key: &str, event: E) -> Result<(), ChannelError> {
        (**self).publish(partition_key, event)
    }

    fn subscribe(&self) -> Subscription<E> {
        (**self).subscribe()
    }
}
