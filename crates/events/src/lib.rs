//! `ticketflow-events` — the event channel abstraction.
//!
//! An ordered, partition-keyed, at-least-once delivery channel connecting the
//! booking side to the order-reconciliation side. The channel moves events; it
//! does not store them, and it never promises exactly-once, so consumers are
//! required to be idempotent.

pub mod channel;
pub mod envelope;
pub mod event;
pub mod in_memory;

pub use channel::{ChannelError, EventChannel, Subscription};
pub use envelope::EventEnvelope;
pub use event::Event;
pub use in_memory::InMemoryEventChannel;
