//! Booking coordination.
//!
//! The synchronous half of the booking workflow: validate the customer, check
//! inventory, price the tickets, and hand off to order reconciliation by
//! publishing a [`BookingRecorded`] event. Accepting a booking here means
//! "recorded and handed off", not "order fulfilled"; fulfillment happens
//! asynchronously downstream.

pub mod coordinator;
pub mod event;

pub use coordinator::{BookingCoordinator, BookingError, BookingRequest, BookingResponse};
pub use event::BookingRecorded;
