use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ticketflow_core::{BookingId, CustomerId, EventId, Money};
use ticketflow_events::Event;

/// Integration event: a booking was validated, priced and accepted.
///
/// The sole unit of cross-process state transfer. Immutable once published;
/// carried verbatim over the channel. `total_price` was computed from the
/// unit price read at validation time. Downstream never re-prices, so the
/// charged amount stays fixed no matter what the price does later.
///
/// `booking_id` is a per-booking idempotency token. Consumers dedup on it,
/// which distinguishes a channel redelivery (same token) from a customer
/// genuinely booking the same tickets twice (fresh token each time).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRecorded {
    pub booking_id: BookingId,
    pub user_id: CustomerId,
    pub event_id: EventId,
    pub ticket_count: u32,
    pub total_price: Money,
    pub occurred_at: DateTime<Utc>,
}

impl Event for BookingRecorded {
    fn event_type(&self) -> &'static str {
        "booking.recorded"
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
}
