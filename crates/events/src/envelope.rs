use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Envelope for an event in transit over a channel.
///
/// Notes:
/// - `message_id` identifies one *delivery attempt lineage*: a redelivered
///   message keeps its id, so consumers can log duplicates meaningfully.
/// - `partition_key` routes the event; events sharing a key are delivered in
///   publish order to the same consumer lineage. Ordering across different
///   keys is not guaranteed.
/// - `payload` is carried verbatim; the channel never inspects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    message_id: Uuid,
    partition_key: String,
    published_at: DateTime<Utc>,
    payload: E,
}

impl<E> EventEnvelope<E> {
    pub fn new(
        message_id: Uuid,
        partition_key: impl Into<String>,
        published_at: DateTime<Utc>,
        payload: E,
    ) -> Self {
        Self {
            message_id,
            partition_key: partition_key.into(),
            published_at,
            payload,
        }
    }

    pub fn message_id(&self) -> Uuid {
        self.message_id
    }

    pub fn partition_key(&self) -> &str {
        &self.partition_key
    }

    pub fn published_at(&self) -> DateTime<Utc> {
        self.published_at
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    pub fn into_payload(self) -> E {
        self.payload
    }
}
