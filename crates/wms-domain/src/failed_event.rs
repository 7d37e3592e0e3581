use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Dead-letter record for an outbound event the bus rejected.
///
/// Written when the publisher exhausts its attempts; never consulted on the
/// hot path. An out-of-band worker drains unresolved rows and marks them
/// resolved with notes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedEvent {
    pub id: Uuid,
    pub topic: String,
    pub event_type: String,
    /// The exact bytes that failed to publish, replayable as-is.
    pub payload: Vec<u8>,
    pub error: String,
    pub created_at: DateTime<Utc>,
    pub resolved: bool,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolution_notes: Option<String>,
}

impl FailedEvent {
    pub fn new(
        topic: impl Into<String>,
        event_type: impl Into<String>,
        payload: Vec<u8>,
        error: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            topic: topic.into(),
            event_type: event_type.into(),
            payload,
            error: error.into(),
            created_at: now,
            resolved: false,
            resolved_at: None,
            resolution_notes: None,
        }
    }
}
