//! Envelope construction + publish with dead-letter fallback.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use wms_db::InventoryStore;
use wms_domain::events::Envelope;
use wms_domain::FailedEvent;

use crate::BusProducer;

const SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Both the publish and the dead-letter write failed. The inventory state is
/// already committed at this point; callers log and continue.
#[derive(Debug, Error)]
#[error("event {event_type} lost: publish failed ({publish_error}) and dead-letter write failed")]
pub struct PublishError {
    pub event_type: String,
    pub publish_error: String,
    #[source]
    pub dead_letter_error: anyhow::Error,
}

pub struct EventPublisher {
    bus: Arc<dyn BusProducer>,
    store: Arc<dyn InventoryStore>,
    topic: String,
}

impl EventPublisher {
    pub fn new(bus: Arc<dyn BusProducer>, store: Arc<dyn InventoryStore>, topic: impl Into<String>) -> Self {
        Self {
            bus,
            store,
            topic: topic.into(),
        }
    }

    /// Wrap `payload` in the standard envelope and publish it, keyed by
    /// `partition_key` (the shelf id for shelf-scoped events, the event type
    /// for system-level ones).
    ///
    /// Returns `Ok` when either the publish or the dead-letter write
    /// succeeded; [`PublishError`] only when both failed.
    pub async fn publish<T: Serialize>(
        &self,
        event_type: &str,
        partition_key: &str,
        payload: T,
    ) -> Result<(), PublishError> {
        let envelope = Envelope::new(event_type, payload, Utc::now());
        let bytes = match serde_json::to_vec(&envelope) {
            Ok(bytes) => bytes,
            Err(err) => {
                // A payload that cannot serialize is a programming error;
                // there is nothing replayable to dead-letter.
                error!(event_type, error = %err, "event payload failed to serialize");
                return Ok(());
            }
        };

        match self
            .bus
            .send(&self.topic, partition_key, &bytes, SEND_TIMEOUT)
            .await
        {
            Ok(()) => Ok(()),
            Err(publish_err) => {
                warn!(
                    event_type,
                    error = %publish_err,
                    "publish failed; writing dead-letter"
                );
                let failed = FailedEvent::new(
                    &self.topic,
                    event_type,
                    bytes,
                    publish_err.to_string(),
                    Utc::now(),
                );
                match self.store.insert_failed_event(&failed).await {
                    Ok(()) => Ok(()),
                    Err(store_err) => Err(PublishError {
                        event_type: event_type.to_string(),
                        publish_error: publish_err.to_string(),
                        dead_letter_error: anyhow::Error::new(store_err),
                    }),
                }
            }
        }
    }
}
