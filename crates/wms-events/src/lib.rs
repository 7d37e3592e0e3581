//! Outbound event publishing.
//!
//! At-least-once delivery to a single logical topic. A failed publish is
//! written to the dead-letter store through the persistence gateway; the
//! caller sees success if either the publish or the dead-letter write lands.
//! Events for one `(shelf, slot)` are only emitted while holding that
//! shelf's lease, so keying messages on `shelf_id` preserves their order on
//! the bus.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub mod kafka;
pub mod publisher;

pub use kafka::KafkaBus;
pub use publisher::EventPublisher;

#[derive(Debug, Error)]
#[error("bus publish failed: {0}")]
pub struct BusError(#[from] pub anyhow::Error);

/// Raw bus producer. One implementation talks Kafka; tests record in memory.
#[async_trait]
pub trait BusProducer: Send + Sync {
    async fn send(
        &self,
        topic: &str,
        key: &str,
        payload: &[u8],
        timeout: Duration,
    ) -> Result<(), BusError>;
}
