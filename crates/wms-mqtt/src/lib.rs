//! Shelf hardware bridge.
//!
//! Subscribes to `<prefix>/+/events` and `<prefix>/+/status` at QoS 1 and
//! feeds the payloads into the reconciler (detections, removals) and the
//! coordinator (slot errors, status heartbeats). Handlers are wrapped in an
//! exponential-backoff retry; redelivered messages are harmless because
//! every state transition is precondition-checked.

pub mod bridge;
pub mod messages;
pub mod retry;

pub use bridge::ShelfBridge;
pub use messages::{parse_topic, ShelfEventMsg, ShelfStatusMsg, TopicKind};
pub use retry::{with_retry, with_retry_if, RetryPolicy};
