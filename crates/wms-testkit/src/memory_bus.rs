//! Recording [`BusProducer`] fake with failure injection.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use wms_events::{BusError, BusProducer};

#[derive(Debug, Clone)]
pub struct RecordedEvent {
    pub topic: String,
    pub key: String,
    pub payload: Vec<u8>,
}

impl RecordedEvent {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.payload).expect("recorded payload is not JSON")
    }

    pub fn event_type(&self) -> String {
        self.json()["event_type"]
            .as_str()
            .expect("missing event_type")
            .to_string()
    }
}

#[derive(Default)]
pub struct MemoryBus {
    events: Mutex<Vec<RecordedEvent>>,
    fail: AtomicBool,
}

impl MemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every publish until cleared.
    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }

    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn event_types(&self) -> Vec<String> {
        self.events().iter().map(RecordedEvent::event_type).collect()
    }

    /// Recorded events of one type, newest last.
    pub fn events_of_type(&self, event_type: &str) -> Vec<RecordedEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }
}

#[async_trait]
impl BusProducer for MemoryBus {
    async fn send(
        &self,
        topic: &str,
        key: &str,
        payload: &[u8],
        _timeout: Duration,
    ) -> Result<(), BusError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(BusError(anyhow::anyhow!("bus failure (injected)")));
        }
        self.events.lock().unwrap().push(RecordedEvent {
            topic: topic.to_string(),
            key: key.to_string(),
            payload: payload.to_vec(),
        });
        Ok(())
    }
}
