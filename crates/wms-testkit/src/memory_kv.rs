//! In-memory [`Kv`] fake with real TTL expiry and fault injection.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use wms_kv::{Kv, KvError};

struct Entry {
    value: String,
    expires_at: Instant,
}

#[derive(Default)]
pub struct MemoryKv {
    entries: Mutex<HashMap<String, Entry>>,
    unavailable: AtomicBool,
    /// Keys passed to successful `set_nx` calls, in order.
    acquisitions: Mutex<Vec<String>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every operation fail, simulating a down KV backend.
    pub fn set_unavailable(&self, down: bool) {
        self.unavailable.store(down, Ordering::SeqCst);
    }

    /// Force-expire an entry, simulating TTL elapse without waiting.
    pub fn expire(&self, key: &str) {
        self.entries.lock().unwrap().remove(key);
    }

    pub fn raw_get(&self, key: &str) -> Option<String> {
        let mut map = self.entries.lock().unwrap();
        live_value(&mut map, key)
    }

    /// Every key successfully inserted via `set_nx`, oldest first. Lets
    /// tests assert lease acquisition order and counts.
    pub fn acquisition_history(&self) -> Vec<String> {
        self.acquisitions.lock().unwrap().clone()
    }

    fn check_up(&self) -> Result<(), KvError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(KvError::Unavailable(anyhow::anyhow!(
                "kv backend unavailable (injected)"
            )));
        }
        Ok(())
    }
}

fn live_value(map: &mut HashMap<String, Entry>, key: &str) -> Option<String> {
    match map.get(key) {
        Some(entry) if entry.expires_at > Instant::now() => Some(entry.value.clone()),
        Some(_) => {
            map.remove(key);
            None
        }
        None => None,
    }
}

#[async_trait]
impl Kv for MemoryKv {
    async fn set_nx(&self, key: &str, value: &str, ttl: Duration) -> Result<bool, KvError> {
        self.check_up()?;
        let mut map = self.entries.lock().unwrap();
        if live_value(&mut map, key).is_some() {
            return Ok(false);
        }
        map.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        self.acquisitions.lock().unwrap().push(key.to_string());
        Ok(true)
    }

    async fn del_if_eq(&self, key: &str, expected: &str) -> Result<bool, KvError> {
        self.check_up()?;
        let mut map = self.entries.lock().unwrap();
        if live_value(&mut map, key).as_deref() == Some(expected) {
            map.remove(key);
            return Ok(true);
        }
        Ok(false)
    }

    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        self.check_up()?;
        let mut map = self.entries.lock().unwrap();
        Ok(live_value(&mut map, key))
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<(), KvError> {
        self.check_up()?;
        self.entries.lock().unwrap().insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }
}
