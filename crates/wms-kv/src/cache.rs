//! Advisory shelf caches.
//!
//! Correctness tolerates any staleness up to the TTL; every read path that
//! misses here recomputes from storage. Cache failures degrade to a miss.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use wms_domain::ShelfStatusSummary;

use crate::Kv;

/// Shelf-admin status written on MQTT heartbeats (`online` / `offline` /
/// `maintenance`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminShelfStatus {
    pub status: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct ShelfCache {
    kv: Arc<dyn Kv>,
    summary_ttl: Duration,
    status_ttl: Duration,
}

impl ShelfCache {
    pub fn new(kv: Arc<dyn Kv>, summary_ttl: Duration, status_ttl: Duration) -> Self {
        Self {
            kv,
            summary_ttl,
            status_ttl,
        }
    }

    fn summary_key(shelf_id: &str) -> String {
        format!("shelf_summary:{shelf_id}")
    }

    fn status_key(shelf_id: &str) -> String {
        format!("shelf_status:{shelf_id}")
    }

    pub async fn summary(&self, shelf_id: &str) -> Option<ShelfStatusSummary> {
        self.read_json(&Self::summary_key(shelf_id)).await
    }

    pub async fn store_summary(&self, summary: &ShelfStatusSummary) {
        self.write_json(&Self::summary_key(&summary.shelf_id), summary, self.summary_ttl)
            .await;
    }

    pub async fn admin_status(&self, shelf_id: &str) -> Option<AdminShelfStatus> {
        self.read_json(&Self::status_key(shelf_id)).await
    }

    pub async fn store_admin_status(&self, shelf_id: &str, status: &AdminShelfStatus) {
        self.write_json(&Self::status_key(shelf_id), status, self.status_ttl)
            .await;
    }

    async fn read_json<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.kv.get(key).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => Some(value),
                Err(err) => {
                    warn!(key, error = %err, "dropping undecodable cache entry");
                    None
                }
            },
            Ok(None) => None,
            Err(err) => {
                warn!(key, error = %err, "cache read failed; treating as miss");
                None
            }
        }
    }

    async fn write_json<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(key, error = %err, "cache value failed to serialize");
                return;
            }
        };
        if let Err(err) = self.kv.set_with_ttl(key, &raw, ttl).await {
            warn!(key, error = %err, "cache write failed");
        }
    }
}
