//! Key-value plumbing: the per-shelf lease and the advisory caches.
//!
//! Both ride on the [`Kv`] trait so tests can substitute an in-memory fake
//! (`wms-testkit`) for the Redis-backed production implementation.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub mod cache;
pub mod lease;
pub mod redis_kv;

pub use cache::{AdminShelfStatus, ShelfCache};
pub use lease::{Lease, LeaseError, ShelfLock};
pub use redis_kv::RedisKv;

#[derive(Debug, Error)]
pub enum KvError {
    #[error("kv store unavailable: {0}")]
    Unavailable(#[from] anyhow::Error),
}

/// Minimal key-value contract: conditional insert, guarded delete, plain
/// get/set with expiry. Exactly what the lease and the caches need, nothing
/// more.
#[async_trait]
pub trait Kv: Send + Sync {
    /// Insert `key = value` with the given TTL only if the key is absent.
    /// Returns `true` when this call created the entry.
    async fn set_nx(&self, key: &str, value: &str, ttl: Duration) -> Result<bool, KvError>;

    /// Delete `key` only if its current value equals `expected`. Returns
    /// `true` when the entry was deleted. An expired or re-acquired entry is
    /// left alone.
    async fn del_if_eq(&self, key: &str, expected: &str) -> Result<bool, KvError>;

    async fn get(&self, key: &str) -> Result<Option<String>, KvError>;

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<(), KvError>;
}
