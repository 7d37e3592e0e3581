//! Per-shelf write lease.
//!
//! At-most-one writer per shelf across all service instances: a uniquely
//! tagged entry inserted with set-if-absent semantics, released with
//! delete-if-tag-matches so an expired lease can never be deleted by a later
//! holder. The TTL is the crash backstop; explicit release is the normal
//! path.
//!
//! Multi-shelf acquisition always walks shelf ids in ascending order, which
//! rules out deadlock between concurrent multi-shelf commands.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::{Kv, KvError};

#[derive(Debug, Error)]
pub enum LeaseError {
    /// Another writer holds the shelf right now.
    #[error("shelf {shelf_id} is locked by another writer")]
    Held { shelf_id: String },
    /// The backing store failed; fatal for the request.
    #[error("lease store unavailable: {0}")]
    Store(#[source] anyhow::Error),
}

impl From<KvError> for LeaseError {
    fn from(err: KvError) -> Self {
        match err {
            KvError::Unavailable(cause) => LeaseError::Store(cause),
        }
    }
}

/// A held lease. Call [`Lease::release`] when done; if the process dies
/// first, the TTL reclaims the shelf.
pub struct Lease {
    key: String,
    token: String,
    kv: Arc<dyn Kv>,
}

impl std::fmt::Debug for Lease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lease")
            .field("key", &self.key)
            .field("token", &self.token)
            .finish()
    }
}

impl Lease {
    /// Delete-if-tag-matches. A failed or stale release is logged, not
    /// surfaced: the committed state is already durable and the TTL will
    /// clear the entry.
    pub async fn release(self) {
        match self.kv.del_if_eq(&self.key, &self.token).await {
            Ok(true) => {}
            Ok(false) => warn!(key = %self.key, "lease already expired or re-acquired"),
            Err(err) => warn!(key = %self.key, error = %err, "lease release failed"),
        }
    }
}

#[derive(Clone)]
pub struct ShelfLock {
    kv: Arc<dyn Kv>,
}

impl ShelfLock {
    pub fn new(kv: Arc<dyn Kv>) -> Self {
        Self { kv }
    }

    fn key(shelf_id: &str) -> String {
        format!("lock:shelf:{shelf_id}")
    }

    /// Acquire the lease for one shelf or fail immediately with
    /// [`LeaseError::Held`].
    pub async fn acquire(&self, shelf_id: &str, ttl: Duration) -> Result<Lease, LeaseError> {
        let key = Self::key(shelf_id);
        let token = Uuid::new_v4().to_string();

        let inserted = self.kv.set_nx(&key, &token, ttl).await?;
        if !inserted {
            return Err(LeaseError::Held {
                shelf_id: shelf_id.to_string(),
            });
        }

        Ok(Lease {
            key,
            token,
            kv: Arc::clone(&self.kv),
        })
    }

    /// Acquire leases for a set of shelves in ascending id order (duplicates
    /// collapsed). On any failure partway through, every lease already held
    /// is released before the error is returned.
    pub async fn acquire_many(
        &self,
        shelf_ids: impl IntoIterator<Item = String>,
        ttl: Duration,
    ) -> Result<Vec<Lease>, LeaseError> {
        let ordered: BTreeSet<String> = shelf_ids.into_iter().collect();

        let mut held = Vec::with_capacity(ordered.len());
        for shelf_id in &ordered {
            match self.acquire(shelf_id, ttl).await {
                Ok(lease) => held.push(lease),
                Err(err) => {
                    release_all(held).await;
                    return Err(err);
                }
            }
        }
        Ok(held)
    }
}

/// Release a batch of leases, in reverse acquisition order.
pub async fn release_all(leases: Vec<Lease>) {
    for lease in leases.into_iter().rev() {
        lease.release().await;
    }
}
