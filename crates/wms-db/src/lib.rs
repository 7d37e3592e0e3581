//! Persistence gateway.
//!
//! The [`store::InventoryStore`] / [`store::InventoryTx`] traits are the only
//! write path for materials, slots, operations, alerts and dead-letter rows.
//! [`pg`] implements them over PostgreSQL; the in-memory fake used by tests
//! lives in `wms-testkit`.
//!
//! Slot writes are optimistic: the UPDATE carries `WHERE version = expected`
//! and a zero-rows-affected result surfaces as [`StoreError::VersionConflict`].

use anyhow::{Context, Result};
use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;

pub mod pg;
pub mod store;

pub use pg::PgStore;
pub use store::{InventoryStore, InventoryTx};

pub const ENV_DB_URL: &str = "WMS_DATABASE_URL";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("row not found")]
    NotFound,
    /// The optimistic `WHERE version = expected` (or status-guarded) update
    /// matched zero rows: another writer got there first.
    #[error("optimistic concurrency check failed")]
    VersionConflict,
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl StoreError {
    pub fn from_sqlx(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            other => StoreError::Backend(anyhow::Error::new(other)),
        }
    }
}

impl From<StoreError> for wms_domain::InventoryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => wms_domain::InventoryError::not_found("record not found"),
            StoreError::VersionConflict => wms_domain::InventoryError::conflict_with(
                "concurrent modification detected",
                anyhow::anyhow!("optimistic concurrency check failed"),
            ),
            StoreError::Backend(cause) => {
                wms_domain::InventoryError::internal_with("storage failure", cause)
            }
        }
    }
}

/// Connect using the explicit URL (composed by `wms-config`).
pub async fn connect(url: &str) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(url)
        .await
        .context("failed to connect to Postgres")?;
    Ok(pool)
}

/// Connect using WMS_DATABASE_URL (integration-test convenience).
pub async fn connect_from_env() -> Result<PgPool> {
    let url = std::env::var(ENV_DB_URL).with_context(|| format!("missing env var {ENV_DB_URL}"))?;
    connect(&url).await
}

/// Run embedded migrations.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("db migrate failed")?;
    Ok(())
}
