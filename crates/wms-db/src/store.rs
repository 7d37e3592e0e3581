//! Storage traits consumed by the coordinator and reconciler.
//!
//! One coordinator command maps to exactly one transaction: `begin` →
//! mutations → `commit`/`rollback`. Partial writes are never visible to
//! pool-level reads. Reads inside a transaction go through [`InventoryTx`]
//! so precondition re-checks see the transaction's own view.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use wms_domain::{Alert, FailedEvent, Material, Operation, OperationStatus, Slot};

use crate::StoreError;

#[async_trait]
pub trait InventoryStore: Send + Sync {
    async fn fetch_slot(&self, id: &str) -> Result<Slot, StoreError>;
    async fn fetch_material(&self, id: Uuid) -> Result<Material, StoreError>;
    async fn fetch_material_by_barcode(&self, barcode: &str) -> Result<Material, StoreError>;
    async fn fetch_operation(&self, id: Uuid) -> Result<Operation, StoreError>;

    async fn slots_for_shelf(&self, shelf_id: &str) -> Result<Vec<Slot>, StoreError>;
    async fn empty_slots_for_shelf(&self, shelf_id: &str) -> Result<Vec<Slot>, StoreError>;

    /// Open operations on a slot in the given pending status.
    async fn pending_ops_for_slot(
        &self,
        slot_id: &str,
        status: OperationStatus,
    ) -> Result<Vec<Operation>, StoreError>;

    /// Sweeper query: operations stuck in `status` since before `cutoff`.
    async fn timed_out_pending(
        &self,
        status: OperationStatus,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Operation>, StoreError>;

    /// Substring match on barcode or name, paginated.
    async fn search_materials(
        &self,
        query: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Material>, StoreError>;

    /// Audit trail listing, newest first.
    async fn list_operations(&self, limit: i64, offset: i64) -> Result<Vec<Operation>, StoreError>;

    /// Alerts are written unconditionally, outside any shelf lease.
    async fn insert_alert(&self, alert: &Alert) -> Result<(), StoreError>;

    /// Dead-letter write; must succeed independently of the failed publish.
    async fn insert_failed_event(&self, event: &FailedEvent) -> Result<(), StoreError>;

    async fn list_unresolved_failed_events(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<FailedEvent>, StoreError>;

    async fn resolve_failed_event(&self, id: Uuid, notes: &str) -> Result<(), StoreError>;

    async fn begin(&self) -> Result<Box<dyn InventoryTx>, StoreError>;
}

#[async_trait]
pub trait InventoryTx: Send {
    async fn fetch_slot(&mut self, id: &str) -> Result<Slot, StoreError>;
    async fn fetch_material(&mut self, id: Uuid) -> Result<Material, StoreError>;
    async fn fetch_operation(&mut self, id: Uuid) -> Result<Operation, StoreError>;

    /// Optimistic write: requires the stored row to still be at
    /// `slot.version - 1`. Zero rows affected → [`StoreError::VersionConflict`].
    async fn update_slot(&mut self, slot: &Slot) -> Result<(), StoreError>;

    /// Material transitions are idempotent under slot ownership; no version.
    async fn update_material(&mut self, material: &Material) -> Result<(), StoreError>;

    async fn insert_operation(&mut self, op: &Operation) -> Result<(), StoreError>;

    /// Status-guarded advance: `WHERE id = $id AND status = $from`. Zero rows
    /// affected → [`StoreError::VersionConflict`]. This is what makes the
    /// sweeper and the confirm path idempotent under races.
    async fn update_operation_status(
        &mut self,
        id: Uuid,
        from: OperationStatus,
        to: OperationStatus,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}
