//! PostgreSQL implementation of the storage traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{Executor, PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use wms_domain::{
    Alert, FailedEvent, Material, MaterialStatus, Operation, OperationStatus, OperationType, Slot,
    SlotStatus,
};

use crate::store::{InventoryStore, InventoryTx};
use crate::StoreError;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

fn parse_status<T>(parsed: Option<T>, column: &str, raw: &str) -> Result<T, StoreError> {
    parsed.ok_or_else(|| StoreError::Backend(anyhow::anyhow!("invalid {column} value: {raw}")))
}

fn row_to_slot(row: &PgRow) -> Result<Slot, StoreError> {
    let status: String = row.try_get("status").map_err(StoreError::from_sqlx)?;
    Ok(Slot {
        id: row.try_get("id").map_err(StoreError::from_sqlx)?,
        shelf_id: row.try_get("shelf_id").map_err(StoreError::from_sqlx)?,
        row: row.try_get("row_idx").map_err(StoreError::from_sqlx)?,
        column: row.try_get("col_idx").map_err(StoreError::from_sqlx)?,
        status: parse_status(SlotStatus::parse(&status), "slot status", &status)?,
        material_id: row.try_get("material_id").map_err(StoreError::from_sqlx)?,
        updated_at: row.try_get("updated_at").map_err(StoreError::from_sqlx)?,
        version: row.try_get("version").map_err(StoreError::from_sqlx)?,
    })
}

fn row_to_material(row: &PgRow) -> Result<Material, StoreError> {
    let status: String = row.try_get("status").map_err(StoreError::from_sqlx)?;
    Ok(Material {
        id: row.try_get("id").map_err(StoreError::from_sqlx)?,
        barcode: row.try_get("barcode").map_err(StoreError::from_sqlx)?,
        name: row.try_get("name").map_err(StoreError::from_sqlx)?,
        material_type: row
            .try_get("material_type")
            .map_err(StoreError::from_sqlx)?,
        status: parse_status(MaterialStatus::parse(&status), "material status", &status)?,
        created_at: row.try_get("created_at").map_err(StoreError::from_sqlx)?,
        updated_at: row.try_get("updated_at").map_err(StoreError::from_sqlx)?,
    })
}

fn row_to_operation(row: &PgRow) -> Result<Operation, StoreError> {
    let op_type: String = row.try_get("op_type").map_err(StoreError::from_sqlx)?;
    let status: String = row.try_get("status").map_err(StoreError::from_sqlx)?;
    Ok(Operation {
        id: row.try_get("id").map_err(StoreError::from_sqlx)?,
        op_type: parse_status(OperationType::parse(&op_type), "operation type", &op_type)?,
        material_id: row.try_get("material_id").map_err(StoreError::from_sqlx)?,
        slot_id: row.try_get("slot_id").map_err(StoreError::from_sqlx)?,
        operator_id: row.try_get("operator_id").map_err(StoreError::from_sqlx)?,
        shelf_id: row.try_get("shelf_id").map_err(StoreError::from_sqlx)?,
        timestamp: row.try_get("ts").map_err(StoreError::from_sqlx)?,
        status: parse_status(OperationStatus::parse(&status), "operation status", &status)?,
        reason: row.try_get("reason").map_err(StoreError::from_sqlx)?,
        reserve_duration_min: row
            .try_get("reserve_duration_min")
            .map_err(StoreError::from_sqlx)?,
        purpose: row.try_get("purpose").map_err(StoreError::from_sqlx)?,
    })
}

fn row_to_failed_event(row: &PgRow) -> Result<FailedEvent, StoreError> {
    Ok(FailedEvent {
        id: row.try_get("id").map_err(StoreError::from_sqlx)?,
        topic: row.try_get("topic").map_err(StoreError::from_sqlx)?,
        event_type: row.try_get("event_type").map_err(StoreError::from_sqlx)?,
        payload: row.try_get("payload").map_err(StoreError::from_sqlx)?,
        error: row.try_get("error").map_err(StoreError::from_sqlx)?,
        created_at: row.try_get("created_at").map_err(StoreError::from_sqlx)?,
        resolved: row.try_get("resolved").map_err(StoreError::from_sqlx)?,
        resolved_at: row.try_get("resolved_at").map_err(StoreError::from_sqlx)?,
        resolution_notes: row
            .try_get("resolution_notes")
            .map_err(StoreError::from_sqlx)?,
    })
}

// ---------------------------------------------------------------------------
// Shared queries (pool or transaction executor)
// ---------------------------------------------------------------------------

const SLOT_COLUMNS: &str = "id, shelf_id, row_idx, col_idx, status, material_id, updated_at, version";
const MATERIAL_COLUMNS: &str = "id, barcode, name, material_type, status, created_at, updated_at";
const OPERATION_COLUMNS: &str =
    "id, op_type, material_id, slot_id, operator_id, shelf_id, ts, status, reason, reserve_duration_min, purpose";

async fn fetch_slot_with<'e, E>(ex: E, id: &str) -> Result<Slot, StoreError>
where
    E: Executor<'e, Database = Postgres>,
{
    let row = sqlx::query(&format!("select {SLOT_COLUMNS} from slots where id = $1"))
        .bind(id)
        .fetch_one(ex)
        .await
        .map_err(StoreError::from_sqlx)?;
    row_to_slot(&row)
}

async fn fetch_material_with<'e, E>(ex: E, id: Uuid) -> Result<Material, StoreError>
where
    E: Executor<'e, Database = Postgres>,
{
    let row = sqlx::query(&format!(
        "select {MATERIAL_COLUMNS} from materials where id = $1"
    ))
    .bind(id)
    .fetch_one(ex)
    .await
    .map_err(StoreError::from_sqlx)?;
    row_to_material(&row)
}

async fn fetch_operation_with<'e, E>(ex: E, id: Uuid) -> Result<Operation, StoreError>
where
    E: Executor<'e, Database = Postgres>,
{
    let row = sqlx::query(&format!(
        "select {OPERATION_COLUMNS} from operations where id = $1"
    ))
    .bind(id)
    .fetch_one(ex)
    .await
    .map_err(StoreError::from_sqlx)?;
    row_to_operation(&row)
}

// ---------------------------------------------------------------------------
// InventoryStore (pool-level reads + unconditional writes)
// ---------------------------------------------------------------------------

#[async_trait]
impl InventoryStore for PgStore {
    async fn fetch_slot(&self, id: &str) -> Result<Slot, StoreError> {
        fetch_slot_with(&self.pool, id).await
    }

    async fn fetch_material(&self, id: Uuid) -> Result<Material, StoreError> {
        fetch_material_with(&self.pool, id).await
    }

    async fn fetch_material_by_barcode(&self, barcode: &str) -> Result<Material, StoreError> {
        let row = sqlx::query(&format!(
            "select {MATERIAL_COLUMNS} from materials where barcode = $1"
        ))
        .bind(barcode)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;
        row_to_material(&row)
    }

    async fn fetch_operation(&self, id: Uuid) -> Result<Operation, StoreError> {
        fetch_operation_with(&self.pool, id).await
    }

    async fn slots_for_shelf(&self, shelf_id: &str) -> Result<Vec<Slot>, StoreError> {
        let rows = sqlx::query(&format!(
            "select {SLOT_COLUMNS} from slots where shelf_id = $1 order by row_idx, col_idx"
        ))
        .bind(shelf_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;
        rows.iter().map(row_to_slot).collect()
    }

    async fn empty_slots_for_shelf(&self, shelf_id: &str) -> Result<Vec<Slot>, StoreError> {
        let rows = sqlx::query(&format!(
            "select {SLOT_COLUMNS} from slots \
             where shelf_id = $1 and status = 'empty' order by row_idx, col_idx"
        ))
        .bind(shelf_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;
        rows.iter().map(row_to_slot).collect()
    }

    async fn pending_ops_for_slot(
        &self,
        slot_id: &str,
        status: OperationStatus,
    ) -> Result<Vec<Operation>, StoreError> {
        let rows = sqlx::query(&format!(
            "select {OPERATION_COLUMNS} from operations \
             where slot_id = $1 and status = $2 order by ts"
        ))
        .bind(slot_id)
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;
        rows.iter().map(row_to_operation).collect()
    }

    async fn timed_out_pending(
        &self,
        status: OperationStatus,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Operation>, StoreError> {
        let rows = sqlx::query(&format!(
            "select {OPERATION_COLUMNS} from operations \
             where status = $1 and ts < $2 order by ts"
        ))
        .bind(status.as_str())
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;
        rows.iter().map(row_to_operation).collect()
    }

    async fn search_materials(
        &self,
        query: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Material>, StoreError> {
        let pattern = format!("%{}%", query.replace('%', "\\%").replace('_', "\\_"));
        let rows = sqlx::query(&format!(
            "select {MATERIAL_COLUMNS} from materials \
             where barcode ilike $1 or name ilike $1 \
             order by barcode limit $2 offset $3"
        ))
        .bind(pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;
        rows.iter().map(row_to_material).collect()
    }

    async fn list_operations(&self, limit: i64, offset: i64) -> Result<Vec<Operation>, StoreError> {
        let rows = sqlx::query(&format!(
            "select {OPERATION_COLUMNS} from operations \
             order by ts desc limit $1 offset $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;
        rows.iter().map(row_to_operation).collect()
    }

    async fn insert_alert(&self, alert: &Alert) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            insert into alerts (
              id, alert_type, shelf_id, slot_id, message, severity, status,
              created_at, updated_at, resolved_at, metadata
            ) values ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(alert.id)
        .bind(&alert.alert_type)
        .bind(&alert.shelf_id)
        .bind(&alert.slot_id)
        .bind(&alert.message)
        .bind(alert.severity.as_str())
        .bind(alert.status.as_str())
        .bind(alert.created_at)
        .bind(alert.updated_at)
        .bind(alert.resolved_at)
        .bind(&alert.metadata)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;
        Ok(())
    }

    async fn insert_failed_event(&self, event: &FailedEvent) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            insert into failed_events (
              id, topic, event_type, payload, error, created_at, resolved,
              resolved_at, resolution_notes
            ) values ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(event.id)
        .bind(&event.topic)
        .bind(&event.event_type)
        .bind(&event.payload)
        .bind(&event.error)
        .bind(event.created_at)
        .bind(event.resolved)
        .bind(event.resolved_at)
        .bind(&event.resolution_notes)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;
        Ok(())
    }

    async fn list_unresolved_failed_events(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<FailedEvent>, StoreError> {
        let rows = sqlx::query(
            r#"
            select id, topic, event_type, payload, error, created_at, resolved,
                   resolved_at, resolution_notes
            from failed_events
            where resolved = false
            order by created_at
            limit $1 offset $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;
        rows.iter().map(row_to_failed_event).collect()
    }

    async fn resolve_failed_event(&self, id: Uuid, notes: &str) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            update failed_events
               set resolved = true,
                   resolved_at = now(),
                   resolution_notes = $2
             where id = $1 and resolved = false
            "#,
        )
        .bind(id)
        .bind(notes)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn begin(&self) -> Result<Box<dyn InventoryTx>, StoreError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(StoreError::from_sqlx)?;
        Ok(Box::new(PgTx { tx }))
    }
}

// ---------------------------------------------------------------------------
// InventoryTx
// ---------------------------------------------------------------------------

pub struct PgTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl InventoryTx for PgTx {
    async fn fetch_slot(&mut self, id: &str) -> Result<Slot, StoreError> {
        fetch_slot_with(&mut *self.tx, id).await
    }

    async fn fetch_material(&mut self, id: Uuid) -> Result<Material, StoreError> {
        fetch_material_with(&mut *self.tx, id).await
    }

    async fn fetch_operation(&mut self, id: Uuid) -> Result<Operation, StoreError> {
        fetch_operation_with(&mut *self.tx, id).await
    }

    async fn update_slot(&mut self, slot: &Slot) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            update slots
               set status = $1,
                   material_id = $2,
                   updated_at = $3,
                   version = $4
             where id = $5 and version = $6
            "#,
        )
        .bind(slot.status.as_str())
        .bind(slot.material_id)
        .bind(slot.updated_at)
        .bind(slot.version)
        .bind(&slot.id)
        .bind(slot.version - 1)
        .execute(&mut *self.tx)
        .await
        .map_err(StoreError::from_sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::VersionConflict);
        }
        Ok(())
    }

    async fn update_material(&mut self, material: &Material) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            update materials
               set status = $1,
                   updated_at = $2
             where id = $3
            "#,
        )
        .bind(material.status.as_str())
        .bind(material.updated_at)
        .bind(material.id)
        .execute(&mut *self.tx)
        .await
        .map_err(StoreError::from_sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn insert_operation(&mut self, op: &Operation) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            insert into operations (
              id, op_type, material_id, slot_id, operator_id, shelf_id, ts,
              status, reason, reserve_duration_min, purpose
            ) values ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(op.id)
        .bind(op.op_type.as_str())
        .bind(op.material_id)
        .bind(&op.slot_id)
        .bind(&op.operator_id)
        .bind(&op.shelf_id)
        .bind(op.timestamp)
        .bind(op.status.as_str())
        .bind(&op.reason)
        .bind(op.reserve_duration_min)
        .bind(&op.purpose)
        .execute(&mut *self.tx)
        .await
        .map_err(StoreError::from_sqlx)?;
        Ok(())
    }

    async fn update_operation_status(
        &mut self,
        id: Uuid,
        from: OperationStatus,
        to: OperationStatus,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            update operations
               set status = $1,
                   ts = $2
             where id = $3 and status = $4
            "#,
        )
        .bind(to.as_str())
        .bind(at)
        .bind(id)
        .bind(from.as_str())
        .execute(&mut *self.tx)
        .await
        .map_err(StoreError::from_sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::VersionConflict);
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await.map_err(StoreError::from_sqlx)
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.rollback().await.map_err(StoreError::from_sqlx)
    }
}
