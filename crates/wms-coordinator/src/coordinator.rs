//! Command implementations.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};

use wms_config::ServiceConfig;
use wms_db::{InventoryStore, InventoryTx, StoreError};
use wms_domain::events::{
    self, AuditLog, MaterialMoved, PhysicalHandshake, SystemAlert,
};
use wms_domain::{
    Alert, AlertSeverity, InventoryError, Material, MaterialStatus, Operation, OperationStatus,
    OperationType, Slot, SlotEvent, SlotStatus,
};
use wms_events::EventPublisher;
use wms_kv::{AdminShelfStatus, Lease, LeaseError, ShelfCache, ShelfLock};

use crate::commands::{
    BatchPlaceOutcome, HandleSlotError, MoveMaterial, PlaceMaterial, PlacementReceipt,
    RemoveMaterial, ReserveSlots, SensorReading,
};

/// Weight readings outside this band (grams) trigger a manual-verification
/// alert without failing the command.
const MAX_PLAUSIBLE_WEIGHT_G: f64 = 500_000.0;

pub struct InventoryCoordinator {
    pub(crate) store: Arc<dyn InventoryStore>,
    pub(crate) lock: ShelfLock,
    pub(crate) cache: ShelfCache,
    pub(crate) publisher: Arc<EventPublisher>,
    pub(crate) cfg: ServiceConfig,
}

impl InventoryCoordinator {
    pub fn new(
        store: Arc<dyn InventoryStore>,
        lock: ShelfLock,
        cache: ShelfCache,
        publisher: Arc<EventPublisher>,
        cfg: ServiceConfig,
    ) -> Self {
        Self {
            store,
            lock,
            cache,
            publisher,
            cfg,
        }
    }

    // ------------------------------------------------------------------
    // PlaceMaterial
    // ------------------------------------------------------------------

    /// Logical placement: slot → occupied, material → in-use, operation left
    /// in `PendingPhysicalConfirmation` for the sensor handshake.
    pub async fn place_material(
        &self,
        cmd: PlaceMaterial,
    ) -> Result<PlacementReceipt, InventoryError> {
        cmd.validate()?;

        let slot = self.load_slot(&cmd.slot_id).await?;
        let lease = self.acquire(&slot.shelf_id, false).await?;
        let result = self.place_locked(&cmd).await;
        lease.release().await;

        match &result {
            Ok(receipt) => {
                self.check_weight_anomaly(&cmd, receipt).await;
                self.audit_success("place_material", receipt.material_id.to_string(), &cmd.operator_id,
                    json!({"slot_id": receipt.slot_id, "shelf_id": receipt.shelf_id}))
                    .await;
            }
            Err(err) => self.audit_failure("place_material", &cmd.operator_id, err).await,
        }
        result
    }

    async fn place_locked(&self, cmd: &PlaceMaterial) -> Result<PlacementReceipt, InventoryError> {
        // Re-validate under the lease: the rows may have moved while we
        // were queueing for the shelf.
        let mut slot = self.load_slot(&cmd.slot_id).await?;
        if slot.status != SlotStatus::Empty {
            return Err(InventoryError::conflict("slot is not available"));
        }

        let mut material = self.load_material_by_barcode(&cmd.material_barcode).await?;
        if material.status != MaterialStatus::Available {
            return Err(InventoryError::conflict("material is not available"));
        }

        let now = Utc::now();
        slot.apply(SlotEvent::Place, now)
            .map_err(|err| InventoryError::conflict_with("slot is not available", err))?;
        slot.material_id = Some(material.id);
        material.status = MaterialStatus::InUse;
        material.updated_at = now;

        let op = Operation::new(
            OperationType::Placement,
            Some(material.id),
            &slot.id,
            &cmd.operator_id,
            &slot.shelf_id,
            OperationStatus::PendingPhysicalConfirmation,
            now,
        );

        let mut tx = self.begin().await?;
        let staged = async {
            tx.update_slot(&slot).await?;
            tx.update_material(&material).await?;
            tx.insert_operation(&op).await?;
            Ok::<(), StoreError>(())
        }
        .await;
        self.finish(tx, staged).await?;

        self.emit(
            events::PHYSICAL_PLACEMENT_REQUESTED,
            &slot.shelf_id,
            PhysicalHandshake {
                operation_id: op.id,
                material_id: material.id,
                slot_id: slot.id.clone(),
                shelf_id: slot.shelf_id.clone(),
                operator_id: cmd.operator_id.clone(),
            },
        )
        .await;

        info!(slot_id = %slot.id, barcode = %cmd.material_barcode, operation_id = %op.id,
              "placement committed, awaiting physical confirmation");

        Ok(PlacementReceipt {
            operation_id: op.id,
            material_id: material.id,
            slot_id: slot.id,
            shelf_id: slot.shelf_id,
            slot_version: slot.version,
        })
    }

    // ------------------------------------------------------------------
    // RemoveMaterial
    // ------------------------------------------------------------------

    /// Logical removal: slot → removal-pending. The material reference is
    /// kept so a missed physical confirmation can be rolled back.
    pub async fn remove_material(&self, cmd: RemoveMaterial) -> Result<uuid::Uuid, InventoryError> {
        cmd.validate()?;

        let slot = self.load_slot(&cmd.slot_id).await?;
        if slot.status != SlotStatus::Occupied {
            return Err(InventoryError::conflict("slot is not occupied"));
        }

        let lease = self.acquire(&slot.shelf_id, false).await?;
        let result = self.remove_locked(&cmd).await;
        lease.release().await;

        match &result {
            Ok(op_id) => {
                self.audit_success("remove_material", op_id.to_string(), &cmd.operator_id,
                    json!({"slot_id": cmd.slot_id}))
                    .await
            }
            Err(err) => self.audit_failure("remove_material", &cmd.operator_id, err).await,
        }
        result
    }

    async fn remove_locked(&self, cmd: &RemoveMaterial) -> Result<uuid::Uuid, InventoryError> {
        let mut slot = self.load_slot(&cmd.slot_id).await?;
        if slot.status != SlotStatus::Occupied {
            return Err(InventoryError::conflict("slot is not occupied"));
        }
        let material_id = slot
            .material_id
            .ok_or_else(|| InventoryError::internal("occupied slot has no material reference"))?;

        let now = Utc::now();
        slot.apply(SlotEvent::Remove, now)
            .map_err(|err| InventoryError::conflict_with("slot is not occupied", err))?;

        let mut op = Operation::new(
            OperationType::Removal,
            Some(material_id),
            &slot.id,
            &cmd.operator_id,
            &slot.shelf_id,
            OperationStatus::PendingRemovalConfirmation,
            now,
        );
        op.reason = cmd.reason.clone();

        let mut tx = self.begin().await?;
        let staged = async {
            tx.update_slot(&slot).await?;
            tx.insert_operation(&op).await?;
            Ok::<(), StoreError>(())
        }
        .await;
        self.finish(tx, staged).await?;

        self.emit(
            events::PHYSICAL_REMOVAL_REQUESTED,
            &slot.shelf_id,
            PhysicalHandshake {
                operation_id: op.id,
                material_id,
                slot_id: slot.id.clone(),
                shelf_id: slot.shelf_id.clone(),
                operator_id: cmd.operator_id.clone(),
            },
        )
        .await;

        info!(slot_id = %slot.id, operation_id = %op.id,
              "removal committed, awaiting physical confirmation");
        Ok(op.id)
    }

    // ------------------------------------------------------------------
    // MoveMaterial
    // ------------------------------------------------------------------

    /// Synchronous move: both slots change in one transaction, no pending
    /// state. Leases on both shelves, taken in ascending id order.
    pub async fn move_material(&self, cmd: MoveMaterial) -> Result<uuid::Uuid, InventoryError> {
        cmd.validate()?;

        let from = self.load_slot(&cmd.from_slot_id).await?;
        let to = self.load_slot(&cmd.to_slot_id).await?;
        if from.status != SlotStatus::Occupied {
            return Err(InventoryError::conflict("source slot is not occupied"));
        }
        if to.status != SlotStatus::Empty {
            return Err(InventoryError::conflict("target slot is not empty"));
        }

        let leases = self
            .lock
            .acquire_many(
                [from.shelf_id.clone(), to.shelf_id.clone()],
                self.cfg.lease_ttl,
            )
            .await
            .map_err(map_lease)?;
        let result = self.move_locked(&cmd).await;
        wms_kv::lease::release_all(leases).await;

        match &result {
            Ok(op_id) => {
                self.audit_success("move_material", op_id.to_string(), &cmd.operator_id,
                    json!({"from_slot_id": cmd.from_slot_id, "to_slot_id": cmd.to_slot_id}))
                    .await
            }
            Err(err) => self.audit_failure("move_material", &cmd.operator_id, err).await,
        }
        result
    }

    async fn move_locked(&self, cmd: &MoveMaterial) -> Result<uuid::Uuid, InventoryError> {
        let mut from = self.load_slot(&cmd.from_slot_id).await?;
        let mut to = self.load_slot(&cmd.to_slot_id).await?;
        if from.status != SlotStatus::Occupied {
            return Err(InventoryError::conflict("source slot is not occupied"));
        }
        if to.status != SlotStatus::Empty {
            return Err(InventoryError::conflict("target slot is not empty"));
        }
        let material_id = from
            .material_id
            .ok_or_else(|| InventoryError::internal("occupied slot has no material reference"))?;

        let now = Utc::now();
        from.apply(SlotEvent::MoveOut, now)
            .map_err(|err| InventoryError::conflict_with("source slot is not occupied", err))?;
        from.material_id = None;
        to.apply(SlotEvent::MoveIn, now)
            .map_err(|err| InventoryError::conflict_with("target slot is not empty", err))?;
        to.material_id = Some(material_id);

        let mut op = Operation::new(
            OperationType::Move,
            Some(material_id),
            &to.id,
            &cmd.operator_id,
            &to.shelf_id,
            OperationStatus::Completed,
            now,
        );
        op.reason = cmd.reason.clone();

        let mut tx = self.begin().await?;
        let staged = async {
            tx.update_slot(&from).await?;
            tx.update_slot(&to).await?;
            tx.insert_operation(&op).await?;
            Ok::<(), StoreError>(())
        }
        .await;
        self.finish(tx, staged).await?;

        self.emit(
            events::MATERIAL_MOVED,
            &to.shelf_id,
            MaterialMoved {
                material_id,
                from_slot_id: from.id.clone(),
                to_slot_id: to.id.clone(),
                shelf_id: to.shelf_id.clone(),
                operator_id: cmd.operator_id.clone(),
            },
        )
        .await;

        info!(from = %from.id, to = %to.id, operation_id = %op.id, "move committed");
        Ok(op.id)
    }

    // ------------------------------------------------------------------
    // ReserveSlots
    // ------------------------------------------------------------------

    /// Reserve a set of empty slots in one transaction. Any per-slot
    /// conflict rolls the whole reservation back.
    pub async fn reserve_slots(&self, cmd: ReserveSlots) -> Result<Vec<uuid::Uuid>, InventoryError> {
        cmd.validate()?;

        let mut shelf_ids = Vec::new();
        for slot_id in &cmd.slot_ids {
            let slot = self.load_slot(slot_id).await?;
            shelf_ids.push(slot.shelf_id);
        }

        let leases = self
            .lock
            .acquire_many(shelf_ids, self.cfg.batch_lease_ttl)
            .await
            .map_err(map_lease)?;
        let result = self.reserve_locked(&cmd).await;
        wms_kv::lease::release_all(leases).await;

        match &result {
            Ok(op_ids) => {
                self.audit_success("reserve_slots", format!("{} slots", op_ids.len()),
                    &cmd.operator_id, json!({"slot_ids": cmd.slot_ids, "purpose": cmd.purpose}))
                    .await
            }
            Err(err) => self.audit_failure("reserve_slots", &cmd.operator_id, err).await,
        }
        result
    }

    async fn reserve_locked(&self, cmd: &ReserveSlots) -> Result<Vec<uuid::Uuid>, InventoryError> {
        let now = Utc::now();
        let mut tx = self.begin().await?;

        let mut op_ids = Vec::with_capacity(cmd.slot_ids.len());
        let staged = async {
            for slot_id in &cmd.slot_ids {
                let mut slot = tx.fetch_slot(slot_id).await?;
                if slot.status != SlotStatus::Empty {
                    return Err(StoreError::VersionConflict);
                }
                slot.apply(SlotEvent::Reserve, now)
                    .map_err(|_| StoreError::VersionConflict)?;
                tx.update_slot(&slot).await?;

                let mut op = Operation::new(
                    OperationType::Reservation,
                    None,
                    slot_id.as_str(),
                    &cmd.operator_id,
                    &slot.shelf_id,
                    OperationStatus::Completed,
                    now,
                );
                op.reserve_duration_min = Some(cmd.duration);
                op.purpose = Some(cmd.purpose.clone());
                tx.insert_operation(&op).await?;
                op_ids.push(op.id);
            }
            Ok::<(), StoreError>(())
        }
        .await;

        self.finish(tx, staged)
            .await
            .map_err(|err| match err {
                InventoryError::Conflict { .. } => {
                    InventoryError::conflict("one or more slots are not empty")
                }
                other => other,
            })?;

        Ok(op_ids)
    }

    // ------------------------------------------------------------------
    // BatchPlaceMaterials
    // ------------------------------------------------------------------

    /// Group placements by shelf and commit each shelf's group in one
    /// transaction under that shelf's lease, shelves in ascending id order.
    /// A failing shelf aborts the batch; shelves already committed stand.
    pub async fn batch_place_materials(
        &self,
        commands: Vec<PlaceMaterial>,
    ) -> Result<BatchPlaceOutcome, InventoryError> {
        if commands.is_empty() {
            return Err(InventoryError::validation("batch must not be empty"));
        }
        for cmd in &commands {
            cmd.validate()?;
        }
        let operator_id = commands[0].operator_id.clone();

        // Group by owning shelf, ordered by shelf id.
        let mut groups: std::collections::BTreeMap<String, Vec<PlaceMaterial>> =
            std::collections::BTreeMap::new();
        for cmd in commands {
            let slot = self.load_slot(&cmd.slot_id).await?;
            groups.entry(slot.shelf_id).or_default().push(cmd);
        }

        let mut outcome = BatchPlaceOutcome {
            placed: Vec::new(),
            shelves_committed: Vec::new(),
        };

        for (shelf_id, group) in groups {
            let lease = self.acquire(&shelf_id, true).await?;
            let result = self.place_group_locked(&shelf_id, &group).await;
            lease.release().await;

            match result {
                Ok(receipts) => {
                    outcome.placed.extend(receipts);
                    outcome.shelves_committed.push(shelf_id);
                }
                Err(err) => {
                    self.audit_failure("batch_place_materials", &group[0].operator_id, &err)
                        .await;
                    return Err(err);
                }
            }
        }

        self.audit_success(
            "batch_place_materials",
            format!("{} placements", outcome.placed.len()),
            &operator_id,
            json!({"shelves": outcome.shelves_committed}),
        )
        .await;

        Ok(outcome)
    }

    /// All-or-nothing placement of one shelf's group.
    async fn place_group_locked(
        &self,
        shelf_id: &str,
        group: &[PlaceMaterial],
    ) -> Result<Vec<PlacementReceipt>, InventoryError> {
        let now = Utc::now();
        let mut tx = self.begin().await?;

        let mut receipts = Vec::with_capacity(group.len());
        let mut handshakes = Vec::with_capacity(group.len());
        let staged = async {
            for cmd in group {
                let mut slot = tx.fetch_slot(&cmd.slot_id).await?;
                if slot.status != SlotStatus::Empty {
                    return Err(StoreError::VersionConflict);
                }
                let mut material = match self
                    .store
                    .fetch_material_by_barcode(&cmd.material_barcode)
                    .await
                {
                    Ok(m) => m,
                    Err(err) => return Err(err),
                };
                if material.status != MaterialStatus::Available {
                    return Err(StoreError::VersionConflict);
                }

                slot.apply(SlotEvent::Place, now)
                    .map_err(|_| StoreError::VersionConflict)?;
                slot.material_id = Some(material.id);
                material.status = MaterialStatus::InUse;
                material.updated_at = now;

                let op = Operation::new(
                    OperationType::Placement,
                    Some(material.id),
                    &slot.id,
                    &cmd.operator_id,
                    shelf_id,
                    OperationStatus::PendingPhysicalConfirmation,
                    now,
                );

                tx.update_slot(&slot).await?;
                tx.update_material(&material).await?;
                tx.insert_operation(&op).await?;

                handshakes.push(PhysicalHandshake {
                    operation_id: op.id,
                    material_id: material.id,
                    slot_id: slot.id.clone(),
                    shelf_id: shelf_id.to_string(),
                    operator_id: cmd.operator_id.clone(),
                });
                receipts.push(PlacementReceipt {
                    operation_id: op.id,
                    material_id: material.id,
                    slot_id: slot.id.clone(),
                    shelf_id: shelf_id.to_string(),
                    slot_version: slot.version,
                });
            }
            Ok::<(), StoreError>(())
        }
        .await;
        self.finish(tx, staged).await?;

        for handshake in handshakes {
            self.emit(events::PHYSICAL_PLACEMENT_REQUESTED, shelf_id, handshake)
                .await;
        }

        Ok(receipts)
    }

    // ------------------------------------------------------------------
    // HandleSlotError
    // ------------------------------------------------------------------

    /// Always records a high-severity alert; sensor faults additionally pull
    /// the slot out of circulation under the shelf lease.
    pub async fn handle_slot_error(&self, cmd: HandleSlotError) -> Result<(), InventoryError> {
        cmd.validate()?;

        let slot = self.load_slot(&cmd.slot_id).await?;
        let now = Utc::now();

        let alert = Alert::new(
            "slot_error",
            format!("slot error: {}", cmd.error_type),
            AlertSeverity::High,
            now,
        )
        .for_slot(&slot.shelf_id, &slot.id);
        if let Err(err) = self.store.insert_alert(&alert).await {
            warn!(slot_id = %slot.id, error = %err, "failed to record slot error alert");
        }

        match cmd.error_type.as_str() {
            "sensor_error" => self.mark_slot_maintenance(&slot).await,
            "weight_mismatch" => {
                self.emit_system_alert(
                    "manual_verification_required",
                    AlertSeverity::High,
                    format!("slot {} reported a weight mismatch", slot.id),
                    json!({"slot_id": slot.id, "shelf_id": slot.shelf_id}),
                )
                .await;
                Ok(())
            }
            other => {
                self.emit_system_alert(
                    "investigation",
                    AlertSeverity::High,
                    format!("slot {} reported an unrecognized error: {other}", slot.id),
                    json!({"slot_id": slot.id, "shelf_id": slot.shelf_id, "error_type": other}),
                )
                .await;
                Ok(())
            }
        }
    }

    async fn mark_slot_maintenance(&self, slot: &Slot) -> Result<(), InventoryError> {
        let lease = self.acquire(&slot.shelf_id, false).await?;
        let result = async {
            let mut slot = self.load_slot(&slot.id).await?;
            if slot.status == SlotStatus::Maintenance {
                return Ok(());
            }
            let now = Utc::now();
            slot.apply(SlotEvent::Maintenance, now)
                .map_err(|err| InventoryError::conflict_with("slot cannot enter maintenance", err))?;

            let mut tx = self.begin().await?;
            let staged = tx.update_slot(&slot).await;
            self.finish(tx, staged).await
        }
        .await;
        lease.release().await;
        result
    }

    // ------------------------------------------------------------------
    // UpdateShelfStatus
    // ------------------------------------------------------------------

    /// Cache-layer write only; emits `shelf.status_changed` when the cached
    /// status actually changes.
    pub async fn update_shelf_status(
        &self,
        shelf_id: &str,
        status: &str,
    ) -> Result<(), InventoryError> {
        if !matches!(status, "online" | "offline" | "maintenance") {
            return Err(InventoryError::validation(format!(
                "unknown shelf status: {status}"
            )));
        }

        let old = self.cache.admin_status(shelf_id).await;
        self.cache
            .store_admin_status(
                shelf_id,
                &AdminShelfStatus {
                    status: status.to_string(),
                    updated_at: Utc::now(),
                },
            )
            .await;

        let old_status = old.map(|s| s.status).unwrap_or_else(|| "unknown".to_string());
        if old_status != status {
            self.emit(
                events::SHELF_STATUS_CHANGED,
                shelf_id,
                events::ShelfStatusChanged {
                    shelf_id: shelf_id.to_string(),
                    old_status,
                    new_status: status.to_string(),
                },
            )
            .await;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Shared plumbing
    // ------------------------------------------------------------------

    pub(crate) async fn load_slot(&self, slot_id: &str) -> Result<Slot, InventoryError> {
        match self.store.fetch_slot(slot_id).await {
            Ok(slot) => Ok(slot),
            Err(StoreError::NotFound) => Err(InventoryError::not_found("slot not found")),
            Err(err) => Err(err.into()),
        }
    }

    pub(crate) async fn load_material_by_barcode(
        &self,
        barcode: &str,
    ) -> Result<Material, InventoryError> {
        match self.store.fetch_material_by_barcode(barcode).await {
            Ok(material) => Ok(material),
            Err(StoreError::NotFound) => Err(InventoryError::not_found("material not found")),
            Err(err) => Err(err.into()),
        }
    }

    async fn acquire(&self, shelf_id: &str, batch: bool) -> Result<Lease, InventoryError> {
        let ttl = if batch {
            self.cfg.batch_lease_ttl
        } else {
            self.cfg.lease_ttl
        };
        self.lock.acquire(shelf_id, ttl).await.map_err(map_lease)
    }

    pub(crate) async fn begin(&self) -> Result<Box<dyn InventoryTx>, InventoryError> {
        self.store
            .begin()
            .await
            .map_err(|err| InventoryError::internal_with("failed to start transaction", err))
    }

    /// Commit on success, roll back on a staged error; map the outcome.
    pub(crate) async fn finish(
        &self,
        tx: Box<dyn InventoryTx>,
        staged: Result<(), StoreError>,
    ) -> Result<(), InventoryError> {
        match staged {
            Ok(()) => tx
                .commit()
                .await
                .map_err(|err| InventoryError::internal_with("failed to commit transaction", err)),
            Err(err) => {
                if let Err(rb) = tx.rollback().await {
                    warn!(error = %rb, "transaction rollback failed");
                }
                Err(err.into())
            }
        }
    }

    /// Event emission never fails a committed command; a lost event is
    /// already dead-lettered by the publisher.
    pub(crate) async fn emit<T: serde::Serialize>(
        &self,
        event_type: &str,
        partition_key: &str,
        payload: T,
    ) {
        if let Err(err) = self.publisher.publish(event_type, partition_key, payload).await {
            warn!(event_type, error = %err, "event lost after dead-letter failure");
        }
    }

    pub(crate) async fn emit_system_alert(
        &self,
        alert_type: &str,
        severity: AlertSeverity,
        message: String,
        metadata: serde_json::Value,
    ) {
        self.emit(
            events::SYSTEM_ALERT,
            events::SYSTEM_ALERT,
            SystemAlert {
                alert_type: alert_type.to_string(),
                severity: severity.as_str().to_string(),
                message,
                metadata,
            },
        )
        .await;
    }

    async fn audit_success(
        &self,
        action: &str,
        entity_id: String,
        operator_id: &str,
        metadata: serde_json::Value,
    ) {
        self.emit(
            events::AUDIT_LOG,
            events::AUDIT_LOG,
            AuditLog {
                action: action.to_string(),
                entity_type: "material".to_string(),
                entity_id: Some(entity_id),
                operator_id: Some(operator_id.to_string()),
                success: true,
                error_message: None,
                metadata,
            },
        )
        .await;
    }

    async fn audit_failure(&self, action: &str, operator_id: &str, err: &InventoryError) {
        self.emit(
            events::AUDIT_LOG,
            events::AUDIT_LOG,
            AuditLog {
                action: action.to_string(),
                entity_type: "material".to_string(),
                entity_id: None,
                operator_id: Some(operator_id.to_string()),
                success: false,
                error_message: Some(err.to_string()),
                metadata: serde_json::Value::Null,
            },
        )
        .await;
    }

    async fn check_weight_anomaly(&self, cmd: &PlaceMaterial, receipt: &PlacementReceipt) {
        let Some(SensorReading { weight: Some(weight), .. }) = cmd.sensor_data.clone() else {
            return;
        };
        if weight > 0.0 && weight < MAX_PLAUSIBLE_WEIGHT_G {
            return;
        }
        self.emit_system_alert(
            "implausible_weight",
            AlertSeverity::Medium,
            format!(
                "slot {} reported implausible weight {weight}g at placement",
                receipt.slot_id
            ),
            json!({"slot_id": receipt.slot_id, "operation_id": receipt.operation_id}),
        )
        .await;
    }
}

pub(crate) fn map_lease(err: LeaseError) -> InventoryError {
    match err {
        LeaseError::Held { shelf_id } => {
            InventoryError::conflict(format!("shelf {shelf_id} is locked by another writer"))
        }
        LeaseError::Store(cause) => {
            InventoryError::internal_with("lease store unavailable", cause)
        }
    }
}
