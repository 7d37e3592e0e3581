//! Sensor-event correlation and physical confirmation.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use wms_config::ServiceConfig;
use wms_db::{InventoryStore, StoreError};
use wms_domain::events::{
    self, MaterialDetected, MaterialPlaced, MaterialRemoved, PhysicalHandshake, UnplannedPlacement,
    UnplannedRemoval,
};
use wms_domain::{
    InventoryError, MaterialStatus, Operation, OperationStatus, SlotEvent, SlotStatus,
};
use wms_events::EventPublisher;
use wms_kv::{LeaseError, ShelfLock};

pub struct PhysicalReconciler {
    pub(crate) store: Arc<dyn InventoryStore>,
    pub(crate) lock: ShelfLock,
    pub(crate) publisher: Arc<EventPublisher>,
    pub(crate) cfg: ServiceConfig,
}

impl PhysicalReconciler {
    pub fn new(
        store: Arc<dyn InventoryStore>,
        lock: ShelfLock,
        publisher: Arc<EventPublisher>,
        cfg: ServiceConfig,
    ) -> Self {
        Self {
            store,
            lock,
            publisher,
            cfg,
        }
    }

    // ------------------------------------------------------------------
    // Correlator
    // ------------------------------------------------------------------

    /// A shelf sensor detected a barcode in a slot. If a placement on that
    /// slot is waiting for exactly this material, confirm it; anything else
    /// is an unplanned placement.
    pub async fn handle_material_detected(
        &self,
        shelf_id: &str,
        slot_id: &str,
        barcode: &str,
    ) -> Result<(), InventoryError> {
        self.emit(
            events::MATERIAL_DETECTED,
            shelf_id,
            MaterialDetected {
                slot_id: slot_id.to_string(),
                shelf_id: shelf_id.to_string(),
                material_barcode: barcode.to_string(),
            },
        )
        .await;

        let pending = self
            .store
            .pending_ops_for_slot(slot_id, OperationStatus::PendingPhysicalConfirmation)
            .await?;

        // Correlation is by barcode: resolve to a material first, then match
        // on material identity.
        let material = match self.store.fetch_material_by_barcode(barcode).await {
            Ok(material) => Some(material),
            Err(StoreError::NotFound) => None,
            Err(err) => return Err(err.into()),
        };

        let matched = material.as_ref().and_then(|m| {
            pending
                .iter()
                .find(|op| op.material_id == Some(m.id))
                .cloned()
        });

        match matched {
            Some(op) => self.confirm_physical_placement(op.id).await,
            None => {
                info!(slot_id, barcode, "detection with no matching pending placement");
                self.emit(
                    events::UNPLANNED_PLACEMENT,
                    shelf_id,
                    UnplannedPlacement {
                        slot_id: slot_id.to_string(),
                        shelf_id: shelf_id.to_string(),
                        material_barcode: barcode.to_string(),
                    },
                )
                .await;
                Ok(())
            }
        }
    }

    /// A shelf sensor reported a slot went empty. If a removal on that slot
    /// is waiting for confirmation, finalize it; otherwise record the event
    /// as unplanned and leave the slot untouched.
    pub async fn handle_material_removed(
        &self,
        shelf_id: &str,
        slot_id: &str,
    ) -> Result<(), InventoryError> {
        let pending = self
            .store
            .pending_ops_for_slot(slot_id, OperationStatus::PendingRemovalConfirmation)
            .await?;

        match pending.into_iter().next() {
            Some(op) => self.confirm_physical_removal(op.id).await,
            None => {
                info!(slot_id, "removal with no matching pending operation");
                self.emit(
                    events::UNPLANNED_REMOVAL,
                    shelf_id,
                    UnplannedRemoval {
                        slot_id: slot_id.to_string(),
                        shelf_id: shelf_id.to_string(),
                    },
                )
                .await;
                Ok(())
            }
        }
    }

    // ------------------------------------------------------------------
    // Confirmation
    // ------------------------------------------------------------------

    /// Advance a pending placement to completed. The slot and material rows
    /// are already in their terminal states; only the operation moves.
    pub async fn confirm_physical_placement(&self, op_id: uuid::Uuid) -> Result<(), InventoryError> {
        let op = self.load_operation(op_id).await?;

        let lease = self
            .lock
            .acquire(&op.shelf_id, self.cfg.lease_ttl)
            .await
            .map_err(map_lease)?;
        let result = self.confirm_placement_locked(&op).await;
        lease.release().await;
        result
    }

    async fn confirm_placement_locked(&self, op: &Operation) -> Result<(), InventoryError> {
        let now = Utc::now();
        let mut tx = self.begin().await?;
        let staged = tx
            .update_operation_status(
                op.id,
                OperationStatus::PendingPhysicalConfirmation,
                OperationStatus::Completed,
                now,
            )
            .await;
        self.finish(tx, staged)
            .await
            .map_err(already_confirmed)?;

        let handshake = PhysicalHandshake {
            operation_id: op.id,
            material_id: op.material_id.unwrap_or_default(),
            slot_id: op.slot_id.clone(),
            shelf_id: op.shelf_id.clone(),
            operator_id: op.operator_id.clone(),
        };
        self.emit(events::PHYSICAL_PLACEMENT_CONFIRMED, &op.shelf_id, handshake)
            .await;
        if let Some(material_id) = op.material_id {
            self.emit(
                events::MATERIAL_PLACED,
                &op.shelf_id,
                MaterialPlaced {
                    material_id,
                    slot_id: op.slot_id.clone(),
                    shelf_id: op.shelf_id.clone(),
                    operator_id: op.operator_id.clone(),
                },
            )
            .await;
        }

        info!(operation_id = %op.id, slot_id = %op.slot_id, "physical placement confirmed");
        Ok(())
    }

    /// Finalize a pending removal: free the slot, release the material,
    /// complete the operation, all in one transaction under the shelf lease.
    pub async fn confirm_physical_removal(&self, op_id: uuid::Uuid) -> Result<(), InventoryError> {
        let op = self.load_operation(op_id).await?;

        let lease = self
            .lock
            .acquire(&op.shelf_id, self.cfg.lease_ttl)
            .await
            .map_err(map_lease)?;
        let result = self.confirm_removal_locked(&op).await;
        lease.release().await;
        result
    }

    async fn confirm_removal_locked(&self, op: &Operation) -> Result<(), InventoryError> {
        let now = Utc::now();
        let mut tx = self.begin().await?;

        let staged = async {
            tx.update_operation_status(
                op.id,
                OperationStatus::PendingRemovalConfirmation,
                OperationStatus::Completed,
                now,
            )
            .await?;

            let mut slot = tx.fetch_slot(&op.slot_id).await?;
            if slot.status != SlotStatus::RemovalPending {
                return Err(StoreError::VersionConflict);
            }
            slot.apply(SlotEvent::ConfirmRemoval, now)
                .map_err(|_| StoreError::VersionConflict)?;
            slot.material_id = None;
            tx.update_slot(&slot).await?;

            if let Some(material_id) = op.material_id {
                let mut material = tx.fetch_material(material_id).await?;
                material.status = MaterialStatus::Available;
                material.updated_at = now;
                tx.update_material(&material).await?;
            }
            Ok::<(), StoreError>(())
        }
        .await;
        self.finish(tx, staged)
            .await
            .map_err(already_confirmed)?;

        self.emit(
            events::PHYSICAL_REMOVAL_CONFIRMED,
            &op.shelf_id,
            PhysicalHandshake {
                operation_id: op.id,
                material_id: op.material_id.unwrap_or_default(),
                slot_id: op.slot_id.clone(),
                shelf_id: op.shelf_id.clone(),
                operator_id: op.operator_id.clone(),
            },
        )
        .await;
        if let Some(material_id) = op.material_id {
            self.emit(
                events::MATERIAL_REMOVED,
                &op.shelf_id,
                MaterialRemoved {
                    material_id,
                    slot_id: op.slot_id.clone(),
                    shelf_id: op.shelf_id.clone(),
                    operator_id: op.operator_id.clone(),
                    reason: op.reason.clone(),
                },
            )
            .await;
        }

        info!(operation_id = %op.id, slot_id = %op.slot_id, "physical removal confirmed");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Shared plumbing
    // ------------------------------------------------------------------

    pub(crate) async fn load_operation(
        &self,
        op_id: uuid::Uuid,
    ) -> Result<Operation, InventoryError> {
        match self.store.fetch_operation(op_id).await {
            Ok(op) => Ok(op),
            Err(StoreError::NotFound) => Err(InventoryError::not_found("operation not found")),
            Err(err) => Err(err.into()),
        }
    }

    pub(crate) async fn begin(
        &self,
    ) -> Result<Box<dyn wms_db::InventoryTx>, InventoryError> {
        self.store
            .begin()
            .await
            .map_err(|err| InventoryError::internal_with("failed to start transaction", err))
    }

    pub(crate) async fn finish(
        &self,
        tx: Box<dyn wms_db::InventoryTx>,
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
}

/// A guarded operation advance that matched zero rows means another writer
/// confirmed or failed the operation first.
fn already_confirmed(err: InventoryError) -> InventoryError {
    match err {
        InventoryError::Conflict { .. } => {
            InventoryError::conflict("operation is no longer pending")
        }
        other => other,
    }
}

pub(crate) fn map_lease(err: LeaseError) -> InventoryError {
    match err {
        LeaseError::Held { shelf_id } => {
            InventoryError::conflict(format!("shelf {shelf_id} is locked by another writer"))
        }
        LeaseError::Store(cause) => InventoryError::internal_with("lease store unavailable", cause),
    }
}
