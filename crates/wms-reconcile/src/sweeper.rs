//! Timeout sweeper: rolls back pending operations whose sensor handshake
//! never arrived.
//!
//! Runs as a single long-lived task. Each tick issues the two stale-pending
//! queries and compensates every hit under its shelf's lease. A version or
//! status conflict during a rollback means another writer moved first; the
//! rollback is cancelled and the next tick sees whatever remains. Shutdown
//! is honored between iterations, never inside a rollback.

use chrono::{Duration as ChronoDuration, Utc};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use wms_db::StoreError;
use wms_domain::events::{self, PhysicalHandshake};
use wms_domain::{
    InventoryError, MaterialStatus, Operation, OperationStatus, SlotEvent, SlotStatus,
};

use crate::reconciler::{map_lease, PhysicalReconciler};

/// What one sweep pass did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepReport {
    pub placements_rolled_back: usize,
    pub removals_rolled_back: usize,
    /// Rollbacks cancelled because another writer won the race; retried on
    /// the next tick.
    pub skipped: usize,
}

impl PhysicalReconciler {
    /// Tick until `shutdown` flips true.
    pub async fn run_sweeper(&self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.cfg.timeout_check_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first interval tick fires immediately; skip it so a fresh boot
        // does not sweep before the service finishes wiring.
        ticker.tick().await;

        info!(
            interval_secs = self.cfg.timeout_check_interval.as_secs(),
            timeout_secs = self.cfg.physical_operation_timeout.as_secs(),
            "timeout sweeper started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.sweep_once().await {
                        Ok(report) if report != SweepReport::default() => {
                            info!(
                                placements = report.placements_rolled_back,
                                removals = report.removals_rolled_back,
                                skipped = report.skipped,
                                "sweep pass compensated stale operations"
                            );
                        }
                        Ok(_) => {}
                        Err(err) => warn!(error = %err, "sweep pass failed"),
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("timeout sweeper stopping");
                        return;
                    }
                }
            }
        }
    }

    /// One sweep pass over both pending-confirmation queues.
    pub async fn sweep_once(&self) -> Result<SweepReport, InventoryError> {
        let timeout = ChronoDuration::from_std(self.cfg.physical_operation_timeout)
            .map_err(|err| InventoryError::internal_with("invalid timeout configuration", err))?;
        let cutoff = Utc::now() - timeout;
        let mut report = SweepReport::default();

        let stale_placements = self
            .store
            .timed_out_pending(OperationStatus::PendingPhysicalConfirmation, cutoff)
            .await?;
        for op in stale_placements {
            match self.rollback_placement(&op).await {
                Ok(()) => report.placements_rolled_back += 1,
                Err(err) => {
                    warn!(operation_id = %op.id, error = %err, "placement rollback skipped");
                    report.skipped += 1;
                }
            }
        }

        let stale_removals = self
            .store
            .timed_out_pending(OperationStatus::PendingRemovalConfirmation, cutoff)
            .await?;
        for op in stale_removals {
            match self.rollback_removal(&op).await {
                Ok(()) => report.removals_rolled_back += 1,
                Err(err) => {
                    warn!(operation_id = %op.id, error = %err, "removal rollback skipped");
                    report.skipped += 1;
                }
            }
        }

        Ok(report)
    }

    /// Undo a placement that never got its sensor confirmation: slot back to
    /// empty, material back to available, operation failed.
    async fn rollback_placement(&self, op: &Operation) -> Result<(), InventoryError> {
        let lease = self
            .lock
            .acquire(&op.shelf_id, self.cfg.lease_ttl)
            .await
            .map_err(map_lease)?;
        let result = self.rollback_placement_locked(op).await;
        lease.release().await;
        result
    }

    async fn rollback_placement_locked(&self, op: &Operation) -> Result<(), InventoryError> {
        let now = Utc::now();
        let mut tx = self.begin().await?;

        let staged = async {
            // Status guard makes the rollback idempotent: a concurrent
            // confirm or a second sweeper instance matches zero rows here.
            tx.update_operation_status(
                op.id,
                OperationStatus::PendingPhysicalConfirmation,
                OperationStatus::Failed,
                now,
            )
            .await?;

            let mut slot = tx.fetch_slot(&op.slot_id).await?;
            // Only unwind the slot if it still reflects this placement; a
            // later writer owns it otherwise and the operation record alone
            // is failed.
            if slot.status == SlotStatus::Occupied && slot.material_id == op.material_id {
                slot.apply(SlotEvent::TimeoutPlacement, now)
                    .map_err(|_| StoreError::VersionConflict)?;
                slot.material_id = None;
                tx.update_slot(&slot).await?;

                if let Some(material_id) = op.material_id {
                    let mut material = tx.fetch_material(material_id).await?;
                    material.status = MaterialStatus::Available;
                    material.updated_at = now;
                    tx.update_material(&material).await?;
                }
            }
            Ok::<(), StoreError>(())
        }
        .await;
        self.finish(tx, staged).await?;

        self.emit(
            events::PHYSICAL_PLACEMENT_FAILED,
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

        info!(operation_id = %op.id, slot_id = %op.slot_id, "stale placement rolled back");
        Ok(())
    }

    /// Undo a removal that never got its sensor confirmation: the material
    /// never left, so the slot returns to occupied with its reference
    /// preserved.
    async fn rollback_removal(&self, op: &Operation) -> Result<(), InventoryError> {
        let lease = self
            .lock
            .acquire(&op.shelf_id, self.cfg.lease_ttl)
            .await
            .map_err(map_lease)?;
        let result = self.rollback_removal_locked(op).await;
        lease.release().await;
        result
    }

    async fn rollback_removal_locked(&self, op: &Operation) -> Result<(), InventoryError> {
        let now = Utc::now();
        let mut tx = self.begin().await?;

        let staged = async {
            tx.update_operation_status(
                op.id,
                OperationStatus::PendingRemovalConfirmation,
                OperationStatus::Failed,
                now,
            )
            .await?;

            let mut slot = tx.fetch_slot(&op.slot_id).await?;
            if slot.status == SlotStatus::RemovalPending && slot.material_id == op.material_id {
                slot.apply(SlotEvent::TimeoutRemoval, now)
                    .map_err(|_| StoreError::VersionConflict)?;
                tx.update_slot(&slot).await?;
            }
            Ok::<(), StoreError>(())
        }
        .await;
        self.finish(tx, staged).await?;

        self.emit(
            events::PHYSICAL_REMOVAL_FAILED,
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

        info!(operation_id = %op.id, slot_id = %op.slot_id, "stale removal rolled back");
        Ok(())
    }
}
