//! Contract tests for the in-memory store: transaction isolation, the
//! optimistic version check, and the status-guarded operation advance. The
//! coordinator's correctness rests on these semantics matching the SQL
//! implementation.

use chrono::Utc;
use wms_db::{InventoryStore, StoreError};
use wms_domain::{Operation, OperationStatus, OperationType, SlotStatus};
use wms_testkit::{empty_slot, material, MemoryStore};

#[tokio::test]
async fn staged_writes_are_invisible_until_commit() {
    let store = MemoryStore::new();
    store.seed_slot(empty_slot("SHELF-A", 1, 1));

    let mut tx = store.begin().await.unwrap();
    let mut slot = tx.fetch_slot("SHELF-A-1-1").await.unwrap();
    slot.status = SlotStatus::Reserved;
    slot.version += 1;
    tx.update_slot(&slot).await.unwrap();

    // Pool-level read still sees the committed row.
    let committed = store.fetch_slot("SHELF-A-1-1").await.unwrap();
    assert_eq!(committed.status, SlotStatus::Empty);
    assert_eq!(committed.version, 1);

    // Transaction-level read sees its own staged write.
    let staged = tx.fetch_slot("SHELF-A-1-1").await.unwrap();
    assert_eq!(staged.status, SlotStatus::Reserved);

    tx.commit().await.unwrap();
    let committed = store.fetch_slot("SHELF-A-1-1").await.unwrap();
    assert_eq!(committed.status, SlotStatus::Reserved);
    assert_eq!(committed.version, 2);
}

#[tokio::test]
async fn rollback_discards_everything() {
    let store = MemoryStore::new();
    store.seed_slot(empty_slot("SHELF-A", 1, 1));
    store.seed_material(material("B1"));

    let mut tx = store.begin().await.unwrap();
    let mut slot = tx.fetch_slot("SHELF-A-1-1").await.unwrap();
    slot.status = SlotStatus::Reserved;
    slot.version += 1;
    tx.update_slot(&slot).await.unwrap();
    tx.rollback().await.unwrap();

    let committed = store.fetch_slot("SHELF-A-1-1").await.unwrap();
    assert_eq!(committed.status, SlotStatus::Empty);
    assert_eq!(committed.version, 1);
}

#[tokio::test]
async fn stale_version_write_is_rejected() {
    let store = MemoryStore::new();
    store.seed_slot(empty_slot("SHELF-A", 1, 1));

    let mut slot = store.fetch_slot("SHELF-A-1-1").await.unwrap();
    // Claims to follow version 5; the row is at 1.
    slot.version = 6;
    let mut tx = store.begin().await.unwrap();
    let err = tx.update_slot(&slot).await.unwrap_err();
    assert!(matches!(err, StoreError::VersionConflict));
}

#[tokio::test]
async fn concurrent_transactions_cannot_both_commit_the_same_version() {
    let store = MemoryStore::new();
    store.seed_slot(empty_slot("SHELF-A", 1, 1));

    let mut slot_a = store.fetch_slot("SHELF-A-1-1").await.unwrap();
    let mut slot_b = slot_a.clone();

    let mut tx_a = store.begin().await.unwrap();
    let mut tx_b = store.begin().await.unwrap();

    slot_a.status = SlotStatus::Reserved;
    slot_a.version += 1;
    tx_a.update_slot(&slot_a).await.unwrap();
    tx_a.commit().await.unwrap();

    slot_b.status = SlotStatus::Maintenance;
    slot_b.version += 1;
    tx_b.update_slot(&slot_b).await.unwrap();
    // The write staged fine against its stale snapshot, but commit
    // re-validates against the committed row and must fail.
    let err = tx_b.commit().await.unwrap_err();
    assert!(matches!(err, StoreError::VersionConflict));

    let committed = store.fetch_slot("SHELF-A-1-1").await.unwrap();
    assert_eq!(committed.status, SlotStatus::Reserved);
}

#[tokio::test]
async fn operation_advance_requires_the_expected_status() {
    let store = MemoryStore::new();
    let op = Operation::new(
        OperationType::Placement,
        None,
        "SHELF-A-1-1",
        "op-1",
        "SHELF-A",
        OperationStatus::PendingPhysicalConfirmation,
        Utc::now(),
    );
    store.seed_operation(op.clone());

    let mut tx = store.begin().await.unwrap();
    tx.update_operation_status(
        op.id,
        OperationStatus::PendingPhysicalConfirmation,
        OperationStatus::Completed,
        Utc::now(),
    )
    .await
    .unwrap();
    tx.commit().await.unwrap();

    // A second advance from the same expected status matches nothing.
    let mut tx = store.begin().await.unwrap();
    let err = tx
        .update_operation_status(
            op.id,
            OperationStatus::PendingPhysicalConfirmation,
            OperationStatus::Failed,
            Utc::now(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::VersionConflict));
}

#[tokio::test]
async fn timed_out_query_filters_on_status_and_cutoff() {
    let store = MemoryStore::new();
    let mut stale = Operation::new(
        OperationType::Placement,
        None,
        "SHELF-A-1-1",
        "op-1",
        "SHELF-A",
        OperationStatus::PendingPhysicalConfirmation,
        Utc::now() - chrono::Duration::minutes(10),
    );
    stale.timestamp = Utc::now() - chrono::Duration::minutes(10);
    let fresh = Operation::new(
        OperationType::Placement,
        None,
        "SHELF-A-1-2",
        "op-1",
        "SHELF-A",
        OperationStatus::PendingPhysicalConfirmation,
        Utc::now(),
    );
    store.seed_operation(stale.clone());
    store.seed_operation(fresh);

    let cutoff = Utc::now() - chrono::Duration::minutes(5);
    let hits = store
        .timed_out_pending(OperationStatus::PendingPhysicalConfirmation, cutoff)
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, stale.id);
}
