//! Cross-shelf move and reservation scenarios.

mod common;

use common::harness;
use wms_coordinator::{MoveMaterial, ReserveSlots};
use wms_domain::{InventoryError, OperationStatus, OperationType, SlotStatus};
use wms_testkit::{empty_slot, material, occupied_slot};

#[tokio::test]
async fn move_across_shelves_is_one_synchronous_transaction() {
    let h = harness();
    let m = material("B1");
    let m_id = m.id;
    h.store.seed_material(m);
    h.store.seed_slot(occupied_slot("SHELF-A", 1, 1, m_id));
    h.store.seed_slot(empty_slot("SHELF-B", 2, 3));

    let op_id = h
        .coordinator
        .move_material(MoveMaterial {
            from_slot_id: "SHELF-A-1-1".to_string(),
            to_slot_id: "SHELF-B-2-3".to_string(),
            operator_id: "op-1".to_string(),
            reason: Some("restock".to_string()),
        })
        .await
        .unwrap();

    let from = h.store.slot("SHELF-A-1-1").unwrap();
    assert_eq!(from.status, SlotStatus::Empty);
    assert_eq!(from.material_id, None);
    assert_eq!(from.version, 3);

    let to = h.store.slot("SHELF-B-2-3").unwrap();
    assert_eq!(to.status, SlotStatus::Occupied);
    assert_eq!(to.material_id, Some(m_id));
    assert_eq!(to.version, 2);

    let op = h.store.operation(op_id).unwrap();
    assert_eq!(op.op_type, OperationType::Move);
    assert_eq!(op.status, OperationStatus::Completed);

    let moved = h.bus.events_of_type("material.moved");
    assert_eq!(moved.len(), 1);
    assert_eq!(moved[0].json()["from_slot_id"], "SHELF-A-1-1");
    assert_eq!(moved[0].json()["to_slot_id"], "SHELF-B-2-3");

    // Leases on both shelves acquired in ascending shelf order, then freed.
    let history = h.kv.acquisition_history();
    assert_eq!(history, ["lock:shelf:SHELF-A", "lock:shelf:SHELF-B"]);
    assert!(h.kv.raw_get("lock:shelf:SHELF-A").is_none());
    assert!(h.kv.raw_get("lock:shelf:SHELF-B").is_none());
}

#[tokio::test]
async fn move_rejects_empty_source_and_occupied_target() {
    let h = harness();
    let m = material("B1");
    let m_id = m.id;
    h.store.seed_material(m);
    h.store.seed_slot(empty_slot("SHELF-A", 1, 1));
    h.store.seed_slot(occupied_slot("SHELF-B", 1, 1, m_id));

    let err = h
        .coordinator
        .move_material(MoveMaterial {
            from_slot_id: "SHELF-A-1-1".to_string(),
            to_slot_id: "SHELF-B-1-1".to_string(),
            operator_id: "op-1".to_string(),
            reason: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, InventoryError::Conflict { .. }));
}

#[tokio::test]
async fn reserve_marks_every_slot_or_none() {
    let h = harness();
    h.store.seed_slot(empty_slot("SHELF-A", 1, 1));
    h.store.seed_slot(empty_slot("SHELF-B", 1, 1));

    let op_ids = h
        .coordinator
        .reserve_slots(ReserveSlots {
            slot_ids: vec!["SHELF-A-1-1".to_string(), "SHELF-B-1-1".to_string()],
            operator_id: "op-1".to_string(),
            duration: 45,
            purpose: "staging".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(op_ids.len(), 2);

    for slot_id in ["SHELF-A-1-1", "SHELF-B-1-1"] {
        assert_eq!(h.store.slot(slot_id).unwrap().status, SlotStatus::Reserved);
    }
    let op = h.store.operation(op_ids[0]).unwrap();
    assert_eq!(op.op_type, OperationType::Reservation);
    assert_eq!(op.status, OperationStatus::Completed);
    assert_eq!(op.reserve_duration_min, Some(45));
    assert_eq!(op.purpose.as_deref(), Some("staging"));
}

#[tokio::test]
async fn reserve_rolls_back_whole_batch_on_one_conflict() {
    let h = harness();
    let m = material("B1");
    let m_id = m.id;
    h.store.seed_material(m);
    h.store.seed_slot(empty_slot("SHELF-A", 1, 1));
    h.store.seed_slot(occupied_slot("SHELF-A", 1, 2, m_id));

    let err = h
        .coordinator
        .reserve_slots(ReserveSlots {
            slot_ids: vec!["SHELF-A-1-1".to_string(), "SHELF-A-1-2".to_string()],
            operator_id: "op-1".to_string(),
            duration: 30,
            purpose: "staging".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, InventoryError::Conflict { .. }));

    // The empty slot must remain untouched after the rollback.
    let untouched = h.store.slot("SHELF-A-1-1").unwrap();
    assert_eq!(untouched.status, SlotStatus::Empty);
    assert_eq!(untouched.version, 1);
    assert!(h.store.operations().is_empty());
}
