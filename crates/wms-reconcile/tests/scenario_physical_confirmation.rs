//! Sensor correlation scenarios: confirmations, unplanned events, and the
//! full place/remove round trip.

mod common;

use common::harness;
use wms_coordinator::{PlaceMaterial, RemoveMaterial};
use wms_domain::{MaterialStatus, OperationStatus, SlotStatus};
use wms_testkit::{empty_slot, material};

fn place(barcode: &str, slot_id: &str) -> PlaceMaterial {
    PlaceMaterial {
        material_barcode: barcode.to_string(),
        slot_id: slot_id.to_string(),
        operator_id: "op-1".to_string(),
        sensor_data: None,
    }
}

#[tokio::test]
async fn detection_confirms_the_matching_pending_placement() {
    let h = harness();
    h.store.seed_slot(empty_slot("SHELF-A", 1, 1));
    h.store.seed_material(material("B1"));

    let receipt = h
        .coordinator
        .place_material(place("B1", "SHELF-A-1-1"))
        .await
        .unwrap();

    h.reconciler
        .handle_material_detected("SHELF-A", "SHELF-A-1-1", "B1")
        .await
        .unwrap();

    let op = h.store.operation(receipt.operation_id).unwrap();
    assert_eq!(op.status, OperationStatus::Completed);

    // Slot and material were already terminal; only the operation moved.
    let slot = h.store.slot("SHELF-A-1-1").unwrap();
    assert_eq!(slot.status, SlotStatus::Occupied);
    assert_eq!(slot.version, 2);

    assert_eq!(h.bus.events_of_type("physical.placement.confirmed").len(), 1);
    assert_eq!(h.bus.events_of_type("material.placed").len(), 1);
    assert!(h.bus.events_of_type("unplanned.placement").is_empty());
}

#[tokio::test]
async fn detection_of_wrong_barcode_is_unplanned() {
    let h = harness();
    h.store.seed_slot(empty_slot("SHELF-A", 1, 1));
    h.store.seed_material(material("B1"));
    h.store.seed_material(material("B9"));

    let receipt = h
        .coordinator
        .place_material(place("B1", "SHELF-A-1-1"))
        .await
        .unwrap();

    // A different material shows up in the slot.
    h.reconciler
        .handle_material_detected("SHELF-A", "SHELF-A-1-1", "B9")
        .await
        .unwrap();

    let op = h.store.operation(receipt.operation_id).unwrap();
    assert_eq!(op.status, OperationStatus::PendingPhysicalConfirmation);

    let unplanned = h.bus.events_of_type("unplanned.placement");
    assert_eq!(unplanned.len(), 1);
    assert_eq!(unplanned[0].json()["material_barcode"], "B9");
}

#[tokio::test]
async fn detection_with_no_pending_operation_is_unplanned_and_mutates_nothing() {
    let h = harness();
    h.store.seed_slot(empty_slot("SHELF-A", 1, 1));

    h.reconciler
        .handle_material_detected("SHELF-A", "SHELF-A-1-1", "B9")
        .await
        .unwrap();

    let slot = h.store.slot("SHELF-A-1-1").unwrap();
    assert_eq!(slot.status, SlotStatus::Empty);
    assert_eq!(slot.version, 1);

    let unplanned = h.bus.events_of_type("unplanned.placement");
    assert_eq!(unplanned.len(), 1);
    assert_eq!(unplanned[0].json()["slot_id"], "SHELF-A-1-1");
    assert_eq!(unplanned[0].json()["material_barcode"], "B9");
}

#[tokio::test]
async fn removal_event_without_pending_operation_leaves_slot_unchanged() {
    let h = harness();
    let m = material("B1");
    let m_id = m.id;
    h.store.seed_material(m);
    h.store
        .seed_slot(wms_testkit::occupied_slot("SHELF-A", 1, 1, m_id));

    h.reconciler
        .handle_material_removed("SHELF-A", "SHELF-A-1-1")
        .await
        .unwrap();

    let slot = h.store.slot("SHELF-A-1-1").unwrap();
    assert_eq!(slot.status, SlotStatus::Occupied);
    assert_eq!(slot.material_id, Some(m_id));
    assert_eq!(h.bus.events_of_type("unplanned.removal").len(), 1);
}

#[tokio::test]
async fn confirmation_is_idempotent_under_redelivery() {
    let h = harness();
    h.store.seed_slot(empty_slot("SHELF-A", 1, 1));
    h.store.seed_material(material("B1"));

    h.coordinator
        .place_material(place("B1", "SHELF-A-1-1"))
        .await
        .unwrap();

    h.reconciler
        .handle_material_detected("SHELF-A", "SHELF-A-1-1", "B1")
        .await
        .unwrap();
    // QoS-1 redelivery: the second detection finds no pending operation and
    // lands in the unplanned path instead of double-applying.
    h.reconciler
        .handle_material_detected("SHELF-A", "SHELF-A-1-1", "B1")
        .await
        .unwrap();

    assert_eq!(h.bus.events_of_type("physical.placement.confirmed").len(), 1);
    assert_eq!(h.bus.events_of_type("unplanned.placement").len(), 1);
    let slot = h.store.slot("SHELF-A-1-1").unwrap();
    assert_eq!(slot.version, 2);
}

#[tokio::test]
async fn place_confirm_remove_confirm_round_trip() {
    let h = harness();
    h.store.seed_slot(empty_slot("SHELF-A", 1, 1));
    h.store.seed_material(material("B1"));

    let receipt = h
        .coordinator
        .place_material(place("B1", "SHELF-A-1-1"))
        .await
        .unwrap();
    h.reconciler
        .handle_material_detected("SHELF-A", "SHELF-A-1-1", "B1")
        .await
        .unwrap();

    let removal_op = h
        .coordinator
        .remove_material(RemoveMaterial {
            slot_id: "SHELF-A-1-1".to_string(),
            operator_id: "op-1".to_string(),
            reason: Some("picked".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(
        h.store.slot("SHELF-A-1-1").unwrap().status,
        SlotStatus::RemovalPending
    );

    h.reconciler
        .handle_material_removed("SHELF-A", "SHELF-A-1-1")
        .await
        .unwrap();

    // Back where we started: empty slot, available material, both
    // operations completed. Three slot writes along the way.
    let slot = h.store.slot("SHELF-A-1-1").unwrap();
    assert_eq!(slot.status, SlotStatus::Empty);
    assert_eq!(slot.material_id, None);
    assert_eq!(slot.version, 4);

    let mat = h.store.material(receipt.material_id).unwrap();
    assert_eq!(mat.status, MaterialStatus::Available);

    assert_eq!(
        h.store.operation(receipt.operation_id).unwrap().status,
        OperationStatus::Completed
    );
    assert_eq!(
        h.store.operation(removal_op).unwrap().status,
        OperationStatus::Completed
    );

    assert_eq!(h.bus.events_of_type("physical.removal.confirmed").len(), 1);
    let removed = h.bus.events_of_type("material.removed");
    assert_eq!(removed.len(), 1);
    assert_eq!(removed[0].json()["reason"], "picked");
}
