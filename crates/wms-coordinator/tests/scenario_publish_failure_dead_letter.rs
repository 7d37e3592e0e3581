//! Dead-letter fallback: a bus failure never unwinds committed inventory
//! state, and the lost event is durably parked for replay.

mod common;

use common::harness;
use wms_coordinator::PlaceMaterial;
use wms_domain::{MaterialStatus, OperationStatus, SlotStatus};
use wms_testkit::{empty_slot, material};

#[tokio::test]
async fn publish_failure_dead_letters_and_keeps_the_commit() {
    let h = harness();
    h.store.seed_slot(empty_slot("SHELF-A", 1, 1));
    h.store.seed_material(material("B1"));
    h.bus.set_failing(true);

    let receipt = h
        .coordinator
        .place_material(PlaceMaterial {
            material_barcode: "B1".to_string(),
            slot_id: "SHELF-A-1-1".to_string(),
            operator_id: "op-1".to_string(),
            sensor_data: None,
        })
        .await
        .expect("command succeeds even though the bus is down");

    // Inventory writes are committed.
    assert_eq!(
        h.store.slot("SHELF-A-1-1").unwrap().status,
        SlotStatus::Occupied
    );
    assert_eq!(
        h.store.material(receipt.material_id).unwrap().status,
        MaterialStatus::InUse
    );
    assert_eq!(
        h.store.operation(receipt.operation_id).unwrap().status,
        OperationStatus::PendingPhysicalConfirmation
    );

    // Every attempted event for this command is parked, unresolved, with the
    // exact payload bytes.
    let parked = h.store.failed_events();
    assert!(!parked.is_empty());
    let requested = parked
        .iter()
        .find(|e| e.event_type == "physical.placement.requested")
        .expect("handshake event dead-lettered");
    assert_eq!(requested.topic, "inventory_events");
    assert!(!requested.resolved);
    let body: serde_json::Value = serde_json::from_slice(&requested.payload).unwrap();
    assert_eq!(body["event_type"], "physical.placement.requested");
    assert_eq!(body["slot_id"], "SHELF-A-1-1");

    // Nothing reached the bus.
    assert!(h.bus.events().is_empty());
}

#[tokio::test]
async fn dead_letters_are_listed_and_resolvable() {
    let h = harness();
    h.store.seed_slot(empty_slot("SHELF-A", 1, 1));
    h.store.seed_material(material("B1"));
    h.bus.set_failing(true);

    h.coordinator
        .place_material(PlaceMaterial {
            material_barcode: "B1".to_string(),
            slot_id: "SHELF-A-1-1".to_string(),
            operator_id: "op-1".to_string(),
            sensor_data: None,
        })
        .await
        .unwrap();

    use wms_db::InventoryStore;
    let unresolved = h.store.list_unresolved_failed_events(10, 0).await.unwrap();
    assert!(!unresolved.is_empty());

    h.store
        .resolve_failed_event(unresolved[0].id, "replayed manually")
        .await
        .unwrap();
    let remaining = h.store.list_unresolved_failed_events(10, 0).await.unwrap();
    assert_eq!(remaining.len(), unresolved.len() - 1);
}
