//! Entity builders for scenario tests.

use chrono::Utc;
use uuid::Uuid;

use wms_domain::{Material, MaterialStatus, Slot, SlotStatus};

/// An available material with the given barcode.
pub fn material(barcode: &str) -> Material {
    let now = Utc::now();
    Material {
        id: Uuid::new_v4(),
        barcode: barcode.to_string(),
        name: format!("material {barcode}"),
        material_type: "standard".to_string(),
        status: MaterialStatus::Available,
        created_at: now,
        updated_at: now,
    }
}

/// An empty slot at `<shelf>-<row>-<col>`, version 1.
pub fn empty_slot(shelf_id: &str, row: i32, column: i32) -> Slot {
    Slot {
        id: format!("{shelf_id}-{row}-{column}"),
        shelf_id: shelf_id.to_string(),
        row,
        column,
        status: SlotStatus::Empty,
        material_id: None,
        updated_at: Utc::now(),
        version: 1,
    }
}

/// An occupied slot referencing `material_id`, version 2 (one committed
/// write past its empty state).
pub fn occupied_slot(shelf_id: &str, row: i32, column: i32, material_id: Uuid) -> Slot {
    let mut slot = empty_slot(shelf_id, row, column);
    slot.status = SlotStatus::Occupied;
    slot.material_id = Some(material_id);
    slot.version = 2;
    slot
}
