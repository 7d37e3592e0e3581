//! Command payloads and their structural validation.
//!
//! Validation here is shape-only (non-empty ids, sane bounds); business
//! preconditions are checked by the coordinator under the shelf lease.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use wms_domain::InventoryError;

/// Optional sensor readings attached to hardware-initiated placements.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SensorReading {
    pub weight: Option<f64>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub light_level: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceMaterial {
    pub material_barcode: String,
    pub slot_id: String,
    pub operator_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensor_data: Option<SensorReading>,
}

impl PlaceMaterial {
    pub fn validate(&self) -> Result<(), InventoryError> {
        require(&self.material_barcode, "material_barcode")?;
        require(&self.slot_id, "slot_id")?;
        require(&self.operator_id, "operator_id")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveMaterial {
    pub slot_id: String,
    pub operator_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl RemoveMaterial {
    pub fn validate(&self) -> Result<(), InventoryError> {
        require(&self.slot_id, "slot_id")?;
        require(&self.operator_id, "operator_id")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveMaterial {
    pub from_slot_id: String,
    pub to_slot_id: String,
    pub operator_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl MoveMaterial {
    pub fn validate(&self) -> Result<(), InventoryError> {
        require(&self.from_slot_id, "from_slot_id")?;
        require(&self.to_slot_id, "to_slot_id")?;
        require(&self.operator_id, "operator_id")?;
        if self.from_slot_id == self.to_slot_id {
            return Err(InventoryError::validation(
                "from_slot_id and to_slot_id must differ",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReserveSlots {
    pub slot_ids: Vec<String>,
    pub operator_id: String,
    /// Reservation window in minutes.
    pub duration: i32,
    pub purpose: String,
}

impl ReserveSlots {
    pub fn validate(&self) -> Result<(), InventoryError> {
        if self.slot_ids.is_empty() {
            return Err(InventoryError::validation("slot_ids must not be empty"));
        }
        for id in &self.slot_ids {
            require(id, "slot_ids entry")?;
        }
        require(&self.operator_id, "operator_id")?;
        if self.duration <= 0 {
            return Err(InventoryError::validation("duration must be positive"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandleSlotError {
    pub slot_id: String,
    pub error_type: String,
}

impl HandleSlotError {
    pub fn validate(&self) -> Result<(), InventoryError> {
        require(&self.slot_id, "slot_id")?;
        require(&self.error_type, "error_type")
    }
}

/// What a successful placement committed.
#[derive(Debug, Clone, Serialize)]
pub struct PlacementReceipt {
    pub operation_id: Uuid,
    pub material_id: Uuid,
    pub slot_id: String,
    pub shelf_id: String,
    pub slot_version: i64,
}

/// Per-shelf outcome of a batch placement. Shelves are processed in
/// ascending id order; a failing shelf stops the batch but does not roll
/// back shelves already committed.
#[derive(Debug, Clone, Serialize)]
pub struct BatchPlaceOutcome {
    pub placed: Vec<PlacementReceipt>,
    pub shelves_committed: Vec<String>,
}

fn require(value: &str, field: &str) -> Result<(), InventoryError> {
    if value.trim().is_empty() {
        return Err(InventoryError::validation(format!("{field} is required")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn place_requires_all_fields() {
        let cmd = PlaceMaterial {
            material_barcode: "B1".to_string(),
            slot_id: String::new(),
            operator_id: "op1".to_string(),
            sensor_data: None,
        };
        assert!(cmd.validate().is_err());
    }

    #[test]
    fn move_rejects_same_slot() {
        let cmd = MoveMaterial {
            from_slot_id: "S1".to_string(),
            to_slot_id: "S1".to_string(),
            operator_id: "op1".to_string(),
            reason: None,
        };
        assert!(cmd.validate().is_err());
    }

    #[test]
    fn reserve_rejects_empty_list_and_zero_duration() {
        let mut cmd = ReserveSlots {
            slot_ids: vec![],
            operator_id: "op1".to_string(),
            duration: 30,
            purpose: "staging".to_string(),
        };
        assert!(cmd.validate().is_err());

        cmd.slot_ids = vec!["S1".to_string()];
        cmd.duration = 0;
        assert!(cmd.validate().is_err());

        cmd.duration = 15;
        assert!(cmd.validate().is_ok());
    }
}
