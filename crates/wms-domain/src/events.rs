//! Outbound event envelope and typed payloads.
//!
//! Every event shares the same JSON envelope: `event_id`, `event_type`,
//! `version`, `timestamp`, `source`, with the payload fields flattened
//! alongside. Payloads are typed structs; serialization happens once at the
//! publish boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

pub const SOURCE: &str = "inventory-service";
pub const ENVELOPE_VERSION: &str = "v1";

// Inventory events
pub const MATERIAL_PLACED: &str = "material.placed";
pub const MATERIAL_REMOVED: &str = "material.removed";
pub const MATERIAL_MOVED: &str = "material.moved";
pub const MATERIAL_DETECTED: &str = "material.detected";

// Physical-confirmation handshake events
pub const PHYSICAL_PLACEMENT_REQUESTED: &str = "physical.placement.requested";
pub const PHYSICAL_PLACEMENT_CONFIRMED: &str = "physical.placement.confirmed";
pub const PHYSICAL_PLACEMENT_FAILED: &str = "physical.placement.failed";
pub const PHYSICAL_REMOVAL_REQUESTED: &str = "physical.removal.requested";
pub const PHYSICAL_REMOVAL_CONFIRMED: &str = "physical.removal.confirmed";
pub const PHYSICAL_REMOVAL_FAILED: &str = "physical.removal.failed";

// Reconciliation events
pub const UNPLANNED_PLACEMENT: &str = "unplanned.placement";
pub const UNPLANNED_REMOVAL: &str = "unplanned.removal";

// Shelf events
pub const SHELF_STATUS_CHANGED: &str = "shelf.status_changed";
pub const SHELF_HEALTH_ALERT: &str = "shelf.health_alert";

// System events
pub const SYSTEM_ALERT: &str = "system.alert";
pub const AUDIT_LOG: &str = "audit.log";

/// Common envelope wrapped around every outbound payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub event_id: Uuid,
    pub event_type: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub source: String,
    #[serde(flatten)]
    pub payload: T,
}

impl<T> Envelope<T> {
    pub fn new(event_type: impl Into<String>, payload: T, now: DateTime<Utc>) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            event_type: event_type.into(),
            version: ENVELOPE_VERSION.to_string(),
            timestamp: now,
            source: SOURCE.to_string(),
            payload,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialPlaced {
    pub material_id: Uuid,
    pub slot_id: String,
    pub shelf_id: String,
    pub operator_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialRemoved {
    pub material_id: Uuid,
    pub slot_id: String,
    pub shelf_id: String,
    pub operator_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialMoved {
    pub material_id: Uuid,
    pub from_slot_id: String,
    pub to_slot_id: String,
    pub shelf_id: String,
    pub operator_id: String,
}

/// Placement/removal handshake progress, correlated by operation id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhysicalHandshake {
    pub operation_id: Uuid,
    pub material_id: Uuid,
    pub slot_id: String,
    pub shelf_id: String,
    pub operator_id: String,
}

/// Raw sensor detection, re-published to the bus before correlation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialDetected {
    pub slot_id: String,
    pub shelf_id: String,
    pub material_barcode: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnplannedPlacement {
    pub slot_id: String,
    pub shelf_id: String,
    pub material_barcode: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnplannedRemoval {
    pub slot_id: String,
    pub shelf_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShelfStatusChanged {
    pub shelf_id: String,
    pub old_status: String,
    pub new_status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShelfHealthAlert {
    pub shelf_id: String,
    pub health_score: f64,
    pub total_slots: usize,
    pub healthy_slots: usize,
    pub error_slots: usize,
    pub severity: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemAlert {
    pub alert_type: String,
    pub severity: String,
    pub message: String,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub metadata: Value,
}

/// Audit trail entry published on every command outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLog {
    pub action: String,
    pub entity_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator_id: Option<String>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub metadata: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_flattens_payload_fields() {
        let env = Envelope::new(
            UNPLANNED_PLACEMENT,
            UnplannedPlacement {
                slot_id: "SHELF-A-1-1".to_string(),
                shelf_id: "SHELF-A".to_string(),
                material_barcode: "B9".to_string(),
            },
            Utc::now(),
        );
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json["event_type"], "unplanned.placement");
        assert_eq!(json["version"], "v1");
        assert_eq!(json["source"], "inventory-service");
        // Payload fields sit at the top level, not nested.
        assert_eq!(json["slot_id"], "SHELF-A-1-1");
        assert_eq!(json["material_barcode"], "B9");
        assert!(json.get("payload").is_none());
    }
}
