use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a tracked material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialStatus {
    /// Not placed anywhere; eligible for placement.
    Available,
    /// Referenced by exactly one occupied slot.
    InUse,
    Reserved,
    Maintenance,
}

impl MaterialStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MaterialStatus::Available => "available",
            MaterialStatus::InUse => "in_use",
            MaterialStatus::Reserved => "reserved",
            MaterialStatus::Maintenance => "maintenance",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "available" => Some(MaterialStatus::Available),
            "in_use" => Some(MaterialStatus::InUse),
            "reserved" => Some(MaterialStatus::Reserved),
            "maintenance" => Some(MaterialStatus::Maintenance),
            _ => None,
        }
    }
}

/// A physical item tracked by barcode. At most one slot references a material
/// at any time; a material in `InUse` is referenced by exactly one occupied
/// slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Material {
    pub id: Uuid,
    /// Globally unique; the correlation key for sensor events.
    pub barcode: String,
    pub name: String,
    pub material_type: String,
    pub status: MaterialStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
