//! Shelf payloads and topic parsing.

use serde::{Deserialize, Serialize};

use wms_coordinator::SensorReading;

/// `<prefix>/<shelf_id>/events` payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShelfEventMsg {
    pub shelf_id: String,
    pub slot_id: String,
    /// `material_detected`, `material_removed` or `slot_error`.
    pub event_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material_barcode: Option<String>,
    /// Unix milliseconds, assigned by the shelf controller.
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensor_data: Option<SensorReading>,
}

/// `<prefix>/<shelf_id>/status` heartbeat payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShelfStatusMsg {
    pub shelf_id: String,
    /// `online`, `offline` or `maintenance`.
    pub status: String,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicKind {
    Events,
    Status,
}

/// Match `<prefix>/<shelf_id>/events|status`, returning the shelf id segment
/// and which stream it is.
pub fn parse_topic<'t>(topic: &'t str, prefix: &str) -> Option<(&'t str, TopicKind)> {
    let rest = topic.strip_prefix(prefix)?.strip_prefix('/')?;
    let (shelf_id, leaf) = rest.split_once('/')?;
    if shelf_id.is_empty() {
        return None;
    }
    match leaf {
        "events" => Some((shelf_id, TopicKind::Events)),
        "status" => Some((shelf_id, TopicKind::Status)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_event_and_status_topics() {
        assert_eq!(
            parse_topic("warehouse/shelf/SHELF-A/events", "warehouse/shelf"),
            Some(("SHELF-A", TopicKind::Events))
        );
        assert_eq!(
            parse_topic("warehouse/shelf/SHELF-B/status", "warehouse/shelf"),
            Some(("SHELF-B", TopicKind::Status))
        );
    }

    #[test]
    fn rejects_foreign_topics() {
        assert_eq!(parse_topic("warehouse/shelf/SHELF-A/other", "warehouse/shelf"), None);
        assert_eq!(parse_topic("elsewhere/SHELF-A/events", "warehouse/shelf"), None);
        assert_eq!(parse_topic("warehouse/shelf//events", "warehouse/shelf"), None);
    }

    #[test]
    fn event_payload_round_trips() {
        let raw = r#"{
            "shelf_id": "SHELF-A",
            "slot_id": "SHELF-A-1-1",
            "event_type": "material_detected",
            "material_barcode": "B1",
            "timestamp": 1722470400000,
            "sensor_data": {"weight": 1250.5, "temperature": 21.0, "humidity": null, "light_level": 40}
        }"#;
        let msg: ShelfEventMsg = serde_json::from_str(raw).unwrap();
        assert_eq!(msg.event_type, "material_detected");
        assert_eq!(msg.material_barcode.as_deref(), Some("B1"));
        assert_eq!(msg.sensor_data.as_ref().unwrap().weight, Some(1250.5));
    }

    #[test]
    fn event_payload_tolerates_missing_optionals() {
        let raw = r#"{
            "shelf_id": "SHELF-A",
            "slot_id": "SHELF-A-1-1",
            "event_type": "material_removed",
            "timestamp": 1722470400000
        }"#;
        let msg: ShelfEventMsg = serde_json::from_str(raw).unwrap();
        assert!(msg.material_barcode.is_none());
        assert!(msg.sensor_data.is_none());
    }
}
