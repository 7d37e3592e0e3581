use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Low => "low",
            AlertSeverity::Medium => "medium",
            AlertSeverity::High => "high",
            AlertSeverity::Critical => "critical",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(AlertSeverity::Low),
            "medium" => Some(AlertSeverity::Medium),
            "high" => Some(AlertSeverity::High),
            "critical" => Some(AlertSeverity::Critical),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    Active,
    Acknowledged,
    Resolved,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::Active => "active",
            AlertStatus::Acknowledged => "acknowledged",
            AlertStatus::Resolved => "resolved",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(AlertStatus::Active),
            "acknowledged" => Some(AlertStatus::Acknowledged),
            "resolved" => Some(AlertStatus::Resolved),
            _ => None,
        }
    }
}

/// Operator-facing incident record. Alerts are written unconditionally (no
/// lease required) and only ever move forward: active → acknowledged →
/// resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: Uuid,
    pub alert_type: String,
    pub shelf_id: Option<String>,
    pub slot_id: Option<String>,
    pub message: String,
    pub severity: AlertSeverity,
    pub status: AlertStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub metadata: Value,
}

impl Alert {
    pub fn new(
        alert_type: impl Into<String>,
        message: impl Into<String>,
        severity: AlertSeverity,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            alert_type: alert_type.into(),
            shelf_id: None,
            slot_id: None,
            message: message.into(),
            severity,
            status: AlertStatus::Active,
            created_at: now,
            updated_at: now,
            resolved_at: None,
            metadata: Value::Null,
        }
    }

    pub fn for_slot(mut self, shelf_id: impl Into<String>, slot_id: impl Into<String>) -> Self {
        self.shelf_id = Some(shelf_id.into());
        self.slot_id = Some(slot_id.into());
        self
    }

    pub fn acknowledge(&mut self, now: DateTime<Utc>) {
        if self.status == AlertStatus::Active {
            self.status = AlertStatus::Acknowledged;
            self.updated_at = now;
        }
    }

    pub fn resolve(&mut self, now: DateTime<Utc>) {
        if self.status != AlertStatus::Resolved {
            self.status = AlertStatus::Resolved;
            self.resolved_at = Some(now);
            self.updated_at = now;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_moves_forward_only() {
        let now = Utc::now();
        let mut a = Alert::new("slot_error", "sensor fault", AlertSeverity::High, now);
        assert_eq!(a.status, AlertStatus::Active);

        a.acknowledge(now);
        assert_eq!(a.status, AlertStatus::Acknowledged);

        a.resolve(now);
        assert_eq!(a.status, AlertStatus::Resolved);
        assert!(a.resolved_at.is_some());

        // Acknowledge after resolve is a no-op.
        a.acknowledge(now);
        assert_eq!(a.status, AlertStatus::Resolved);
    }

    #[test]
    fn severity_ordering_matches_escalation() {
        assert!(AlertSeverity::Low < AlertSeverity::Medium);
        assert!(AlertSeverity::Medium < AlertSeverity::High);
        assert!(AlertSeverity::High < AlertSeverity::Critical);
    }
}
