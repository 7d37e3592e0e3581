//! Operation audit records.
//!
//! An operation is the sole trail through which state transitions are
//! reconstructable. Completed operations are immutable; the only legal
//! updates advance a pending-confirmation operation to a terminal status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    Placement,
    Removal,
    Move,
    Reservation,
}

impl OperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Placement => "placement",
            OperationType::Removal => "removal",
            OperationType::Move => "move",
            OperationType::Reservation => "reservation",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "placement" => Some(OperationType::Placement),
            "removal" => Some(OperationType::Removal),
            "move" => Some(OperationType::Move),
            "reservation" => Some(OperationType::Reservation),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    Pending,
    /// Logical placement committed; waiting for the shelf sensor handshake.
    PendingPhysicalConfirmation,
    /// Logical removal committed; waiting for the shelf sensor handshake.
    PendingRemovalConfirmation,
    Completed,
    Failed,
    Cancelled,
}

impl OperationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationStatus::Pending => "pending",
            OperationStatus::PendingPhysicalConfirmation => "pending_physical_confirmation",
            OperationStatus::PendingRemovalConfirmation => "pending_removal_confirmation",
            OperationStatus::Completed => "completed",
            OperationStatus::Failed => "failed",
            OperationStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(OperationStatus::Pending),
            "pending_physical_confirmation" => Some(OperationStatus::PendingPhysicalConfirmation),
            "pending_removal_confirmation" => Some(OperationStatus::PendingRemovalConfirmation),
            "completed" => Some(OperationStatus::Completed),
            "failed" => Some(OperationStatus::Failed),
            "cancelled" => Some(OperationStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OperationStatus::Completed | OperationStatus::Failed | OperationStatus::Cancelled
        )
    }

    /// Legal status advances. Pending operations may resolve to any terminal
    /// status; terminal operations never move again.
    pub fn can_advance_to(&self, next: OperationStatus) -> bool {
        !self.is_terminal() && next.is_terminal()
    }
}

/// Append-mostly audit record of an attempted state change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operation {
    pub id: Uuid,
    pub op_type: OperationType,
    /// Absent for reservations (no material involved).
    pub material_id: Option<Uuid>,
    pub slot_id: String,
    pub operator_id: String,
    pub shelf_id: String,
    pub timestamp: DateTime<Utc>,
    pub status: OperationStatus,
    /// Operator-supplied context for removals and moves.
    pub reason: Option<String>,
    /// Requested reservation window, minutes.
    pub reserve_duration_min: Option<i32>,
    pub purpose: Option<String>,
}

impl Operation {
    pub fn new(
        op_type: OperationType,
        material_id: Option<Uuid>,
        slot_id: impl Into<String>,
        operator_id: impl Into<String>,
        shelf_id: impl Into<String>,
        status: OperationStatus,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            op_type,
            material_id,
            slot_id: slot_id.into(),
            operator_id: operator_id.into(),
            shelf_id: shelf_id.into(),
            timestamp: now,
            status,
            reason: None,
            reserve_duration_min: None,
            purpose: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_confirmation_advances_to_terminal_only() {
        let p = OperationStatus::PendingPhysicalConfirmation;
        assert!(p.can_advance_to(OperationStatus::Completed));
        assert!(p.can_advance_to(OperationStatus::Failed));
        assert!(!p.can_advance_to(OperationStatus::Pending));
        assert!(!p.can_advance_to(OperationStatus::PendingRemovalConfirmation));
    }

    #[test]
    fn terminal_statuses_are_frozen() {
        for s in [
            OperationStatus::Completed,
            OperationStatus::Failed,
            OperationStatus::Cancelled,
        ] {
            assert!(s.is_terminal());
            assert!(!s.can_advance_to(OperationStatus::Completed));
        }
    }

    #[test]
    fn status_round_trips_through_strings() {
        for s in [
            OperationStatus::Pending,
            OperationStatus::PendingPhysicalConfirmation,
            OperationStatus::PendingRemovalConfirmation,
            OperationStatus::Completed,
            OperationStatus::Failed,
            OperationStatus::Cancelled,
        ] {
            assert_eq!(OperationStatus::parse(s.as_str()), Some(s));
        }
    }
}
