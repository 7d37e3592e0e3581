//! Slot entity and its transition state machine.
//!
//! # State diagram
//!
//! ```text
//!            Place                     ConfirmRemoval
//!   Empty ─────────► Occupied   ┌────────────────────► Empty
//!     ▲                │        │
//!     │ TimeoutPlace   │ Remove │
//!     └────────────────┤        │
//!                      ▼        │
//!               RemovalPending ─┘
//!                      │ TimeoutRemoval
//!                      └──────────────► Occupied
//!
//!   Empty ──Reserve──► Reserved      (any) ──Maintenance──► Maintenance
//! ```
//!
//! Confirmation of a placement does not touch the slot row at all: the slot
//! is already `Occupied` and only the operation record advances. Every legal
//! mutation goes through [`slot::transition`](transition); an illegal pair
//! returns [`TransitionError`] and nothing is written.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// All valid states an addressable shelf cell can occupy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    Empty,
    Occupied,
    Reserved,
    /// A removal was requested; the material is still physically present and
    /// still referenced so the removal can be rolled back.
    RemovalPending,
    Maintenance,
}

impl SlotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotStatus::Empty => "empty",
            SlotStatus::Occupied => "occupied",
            SlotStatus::Reserved => "reserved",
            SlotStatus::RemovalPending => "removal_pending",
            SlotStatus::Maintenance => "maintenance",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "empty" => Some(SlotStatus::Empty),
            "occupied" => Some(SlotStatus::Occupied),
            "reserved" => Some(SlotStatus::Reserved),
            "removal_pending" => Some(SlotStatus::RemovalPending),
            "maintenance" => Some(SlotStatus::Maintenance),
            _ => None,
        }
    }

    /// A slot counts as healthy when it is in normal circulation.
    pub fn is_healthy(&self) -> bool {
        matches!(self, SlotStatus::Empty | SlotStatus::Occupied)
    }
}

/// Events that drive slot transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotEvent {
    /// Operator placed a material (logical write; physical confirm pending).
    Place,
    /// Operator requested removal; material stays referenced until confirmed.
    Remove,
    /// Sensor confirmed the removal; the cell is free again.
    ConfirmRemoval,
    /// No sensor confirmation arrived in time; undo the placement.
    TimeoutPlacement,
    /// No sensor confirmation arrived in time; the material never left.
    TimeoutRemoval,
    Reserve,
    /// Source side of a synchronous move.
    MoveOut,
    /// Destination side of a synchronous move.
    MoveIn,
    /// Hardware fault; the cell leaves circulation.
    Maintenance,
}

/// Returned when an event cannot legally be applied in the current state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionError {
    pub from: SlotStatus,
    pub event: SlotEvent,
}

impl std::fmt::Display for TransitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "illegal slot transition: {} + {:?}",
            self.from.as_str(),
            self.event
        )
    }
}

impl std::error::Error for TransitionError {}

/// Total transition function for the slot state machine.
pub fn transition(from: SlotStatus, event: SlotEvent) -> Result<SlotStatus, TransitionError> {
    use SlotEvent::*;
    use SlotStatus::*;

    match (from, event) {
        (Empty, Place) => Ok(Occupied),
        (Empty, Reserve) => Ok(Reserved),
        (Empty, MoveIn) => Ok(Occupied),
        (Occupied, Remove) => Ok(RemovalPending),
        (Occupied, TimeoutPlacement) => Ok(Empty),
        (Occupied, MoveOut) => Ok(Empty),
        (RemovalPending, ConfirmRemoval) => Ok(Empty),
        (RemovalPending, TimeoutRemoval) => Ok(Occupied),
        // Any cell can be pulled from circulation on a hardware fault.
        (_, SlotEvent::Maintenance) => Ok(SlotStatus::Maintenance),
        (from, event) => Err(TransitionError { from, event }),
    }
}

/// One addressable cell on a shelf.
///
/// Invariants enforced at every write:
/// - `status = Occupied ⇔ material_id.is_some()` (RemovalPending keeps the
///   reference so the removal can be reverted)
/// - `version` strictly increases on every committed write; storage rejects
///   a write whose expected predecessor version does not match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slot {
    /// Opaque, but encodes shelf/row/column (e.g. `SHELF-A-2-3`).
    pub id: String,
    pub shelf_id: String,
    pub row: i32,
    pub column: i32,
    pub status: SlotStatus,
    pub material_id: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
    pub version: i64,
}

impl Slot {
    /// Apply a transition event, bumping the version and timestamp. The
    /// caller sets `material_id` explicitly; this only moves the status word.
    pub fn apply(&mut self, event: SlotEvent, now: DateTime<Utc>) -> Result<(), TransitionError> {
        self.status = transition(self.status, event)?;
        self.version += 1;
        self.updated_at = now;
        Ok(())
    }

    /// Placement acceptance policy. The default accepts any material type;
    /// sites with typed shelving override this at the query layer.
    pub fn accepts_material_type(&self, _material_type: &str) -> bool {
        true
    }
}
