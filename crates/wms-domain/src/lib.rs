//! Core domain model for the inventory service.
//!
//! Entities, status enums and the slot/operation state machines live here.
//! Everything is plain data plus transition rules, no I/O and no async. The
//! storage, lease, bus and HTTP layers all consume these types.

pub mod alert;
pub mod error;
pub mod events;
pub mod failed_event;
pub mod material;
pub mod operation;
pub mod shelf;
pub mod slot;

pub use alert::{Alert, AlertSeverity, AlertStatus};
pub use error::InventoryError;
pub use failed_event::FailedEvent;
pub use material::{Material, MaterialStatus};
pub use operation::{Operation, OperationStatus, OperationType};
pub use shelf::{severity_for_health_score, ShelfHealth, ShelfStatusSummary};
pub use slot::{Slot, SlotEvent, SlotStatus, TransitionError};
