//! Inventory coordinator: the single entry point for all state-changing
//! commands.
//!
//! Every command runs the same skeleton: validate parameters, load
//! precondition rows, acquire the shelf lease(s), re-validate under the
//! lease, run one transaction covering every row it touches, emit events,
//! release. Slot mutations go through the domain state machine and carry the
//! optimistic version bump; the storage layer enforces the version check.

pub mod commands;
pub mod coordinator;
pub mod queries;

pub use commands::{
    BatchPlaceOutcome, HandleSlotError, MoveMaterial, PlaceMaterial, PlacementReceipt,
    RemoveMaterial, ReserveSlots, SensorReading,
};
pub use coordinator::InventoryCoordinator;
