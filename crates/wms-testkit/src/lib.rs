//! In-memory fakes for the storage, key-value and bus seams, plus seed
//! helpers. Scenario tests across the workspace compose these instead of
//! Postgres/Redis/Kafka: no network I/O, fully deterministic.

pub mod memory_bus;
pub mod memory_kv;
pub mod memory_store;
pub mod seed;

pub use memory_bus::{MemoryBus, RecordedEvent};
pub use memory_kv::MemoryKv;
pub use memory_store::MemoryStore;
pub use seed::{empty_slot, material, occupied_slot};
