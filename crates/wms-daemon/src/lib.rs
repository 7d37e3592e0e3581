//! wms-daemon library target.
//!
//! Exposes the router, state and API types for in-process integration
//! tests. The binary `main.rs` depends on this library target.

pub mod api_types;
pub mod metrics;
pub mod routes;
pub mod state;
