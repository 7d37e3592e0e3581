//! Shared runtime state for wms-daemon.

use std::sync::Arc;

use wms_coordinator::InventoryCoordinator;

use crate::metrics::Metrics;

/// Static build metadata included in health responses.
#[derive(Clone, Debug)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

/// Cloneable (Arc) handle shared across all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<InventoryCoordinator>,
    pub metrics: Arc<Metrics>,
    pub build: BuildInfo,
}

impl AppState {
    pub fn new(coordinator: Arc<InventoryCoordinator>) -> Self {
        Self {
            coordinator,
            metrics: Arc::new(Metrics::new()),
            build: BuildInfo {
                service: "wms-daemon",
                version: env!("CARGO_PKG_VERSION"),
            },
        }
    }
}
