//! Shared in-memory harness for coordinator scenario tests.

use std::sync::Arc;
use std::time::Duration;

use wms_config::ServiceConfig;
use wms_coordinator::InventoryCoordinator;
use wms_db::InventoryStore;
use wms_events::{BusProducer, EventPublisher};
use wms_kv::{Kv, ShelfCache, ShelfLock};
use wms_testkit::{MemoryBus, MemoryKv, MemoryStore};

pub struct Harness {
    pub coordinator: Arc<InventoryCoordinator>,
    pub store: MemoryStore,
    pub bus: Arc<MemoryBus>,
    pub kv: Arc<MemoryKv>,
}

pub fn harness() -> Harness {
    let store = MemoryStore::new();
    let bus = Arc::new(MemoryBus::new());
    let kv = Arc::new(MemoryKv::new());

    let store_dyn: Arc<dyn InventoryStore> = Arc::new(store.clone());
    let bus_dyn: Arc<dyn BusProducer> = bus.clone();
    let kv_dyn: Arc<dyn Kv> = kv.clone();

    let publisher = Arc::new(EventPublisher::new(
        bus_dyn,
        Arc::clone(&store_dyn),
        "inventory_events",
    ));
    let lock = ShelfLock::new(Arc::clone(&kv_dyn));
    let cache = ShelfCache::new(
        kv_dyn,
        Duration::from_secs(600),
        Duration::from_secs(3600),
    );

    let coordinator = Arc::new(InventoryCoordinator::new(
        store_dyn,
        lock,
        cache,
        publisher,
        ServiceConfig::default(),
    ));

    Harness {
        coordinator,
        store,
        bus,
        kv,
    }
}
