//! In-memory [`InventoryStore`] with transaction staging.
//!
//! Writes made inside a transaction are staged and only become visible to
//! pool-level reads at commit, matching the gateway contract that partial
//! writes are never observable. The optimistic version check runs both at
//! write time and again at commit.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use wms_db::{InventoryStore, InventoryTx, StoreError};
use wms_domain::{Alert, FailedEvent, Material, Operation, OperationStatus, Slot};

#[derive(Default)]
struct State {
    slots: HashMap<String, Slot>,
    materials: HashMap<Uuid, Material>,
    operations: HashMap<Uuid, Operation>,
    alerts: Vec<Alert>,
    failed_events: Vec<FailedEvent>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // -- seeding -----------------------------------------------------------

    pub fn seed_slot(&self, slot: Slot) {
        self.state.lock().unwrap().slots.insert(slot.id.clone(), slot);
    }

    pub fn seed_material(&self, material: Material) {
        self.state
            .lock()
            .unwrap()
            .materials
            .insert(material.id, material);
    }

    pub fn seed_operation(&self, op: Operation) {
        self.state.lock().unwrap().operations.insert(op.id, op);
    }

    // -- snapshot assertions -----------------------------------------------

    pub fn slot(&self, id: &str) -> Option<Slot> {
        self.state.lock().unwrap().slots.get(id).cloned()
    }

    pub fn material(&self, id: Uuid) -> Option<Material> {
        self.state.lock().unwrap().materials.get(&id).cloned()
    }

    pub fn operation(&self, id: Uuid) -> Option<Operation> {
        self.state.lock().unwrap().operations.get(&id).cloned()
    }

    pub fn operations(&self) -> Vec<Operation> {
        self.state.lock().unwrap().operations.values().cloned().collect()
    }

    pub fn alerts(&self) -> Vec<Alert> {
        self.state.lock().unwrap().alerts.clone()
    }

    pub fn failed_events(&self) -> Vec<FailedEvent> {
        self.state.lock().unwrap().failed_events.clone()
    }
}

#[async_trait]
impl InventoryStore for MemoryStore {
    async fn fetch_slot(&self, id: &str) -> Result<Slot, StoreError> {
        self.state
            .lock()
            .unwrap()
            .slots
            .get(id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn fetch_material(&self, id: Uuid) -> Result<Material, StoreError> {
        self.state
            .lock()
            .unwrap()
            .materials
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn fetch_material_by_barcode(&self, barcode: &str) -> Result<Material, StoreError> {
        self.state
            .lock()
            .unwrap()
            .materials
            .values()
            .find(|m| m.barcode == barcode)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn fetch_operation(&self, id: Uuid) -> Result<Operation, StoreError> {
        self.state
            .lock()
            .unwrap()
            .operations
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn slots_for_shelf(&self, shelf_id: &str) -> Result<Vec<Slot>, StoreError> {
        let mut slots: Vec<Slot> = self
            .state
            .lock()
            .unwrap()
            .slots
            .values()
            .filter(|s| s.shelf_id == shelf_id)
            .cloned()
            .collect();
        slots.sort_by(|a, b| (a.row, a.column).cmp(&(b.row, b.column)));
        Ok(slots)
    }

    async fn empty_slots_for_shelf(&self, shelf_id: &str) -> Result<Vec<Slot>, StoreError> {
        let mut slots = self.slots_for_shelf(shelf_id).await?;
        slots.retain(|s| s.status == wms_domain::SlotStatus::Empty);
        Ok(slots)
    }

    async fn pending_ops_for_slot(
        &self,
        slot_id: &str,
        status: OperationStatus,
    ) -> Result<Vec<Operation>, StoreError> {
        let mut ops: Vec<Operation> = self
            .state
            .lock()
            .unwrap()
            .operations
            .values()
            .filter(|o| o.slot_id == slot_id && o.status == status)
            .cloned()
            .collect();
        ops.sort_by_key(|o| o.timestamp);
        Ok(ops)
    }

    async fn timed_out_pending(
        &self,
        status: OperationStatus,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Operation>, StoreError> {
        let mut ops: Vec<Operation> = self
            .state
            .lock()
            .unwrap()
            .operations
            .values()
            .filter(|o| o.status == status && o.timestamp < cutoff)
            .cloned()
            .collect();
        ops.sort_by_key(|o| o.timestamp);
        Ok(ops)
    }

    async fn search_materials(
        &self,
        query: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Material>, StoreError> {
        let needle = query.to_lowercase();
        let mut hits: Vec<Material> = self
            .state
            .lock()
            .unwrap()
            .materials
            .values()
            .filter(|m| {
                m.barcode.to_lowercase().contains(&needle)
                    || m.name.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect();
        hits.sort_by(|a, b| a.barcode.cmp(&b.barcode));
        Ok(hits
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn list_operations(&self, limit: i64, offset: i64) -> Result<Vec<Operation>, StoreError> {
        let mut ops: Vec<Operation> =
            self.state.lock().unwrap().operations.values().cloned().collect();
        ops.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(ops
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn insert_alert(&self, alert: &Alert) -> Result<(), StoreError> {
        self.state.lock().unwrap().alerts.push(alert.clone());
        Ok(())
    }

    async fn insert_failed_event(&self, event: &FailedEvent) -> Result<(), StoreError> {
        self.state.lock().unwrap().failed_events.push(event.clone());
        Ok(())
    }

    async fn list_unresolved_failed_events(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<FailedEvent>, StoreError> {
        let mut events: Vec<FailedEvent> = self
            .state
            .lock()
            .unwrap()
            .failed_events
            .iter()
            .filter(|e| !e.resolved)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.created_at);
        Ok(events
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn resolve_failed_event(&self, id: Uuid, notes: &str) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        let event = state
            .failed_events
            .iter_mut()
            .find(|e| e.id == id && !e.resolved)
            .ok_or(StoreError::NotFound)?;
        event.resolved = true;
        event.resolved_at = Some(Utc::now());
        event.resolution_notes = Some(notes.to_string());
        Ok(())
    }

    async fn begin(&self) -> Result<Box<dyn InventoryTx>, StoreError> {
        Ok(Box::new(MemoryTx {
            state: Arc::clone(&self.state),
            staged_slots: Vec::new(),
            staged_materials: Vec::new(),
            staged_op_inserts: Vec::new(),
            staged_op_updates: Vec::new(),
        }))
    }
}

// ---------------------------------------------------------------------------
// MemoryTx
// ---------------------------------------------------------------------------

pub struct MemoryTx {
    state: Arc<Mutex<State>>,
    staged_slots: Vec<Slot>,
    staged_materials: Vec<Material>,
    staged_op_inserts: Vec<Operation>,
    staged_op_updates: Vec<(Uuid, OperationStatus, OperationStatus, DateTime<Utc>)>,
}

impl MemoryTx {
    fn staged_slot(&self, id: &str) -> Option<&Slot> {
        self.staged_slots.iter().rev().find(|s| s.id == id)
    }

    fn staged_material(&self, id: Uuid) -> Option<&Material> {
        self.staged_materials.iter().rev().find(|m| m.id == id)
    }
}

#[async_trait]
impl InventoryTx for MemoryTx {
    async fn fetch_slot(&mut self, id: &str) -> Result<Slot, StoreError> {
        if let Some(slot) = self.staged_slot(id) {
            return Ok(slot.clone());
        }
        self.state
            .lock()
            .unwrap()
            .slots
            .get(id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn fetch_material(&mut self, id: Uuid) -> Result<Material, StoreError> {
        if let Some(material) = self.staged_material(id) {
            return Ok(material.clone());
        }
        self.state
            .lock()
            .unwrap()
            .materials
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn fetch_operation(&mut self, id: Uuid) -> Result<Operation, StoreError> {
        if let Some(op) = self.staged_op_inserts.iter().rev().find(|o| o.id == id) {
            return Ok(op.clone());
        }
        self.state
            .lock()
            .unwrap()
            .operations
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn update_slot(&mut self, slot: &Slot) -> Result<(), StoreError> {
        // Validate eagerly so a conflict surfaces at write time, as the SQL
        // implementation does; re-validated at commit.
        let current_version = match self.staged_slot(&slot.id) {
            Some(staged) => staged.version,
            None => self
                .state
                .lock()
                .unwrap()
                .slots
                .get(&slot.id)
                .ok_or(StoreError::NotFound)?
                .version,
        };
        if current_version != slot.version - 1 {
            return Err(StoreError::VersionConflict);
        }
        self.staged_slots.push(slot.clone());
        Ok(())
    }

    async fn update_material(&mut self, material: &Material) -> Result<(), StoreError> {
        if self.staged_material(material.id).is_none()
            && !self
                .state
                .lock()
                .unwrap()
                .materials
                .contains_key(&material.id)
        {
            return Err(StoreError::NotFound);
        }
        self.staged_materials.push(material.clone());
        Ok(())
    }

    async fn insert_operation(&mut self, op: &Operation) -> Result<(), StoreError> {
        self.staged_op_inserts.push(op.clone());
        Ok(())
    }

    async fn update_operation_status(
        &mut self,
        id: Uuid,
        from: OperationStatus,
        to: OperationStatus,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let current = self
            .state
            .lock()
            .unwrap()
            .operations
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)?;
        if current.status != from {
            return Err(StoreError::VersionConflict);
        }
        self.staged_op_updates.push((id, from, to, at));
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();

        // Re-validate every staged write against the committed view before
        // applying anything; all-or-nothing.
        let mut expected_versions: HashMap<String, i64> = HashMap::new();
        for slot in &self.staged_slots {
            let committed = state
                .slots
                .get(&slot.id)
                .ok_or(StoreError::NotFound)?
                .version;
            let expected = expected_versions.entry(slot.id.clone()).or_insert(committed);
            if *expected != slot.version - 1 {
                return Err(StoreError::VersionConflict);
            }
            *expected = slot.version;
        }
        for (id, from, _, _) in &self.staged_op_updates {
            let current = state.operations.get(id).ok_or(StoreError::NotFound)?;
            if current.status != *from {
                return Err(StoreError::VersionConflict);
            }
        }

        for slot in self.staged_slots {
            state.slots.insert(slot.id.clone(), slot);
        }
        for material in self.staged_materials {
            state.materials.insert(material.id, material);
        }
        for op in self.staged_op_inserts {
            state.operations.insert(op.id, op);
        }
        for (id, _, to, at) in self.staged_op_updates {
            if let Some(op) = state.operations.get_mut(&id) {
                op.status = to;
                op.timestamp = at;
            }
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        Ok(())
    }
}
