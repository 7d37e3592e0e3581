//! Read paths: shelf status (cache-first), shelf health, optimal slot,
//! material search and the operation trail.

use chrono::Utc;
use tracing::debug;

use wms_domain::events::{self, ShelfHealthAlert};
use wms_domain::{
    severity_for_health_score, InventoryError, Material, Operation, ShelfHealth,
    ShelfStatusSummary, Slot,
};

use crate::coordinator::InventoryCoordinator;

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 200;

impl InventoryCoordinator {
    /// Cache-first occupancy summary; a miss recomputes from storage and
    /// repopulates the cache.
    pub async fn get_shelf_status(
        &self,
        shelf_id: &str,
    ) -> Result<ShelfStatusSummary, InventoryError> {
        if let Some(summary) = self.cache.summary(shelf_id).await {
            debug!(shelf_id, "shelf summary served from cache");
            return Ok(summary);
        }

        let slots = self.store.slots_for_shelf(shelf_id).await?;
        let summary = ShelfStatusSummary::from_slots(shelf_id, &slots, Utc::now());
        self.cache.store_summary(&summary).await;
        Ok(summary)
    }

    /// Compute the shelf health score; a degraded score (< 95) publishes a
    /// `shelf.health_alert` with a severity derived from how far it fell.
    pub async fn health_check_shelf(&self, shelf_id: &str) -> Result<ShelfHealth, InventoryError> {
        let slots = self.store.slots_for_shelf(shelf_id).await?;
        let health = ShelfHealth::from_slots(shelf_id, &slots, Utc::now());

        if health.needs_alert() {
            let severity = severity_for_health_score(health.health_score);
            self.emit(
                events::SHELF_HEALTH_ALERT,
                shelf_id,
                ShelfHealthAlert {
                    shelf_id: shelf_id.to_string(),
                    health_score: health.health_score,
                    total_slots: health.total_slots,
                    healthy_slots: health.healthy_slots,
                    error_slots: health.error_slots,
                    severity: severity.as_str().to_string(),
                    message: format!(
                        "shelf {shelf_id} health score is {:.2}%",
                        health.health_score
                    ),
                },
            )
            .await;
        }

        Ok(health)
    }

    /// First-fit: the first empty slot on the shelf that accepts the
    /// material type.
    pub async fn find_optimal_slot(
        &self,
        material_type: &str,
        shelf_id: &str,
    ) -> Result<Slot, InventoryError> {
        let slots = self.store.empty_slots_for_shelf(shelf_id).await?;
        slots
            .into_iter()
            .find(|slot| slot.accepts_material_type(material_type))
            .ok_or_else(|| InventoryError::not_found("no empty slots available"))
    }

    pub async fn search_materials(
        &self,
        query: &str,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Material>, InventoryError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(InventoryError::validation("search query is required"));
        }
        let (limit, offset) = page(limit, offset)?;
        Ok(self.store.search_materials(query, limit, offset).await?)
    }

    pub async fn get_operations(
        &self,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Operation>, InventoryError> {
        let (limit, offset) = page(limit, offset)?;
        Ok(self.store.list_operations(limit, offset).await?)
    }
}

fn page(limit: Option<i64>, offset: Option<i64>) -> Result<(i64, i64), InventoryError> {
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE);
    let offset = offset.unwrap_or(0);
    if limit <= 0 || limit > MAX_PAGE_SIZE {
        return Err(InventoryError::validation(format!(
            "limit must be between 1 and {MAX_PAGE_SIZE}"
        )));
    }
    if offset < 0 {
        return Err(InventoryError::validation("offset must not be negative"));
    }
    Ok((limit, offset))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_defaults_and_bounds() {
        assert_eq!(page(None, None).unwrap(), (50, 0));
        assert_eq!(page(Some(10), Some(5)).unwrap(), (10, 5));
        assert!(page(Some(0), None).is_err());
        assert!(page(Some(201), None).is_err());
        assert!(page(None, Some(-1)).is_err());
    }
}
