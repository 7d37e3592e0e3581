use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::alert::AlertSeverity;
use crate::slot::{Slot, SlotStatus};

/// Occupancy summary for one shelf, served from the advisory cache when warm.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShelfStatusSummary {
    pub shelf_id: String,
    pub total_slots: usize,
    pub empty_slots: usize,
    pub occupied_slots: usize,
    pub updated_at: DateTime<Utc>,
}

impl ShelfStatusSummary {
    pub fn from_slots(shelf_id: impl Into<String>, slots: &[Slot], now: DateTime<Utc>) -> Self {
        let mut empty = 0;
        let mut occupied = 0;
        for slot in slots {
            match slot.status {
                SlotStatus::Empty => empty += 1,
                SlotStatus::Occupied => occupied += 1,
                _ => {}
            }
        }
        Self {
            shelf_id: shelf_id.into(),
            total_slots: slots.len(),
            empty_slots: empty,
            occupied_slots: occupied,
            updated_at: now,
        }
    }
}

/// Health report for one shelf.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShelfHealth {
    pub shelf_id: String,
    pub total_slots: usize,
    pub healthy_slots: usize,
    pub error_slots: usize,
    pub maintenance_slots: usize,
    pub health_score: f64,
    pub last_check_time: DateTime<Utc>,
}

impl ShelfHealth {
    /// A slot is healthy iff empty or occupied, in maintenance iff
    /// `Maintenance`, and an error otherwise. A shelf with no slots scores
    /// 100 (nothing is wrong with it).
    pub fn from_slots(shelf_id: impl Into<String>, slots: &[Slot], now: DateTime<Utc>) -> Self {
        let mut healthy = 0;
        let mut maintenance = 0;
        let mut error = 0;
        for slot in slots {
            if slot.status.is_healthy() {
                healthy += 1;
            } else if slot.status == SlotStatus::Maintenance {
                maintenance += 1;
            } else {
                error += 1;
            }
        }
        let score = if slots.is_empty() {
            100.0
        } else {
            healthy as f64 / slots.len() as f64 * 100.0
        };
        Self {
            shelf_id: shelf_id.into(),
            total_slots: slots.len(),
            healthy_slots: healthy,
            error_slots: error,
            maintenance_slots: maintenance,
            health_score: score,
            last_check_time: now,
        }
    }

    /// Scores of 95 and above are considered nominal; no alert is raised.
    pub fn needs_alert(&self) -> bool {
        self.health_score < 95.0
    }
}

/// Severity band for a degraded health score.
pub fn severity_for_health_score(score: f64) -> AlertSeverity {
    if score < 80.0 {
        AlertSeverity::Critical
    } else if score < 90.0 {
        AlertSeverity::High
    } else if score < 95.0 {
        AlertSeverity::Medium
    } else {
        AlertSeverity::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn slot(status: SlotStatus) -> Slot {
        Slot {
            id: "SHELF-A-1-1".to_string(),
            shelf_id: "SHELF-A".to_string(),
            row: 1,
            column: 1,
            status,
            material_id: if status == SlotStatus::Occupied {
                Some(Uuid::new_v4())
            } else {
                None
            },
            updated_at: Utc::now(),
            version: 1,
        }
    }

    #[test]
    fn empty_shelf_scores_100_without_alert() {
        let h = ShelfHealth::from_slots("SHELF-A", &[], Utc::now());
        assert_eq!(h.health_score, 100.0);
        assert!(!h.needs_alert());
    }

    #[test]
    fn all_healthy_scores_100() {
        let slots = vec![slot(SlotStatus::Empty), slot(SlotStatus::Occupied)];
        let h = ShelfHealth::from_slots("SHELF-A", &slots, Utc::now());
        assert_eq!(h.health_score, 100.0);
        assert!(!h.needs_alert());
    }

    #[test]
    fn severity_bands_at_boundaries() {
        assert_eq!(severity_for_health_score(100.0), AlertSeverity::Low);
        assert_eq!(severity_for_health_score(95.0), AlertSeverity::Low);
        assert_eq!(severity_for_health_score(94.999), AlertSeverity::Medium);
        assert_eq!(severity_for_health_score(90.0), AlertSeverity::Medium);
        assert_eq!(severity_for_health_score(89.999), AlertSeverity::High);
        assert_eq!(severity_for_health_score(80.0), AlertSeverity::High);
        assert_eq!(severity_for_health_score(79.999), AlertSeverity::Critical);
    }

    #[test]
    fn maintenance_and_error_slots_counted_separately() {
        let slots = vec![
            slot(SlotStatus::Empty),
            slot(SlotStatus::Maintenance),
            slot(SlotStatus::RemovalPending),
            slot(SlotStatus::Occupied),
        ];
        let h = ShelfHealth::from_slots("SHELF-A", &slots, Utc::now());
        assert_eq!(h.healthy_slots, 2);
        assert_eq!(h.maintenance_slots, 1);
        assert_eq!(h.error_slots, 1);
        assert_eq!(h.health_score, 50.0);
        assert!(h.needs_alert());
    }

    #[test]
    fn summary_counts_empty_and_occupied() {
        let slots = vec![
            slot(SlotStatus::Empty),
            slot(SlotStatus::Empty),
            slot(SlotStatus::Occupied),
            slot(SlotStatus::Reserved),
        ];
        let s = ShelfStatusSummary::from_slots("SHELF-A", &slots, Utc::now());
        assert_eq!(s.total_slots, 4);
        assert_eq!(s.empty_slots, 2);
        assert_eq!(s.occupied_slots, 1);
    }
}
