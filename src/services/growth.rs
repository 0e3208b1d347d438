//! Crop growth rules, derived purely from timestamps.
//!
//! Nothing here schedules timers: a planted seed is just a `planted_at`
//! timestamp, and its stage is recomputed from `now` whenever someone asks.

use serde::Serialize;

use crate::catalog::{Catalog, PlantConfig};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GrowthStage {
    Growing,
    Ready,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GrowthStatus {
    pub stage: GrowthStage,
    /// Progress from 0 to 1 (1 = fully grown)
    pub progress: f64,
    /// Milliseconds remaining until ready (0 if already ready)
    pub remaining_ms: i64,
}

/// Check the growth status of a planted seed.
///
/// Returns `None` for unknown seeds. `speed_modifier` is multiplied into the
/// base growth time: below 1 accelerates growth (active-pet bonus), above 1
/// slows it.
pub fn check_growth(
    catalog: &Catalog,
    planted_at: i64,
    seed_item_id: &str,
    now: i64,
    speed_modifier: f64,
) -> Option<GrowthStatus> {
    let config = catalog.plant(seed_item_id)?;

    let effective_growth_ms = (config.growth_time_ms as f64 * speed_modifier) as i64;
    let ready_time = planted_at + effective_growth_ms;

    if now >= ready_time {
        return Some(GrowthStatus {
            stage: GrowthStage::Ready,
            progress: 1.0,
            remaining_ms: 0,
        });
    }

    let elapsed = now - planted_at;
    Some(GrowthStatus {
        stage: GrowthStage::Growing,
        progress: (elapsed as f64 / effective_growth_ms as f64).min(1.0),
        remaining_ms: ready_time - now,
    })
}

/// Validate a harvest attempt. Returns the plant config only when the crop is
/// fully grown; `None` otherwise (unknown seed or not ready).
pub fn validate_harvest<'a>(
    catalog: &'a Catalog,
    planted_at: i64,
    seed_item_id: &str,
    now: i64,
    speed_modifier: f64,
) -> Option<&'a PlantConfig> {
    let status = check_growth(catalog, planted_at, seed_item_id, now, speed_modifier)?;
    if status.stage == GrowthStage::Ready {
        catalog.plant(seed_item_id)
    } else {
        None
    }
}
