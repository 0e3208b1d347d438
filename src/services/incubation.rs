//! Egg gacha and pet incubation rules.
//!
//! The gacha roll walks the catalog's pet types in stable enumeration order,
//! accumulating normalized weights, and returns the first type whose
//! cumulative weight reaches the drawn value. Hatch progress and hunger decay
//! are pure timestamp arithmetic, mirroring the growth rules.

use serde::Serialize;

use crate::catalog::{Catalog, PetTypeConfig};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HatchStage {
    Incubating,
    Ready,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HatchStatus {
    pub stage: HatchStage,
    pub progress: f64,
    pub remaining_ms: i64,
}

/// Weighted random selection of a pet type. `rand` must be in `[0, 1)`;
/// callers draw it from a uniform RNG in production and pass fixed values in
/// tests.
pub fn roll_gacha(catalog: &Catalog, rand: f64) -> &PetTypeConfig {
    let total: u32 = catalog.pet_types().map(|p| p.weight).sum();
    let mut cumulative = 0.0;
    let mut last = None;
    for pet in catalog.pet_types() {
        cumulative += pet.weight as f64 / total as f64;
        if rand <= cumulative {
            return pet;
        }
        last = Some(pet);
    }
    // Unreachable for rand < 1 unless float rounding shaves the final bucket
    last.expect("catalog has at least one pet type")
}

/// Open an egg: a gacha roll with an optional injected draw.
pub fn open_egg(catalog: &Catalog, rand: Option<f64>) -> &PetTypeConfig {
    roll_gacha(catalog, rand.unwrap_or_else(rand::random::<f64>))
}

/// Check incubation progress. Returns `None` for unknown pet types.
pub fn check_hatch(
    catalog: &Catalog,
    hatch_start: i64,
    pet_type: &str,
    now: i64,
) -> Option<HatchStatus> {
    let config = catalog.pet_type(pet_type)?;

    let ready_time = hatch_start + config.hatch_time_ms;
    if now >= ready_time {
        return Some(HatchStatus {
            stage: HatchStage::Ready,
            progress: 1.0,
            remaining_ms: 0,
        });
    }

    let elapsed = now - hatch_start;
    Some(HatchStatus {
        stage: HatchStage::Incubating,
        progress: (elapsed as f64 / config.hatch_time_ms as f64).min(1.0),
        remaining_ms: ready_time - now,
    })
}

/// Decay `current` hunger by the pet type's hourly rate over `elapsed_ms`,
/// floored at 0 and rounded to the nearest point. Unknown pet types decay
/// nothing.
pub fn calculate_hunger(catalog: &Catalog, current: u32, pet_type: &str, elapsed_ms: i64) -> u32 {
    let Some(config) = catalog.pet_type(pet_type) else {
        return current;
    };
    // Clock skew can make the stored feed timestamp sit in the future;
    // hunger never rises from mere passage of (negative) time.
    let hours = elapsed_ms.max(0) as f64 / (1000.0 * 60.0 * 60.0);
    let decayed = current as f64 - config.hunger_decay_per_hour * hours;
    decayed.max(0.0).round() as u32
}
