//! Durable record types. Each carries a schema version so a store opened by a
//! newer build can detect records it does not understand instead of silently
//! misreading them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const HOUSE_ITEM_SCHEMA_VERSION: u8 = 1;
pub const USER_SCHEMA_VERSION: u8 = 1;
pub const PET_SCHEMA_VERSION: u8 = 1;

/// One placed furniture item, seed, or incubator occupying a grid cell.
///
/// `id` is assigned by the store on creation and is the placement identity
/// clients use for move/remove/harvest; it is never client-supplied.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HouseItemRecord {
    pub id: String,
    pub owner_id: String,
    pub item_id: String,
    pub grid_x: i32,
    pub grid_y: i32,
    /// Epoch millis of planting; set only for seed placements.
    pub planted_at: Option<i64>,
    pub schema_version: u8,
}

/// Per-owner/per-item inventory count. Quantities are always positive;
/// zero-quantity entries are removed from the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InventoryEntry {
    pub item_id: String,
    pub quantity: u32,
}

/// Per-owner economy record. Balances only move by deltas.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserRecord {
    pub id: String,
    pub discord_id: String,
    pub coins: i64,
    pub gems: i64,
    pub xp: i64,
    pub last_login: DateTime<Utc>,
    pub schema_version: u8,
}

impl UserRecord {
    pub fn new(owner_id: &str, discord_id: &str) -> Self {
        Self {
            id: owner_id.to_string(),
            discord_id: discord_id.to_string(),
            coins: 0,
            gems: 0,
            xp: 0,
            last_login: Utc::now(),
            schema_version: USER_SCHEMA_VERSION,
        }
    }
}

/// A hatched pet. At most one pet per owner is active at a time, enforced by
/// the store's deactivate-all-then-activate-one sequencing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PetRecord {
    pub id: String,
    pub owner_id: String,
    pub pet_type: String,
    pub name: String,
    pub level: u32,
    pub hunger: u32,
    pub is_active: bool,
    pub hatched_at: DateTime<Utc>,
    pub schema_version: u8,
}

impl PetRecord {
    pub fn new(owner_id: &str, pet_type: &str, name: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            pet_type: pet_type.to_string(),
            name: name.to_string(),
            level: 1,
            hunger: 100,
            is_active: false,
            hatched_at: Utc::now(),
            schema_version: PET_SCHEMA_VERSION,
        }
    }
}
