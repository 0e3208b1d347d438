//! Wire protocol: one tagged message type per client request, decoded and
//! validated at the boundary before any handler logic runs, plus the server's
//! acks, errors, and state-sync events.
//!
//! Frames are JSON objects `{"type": ..., "payload": ...}`, one per line on
//! the TCP transport. Message names are SCREAMING_SNAKE for requests and
//! snake_case for server messages; payload fields are camelCase, matching
//! what game clients already speak.

use serde::{Deserialize, Serialize};

use crate::catalog::{HarvestYield, Rarity};
use crate::room::state::PlacedItem;
use crate::store::InventoryEntry;

/// Client-to-server request. The `JOIN` and `VISIT` messages are
/// room-membership events handled by the registry; everything else is a world
/// mutation handled inside the room session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload")]
pub enum ClientMessage {
    #[serde(rename = "JOIN")]
    Join(JoinPayload),
    #[serde(rename = "PLACE_ITEM")]
    PlaceItem(PlaceItemPayload),
    #[serde(rename = "REMOVE_ITEM")]
    RemoveItem(RemoveItemPayload),
    #[serde(rename = "MOVE_ITEM")]
    MoveItem(MoveItemPayload),
    #[serde(rename = "PLANT_SEED")]
    PlantSeed(PlantSeedPayload),
    #[serde(rename = "HARVEST")]
    Harvest(HarvestPayload),
    #[serde(rename = "BUY_ITEM")]
    BuyItem(BuyItemPayload),
    #[serde(rename = "HATCH_EGG")]
    HatchEgg(HatchEggPayload),
    #[serde(rename = "SET_ACTIVE_PET")]
    SetActivePet(SetActivePetPayload),
    #[serde(rename = "PURCHASE_GEMS")]
    PurchaseGems(PurchaseGemsPayload),
    #[serde(rename = "VISIT")]
    Visit(VisitPayload),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JoinPayload {
    pub owner_id: String,
    pub discord_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlaceItemPayload {
    pub item_id: String,
    pub grid_x: i32,
    pub grid_y: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RemoveItemPayload {
    /// ID of the placed house item record
    pub house_item_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MoveItemPayload {
    pub house_item_id: String,
    pub grid_x: i32,
    pub grid_y: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlantSeedPayload {
    pub seed_item_id: String,
    pub grid_x: i32,
    pub grid_y: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HarvestPayload {
    pub house_item_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BuyItemPayload {
    pub item_id: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HatchEggPayload {
    /// Grid coordinates of the incubator tile
    pub grid_x: i32,
    pub grid_y: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SetActivePetPayload {
    pub pet_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseGemsPayload {
    pub sku_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VisitPayload {
    /// Owner id of the friend's house to visit
    pub owner_id: String,
}

/// A pet record as clients see it. Hunger is decayed to "now" when the list
/// is built; rarity comes from the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PetView {
    pub id: String,
    pub pet_type: String,
    pub name: String,
    pub level: u32,
    pub hunger: u32,
    pub is_active: bool,
    pub rarity: Rarity,
}

/// Server-to-client message: acks and errors (requester only) plus sync
/// events (broadcast to every client in the room).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ServerMessage {
    #[serde(rename_all = "camelCase")]
    PlaceOk { id: String },
    #[serde(rename_all = "camelCase")]
    RemoveOk { id: String },
    #[serde(rename_all = "camelCase")]
    MoveOk { id: String },
    #[serde(rename_all = "camelCase")]
    PlantOk { id: String, planted_at: i64 },
    #[serde(rename_all = "camelCase")]
    HarvestOk {
        id: String,
        rewards: Vec<HarvestYield>,
        coins: i64,
    },
    #[serde(rename_all = "camelCase")]
    BuyOk {
        item_id: String,
        quantity: u32,
        cost: i64,
        new_balance: i64,
    },
    #[serde(rename_all = "camelCase")]
    HatchOk {
        pet_id: String,
        pet_type: String,
        name: String,
        rarity: Rarity,
    },
    #[serde(rename_all = "camelCase")]
    PetActivated {
        pet_id: String,
        growth_speed_mod: f64,
    },
    #[serde(rename_all = "camelCase")]
    PurchaseOk {
        sku_id: String,
        gems_granted: i64,
        new_gem_balance: i64,
    },
    #[serde(rename_all = "camelCase")]
    Error { message: String, retryable: bool },

    // Join-time pushes (requester only)
    PetsList(Vec<PetView>),
    InventoryList(Vec<InventoryEntry>),
    #[serde(rename_all = "camelCase")]
    WorldSnapshot {
        owner_id: String,
        furniture: Vec<PlacedItem>,
        players: Vec<PlayerEntry>,
    },

    // Sync events (broadcast)
    #[serde(rename_all = "camelCase")]
    FurnitureAdded { item: PlacedItem },
    #[serde(rename_all = "camelCase")]
    FurnitureUpdated { item: PlacedItem },
    #[serde(rename_all = "camelCase")]
    FurnitureRemoved { id: String },
    #[serde(rename_all = "camelCase")]
    PlayerJoined {
        session_id: String,
        discord_id: String,
        display_name: String,
    },
    #[serde(rename_all = "camelCase")]
    PlayerLeft { session_id: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerEntry {
    pub session_id: String,
    pub discord_id: String,
    pub display_name: String,
}

impl ServerMessage {
    pub fn error(err: &crate::room::RoomError) -> Self {
        ServerMessage::Error {
            message: err.to_string(),
            retryable: err.is_retryable(),
        }
    }
}
