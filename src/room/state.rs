//! Authoritative world state for one room, with change tracking.
//!
//! The session mutates the world only through the methods here, and every
//! mutation hands back a [`SyncEvent`] describing the delta. The session
//! serializes that event to every connected client, which is what keeps all
//! clients' views converged on the committed state. The maps themselves are
//! plain collections: the observable-map behavior lives in this wrapper,
//! not in the container type.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::room::messages::{PlayerEntry, ServerMessage};
use crate::store::HouseItemRecord;

/// One placed furniture item, seed, or incubator occupying a single grid cell.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlacedItem {
    pub id: String,
    pub item_id: String,
    pub grid_x: i32,
    pub grid_y: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planted_at: Option<i64>,
}

impl From<&HouseItemRecord> for PlacedItem {
    fn from(record: &HouseItemRecord) -> Self {
        Self {
            id: record.id.clone(),
            item_id: record.item_id.clone(),
            grid_x: record.grid_x,
            grid_y: record.grid_y,
            planted_at: record.planted_at,
        }
    }
}

/// Ephemeral per-connection info. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerInfo {
    pub discord_id: String,
    pub display_name: String,
}

/// Delta produced by a committed world mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    FurnitureAdded(PlacedItem),
    FurnitureUpdated(PlacedItem),
    FurnitureRemoved(String),
    PlayerJoined {
        session_id: String,
        player: PlayerInfo,
    },
    PlayerLeft {
        session_id: String,
    },
}

impl From<SyncEvent> for ServerMessage {
    fn from(event: SyncEvent) -> Self {
        match event {
            SyncEvent::FurnitureAdded(item) => ServerMessage::FurnitureAdded { item },
            SyncEvent::FurnitureUpdated(item) => ServerMessage::FurnitureUpdated { item },
            SyncEvent::FurnitureRemoved(id) => ServerMessage::FurnitureRemoved { id },
            SyncEvent::PlayerJoined { session_id, player } => ServerMessage::PlayerJoined {
                session_id,
                discord_id: player.discord_id,
                display_name: player.display_name,
            },
            SyncEvent::PlayerLeft { session_id } => ServerMessage::PlayerLeft { session_id },
        }
    }
}

/// The authoritative snapshot of one house: placed furniture plus connected
/// players. Invariant: no two placed items share a (grid_x, grid_y) cell.
#[derive(Debug)]
pub struct WorldState {
    pub owner_id: String,
    furniture: BTreeMap<String, PlacedItem>,
    players: BTreeMap<String, PlayerInfo>,
}

impl WorldState {
    pub fn new(owner_id: &str) -> Self {
        Self {
            owner_id: owner_id.to_string(),
            furniture: BTreeMap::new(),
            players: BTreeMap::new(),
        }
    }

    /// Load durable placements into the in-memory map (room creation).
    pub fn hydrate(&mut self, records: &[HouseItemRecord]) {
        for record in records {
            self.furniture.insert(record.id.clone(), record.into());
        }
    }

    pub fn furniture(&self, id: &str) -> Option<&PlacedItem> {
        self.furniture.get(id)
    }

    pub fn furniture_count(&self) -> usize {
        self.furniture.len()
    }

    pub fn furniture_snapshot(&self) -> Vec<PlacedItem> {
        self.furniture.values().cloned().collect()
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn players_snapshot(&self) -> Vec<PlayerEntry> {
        self.players
            .iter()
            .map(|(session_id, p)| PlayerEntry {
                session_id: session_id.clone(),
                discord_id: p.discord_id.clone(),
                display_name: p.display_name.clone(),
            })
            .collect()
    }

    /// True when any placement other than `exclude` already occupies (x, y).
    /// The exclusion is what lets an item move onto its own current cell.
    pub fn tile_occupied(&self, x: i32, y: i32, exclude: Option<&str>) -> bool {
        self.furniture
            .iter()
            .any(|(id, f)| Some(id.as_str()) != exclude && f.grid_x == x && f.grid_y == y)
    }

    pub fn insert_furniture(&mut self, item: PlacedItem) -> SyncEvent {
        self.furniture.insert(item.id.clone(), item.clone());
        SyncEvent::FurnitureAdded(item)
    }

    pub fn move_furniture(&mut self, id: &str, x: i32, y: i32) -> Option<SyncEvent> {
        let item = self.furniture.get_mut(id)?;
        item.grid_x = x;
        item.grid_y = y;
        Some(SyncEvent::FurnitureUpdated(item.clone()))
    }

    pub fn remove_furniture(&mut self, id: &str) -> Option<SyncEvent> {
        self.furniture
            .remove(id)
            .map(|_| SyncEvent::FurnitureRemoved(id.to_string()))
    }

    pub fn add_player(&mut self, session_id: &str, player: PlayerInfo) -> SyncEvent {
        self.players.insert(session_id.to_string(), player.clone());
        SyncEvent::PlayerJoined {
            session_id: session_id.to_string(),
            player,
        }
    }

    pub fn remove_player(&mut self, session_id: &str) -> Option<SyncEvent> {
        self.players.remove(session_id).map(|_| SyncEvent::PlayerLeft {
            session_id: session_id.to_string(),
        })
    }

    /// Check the occupancy invariant over the whole map. Test hook.
    #[cfg(test)]
    pub fn occupancy_is_unique(&self) -> bool {
        let mut seen = std::collections::HashSet::new();
        self.furniture
            .values()
            .all(|f| seen.insert((f.grid_x, f.grid_y)))
    }
}
