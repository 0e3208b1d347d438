//! Persistence gateway for owner-scoped game records.
//!
//! The [`Gateway`] trait is the seam between room sessions and durable storage:
//! per-owner CRUD for placed house items, inventory counts with
//! check-and-decrement, delta-based currency updates, and pet records with
//! "deactivate all, then activate one" sequencing. [`GameStore`] is the sled
//! implementation used in production; tests substitute fault-injecting
//! doubles to exercise the fail-closed behavior of the room handlers.

pub mod errors;
pub mod types;

use std::path::{Path, PathBuf};

use chrono::Utc;
use sled::IVec;
use uuid::Uuid;

pub use errors::StoreError;
pub use types::{
    HouseItemRecord, InventoryEntry, PetRecord, UserRecord, HOUSE_ITEM_SCHEMA_VERSION,
    PET_SCHEMA_VERSION, USER_SCHEMA_VERSION,
};

const TREE_HOUSE_ITEMS: &str = "house_items";
const TREE_INVENTORY: &str = "inventory";
const TREE_USERS: &str = "users";
const TREE_PETS: &str = "pets";

/// Durable record store consumed by room sessions and transaction services.
///
/// Implementations must be safe to call from multiple room tasks at once, but
/// read-modify-write cycles on a single owner's records are only ever issued
/// by that owner's room task, one handler at a time.
pub trait Gateway: Send + Sync {
    // House items
    fn house_items_for(&self, owner_id: &str) -> Result<Vec<HouseItemRecord>, StoreError>;
    /// Create a placement record; the store assigns the id.
    fn place_house_item(
        &self,
        owner_id: &str,
        item_id: &str,
        grid_x: i32,
        grid_y: i32,
        planted_at: Option<i64>,
    ) -> Result<HouseItemRecord, StoreError>;
    /// Update position by record id. Returns false when no such record exists.
    fn move_house_item(&self, id: &str, grid_x: i32, grid_y: i32) -> Result<bool, StoreError>;
    /// Delete by record id. Returns false when no such record exists.
    fn remove_house_item(&self, id: &str) -> Result<bool, StoreError>;

    // Inventory
    fn inventory_for(&self, owner_id: &str) -> Result<Vec<InventoryEntry>, StoreError>;
    fn inventory_count(&self, owner_id: &str, item_id: &str) -> Result<u32, StoreError>;
    fn credit_item(&self, owner_id: &str, item_id: &str, qty: u32) -> Result<u32, StoreError>;
    /// Check-and-decrement in one call. Returns false (and changes nothing)
    /// when the owner holds fewer than `qty`.
    fn debit_item(&self, owner_id: &str, item_id: &str, qty: u32) -> Result<bool, StoreError>;

    // Users
    fn user(&self, owner_id: &str) -> Result<Option<UserRecord>, StoreError>;
    /// Get-or-create, touching last_login — called on each join.
    fn ensure_user(&self, owner_id: &str, discord_id: &str) -> Result<UserRecord, StoreError>;
    /// Delta update; returns the new balance.
    fn adjust_coins(&self, owner_id: &str, delta: i64) -> Result<i64, StoreError>;
    /// Delta update; returns the new balance.
    fn adjust_gems(&self, owner_id: &str, delta: i64) -> Result<i64, StoreError>;
    /// Delta update; returns the new total.
    fn adjust_xp(&self, owner_id: &str, delta: i64) -> Result<i64, StoreError>;

    // Pets
    fn pets_for(&self, owner_id: &str) -> Result<Vec<PetRecord>, StoreError>;
    fn pet(&self, pet_id: &str) -> Result<Option<PetRecord>, StoreError>;
    /// Create an inactive pet; the store assigns the id.
    fn create_pet(&self, owner_id: &str, pet_type: &str, name: &str)
        -> Result<PetRecord, StoreError>;
    /// Deactivate every pet of the owner, then activate the named one.
    /// Returns false when the pet does not belong to this owner.
    fn set_active_pet(&self, owner_id: &str, pet_id: &str) -> Result<bool, StoreError>;
    fn update_pet_stats(&self, pet_id: &str, level: u32, hunger: u32) -> Result<(), StoreError>;
}

/// Helper builder so tests can easily create throwaway stores with custom paths.
pub struct GameStoreBuilder {
    path: PathBuf,
}

impl GameStoreBuilder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn open(self) -> Result<GameStore, StoreError> {
        GameStore::open(self.path)
    }
}

/// Sled-backed implementation of the persistence [`Gateway`].
pub struct GameStore {
    _db: sled::Db,
    house_items: sled::Tree,
    inventory: sled::Tree,
    users: sled::Tree,
    pets: sled::Tree,
}

impl GameStore {
    /// Open (or create) the game store rooted at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path_ref = path.as_ref();
        std::fs::create_dir_all(path_ref)?;
        let db = sled::open(path_ref)?;
        let house_items = db.open_tree(TREE_HOUSE_ITEMS)?;
        let inventory = db.open_tree(TREE_INVENTORY)?;
        let users = db.open_tree(TREE_USERS)?;
        let pets = db.open_tree(TREE_PETS)?;
        Ok(Self {
            _db: db,
            house_items,
            inventory,
            users,
            pets,
        })
    }

    /// Rough record counts, used by the `status` CLI subcommand.
    pub fn stats(&self) -> Result<StoreStats, StoreError> {
        Ok(StoreStats {
            house_items: self.house_items.scan_prefix(b"items:").count(),
            inventory_entries: self.inventory.len(),
            users: self.users.len(),
            pets: self.pets.scan_prefix(b"pets:").count(),
        })
    }

    /// Reject caller-supplied key components that would collide with the
    /// `prefix:{segment}:{rest}` key scheme. Record ids assigned by the store
    /// are uuids and never need this.
    fn check_segment(value: &str) -> Result<(), StoreError> {
        if crate::validation::is_safe_key_segment(value) {
            Ok(())
        } else {
            Err(StoreError::InvalidKey(value.to_string()))
        }
    }

    fn item_key(owner_id: &str, id: &str) -> Vec<u8> {
        format!("items:{}:{}", owner_id, id).into_bytes()
    }

    fn item_index_key(id: &str) -> Vec<u8> {
        format!("itemidx:{}", id).into_bytes()
    }

    fn inventory_key(owner_id: &str, item_id: &str) -> Vec<u8> {
        format!("inv:{}:{}", owner_id, item_id).into_bytes()
    }

    fn user_key(owner_id: &str) -> Vec<u8> {
        format!("users:{}", owner_id).into_bytes()
    }

    fn pet_key(owner_id: &str, pet_id: &str) -> Vec<u8> {
        format!("pets:{}:{}", owner_id, pet_id).into_bytes()
    }

    fn pet_index_key(pet_id: &str) -> Vec<u8> {
        format!("petidx:{}", pet_id).into_bytes()
    }

    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
        Ok(bincode::serialize(value)?)
    }

    fn deserialize<T: serde::de::DeserializeOwned>(bytes: IVec) -> Result<T, StoreError> {
        Ok(bincode::deserialize::<T>(&bytes)?)
    }

    fn load_house_item(&self, id: &str) -> Result<Option<(Vec<u8>, HouseItemRecord)>, StoreError> {
        let Some(owner_bytes) = self.house_items.get(Self::item_index_key(id))? else {
            return Ok(None);
        };
        let owner = String::from_utf8_lossy(&owner_bytes).to_string();
        let key = Self::item_key(&owner, id);
        let Some(bytes) = self.house_items.get(&key)? else {
            return Ok(None);
        };
        let record: HouseItemRecord = Self::deserialize(bytes)?;
        if record.schema_version != HOUSE_ITEM_SCHEMA_VERSION {
            return Err(StoreError::SchemaMismatch {
                entity: "house_item",
                expected: HOUSE_ITEM_SCHEMA_VERSION,
                found: record.schema_version,
            });
        }
        Ok(Some((key, record)))
    }

    fn put_user(&self, user: &UserRecord) -> Result<(), StoreError> {
        let bytes = Self::serialize(user)?;
        self.users.insert(Self::user_key(&user.id), bytes)?;
        self.users.flush()?;
        Ok(())
    }

    fn load_user(&self, owner_id: &str) -> Result<Option<UserRecord>, StoreError> {
        Self::check_segment(owner_id)?;
        let Some(bytes) = self.users.get(Self::user_key(owner_id))? else {
            return Ok(None);
        };
        let record: UserRecord = Self::deserialize(bytes)?;
        if record.schema_version != USER_SCHEMA_VERSION {
            return Err(StoreError::SchemaMismatch {
                entity: "user",
                expected: USER_SCHEMA_VERSION,
                found: record.schema_version,
            });
        }
        Ok(Some(record))
    }

    fn require_user(&self, owner_id: &str) -> Result<UserRecord, StoreError> {
        self.load_user(owner_id)?
            .ok_or_else(|| StoreError::NotFound(format!("user: {}", owner_id)))
    }

    fn put_pet(&self, pet: &PetRecord) -> Result<(), StoreError> {
        let bytes = Self::serialize(pet)?;
        self.pets.insert(Self::pet_key(&pet.owner_id, &pet.id), bytes)?;
        self.pets
            .insert(Self::pet_index_key(&pet.id), pet.owner_id.as_bytes())?;
        self.pets.flush()?;
        Ok(())
    }
}

/// Record counts reported by [`GameStore::stats`].
#[derive(Debug, Clone, Copy)]
pub struct StoreStats {
    pub house_items: usize,
    pub inventory_entries: usize,
    pub users: usize,
    pub pets: usize,
}

impl Gateway for GameStore {
    fn house_items_for(&self, owner_id: &str) -> Result<Vec<HouseItemRecord>, StoreError> {
        Self::check_segment(owner_id)?;
        let prefix = format!("items:{}:", owner_id);
        let mut records = Vec::new();
        for entry in self.house_items.scan_prefix(prefix.as_bytes()) {
            let (_, value) = entry?;
            let record: HouseItemRecord = Self::deserialize(value)?;
            if record.schema_version != HOUSE_ITEM_SCHEMA_VERSION {
                return Err(StoreError::SchemaMismatch {
                    entity: "house_item",
                    expected: HOUSE_ITEM_SCHEMA_VERSION,
                    found: record.schema_version,
                });
            }
            records.push(record);
        }
        Ok(records)
    }

    fn place_house_item(
        &self,
        owner_id: &str,
        item_id: &str,
        grid_x: i32,
        grid_y: i32,
        planted_at: Option<i64>,
    ) -> Result<HouseItemRecord, StoreError> {
        Self::check_segment(owner_id)?;
        Self::check_segment(item_id)?;
        let record = HouseItemRecord {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            item_id: item_id.to_string(),
            grid_x,
            grid_y,
            planted_at,
            schema_version: HOUSE_ITEM_SCHEMA_VERSION,
        };
        let bytes = Self::serialize(&record)?;
        self.house_items
            .insert(Self::item_key(owner_id, &record.id), bytes)?;
        self.house_items
            .insert(Self::item_index_key(&record.id), owner_id.as_bytes())?;
        self.house_items.flush()?;
        Ok(record)
    }

    fn move_house_item(&self, id: &str, grid_x: i32, grid_y: i32) -> Result<bool, StoreError> {
        let Some((key, mut record)) = self.load_house_item(id)? else {
            return Ok(false);
        };
        record.grid_x = grid_x;
        record.grid_y = grid_y;
        let bytes = Self::serialize(&record)?;
        self.house_items.insert(key, bytes)?;
        self.house_items.flush()?;
        Ok(true)
    }

    fn remove_house_item(&self, id: &str) -> Result<bool, StoreError> {
        let Some((key, _)) = self.load_house_item(id)? else {
            return Ok(false);
        };
        self.house_items.remove(key)?;
        self.house_items.remove(Self::item_index_key(id))?;
        self.house_items.flush()?;
        Ok(true)
    }

    fn inventory_for(&self, owner_id: &str) -> Result<Vec<InventoryEntry>, StoreError> {
        Self::check_segment(owner_id)?;
        let prefix = format!("inv:{}:", owner_id);
        let mut entries = Vec::new();
        for entry in self.inventory.scan_prefix(prefix.as_bytes()) {
            let (key, value) = entry?;
            let text = String::from_utf8_lossy(&key);
            let Some(item_id) = text.strip_prefix(prefix.as_str()) else {
                continue;
            };
            let quantity: u32 = Self::deserialize(value)?;
            entries.push(InventoryEntry {
                item_id: item_id.to_string(),
                quantity,
            });
        }
        Ok(entries)
    }

    fn inventory_count(&self, owner_id: &str, item_id: &str) -> Result<u32, StoreError> {
        Self::check_segment(owner_id)?;
        Self::check_segment(item_id)?;
        match self.inventory.get(Self::inventory_key(owner_id, item_id))? {
            Some(bytes) => Self::deserialize(bytes),
            None => Ok(0),
        }
    }

    fn credit_item(&self, owner_id: &str, item_id: &str, qty: u32) -> Result<u32, StoreError> {
        let current = self.inventory_count(owner_id, item_id)?;
        let updated = current.saturating_add(qty);
        let bytes = Self::serialize(&updated)?;
        self.inventory
            .insert(Self::inventory_key(owner_id, item_id), bytes)?;
        self.inventory.flush()?;
        Ok(updated)
    }

    fn debit_item(&self, owner_id: &str, item_id: &str, qty: u32) -> Result<bool, StoreError> {
        let current = self.inventory_count(owner_id, item_id)?;
        if current < qty {
            return Ok(false);
        }
        let key = Self::inventory_key(owner_id, item_id);
        let remaining = current - qty;
        if remaining == 0 {
            // Zero-quantity rows are dropped rather than stored
            self.inventory.remove(key)?;
        } else {
            let bytes = Self::serialize(&remaining)?;
            self.inventory.insert(key, bytes)?;
        }
        self.inventory.flush()?;
        Ok(true)
    }

    fn user(&self, owner_id: &str) -> Result<Option<UserRecord>, StoreError> {
        self.load_user(owner_id)
    }

    fn ensure_user(&self, owner_id: &str, discord_id: &str) -> Result<UserRecord, StoreError> {
        if let Some(mut user) = self.load_user(owner_id)? {
            user.last_login = Utc::now();
            self.put_user(&user)?;
            return Ok(user);
        }
        let user = UserRecord::new(owner_id, discord_id);
        self.put_user(&user)?;
        Ok(user)
    }

    fn adjust_coins(&self, owner_id: &str, delta: i64) -> Result<i64, StoreError> {
        let mut user = self.require_user(owner_id)?;
        user.coins += delta;
        self.put_user(&user)?;
        Ok(user.coins)
    }

    fn adjust_gems(&self, owner_id: &str, delta: i64) -> Result<i64, StoreError> {
        let mut user = self.require_user(owner_id)?;
        user.gems += delta;
        self.put_user(&user)?;
        Ok(user.gems)
    }

    fn adjust_xp(&self, owner_id: &str, delta: i64) -> Result<i64, StoreError> {
        let mut user = self.require_user(owner_id)?;
        user.xp += delta;
        self.put_user(&user)?;
        Ok(user.xp)
    }

    fn pets_for(&self, owner_id: &str) -> Result<Vec<PetRecord>, StoreError> {
        Self::check_segment(owner_id)?;
        let prefix = format!("pets:{}:", owner_id);
        let mut pets = Vec::new();
        for entry in self.pets.scan_prefix(prefix.as_bytes()) {
            let (_, value) = entry?;
            let pet: PetRecord = Self::deserialize(value)?;
            if pet.schema_version != PET_SCHEMA_VERSION {
                return Err(StoreError::SchemaMismatch {
                    entity: "pet",
                    expected: PET_SCHEMA_VERSION,
                    found: pet.schema_version,
                });
            }
            pets.push(pet);
        }
        Ok(pets)
    }

    fn pet(&self, pet_id: &str) -> Result<Option<PetRecord>, StoreError> {
        let Some(owner_bytes) = self.pets.get(Self::pet_index_key(pet_id))? else {
            return Ok(None);
        };
        let owner = String::from_utf8_lossy(&owner_bytes).to_string();
        let Some(bytes) = self.pets.get(Self::pet_key(&owner, pet_id))? else {
            return Ok(None);
        };
        Ok(Some(Self::deserialize(bytes)?))
    }

    fn create_pet(
        &self,
        owner_id: &str,
        pet_type: &str,
        name: &str,
    ) -> Result<PetRecord, StoreError> {
        Self::check_segment(owner_id)?;
        let pet = PetRecord::new(owner_id, pet_type, name);
        self.put_pet(&pet)?;
        Ok(pet)
    }

    fn set_active_pet(&self, owner_id: &str, pet_id: &str) -> Result<bool, StoreError> {
        // Deactivate all first, then activate the selected one. Two passes so
        // a store without multi-row transactions can't end up with two actives.
        let pets = self.pets_for(owner_id)?;
        for mut pet in pets.iter().filter(|p| p.is_active).cloned() {
            pet.is_active = false;
            self.put_pet(&pet)?;
        }
        let Some(mut target) = pets.into_iter().find(|p| p.id == pet_id) else {
            return Ok(false);
        };
        target.is_active = true;
        self.put_pet(&target)?;
        Ok(true)
    }

    fn update_pet_stats(&self, pet_id: &str, level: u32, hunger: u32) -> Result<(), StoreError> {
        let Some(mut pet) = self.pet(pet_id)? else {
            return Err(StoreError::NotFound(format!("pet: {}", pet_id)));
        };
        pet.level = level;
        pet.hunger = hunger;
        self.put_pet(&pet)?;
        Ok(())
    }
}
