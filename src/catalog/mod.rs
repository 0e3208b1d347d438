//! Static game catalog: item, plant, pet-type, and IAP SKU definitions.
//!
//! The catalog is the authoritative source for prices, growth times, gacha
//! weights, and SKU contents. It is built once at process start
//! ([`Catalog::standard`]) and handed to every component that needs lookups;
//! nothing mutates it at runtime. Clients may carry a copy for UI display but
//! the server always validates against its own tables.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ItemCategory {
    Furniture,
    Decoration,
    Seed,
    Special,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Currency {
    Coins,
    Gems,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Legendary,
}

/// One purchasable/placeable item type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemDef {
    pub id: String,
    pub name: String,
    pub category: ItemCategory,
    pub price: i64,
    pub currency: Currency,
    pub size_x: i32,
    pub size_y: i32,
}

/// Yield granted when a crop is harvested.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HarvestYield {
    pub item_id: String,
    pub quantity: u32,
}

/// Seed/plant configuration. Growth times are in milliseconds so the server
/// can compare raw epoch timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlantConfig {
    pub seed_item_id: String,
    pub name: String,
    pub growth_time_ms: i64,
    pub harvest_yield: Vec<HarvestYield>,
    /// Coins awarded on harvest
    pub coin_reward: i64,
    /// XP awarded on harvest
    pub xp_reward: i64,
}

/// One hatchable pet type with its gacha weight and bonuses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PetTypeConfig {
    pub pet_type: String,
    pub name: String,
    pub rarity: Rarity,
    /// Weight for gacha drop — higher = more common
    pub weight: u32,
    /// Hatch duration in milliseconds
    pub hatch_time_ms: i64,
    /// Multiplied into plant growth_time_ms (lower = faster)
    pub growth_speed_mod: f64,
    /// Hunger decay per hour
    pub hunger_decay_per_hour: f64,
}

/// In-app purchase SKU. Prices live server-side for anti-cheat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkuDef {
    pub sku_id: String,
    pub name: String,
    pub description: String,
    /// Price in USD cents
    pub price_usd_cents: u32,
    /// Gems granted
    pub gems: i64,
    /// Bonus items included (starter pack etc.)
    #[serde(default)]
    pub bonus_items: Vec<HarvestYield>,
}

/// Read-only lookup tables for everything the game defines statically.
///
/// BTreeMaps keep enumeration order stable, which the gacha roll depends on.
#[derive(Debug, Clone)]
pub struct Catalog {
    items: BTreeMap<String, ItemDef>,
    plants: BTreeMap<String, PlantConfig>,
    pet_types: BTreeMap<String, PetTypeConfig>,
    skus: BTreeMap<String, SkuDef>,
}

impl Catalog {
    /// The standard MVP catalog.
    pub fn standard() -> Self {
        let mut items = BTreeMap::new();
        for def in [
            item("chair_wood", "Wooden Chair", ItemCategory::Furniture, 50, 1, 1),
            item("table_wood", "Wooden Table", ItemCategory::Furniture, 100, 2, 1),
            item("rug_red", "Red Rug", ItemCategory::Decoration, 75, 2, 2),
            item("lamp_floor", "Floor Lamp", ItemCategory::Decoration, 60, 1, 1),
            item("pot_flower", "Flower Pot", ItemCategory::Decoration, 30, 1, 1),
            item("seed_mint", "Mint Seeds", ItemCategory::Seed, 10, 1, 1),
            item("seed_tomato", "Tomato Seeds", ItemCategory::Seed, 20, 1, 1),
            item("seed_sunflower", "Sunflower Seeds", ItemCategory::Seed, 35, 1, 1),
            item("egg_basic", "Mystery Egg", ItemCategory::Special, 100, 1, 1),
        ] {
            items.insert(def.id.clone(), def);
        }

        let mut plants = BTreeMap::new();
        for cfg in [
            PlantConfig {
                seed_item_id: "seed_mint".into(),
                name: "Mint".into(),
                growth_time_ms: 60_000,
                harvest_yield: vec![yield_of("herb_mint", 2)],
                coin_reward: 25,
                xp_reward: 10,
            },
            PlantConfig {
                seed_item_id: "seed_tomato".into(),
                name: "Tomato".into(),
                growth_time_ms: 120_000,
                harvest_yield: vec![yield_of("fruit_tomato", 3)],
                coin_reward: 40,
                xp_reward: 15,
            },
            PlantConfig {
                seed_item_id: "seed_sunflower".into(),
                name: "Sunflower".into(),
                growth_time_ms: 180_000,
                harvest_yield: vec![yield_of("flower_sunflower", 1)],
                coin_reward: 60,
                xp_reward: 25,
            },
        ] {
            plants.insert(cfg.seed_item_id.clone(), cfg);
        }

        let mut pet_types = BTreeMap::new();
        for cfg in [
            PetTypeConfig {
                pet_type: "slime_grass".into(),
                name: "Grass Slime".into(),
                rarity: Rarity::Common,
                weight: 50,
                hatch_time_ms: 60_000,
                growth_speed_mod: 0.9,
                hunger_decay_per_hour: 10.0,
            },
            PetTypeConfig {
                pet_type: "bunny_snow".into(),
                name: "Snow Bunny".into(),
                rarity: Rarity::Common,
                weight: 40,
                hatch_time_ms: 60_000,
                growth_speed_mod: 0.85,
                hunger_decay_per_hour: 12.0,
            },
            PetTypeConfig {
                pet_type: "fox_ember".into(),
                name: "Ember Fox".into(),
                rarity: Rarity::Uncommon,
                weight: 20,
                hatch_time_ms: 120_000,
                growth_speed_mod: 0.75,
                hunger_decay_per_hour: 8.0,
            },
            PetTypeConfig {
                pet_type: "dragon_fire".into(),
                name: "Fire Dragon".into(),
                rarity: Rarity::Rare,
                weight: 8,
                hatch_time_ms: 180_000,
                growth_speed_mod: 0.6,
                hunger_decay_per_hour: 15.0,
            },
            PetTypeConfig {
                pet_type: "phoenix_gold".into(),
                name: "Golden Phoenix".into(),
                rarity: Rarity::Legendary,
                weight: 2,
                hatch_time_ms: 300_000,
                growth_speed_mod: 0.5,
                hunger_decay_per_hour: 5.0,
            },
        ] {
            pet_types.insert(cfg.pet_type.clone(), cfg);
        }

        let mut skus = BTreeMap::new();
        for sku in [
            SkuDef {
                sku_id: "com.game.pouch_gems_small".into(),
                name: "Small Gem Pouch".into(),
                description: "100 Gems".into(),
                price_usd_cents: 99,
                gems: 100,
                bonus_items: vec![],
            },
            SkuDef {
                sku_id: "com.game.pouch_gems_medium".into(),
                name: "Medium Gem Pouch".into(),
                description: "550 Gems - Best Value!".into(),
                price_usd_cents: 499,
                gems: 550,
                bonus_items: vec![],
            },
            SkuDef {
                sku_id: "com.game.starter_pack".into(),
                name: "Starter Pack".into(),
                description: "Pet Egg + 200 Gems".into(),
                price_usd_cents: 299,
                gems: 200,
                bonus_items: vec![yield_of("egg_basic", 1)],
            },
        ] {
            skus.insert(sku.sku_id.clone(), sku);
        }

        Self {
            items,
            plants,
            pet_types,
            skus,
        }
    }

    pub fn item(&self, item_id: &str) -> Option<&ItemDef> {
        self.items.get(item_id)
    }

    pub fn items(&self) -> impl Iterator<Item = &ItemDef> {
        self.items.values()
    }

    pub fn items_by_category(&self, category: ItemCategory) -> Vec<&ItemDef> {
        self.items.values().filter(|i| i.category == category).collect()
    }

    pub fn plant(&self, seed_item_id: &str) -> Option<&PlantConfig> {
        self.plants.get(seed_item_id)
    }

    pub fn pet_type(&self, pet_type: &str) -> Option<&PetTypeConfig> {
        self.pet_types.get(pet_type)
    }

    /// Pet types in stable enumeration order (the order gacha thresholds use).
    pub fn pet_types(&self) -> impl Iterator<Item = &PetTypeConfig> {
        self.pet_types.values()
    }

    pub fn sku(&self, sku_id: &str) -> Option<&SkuDef> {
        self.skus.get(sku_id)
    }

    pub fn skus(&self) -> impl Iterator<Item = &SkuDef> {
        self.skus.values()
    }
}

fn item(id: &str, name: &str, category: ItemCategory, price: i64, sx: i32, sy: i32) -> ItemDef {
    ItemDef {
        id: id.to_string(),
        name: name.to_string(),
        category,
        price,
        currency: Currency::Coins,
        size_x: sx,
        size_y: sy,
    }
}

fn yield_of(item_id: &str, quantity: u32) -> HarvestYield {
    HarvestYield {
        item_id: item_id.to_string(),
        quantity,
    }
}
