//! Records survive a store close and reopen, and rooms rehydrate from them.

mod common;

use std::sync::Arc;

use common::ManualClock;
use homestead::catalog::Catalog;
use homestead::room::{Grid, RoomDeps, RoomSession};
use homestead::store::{GameStore, Gateway};

#[test]
fn records_survive_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");

    let placed_id;
    let pet_id;
    {
        let store = GameStore::open(dir.path()).expect("store");
        let placed = store
            .place_house_item("owner-1", "table_wood", 2, 8, None)
            .unwrap();
        placed_id = placed.id;
        store.ensure_user("owner-1", "discord-1").unwrap();
        store.adjust_coins("owner-1", 125).unwrap();
        store.adjust_xp("owner-1", 40).unwrap();
        store.credit_item("owner-1", "seed_tomato", 4).unwrap();
        let pet = store.create_pet("owner-1", "dragon_fire", "Ember").unwrap();
        store.set_active_pet("owner-1", &pet.id).unwrap();
        pet_id = pet.id;
    }

    let store = GameStore::open(dir.path()).expect("reopen");

    let items = store.house_items_for("owner-1").unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, placed_id);
    assert_eq!(items[0].item_id, "table_wood");
    assert_eq!((items[0].grid_x, items[0].grid_y), (2, 8));
    assert!(items[0].planted_at.is_none());

    let user = store.user("owner-1").unwrap().expect("user");
    assert_eq!(user.coins, 125);
    assert_eq!(user.xp, 40);
    assert_eq!(store.inventory_count("owner-1", "seed_tomato").unwrap(), 4);

    let pet = store.pet(&pet_id).unwrap().expect("pet");
    assert_eq!(pet.pet_type, "dragon_fire");
    assert!(pet.is_active);
}

#[test]
fn owners_do_not_see_each_other() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = GameStore::open(dir.path()).expect("store");

    store.place_house_item("alice", "chair_wood", 0, 0, None).unwrap();
    store.place_house_item("bob", "rug_red", 0, 0, None).unwrap();
    store.credit_item("alice", "seed_mint", 9).unwrap();

    assert_eq!(store.house_items_for("alice").unwrap().len(), 1);
    assert_eq!(store.house_items_for("bob").unwrap().len(), 1);
    assert_eq!(store.house_items_for("alice").unwrap()[0].item_id, "chair_wood");
    assert_eq!(store.inventory_count("bob", "seed_mint").unwrap(), 0);
    assert!(store.inventory_for("bob").unwrap().is_empty());
}

#[test]
fn room_rehydrates_placements_on_create() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = Arc::new(GameStore::open(dir.path()).expect("store"));
    let planted_at = 500_000;

    store.place_house_item("owner-1", "chair_wood", 1, 1, None).unwrap();
    let crop = store
        .place_house_item("owner-1", "seed_mint", 2, 2, Some(planted_at))
        .unwrap();

    let deps = RoomDeps {
        catalog: Arc::new(Catalog::standard()),
        store: store.clone(),
        clock: Arc::new(ManualClock::new(planted_at)),
        grid: Grid::default(),
    };
    let session = RoomSession::create("owner-1", deps).expect("room");

    assert_eq!(session.world().furniture_count(), 2);
    let rehydrated = session.world().furniture(&crop.id).expect("crop");
    assert_eq!(rehydrated.planted_at, Some(planted_at));
    assert!(session.world().tile_occupied(1, 1, None));
    assert!(session.world().tile_occupied(2, 2, None));
    assert!(!session.world().tile_occupied(3, 3, None));
}
