//! Furniture placement lifecycle: join snapshot, place, collide, move, remove.

mod common;

use common::open_harness;
use homestead::room::{ClientHandle, ClientMessage, RoomCommand, ServerMessage};
use homestead::room::messages::{MoveItemPayload, PlaceItemPayload, RemoveItemPayload};
use homestead::store::Gateway;
use tokio::sync::mpsc;

#[test]
fn join_delivers_snapshot_and_lists() {
    let mut h = open_harness("owner-1");
    let messages = h.drain();

    assert!(matches!(messages[0], ServerMessage::PlayerJoined { .. }));
    let Some(ServerMessage::WorldSnapshot {
        owner_id,
        furniture,
        players,
    }) = messages.iter().find(|m| matches!(m, ServerMessage::WorldSnapshot { .. }))
    else {
        panic!("no world snapshot in {:?}", messages);
    };
    assert_eq!(owner_id, "owner-1");
    assert!(furniture.is_empty());
    assert_eq!(players.len(), 1);
    assert!(messages.iter().any(|m| matches!(m, ServerMessage::PetsList(_))));
    assert!(messages
        .iter()
        .any(|m| matches!(m, ServerMessage::InventoryList(_))));
}

#[test]
fn place_then_collide_keeps_one_item() {
    let mut h = open_harness("owner-1");
    h.drain();

    h.request(ClientMessage::PlaceItem(PlaceItemPayload {
        item_id: "chair_wood".into(),
        grid_x: 5,
        grid_y: 5,
    }));
    let first = h.drain();
    assert!(matches!(first[0], ServerMessage::PlaceOk { .. }));
    assert!(matches!(first[1], ServerMessage::FurnitureAdded { .. }));

    // Same tile again: rejected, nothing placed, nothing broadcast.
    h.request(ClientMessage::PlaceItem(PlaceItemPayload {
        item_id: "table_wood".into(),
        grid_x: 5,
        grid_y: 5,
    }));
    let second = h.drain();
    assert_eq!(second.len(), 1);
    let ServerMessage::Error { message, retryable } = &second[0] else {
        panic!("expected error, got {:?}", second[0]);
    };
    assert_eq!(message, "Tile already occupied");
    assert!(!retryable);

    assert_eq!(h.session.world().furniture_count(), 1);
    assert_eq!(h.store.house_items_for("owner-1").unwrap().len(), 1);
}

#[test]
fn place_rejects_out_of_bounds() {
    let mut h = open_harness("owner-1");
    h.drain();

    for (x, y) in [(-1, 0), (0, -1), (10, 0), (0, 10)] {
        h.request(ClientMessage::PlaceItem(PlaceItemPayload {
            item_id: "chair_wood".into(),
            grid_x: x,
            grid_y: y,
        }));
        let response = h.first_response();
        assert!(
            matches!(&response, ServerMessage::Error { message, .. } if message.contains("bounds")),
            "({}, {}) gave {:?}",
            x,
            y,
            response
        );
    }
    assert_eq!(h.session.world().furniture_count(), 0);
}

#[test]
fn place_rejects_unknown_catalog_item() {
    let mut h = open_harness("owner-1");
    h.drain();

    h.request(ClientMessage::PlaceItem(PlaceItemPayload {
        item_id: "throne_gold".into(),
        grid_x: 2,
        grid_y: 2,
    }));
    let response = h.first_response();
    assert!(
        matches!(&response, ServerMessage::Error { message, .. } if message.contains("throne_gold"))
    );
}

#[test]
fn move_onto_own_cell_succeeds() {
    let mut h = open_harness("owner-1");
    h.drain();

    h.request(ClientMessage::PlaceItem(PlaceItemPayload {
        item_id: "rug_red".into(),
        grid_x: 3,
        grid_y: 3,
    }));
    let ServerMessage::PlaceOk { id } = h.first_response() else {
        panic!("place failed");
    };
    h.drain();

    // A no-op move must not collide with itself.
    h.request(ClientMessage::MoveItem(MoveItemPayload {
        house_item_id: id.clone(),
        grid_x: 3,
        grid_y: 3,
    }));
    assert!(matches!(h.first_response(), ServerMessage::MoveOk { .. }));

    h.request(ClientMessage::MoveItem(MoveItemPayload {
        house_item_id: id,
        grid_x: 7,
        grid_y: 2,
    }));
    assert!(matches!(h.first_response(), ServerMessage::MoveOk { .. }));

    let records = h.store.house_items_for("owner-1").unwrap();
    assert_eq!((records[0].grid_x, records[0].grid_y), (7, 2));
}

#[test]
fn move_onto_occupied_cell_is_rejected() {
    let mut h = open_harness("owner-1");
    h.drain();

    h.request(ClientMessage::PlaceItem(PlaceItemPayload {
        item_id: "chair_wood".into(),
        grid_x: 1,
        grid_y: 1,
    }));
    h.drain();
    h.request(ClientMessage::PlaceItem(PlaceItemPayload {
        item_id: "table_wood".into(),
        grid_x: 2,
        grid_y: 2,
    }));
    let ServerMessage::PlaceOk { id } = h.first_response() else {
        panic!("place failed");
    };
    h.drain();

    h.request(ClientMessage::MoveItem(MoveItemPayload {
        house_item_id: id,
        grid_x: 1,
        grid_y: 1,
    }));
    assert!(matches!(
        h.first_response(),
        ServerMessage::Error { .. }
    ));
}

#[test]
fn remove_deletes_placement_everywhere() {
    let mut h = open_harness("owner-1");
    h.drain();

    h.request(ClientMessage::PlaceItem(PlaceItemPayload {
        item_id: "lamp_floor".into(),
        grid_x: 4,
        grid_y: 4,
    }));
    let ServerMessage::PlaceOk { id } = h.first_response() else {
        panic!("place failed");
    };
    h.drain();

    h.request(ClientMessage::RemoveItem(RemoveItemPayload {
        house_item_id: id.clone(),
    }));
    let messages = h.drain();
    assert!(matches!(messages[0], ServerMessage::RemoveOk { .. }));
    assert!(matches!(messages[1], ServerMessage::FurnitureRemoved { .. }));
    assert_eq!(h.session.world().furniture_count(), 0);
    assert!(h.store.house_items_for("owner-1").unwrap().is_empty());

    // Removing again reports the item missing.
    h.request(ClientMessage::RemoveItem(RemoveItemPayload {
        house_item_id: id,
    }));
    assert!(matches!(h.first_response(), ServerMessage::Error { .. }));
}

#[test]
fn mutations_broadcast_to_every_client() {
    let mut h = open_harness("owner-1");
    h.drain();

    let (tx, mut visitor_rx) = mpsc::unbounded_channel();
    h.session.handle_command(RoomCommand::Join {
        client: ClientHandle {
            session_id: "sess-visitor".into(),
            tx,
        },
        discord_id: "discord-visitor".into(),
        display_name: Some("Visitor".into()),
    });
    // Owner sees the visitor arrive.
    assert!(h
        .drain()
        .iter()
        .any(|m| matches!(m, ServerMessage::PlayerJoined { .. })));
    // Visitor gets its own welcome burst.
    while visitor_rx.try_recv().is_ok() {}

    h.request(ClientMessage::PlaceItem(PlaceItemPayload {
        item_id: "chair_wood".into(),
        grid_x: 6,
        grid_y: 6,
    }));

    // The visitor sees the delta but not the requester-only ack.
    let seen = visitor_rx.try_recv().expect("visitor got no event");
    assert!(matches!(seen, ServerMessage::FurnitureAdded { .. }));
    assert!(visitor_rx.try_recv().is_err());
}
