//! Registry-level membership: join, capacity, visiting a friend's house,
//! and room disposal when the last occupant leaves.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::ManualClock;
use homestead::catalog::Catalog;
use homestead::room::{ClientHandle, Grid, RoomDeps, RoomRegistry, ServerMessage};
use homestead::room::messages::{ClientMessage, PlaceItemPayload};
use homestead::store::{GameStore, Gateway};
use tokio::sync::mpsc;

struct Fixture {
    registry: Arc<RoomRegistry>,
    store: Arc<dyn Gateway>,
    _dir: tempfile::TempDir,
}

fn fixture(max_clients: usize) -> Fixture {
    let dir = tempfile::tempdir().expect("tempdir");
    let store: Arc<dyn Gateway> = Arc::new(GameStore::open(dir.path()).expect("store"));
    let deps = RoomDeps {
        catalog: Arc::new(Catalog::standard()),
        store: store.clone(),
        clock: Arc::new(ManualClock::new(1_000_000)),
        grid: Grid::default(),
    };
    Fixture {
        registry: Arc::new(RoomRegistry::new(deps, max_clients)),
        store,
        _dir: dir,
    }
}

fn client(session_id: &str) -> (ClientHandle, mpsc::UnboundedReceiver<ServerMessage>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        ClientHandle {
            session_id: session_id.to_string(),
            tx,
        },
        rx,
    )
}

async fn recv(rx: &mut mpsc::UnboundedReceiver<ServerMessage>) -> ServerMessage {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for message")
        .expect("channel closed")
}

/// Wait for the joiner's welcome burst and return the snapshot's owner id.
async fn await_snapshot(rx: &mut mpsc::UnboundedReceiver<ServerMessage>) -> String {
    loop {
        if let ServerMessage::WorldSnapshot { owner_id, .. } = recv(rx).await {
            return owner_id;
        }
    }
}

#[tokio::test]
async fn join_opens_room_and_delivers_snapshot() {
    let f = fixture(16);
    let (handle, mut rx) = client("sess-1");

    f.registry.join("alice", handle, "discord-alice", None).await;
    assert_eq!(await_snapshot(&mut rx).await, "alice");
    assert_eq!(f.registry.room_count().await, 1);
}

#[tokio::test]
async fn room_is_disposed_when_last_occupant_leaves() {
    let f = fixture(16);
    let (handle, mut rx) = client("sess-1");

    f.registry.join("alice", handle, "discord-alice", None).await;
    await_snapshot(&mut rx).await;

    f.registry.leave("sess-1").await;
    assert_eq!(f.registry.room_count().await, 0);

    // Requests from a departed session are not routed anywhere.
    let routed = f
        .registry
        .dispatch(
            "sess-1",
            ClientMessage::PlaceItem(PlaceItemPayload {
                item_id: "chair_wood".into(),
                grid_x: 0,
                grid_y: 0,
            }),
        )
        .await;
    assert!(!routed);
}

#[tokio::test]
async fn rejoining_another_room_releases_the_first() {
    let f = fixture(16);
    let (alice_home, mut rx) = client("sess-1");

    f.registry
        .join("alice", alice_home, "discord-1", None)
        .await;
    assert_eq!(await_snapshot(&mut rx).await, "alice");

    // A second JOIN on the same session must not leave a ghost occupant
    // behind in the first room.
    let (bob_home, mut rx) = client("sess-1");
    f.registry.join("bob", bob_home, "discord-1", None).await;
    assert_eq!(await_snapshot(&mut rx).await, "bob");
    assert_eq!(f.registry.room_count().await, 1);

    f.registry.leave("sess-1").await;
    assert_eq!(f.registry.room_count().await, 0);
}

#[tokio::test]
async fn full_room_rejects_another_join() {
    let f = fixture(1);
    let (first, mut first_rx) = client("sess-1");
    let (second, mut second_rx) = client("sess-2");

    f.registry.join("alice", first, "discord-1", None).await;
    await_snapshot(&mut first_rx).await;

    f.registry.join("alice", second, "discord-2", None).await;
    let ServerMessage::Error { message, retryable } = recv(&mut second_rx).await else {
        panic!("expected rejection");
    };
    assert_eq!(message, "Room is full");
    assert!(!retryable);
}

#[tokio::test]
async fn visit_moves_session_to_friends_room() {
    let f = fixture(16);
    f.store
        .place_house_item("bob", "rug_red", 4, 4, None)
        .unwrap();

    // Bob is home; Alice starts in her own room.
    let (bob, mut bob_rx) = client("sess-bob");
    f.registry.join("bob", bob, "discord-bob", None).await;
    await_snapshot(&mut bob_rx).await;

    let (alice, mut alice_rx) = client("sess-alice");
    f.registry
        .join("alice", alice.clone(), "discord-alice", Some("Alice".into()))
        .await;
    assert_eq!(await_snapshot(&mut alice_rx).await, "alice");
    assert_eq!(f.registry.room_count().await, 2);

    f.registry
        .visit(alice, "bob", "discord-alice", Some("Alice".into()))
        .await;

    // Alice's empty room is gone; she now sees Bob's furniture.
    assert_eq!(f.registry.room_count().await, 1);
    loop {
        if let ServerMessage::WorldSnapshot {
            owner_id,
            furniture,
            players,
        } = recv(&mut alice_rx).await
        {
            assert_eq!(owner_id, "bob");
            assert_eq!(furniture.len(), 1);
            assert_eq!(furniture[0].item_id, "rug_red");
            assert_eq!(players.len(), 2);
            break;
        }
    }

    // Bob sees her arrive.
    loop {
        match recv(&mut bob_rx).await {
            ServerMessage::PlayerJoined { display_name, .. } => {
                assert_eq!(display_name, "Alice");
                break;
            }
            _ => continue,
        }
    }

    // Her requests now mutate Bob's room.
    assert!(
        f.registry
            .dispatch(
                "sess-alice",
                ClientMessage::PlaceItem(PlaceItemPayload {
                    item_id: "lamp_floor".into(),
                    grid_x: 9,
                    grid_y: 9,
                }),
            )
            .await
    );
    loop {
        if let ServerMessage::FurnitureAdded { item } = recv(&mut bob_rx).await {
            assert_eq!(item.item_id, "lamp_floor");
            break;
        }
    }
    assert_eq!(f.store.house_items_for("bob").unwrap().len(), 2);
}
