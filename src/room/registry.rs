//! Room registry: one live session per owner id.
//!
//! The registry is the membership layer above the rooms. It creates a room on
//! the first join for an owner, reuses it while anyone is connected, and
//! drops it when the last occupant leaves (dropping the handle closes the
//! command queue, which disposes the room task). Visiting a friend is two
//! independent membership events on two independently-serialized rooms:
//! leave the source, join the target. Nothing spans both atomically.

use std::collections::{HashMap, HashSet};

use log::{debug, info, warn};
use tokio::sync::Mutex;

use crate::logutil::escape_log;
use crate::room::messages::{ClientMessage, ServerMessage};
use crate::room::session::{ClientHandle, RoomCommand, RoomDeps, RoomHandle, RoomSession};

struct RoomEntry {
    handle: RoomHandle,
    occupants: HashSet<String>,
}

#[derive(Default)]
struct Inner {
    rooms: HashMap<String, RoomEntry>,
    /// session id -> owner id of the room the session is currently in
    memberships: HashMap<String, String>,
}

pub struct RoomRegistry {
    deps: RoomDeps,
    max_clients_per_room: usize,
    inner: Mutex<Inner>,
}

impl RoomRegistry {
    pub fn new(deps: RoomDeps, max_clients_per_room: usize) -> Self {
        Self {
            deps,
            max_clients_per_room,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Join `client` to the room for `owner_id`, creating the room if this is
    /// the first join. A session is a member of at most one room, so a repeat
    /// join releases the previous membership first. Errors (room full, store
    /// unreachable) are reported on the client's channel.
    pub async fn join(
        &self,
        owner_id: &str,
        client: ClientHandle,
        discord_id: &str,
        display_name: Option<String>,
    ) {
        self.leave(&client.session_id).await;
        let mut inner = self.inner.lock().await;

        if let Some(entry) = inner.rooms.get(owner_id) {
            if entry.occupants.len() >= self.max_clients_per_room {
                let _ = client.tx.send(ServerMessage::Error {
                    message: "Room is full".to_string(),
                    retryable: false,
                });
                return;
            }
        }

        if !inner.rooms.contains_key(owner_id) {
            match RoomSession::spawn(owner_id, self.deps.clone()) {
                Ok(handle) => {
                    inner.rooms.insert(
                        owner_id.to_string(),
                        RoomEntry {
                            handle,
                            occupants: HashSet::new(),
                        },
                    );
                    info!("registry: opened room {}", escape_log(owner_id));
                }
                Err(err) => {
                    warn!(
                        "registry: failed to open room {}: {}",
                        escape_log(owner_id),
                        err
                    );
                    let _ = client.tx.send(ServerMessage::error(&err));
                    return;
                }
            }
        }

        let entry = inner
            .rooms
            .get_mut(owner_id)
            .expect("room inserted or present above");
        entry.occupants.insert(client.session_id.clone());
        inner
            .memberships
            .insert(client.session_id.clone(), owner_id.to_string());

        let entry = inner.rooms.get(owner_id).expect("present");
        entry.handle.send(RoomCommand::Join {
            client,
            discord_id: discord_id.to_string(),
            display_name,
        });
    }

    /// Remove the session from its room (if any). The room is disposed when
    /// the last occupant leaves.
    pub async fn leave(&self, session_id: &str) {
        let mut inner = self.inner.lock().await;
        let Some(owner_id) = inner.memberships.remove(session_id) else {
            return;
        };
        let mut empty = false;
        if let Some(entry) = inner.rooms.get_mut(&owner_id) {
            entry.occupants.remove(session_id);
            entry.handle.send(RoomCommand::Leave {
                session_id: session_id.to_string(),
            });
            empty = entry.occupants.is_empty();
        }
        if empty {
            // Dropping the entry drops the last RoomHandle; the room task
            // drains its queue (the Leave above included) and exits.
            inner.rooms.remove(&owner_id);
            info!("registry: closed empty room {}", escape_log(&owner_id));
        }
    }

    /// Leave the current room and join the friend's. The source room's world
    /// state is untouched beyond the departure event.
    pub async fn visit(
        &self,
        client: ClientHandle,
        target_owner_id: &str,
        discord_id: &str,
        display_name: Option<String>,
    ) {
        debug!(
            "registry: {} visiting {}",
            escape_log(&client.session_id),
            escape_log(target_owner_id)
        );
        // join releases the current membership itself
        self.join(target_owner_id, client, discord_id, display_name)
            .await;
    }

    /// Route a world-mutation request to the session's current room.
    /// Returns false when the session is not in any room.
    pub async fn dispatch(&self, session_id: &str, message: ClientMessage) -> bool {
        let inner = self.inner.lock().await;
        let Some(owner_id) = inner.memberships.get(session_id) else {
            return false;
        };
        let Some(entry) = inner.rooms.get(owner_id) else {
            return false;
        };
        entry.handle.send(RoomCommand::Request {
            session_id: session_id.to_string(),
            message,
        });
        true
    }

    /// Number of currently open rooms.
    pub async fn room_count(&self) -> usize {
        self.inner.lock().await.rooms.len()
    }
}
