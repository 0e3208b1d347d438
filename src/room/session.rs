//! The per-room state machine: one actor per house.
//!
//! A room owns its [`WorldState`] and a single command queue. One task drains
//! the queue, so no two handlers for the same room ever run concurrently;
//! that serialization is what upholds the tile-occupancy invariant and makes
//! inventory check-then-decrement safe without any locking. Different rooms
//! run fully in parallel.
//!
//! Every mutating handler follows the same sequence: validate against the
//! catalog and grid, write through the persistence gateway, mutate the world
//! state, ack the requester, broadcast the delta. When the durable write
//! fails, the handler stops before touching the world state and reports a
//! retryable error; in-memory and durable state never diverge.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use log::{debug, info, warn};
use tokio::sync::mpsc;

use crate::catalog::{Catalog, Rarity};
use crate::logutil::escape_log;
use crate::room::errors::RoomError;
use crate::room::grid::Grid;
use crate::room::messages::{
    BuyItemPayload, ClientMessage, HarvestPayload, HatchEggPayload, MoveItemPayload, PetView,
    PlaceItemPayload, PlantSeedPayload, PurchaseGemsPayload, RemoveItemPayload, ServerMessage,
    SetActivePetPayload,
};
use crate::room::state::{PlacedItem, PlayerInfo, SyncEvent, WorldState};
use crate::services::{calculate_hunger, open_egg, IapService, ShopService};
use crate::store::Gateway;

/// Injectable time source. Production uses [`SystemClock`]; tests drive a
/// manual clock so growth and hatching are deterministic.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Shared collaborators handed to every room.
#[derive(Clone)]
pub struct RoomDeps {
    pub catalog: Arc<Catalog>,
    pub store: Arc<dyn Gateway>,
    pub clock: Arc<dyn Clock>,
    pub grid: Grid,
}

/// The requester's end of a connection: its session id plus the sender that
/// feeds the connection's write loop.
#[derive(Clone)]
pub struct ClientHandle {
    pub session_id: String,
    pub tx: mpsc::UnboundedSender<ServerMessage>,
}

/// Commands accepted by a room's queue, in arrival order.
pub enum RoomCommand {
    Join {
        client: ClientHandle,
        discord_id: String,
        display_name: Option<String>,
    },
    Leave {
        session_id: String,
    },
    Request {
        session_id: String,
        message: ClientMessage,
    },
}

/// Cheap handle for submitting commands to a running room task.
#[derive(Clone)]
pub struct RoomHandle {
    tx: mpsc::UnboundedSender<RoomCommand>,
}

impl RoomHandle {
    pub fn send(&self, command: RoomCommand) {
        // A closed channel means the room is disposed; the registry has
        // already dropped it, so the command is moot.
        let _ = self.tx.send(command);
    }
}

/// One authoritative room session. See the module docs for the handler
/// contract.
pub struct RoomSession {
    deps: RoomDeps,
    state: WorldState,
    clients: HashMap<String, mpsc::UnboundedSender<ServerMessage>>,
    shop: ShopService,
    iap: IapService,
}

impl RoomSession {
    /// Load the owner's durable placements and build an Active session.
    /// Fails (and no room exists) when the store cannot be read.
    pub fn create(owner_id: &str, deps: RoomDeps) -> Result<Self, RoomError> {
        let records = deps.store.house_items_for(owner_id)?;
        let mut state = WorldState::new(owner_id);
        state.hydrate(&records);
        info!(
            "room {}: created with {} placed items",
            escape_log(owner_id),
            records.len()
        );
        let shop = ShopService::new(deps.catalog.clone(), deps.store.clone());
        let iap = IapService::new(deps.catalog.clone(), deps.store.clone());
        Ok(Self {
            deps,
            state,
            clients: HashMap::new(),
            shop,
            iap,
        })
    }

    /// Create the session and hand it to its own task. The room lives until
    /// every [`RoomHandle`] clone is dropped and the queue drains.
    pub fn spawn(owner_id: &str, deps: RoomDeps) -> Result<RoomHandle, RoomError> {
        let session = Self::create(owner_id, deps)?;
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(session.run(rx));
        Ok(RoomHandle { tx })
    }

    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<RoomCommand>) {
        while let Some(command) = rx.recv().await {
            self.handle_command(command);
        }
        info!("room {}: disposed", escape_log(&self.state.owner_id));
    }

    /// Process one command to completion. Public so tests can drive a session
    /// directly without a runtime.
    pub fn handle_command(&mut self, command: RoomCommand) {
        match command {
            RoomCommand::Join {
                client,
                discord_id,
                display_name,
            } => self.handle_join(client, discord_id, display_name),
            RoomCommand::Leave { session_id } => self.handle_leave(&session_id),
            RoomCommand::Request {
                session_id,
                message,
            } => self.handle_request(&session_id, message),
        }
    }

    pub fn owner_id(&self) -> &str {
        &self.state.owner_id
    }

    pub fn world(&self) -> &WorldState {
        &self.state
    }

    // ── Membership ────────────────────────────────────────────────────

    fn handle_join(
        &mut self,
        client: ClientHandle,
        discord_id: String,
        display_name: Option<String>,
    ) {
        let owner_id = self.state.owner_id.clone();
        // Fail the join outright when the store is unreachable; a client in a
        // room whose reads failed would see a world we can't vouch for.
        let initial = self.deps.store.ensure_user(&owner_id, &discord_id).and_then(|_| {
            let pets = self.pet_views(&owner_id)?;
            let inventory = self.deps.store.inventory_for(&owner_id)?;
            Ok((pets, inventory))
        });
        let (pets, inventory) = match initial {
            Ok(loaded) => loaded,
            Err(err) => {
                warn!(
                    "room {}: join rejected for {}: {}",
                    escape_log(&owner_id),
                    escape_log(&client.session_id),
                    err
                );
                let _ = client
                    .tx
                    .send(ServerMessage::error(&RoomError::Persistence(err)));
                return;
            }
        };

        let player = PlayerInfo {
            discord_id,
            display_name: display_name.unwrap_or_else(|| "Unknown".to_string()),
        };
        debug!(
            "room {}: client {} joined as {}",
            escape_log(&owner_id),
            escape_log(&client.session_id),
            escape_log(&player.display_name)
        );

        self.clients
            .insert(client.session_id.clone(), client.tx.clone());
        let joined = self.state.add_player(&client.session_id, player);
        self.broadcast(joined.into());

        // Initial non-synced state goes to the joiner only.
        let _ = client.tx.send(ServerMessage::WorldSnapshot {
            owner_id: owner_id.clone(),
            furniture: self.state.furniture_snapshot(),
            players: self.state.players_snapshot(),
        });
        let _ = client.tx.send(ServerMessage::PetsList(pets));
        let _ = client.tx.send(ServerMessage::InventoryList(inventory));
    }

    fn handle_leave(&mut self, session_id: &str) {
        self.clients.remove(session_id);
        if let Some(event) = self.state.remove_player(session_id) {
            debug!(
                "room {}: client {} left",
                escape_log(&self.state.owner_id),
                escape_log(session_id)
            );
            self.broadcast(event.into());
        }
    }

    // ── Request dispatch ──────────────────────────────────────────────

    fn handle_request(&mut self, session_id: &str, message: ClientMessage) {
        let result = match message {
            ClientMessage::PlaceItem(p) => self.place_item(p),
            ClientMessage::RemoveItem(p) => self.remove_item(p),
            ClientMessage::MoveItem(p) => self.move_item(p),
            ClientMessage::PlantSeed(p) => self.plant_seed(p),
            ClientMessage::Harvest(p) => self.harvest(p),
            ClientMessage::BuyItem(p) => self.buy_item(p),
            ClientMessage::HatchEgg(p) => self.hatch_egg(p),
            ClientMessage::SetActivePet(p) => self.set_active_pet(p),
            ClientMessage::PurchaseGems(p) => self.purchase_gems(p),
            ClientMessage::Join(_) | ClientMessage::Visit(_) => {
                // Membership messages are routed by the registry, not the room.
                debug!(
                    "room {}: ignoring membership message from {}",
                    escape_log(&self.state.owner_id),
                    escape_log(session_id)
                );
                return;
            }
        };

        match result {
            Ok((ack, events)) => {
                self.send_to(session_id, ack);
                for event in events {
                    self.broadcast(event.into());
                }
            }
            Err(err) => {
                debug!(
                    "room {}: request from {} rejected: {}",
                    escape_log(&self.state.owner_id),
                    escape_log(session_id),
                    err
                );
                self.send_to(session_id, ServerMessage::error(&err));
            }
        }
    }

    // ── Mutation handlers ─────────────────────────────────────────────

    fn place_item(
        &mut self,
        p: PlaceItemPayload,
    ) -> Result<(ServerMessage, Vec<SyncEvent>), RoomError> {
        self.deps
            .catalog
            .item(&p.item_id)
            .ok_or_else(|| RoomError::UnknownItem(p.item_id.clone()))?;
        self.check_cell(p.grid_x, p.grid_y, None)?;

        let record = self.deps.store.place_house_item(
            &self.state.owner_id,
            &p.item_id,
            p.grid_x,
            p.grid_y,
            None,
        )?;
        let id = record.id.clone();
        let event = self.state.insert_furniture(PlacedItem::from(&record));
        Ok((ServerMessage::PlaceOk { id }, vec![event]))
    }

    fn remove_item(
        &mut self,
        p: RemoveItemPayload,
    ) -> Result<(ServerMessage, Vec<SyncEvent>), RoomError> {
        if self.state.furniture(&p.house_item_id).is_none() {
            return Err(RoomError::ItemNotFound);
        }

        if !self.deps.store.remove_house_item(&p.house_item_id)? {
            return Err(RoomError::UpdateFailed);
        }
        let event = self
            .state
            .remove_furniture(&p.house_item_id)
            .expect("checked above; room task is the only mutator");
        Ok((
            ServerMessage::RemoveOk {
                id: p.house_item_id,
            },
            vec![event],
        ))
    }

    fn move_item(
        &mut self,
        p: MoveItemPayload,
    ) -> Result<(ServerMessage, Vec<SyncEvent>), RoomError> {
        if self.state.furniture(&p.house_item_id).is_none() {
            return Err(RoomError::ItemNotFound);
        }
        // Occupancy excludes the moving item so moving onto its own cell works.
        self.check_cell(p.grid_x, p.grid_y, Some(&p.house_item_id))?;

        if !self
            .deps
            .store
            .move_house_item(&p.house_item_id, p.grid_x, p.grid_y)?
        {
            return Err(RoomError::UpdateFailed);
        }
        let event = self
            .state
            .move_furniture(&p.house_item_id, p.grid_x, p.grid_y)
            .expect("checked above; room task is the only mutator");
        Ok((ServerMessage::MoveOk { id: p.house_item_id }, vec![event]))
    }

    fn plant_seed(
        &mut self,
        p: PlantSeedPayload,
    ) -> Result<(ServerMessage, Vec<SyncEvent>), RoomError> {
        self.deps
            .catalog
            .plant(&p.seed_item_id)
            .ok_or_else(|| RoomError::UnknownSeed(p.seed_item_id.clone()))?;
        self.check_cell(p.grid_x, p.grid_y, None)?;

        // Single check-and-decrement call; the room queue makes it atomic
        // per owner+item.
        if !self
            .deps
            .store
            .debit_item(&self.state.owner_id, &p.seed_item_id, 1)?
        {
            return Err(RoomError::InsufficientSeeds);
        }

        let planted_at = self.deps.clock.now_ms();
        let record = self.deps.store.place_house_item(
            &self.state.owner_id,
            &p.seed_item_id,
            p.grid_x,
            p.grid_y,
            Some(planted_at),
        )?;
        let id = record.id.clone();
        let event = self.state.insert_furniture(PlacedItem::from(&record));
        Ok((ServerMessage::PlantOk { id, planted_at }, vec![event]))
    }

    fn harvest(
        &mut self,
        p: HarvestPayload,
    ) -> Result<(ServerMessage, Vec<SyncEvent>), RoomError> {
        let item = self
            .state
            .furniture(&p.house_item_id)
            .cloned()
            .ok_or(RoomError::ItemNotFound)?;
        let planted_at = item.planted_at.ok_or(RoomError::NotReady)?;

        let speed = self.active_growth_speed_mod()?;
        let now = self.deps.clock.now_ms();
        let plant = crate::services::validate_harvest(
            &self.deps.catalog,
            planted_at,
            &item.item_id,
            now,
            speed,
        )
        .ok_or(RoomError::NotReady)?
        .clone();

        let owner_id = self.state.owner_id.clone();
        for reward in &plant.harvest_yield {
            self.deps
                .store
                .credit_item(&owner_id, &reward.item_id, reward.quantity)?;
        }
        self.deps.store.adjust_coins(&owner_id, plant.coin_reward)?;
        self.deps.store.adjust_xp(&owner_id, plant.xp_reward)?;
        if !self.deps.store.remove_house_item(&item.id)? {
            return Err(RoomError::UpdateFailed);
        }

        let event = self
            .state
            .remove_furniture(&item.id)
            .expect("checked above; room task is the only mutator");
        info!(
            "room {}: harvested {} for {} coins",
            escape_log(&owner_id),
            escape_log(&item.item_id),
            plant.coin_reward
        );
        Ok((
            ServerMessage::HarvestOk {
                id: item.id,
                rewards: plant.harvest_yield,
                coins: plant.coin_reward,
            },
            vec![event],
        ))
    }

    fn buy_item(
        &mut self,
        p: BuyItemPayload,
    ) -> Result<(ServerMessage, Vec<SyncEvent>), RoomError> {
        let outcome = self
            .shop
            .buy_item(&self.state.owner_id, &p.item_id, p.quantity)?;
        Ok((
            ServerMessage::BuyOk {
                item_id: p.item_id,
                quantity: p.quantity,
                cost: outcome.cost,
                new_balance: outcome.new_balance,
            },
            vec![],
        ))
    }

    fn hatch_egg(
        &mut self,
        _p: HatchEggPayload,
    ) -> Result<(ServerMessage, Vec<SyncEvent>), RoomError> {
        let owner_id = self.state.owner_id.clone();
        if !self.deps.store.debit_item(&owner_id, "egg_basic", 1)? {
            return Err(RoomError::NoEggs);
        }

        let rolled = open_egg(&self.deps.catalog, None).clone();
        let pet = self
            .deps
            .store
            .create_pet(&owner_id, &rolled.pet_type, &rolled.name)?;
        info!(
            "room {}: hatched {} ({:?})",
            escape_log(&owner_id),
            escape_log(&rolled.pet_type),
            rolled.rarity
        );
        Ok((
            ServerMessage::HatchOk {
                pet_id: pet.id,
                pet_type: rolled.pet_type,
                name: rolled.name,
                rarity: rolled.rarity,
            },
            vec![],
        ))
    }

    fn set_active_pet(
        &mut self,
        p: SetActivePetPayload,
    ) -> Result<(ServerMessage, Vec<SyncEvent>), RoomError> {
        let owner_id = self.state.owner_id.clone();
        if !self.deps.store.set_active_pet(&owner_id, &p.pet_id)? {
            return Err(RoomError::PetNotFound);
        }
        let pet = self
            .deps
            .store
            .pet(&p.pet_id)?
            .ok_or(RoomError::PetNotFound)?;
        let growth_speed_mod = self
            .deps
            .catalog
            .pet_type(&pet.pet_type)
            .map(|c| c.growth_speed_mod)
            .unwrap_or(1.0);
        Ok((
            ServerMessage::PetActivated {
                pet_id: p.pet_id,
                growth_speed_mod,
            },
            vec![],
        ))
    }

    fn purchase_gems(
        &mut self,
        p: PurchaseGemsPayload,
    ) -> Result<(ServerMessage, Vec<SyncEvent>), RoomError> {
        let outcome = self.iap.fulfill_purchase(
            &self.state.owner_id,
            &p.sku_id,
            p.purchase_token.as_deref(),
        )?;
        Ok((
            ServerMessage::PurchaseOk {
                sku_id: p.sku_id,
                gems_granted: outcome.gems_granted,
                new_gem_balance: outcome.new_gem_balance,
            },
            vec![],
        ))
    }

    // ── Helpers ───────────────────────────────────────────────────────

    fn check_cell(&self, x: i32, y: i32, exclude: Option<&str>) -> Result<(), RoomError> {
        if !self.deps.grid.contains(x, y) {
            return Err(RoomError::OutOfBounds);
        }
        if self.state.tile_occupied(x, y, exclude) {
            return Err(RoomError::TileOccupied);
        }
        Ok(())
    }

    /// Growth speed modifier from the owner's active pet, 1.0 when none.
    fn active_growth_speed_mod(&self) -> Result<f64, RoomError> {
        let pets = self.deps.store.pets_for(&self.state.owner_id)?;
        Ok(pets
            .iter()
            .find(|p| p.is_active)
            .and_then(|p| self.deps.catalog.pet_type(&p.pet_type))
            .map(|c| c.growth_speed_mod)
            .unwrap_or(1.0))
    }

    fn pet_views(&self, owner_id: &str) -> Result<Vec<PetView>, crate::store::StoreError> {
        let now = self.deps.clock.now_ms();
        let pets = self.deps.store.pets_for(owner_id)?;
        Ok(pets
            .into_iter()
            .map(|pet| {
                let elapsed = now - pet.hatched_at.timestamp_millis();
                let hunger =
                    calculate_hunger(&self.deps.catalog, pet.hunger, &pet.pet_type, elapsed);
                let rarity = self
                    .deps
                    .catalog
                    .pet_type(&pet.pet_type)
                    .map(|c| c.rarity)
                    .unwrap_or(Rarity::Common);
                PetView {
                    id: pet.id,
                    pet_type: pet.pet_type,
                    name: pet.name,
                    level: pet.level,
                    hunger,
                    is_active: pet.is_active,
                    rarity,
                }
            })
            .collect())
    }

    fn send_to(&self, session_id: &str, message: ServerMessage) {
        if let Some(tx) = self.clients.get(session_id) {
            let _ = tx.send(message);
        }
    }

    fn broadcast(&self, message: ServerMessage) {
        for tx in self.clients.values() {
            let _ = tx.send(message.clone());
        }
    }
}
