//! Shared fixtures for room integration tests: a throwaway sled store, a
//! manually driven clock, and a fault-injecting persistence gateway.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

use homestead::catalog::Catalog;
use homestead::room::{ClientHandle, Clock, Grid, RoomCommand, RoomDeps, RoomSession, ServerMessage};
use homestead::store::{
    Gateway, GameStore, GameStoreBuilder, HouseItemRecord, InventoryEntry, PetRecord, StoreError,
    UserRecord,
};

/// Clock the tests advance by hand.
pub struct ManualClock {
    now: AtomicI64,
}

#[allow(dead_code)]
impl ManualClock {
    pub fn new(start_ms: i64) -> Self {
        Self {
            now: AtomicI64::new(start_ms),
        }
    }

    pub fn set(&self, ms: i64) {
        self.now.store(ms, Ordering::SeqCst);
    }

    pub fn advance(&self, ms: i64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Gateway wrapper that can be flipped into a failing state, simulating an
/// unreachable database. Every call fails while the flag is set.
pub struct FlakyGateway {
    inner: Arc<dyn Gateway>,
    failing: AtomicBool,
}

#[allow(dead_code)]
impl FlakyGateway {
    pub fn new(inner: Arc<dyn Gateway>) -> Self {
        Self {
            inner,
            failing: AtomicBool::new(false),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("injected outage".into()))
        } else {
            Ok(())
        }
    }
}

impl Gateway for FlakyGateway {
    fn house_items_for(&self, owner_id: &str) -> Result<Vec<HouseItemRecord>, StoreError> {
        self.check()?;
        self.inner.house_items_for(owner_id)
    }

    fn place_house_item(
        &self,
        owner_id: &str,
        item_id: &str,
        grid_x: i32,
        grid_y: i32,
        planted_at: Option<i64>,
    ) -> Result<HouseItemRecord, StoreError> {
        self.check()?;
        self.inner
            .place_house_item(owner_id, item_id, grid_x, grid_y, planted_at)
    }

    fn move_house_item(&self, id: &str, grid_x: i32, grid_y: i32) -> Result<bool, StoreError> {
        self.check()?;
        self.inner.move_house_item(id, grid_x, grid_y)
    }

    fn remove_house_item(&self, id: &str) -> Result<bool, StoreError> {
        self.check()?;
        self.inner.remove_house_item(id)
    }

    fn inventory_for(&self, owner_id: &str) -> Result<Vec<InventoryEntry>, StoreError> {
        self.check()?;
        self.inner.inventory_for(owner_id)
    }

    fn inventory_count(&self, owner_id: &str, item_id: &str) -> Result<u32, StoreError> {
        self.check()?;
        self.inner.inventory_count(owner_id, item_id)
    }

    fn credit_item(&self, owner_id: &str, item_id: &str, qty: u32) -> Result<u32, StoreError> {
        self.check()?;
        self.inner.credit_item(owner_id, item_id, qty)
    }

    fn debit_item(&self, owner_id: &str, item_id: &str, qty: u32) -> Result<bool, StoreError> {
        self.check()?;
        self.inner.debit_item(owner_id, item_id, qty)
    }

    fn user(&self, owner_id: &str) -> Result<Option<UserRecord>, StoreError> {
        self.check()?;
        self.inner.user(owner_id)
    }

    fn ensure_user(&self, owner_id: &str, discord_id: &str) -> Result<UserRecord, StoreError> {
        self.check()?;
        self.inner.ensure_user(owner_id, discord_id)
    }

    fn adjust_coins(&self, owner_id: &str, delta: i64) -> Result<i64, StoreError> {
        self.check()?;
        self.inner.adjust_coins(owner_id, delta)
    }

    fn adjust_gems(&self, owner_id: &str, delta: i64) -> Result<i64, StoreError> {
        self.check()?;
        self.inner.adjust_gems(owner_id, delta)
    }

    fn adjust_xp(&self, owner_id: &str, delta: i64) -> Result<i64, StoreError> {
        self.check()?;
        self.inner.adjust_xp(owner_id, delta)
    }

    fn pets_for(&self, owner_id: &str) -> Result<Vec<PetRecord>, StoreError> {
        self.check()?;
        self.inner.pets_for(owner_id)
    }

    fn pet(&self, pet_id: &str) -> Result<Option<PetRecord>, StoreError> {
        self.check()?;
        self.inner.pet(pet_id)
    }

    fn create_pet(
        &self,
        owner_id: &str,
        pet_type: &str,
        name: &str,
    ) -> Result<PetRecord, StoreError> {
        self.check()?;
        self.inner.create_pet(owner_id, pet_type, name)
    }

    fn set_active_pet(&self, owner_id: &str, pet_id: &str) -> Result<bool, StoreError> {
        self.check()?;
        self.inner.set_active_pet(owner_id, pet_id)
    }

    fn update_pet_stats(&self, pet_id: &str, level: u32, hunger: u32) -> Result<(), StoreError> {
        self.check()?;
        self.inner.update_pet_stats(pet_id, level, hunger)
    }
}

/// Everything a scenario test needs: the session (driven directly, no
/// runtime), the shared clock, the raw store, and the owner's receive queue.
#[allow(dead_code)]
pub struct Harness {
    pub session: RoomSession,
    pub clock: Arc<ManualClock>,
    pub store: Arc<dyn Gateway>,
    pub rx: mpsc::UnboundedReceiver<ServerMessage>,
    _dir: tempfile::TempDir,
}

#[allow(dead_code)]
pub fn open_harness(owner_id: &str) -> Harness {
    let dir = tempfile::tempdir().expect("tempdir");
    let store: Arc<dyn Gateway> =
        Arc::new(GameStoreBuilder::new(dir.path()).open().expect("store"));
    harness_with_store(owner_id, store, dir)
}

#[allow(dead_code)]
pub fn open_flaky_harness(owner_id: &str) -> (Harness, Arc<FlakyGateway>) {
    let dir = tempfile::tempdir().expect("tempdir");
    let sled: Arc<dyn Gateway> =
        Arc::new(GameStoreBuilder::new(dir.path()).open().expect("store"));
    let flaky = Arc::new(FlakyGateway::new(sled));
    let store: Arc<dyn Gateway> = flaky.clone();
    (harness_with_store(owner_id, store, dir), flaky)
}

#[allow(dead_code)]
fn harness_with_store(owner_id: &str, store: Arc<dyn Gateway>, dir: tempfile::TempDir) -> Harness {
    let clock = Arc::new(ManualClock::new(1_000_000));
    let deps = RoomDeps {
        catalog: Arc::new(Catalog::standard()),
        store: store.clone(),
        clock: clock.clone(),
        grid: Grid::default(),
    };
    let mut session = RoomSession::create(owner_id, deps).expect("create room");

    let (tx, rx) = mpsc::unbounded_channel();
    session.handle_command(RoomCommand::Join {
        client: ClientHandle {
            session_id: "sess-owner".into(),
            tx,
        },
        discord_id: format!("discord-{}", owner_id),
        display_name: Some("Owner".into()),
    });

    Harness {
        session,
        clock,
        store,
        rx,
        _dir: dir,
    }
}

#[allow(dead_code)]
impl Harness {
    /// Submit a request on behalf of the owner's connection.
    pub fn request(&mut self, message: homestead::room::ClientMessage) {
        self.session.handle_command(RoomCommand::Request {
            session_id: "sess-owner".into(),
            message,
        });
    }

    /// Drain every message queued for the owner's connection.
    pub fn drain(&mut self) -> Vec<ServerMessage> {
        let mut out = Vec::new();
        while let Ok(msg) = self.rx.try_recv() {
            out.push(msg);
        }
        out
    }

    /// The ack or error for the most recent request. Acks are sent to the
    /// requester before any broadcast, so it is the first queued message.
    pub fn first_response(&mut self) -> ServerMessage {
        self.drain()
            .into_iter()
            .next()
            .expect("session produced no messages")
    }
}

#[allow(dead_code)]
pub fn open_plain_store() -> (tempfile::TempDir, GameStore) {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = GameStore::open(dir.path()).expect("store");
    (dir, store)
}
