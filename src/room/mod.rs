//! Room sessions and everything they speak.
//!
//! A room is the authoritative multiplayer session for one house: it owns the
//! shared world state, validates every mutation, writes through to the store,
//! and broadcasts the resulting deltas. [`registry::RoomRegistry`] maps owner
//! ids to live rooms and handles join/leave/visit; [`session::RoomSession`]
//! is the single-writer actor that does the work.

pub mod errors;
pub mod grid;
pub mod messages;
pub mod registry;
pub mod session;
pub mod state;

pub use errors::RoomError;
pub use grid::{is_in_bounds, Grid};
pub use messages::{ClientMessage, ServerMessage};
pub use registry::RoomRegistry;
pub use session::{ClientHandle, Clock, RoomCommand, RoomDeps, RoomHandle, RoomSession, SystemClock};
pub use state::{PlacedItem, PlayerInfo, SyncEvent, WorldState};
