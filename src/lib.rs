//! # Homestead - Authoritative Room Server
//!
//! Homestead is the server half of a social house-decorating game: clients place,
//! move, and remove furniture on a shared grid, plant and harvest crops, buy items,
//! hatch pets, and visit friends' houses. Every mutation is validated server-side
//! and the resulting state is broadcast to all clients connected to the room.
//!
//! ## Features
//!
//! - **Authoritative Rooms**: One session per house; all mutations validated against
//!   the catalog, grid bounds, and tile occupancy before anything changes.
//! - **Single Writer Per Room**: Each room is an actor with one command queue consumed
//!   by one task, so handlers for the same room never interleave.
//! - **Write-Through Persistence**: Durable writes land in the sled-backed store
//!   before the in-memory world mutates; a failed write leaves both sides untouched.
//! - **Derived Progression**: Crop growth, pet hatching, and hunger are computed from
//!   timestamps on demand; the server schedules no timers for them.
//! - **Async Design**: Built with Tokio; newline-delimited JSON over TCP.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use homestead::config::Config;
//! use homestead::net::GameServer;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     let server = GameServer::new(config)?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`room`] - Room sessions, world state, wire messages, and the room registry
//! - [`services`] - Shop, IAP fulfillment, and the pure growth/incubation rules
//! - [`store`] - The persistence gateway trait and its sled implementation
//! - [`catalog`] - Static item/plant/pet/SKU definitions
//! - [`net`] - TCP transport bridging clients to room sessions
//! - [`config`] - Configuration management and validation
//!
//! ## Architecture
//!
//! ```text
//! client ──> net (framed JSON) ──> room registry ──> room session (actor)
//!                                                        │
//!                                      validate ── catalog + grid checks
//!                                        write ── store (sled gateway)
//!                                       mutate ── world state
//!                                    broadcast ── sync events to all clients
//! ```

pub mod catalog;
pub mod config;
pub mod logutil;
pub mod net;
pub mod room;
pub mod services;
pub mod store;
pub mod validation;
