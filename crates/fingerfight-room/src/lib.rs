//! Room lifecycle management for Finger Fight.
//!
//! Each room runs as an isolated Tokio task (actor model) that owns its
//! members, its settings and, while a match is on, its
//! [`MatchOrchestrator`](fingerfight_engine::MatchOrchestrator).
//!
//! # Key types
//!
//! - [`RoomRegistry`]: creates and destroys rooms, maps codes and players
//!   to rooms, sweeps expired rooms
//! - [`RoomHandle`]: send commands to a running room actor
//! - [`RoomSnapshot`]: a point-in-time copy of a room's metadata
//! - [`RoomState`]: lifecycle state machine
//! - [`RoomConfig`]: TTL, channel size and match timings

mod config;
mod error;
mod members;
mod registry;
mod room;

pub use config::{RoomConfig, RoomState};
pub use error::RoomError;
pub use registry::{RegistryStats, RoomRegistry};
pub use room::{Departure, RoomHandle, RoomSnapshot};
