//! # Finger Fight
//!
//! Match server for Finger Fight, a multiplayer tapping contest. Players
//! connect over WebSocket, gather in rooms addressed by five-character
//! codes, and play timed rounds whose clock, scoring and anti-cheat all
//! run on the server.
//!
//! This crate is the network adapter over the match engine: it accepts
//! connections, gives each one a session, routes frames to room actors,
//! and runs the heartbeat and room-expiry sweeps.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fingerfight::{FingerFightServer, ServerConfig};
//!
//! # async fn run() -> Result<(), fingerfight::FingerFightError> {
//! let server = FingerFightServer::builder()
//!     .config(ServerConfig::from_env()?)
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod server;

pub use config::ServerConfig;
pub use error::FingerFightError;
pub use server::{FingerFightServer, FingerFightServerBuilder};
