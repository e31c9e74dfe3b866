//! `FingerFightServer` builder and server loop.
//!
//! This is the entry point for running a Finger Fight server. It ties
//! together all the layers: transport → protocol → session → room.

use std::sync::Arc;
use std::time::Duration;

use fingerfight_protocol::JsonCodec;
use fingerfight_room::{RoomConfig, RoomRegistry};
use fingerfight_session::{SessionConfig, SessionManager};
use fingerfight_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::handler::handle_connection;
use crate::{FingerFightError, ServerConfig};

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. Neither
/// lock is held across socket I/O.
pub(crate) struct ServerState {
    pub(crate) sessions: Mutex<SessionManager>,
    pub(crate) rooms: Mutex<RoomRegistry>,
    pub(crate) codec: JsonCodec,
}

/// Builder for configuring and starting a Finger Fight server.
///
/// # Example
///
/// ```rust,no_run
/// use fingerfight::FingerFightServer;
///
/// # async fn run() -> Result<(), fingerfight::FingerFightError> {
/// let server = FingerFightServer::builder()
///     .bind("0.0.0.0:3001")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct FingerFightServerBuilder {
    config: ServerConfig,
}

impl FingerFightServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
        }
    }

    /// Starts from a complete configuration, e.g. [`ServerConfig::from_env`].
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.config.session = config;
        self
    }

    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.config.room = config;
        self
    }

    /// How often expired rooms are swept.
    pub fn cleanup_interval(mut self, interval: Duration) -> Self {
        self.config.cleanup_interval = interval;
        self
    }

    /// Binds the listener. Nothing is accepted until
    /// [`run`](FingerFightServer::run).
    pub async fn build(self) -> Result<FingerFightServer, FingerFightError> {
        let transport = WebSocketTransport::bind(&self.config.bind_addr).await?;

        let state = Arc::new(ServerState {
            sessions: Mutex::new(SessionManager::new(self.config.session.clone())),
            rooms: Mutex::new(RoomRegistry::new(self.config.room.clone())),
            codec: JsonCodec,
        });

        Ok(FingerFightServer {
            transport,
            state,
            config: self.config,
        })
    }
}

impl Default for FingerFightServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Finger Fight server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct FingerFightServer {
    transport: WebSocketTransport,
    state: Arc<ServerState>,
    config: ServerConfig,
}

impl FingerFightServer {
    /// Creates a new builder.
    pub fn builder() -> FingerFightServerBuilder {
        FingerFightServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the server accept loop.
    ///
    /// Starts the heartbeat and room-expiry sweeps, then accepts incoming
    /// connections and spawns a handler task for each. Runs until the
    /// process is terminated.
    pub async fn run(mut self) -> Result<(), FingerFightError> {
        info!(addr = %self.config.bind_addr, "Finger Fight server running");

        spawn_heartbeat(
            Arc::clone(&self.state),
            self.config.session.heartbeat_interval,
        );
        spawn_cleanup(Arc::clone(&self.state), self.config.cleanup_interval);

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    error!(error = %e, "accept failed");
                }
            }
        }
    }
}

/// Pings every connection each `interval`. Connections that stayed silent
/// since the previous sweep are told to disconnect; their handlers run
/// the usual departure path.
fn spawn_heartbeat(state: Arc<ServerState>, interval: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let dropped = state.sessions.lock().await.sweep_liveness();
            for player_id in dropped {
                info!(%player_id, "heartbeat timeout");
            }
        }
    });
}

/// Expires rooms past their TTL each `interval` and logs the room and
/// player counts.
fn spawn_cleanup(state: Arc<ServerState>, interval: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let (cleaned, stats) = {
                let mut rooms = state.rooms.lock().await;
                (rooms.cleanup_expired(), rooms.stats())
            };
            if cleaned > 0 {
                info!(cleaned, "cleaned expired rooms");
            }
            debug!(rooms = stats.rooms, players = stats.players, "room sweep");
        }
    });
}
