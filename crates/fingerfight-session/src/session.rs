//! Session types: the server's record of one live connection.

use std::time::Duration;

use fingerfight_protocol::PlayerId;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::RateLimiter;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Limits applied to every connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Messages allowed per [`rate_window`](Self::rate_window).
    pub rate_limit: usize,

    pub rate_window: Duration,

    /// How often the server sweeps for silent connections. A connection
    /// survives a sweep if it sent anything (frame or pong) since the
    /// previous one.
    pub heartbeat_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            rate_limit: 60,
            rate_window: Duration::from_millis(1_000),
            heartbeat_interval: Duration::from_secs(30),
        }
    }
}

// ---------------------------------------------------------------------------
// ConnectionSignal
// ---------------------------------------------------------------------------

/// Instructions from the liveness sweep to a connection's handler task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionSignal {
    /// Send a transport-level ping.
    Ping,
    /// The connection stayed silent for a full sweep; drop it.
    Disconnect,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct Session {
    pub player_id: PlayerId,
    pub opened_at: Instant,
    /// Whether anything arrived since the last liveness sweep.
    pub(crate) alive: bool,
    pub(crate) limiter: RateLimiter,
    pub(crate) signals: mpsc::UnboundedSender<ConnectionSignal>,
}

impl Session {
    pub fn is_alive(&self) -> bool {
        self.alive
    }
}
