//! The session manager: tracks every live connection.
//!
//! # Concurrency note
//!
//! `SessionManager` is a plain `HashMap` owner with no interior locking.
//! The server keeps it behind one `tokio::sync::Mutex` and never holds that
//! lock across socket I/O.

use std::collections::HashMap;

use fingerfight_protocol::PlayerId;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::{ConnectionSignal, RateLimiter, Session, SessionConfig, SessionError};

/// Registry of live connections, keyed by the player id each one was given.
///
/// ```text
/// open() ──▶ [alive] ──sweep──▶ [silent] ──sweep──▶ Disconnect, removed
///               ▲                   │
///               └──── touch() ──────┘
/// ```
pub struct SessionManager {
    sessions: HashMap<PlayerId, Session>,
    next_id: u64,
    config: SessionConfig,
}

impl SessionManager {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            sessions: HashMap::new(),
            next_id: 1,
            config,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Opens a session for a new connection and returns its player id.
    ///
    /// `signals` is how the liveness sweep reaches the connection's task.
    pub fn open(&mut self, signals: mpsc::UnboundedSender<ConnectionSignal>) -> PlayerId {
        let player_id = PlayerId(self.next_id);
        self.next_id += 1;
        self.sessions.insert(
            player_id,
            Session {
                player_id,
                opened_at: Instant::now(),
                alive: true,
                limiter: RateLimiter::new(self.config.rate_limit, self.config.rate_window),
                signals,
            },
        );
        info!(%player_id, sessions = self.sessions.len(), "session opened");
        player_id
    }

    /// Removes a session. Called when the connection ends, for any reason.
    pub fn close(&mut self, player_id: PlayerId) -> Result<Session, SessionError> {
        let session = self
            .sessions
            .remove(&player_id)
            .ok_or(SessionError::NotFound(player_id))?;
        info!(%player_id, sessions = self.sessions.len(), "session closed");
        Ok(session)
    }

    /// Marks the connection as alive. Any inbound frame or pong counts.
    pub fn touch(&mut self, player_id: PlayerId) {
        if let Some(session) = self.sessions.get_mut(&player_id) {
            session.alive = true;
        }
    }

    /// Counts one inbound message against the connection's window.
    pub fn check_rate(&mut self, player_id: PlayerId) -> Result<(), SessionError> {
        let session = self
            .sessions
            .get_mut(&player_id)
            .ok_or(SessionError::NotFound(player_id))?;
        if session.limiter.check() {
            Ok(())
        } else {
            debug!(%player_id, "rate limited");
            Err(SessionError::RateLimited(player_id))
        }
    }

    /// Runs one heartbeat sweep.
    ///
    /// Sessions that stayed silent since the previous sweep are told to
    /// disconnect and removed; their ids are returned so the caller can run
    /// the normal departure path. Everyone else is pinged and must answer
    /// before the next sweep.
    pub fn sweep_liveness(&mut self) -> Vec<PlayerId> {
        let mut silent = Vec::new();
        self.sessions.retain(|&player_id, session| {
            if session.alive {
                session.alive = false;
                let _ = session.signals.send(ConnectionSignal::Ping);
                true
            } else {
                let _ = session.signals.send(ConnectionSignal::Disconnect);
                silent.push(player_id);
                false
            }
        });
        if !silent.is_empty() {
            info!(count = silent.len(), "dropped silent connections");
        }
        silent
    }

    pub fn get(&self, player_id: &PlayerId) -> Option<&Session> {
        self.sessions.get(player_id)
    }

    pub fn contains(&self, player_id: &PlayerId) -> bool {
        self.sessions.contains_key(player_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn manager() -> SessionManager {
        SessionManager::new(SessionConfig::default())
    }

    fn open(mgr: &mut SessionManager) -> (PlayerId, mpsc::UnboundedReceiver<ConnectionSignal>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (mgr.open(tx), rx)
    }

    // =====================================================================
    // open() / close()
    // =====================================================================

    #[test]
    fn test_open_assigns_increasing_ids() {
        let mut mgr = manager();
        let (a, _ra) = open(&mut mgr);
        let (b, _rb) = open(&mut mgr);
        assert_eq!(a, PlayerId(1));
        assert_eq!(b, PlayerId(2));
        assert_eq!(mgr.len(), 2);
        assert!(mgr.get(&a).is_some_and(Session::is_alive));
    }

    #[test]
    fn test_close_removes_session_once() {
        let mut mgr = manager();
        let (a, _ra) = open(&mut mgr);
        assert_eq!(mgr.close(a).unwrap().player_id, a);
        assert!(matches!(mgr.close(a), Err(SessionError::NotFound(p)) if p == a));
        assert!(mgr.is_empty());
    }

    #[test]
    fn test_ids_are_not_reused_after_close() {
        let mut mgr = manager();
        let (a, _ra) = open(&mut mgr);
        mgr.close(a).unwrap();
        let (b, _rb) = open(&mut mgr);
        assert_ne!(a, b);
    }

    // =====================================================================
    // check_rate()
    // =====================================================================

    #[tokio::test(start_paused = true)]
    async fn test_check_rate_rejects_past_limit() {
        let mut mgr = SessionManager::new(SessionConfig {
            rate_limit: 3,
            ..SessionConfig::default()
        });
        let (a, _ra) = open(&mut mgr);
        for _ in 0..3 {
            assert!(mgr.check_rate(a).is_ok());
        }
        assert!(matches!(mgr.check_rate(a), Err(SessionError::RateLimited(_))));

        tokio::time::advance(Duration::from_millis(1_000)).await;
        assert!(mgr.check_rate(a).is_ok());
    }

    #[test]
    fn test_check_rate_unknown_player() {
        let mut mgr = manager();
        assert!(matches!(
            mgr.check_rate(PlayerId(9)),
            Err(SessionError::NotFound(_))
        ));
    }

    // =====================================================================
    // sweep_liveness()
    // =====================================================================

    #[test]
    fn test_sweep_liveness_pings_then_drops_silent() {
        let mut mgr = manager();
        let (a, mut ra) = open(&mut mgr);
        let (b, mut rb) = open(&mut mgr);

        assert!(mgr.sweep_liveness().is_empty());
        assert_eq!(ra.try_recv(), Ok(ConnectionSignal::Ping));
        assert_eq!(rb.try_recv(), Ok(ConnectionSignal::Ping));

        mgr.touch(b);
        assert_eq!(mgr.sweep_liveness(), vec![a]);
        assert_eq!(ra.try_recv(), Ok(ConnectionSignal::Disconnect));
        assert_eq!(rb.try_recv(), Ok(ConnectionSignal::Ping));
        assert!(!mgr.contains(&a));
        assert!(mgr.contains(&b));
    }

    #[test]
    fn test_sweep_liveness_tolerates_gone_receiver() {
        let mut mgr = manager();
        let (a, ra) = open(&mut mgr);
        drop(ra);
        assert!(mgr.sweep_liveness().is_empty());
        assert_eq!(mgr.sweep_liveness(), vec![a]);
    }
}
