//! Room registry: creates, tracks, and routes players to rooms.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use fingerfight_engine::PlayerSink;
use fingerfight_protocol::{PlayerId, RoomCode, RoomId};
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::room::{Founder, spawn_room};
use crate::{Departure, RoomConfig, RoomError, RoomHandle, RoomSnapshot};

/// Counter for generating unique room IDs.
static NEXT_ROOM_ID: AtomicU64 = AtomicU64::new(1);

/// Counts reported by the periodic sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryStats {
    pub rooms: usize,
    /// Players currently seated in some room.
    pub players: usize,
}

struct RoomEntry {
    handle: RoomHandle,
    expires_at: Instant,
    /// Sending on this expires the room; dropping it ends the actor
    /// without a `room-closed` broadcast.
    shutdown: oneshot::Sender<()>,
}

/// Tracks every live room and which room each player is in.
///
/// A player is in at most one room. Creating or joining while already
/// seated elsewhere leaves the old room first.
///
/// Like the session manager, the registry has no interior locking; the
/// server holds it behind one mutex and clones [`RoomHandle`]s out of it
/// before any long await.
pub struct RoomRegistry {
    config: RoomConfig,
    rooms: HashMap<RoomId, RoomEntry>,
    codes: HashMap<RoomCode, RoomId>,
    player_rooms: HashMap<PlayerId, RoomId>,
}

impl RoomRegistry {
    pub fn new(config: RoomConfig) -> Self {
        Self {
            config,
            rooms: HashMap::new(),
            codes: HashMap::new(),
            player_rooms: HashMap::new(),
        }
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Creates a room hosted by `player_id` under a fresh code.
    ///
    /// The host is sent `room-created` before this returns.
    pub async fn create_room(
        &mut self,
        player_id: PlayerId,
        nickname: String,
        sink: Arc<dyn PlayerSink>,
    ) -> RoomSnapshot {
        self.remove_player(player_id).await;

        let room_id = RoomId(NEXT_ROOM_ID.fetch_add(1, Ordering::Relaxed));
        let code = self.unique_code();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let (handle, snapshot) = spawn_room(
            room_id,
            code.clone(),
            Founder {
                player_id,
                nickname,
                sink,
            },
            &self.config,
            shutdown_rx,
        );

        self.codes.insert(code.clone(), room_id);
        self.player_rooms.insert(player_id, room_id);
        self.rooms.insert(
            room_id,
            RoomEntry {
                handle,
                expires_at: snapshot.expires_at,
                shutdown: shutdown_tx,
            },
        );
        info!(%room_id, %code, host = %player_id, rooms = self.rooms.len(), "room created");
        snapshot
    }

    fn unique_code(&self) -> RoomCode {
        let mut rng = rand::rng();
        loop {
            let code = RoomCode::generate(&mut rng);
            if !self.codes.contains_key(&code) {
                return code;
            }
        }
    }

    /// Joins the room answering to `code`. Codes are case-insensitive.
    pub async fn join_room(
        &mut self,
        code: &str,
        player_id: PlayerId,
        nickname: String,
        sink: Arc<dyn PlayerSink>,
    ) -> Result<RoomSnapshot, RoomError> {
        let code = RoomCode::parse(code).map_err(|_| RoomError::NotFound(code.to_owned()))?;
        let room_id = *self
            .codes
            .get(&code)
            .ok_or_else(|| RoomError::NotFound(code.to_string()))?;

        self.remove_player(player_id).await;

        // The old room may have been this one and died with the departure.
        let handle = self
            .rooms
            .get(&room_id)
            .map(|entry| entry.handle.clone())
            .ok_or_else(|| RoomError::NotFound(code.to_string()))?;

        let snapshot = handle.join(player_id, nickname, sink).await?;
        self.player_rooms.insert(player_id, room_id);
        Ok(snapshot)
    }

    /// Takes a player out of whatever room they are in.
    ///
    /// Used for `leave-room` and for disconnects alike. A room left empty,
    /// or whose actor is already gone, is destroyed.
    pub async fn remove_player(&mut self, player_id: PlayerId) -> Option<Departure> {
        let room_id = self.player_rooms.remove(&player_id)?;
        let handle = self.rooms.get(&room_id)?.handle.clone();

        match handle.leave(player_id).await {
            Ok(departure) => {
                if departure.remaining == 0 {
                    self.destroy(room_id);
                }
                Some(departure)
            }
            Err(RoomError::Unavailable(_)) => {
                self.destroy(room_id);
                None
            }
            Err(e) => {
                debug!(%room_id, %player_id, error = %e, "leave failed");
                None
            }
        }
    }

    /// Forgets a room. Its actor ends once the registry's handle and
    /// shutdown sender are dropped.
    fn destroy(&mut self, room_id: RoomId) {
        let Some(entry) = self.rooms.remove(&room_id) else {
            return;
        };
        self.codes.remove(entry.handle.code());
        self.player_rooms.retain(|_, rid| *rid != room_id);
        info!(%room_id, rooms = self.rooms.len(), "room destroyed");
    }

    /// Expires every room past its TTL. Members are sent `room-closed`.
    /// Returns how many rooms were closed.
    pub fn cleanup_expired(&mut self) -> usize {
        self.cleanup_expired_at(Instant::now())
    }

    pub fn cleanup_expired_at(&mut self, now: Instant) -> usize {
        let expired: Vec<RoomId> = self
            .rooms
            .iter()
            .filter(|(_, entry)| now > entry.expires_at)
            .map(|(&room_id, _)| room_id)
            .collect();

        for &room_id in &expired {
            if let Some(entry) = self.rooms.remove(&room_id) {
                let _ = entry.shutdown.send(());
                self.codes.remove(entry.handle.code());
                self.player_rooms.retain(|_, rid| *rid != room_id);
                info!(%room_id, "room expired");
            }
        }
        expired.len()
    }

    // -- lookups -----------------------------------------------------------

    pub fn handle(&self, room_id: RoomId) -> Option<RoomHandle> {
        self.rooms.get(&room_id).map(|entry| entry.handle.clone())
    }

    /// The handle of the room `player_id` is in.
    pub fn handle_for(&self, player_id: PlayerId) -> Option<RoomHandle> {
        self.room_of(player_id).and_then(|room_id| self.handle(room_id))
    }

    pub fn room_of(&self, player_id: PlayerId) -> Option<RoomId> {
        self.player_rooms.get(&player_id).copied()
    }

    pub fn room_by_code(&self, code: &str) -> Option<RoomId> {
        let code = RoomCode::parse(code).ok()?;
        self.codes.get(&code).copied()
    }

    pub async fn snapshot(&self, room_id: RoomId) -> Result<RoomSnapshot, RoomError> {
        let handle = self
            .handle(room_id)
            .ok_or_else(|| RoomError::NotFound(room_id.to_string()))?;
        handle.info().await
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            rooms: self.rooms.len(),
            players: self.player_rooms.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}
