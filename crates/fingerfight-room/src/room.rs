//! Room actor: an isolated Tokio task that owns one room.
//!
//! Each room runs in its own task, communicating with the outside world
//! through an mpsc channel. Membership changes, settings, tap intake and
//! every match timer are serialized through one `select!` loop, so the
//! room never needs a lock.

use std::sync::Arc;

use fingerfight_engine::{BroadcastGateway, MatchOrchestrator, MatchSignal, PlayerSink};
use fingerfight_protocol::{
    MatchSettings, MatchSettingsPatch, Player, PlayerId, RoomCode, RoomId, ServerMessage,
    TapPayload,
};
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::members::Members;
use crate::{RoomConfig, RoomError, RoomState};

/// Commands sent to a room actor through its channel.
///
/// The `oneshot::Sender` in some variants is a reply channel: the caller
/// sends a command and waits for the response on it.
pub(crate) enum RoomCommand {
    Join {
        player_id: PlayerId,
        nickname: String,
        sink: Arc<dyn PlayerSink>,
        reply: oneshot::Sender<Result<RoomSnapshot, RoomError>>,
    },

    Leave {
        player_id: PlayerId,
        reply: oneshot::Sender<Result<Departure, RoomError>>,
    },

    StartMatch {
        player_id: PlayerId,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    UpdateSettings {
        player_id: PlayerId,
        patch: MatchSettingsPatch,
        reply: oneshot::Sender<Result<MatchSettings, RoomError>>,
    },

    /// Fire-and-forget: taps outside a round are dropped silently.
    SubmitTaps {
        player_id: PlayerId,
        payload: TapPayload,
    },

    Ready {
        player_id: PlayerId,
    },

    Info {
        reply: oneshot::Sender<RoomSnapshot>,
    },
}

/// A point-in-time copy of room metadata.
#[derive(Debug, Clone)]
pub struct RoomSnapshot {
    pub room_id: RoomId,
    pub code: RoomCode,
    pub state: RoomState,
    pub host: Option<PlayerId>,
    /// Join order.
    pub players: Vec<Player>,
    pub ready: Vec<PlayerId>,
    pub settings: MatchSettings,
    pub expires_at: Instant,
}

/// Result of a player leaving a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub room_id: RoomId,
    pub player_id: PlayerId,
    pub was_host: bool,
    pub new_host: Option<PlayerId>,
    /// Members left after the departure. Zero means the room is done.
    pub remaining: usize,
}

/// Handle to a running room actor. Cheap to clone; connection handlers
/// cache one so tap traffic skips the registry.
#[derive(Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    code: RoomCode,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> RoomCommand,
    ) -> Result<T, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(make(reply_tx))
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }

    async fn notify(&self, cmd: RoomCommand) -> Result<(), RoomError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }

    /// Adds a player. On success the joiner has already been sent
    /// `room-joined` and everyone else `player-joined`.
    pub async fn join(
        &self,
        player_id: PlayerId,
        nickname: String,
        sink: Arc<dyn PlayerSink>,
    ) -> Result<RoomSnapshot, RoomError> {
        self.request(|reply| RoomCommand::Join {
            player_id,
            nickname,
            sink,
            reply,
        })
        .await?
    }

    pub async fn leave(&self, player_id: PlayerId) -> Result<Departure, RoomError> {
        self.request(|reply| RoomCommand::Leave { player_id, reply })
            .await?
    }

    /// Starts a match, or a rematch from `finished`. Host only.
    pub async fn start_match(&self, player_id: PlayerId) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::StartMatch { player_id, reply })
            .await?
    }

    /// Applies a partial settings update. Host only, `waiting` only.
    pub async fn update_settings(
        &self,
        player_id: PlayerId,
        patch: MatchSettingsPatch,
    ) -> Result<MatchSettings, RoomError> {
        self.request(|reply| RoomCommand::UpdateSettings {
            player_id,
            patch,
            reply,
        })
        .await?
    }

    pub async fn submit_taps(
        &self,
        player_id: PlayerId,
        payload: TapPayload,
    ) -> Result<(), RoomError> {
        self.notify(RoomCommand::SubmitTaps { player_id, payload })
            .await
    }

    pub async fn ready(&self, player_id: PlayerId) -> Result<(), RoomError> {
        self.notify(RoomCommand::Ready { player_id }).await
    }

    pub async fn info(&self) -> Result<RoomSnapshot, RoomError> {
        self.request(|reply| RoomCommand::Info { reply }).await
    }
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor {
    room_id: RoomId,
    code: RoomCode,
    state: RoomState,
    settings: MatchSettings,
    config: RoomConfig,
    expires_at: Instant,
    members: Members,
    /// Present exactly while a match is running.
    orchestrator: Option<MatchOrchestrator>,
    receiver: mpsc::Receiver<RoomCommand>,
    /// Fires (`Ok`) when the registry expires the room; dropped (`Err`)
    /// when the registry forgets an empty room.
    shutdown: oneshot::Receiver<()>,
}

async fn next_match_signal(orchestrator: &mut Option<MatchOrchestrator>) -> MatchSignal {
    match orchestrator {
        Some(orchestrator) => orchestrator.next_signal().await,
        None => std::future::pending().await,
    }
}

impl RoomActor {
    async fn run(mut self) {
        info!(room_id = %self.room_id, code = %self.code, "room actor started");

        loop {
            tokio::select! {
                closed = &mut self.shutdown => {
                    if closed.is_ok() {
                        info!(room_id = %self.room_id, "room expired");
                        self.members.broadcast(&ServerMessage::RoomClosed, None);
                    }
                    break;
                }
                cmd = self.receiver.recv() => match cmd {
                    Some(cmd) => self.handle(cmd),
                    None => break,
                },
                signal = next_match_signal(&mut self.orchestrator) => {
                    if let Some(orchestrator) = &mut self.orchestrator {
                        orchestrator.handle_signal(signal, &self.members);
                    }
                    self.sync_state();
                }
            }
        }

        if let Some(orchestrator) = &mut self.orchestrator {
            orchestrator.stop();
        }
        info!(room_id = %self.room_id, "room actor stopped");
    }

    fn handle(&mut self, cmd: RoomCommand) {
        match cmd {
            RoomCommand::Join {
                player_id,
                nickname,
                sink,
                reply,
            } => {
                let _ = reply.send(self.handle_join(player_id, nickname, sink));
            }
            RoomCommand::Leave { player_id, reply } => {
                let _ = reply.send(self.handle_leave(player_id));
            }
            RoomCommand::StartMatch { player_id, reply } => {
                let _ = reply.send(self.handle_start(player_id));
            }
            RoomCommand::UpdateSettings {
                player_id,
                patch,
                reply,
            } => {
                let _ = reply.send(self.handle_settings(player_id, &patch));
            }
            RoomCommand::SubmitTaps { player_id, payload } => {
                let accepted = self
                    .orchestrator
                    .as_mut()
                    .is_some_and(|o| o.submit_taps(player_id, &payload));
                if !accepted {
                    debug!(room_id = %self.room_id, %player_id, "taps dropped");
                }
            }
            RoomCommand::Ready { player_id } => {
                if self.members.mark_ready(player_id) {
                    debug!(room_id = %self.room_id, %player_id, "player ready");
                }
            }
            RoomCommand::Info { reply } => {
                let _ = reply.send(self.snapshot());
            }
        }
    }

    fn handle_join(
        &mut self,
        player_id: PlayerId,
        nickname: String,
        sink: Arc<dyn PlayerSink>,
    ) -> Result<RoomSnapshot, RoomError> {
        if !self.state.is_joinable() {
            return Err(RoomError::InGame(self.room_id));
        }
        if self.members.len() >= self.settings.max_players {
            return Err(RoomError::RoomFull(self.room_id));
        }
        if self.members.nickname_taken(&nickname) {
            return Err(RoomError::NicknameTaken(nickname));
        }

        let player = self.members.add(player_id, nickname, sink);
        info!(
            room_id = %self.room_id,
            %player_id,
            players = self.members.len(),
            "player joined"
        );
        self.members.send_to(
            player_id,
            &ServerMessage::RoomJoined {
                room_code: self.code.clone(),
                player_id,
                player: player.clone(),
                players: self.members.players(),
            },
        );
        self.members
            .broadcast(&ServerMessage::PlayerJoined { player }, Some(player_id));
        Ok(self.snapshot())
    }

    fn handle_leave(&mut self, player_id: PlayerId) -> Result<Departure, RoomError> {
        let removed = self
            .members
            .remove(player_id)
            .ok_or(RoomError::NotInRoom(player_id, self.room_id))?;
        info!(
            room_id = %self.room_id,
            %player_id,
            players = self.members.len(),
            "player left"
        );

        if let Some(orchestrator) = &mut self.orchestrator {
            orchestrator.remove_participant(player_id);
        }

        if self.members.is_empty() {
            if let Some(mut orchestrator) = self.orchestrator.take() {
                orchestrator.stop();
            }
        } else {
            self.members
                .broadcast(&ServerMessage::PlayerLeft { player_id }, None);
            if let Some(host) = removed.new_host {
                info!(room_id = %self.room_id, %host, "host transferred");
                self.members
                    .broadcast(&ServerMessage::HostChanged { player_id: host }, None);
            }
        }
        self.sync_state();

        Ok(Departure {
            room_id: self.room_id,
            player_id,
            was_host: removed.was_host,
            new_host: removed.new_host,
            remaining: self.members.len(),
        })
    }

    fn handle_start(&mut self, player_id: PlayerId) -> Result<(), RoomError> {
        if self.members.host() != Some(player_id) {
            return Err(RoomError::NotHost);
        }
        if !self.state.can_start() {
            return Err(RoomError::InGame(self.room_id));
        }

        self.members.reset_ready();
        let mut orchestrator = MatchOrchestrator::new(
            self.room_id,
            self.members.players(),
            self.settings.clone(),
            self.config.timings.clone(),
        );
        orchestrator.start(&self.members);
        self.orchestrator = Some(orchestrator);
        self.sync_state();
        info!(
            room_id = %self.room_id,
            players = self.members.len(),
            rounds = self.settings.total_rounds,
            "match started"
        );
        Ok(())
    }

    fn handle_settings(
        &mut self,
        player_id: PlayerId,
        patch: &MatchSettingsPatch,
    ) -> Result<MatchSettings, RoomError> {
        if self.members.host() != Some(player_id) {
            return Err(RoomError::NotHost);
        }
        if self.state != RoomState::Waiting {
            return Err(RoomError::InGame(self.room_id));
        }
        let merged = self.settings.merged(patch);
        merged
            .validate(self.members.len())
            .map_err(RoomError::InvalidSettings)?;

        self.settings = merged;
        debug!(room_id = %self.room_id, settings = ?self.settings, "settings updated");
        self.members.broadcast(
            &ServerMessage::SettingsUpdated {
                settings: self.settings.clone(),
            },
            None,
        );
        Ok(self.settings.clone())
    }

    /// Mirrors the match phase into the room state, and drops the
    /// orchestrator once the match is over.
    fn sync_state(&mut self) {
        let Some(orchestrator) = &self.orchestrator else {
            return;
        };
        let next = if orchestrator.is_finished() {
            RoomState::Finished
        } else {
            RoomState::from(orchestrator.phase())
        };
        if next == RoomState::Finished {
            self.orchestrator = None;
        }
        if next != self.state {
            debug!(room_id = %self.room_id, from = %self.state, to = %next, "room state");
            self.state = next;
        }
    }

    fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            room_id: self.room_id,
            code: self.code.clone(),
            state: self.state,
            host: self.members.host(),
            players: self.members.players(),
            ready: self.members.ready_players(),
            settings: self.settings.clone(),
            expires_at: self.expires_at,
        }
    }
}

/// Host of a new room.
pub(crate) struct Founder {
    pub player_id: PlayerId,
    pub nickname: String,
    pub sink: Arc<dyn PlayerSink>,
}

/// Spawns a room actor with `founder` as its host, sends them
/// `room-created`, and returns the handle with the initial snapshot.
pub(crate) fn spawn_room(
    room_id: RoomId,
    code: RoomCode,
    founder: Founder,
    config: &RoomConfig,
    shutdown: oneshot::Receiver<()>,
) -> (RoomHandle, RoomSnapshot) {
    let (tx, rx) = mpsc::channel(config.channel_size);

    let mut members = Members::default();
    let host = members.add(founder.player_id, founder.nickname, founder.sink);
    members.send_to(
        host.id,
        &ServerMessage::RoomCreated {
            room_code: code.clone(),
            player_id: host.id,
            player: host.clone(),
        },
    );

    let actor = RoomActor {
        room_id,
        code: code.clone(),
        state: RoomState::Waiting,
        settings: config.default_settings.clone(),
        config: config.clone(),
        expires_at: Instant::now() + config.ttl,
        members,
        orchestrator: None,
        receiver: rx,
        shutdown,
    };
    let snapshot = actor.snapshot();

    tokio::spawn(actor.run());

    (
        RoomHandle {
            room_id,
            code,
            sender: tx,
        },
        snapshot,
    )
}
