//! Client and server message frames.
//!
//! One JSON object per WebSocket frame, internally tagged by `type`:
//!
//! ```text
//! {"type": "join-room", "roomCode": "K7QXM", "nickname": "ana"}
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    MatchSettings, MatchSettingsPatch, MatchState, Player, PlayerId, PlayerScore, Position,
    RoomCode, RoundConfig, TapPayload,
};

/// Messages a client may send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ClientMessage {
    CreateRoom {
        nickname: String,
    },
    JoinRoom {
        room_code: String,
        nickname: String,
    },
    LeaveRoom,
    StartMatch,
    TapData {
        payload: TapPayload,
    },
    Ready,
    Ping {
        timestamp: f64,
    },
    UpdateSettings {
        settings: MatchSettingsPatch,
    },
}

impl ClientMessage {
    /// Tag name, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CreateRoom { .. } => "create-room",
            Self::JoinRoom { .. } => "join-room",
            Self::LeaveRoom => "leave-room",
            Self::StartMatch => "start-match",
            Self::TapData { .. } => "tap-data",
            Self::Ready => "ready",
            Self::Ping { .. } => "ping",
            Self::UpdateSettings { .. } => "update-settings",
        }
    }
}

/// Messages the server pushes to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ServerMessage {
    RoomCreated {
        room_code: RoomCode,
        player_id: PlayerId,
        player: Player,
    },
    RoomJoined {
        room_code: RoomCode,
        player_id: PlayerId,
        player: Player,
        players: Vec<Player>,
    },
    PlayerJoined {
        player: Player,
    },
    PlayerLeft {
        player_id: PlayerId,
    },
    HostChanged {
        player_id: PlayerId,
    },
    RoomClosed,
    MatchStarting {
        match_state: MatchState,
    },
    RoundIntro {
        round: u32,
        config: RoundConfig,
    },
    RoundStart {
        round: u32,
        start_time: u64,
        end_time: u64,
    },
    RoundTick {
        /// Seconds, one decimal place.
        time_remaining: f64,
    },
    RoundEnd {
        round: u32,
        scores: Vec<PlayerScore>,
    },
    GoldenTarget {
        position: Position,
        expires_at: u64,
    },
    MatchEnd {
        final_scores: Vec<PlayerScore>,
        winner: Player,
    },
    Error {
        code: ErrorCode,
        message: String,
    },
    Pong {
        timestamp: f64,
        server_time: u64,
    },
    SettingsUpdated {
        settings: MatchSettings,
    },
}

impl ServerMessage {
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Error {
            code,
            message: message.into(),
        }
    }

    /// Tag name, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RoomCreated { .. } => "room-created",
            Self::RoomJoined { .. } => "room-joined",
            Self::PlayerJoined { .. } => "player-joined",
            Self::PlayerLeft { .. } => "player-left",
            Self::HostChanged { .. } => "host-changed",
            Self::RoomClosed => "room-closed",
            Self::MatchStarting { .. } => "match-starting",
            Self::RoundIntro { .. } => "round-intro",
            Self::RoundStart { .. } => "round-start",
            Self::RoundTick { .. } => "round-tick",
            Self::RoundEnd { .. } => "round-end",
            Self::GoldenTarget { .. } => "golden-target",
            Self::MatchEnd { .. } => "match-end",
            Self::Error { .. } => "error",
            Self::Pong { .. } => "pong",
            Self::SettingsUpdated { .. } => "settings-updated",
        }
    }
}

/// Error codes surfaced to clients in `error` frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    RoomNotFound,
    RoomFull,
    RoomInGame,
    NotHost,
    InvalidMessage,
    RateLimited,
    NicknameTaken,
    InvalidNickname,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::RoomNotFound => "ROOM_NOT_FOUND",
            Self::RoomFull => "ROOM_FULL",
            Self::RoomInGame => "ROOM_IN_GAME",
            Self::NotHost => "NOT_HOST",
            Self::InvalidMessage => "INVALID_MESSAGE",
            Self::RateLimited => "RATE_LIMITED",
            Self::NicknameTaken => "NICKNAME_TAKEN",
            Self::InvalidNickname => "INVALID_NICKNAME",
        };
        f.write_str(s)
    }
}
