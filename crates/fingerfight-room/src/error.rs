//! Error types for the room layer.

use fingerfight_protocol::{ErrorCode, PlayerId, RoomId};

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// No room answers to this code.
    #[error("room {0} not found")]
    NotFound(String),

    #[error("room {0} is full")]
    RoomFull(RoomId),

    /// The room is not accepting this operation while a match is on (or
    /// after one finished, for joins).
    #[error("room {0} is in a game")]
    InGame(RoomId),

    #[error("nickname {0:?} is already taken")]
    NicknameTaken(String),

    #[error("only the host can do that")]
    NotHost,

    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    #[error("player {0} not in room {1}")]
    NotInRoom(PlayerId, RoomId),

    /// The room's actor is gone.
    #[error("room {0} is unavailable")]
    Unavailable(RoomId),
}

impl RoomError {
    /// The wire code reported to the client.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound(_) | Self::NotInRoom(..) | Self::Unavailable(_) => {
                ErrorCode::RoomNotFound
            }
            Self::RoomFull(_) => ErrorCode::RoomFull,
            Self::InGame(_) => ErrorCode::RoomInGame,
            Self::NicknameTaken(_) => ErrorCode::NicknameTaken,
            Self::NotHost => ErrorCode::NotHost,
            Self::InvalidSettings(_) => ErrorCode::InvalidMessage,
        }
    }
}
