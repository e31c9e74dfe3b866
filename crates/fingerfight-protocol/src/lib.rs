//! Wire protocol for Finger Fight.
//!
//! This crate defines what clients and the server say to each other and the
//! match data model every other crate shares:
//!
//! - **Identity** ([`PlayerId`], [`RoomId`], [`RoomCode`])
//! - **Players and scores** ([`Player`], [`PlayerColor`], [`PlayerScore`])
//! - **Rounds** ([`RoundConfig`], [`ScoringRule`], [`InputRule`],
//!   [`DurationPolicy`]) and [`MatchSettings`]
//! - **Frames** ([`ClientMessage`], [`ServerMessage`], [`ErrorCode`])
//! - **Codec** ([`Codec`] trait, [`JsonCodec`])
//!
//! ```text
//! Transport (bytes) → Protocol (ClientMessage) → Room actor
//! ```

mod codec;
mod error;
mod message;
mod round;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use message::{ClientMessage, ErrorCode, ServerMessage};
pub use round::{
    DurationPolicy, InputRule, MatchPhase, MatchSettings, MatchSettingsPatch, MatchState,
    RoundConfig, RoundModifiers, RoundType, ScoringRule, TargetZone, UiOverlay,
};
pub use types::{
    PLAYER_COLORS, Player, PlayerColor, PlayerId, PlayerScore, Position, ROOM_CODE_ALPHABET,
    ROOM_CODE_LEN, RoomCode, RoomId, TapEvent, TapPayload, ZONE_HEIGHT, ZONE_WIDTH,
    unix_millis,
};
