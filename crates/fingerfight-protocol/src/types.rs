//! Identity, player and tap types shared by every Finger Fight crate.
//!
//! Everything in here travels on the wire, so field names follow the
//! client's camelCase convention via `#[serde(rename_all = "camelCase")]`.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Ephemeral per-connection player identifier.
///
/// Serialized as a plain number (`#[serde(transparent)]`), displayed as
/// `P-<n>` in logs.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// Internal room identifier. Clients address rooms by [`RoomCode`]; the id
/// doubles as the match id in [`MatchState`](crate::MatchState).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RoomId(pub u64);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// RoomCode
// ---------------------------------------------------------------------------

/// Length of a human-entry room code.
pub const ROOM_CODE_LEN: usize = 5;

/// Symbols a room code may contain. `I`, `O`, `0` and `1` are left out so
/// codes survive being read aloud.
pub const ROOM_CODE_ALPHABET: &str = "ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// A five-character join code such as `K7QXM`.
///
/// Always stored upper-case. Parsing accepts lower-case input, so lookups
/// are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomCode(String);

impl RoomCode {
    /// Validates and normalizes a user-supplied code.
    pub fn parse(value: &str) -> Result<Self, ProtocolError> {
        let normalized = value.trim().to_ascii_uppercase();
        let found = normalized.chars().count();
        if found != ROOM_CODE_LEN {
            return Err(ProtocolError::InvalidMessage(format!(
                "room code must be {ROOM_CODE_LEN} chars, got {found}"
            )));
        }
        if let Some((index, ch)) = normalized
            .chars()
            .enumerate()
            .find(|(_, ch)| !ROOM_CODE_ALPHABET.contains(*ch))
        {
            return Err(ProtocolError::InvalidMessage(format!(
                "invalid character '{ch}' at position {index} in room code"
            )));
        }
        Ok(Self(normalized))
    }

    /// Draws a fresh random code. Collision checking is the caller's job.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let symbols = ROOM_CODE_ALPHABET.as_bytes();
        let code = (0..ROOM_CODE_LEN)
            .map(|_| symbols[rng.random_range(0..symbols.len())] as char)
            .collect();
        Self(code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for RoomCode {
    type Err = ProtocolError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl TryFrom<String> for RoomCode {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RoomCode> for String {
    fn from(code: RoomCode) -> Self {
        code.0
    }
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// One of the four player colors. Serialized as its hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerColor {
    #[serde(rename = "#FF4B4B")]
    Red,
    #[serde(rename = "#4BABFF")]
    Blue,
    #[serde(rename = "#FFD93D")]
    Yellow,
    #[serde(rename = "#6BCB77")]
    Green,
}

/// Colors in assignment order.
pub const PLAYER_COLORS: [PlayerColor; 4] = [
    PlayerColor::Red,
    PlayerColor::Blue,
    PlayerColor::Yellow,
    PlayerColor::Green,
];

impl PlayerColor {
    pub fn hex(self) -> &'static str {
        match self {
            Self::Red => "#FF4B4B",
            Self::Blue => "#4BABFF",
            Self::Yellow => "#FFD93D",
            Self::Green => "#6BCB77",
        }
    }

    /// Human-readable color name, used for CPU opponent nicknames.
    pub fn name(self) -> &'static str {
        match self {
            Self::Red => "Red",
            Self::Blue => "Blue",
            Self::Yellow => "Yellow",
            Self::Green => "Green",
        }
    }
}

impl fmt::Display for PlayerColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.hex())
    }
}

/// A room member as seen by every client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub nickname: String,
    pub color: PlayerColor,
    pub is_host: bool,
    #[serde(rename = "isCPU")]
    pub is_cpu: bool,
    pub connected: bool,
}

// ---------------------------------------------------------------------------
// PlayerScore
// ---------------------------------------------------------------------------

/// A player's per-round points. The cumulative total is derived, never
/// stored, so it cannot drift from `round_scores`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "PlayerScoreWire", try_from = "PlayerScoreWire")]
pub struct PlayerScore {
    pub player_id: PlayerId,
    pub round_scores: Vec<i64>,
}

impl PlayerScore {
    pub fn new(player_id: PlayerId) -> Self {
        Self {
            player_id,
            round_scores: Vec::new(),
        }
    }

    pub fn total(&self) -> i64 {
        self.round_scores.iter().sum()
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerScoreWire {
    player_id: PlayerId,
    round_scores: Vec<i64>,
    total_score: i64,
}

impl From<PlayerScore> for PlayerScoreWire {
    fn from(score: PlayerScore) -> Self {
        Self {
            total_score: score.total(),
            player_id: score.player_id,
            round_scores: score.round_scores,
        }
    }
}

impl TryFrom<PlayerScoreWire> for PlayerScore {
    type Error = String;

    fn try_from(wire: PlayerScoreWire) -> Result<Self, Self::Error> {
        let score = PlayerScore {
            player_id: wire.player_id,
            round_scores: wire.round_scores,
        };
        if score.total() != wire.total_score {
            return Err(format!(
                "totalScore {} does not match roundScores sum {}",
                wire.total_score,
                score.total()
            ));
        }
        Ok(score)
    }
}

// ---------------------------------------------------------------------------
// Taps
// ---------------------------------------------------------------------------

/// Width of the logical tap zone every client maps its input into.
pub const ZONE_WIDTH: f64 = 400.0;
/// Height of the logical tap zone.
pub const ZONE_HEIGHT: f64 = 600.0;

/// A single touch registered by a client.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TapEvent {
    /// Milliseconds since the round started on the client's clock.
    pub timestamp: f64,
    pub x: f64,
    pub y: f64,
    pub finger_id: u32,
}

/// A batch of taps flushed by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TapPayload {
    pub taps: Vec<TapEvent>,
    pub window_start: f64,
    pub window_end: f64,
}

/// A point in normalized (0..1) zone coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Wall-clock milliseconds since the Unix epoch, as sent in
/// `round-start`, `golden-target` and `pong`.
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
