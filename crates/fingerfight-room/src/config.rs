//! Room configuration and state machine.

use std::fmt;
use std::time::Duration;

use fingerfight_engine::MatchTimings;
use fingerfight_protocol::{MatchPhase, MatchSettings};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Settings shared by every room a registry creates.
#[derive(Debug, Clone)]
pub struct RoomConfig {
    /// Rooms are destroyed this long after creation, whatever they are
    /// doing. Activity does not extend it.
    pub ttl: Duration,

    /// Capacity of each room actor's command channel.
    pub channel_size: usize,

    /// Phase timings handed to every match.
    pub timings: MatchTimings,

    /// Settings a fresh room starts with.
    pub default_settings: MatchSettings,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(30 * 60),
            channel_size: 64,
            timings: MatchTimings::default(),
            default_settings: MatchSettings::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// RoomState
// ---------------------------------------------------------------------------

/// The lifecycle state of a room.
///
/// ```text
/// Waiting → Starting → Playing ⇄ RoundResults → Finished
///    ▲                                             │
///    └──────────── (rematch goes to Starting) ─────┘
/// ```
///
/// - **Waiting**: accepting joins and settings changes.
/// - **Starting**: match announced, countdown running.
/// - **Playing**: a round is on screen (intro or live tapping).
/// - **RoundResults**: between rounds.
/// - **Finished**: podium shown. The host may start a rematch; nobody can
///   join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoomState {
    Waiting,
    Starting,
    Playing,
    RoundResults,
    Finished,
}

impl RoomState {
    pub fn is_joinable(self) -> bool {
        self == Self::Waiting
    }

    /// True while a match is running.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Starting | Self::Playing | Self::RoundResults)
    }

    /// Whether the host may start a match from here.
    pub fn can_start(self) -> bool {
        matches!(self, Self::Waiting | Self::Finished)
    }
}

impl From<MatchPhase> for RoomState {
    fn from(phase: MatchPhase) -> Self {
        match phase {
            MatchPhase::Idle | MatchPhase::Countdown => Self::Starting,
            MatchPhase::RoundIntro | MatchPhase::Playing => Self::Playing,
            MatchPhase::RoundResults => Self::RoundResults,
            MatchPhase::FinalPodium => Self::Finished,
        }
    }
}

impl fmt::Display for RoomState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Waiting => "waiting",
            Self::Starting => "starting",
            Self::Playing => "playing",
            Self::RoundResults => "round-results",
            Self::Finished => "finished",
        })
    }
}
