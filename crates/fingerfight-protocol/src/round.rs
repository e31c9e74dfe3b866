//! Round, settings and match-state types.
//!
//! Rule enums are internally tagged (`{"type": "per-tap", ...}`) with
//! kebab-case tags and camelCase fields, matching what clients render.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{PlayerId, PlayerScore, RoomId};

// ---------------------------------------------------------------------------
// RoundType
// ---------------------------------------------------------------------------

/// The six round flavours a match can draw from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoundType {
    Classic,
    Golden,
    Reverse,
    Precision,
    Cooldown,
    Steal,
}

impl RoundType {
    pub const ALL: [RoundType; 6] = [
        RoundType::Classic,
        RoundType::Golden,
        RoundType::Reverse,
        RoundType::Precision,
        RoundType::Cooldown,
        RoundType::Steal,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Classic => "classic",
            Self::Golden => "golden",
            Self::Reverse => "reverse",
            Self::Precision => "precision",
            Self::Cooldown => "cooldown",
            Self::Steal => "steal",
        }
    }
}

impl fmt::Display for RoundType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Modifiers
// ---------------------------------------------------------------------------

/// How taps turn into points for one round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ScoringRule {
    PerTap {
        points_per_tap: i64,
    },
    Golden {
        base_points: i64,
        golden_multiplier: i64,
        /// Milliseconds between golden target announcements.
        golden_interval: u64,
    },
    Reverse {
        max_score: i64,
        penalty_per_tap: i64,
    },
    Precision {
        center_radius: f64,
        points_inside: i64,
        points_outside: i64,
    },
    Cooldown {
        points_per_tap: i64,
        cooldown_threshold: usize,
        cooldown_penalty: i64,
    },
    Steal {
        points_per_tap: i64,
        steal_amount: i64,
    },
    /// Any tag this server does not know. Scores nothing.
    #[serde(other)]
    Unknown,
}

/// Normalized circular target, used by precision input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetZone {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

/// Input constraints the client enforces and the validator re-checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum InputRule {
    Standard {
        max_taps_per_second: u32,
    },
    MultiTouch {
        max_fingers: u32,
        max_taps_per_second: u32,
    },
    Precision {
        target_zone: TargetZone,
    },
}

/// How long a round lasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum DurationPolicy {
    Fixed { seconds: u32 },
    Variable { min_seconds: u32, max_seconds: u32 },
}

/// Hint for the client to draw an extra layer over the tap zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiOverlay {
    #[serde(rename = "type")]
    pub kind: String,
}

impl UiOverlay {
    pub fn new(kind: impl Into<String>) -> Self {
        Self { kind: kind.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundModifiers {
    pub scoring_rule: ScoringRule,
    pub input_rule: InputRule,
    pub duration_policy: DurationPolicy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ui_overlay: Option<UiOverlay>,
}

/// Everything a client needs to present and play one round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundConfig {
    #[serde(rename = "type")]
    pub round_type: RoundType,
    /// Whole seconds.
    pub duration: u32,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub is_spotlight: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spotlight_player_id: Option<PlayerId>,
    pub is_final_twist: bool,
    pub modifiers: RoundModifiers,
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Host-tunable match parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSettings {
    pub total_rounds: u32,
    /// Seconds; fallback when a round's policy cannot be resolved.
    pub default_round_duration: u32,
    pub round_types: Vec<RoundType>,
    pub allow_multi_touch: bool,
    pub max_players: usize,
}

impl MatchSettings {
    pub const MAX_ROUNDS: u32 = 20;
    pub const MAX_ROUND_DURATION: u32 = 60;
    pub const MAX_PLAYERS: usize = 4;

    /// Returns a copy with every `Some` field of `patch` applied.
    pub fn merged(&self, patch: &MatchSettingsPatch) -> Self {
        Self {
            total_rounds: patch.total_rounds.unwrap_or(self.total_rounds),
            default_round_duration: patch
                .default_round_duration
                .unwrap_or(self.default_round_duration),
            round_types: patch
                .round_types
                .clone()
                .unwrap_or_else(|| self.round_types.clone()),
            allow_multi_touch: patch.allow_multi_touch.unwrap_or(self.allow_multi_touch),
            max_players: patch.max_players.unwrap_or(self.max_players),
        }
    }

    /// Checks the ranges a room accepts. `current_players` guards against
    /// shrinking `max_players` below the existing membership.
    pub fn validate(&self, current_players: usize) -> Result<(), String> {
        if !(1..=Self::MAX_ROUNDS).contains(&self.total_rounds) {
            return Err(format!(
                "totalRounds must be between 1 and {}",
                Self::MAX_ROUNDS
            ));
        }
        if !(1..=Self::MAX_ROUND_DURATION).contains(&self.default_round_duration) {
            return Err(format!(
                "defaultRoundDuration must be between 1 and {}",
                Self::MAX_ROUND_DURATION
            ));
        }
        if self.round_types.is_empty() {
            return Err("roundTypes must not be empty".into());
        }
        for (i, t) in self.round_types.iter().enumerate() {
            if self.round_types[..i].contains(t) {
                return Err(format!("roundTypes lists {t} twice"));
            }
        }
        if !(1..=Self::MAX_PLAYERS).contains(&self.max_players) {
            return Err(format!(
                "maxPlayers must be between 1 and {}",
                Self::MAX_PLAYERS
            ));
        }
        if self.max_players < current_players {
            return Err(format!(
                "maxPlayers cannot drop below the {current_players} players already in the room"
            ));
        }
        Ok(())
    }
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            total_rounds: 7,
            default_round_duration: 6,
            round_types: RoundType::ALL.to_vec(),
            allow_multi_touch: true,
            max_players: Self::MAX_PLAYERS,
        }
    }
}

/// Partial settings update sent by the host. Absent fields stay unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_rounds: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_round_duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round_types: Option<Vec<RoundType>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_multi_touch: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_players: Option<usize>,
}

// ---------------------------------------------------------------------------
// Match state
// ---------------------------------------------------------------------------

/// Phase of the match state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchPhase {
    Idle,
    Countdown,
    RoundIntro,
    Playing,
    RoundResults,
    FinalPodium,
}

impl fmt::Display for MatchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Countdown => "countdown",
            Self::RoundIntro => "round-intro",
            Self::Playing => "playing",
            Self::RoundResults => "round-results",
            Self::FinalPodium => "final-podium",
        };
        f.write_str(s)
    }
}

/// Snapshot announced with `match-starting`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchState {
    pub match_id: RoomId,
    pub current_round: u32,
    pub total_rounds: u32,
    pub round_config: RoundConfig,
    pub scores: Vec<PlayerScore>,
    pub phase: MatchPhase,
    pub round_start_time: u64,
    pub round_end_time: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> RoundConfig {
        RoundConfig {
            round_type: RoundType::Precision,
            duration: 6,
            title: "BULLSEYE".into(),
            description: "Only taps near the center count!".into(),
            icon: "🎯".into(),
            is_spotlight: true,
            spotlight_player_id: Some(PlayerId(4)),
            is_final_twist: false,
            modifiers: RoundModifiers {
                scoring_rule: ScoringRule::Precision {
                    center_radius: 60.0,
                    points_inside: 3,
                    points_outside: 0,
                },
                input_rule: InputRule::Precision {
                    target_zone: TargetZone {
                        x: 0.5,
                        y: 0.5,
                        radius: 0.15,
                    },
                },
                duration_policy: DurationPolicy::Fixed { seconds: 6 },
                ui_overlay: Some(UiOverlay::new("precision-target")),
            },
        }
    }

    // =====================================================================
    // Tagged rule enums
    // =====================================================================

    #[test]
    fn test_scoring_rule_json_shape() {
        let rule = ScoringRule::PerTap { points_per_tap: 1 };
        let json = serde_json::to_value(&rule).unwrap();
        assert_eq!(json, serde_json::json!({"type": "per-tap", "pointsPerTap": 1}));

        let rule = ScoringRule::Cooldown {
            points_per_tap: 2,
            cooldown_threshold: 8,
            cooldown_penalty: 3,
        };
        let json = serde_json::to_value(&rule).unwrap();
        assert_eq!(json["type"], "cooldown");
        assert_eq!(json["cooldownThreshold"], 8);
    }

    #[test]
    fn test_scoring_rule_unknown_tag_decodes_to_unknown() {
        let rule: ScoringRule =
            serde_json::from_str(r#"{"type":"double-or-nothing"}"#).unwrap();
        assert_eq!(rule, ScoringRule::Unknown);
    }

    #[test]
    fn test_input_rule_multi_touch_tag() {
        let rule = InputRule::MultiTouch {
            max_fingers: 3,
            max_taps_per_second: 20,
        };
        let json = serde_json::to_value(&rule).unwrap();
        assert_eq!(json["type"], "multi-touch");
        assert_eq!(json["maxFingers"], 3);
    }

    // =====================================================================
    // RoundConfig
    // =====================================================================

    #[test]
    fn test_round_config_json_roundtrip_is_stable() {
        let config = sample_config();
        let first = serde_json::to_string(&config).unwrap();
        let decoded: RoundConfig = serde_json::from_str(&first).unwrap();
        let second = serde_json::to_string(&decoded).unwrap();
        assert_eq!(decoded, config);
        assert_eq!(first, second);
    }

    #[test]
    fn test_round_config_omits_absent_spotlight_player() {
        let mut config = sample_config();
        config.spotlight_player_id = None;
        config.is_spotlight = false;
        let json = serde_json::to_value(&config).unwrap();
        assert!(json.get("spotlightPlayerId").is_none());
        assert_eq!(json["type"], "precision");
        assert_eq!(json["modifiers"]["uiOverlay"]["type"], "precision-target");
    }

    // =====================================================================
    // Settings
    // =====================================================================

    #[test]
    fn test_match_settings_default_values() {
        let s = MatchSettings::default();
        assert_eq!(s.total_rounds, 7);
        assert_eq!(s.default_round_duration, 6);
        assert_eq!(s.round_types.len(), 6);
        assert!(s.allow_multi_touch);
        assert_eq!(s.max_players, 4);
        assert!(s.validate(4).is_ok());
    }

    #[test]
    fn test_match_settings_merged_applies_only_present_fields() {
        let patch: MatchSettingsPatch =
            serde_json::from_str(r#"{"totalRounds":3,"allowMultiTouch":false}"#).unwrap();
        let merged = MatchSettings::default().merged(&patch);
        assert_eq!(merged.total_rounds, 3);
        assert!(!merged.allow_multi_touch);
        assert_eq!(merged.max_players, 4);
    }

    #[test]
    fn test_match_settings_validate_rejects_bad_ranges() {
        let base = MatchSettings::default();
        let cases = [
            MatchSettingsPatch {
                total_rounds: Some(0),
                ..Default::default()
            },
            MatchSettingsPatch {
                default_round_duration: Some(61),
                ..Default::default()
            },
            MatchSettingsPatch {
                round_types: Some(vec![]),
                ..Default::default()
            },
            MatchSettingsPatch {
                round_types: Some(vec![RoundType::Steal, RoundType::Steal]),
                ..Default::default()
            },
            MatchSettingsPatch {
                max_players: Some(5),
                ..Default::default()
            },
        ];
        for patch in &cases {
            assert!(base.merged(patch).validate(1).is_err(), "{patch:?}");
        }
    }

    #[test]
    fn test_match_settings_validate_max_players_below_members() {
        let s = MatchSettings {
            max_players: 2,
            ..Default::default()
        };
        assert!(s.validate(3).is_err());
        assert!(s.validate(2).is_ok());
    }

    #[test]
    fn test_match_phase_serializes_kebab_case() {
        let json = serde_json::to_string(&MatchPhase::FinalPodium).unwrap();
        assert_eq!(json, "\"final-podium\"");
        assert_eq!(MatchPhase::RoundIntro.to_string(), "round-intro");
    }
}
