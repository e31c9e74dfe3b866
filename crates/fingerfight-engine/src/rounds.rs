//! Catalog of round definitions.

use fingerfight_protocol::{
    DurationPolicy, InputRule, RoundConfig, RoundModifiers, RoundType, ScoringRule, TargetZone,
    UiOverlay,
};

/// Taps per second allowed by every standard-input round.
const STANDARD_TAP_RATE: u32 = 20;

/// Template config for `round_type`. Duration is the policy's fixed value
/// (zero for variable policies); spotlight and final-twist flags are unset.
/// The planner fills those in.
pub fn template(round_type: RoundType) -> RoundConfig {
    let (title, description, icon, modifiers) = match round_type {
        RoundType::Classic => (
            "TAP FRENZY",
            "Every tap counts! Tap as fast as you can!",
            "👆",
            modifiers(ScoringRule::PerTap { points_per_tap: 1 }, standard(), 6, None),
        ),
        RoundType::Golden => (
            "GOLDEN RUSH",
            "Catch the golden icons for bonus points!",
            "⭐",
            modifiers(
                ScoringRule::Golden {
                    base_points: 1,
                    golden_multiplier: 5,
                    golden_interval: 1_500,
                },
                standard(),
                7,
                Some("golden-targets"),
            ),
        ),
        RoundType::Reverse => (
            "HOLD BACK",
            "Fewest taps wins! Control yourself!",
            "🔄",
            modifiers(
                ScoringRule::Reverse {
                    max_score: 100,
                    penalty_per_tap: 5,
                },
                standard(),
                5,
                None,
            ),
        ),
        RoundType::Precision => (
            "BULLSEYE",
            "Only taps near the center count!",
            "🎯",
            modifiers(
                ScoringRule::Precision {
                    center_radius: 60.0,
                    points_inside: 3,
                    points_outside: 0,
                },
                InputRule::Precision {
                    target_zone: TargetZone {
                        x: 0.5,
                        y: 0.5,
                        radius: 0.15,
                    },
                },
                6,
                Some("precision-target"),
            ),
        ),
        RoundType::Cooldown => (
            "KEEP COOL",
            "Too fast and you lose points! Find the rhythm!",
            "❄️",
            modifiers(
                ScoringRule::Cooldown {
                    points_per_tap: 2,
                    cooldown_threshold: 8,
                    cooldown_penalty: 3,
                },
                standard(),
                7,
                Some("cooldown-meter"),
            ),
        ),
        RoundType::Steal => (
            "STEAL IT",
            "Your taps steal points from opponents!",
            "💰",
            modifiers(
                ScoringRule::Steal {
                    points_per_tap: 1,
                    steal_amount: 1,
                },
                InputRule::MultiTouch {
                    max_fingers: 3,
                    max_taps_per_second: STANDARD_TAP_RATE,
                },
                6,
                None,
            ),
        ),
    };

    let duration = match modifiers.duration_policy {
        DurationPolicy::Fixed { seconds } => seconds,
        DurationPolicy::Variable { .. } => 0,
    };

    RoundConfig {
        round_type,
        duration,
        title: title.to_owned(),
        description: description.to_owned(),
        icon: icon.to_owned(),
        is_spotlight: false,
        spotlight_player_id: None,
        is_final_twist: false,
        modifiers,
    }
}

fn standard() -> InputRule {
    InputRule::Standard {
        max_taps_per_second: STANDARD_TAP_RATE,
    }
}

fn modifiers(
    scoring_rule: ScoringRule,
    input_rule: InputRule,
    seconds: u32,
    overlay: Option<&str>,
) -> RoundModifiers {
    RoundModifiers {
        scoring_rule,
        input_rule,
        duration_policy: DurationPolicy::Fixed { seconds },
        ui_overlay: overlay.map(UiOverlay::new),
    }
}
