//! Per-round scoring rules.
//!
//! Pure functions: the same context always yields the same result.

use std::collections::BTreeMap;

use fingerfight_protocol::{PlayerId, ScoringRule, TapEvent};

/// Sliding window the cooldown rule counts "recent" taps in, in ms.
const COOLDOWN_WINDOW_MS: f64 = 1_000.0;

/// Inputs for scoring one player's round.
#[derive(Debug, Clone, Copy)]
pub struct ScoringContext<'a> {
    pub rule: &'a ScoringRule,
    /// Taps that already passed [`validate`](crate::validate).
    pub taps: &'a [TapEvent],
    pub zone_width: f64,
    pub zone_height: f64,
    /// Seconds.
    pub round_duration: u32,
    /// Cumulative score before this round.
    pub current_total: i64,
    pub opponent_ids: &'a [PlayerId],
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoringResult {
    pub points: i64,
    pub valid_count: usize,
    pub invalid_count: usize,
    pub bonus_count: usize,
    /// Points to deduct from each opponent's round entry.
    pub stolen_points: BTreeMap<PlayerId, i64>,
    pub details: String,
}

impl ScoringResult {
    fn empty(details: &str) -> Self {
        Self {
            details: details.to_owned(),
            ..Self::default()
        }
    }
}

/// Scores one player's round under `ctx.rule`.
pub fn score(ctx: &ScoringContext<'_>) -> ScoringResult {
    let taps = ctx.taps.len();
    match *ctx.rule {
        ScoringRule::PerTap { points_per_tap } => ScoringResult {
            points: taps as i64 * points_per_tap,
            valid_count: taps,
            details: format!("{taps} taps × {points_per_tap} pts"),
            ..ScoringResult::default()
        },
        ScoringRule::Golden {
            base_points,
            golden_multiplier,
            ..
        } => {
            // Clients report a golden-target hit with a negative y.
            let golden = ctx.taps.iter().filter(|t| t.y < 0.0).count();
            let normal = taps - golden;
            ScoringResult {
                points: normal as i64 * base_points
                    + golden as i64 * base_points * golden_multiplier,
                valid_count: normal,
                bonus_count: golden,
                details: format!("{normal} normal + {golden} golden"),
                ..ScoringResult::default()
            }
        }
        ScoringRule::Reverse {
            max_score,
            penalty_per_tap,
        } => ScoringResult {
            points: (max_score - taps as i64 * penalty_per_tap).max(0),
            invalid_count: taps,
            details: format!("{max_score} - {taps} × {penalty_per_tap} penalty"),
            ..ScoringResult::default()
        },
        ScoringRule::Precision {
            center_radius,
            points_inside,
            points_outside,
        } => {
            let (cx, cy) = (ctx.zone_width / 2.0, ctx.zone_height / 2.0);
            let inside = ctx
                .taps
                .iter()
                .filter(|t| (t.x - cx).hypot(t.y - cy) <= center_radius)
                .count();
            let outside = taps - inside;
            ScoringResult {
                points: inside as i64 * points_inside + outside as i64 * points_outside,
                valid_count: inside,
                invalid_count: outside,
                details: format!("{inside} bullseye, {outside} missed"),
                ..ScoringResult::default()
            }
        }
        ScoringRule::Cooldown {
            points_per_tap,
            cooldown_threshold,
            cooldown_penalty,
        } => score_cooldown(ctx.taps, points_per_tap, cooldown_threshold, cooldown_penalty),
        ScoringRule::Steal {
            points_per_tap,
            steal_amount,
        } => {
            let total_steal = taps as i64 * steal_amount;
            let mut stolen_points = BTreeMap::new();
            if !ctx.opponent_ids.is_empty() {
                let each = total_steal.div_euclid(ctx.opponent_ids.len() as i64);
                for &id in ctx.opponent_ids {
                    stolen_points.insert(id, each);
                }
            }
            ScoringResult {
                points: taps as i64 * points_per_tap,
                valid_count: taps,
                stolen_points,
                details: format!("{taps} taps, stole {total_steal} pts"),
                ..ScoringResult::default()
            }
        }
        ScoringRule::Unknown => ScoringResult::empty("Unknown scoring rule"),
    }
}

fn score_cooldown(
    taps: &[TapEvent],
    points_per_tap: i64,
    threshold: usize,
    penalty: i64,
) -> ScoringResult {
    if taps.is_empty() {
        return ScoringResult::empty("No taps");
    }

    let mut sorted = taps.to_vec();
    sorted.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));

    let mut points = 0i64;
    let mut overheated = 0usize;
    for (i, tap) in sorted.iter().enumerate() {
        let window_start = tap.timestamp - COOLDOWN_WINDOW_MS;
        let recent = sorted[..i]
            .iter()
            .filter(|t| t.timestamp >= window_start)
            .count();
        if recent >= threshold {
            points -= penalty;
            overheated += 1;
        } else {
            points += points_per_tap;
        }
    }

    let cool = sorted.len() - overheated;
    ScoringResult {
        points: points.max(0),
        valid_count: cool,
        invalid_count: overheated,
        details: format!("{cool} valid, {overheated} overheated"),
        ..ScoringResult::default()
    }
}
