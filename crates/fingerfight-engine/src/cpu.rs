//! Computer opponents.
//!
//! A CPU player does not react to events. At the start of each playing
//! phase it produces the whole round's taps up front, shaped to look like a
//! human: a reaction delay, jittered rate, fatigue after three seconds,
//! occasional bursts and missed aim.

use fingerfight_protocol::{RoundConfig, RoundType, TapEvent, ZONE_HEIGHT, ZONE_WIDTH};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Seconds of play before fatigue starts slowing a CPU down.
const FATIGUE_ONSET_SECS: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CpuDifficulty {
    Easy,
    #[default]
    Normal,
    Aggressive,
}

/// Tapping behaviour for one difficulty.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CpuProfile {
    /// Taps per second before variance and fatigue.
    pub base_tap_rate: f64,
    /// Relative rate jitter, ±.
    pub variance: f64,
    /// Fraction of the rate lost over a round once fatigue sets in.
    pub fatigue_rate: f64,
    /// Milliseconds before the first tap.
    pub reaction_delay: f64,
    pub burst_chance: f64,
    pub burst_multiplier: f64,
    pub miss_chance: f64,
}

impl CpuDifficulty {
    pub fn profile(self) -> CpuProfile {
        match self {
            Self::Easy => CpuProfile {
                base_tap_rate: 5.0,
                variance: 0.3,
                fatigue_rate: 0.8,
                reaction_delay: 600.0,
                burst_chance: 0.05,
                burst_multiplier: 1.3,
                miss_chance: 0.15,
            },
            Self::Normal => CpuProfile {
                base_tap_rate: 8.0,
                variance: 0.2,
                fatigue_rate: 0.5,
                reaction_delay: 350.0,
                burst_chance: 0.1,
                burst_multiplier: 1.5,
                miss_chance: 0.08,
            },
            Self::Aggressive => CpuProfile {
                base_tap_rate: 12.0,
                variance: 0.15,
                fatigue_rate: 0.3,
                reaction_delay: 200.0,
                burst_chance: 0.15,
                burst_multiplier: 1.8,
                miss_chance: 0.03,
            },
        }
    }

    /// How many times this CPU slips during a reverse round.
    pub fn accidental_taps(self) -> usize {
        match self {
            Self::Easy => 8,
            Self::Normal => 4,
            Self::Aggressive => 1,
        }
    }
}

/// Taps for a full round of `config`, in the logical 400x600 zone.
pub fn taps_for_round<R: Rng + ?Sized>(
    difficulty: CpuDifficulty,
    config: &RoundConfig,
    rng: &mut R,
) -> Vec<TapEvent> {
    if config.round_type == RoundType::Reverse {
        reverse_round_taps(difficulty, config.duration, ZONE_WIDTH, ZONE_HEIGHT, rng)
    } else {
        generate_taps(difficulty, config.duration, ZONE_WIDTH, ZONE_HEIGHT, rng)
    }
}

/// Human-like tapping aimed at the middle of the zone.
pub fn generate_taps<R: Rng + ?Sized>(
    difficulty: CpuDifficulty,
    round_secs: u32,
    zone_width: f64,
    zone_height: f64,
    rng: &mut R,
) -> Vec<TapEvent> {
    let profile = difficulty.profile();
    let round_secs_f = f64::from(round_secs.max(1));
    let end_ms = f64::from(round_secs) * 1_000.0;
    let mut now_ms = profile.reaction_delay;
    let mut taps = Vec::new();

    while now_ms < end_ms {
        let elapsed = now_ms / 1_000.0;
        let fatigue = if elapsed > FATIGUE_ONSET_SECS {
            1.0 - profile.fatigue_rate * ((elapsed - FATIGUE_ONSET_SECS) / round_secs_f)
        } else {
            1.0
        };
        let jitter = 1.0 + rng.random_range(-1.0..1.0) * profile.variance;
        let mut rate = profile.base_tap_rate * fatigue * jitter;
        if rng.random_bool(profile.burst_chance) {
            rate *= profile.burst_multiplier;
        }
        let interval = 1_000.0 / rate.max(1.0);
        now_ms += interval + rng.random::<f64>() * interval * 0.3;
        if now_ms >= end_ms {
            break;
        }

        let mut x = zone_width / 2.0 + (rng.random::<f64>() - 0.5) * zone_width * 0.4;
        let mut y = zone_height / 2.0 + (rng.random::<f64>() - 0.5) * zone_height * 0.4;
        if rng.random_bool(profile.miss_chance) {
            x += (rng.random::<f64>() - 0.5) * zone_width * 0.6;
            y += (rng.random::<f64>() - 0.5) * zone_height * 0.6;
        }

        taps.push(TapEvent {
            timestamp: now_ms.round(),
            x: x.clamp(0.0, zone_width).round(),
            y: y.clamp(0.0, zone_height).round(),
            finger_id: 0,
        });
    }

    taps
}

/// A handful of slips at random moments, for rounds where tapping hurts.
pub fn reverse_round_taps<R: Rng + ?Sized>(
    difficulty: CpuDifficulty,
    round_secs: u32,
    zone_width: f64,
    zone_height: f64,
    rng: &mut R,
) -> Vec<TapEvent> {
    let end_ms = f64::from(round_secs) * 1_000.0;
    let mut taps: Vec<TapEvent> = (0..difficulty.accidental_taps())
        .map(|_| TapEvent {
            timestamp: (rng.random::<f64>() * end_ms).round(),
            x: (rng.random::<f64>() * zone_width).round(),
            y: (rng.random::<f64>() * zone_height).round(),
            finger_id: 0,
        })
        .collect();
    taps.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
    taps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rounds;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_generate_taps_respects_round_bounds() {
        let mut rng = StdRng::seed_from_u64(9);
        for difficulty in [CpuDifficulty::Easy, CpuDifficulty::Normal, CpuDifficulty::Aggressive] {
            let taps = generate_taps(difficulty, 6, ZONE_WIDTH, ZONE_HEIGHT, &mut rng);
            assert!(!taps.is_empty());
            let profile = difficulty.profile();
            for pair in taps.windows(2) {
                assert!(pair[0].timestamp <= pair[1].timestamp);
            }
            for t in &taps {
                assert!(t.timestamp >= profile.reaction_delay);
                assert!(t.timestamp <= 6_000.0);
                assert!((0.0..=ZONE_WIDTH).contains(&t.x));
                assert!((0.0..=ZONE_HEIGHT).contains(&t.y));
            }
        }
    }

    #[test]
    fn test_aggressive_taps_more_than_easy() {
        let mut rng = StdRng::seed_from_u64(10);
        let mut easy = 0;
        let mut aggressive = 0;
        for _ in 0..20 {
            easy += generate_taps(CpuDifficulty::Easy, 6, ZONE_WIDTH, ZONE_HEIGHT, &mut rng).len();
            aggressive +=
                generate_taps(CpuDifficulty::Aggressive, 6, ZONE_WIDTH, ZONE_HEIGHT, &mut rng)
                    .len();
        }
        assert!(aggressive > easy);
    }

    #[test]
    fn test_reverse_round_taps_count_and_order() {
        let mut rng = StdRng::seed_from_u64(11);
        let config = rounds::template(RoundType::Reverse);
        let taps = taps_for_round(CpuDifficulty::Easy, &config, &mut rng);
        assert_eq!(taps.len(), 8);
        for pair in taps.windows(2) {
            assert!(pair[0].timestamp <= pair[1].timestamp);
        }
    }

    #[test]
    fn test_difficulty_deserializes_lowercase() {
        let d: CpuDifficulty = serde_json::from_str("\"aggressive\"").unwrap();
        assert_eq!(d, CpuDifficulty::Aggressive);
    }
}
