//! Tap plausibility checks.
//!
//! Clients are untrusted. Before scoring, each player's taps for the round
//! are filtered against per-finger spacing, burst density and finger count.
//! Rejections are silent: they only reduce the score.

use std::collections::{BTreeSet, HashMap};

use fingerfight_protocol::{InputRule, TapEvent};

/// Thresholds the validator enforces.
#[derive(Debug, Clone, PartialEq)]
pub struct AntiCheatConfig {
    /// Advisory only: exceeding 1.5x this rate adds a reason but rejects
    /// nothing on its own.
    pub max_taps_per_second: u32,
    /// Finger indices at or above this are rejected.
    pub max_fingers: u32,
    /// Minimum spacing between two taps of the same finger, in ms.
    pub min_tap_interval_ms: f64,
    /// Maximum taps allowed inside any burst window.
    pub max_burst_size: usize,
    pub burst_window_ms: f64,
}

impl Default for AntiCheatConfig {
    fn default() -> Self {
        Self {
            max_taps_per_second: 20,
            max_fingers: 4,
            min_tap_interval_ms: 30.0,
            max_burst_size: 5,
            burst_window_ms: 100.0,
        }
    }
}

impl AntiCheatConfig {
    /// Config for a round with the given input rule. Disallowing
    /// multi-touch pins every round to a single finger.
    pub fn for_round(input_rule: &InputRule, allow_multi_touch: bool) -> Self {
        let mut config = Self::default();
        match *input_rule {
            InputRule::Standard {
                max_taps_per_second,
            } => config.max_taps_per_second = max_taps_per_second,
            InputRule::MultiTouch {
                max_fingers,
                max_taps_per_second,
            } => {
                config.max_fingers = max_fingers.max(1);
                config.max_taps_per_second = max_taps_per_second;
            }
            InputRule::Precision { .. } => {}
        }
        if !allow_multi_touch {
            config.max_fingers = 1;
        }
        config
    }
}

/// Partition of a tap batch. Both lists are in timestamp order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationResult {
    pub valid_taps: Vec<TapEvent>,
    pub rejected_taps: Vec<TapEvent>,
    pub reasons: Vec<String>,
}

/// Splits `taps` into valid and rejected.
///
/// A tap is rejected when its finger index is out of range, when the
/// previous tap in its finger bucket is closer than `min_tap_interval_ms`,
/// or when more than `max_burst_size` taps fall in
/// `[t - burst_window_ms, t]`. Out-of-range fingers share the last bucket.
pub fn validate(taps: &[TapEvent], config: &AntiCheatConfig) -> ValidationResult {
    let mut result = ValidationResult::default();
    if taps.is_empty() {
        return result;
    }

    let mut sorted = taps.to_vec();
    sorted.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));

    let (first, last) = (sorted[0].timestamp, sorted[sorted.len() - 1].timestamp);
    let span_secs = (last - first) / 1000.0;
    if span_secs > 0.0 {
        let rate = sorted.len() as f64 / span_secs;
        if rate > f64::from(config.max_taps_per_second) * 1.5 {
            result
                .reasons
                .push(format!("excessive tap rate: {rate:.1}/s"));
        }
    }

    let distinct: BTreeSet<u32> = sorted.iter().map(|t| t.finger_id).collect();
    if distinct.len() > config.max_fingers as usize {
        result
            .reasons
            .push(format!("too many fingers: {}", distinct.len()));
    }

    let last_bucket = config.max_fingers.saturating_sub(1);
    let mut previous_in_bucket: HashMap<u32, f64> = HashMap::new();

    for tap in &sorted {
        let mut ok = true;

        if tap.finger_id >= config.max_fingers {
            ok = false;
            result
                .reasons
                .push(format!("invalid finger id: {}", tap.finger_id));
        }

        let bucket = tap.finger_id.min(last_bucket);
        if let Some(prev) = previous_in_bucket.insert(bucket, tap.timestamp) {
            if tap.timestamp - prev < config.min_tap_interval_ms {
                ok = false;
            }
        }

        let window_start = tap.timestamp - config.burst_window_ms;
        let lo = sorted.partition_point(|t| t.timestamp < window_start);
        let hi = sorted.partition_point(|t| t.timestamp <= tap.timestamp);
        if hi - lo > config.max_burst_size {
            ok = false;
        }

        if ok {
            result.valid_taps.push(*tap);
        } else {
            result.rejected_taps.push(*tap);
        }
    }

    result
}
