//! Round sequence planning.

use fingerfight_protocol::{DurationPolicy, MatchSettings, PlayerId, RoundConfig, RoundType};
use rand::Rng;
use rand::seq::IndexedRandom;

use crate::rounds;

/// Types the final round is drawn from, when the pool allows them.
const FINALE_TYPES: [RoundType; 2] = [RoundType::Steal, RoundType::Golden];

/// Builds `settings.total_rounds` round configs.
///
/// Round 0 is always classic. The last round is a steal or golden round
/// when the pool has one, else classic, and is flagged as the final twist.
/// In between, a round never repeats its predecessor's type unless the pool
/// leaves no alternative. Every third round (index 2, 5, ...) except the
/// last spotlights one player when at least two are playing.
pub fn generate_rounds<R: Rng + ?Sized>(
    player_ids: &[PlayerId],
    settings: &MatchSettings,
    rng: &mut R,
) -> Vec<RoundConfig> {
    let total = settings.total_rounds as usize;
    if total == 0 {
        return Vec::new();
    }
    let pool = &settings.round_types;

    let finale_pool: Vec<RoundType> = FINALE_TYPES
        .into_iter()
        .filter(|t| pool.contains(t))
        .collect();
    let finale = finale_pool.choose(rng).copied().unwrap_or(RoundType::Classic);

    let mut types = Vec::with_capacity(total);
    for i in 0..total {
        let round_type = if i == 0 {
            RoundType::Classic
        } else if i == total - 1 {
            finale
        } else {
            let prev = types[i - 1];
            // Departs from a plain greedy draw so the finale never repeats
            // its predecessor either.
            let avoid_finale = i == total - 2;
            pick_middle(pool, prev, avoid_finale.then_some(finale), rng)
        };
        types.push(round_type);
    }

    types
        .into_iter()
        .enumerate()
        .map(|(i, round_type)| {
            let is_last = i == total - 1;
            let is_spotlight = !is_last && i % 3 == 2 && player_ids.len() >= 2;
            let mut config = rounds::template(round_type);
            config.duration = resolve_duration(
                config.modifiers.duration_policy,
                settings.default_round_duration,
                rng,
            );
            config.is_spotlight = is_spotlight;
            config.spotlight_player_id = is_spotlight.then(|| player_ids[i % player_ids.len()]);
            config.is_final_twist = is_last;
            config
        })
        .collect()
}

fn pick_middle<R: Rng + ?Sized>(
    pool: &[RoundType],
    prev: RoundType,
    finale: Option<RoundType>,
    rng: &mut R,
) -> RoundType {
    let without_prev: Vec<RoundType> = pool.iter().copied().filter(|&t| t != prev).collect();
    let preferred: Vec<RoundType> = without_prev
        .iter()
        .copied()
        .filter(|&t| Some(t) != finale)
        .collect();

    [preferred.as_slice(), without_prev.as_slice(), pool]
        .into_iter()
        .find(|candidates| !candidates.is_empty())
        .and_then(|candidates| candidates.choose(rng).copied())
        .unwrap_or(RoundType::Classic)
}

/// Seconds a round lasts under `policy`. Variable ranges resolve to a
/// uniform whole second in `[min, max]`; a zero or inverted policy falls
/// back to `default_secs`.
fn resolve_duration<R: Rng + ?Sized>(policy: DurationPolicy, default_secs: u32, rng: &mut R) -> u32 {
    match policy {
        DurationPolicy::Fixed { seconds } if seconds > 0 => seconds,
        DurationPolicy::Variable {
            min_seconds,
            max_seconds,
        } if min_seconds > 0 && min_seconds <= max_seconds => {
            rng.random_range(min_seconds..=max_seconds)
        }
        _ => default_secs,
    }
}
