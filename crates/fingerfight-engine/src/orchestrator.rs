//! Match state machine.
//!
//! A [`MatchOrchestrator`] owns one match from `match-starting` to
//! `match-end`. It does not spawn anything: the owner awaits
//! [`next_signal`](MatchOrchestrator::next_signal) inside its own
//! `tokio::select!` loop and feeds the result back through
//! [`handle_signal`](MatchOrchestrator::handle_signal), so a room actor
//! keeps every mutation of its state on one task.
//!
//! ```text
//! idle ─start─▶ countdown ─▶ round-intro ─▶ playing ─▶ round-results ─┐
//!                                 ▲                                    │
//!                                 └──────────── more rounds ◀──────────┤
//!                                                                      ▼
//!                                                               final-podium
//! ```

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use fingerfight_protocol::{
    MatchPhase, MatchSettings, MatchState, Player, PlayerId, PlayerScore, Position, RoomId,
    RoundConfig, ScoringRule, ServerMessage, TapEvent, TapPayload, ZONE_HEIGHT, ZONE_WIDTH,
    unix_millis,
};
use fingerfight_tick::{
    Countdown, CountdownEvent, RoundTimer, RoundTimerEvent, Scheduler, TimerId,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::anti_cheat::{self, AntiCheatConfig};
use crate::broadcast::BroadcastGateway;
use crate::planner;
use crate::scoring::{self, ScoringContext};

/// Phase durations and intake limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchTimings {
    /// Seconds between `match-starting` and the first round intro.
    pub countdown_secs: u32,
    /// How long a round's title card shows before play starts.
    pub intro: Duration,
    /// Pause between `round-end` and the next intro (or `match-end`).
    pub results: Duration,
    /// Interval between `round-tick` broadcasts.
    pub tick_cadence: Duration,
    /// How long a golden target stays catchable.
    pub golden_lifetime: Duration,
    /// Taps buffered per player per round; the rest are dropped.
    pub max_taps_per_round: usize,
}

impl Default for MatchTimings {
    fn default() -> Self {
        Self {
            countdown_secs: 2,
            intro: Duration::from_millis(2_500),
            results: Duration::from_millis(3_500),
            tick_cadence: fingerfight_tick::DEFAULT_TICK_CADENCE,
            golden_lifetime: Duration::from_millis(800),
            max_taps_per_round: 1_500,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    StartPlaying,
    GoldenTarget,
    NextRound,
}

#[derive(Debug)]
enum Signal {
    Countdown(CountdownEvent),
    Step(Step),
    Timer(RoundTimerEvent),
}

/// A timer firing, returned by [`MatchOrchestrator::next_signal`].
#[derive(Debug)]
pub struct MatchSignal(Signal);

/// Final standings of a completed match.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchOutcome {
    /// Sorted by total, highest first.
    pub final_scores: Vec<PlayerScore>,
    pub winner: Player,
}

pub struct MatchOrchestrator {
    match_id: RoomId,
    /// Participants in join order.
    roster: Vec<Player>,
    settings: MatchSettings,
    timings: MatchTimings,
    rounds: Vec<RoundConfig>,
    current_round: u32,
    phase: MatchPhase,
    /// Kept sorted by total, ties in join order.
    scores: Vec<PlayerScore>,
    taps: HashMap<PlayerId, Vec<TapEvent>>,
    steps: Scheduler<Step>,
    golden: Vec<TimerId>,
    round_timer: RoundTimer,
    countdown: Countdown,
    rng: StdRng,
    stopped: bool,
    outcome: Option<MatchOutcome>,
}

impl MatchOrchestrator {
    pub fn new(
        match_id: RoomId,
        roster: Vec<Player>,
        settings: MatchSettings,
        timings: MatchTimings,
    ) -> Self {
        let round_timer = RoundTimer::new(timings.tick_cadence);
        Self {
            match_id,
            roster,
            settings,
            timings,
            rounds: Vec::new(),
            current_round: 0,
            phase: MatchPhase::Idle,
            scores: Vec::new(),
            taps: HashMap::new(),
            steps: Scheduler::new(),
            golden: Vec::new(),
            round_timer,
            countdown: Countdown::new(),
            rng: StdRng::from_os_rng(),
            stopped: false,
            outcome: None,
        }
    }

    /// Replaces the random source, for reproducible plans and targets.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    // -- accessors ---------------------------------------------------------

    pub fn match_id(&self) -> RoomId {
        self.match_id
    }

    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    /// Zero-based index of the round in progress, or the number of
    /// completed rounds between rounds.
    pub fn current_round(&self) -> u32 {
        self.current_round
    }

    pub fn total_rounds(&self) -> u32 {
        self.rounds.len() as u32
    }

    pub fn rounds(&self) -> &[RoundConfig] {
        &self.rounds
    }

    pub fn current_config(&self) -> Option<&RoundConfig> {
        self.rounds.get(self.current_round as usize)
    }

    pub fn roster(&self) -> &[Player] {
        &self.roster
    }

    pub fn scores(&self) -> &[PlayerScore] {
        &self.scores
    }

    pub fn outcome(&self) -> Option<&MatchOutcome> {
        self.outcome.as_ref()
    }

    /// True after `match-end`, after [`stop`](Self::stop), or once every
    /// participant has left.
    pub fn is_finished(&self) -> bool {
        self.stopped || self.phase == MatchPhase::FinalPodium
    }

    pub fn match_state(&self) -> Option<MatchState> {
        let round_config = self
            .current_config()
            .or_else(|| self.rounds.last())?
            .clone();
        Some(MatchState {
            match_id: self.match_id,
            current_round: self.current_round,
            total_rounds: self.total_rounds(),
            round_config,
            scores: self.scores.clone(),
            phase: self.phase,
            round_start_time: 0,
            round_end_time: 0,
        })
    }

    // -- control -----------------------------------------------------------

    /// Plans the rounds, announces `match-starting` and starts the
    /// countdown. Ignored unless the match is idle.
    pub fn start(&mut self, out: &dyn BroadcastGateway) {
        if self.phase != MatchPhase::Idle || self.stopped {
            return;
        }
        let ids: Vec<PlayerId> = self.roster.iter().map(|p| p.id).collect();
        self.rounds = planner::generate_rounds(&ids, &self.settings, &mut self.rng);
        self.scores = ids.iter().map(|&id| PlayerScore::new(id)).collect();
        self.current_round = 0;

        if ids.is_empty() || self.rounds.is_empty() {
            self.finish(out);
            return;
        }

        self.phase = MatchPhase::Countdown;
        info!(
            match_id = %self.match_id,
            players = ids.len(),
            rounds = self.rounds.len(),
            "match starting"
        );
        if let Some(state) = self.match_state() {
            out.broadcast(&ServerMessage::MatchStarting { match_state: state }, None);
        }
        self.countdown.start(self.timings.countdown_secs);
    }

    /// Cancels every pending timer. No further events are emitted.
    pub fn stop(&mut self) {
        if !self.stopped {
            debug!(match_id = %self.match_id, phase = %self.phase, "match stopped");
        }
        self.stopped = true;
        self.cancel_timers();
    }

    /// Waits for the next timer. Pends forever once the match is over.
    pub async fn next_signal(&mut self) -> MatchSignal {
        tokio::select! {
            event = self.countdown.wait() => MatchSignal(Signal::Countdown(event)),
            (_, step) = self.steps.next() => MatchSignal(Signal::Step(step)),
            event = self.round_timer.wait() => MatchSignal(Signal::Timer(event)),
        }
    }

    /// Advances the state machine for a fired timer.
    pub fn handle_signal(&mut self, signal: MatchSignal, out: &dyn BroadcastGateway) {
        if self.is_finished() {
            return;
        }
        match signal.0 {
            Signal::Countdown(CountdownEvent::Count(n)) => {
                debug!(match_id = %self.match_id, n, "countdown");
            }
            Signal::Countdown(CountdownEvent::Complete) => self.begin_round(out),
            Signal::Step(Step::StartPlaying) => self.start_playing(out),
            Signal::Step(Step::GoldenTarget) => self.golden_target(out),
            Signal::Step(Step::NextRound) => {
                if self.current_round >= self.total_rounds() {
                    self.finish(out);
                } else {
                    self.begin_round(out);
                }
            }
            Signal::Timer(RoundTimerEvent::Tick { remaining_secs }) => {
                if self.phase == MatchPhase::Playing {
                    out.broadcast(
                        &ServerMessage::RoundTick {
                            time_remaining: remaining_secs,
                        },
                        None,
                    );
                }
            }
            Signal::Timer(RoundTimerEvent::Complete) => self.end_round(out),
        }
    }

    /// Buffers a tap batch for scoring at round end. Only accepted while
    /// playing and from a participant.
    pub fn submit_taps(&mut self, player: PlayerId, payload: &TapPayload) -> bool {
        if self.phase != MatchPhase::Playing || self.stopped {
            return false;
        }
        if !self.roster.iter().any(|p| p.id == player) {
            return false;
        }
        let buffer = self.taps.entry(player).or_default();
        let room = self.timings.max_taps_per_round.saturating_sub(buffer.len());
        if payload.taps.len() > room {
            debug!(
                match_id = %self.match_id,
                %player,
                dropped = payload.taps.len() - room,
                "tap buffer full"
            );
        }
        buffer.extend(payload.taps.iter().take(room).copied());
        true
    }

    /// Drops a participant from the roster and scoreboard. Once nobody is
    /// left the match stops without a `match-end`.
    pub fn remove_participant(&mut self, player: PlayerId) -> bool {
        let before = self.roster.len();
        self.roster.retain(|p| p.id != player);
        if self.roster.len() == before {
            return false;
        }
        self.scores.retain(|s| s.player_id != player);
        self.taps.remove(&player);
        if self.roster.is_empty() && self.phase != MatchPhase::Idle {
            info!(match_id = %self.match_id, "all participants left, abandoning match");
            self.stop();
        }
        true
    }

    // -- phases ------------------------------------------------------------

    fn begin_round(&mut self, out: &dyn BroadcastGateway) {
        let Some(config) = self.current_config().cloned() else {
            self.finish(out);
            return;
        };
        self.phase = MatchPhase::RoundIntro;
        self.taps.clear();
        debug!(
            match_id = %self.match_id,
            round = self.current_round,
            round_type = %config.round_type,
            "round intro"
        );
        out.broadcast(
            &ServerMessage::RoundIntro {
                round: self.current_round,
                config,
            },
            None,
        );
        self.steps.schedule_in(self.timings.intro, Step::StartPlaying);
    }

    fn start_playing(&mut self, out: &dyn BroadcastGateway) {
        let Some(config) = self.current_config() else {
            return;
        };
        let duration_ms = u64::from(config.duration) * 1_000;
        let golden_interval = match config.modifiers.scoring_rule {
            ScoringRule::Golden {
                golden_interval, ..
            } => golden_interval,
            _ => 0,
        };

        self.phase = MatchPhase::Playing;
        let start_time = unix_millis();
        out.broadcast(
            &ServerMessage::RoundStart {
                round: self.current_round,
                start_time,
                end_time: start_time + duration_ms,
            },
            None,
        );
        self.round_timer.start(Duration::from_millis(duration_ms));

        if golden_interval > 0 {
            for i in 1..=duration_ms / golden_interval {
                let id = self.steps.schedule_in(
                    Duration::from_millis(golden_interval * i),
                    Step::GoldenTarget,
                );
                self.golden.push(id);
            }
        }
    }

    fn golden_target(&mut self, out: &dyn BroadcastGateway) {
        if self.phase != MatchPhase::Playing {
            return;
        }
        let position = Position {
            x: 0.1 + self.rng.random::<f64>() * 0.8,
            y: 0.1 + self.rng.random::<f64>() * 0.8,
        };
        let expires_at = unix_millis() + self.timings.golden_lifetime.as_millis() as u64;
        out.broadcast(
            &ServerMessage::GoldenTarget {
                position,
                expires_at,
            },
            None,
        );
    }

    fn end_round(&mut self, out: &dyn BroadcastGateway) {
        if self.phase != MatchPhase::Playing {
            return;
        }
        let Some(config) = self.current_config().cloned() else {
            return;
        };
        self.round_timer.cancel();
        for id in self.golden.drain(..) {
            self.steps.cancel(id);
        }
        self.phase = MatchPhase::RoundResults;

        let checks =
            AntiCheatConfig::for_round(&config.modifiers.input_rule, self.settings.allow_multi_touch);
        let ids: Vec<PlayerId> = self.scores.iter().map(|s| s.player_id).collect();
        let mut steals: BTreeMap<PlayerId, i64> = BTreeMap::new();

        // Everyone's round entry first, so steals hit this round's points.
        for entry in &mut self.scores {
            let taps = self.taps.remove(&entry.player_id).unwrap_or_default();
            let checked = anti_cheat::validate(&taps, &checks);
            let opponents: Vec<PlayerId> = ids
                .iter()
                .copied()
                .filter(|&id| id != entry.player_id)
                .collect();
            let result = scoring::score(&ScoringContext {
                rule: &config.modifiers.scoring_rule,
                taps: &checked.valid_taps,
                zone_width: ZONE_WIDTH,
                zone_height: ZONE_HEIGHT,
                round_duration: config.duration,
                current_total: entry.total(),
                opponent_ids: &opponents,
            });
            debug!(
                match_id = %self.match_id,
                player = %entry.player_id,
                points = result.points,
                rejected = checked.rejected_taps.len(),
                details = %result.details,
                "round scored"
            );
            entry.round_scores.push(result.points);
            for (target, amount) in result.stolen_points {
                *steals.entry(target).or_default() += amount;
            }
        }

        for (target, amount) in steals {
            let last = self
                .scores
                .iter_mut()
                .find(|s| s.player_id == target)
                .and_then(|s| s.round_scores.last_mut());
            if let Some(last) = last {
                *last = (*last - amount).max(0);
            }
        }

        self.sort_scores();
        out.broadcast(
            &ServerMessage::RoundEnd {
                round: self.current_round,
                scores: self.scores.clone(),
            },
            None,
        );
        self.current_round += 1;
        self.steps.schedule_in(self.timings.results, Step::NextRound);
    }

    fn finish(&mut self, out: &dyn BroadcastGateway) {
        self.cancel_timers();
        self.phase = MatchPhase::FinalPodium;
        self.sort_scores();

        let winner = self
            .scores
            .first()
            .and_then(|top| self.roster.iter().find(|p| p.id == top.player_id))
            .cloned();
        let Some(winner) = winner else {
            info!(match_id = %self.match_id, "match ended without players");
            return;
        };

        info!(
            match_id = %self.match_id,
            winner = %winner.id,
            score = self.scores.first().map(PlayerScore::total).unwrap_or_default(),
            "match finished"
        );
        let outcome = MatchOutcome {
            final_scores: self.scores.clone(),
            winner,
        };
        out.broadcast(
            &ServerMessage::MatchEnd {
                final_scores: outcome.final_scores.clone(),
                winner: outcome.winner.clone(),
            },
            None,
        );
        self.outcome = Some(outcome);
    }

    fn sort_scores(&mut self) {
        let order: HashMap<PlayerId, usize> = self
            .roster
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id, i))
            .collect();
        self.scores.sort_by_key(|s| {
            (
                Reverse(s.total()),
                order.get(&s.player_id).copied().unwrap_or(usize::MAX),
            )
        });
    }

    fn cancel_timers(&mut self) {
        self.countdown.cancel();
        self.round_timer.cancel();
        self.steps.cancel_all();
        self.golden.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FnGateway;
    use fingerfight_protocol::PlayerColor;

    fn player(id: u64) -> Player {
        Player {
            id: PlayerId(id),
            nickname: format!("p{id}"),
            color: PlayerColor::Red,
            is_host: id == 1,
            is_cpu: false,
            connected: true,
        }
    }

    #[test]
    fn test_new_orchestrator_is_idle() {
        let orch = MatchOrchestrator::new(
            RoomId(1),
            vec![player(1)],
            MatchSettings::default(),
            MatchTimings::default(),
        );
        assert_eq!(orch.phase(), MatchPhase::Idle);
        assert!(!orch.is_finished());
        assert!(orch.match_state().is_none());
    }

    #[test]
    fn test_start_with_empty_roster_finishes_silently() {
        let sent = std::cell::Cell::new(0);
        let out = FnGateway(|_: &ServerMessage, _: Option<PlayerId>| sent.set(sent.get() + 1));
        let mut orch = MatchOrchestrator::new(
            RoomId(1),
            Vec::new(),
            MatchSettings::default(),
            MatchTimings::default(),
        );
        orch.start(&out);
        assert!(orch.is_finished());
        assert!(orch.outcome().is_none());
        assert_eq!(sent.get(), 0);
    }

    #[test]
    fn test_sort_scores_breaks_ties_by_join_order() {
        let mut orch = MatchOrchestrator::new(
            RoomId(1),
            vec![player(1), player(2), player(3)],
            MatchSettings::default(),
            MatchTimings::default(),
        );
        orch.scores = vec![
            PlayerScore {
                player_id: PlayerId(3),
                round_scores: vec![4],
            },
            PlayerScore {
                player_id: PlayerId(2),
                round_scores: vec![9],
            },
            PlayerScore {
                player_id: PlayerId(1),
                round_scores: vec![4],
            },
        ];
        orch.sort_scores();
        let order: Vec<u64> = orch.scores.iter().map(|s| s.player_id.0).collect();
        assert_eq!(order, vec![2, 1, 3]);
    }
}
