//! Full matches driven through the orchestrator on a paused clock.

use std::sync::Mutex;
use std::time::Duration;

use fingerfight_engine::{BroadcastGateway, MatchOrchestrator, MatchTimings};
use fingerfight_protocol::{
    MatchPhase, MatchSettings, Player, PlayerColor, PlayerId, RoomId, RoundType, ServerMessage,
    TapEvent, TapPayload,
};

#[derive(Default)]
struct Recorder {
    sent: Mutex<Vec<ServerMessage>>,
}

impl BroadcastGateway for Recorder {
    fn broadcast(&self, msg: &ServerMessage, _exclude: Option<PlayerId>) {
        self.sent.lock().unwrap().push(msg.clone());
    }
}

impl Recorder {
    fn kinds(&self) -> Vec<&'static str> {
        self.sent.lock().unwrap().iter().map(|m| m.kind()).collect()
    }

    fn count(&self, kind: &str) -> usize {
        self.kinds().into_iter().filter(|k| *k == kind).count()
    }

    fn last(&self) -> Option<ServerMessage> {
        self.sent.lock().unwrap().last().cloned()
    }
}

fn roster(n: u64) -> Vec<Player> {
    let colors = [
        PlayerColor::Red,
        PlayerColor::Blue,
        PlayerColor::Yellow,
        PlayerColor::Green,
    ];
    (1..=n)
        .map(|id| Player {
            id: PlayerId(id),
            nickname: format!("p{id}"),
            color: colors[(id - 1) as usize % 4],
            is_host: id == 1,
            is_cpu: false,
            connected: true,
        })
        .collect()
}

fn settings(total_rounds: u32, round_types: Vec<RoundType>) -> MatchSettings {
    MatchSettings {
        total_rounds,
        round_types,
        ..MatchSettings::default()
    }
}

/// `count` single-finger taps 100 ms apart, well inside every check.
fn steady_taps(count: usize) -> TapPayload {
    let taps: Vec<TapEvent> = (0..count)
        .map(|i| TapEvent {
            timestamp: i as f64 * 100.0,
            x: 200.0,
            y: 300.0,
            finger_id: 0,
        })
        .collect();
    TapPayload {
        window_end: taps.last().map_or(0.0, |t| t.timestamp),
        window_start: 0.0,
        taps,
    }
}

/// Runs the match to completion, calling `on_playing` once at the start of
/// each playing phase with the round index.
async fn drive<F>(orch: &mut MatchOrchestrator, out: &Recorder, mut on_playing: F)
where
    F: FnMut(&mut MatchOrchestrator, u32),
{
    orch.start(out);
    let mut fed = None;
    while !orch.is_finished() {
        let signal = orch.next_signal().await;
        orch.handle_signal(signal, out);
        let round = orch.current_round();
        if orch.phase() == MatchPhase::Playing && fed != Some(round) {
            fed = Some(round);
            on_playing(orch, round);
        }
    }
}

// =========================================================================
// Lifecycle
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_match_runs_every_phase_in_order() {
    let out = Recorder::default();
    let mut orch = MatchOrchestrator::new(
        RoomId(1),
        roster(2),
        settings(3, RoundType::ALL.to_vec()),
        MatchTimings::default(),
    )
    .with_seed(7);

    drive(&mut orch, &out, |orch, _| {
        assert!(orch.submit_taps(PlayerId(1), &steady_taps(10)));
        assert!(orch.submit_taps(PlayerId(2), &steady_taps(20)));
    })
    .await;

    let kinds = out.kinds();
    assert_eq!(kinds.first(), Some(&"match-starting"));
    assert_eq!(kinds.last(), Some(&"match-end"));
    assert_eq!(out.count("round-intro"), 3);
    assert_eq!(out.count("round-start"), 3);
    assert_eq!(out.count("round-end"), 3);
    assert!(out.count("round-tick") > 0);

    // Every round-start is preceded by its intro and followed by its end.
    let phases: Vec<&str> = kinds
        .iter()
        .copied()
        .filter(|k| matches!(*k, "round-intro" | "round-start" | "round-end"))
        .collect();
    for chunk in phases.chunks(3) {
        assert_eq!(chunk, ["round-intro", "round-start", "round-end"]);
    }

    let Some(ServerMessage::MatchEnd {
        final_scores,
        winner,
    }) = out.last()
    else {
        panic!("expected match-end last");
    };
    assert_eq!(final_scores.len(), 2);
    assert_eq!(winner.id, final_scores[0].player_id);
    for pair in final_scores.windows(2) {
        assert!(pair[0].total() >= pair[1].total());
    }
    for score in &final_scores {
        assert_eq!(score.round_scores.len(), 3);
        assert!(score.total() >= 0);
    }
    assert_eq!(orch.phase(), MatchPhase::FinalPodium);
    assert_eq!(orch.outcome().map(|o| o.winner.id), Some(winner.id));
}

#[tokio::test(start_paused = true)]
async fn test_match_starting_carries_first_round() {
    let out = Recorder::default();
    let mut orch = MatchOrchestrator::new(
        RoomId(4),
        roster(2),
        settings(5, RoundType::ALL.to_vec()),
        MatchTimings::default(),
    );
    orch.start(&out);

    let sent = out.sent.lock().unwrap();
    let Some(ServerMessage::MatchStarting { match_state }) = sent.first() else {
        panic!("expected match-starting");
    };
    assert_eq!(match_state.match_id, RoomId(4));
    assert_eq!(match_state.current_round, 0);
    assert_eq!(match_state.total_rounds, 5);
    assert_eq!(match_state.round_config.round_type, RoundType::Classic);
    assert_eq!(match_state.phase, MatchPhase::Countdown);
    assert_eq!(match_state.scores.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_round_ticks_count_down() {
    let out = Recorder::default();
    let mut orch = MatchOrchestrator::new(
        RoomId(1),
        roster(1),
        settings(1, vec![RoundType::Classic]),
        MatchTimings::default(),
    );
    drive(&mut orch, &out, |_, _| {}).await;

    let ticks: Vec<f64> = out
        .sent
        .lock()
        .unwrap()
        .iter()
        .filter_map(|m| match m {
            ServerMessage::RoundTick { time_remaining } => Some(*time_remaining),
            _ => None,
        })
        .collect();
    // Six-second round at 100 ms cadence.
    assert_eq!(ticks.len(), 59);
    assert_eq!(ticks[0], 5.9);
    assert_eq!(ticks[58], 0.1);
    for pair in ticks.windows(2) {
        assert!(pair[0] > pair[1]);
    }
}

// =========================================================================
// Tap intake
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_submit_taps_rejected_outside_playing() {
    let out = Recorder::default();
    let mut orch = MatchOrchestrator::new(
        RoomId(1),
        roster(2),
        settings(1, vec![RoundType::Classic]),
        MatchTimings::default(),
    );
    assert!(!orch.submit_taps(PlayerId(1), &steady_taps(3)));
    orch.start(&out);
    assert!(!orch.submit_taps(PlayerId(1), &steady_taps(3)));

    while orch.phase() != MatchPhase::Playing {
        let signal = orch.next_signal().await;
        orch.handle_signal(signal, &out);
    }
    assert!(orch.submit_taps(PlayerId(1), &steady_taps(3)));
    assert!(!orch.submit_taps(PlayerId(9), &steady_taps(3)));
}

#[tokio::test(start_paused = true)]
async fn test_tap_buffer_is_capped_per_round() {
    let out = Recorder::default();
    let timings = MatchTimings {
        max_taps_per_round: 4,
        ..MatchTimings::default()
    };
    let mut orch = MatchOrchestrator::new(
        RoomId(1),
        roster(1),
        settings(1, vec![RoundType::Classic]),
        timings,
    );
    drive(&mut orch, &out, |orch, _| {
        assert!(orch.submit_taps(PlayerId(1), &steady_taps(3)));
        assert!(orch.submit_taps(PlayerId(1), &steady_taps(3)));
    })
    .await;

    // Only the first four taps (0, 100, 200, 0 ms) are kept; the repeated
    // timestamp 0 sits inside the finger spacing limit and is dropped.
    let outcome = orch.outcome().unwrap();
    assert_eq!(outcome.final_scores[0].total(), 3);
}

// =========================================================================
// Scoring across players
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_steals_apply_after_all_players_score() {
    let out = Recorder::default();
    let mut orch = MatchOrchestrator::new(
        RoomId(1),
        roster(2),
        settings(2, vec![RoundType::Steal]),
        MatchTimings::default(),
    );

    drive(&mut orch, &out, |orch, round| {
        let (a, b) = if round == 0 { (2, 5) } else { (4, 6) };
        orch.submit_taps(PlayerId(1), &steady_taps(a));
        orch.submit_taps(PlayerId(2), &steady_taps(b));
    })
    .await;

    assert_eq!(orch.rounds()[1].round_type, RoundType::Steal);
    let scores = &orch.outcome().unwrap().final_scores;
    let p1 = scores.iter().find(|s| s.player_id == PlayerId(1)).unwrap();
    let p2 = scores.iter().find(|s| s.player_id == PlayerId(2)).unwrap();
    // Round 1: p1 scores 4 and loses 6, clamped to 0; p2 scores 6 and loses 4.
    assert_eq!(p1.round_scores, vec![2, 0]);
    assert_eq!(p2.round_scores, vec![5, 2]);
    assert_eq!(scores[0].player_id, PlayerId(2));
}

#[tokio::test(start_paused = true)]
async fn test_ties_keep_join_order() {
    let out = Recorder::default();
    let mut orch = MatchOrchestrator::new(
        RoomId(1),
        roster(3),
        settings(1, vec![RoundType::Classic]),
        MatchTimings::default(),
    );
    drive(&mut orch, &out, |orch, _| {
        orch.submit_taps(PlayerId(3), &steady_taps(4));
        orch.submit_taps(PlayerId(2), &steady_taps(4));
    })
    .await;

    let order: Vec<PlayerId> = orch
        .outcome()
        .unwrap()
        .final_scores
        .iter()
        .map(|s| s.player_id)
        .collect();
    assert_eq!(order, vec![PlayerId(2), PlayerId(3), PlayerId(1)]);
}

#[tokio::test(start_paused = true)]
async fn test_golden_round_spawns_targets() {
    let out = Recorder::default();
    let mut orch = MatchOrchestrator::new(
        RoomId(1),
        roster(2),
        settings(2, vec![RoundType::Golden]),
        MatchTimings::default(),
    );
    drive(&mut orch, &out, |_, _| {}).await;

    // Seven-second round, one target every 1.5 s.
    assert_eq!(out.count("golden-target"), 4);
    for msg in out.sent.lock().unwrap().iter() {
        if let ServerMessage::GoldenTarget { position, .. } = msg {
            assert!((0.1..=0.9).contains(&position.x));
            assert!((0.1..=0.9).contains(&position.y));
        }
    }
}

// =========================================================================
// Cancellation and departures
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_stop_suppresses_further_events() {
    let out = Recorder::default();
    let mut orch = MatchOrchestrator::new(
        RoomId(1),
        roster(2),
        settings(3, RoundType::ALL.to_vec()),
        MatchTimings::default(),
    );
    orch.start(&out);
    orch.stop();
    let sent = out.kinds().len();

    let waited = tokio::time::timeout(Duration::from_secs(60), orch.next_signal()).await;
    assert!(waited.is_err());
    assert!(orch.is_finished());
    assert!(orch.outcome().is_none());
    assert_eq!(out.kinds().len(), sent);
}

#[tokio::test(start_paused = true)]
async fn test_departed_player_leaves_scoreboard() {
    let out = Recorder::default();
    let mut orch = MatchOrchestrator::new(
        RoomId(1),
        roster(3),
        settings(2, vec![RoundType::Classic]),
        MatchTimings::default(),
    );
    drive(&mut orch, &out, |orch, round| {
        orch.submit_taps(PlayerId(1), &steady_taps(3));
        orch.submit_taps(PlayerId(2), &steady_taps(8));
        if round == 1 {
            assert!(orch.remove_participant(PlayerId(2)));
        }
    })
    .await;

    let outcome = orch.outcome().unwrap();
    assert_eq!(outcome.final_scores.len(), 2);
    assert!(outcome.final_scores.iter().all(|s| s.player_id != PlayerId(2)));
    assert_eq!(outcome.winner.id, PlayerId(1));
}

#[tokio::test(start_paused = true)]
async fn test_last_departure_abandons_match() {
    let out = Recorder::default();
    let mut orch = MatchOrchestrator::new(
        RoomId(1),
        roster(1),
        settings(3, vec![RoundType::Classic]),
        MatchTimings::default(),
    );
    orch.start(&out);
    assert!(orch.remove_participant(PlayerId(1)));
    assert!(!orch.remove_participant(PlayerId(1)));
    assert!(orch.is_finished());
    assert_eq!(out.count("match-end"), 0);
}
