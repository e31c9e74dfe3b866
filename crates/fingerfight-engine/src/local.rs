//! Single-device matches.
//!
//! Runs a [`MatchOrchestrator`] in-process with human players on one screen
//! and CPU opponents filling the remaining seats. Events go to a closure
//! instead of sockets.
//!
//! ```no_run
//! use fingerfight_engine::{CpuDifficulty, LocalMatch};
//!
//! # async fn demo() {
//! let (game, handle) = LocalMatch::builder()
//!     .human("ana")
//!     .cpu(CpuDifficulty::Normal)
//!     .build();
//! let outcome = game.run(|event| println!("{}", event.kind())).await;
//! # drop(handle);
//! # }
//! ```

use fingerfight_protocol::{
    MatchPhase, MatchSettings, PLAYER_COLORS, Player, PlayerId, RoomId, ServerMessage, TapPayload,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::broadcast::FnGateway;
use crate::cpu::{self, CpuDifficulty};
use crate::error::EngineError;
use crate::orchestrator::{MatchOrchestrator, MatchOutcome, MatchTimings};

#[derive(Debug)]
enum LocalCommand {
    Taps { player: PlayerId, payload: TapPayload },
    Stop,
}

/// Builder for a [`LocalMatch`]. Seats beyond the four colors are ignored.
#[derive(Debug, Default)]
pub struct LocalMatchBuilder {
    humans: Vec<String>,
    cpus: Vec<CpuDifficulty>,
    settings: MatchSettings,
    timings: MatchTimings,
    seed: Option<u64>,
}

impl LocalMatchBuilder {
    pub fn human(mut self, nickname: impl Into<String>) -> Self {
        self.humans.push(nickname.into());
        self
    }

    pub fn cpu(mut self, difficulty: CpuDifficulty) -> Self {
        self.cpus.push(difficulty);
        self
    }

    pub fn settings(mut self, settings: MatchSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn timings(mut self, timings: MatchTimings) -> Self {
        self.timings = timings;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn build(self) -> (LocalMatch, LocalMatchHandle) {
        let seats = self
            .humans
            .into_iter()
            .map(Seat::Human)
            .chain(self.cpus.into_iter().map(Seat::Cpu))
            .zip(PLAYER_COLORS);

        let mut roster = Vec::new();
        let mut cpus = Vec::new();
        let mut humans = Vec::new();
        for (i, (seat, color)) in seats.enumerate() {
            let id = PlayerId(i as u64 + 1);
            let (nickname, is_cpu) = match seat {
                Seat::Human(name) => {
                    humans.push(id);
                    (name, false)
                }
                Seat::Cpu(difficulty) => {
                    cpus.push((id, difficulty));
                    (format!("CPU {}", color.name()), true)
                }
            };
            roster.push(Player {
                id,
                nickname,
                color,
                is_host: i == 0,
                is_cpu,
                connected: true,
            });
        }

        let mut orchestrator =
            MatchOrchestrator::new(RoomId(0), roster, self.settings, self.timings);
        let rng = match self.seed {
            Some(seed) => {
                orchestrator = orchestrator.with_seed(seed);
                StdRng::seed_from_u64(seed.wrapping_add(1))
            }
            None => StdRng::from_os_rng(),
        };

        let (tx, rx) = mpsc::unbounded_channel();
        (
            LocalMatch {
                orchestrator,
                cpus,
                commands: rx,
                rng,
            },
            LocalMatchHandle { tx, humans },
        )
    }
}

enum Seat {
    Human(String),
    Cpu(CpuDifficulty),
}

/// An in-process match. Consumed by [`run`](LocalMatch::run).
pub struct LocalMatch {
    orchestrator: MatchOrchestrator,
    cpus: Vec<(PlayerId, CpuDifficulty)>,
    commands: mpsc::UnboundedReceiver<LocalCommand>,
    rng: StdRng,
}

impl LocalMatch {
    pub fn builder() -> LocalMatchBuilder {
        LocalMatchBuilder::default()
    }

    pub fn players(&self) -> &[Player] {
        self.orchestrator.roster()
    }

    /// Plays the match to the end, handing every event to `on_event`.
    ///
    /// Returns `None` if the match was stopped before `match-end`.
    pub async fn run<F>(self, on_event: F) -> Option<MatchOutcome>
    where
        F: Fn(&ServerMessage),
    {
        let LocalMatch {
            mut orchestrator,
            cpus,
            mut commands,
            mut rng,
        } = self;
        let out = FnGateway(|msg: &ServerMessage, _: Option<PlayerId>| on_event(msg));
        let mut commands_open = true;

        info!(
            players = orchestrator.roster().len(),
            cpus = cpus.len(),
            "local match starting"
        );
        orchestrator.start(&out);

        while !orchestrator.is_finished() {
            tokio::select! {
                cmd = commands.recv(), if commands_open => match cmd {
                    Some(LocalCommand::Taps { player, payload }) => {
                        if !orchestrator.submit_taps(player, &payload) {
                            debug!(%player, "taps outside play ignored");
                        }
                    }
                    Some(LocalCommand::Stop) => orchestrator.stop(),
                    None => commands_open = false,
                },
                signal = orchestrator.next_signal() => {
                    let was_playing = orchestrator.phase() == MatchPhase::Playing;
                    orchestrator.handle_signal(signal, &out);
                    if !was_playing && orchestrator.phase() == MatchPhase::Playing {
                        feed_cpus(&mut orchestrator, &cpus, &mut rng);
                    }
                }
            }
        }

        orchestrator.outcome().cloned()
    }
}

fn feed_cpus(
    orchestrator: &mut MatchOrchestrator,
    cpus: &[(PlayerId, CpuDifficulty)],
    rng: &mut StdRng,
) {
    let Some(config) = orchestrator.current_config().cloned() else {
        return;
    };
    for &(player, difficulty) in cpus {
        let taps = cpu::taps_for_round(difficulty, &config, rng);
        let window_end = taps.last().map_or(0.0, |t| t.timestamp);
        let payload = TapPayload {
            taps,
            window_start: 0.0,
            window_end,
        };
        orchestrator.submit_taps(player, &payload);
    }
}

/// Submits human taps to a running [`LocalMatch`].
#[derive(Debug, Clone)]
pub struct LocalMatchHandle {
    tx: mpsc::UnboundedSender<LocalCommand>,
    humans: Vec<PlayerId>,
}

impl LocalMatchHandle {
    /// Ids of the human seats, in the order they were added.
    pub fn humans(&self) -> &[PlayerId] {
        &self.humans
    }

    pub fn submit_taps(&self, player: PlayerId, payload: TapPayload) -> Result<(), EngineError> {
        if !self.humans.contains(&player) {
            return Err(EngineError::UnknownPlayer(player));
        }
        self.tx
            .send(LocalCommand::Taps { player, payload })
            .map_err(|_| EngineError::MatchClosed)
    }

    /// Ends the match early. No `match-end` is emitted.
    pub fn stop(&self) -> Result<(), EngineError> {
        self.tx
            .send(LocalCommand::Stop)
            .map_err(|_| EngineError::MatchClosed)
    }
}
