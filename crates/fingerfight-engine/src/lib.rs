//! Match engine for Finger Fight.
//!
//! Everything that decides *what happens* in a match, independent of how
//! players are connected:
//!
//! - [`planner`]: picks the round sequence for a match.
//! - [`anti_cheat`]: filters implausible taps before scoring.
//! - [`scoring`]: turns a round's valid taps into points.
//! - [`orchestrator`]: the phase state machine that drives a match on the
//!   [`fingerfight_tick`] clocks and emits events through a
//!   [`BroadcastGateway`].
//! - [`cpu`] and [`local`]: computer opponents and an in-process adapter
//!   for single-device play over the same orchestrator.
//!
//! The network server is the other adapter; it lives in `fingerfight-room`
//! and `fingerfight`.

pub mod anti_cheat;
pub mod broadcast;
pub mod cpu;
mod error;
pub mod local;
pub mod orchestrator;
pub mod planner;
pub mod rounds;
pub mod scoring;

pub use anti_cheat::{AntiCheatConfig, ValidationResult, validate};
pub use broadcast::{BroadcastGateway, FnGateway, PlayerSink};
pub use cpu::CpuDifficulty;
pub use error::EngineError;
pub use local::{LocalMatch, LocalMatchHandle};
pub use orchestrator::{MatchOrchestrator, MatchOutcome, MatchSignal, MatchTimings};
pub use planner::generate_rounds;
pub use scoring::{ScoringContext, ScoringResult, score};
