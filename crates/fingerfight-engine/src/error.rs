//! Error types for the engine.

/// Errors surfaced by engine adapters.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The local match loop has ended; its handle can no longer reach it.
    #[error("match is no longer running")]
    MatchClosed,

    /// Taps were submitted for someone who is not playing.
    #[error("player {0} is not in this match")]
    UnknownPlayer(fingerfight_protocol::PlayerId),
}
