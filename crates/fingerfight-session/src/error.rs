//! Error types for the session layer.

use fingerfight_protocol::PlayerId;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No session exists for the given player. Either it was never opened
    /// or the liveness sweep already closed it.
    #[error("session not found for player {0}")]
    NotFound(PlayerId),

    /// The connection sent more messages than its window allows.
    #[error("player {0} is sending too fast")]
    RateLimited(PlayerId),
}
