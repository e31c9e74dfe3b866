//! Unified error type for the Finger Fight server.

use fingerfight_protocol::ProtocolError;
use fingerfight_room::RoomError;
use fingerfight_session::SessionError;
use fingerfight_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum FingerFightError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A frame could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Session(#[from] SessionError),

    /// A room rejected an operation (full, not found, wrong state).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// An environment variable held a value that does not parse.
    #[error("invalid {key}: {value:?}")]
    Config { key: &'static str, value: String },
}
