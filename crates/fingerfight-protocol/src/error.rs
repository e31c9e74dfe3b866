//! Error types for the protocol layer.

/// Errors raised while encoding, decoding or validating wire data.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// The bytes were not a well-formed frame of the expected type.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// Decoded fine but breaks a protocol rule, e.g. a room code with a
    /// symbol outside the alphabet.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
