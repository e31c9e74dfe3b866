//! Codec trait and implementations for turning frames into bytes.
//!
//! Nothing above the transport layer touches `serde_json` directly: the
//! server handler decodes [`ClientMessage`](crate::ClientMessage) and
//! encodes [`ServerMessage`](crate::ServerMessage) through a [`Codec`], so a
//! binary format could replace JSON without touching room or engine code.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes Rust values to bytes and back.
///
/// `Send + Sync + 'static` so one codec can be shared by every connection
/// task through an `Arc`.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if the value cannot be represented.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` for malformed input, unknown message
    /// tags, or fields of the wrong type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] backed by `serde_json`. Clients speak JSON text frames, so
/// this is the codec the server uses.
///
/// ```rust
/// use fingerfight_protocol::{ClientMessage, Codec, JsonCodec};
///
/// let codec = JsonCodec;
/// let msg: ClientMessage = codec.decode(br#"{"type":"ping","timestamp":5}"#).unwrap();
/// assert_eq!(msg, ClientMessage::Ping { timestamp: 5.0 });
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
