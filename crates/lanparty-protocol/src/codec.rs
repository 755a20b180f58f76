//! Codec trait and implementations for serializing/deserializing messages.
//!
//! The discovery and lobby layers only need *something* that turns serde
//! types into bytes. [`JsonCodec`] is the default; a binary codec can be
//! slotted in later without touching the callers.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Send + Sync + 'static` because a codec is shared by the announcer,
/// the listener, and every connection task.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// ```rust
/// use lanparty_protocol::{Codec, JsonCodec, LobbyMessage};
///
/// let codec = JsonCodec;
/// let bytes = codec.encode(&LobbyMessage::SetReady { ready: true }).unwrap();
/// let decoded: LobbyMessage = codec.decode(&bytes).unwrap();
/// assert_eq!(decoded, LobbyMessage::SetReady { ready: true });
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
