//! Error types for the protocol layer.
//!
//! Each lanparty crate defines its own error enum. A `ProtocolError`
//! always means bytes could not be turned into a message (or back), never
//! that a socket or a session misbehaved.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: malformed JSON, missing required fields, or a
    /// datagram truncated by a small receive buffer.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// A datagram on the discovery port did not start with the lanparty
    /// magic bytes. Usually another program sharing the port.
    #[error("not a lanparty discovery packet")]
    InvalidMagic,

    /// The message decoded but breaks a protocol rule.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
