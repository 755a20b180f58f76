//! Error types for the discovery layer.

use lanparty_protocol::ProtocolError;

/// Errors that can occur while setting up discovery.
///
/// Failures inside the running announcer or listener never surface here:
/// they are logged and retried on the next tick.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    /// Creating or configuring a UDP socket failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The announcement could not be encoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The configuration cannot be used as given.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}
