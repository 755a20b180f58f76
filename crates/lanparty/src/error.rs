//! Unified error type for lanparty.

use lanparty_discovery::DiscoveryError;
use lanparty_protocol::ProtocolError;
use lanparty_session::SessionError;
use lanparty_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The session controller absorbs domain failures (they become log lines
/// and [`SessionEvent::Message`](crate::SessionEvent::Message)s), so the
/// only variant a [`SessionHandle`](crate::SessionHandle) ever returns is
/// [`ControllerStopped`](Self::ControllerStopped). The other variants are
/// what the LAN backend uses internally and reports as reasons.
#[derive(Debug, thiserror::Error)]
pub enum LanPartyError {
    /// A transport-level error (bind, dial, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A discovery setup error.
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    /// A session-level error (backend start, invalid transition).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The host refused our `Hello`.
    #[error("rejected by host: {0}")]
    Rejected(String),

    /// The lobby handshake did not finish in time.
    #[error("lobby handshake timed out")]
    HandshakeTimeout,

    /// The controller task has exited; the handle is dead.
    #[error("session controller stopped")]
    ControllerStopped,
}
