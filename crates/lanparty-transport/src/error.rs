use std::io;
use std::net::SocketAddr;

/// Why a lobby link could not be opened or used.
///
/// WebSocket protocol failures are carried as [`io::Error`]s so callers
/// only ever match on where things went wrong, not on the wire library.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The lobby listener could not be opened.
    #[error("cannot listen on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    /// A player reached the listener but the upgrade to a lobby link failed.
    #[error("accept failed: {0}")]
    Accept(#[source] io::Error),

    /// A host could not be reached or refused the upgrade.
    #[error("cannot reach host at {addr}: {source}")]
    Dial {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("send failed: {0}")]
    Send(#[source] io::Error),

    #[error("receive failed: {0}")]
    Receive(#[source] io::Error),

    /// The other side of the link, or the task serving it, went away.
    #[error("link shut down")]
    Shutdown,
}
