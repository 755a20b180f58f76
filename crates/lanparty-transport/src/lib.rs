//! Lobby links for lanparty.
//!
//! A host opens a [`Transport`] and accepts one [`Connection`] per joining
//! player; a client dials the host and holds exactly one. Both ends move
//! opaque byte frames; what they mean is the protocol crate's business.
//!
//! # Feature Flags
//!
//! - `websocket` (default): links over WebSocket via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketTransport};

use std::fmt;
use std::net::SocketAddr;

/// Process-unique tag for one lobby link, used to tell links apart in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "link-{}", self.0)
    }
}

/// The host side: hands out a [`Connection`] for each player that dials in.
pub trait Transport: Send + Sync + 'static {
    type Connection: Connection;
    type Error: std::error::Error + Send + Sync;

    /// Waits for the next player and completes its upgrade.
    ///
    /// Not cancel-safe: a player caught mid-upgrade is dropped. Run it in
    /// its own task rather than inside a `select!`.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;

    /// The address joining players should dial. Carries the real port when
    /// bound to port 0.
    fn local_addr(&self) -> Result<SocketAddr, Self::Error>;
}

/// One lobby link. Sending and receiving may run concurrently from
/// different tasks.
pub trait Connection: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync;

    async fn send(&self, data: &[u8]) -> Result<(), Self::Error>;

    /// The next frame, or `Ok(None)` once the other side closed cleanly.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    async fn close(&self) -> Result<(), Self::Error>;

    fn id(&self) -> ConnectionId;

    /// The host's address for a client; the player's address for a host.
    fn peer_addr(&self) -> SocketAddr;
}
