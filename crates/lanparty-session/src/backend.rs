//! The seam between session bookkeeping and the network.
//!
//! A [`NetworkBackend`] owns the actual connection (a hosted listener or a
//! dialed host). Its methods never block: anything that completes later
//! is reported as a [`BackendEvent`] through the [`BackendSink`] handed
//! over when the role started. Each sink is stamped with the epoch of the
//! role it belongs to, so events from a torn-down role can be told apart
//! from current ones.

use std::net::SocketAddr;

use lanparty_protocol::{ConnectionInfo, PlayerId};
use tokio::sync::mpsc;

use crate::SessionError;

/// Something that happened on the backend's connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendEvent {
    /// The client handshake completed; `local` is our assigned id.
    Connected { local: PlayerId },
    /// Dialing or the handshake failed.
    ConnectFailed { reason: String },
    /// A player joined the session (including ourselves).
    PlayerAttached {
        player: PlayerId,
        label: String,
        is_local: bool,
    },
    /// A player left the session.
    PlayerDetached { player: PlayerId },
    /// A player's readiness flag changed.
    ReadyChanged { player: PlayerId, ready: bool },
    /// The host moved the lobby into play.
    GameStarted,
    /// The connection to the host (or the host listener) is gone.
    Disconnected { reason: String },
}

/// A [`BackendEvent`] together with the epoch of the role that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StampedEvent {
    pub epoch: u64,
    pub event: BackendEvent,
}

/// Where a backend reports its events.
#[derive(Debug, Clone)]
pub struct BackendSink {
    epoch: u64,
    tx: mpsc::UnboundedSender<StampedEvent>,
}

impl BackendSink {
    pub fn new(epoch: u64, tx: mpsc::UnboundedSender<StampedEvent>) -> Self {
        Self { epoch, tx }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Reports an event. Returns `false` if nobody is listening anymore.
    pub fn emit(&self, event: BackendEvent) -> bool {
        self.tx
            .send(StampedEvent {
                epoch: self.epoch,
                event,
            })
            .is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// A network implementation the session can host or join through.
///
/// Every method must return promptly; connection work happens on tasks
/// the backend spawns itself. At most one role is active at a time:
/// callers [`shutdown`](Self::shutdown) before starting another.
pub trait NetworkBackend: Send + 'static {
    /// Starts hosting. Returns the address clients should dial.
    ///
    /// The host's own player is reported as a `PlayerAttached` event.
    fn start_host(&mut self, sink: BackendSink) -> Result<SocketAddr, SessionError>;

    /// Starts dialing `peer`. Completion is reported as `Connected` or
    /// `ConnectFailed`.
    fn start_client(&mut self, peer: &ConnectionInfo, sink: BackendSink) -> Result<(), SessionError>;

    /// Sets the local player's readiness.
    fn set_ready(&mut self, ready: bool);

    /// Asks for `player`'s readiness to be cleared.
    fn clear_ready(&mut self, player: PlayerId);

    /// Moves the lobby into play. Only meaningful when hosting.
    fn start_game(&mut self);

    /// Tears down the active role. No-op when idle.
    fn shutdown(&mut self);

    /// Whether a role is currently active.
    fn is_active(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sink_stamps_events_with_epoch() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sink = BackendSink::new(7, tx);

        assert!(sink.emit(BackendEvent::GameStarted));

        let stamped = rx.recv().await.unwrap();
        assert_eq!(stamped.epoch, 7);
        assert_eq!(stamped.event, BackendEvent::GameStarted);
    }

    #[test]
    fn test_sink_emit_without_receiver_is_false() {
        let (tx, rx) = mpsc::unbounded_channel();
        let sink = BackendSink::new(1, tx);
        drop(rx);

        assert!(sink.is_closed());
        assert!(!sink.emit(BackendEvent::GameStarted));
    }
}
