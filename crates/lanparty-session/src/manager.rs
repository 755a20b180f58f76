//! The session manager: which role we play and which state we are in.
//!
//! `SessionManager` owns the [`NetworkBackend`] and is the only place the
//! [`SessionState`] changes. It enforces one rule above all others: no two
//! roles are ever active at once. Starting a role while another is active
//! tears the old one down first, exactly once.
//!
//! # Epochs
//!
//! Every role start and every teardown bumps the epoch. Backend events are
//! stamped with the epoch of the role that produced them, and
//! [`accepts`](SessionManager::accepts) only admits the current one, so a
//! late `PlayerAttached` from a host we already left cannot resurrect
//! state.
//!
//! `SessionManager` is not thread-safe by itself; the controller task owns
//! it exclusively.

use std::net::SocketAddr;

use lanparty_protocol::ConnectionInfo;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::{BackendSink, NetworkBackend, SessionError, SessionState, StampedEvent};

/// The role held while a session is active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    /// Hosting; clients dial `addr`.
    Host { addr: SocketAddr },
    /// Joined (or joining) `peer`.
    Client { peer: ConnectionInfo },
}

/// Owns the backend and the session state machine.
pub struct SessionManager<B> {
    backend: B,
    state: SessionState,
    role: Option<Role>,
    epoch: u64,
    events: mpsc::UnboundedSender<StampedEvent>,
}

impl<B: NetworkBackend> SessionManager<B> {
    /// Creates an inactive manager. Backend events are delivered on `events`.
    pub fn new(backend: B, events: mpsc::UnboundedSender<StampedEvent>) -> Self {
        Self {
            backend,
            state: SessionState::Inactive,
            role: None,
            epoch: 0,
            events,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn role(&self) -> Option<&Role> {
        self.role.as_ref()
    }

    pub fn is_host(&self) -> bool {
        matches!(self.role, Some(Role::Host { .. }))
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Whether an event stamped with `epoch` belongs to the current role.
    pub fn accepts(&self, epoch: u64) -> bool {
        self.role.is_some() && epoch == self.epoch
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    /// Starts hosting: any state → `InLobby`.
    ///
    /// An active role is torn down first. On failure the manager ends up
    /// `Inactive`.
    pub fn start_host(&mut self) -> Result<SocketAddr, SessionError> {
        self.teardown("starting host");
        let sink = self.next_sink();
        match self.backend.start_host(sink) {
            Ok(addr) => {
                self.role = Some(Role::Host { addr });
                self.set_state(SessionState::InLobby);
                info!(%addr, epoch = self.epoch, "hosting session");
                Ok(addr)
            }
            Err(err) => {
                warn!("failed to start host: {err}");
                self.set_state(SessionState::Inactive);
                Err(err)
            }
        }
    }

    /// Starts searching: any state → `Pregame`.
    ///
    /// An active role is torn down first.
    pub fn start_client_search(&mut self) -> Option<SessionState> {
        self.teardown("starting search");
        self.set_state(SessionState::Pregame)
    }

    /// Dials `peer`: any state → `Connecting`.
    ///
    /// The state moves on to `InLobby` once the backend reports the
    /// handshake done (see [`mark_connected`](Self::mark_connected)). On
    /// failure the manager ends up `Inactive`.
    pub fn join_specific(&mut self, peer: &ConnectionInfo) -> Result<(), SessionError> {
        self.teardown("joining another session");
        let sink = self.next_sink();
        match self.backend.start_client(peer, sink) {
            Ok(()) => {
                self.role = Some(Role::Client { peer: peer.clone() });
                self.set_state(SessionState::Connecting);
                info!(%peer, epoch = self.epoch, "joining session");
                Ok(())
            }
            Err(err) => {
                warn!(%peer, "failed to join: {err}");
                self.set_state(SessionState::Inactive);
                Err(err)
            }
        }
    }

    /// `Connecting` → `InLobby`. No-op in any other state.
    pub fn mark_connected(&mut self) -> Option<SessionState> {
        if self.state != SessionState::Connecting {
            debug!(state = %self.state, "connected outside of a join, ignoring");
            return None;
        }
        self.set_state(SessionState::InLobby)
    }

    /// `InLobby` → `InGame`.
    pub fn begin_game(&mut self) -> Result<SessionState, SessionError> {
        if self.state != SessionState::InLobby {
            return Err(SessionError::InvalidState {
                state: self.state,
                operation: "start the game",
            });
        }
        self.set_state(SessionState::InGame);
        Ok(self.state)
    }

    /// Stops hosting: → `Inactive`. Tears down only if something is active.
    pub fn stop_hosting(&mut self) -> Option<SessionState> {
        self.teardown("stopped hosting");
        self.set_state(SessionState::Inactive)
    }

    /// Leaves the session: → `Inactive`. Tears down only if something is
    /// active.
    pub fn leave_session(&mut self) -> Option<SessionState> {
        self.teardown("left session");
        self.set_state(SessionState::Inactive)
    }

    /// Unconditionally → `Inactive`.
    ///
    /// Returns whether an active role was torn down. The epoch moves on
    /// either way, so nothing emitted before the reset is accepted after it.
    pub fn reset(&mut self) -> bool {
        let torn_down = self.teardown("reset");
        if !torn_down {
            self.epoch += 1;
        }
        self.set_state(SessionState::Inactive);
        torn_down
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    /// Shuts the backend down if a role is active. Returns whether it was.
    fn teardown(&mut self, reason: &'static str) -> bool {
        if self.role.is_none() && !self.backend.is_active() {
            return false;
        }
        self.backend.shutdown();
        let previous = self.role.take();
        self.epoch += 1;
        info!(?previous, reason, "session resources torn down");
        true
    }

    fn next_sink(&mut self) -> BackendSink {
        self.epoch += 1;
        BackendSink::new(self.epoch, self.events.clone())
    }

    fn set_state(&mut self, next: SessionState) -> Option<SessionState> {
        if self.state == next {
            return None;
        }
        debug!(from = %self.state, to = %next, "session state changed");
        self.state = next;
        Some(next)
    }
}

impl<B> std::fmt::Debug for SessionManager<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("state", &self.state)
            .field("role", &self.role)
            .field("epoch", &self.epoch)
            .finish_non_exhaustive()
    }
}

// =========================================================================
// Tests
// =========================================================================
