//! [`LanBackend`]: the WebSocket implementation of [`NetworkBackend`].

use std::net::SocketAddr;
use std::time::Duration;

use lanparty_protocol::{ConnectionInfo, PlayerId};
use lanparty_session::{BackendSink, NetworkBackend, SessionError};
use lanparty_transport::{Transport, WebSocketTransport};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::SessionConfig;
use crate::client::{self, ClientCommand};
use crate::host::{HostHub, HubCommand};

/// How long a leaving client may take to say goodbye before its task is
/// aborted.
const LEAVE_GRACE: Duration = Duration::from_millis(250);

enum ActiveRole {
    Host {
        task: JoinHandle<()>,
        hub: mpsc::UnboundedSender<HubCommand>,
    },
    Client {
        task: JoinHandle<()>,
        commands: mpsc::UnboundedSender<ClientCommand>,
    },
}

/// Hosts lobbies on a WebSocket listener and joins them over WebSocket.
///
/// Must be used from within a Tokio runtime: every role runs on tasks
/// spawned by the backend.
pub struct LanBackend {
    config: SessionConfig,
    role: Option<ActiveRole>,
}

impl LanBackend {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config: config.validated(),
            role: None,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}

impl NetworkBackend for LanBackend {
    fn start_host(&mut self, sink: BackendSink) -> Result<SocketAddr, SessionError> {
        self.shutdown();
        let transport =
            WebSocketTransport::bind(self.config.bind_addr).map_err(SessionError::backend)?;
        let addr = transport.local_addr().map_err(SessionError::backend)?;
        let (task, hub) = HostHub::spawn(self.config.clone(), transport, sink);
        self.role = Some(ActiveRole::Host { task, hub });
        Ok(addr)
    }

    fn start_client(&mut self, peer: &ConnectionInfo, sink: BackendSink) -> Result<(), SessionError> {
        self.shutdown();
        let (task, commands) = client::spawn(
            peer.socket_addr(),
            self.config.label.clone(),
            self.config.connect_timeout,
            sink,
        );
        self.role = Some(ActiveRole::Client { task, commands });
        Ok(())
    }

    fn set_ready(&mut self, ready: bool) {
        match &self.role {
            Some(ActiveRole::Host { hub, .. }) => {
                let _ = hub.send(HubCommand::SetReady(ready));
            }
            Some(ActiveRole::Client { commands, .. }) => {
                let _ = commands.send(ClientCommand::SetReady(ready));
            }
            None => debug!(ready, "no session, readiness not sent"),
        }
    }

    fn clear_ready(&mut self, player: PlayerId) {
        match &self.role {
            Some(ActiveRole::Host { hub, .. }) => {
                let _ = hub.send(HubCommand::ClearReady(player));
            }
            Some(ActiveRole::Client { commands, .. }) => {
                let _ = commands.send(ClientCommand::ClearReady(player));
            }
            None => debug!(%player, "no session, clear not sent"),
        }
    }

    fn start_game(&mut self) {
        match &self.role {
            Some(ActiveRole::Host { hub, .. }) => {
                let _ = hub.send(HubCommand::StartGame);
            }
            _ => debug!("only a host can start the game"),
        }
    }

    fn shutdown(&mut self) {
        match self.role.take() {
            None => {}
            Some(ActiveRole::Host { task, .. }) => {
                task.abort();
                debug!("lobby host stopped");
            }
            Some(ActiveRole::Client { task, commands }) => {
                let _ = commands.send(ClientCommand::Leave);
                let abort = task.abort_handle();
                tokio::spawn(async move {
                    tokio::time::sleep(LEAVE_GRACE).await;
                    abort.abort();
                });
                debug!("left lobby");
            }
        }
    }

    fn is_active(&self) -> bool {
        self.role.is_some()
    }
}

impl Drop for LanBackend {
    fn drop(&mut self) {
        match self.role.take() {
            Some(ActiveRole::Host { task, .. }) | Some(ActiveRole::Client { task, .. }) => {
                task.abort()
            }
            None => {}
        }
    }
}
