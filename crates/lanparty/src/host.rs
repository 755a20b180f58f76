//! The hosting side of a LAN lobby.
//!
//! A [`HostHub`] task owns the roster. Connected clients each get their
//! own task that performs the `Hello` handshake and then shuttles
//! messages between the socket and the hub:
//!
//! ```text
//!  accept loop ──Accepted──→ HostHub ──spawns──→ client task ←──→ WebSocket
//!                              ↑  │                  │
//!                              │  └──outbound queue──┘
//!                              └────Hello / FromClient / Detached
//! ```
//!
//! The hub is authoritative for readiness: clients ask, the hub decides
//! and tells everyone with a `ReadyChanged`.

use std::time::Duration;

use lanparty_protocol::{
    Codec, JsonCodec, LobbyMessage, PROTOCOL_VERSION, PlayerId, ProtocolError, RosterEntry,
};
use lanparty_session::{BackendEvent, BackendSink};
use lanparty_transport::{Connection, Transport, TransportError, WebSocketConnection, WebSocketTransport};
use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

use crate::{LanPartyError, SessionConfig};

pub(crate) enum HubCommand {
    /// The host player's own readiness.
    SetReady(bool),
    ClearReady(PlayerId),
    StartGame,
    Accepted(WebSocketConnection),
    /// A client finished its `Hello` and wants a seat.
    Hello {
        label: String,
        outbound: mpsc::UnboundedSender<LobbyMessage>,
        reply: oneshot::Sender<Result<PlayerId, String>>,
    },
    FromClient {
        player: PlayerId,
        message: LobbyMessage,
    },
    Detached {
        player: PlayerId,
    },
}

struct Member {
    id: PlayerId,
    label: String,
    ready: bool,
    /// `None` for the host itself.
    outbound: Option<mpsc::UnboundedSender<LobbyMessage>>,
}

impl Member {
    fn roster_entry(&self) -> RosterEntry {
        RosterEntry {
            player: self.id,
            label: self.label.clone(),
            ready: self.ready,
        }
    }
}

pub(crate) struct HostHub {
    config: SessionConfig,
    sink: BackendSink,
    members: Vec<Member>,
    next_id: u64,
    in_game: bool,
}

impl HostHub {
    /// Spawns the hub over a bound transport.
    ///
    /// Aborting the returned task aborts the accept loop and every client
    /// task with it.
    pub(crate) fn spawn(
        config: SessionConfig,
        transport: WebSocketTransport,
        sink: BackendSink,
    ) -> (JoinHandle<()>, mpsc::UnboundedSender<HubCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let host = Member {
            id: PlayerId::HOST,
            label: config.label.clone(),
            ready: false,
            outbound: None,
        };
        let hub = Self {
            config,
            sink,
            members: vec![host],
            next_id: PlayerId::HOST.0 + 1,
            in_game: false,
        };
        let task = tokio::spawn(hub.run(transport, rx, tx.clone()));
        (task, tx)
    }

    async fn run(
        mut self,
        transport: WebSocketTransport,
        mut commands: mpsc::UnboundedReceiver<HubCommand>,
        hub: mpsc::UnboundedSender<HubCommand>,
    ) {
        self.sink.emit(BackendEvent::PlayerAttached {
            player: PlayerId::HOST,
            label: self.config.label.clone(),
            is_local: true,
        });

        let mut tasks = JoinSet::new();
        tasks.spawn(accept_loop(transport, hub.clone()));

        loop {
            tokio::select! {
                command = commands.recv() => {
                    let Some(command) = command else { break };
                    if let HubCommand::Accepted(conn) = command {
                        tasks.spawn(serve_client(conn, hub.clone(), self.config.connect_timeout));
                    } else {
                        self.handle(command);
                    }
                }
                Some(joined) = tasks.join_next() => {
                    if let Err(err) = joined {
                        warn!("lobby task failed: {err}");
                    }
                }
            }
        }
    }

    fn handle(&mut self, command: HubCommand) {
        match command {
            HubCommand::SetReady(ready) => self.set_ready(PlayerId::HOST, ready),
            HubCommand::ClearReady(player) => self.set_ready(player, false),
            HubCommand::StartGame => {
                self.in_game = true;
                info!(players = self.members.len(), "lobby moved into play");
                self.broadcast(&LobbyMessage::GameStarted);
            }
            HubCommand::Accepted(_) => {}
            HubCommand::Hello {
                label,
                outbound,
                reply,
            } => {
                let admitted = self.admit(label, outbound);
                let _ = reply.send(admitted);
            }
            HubCommand::FromClient { player, message } => match message {
                LobbyMessage::SetReady { ready } => self.set_ready(player, ready),
                LobbyMessage::ClearReady { player: target } => self.set_ready(target, false),
                other => debug!(%player, ?other, "unexpected message from client, ignoring"),
            },
            HubCommand::Detached { player } => self.detach(player),
        }
    }

    fn admit(
        &mut self,
        label: String,
        outbound: mpsc::UnboundedSender<LobbyMessage>,
    ) -> Result<PlayerId, String> {
        if self.in_game {
            return Err("game already in progress".to_string());
        }
        if self.members.len() >= usize::from(self.config.max_players) {
            return Err(format!("lobby is full ({} players)", self.members.len()));
        }

        let id = PlayerId(self.next_id);
        self.next_id += 1;

        let roster = self.members.iter().map(Member::roster_entry).collect();
        let _ = outbound.send(LobbyMessage::Welcome {
            player_id: id,
            roster,
        });

        let member = Member {
            id,
            label,
            ready: false,
            outbound: Some(outbound),
        };
        self.broadcast(&LobbyMessage::PlayerJoined {
            player: member.roster_entry(),
        });
        self.sink.emit(BackendEvent::PlayerAttached {
            player: id,
            label: member.label.clone(),
            is_local: false,
        });
        self.members.push(member);
        info!(player = %id, players = self.members.len(), "client admitted");
        Ok(id)
    }

    fn set_ready(&mut self, player: PlayerId, ready: bool) {
        let Some(member) = self.members.iter_mut().find(|m| m.id == player) else {
            debug!(%player, "readiness for unknown player, ignoring");
            return;
        };
        if member.ready == ready {
            return;
        }
        member.ready = ready;
        self.broadcast(&LobbyMessage::ReadyChanged { player, ready });
        self.sink.emit(BackendEvent::ReadyChanged { player, ready });
    }

    fn detach(&mut self, player: PlayerId) {
        let Some(index) = self.members.iter().position(|m| m.id == player) else {
            return;
        };
        // Dropping the member's queue ends its client task.
        self.members.remove(index);
        self.broadcast(&LobbyMessage::PlayerLeft { player });
        self.sink.emit(BackendEvent::PlayerDetached { player });
        info!(%player, players = self.members.len(), "client left");
    }

    fn broadcast(&self, message: &LobbyMessage) {
        for outbound in self.members.iter().filter_map(|m| m.outbound.as_ref()) {
            let _ = outbound.send(message.clone());
        }
    }
}

// ---------------------------------------------------------------------------
// Connection tasks
// ---------------------------------------------------------------------------

async fn accept_loop(mut transport: WebSocketTransport, hub: mpsc::UnboundedSender<HubCommand>) {
    loop {
        match transport.accept().await {
            Ok(conn) => {
                if hub.send(HubCommand::Accepted(conn)).is_err() {
                    break;
                }
            }
            Err(err) => warn!("failed to accept lobby connection: {err}"),
        }
    }
}

/// Tells the hub a client is gone, however its task ends.
struct DetachGuard {
    player: PlayerId,
    hub: mpsc::UnboundedSender<HubCommand>,
}

impl Drop for DetachGuard {
    fn drop(&mut self) {
        let _ = self.hub.send(HubCommand::Detached {
            player: self.player,
        });
    }
}

async fn serve_client(
    conn: WebSocketConnection,
    hub: mpsc::UnboundedSender<HubCommand>,
    handshake_timeout: Duration,
) {
    let (link, peer) = (conn.id(), conn.peer_addr());
    if let Err(err) = handle_client(&conn, &hub, handshake_timeout).await {
        debug!(%link, %peer, "lobby connection ended: {err}");
    }
    let _ = conn.close().await;
}

async fn handle_client(
    conn: &WebSocketConnection,
    hub: &mpsc::UnboundedSender<HubCommand>,
    handshake_timeout: Duration,
) -> Result<(), LanPartyError> {
    let label = receive_hello(conn, handshake_timeout).await?;

    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel();
    let (reply_tx, reply_rx) = oneshot::channel();
    hub.send(HubCommand::Hello {
        label,
        outbound: outbound_tx,
        reply: reply_tx,
    })
    .map_err(|_| TransportError::Shutdown)?;

    let player = match reply_rx.await {
        Ok(Ok(player)) => player,
        Ok(Err(reason)) => {
            reject(conn, &reason).await?;
            return Err(LanPartyError::Rejected(reason));
        }
        Err(_) => return Err(TransportError::Shutdown.into()),
    };
    let _guard = DetachGuard {
        player,
        hub: hub.clone(),
    };

    let codec = JsonCodec;
    loop {
        tokio::select! {
            outgoing = outbound_rx.recv() => {
                let Some(message) = outgoing else { break };
                conn.send(&codec.encode(&message)?).await?;
            }
            incoming = conn.recv() => {
                let Some(data) = incoming? else {
                    debug!(%player, "client closed the connection");
                    break;
                };
                match codec.decode::<LobbyMessage>(&data) {
                    Ok(LobbyMessage::Goodbye) => {
                        debug!(%player, "client said goodbye");
                        break;
                    }
                    Ok(message) => {
                        let _ = hub.send(HubCommand::FromClient { player, message });
                    }
                    Err(err) => debug!(%player, "undecodable lobby message: {err}"),
                }
            }
        }
    }
    Ok(())
}

/// Waits for the client's `Hello` and checks its version. Returns the
/// client's label.
async fn receive_hello(
    conn: &WebSocketConnection,
    handshake_timeout: Duration,
) -> Result<String, LanPartyError> {
    let data = match tokio::time::timeout(handshake_timeout, conn.recv()).await {
        Ok(Ok(Some(data))) => data,
        Ok(Ok(None)) => {
            return Err(ProtocolError::InvalidMessage(
                "connection closed before Hello".into(),
            )
            .into());
        }
        Ok(Err(err)) => return Err(err.into()),
        Err(_) => return Err(LanPartyError::HandshakeTimeout),
    };

    match JsonCodec.decode::<LobbyMessage>(&data)? {
        LobbyMessage::Hello { version, label } if version == PROTOCOL_VERSION => Ok(label),
        LobbyMessage::Hello { version, .. } => {
            let reason = format!("version mismatch: expected {PROTOCOL_VERSION}, got {version}");
            reject(conn, &reason).await?;
            Err(LanPartyError::Rejected(reason))
        }
        _ => {
            reject(conn, "expected Hello").await?;
            Err(ProtocolError::InvalidMessage("first message must be Hello".into()).into())
        }
    }
}

async fn reject(conn: &WebSocketConnection, reason: &str) -> Result<(), LanPartyError> {
    let message = LobbyMessage::Rejected {
        reason: reason.to_string(),
    };
    conn.send(&JsonCodec.encode(&message)?).await?;
    Ok(())
}
