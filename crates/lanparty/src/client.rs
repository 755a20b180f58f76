//! The joining side of a LAN lobby.
//!
//! One task per join: dial, `Hello`, wait for `Welcome`, then translate
//! the host's messages into [`BackendEvent`]s until either side leaves.

use std::net::SocketAddr;
use std::time::Duration;

use lanparty_protocol::{
    Codec, JsonCodec, LobbyMessage, PROTOCOL_VERSION, PlayerId, ProtocolError, RosterEntry,
};
use lanparty_session::{BackendEvent, BackendSink};
use lanparty_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::LanPartyError;

pub(crate) enum ClientCommand {
    SetReady(bool),
    ClearReady(PlayerId),
    /// Say goodbye and close.
    Leave,
}

/// What the host answered to our `Hello`.
struct Welcome {
    conn: WebSocketConnection,
    local: PlayerId,
    roster: Vec<RosterEntry>,
}

pub(crate) fn spawn(
    peer: SocketAddr,
    label: String,
    connect_timeout: Duration,
    sink: BackendSink,
) -> (JoinHandle<()>, mpsc::UnboundedSender<ClientCommand>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(run(peer, label, connect_timeout, sink, rx));
    (task, tx)
}

async fn run(
    peer: SocketAddr,
    label: String,
    connect_timeout: Duration,
    sink: BackendSink,
    mut commands: mpsc::UnboundedReceiver<ClientCommand>,
) {
    let welcome = match tokio::time::timeout(connect_timeout, handshake(peer, &label)).await {
        Ok(Ok(welcome)) => welcome,
        Ok(Err(err)) => {
            warn!(%peer, "join failed: {err}");
            sink.emit(BackendEvent::ConnectFailed {
                reason: err.to_string(),
            });
            return;
        }
        Err(_) => {
            warn!(%peer, timeout_ms = connect_timeout.as_millis() as u64, "join timed out");
            sink.emit(BackendEvent::ConnectFailed {
                reason: LanPartyError::HandshakeTimeout.to_string(),
            });
            return;
        }
    };

    let Welcome {
        conn,
        local,
        roster,
    } = welcome;
    info!(%peer, %local, players = roster.len() + 1, "welcomed into lobby");

    sink.emit(BackendEvent::Connected { local });
    for entry in roster {
        attach(&sink, entry, false);
    }
    attach(
        &sink,
        RosterEntry {
            player: local,
            label,
            ready: false,
        },
        true,
    );

    let reason = match session(&conn, &sink, &mut commands).await {
        Ok(Exit::Left) => None,
        Ok(Exit::HostClosed) => Some("host closed the connection".to_string()),
        Err(err) => Some(err.to_string()),
    };
    let _ = conn.close().await;

    if let Some(reason) = reason {
        info!(%peer, %reason, "disconnected from lobby");
        sink.emit(BackendEvent::Disconnected { reason });
    }
}

async fn handshake(peer: SocketAddr, label: &str) -> Result<Welcome, LanPartyError> {
    let conn = WebSocketConnection::connect(peer).await?;
    let hello = LobbyMessage::Hello {
        version: PROTOCOL_VERSION,
        label: label.to_string(),
    };
    conn.send(&JsonCodec.encode(&hello)?).await?;

    let Some(data) = conn.recv().await? else {
        return Err(ProtocolError::InvalidMessage("host closed before welcoming us".into()).into());
    };
    match JsonCodec.decode::<LobbyMessage>(&data)? {
        LobbyMessage::Welcome { player_id, roster } => Ok(Welcome {
            conn,
            local: player_id,
            roster,
        }),
        LobbyMessage::Rejected { reason } => Err(LanPartyError::Rejected(reason)),
        other => Err(ProtocolError::InvalidMessage(format!("expected Welcome, got {other:?}")).into()),
    }
}

enum Exit {
    Left,
    HostClosed,
}

async fn session(
    conn: &WebSocketConnection,
    sink: &BackendSink,
    commands: &mut mpsc::UnboundedReceiver<ClientCommand>,
) -> Result<Exit, LanPartyError> {
    let codec = JsonCodec;
    loop {
        tokio::select! {
            command = commands.recv() => {
                let message = match command {
                    Some(ClientCommand::SetReady(ready)) => LobbyMessage::SetReady { ready },
                    Some(ClientCommand::ClearReady(player)) => LobbyMessage::ClearReady { player },
                    Some(ClientCommand::Leave) | None => {
                        conn.send(&codec.encode(&LobbyMessage::Goodbye)?).await?;
                        return Ok(Exit::Left);
                    }
                };
                conn.send(&codec.encode(&message)?).await?;
            }
            incoming = conn.recv() => {
                let Some(data) = incoming? else {
                    return Ok(Exit::HostClosed);
                };
                match codec.decode::<LobbyMessage>(&data) {
                    Ok(message) => on_host_message(sink, message),
                    Err(err) => debug!("undecodable lobby message: {err}"),
                }
            }
        }
    }
}

fn on_host_message(sink: &BackendSink, message: LobbyMessage) {
    match message {
        LobbyMessage::PlayerJoined { player } => attach(sink, player, false),
        LobbyMessage::PlayerLeft { player } => {
            sink.emit(BackendEvent::PlayerDetached { player });
        }
        LobbyMessage::ReadyChanged { player, ready } => {
            sink.emit(BackendEvent::ReadyChanged { player, ready });
        }
        LobbyMessage::GameStarted => {
            sink.emit(BackendEvent::GameStarted);
        }
        other => debug!(?other, "unexpected message from host, ignoring"),
    }
}

fn attach(sink: &BackendSink, entry: RosterEntry, is_local: bool) {
    sink.emit(BackendEvent::PlayerAttached {
        player: entry.player,
        label: entry.label,
        is_local,
    });
    if entry.ready {
        sink.emit(BackendEvent::ReadyChanged {
            player: entry.player,
            ready: true,
        });
    }
}
