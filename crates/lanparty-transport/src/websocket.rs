//! Lobby links over WebSocket, using `tokio-tungstenite`.
//!
//! Each stream is split into a sink and a source behind separate locks so
//! a task parked in [`Connection::recv`] never blocks a concurrent send.

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::{Connection, ConnectionId, Transport, TransportError};

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

fn wire(kind: io::ErrorKind, err: tungstenite::Error) -> io::Error {
    io::Error::new(kind, err)
}

/// A lobby listener that upgrades incoming TCP connections to WebSocket.
pub struct WebSocketTransport {
    listener: TcpListener,
}

impl WebSocketTransport {
    /// Opens the lobby listener on `addr`.
    ///
    /// Binding is synchronous so the backend can report the listening port
    /// before any task is spawned. Must be called from within a Tokio
    /// runtime.
    pub fn bind(addr: SocketAddr) -> Result<Self, TransportError> {
        let bind_err = |source| TransportError::Bind { addr, source };
        let std_listener = std::net::TcpListener::bind(addr).map_err(bind_err)?;
        std_listener.set_nonblocking(true).map_err(bind_err)?;
        let listener = TcpListener::from_std(std_listener).map_err(bind_err)?;
        tracing::info!(%addr, "lobby listener open");
        Ok(Self { listener })
    }
}

impl Transport for WebSocketTransport {
    type Connection = WebSocketConnection;
    type Error = TransportError;

    async fn accept(&mut self) -> Result<Self::Connection, Self::Error> {
        let (stream, peer) = self.listener.accept().await.map_err(TransportError::Accept)?;
        let _ = stream.set_nodelay(true);

        let ws = tokio_tungstenite::accept_async(MaybeTlsStream::Plain(stream))
            .await
            .map_err(|e| TransportError::Accept(wire(io::ErrorKind::InvalidData, e)))?;

        let conn = WebSocketConnection::from_stream(ws, peer);
        tracing::debug!(link = %conn.id, %peer, "player link accepted");
        Ok(conn)
    }

    fn local_addr(&self) -> Result<SocketAddr, Self::Error> {
        self.listener.local_addr().map_err(TransportError::Accept)
    }
}

/// One WebSocket lobby link, either accepted by a host or dialed by a
/// client.
pub struct WebSocketConnection {
    id: ConnectionId,
    peer: SocketAddr,
    sink: Mutex<SplitSink<WsStream, Message>>,
    source: Mutex<SplitStream<WsStream>>,
}

impl WebSocketConnection {
    /// Dials the host lobby at `addr` (`ws://addr`).
    pub async fn connect(addr: SocketAddr) -> Result<Self, TransportError> {
        let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
            .await
            .map_err(|e| TransportError::Dial {
                addr,
                source: wire(io::ErrorKind::ConnectionRefused, e),
            })?;
        let conn = Self::from_stream(ws, addr);
        tracing::debug!(link = %conn.id, %addr, "host link dialed");
        Ok(conn)
    }

    fn from_stream(ws: WsStream, peer: SocketAddr) -> Self {
        let id = ConnectionId::new(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed));
        let (sink, source) = ws.split();
        Self {
            id,
            peer,
            sink: Mutex::new(sink),
            source: Mutex::new(source),
        }
    }
}

impl Connection for WebSocketConnection {
    type Error = TransportError;

    async fn send(&self, data: &[u8]) -> Result<(), Self::Error> {
        let frame = Message::Binary(data.to_vec().into());
        self.sink
            .lock()
            .await
            .send(frame)
            .await
            .map_err(|e| TransportError::Send(wire(io::ErrorKind::BrokenPipe, e)))
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        let mut source = self.source.lock().await;
        while let Some(frame) = source.next().await {
            match frame {
                Ok(Message::Binary(data)) => return Ok(Some(data.into())),
                Ok(Message::Text(text)) => return Ok(Some(text.as_bytes().to_vec())),
                Ok(Message::Close(_)) => return Ok(None),
                // ping, pong and raw frames
                Ok(_) => continue,
                Err(tungstenite::Error::ConnectionClosed) => return Ok(None),
                Err(e) => {
                    return Err(TransportError::Receive(wire(io::ErrorKind::ConnectionReset, e)));
                }
            }
        }
        Ok(None)
    }

    async fn close(&self) -> Result<(), Self::Error> {
        match self.sink.lock().await.close().await {
            Ok(()) | Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                Ok(())
            }
            Err(e) => Err(TransportError::Send(wire(io::ErrorKind::BrokenPipe, e))),
        }
    }

    fn id(&self) -> ConnectionId {
        self.id
    }

    fn peer_addr(&self) -> SocketAddr {
        self.peer
    }
}
