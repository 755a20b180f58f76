//! UDP broadcast announcer and listener.
//!
//! A host runs an announcer task that sends its encoded [`Announcement`]
//! to the broadcast address on every tick. A client runs a listener task
//! that collects announcements into a [`PeerCache`] and, on every tick,
//! publishes the full current peer set as a [`DiscoveryTick`].
//!
//! Both tasks absorb socket failures: they log, and try again on the next
//! tick. The service itself only fails when a task cannot be set up.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use lanparty_protocol::{
    Announcement, ConnectionInfo, JsonCodec, PROTOCOL_VERSION, ProtocolError,
    decode_announcement, encode_announcement,
};
use lanparty_tick::{TickConfig, TickScheduler};
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use crate::{DiscoveryConfig, DiscoveryError, PeerCache};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// One refresh of the discovered peer set.
///
/// `generation` identifies the listener that produced it; ticks from a
/// listener that has since been stopped carry an older generation than
/// [`DiscoveryService::generation`] and must be ignored. Within one
/// generation `seq` increases by one per tick.
#[derive(Debug, Clone)]
pub struct DiscoveryTick {
    pub generation: u64,
    pub seq: u64,
    pub peers: Arc<[ConnectionInfo]>,
}

/// What the service is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryMode {
    Idle,
    Announcing,
    Listening,
}

// ---------------------------------------------------------------------------
// DiscoveryService
// ---------------------------------------------------------------------------

/// Announces this instance or listens for others, never both at once.
#[derive(Debug)]
pub struct DiscoveryService {
    config: DiscoveryConfig,
    ticks: mpsc::UnboundedSender<DiscoveryTick>,
    generation: u64,
    state: ServiceState,
}

#[derive(Debug)]
enum ServiceState {
    Idle,
    Announcing(Announcer),
    Listening(Listener),
}

impl DiscoveryService {
    /// Creates an idle service. Listener ticks are delivered on `ticks`.
    pub fn new(config: DiscoveryConfig, ticks: mpsc::UnboundedSender<DiscoveryTick>) -> Self {
        Self {
            config: config.validated(),
            ticks,
            generation: 0,
            state: ServiceState::Idle,
        }
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    pub fn mode(&self) -> DiscoveryMode {
        match self.state {
            ServiceState::Idle => DiscoveryMode::Idle,
            ServiceState::Announcing(_) => DiscoveryMode::Announcing,
            ServiceState::Listening(_) => DiscoveryMode::Listening,
        }
    }

    /// Generation of the current (or next) listener.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Starts announcing `announcement` as a joinable game.
    ///
    /// If already announcing, only the payload is replaced. A running
    /// listener is stopped first.
    pub fn start_as_host(&mut self, announcement: Announcement) -> Result<(), DiscoveryError> {
        if let ServiceState::Announcing(announcer) = &self.state {
            debug!(port = announcement.port, "already announcing, refreshing payload");
            return announcer.update(&announcement);
        }

        self.stop();
        let announcer = Announcer::spawn(&self.config, &announcement)?;
        info!(
            port = self.config.port,
            lobby_port = announcement.port,
            label = %announcement.label,
            "announcing game on LAN"
        );
        self.state = ServiceState::Announcing(announcer);
        Ok(())
    }

    /// Replaces the announced payload, e.g. after the player count changed.
    /// Does nothing unless announcing.
    pub fn update_announcement(&self, announcement: &Announcement) -> Result<(), DiscoveryError> {
        match &self.state {
            ServiceState::Announcing(announcer) => announcer.update(announcement),
            _ => {
                trace!("not announcing, ignoring announcement update");
                Ok(())
            }
        }
    }

    /// Starts listening for hosts. Idempotent while already listening; a
    /// running announcer is stopped first.
    pub fn start_as_client(&mut self) {
        if matches!(self.state, ServiceState::Listening(_)) {
            debug!("already listening for games");
            return;
        }

        self.stop();
        let listener = Listener::spawn(self.config.clone(), self.generation, self.ticks.clone());
        info!(
            port = self.config.port,
            generation = self.generation,
            "listening for games on LAN"
        );
        self.state = ServiceState::Listening(listener);
    }

    /// Stops announcing and listening and forgets every cached peer.
    ///
    /// Ticks already queued by the old listener become stale. Safe to call
    /// when idle.
    pub fn stop(&mut self) {
        match std::mem::replace(&mut self.state, ServiceState::Idle) {
            ServiceState::Idle => {}
            ServiceState::Announcing(announcer) => {
                announcer.abort();
                debug!("announcer stopped");
            }
            ServiceState::Listening(listener) => {
                listener.abort();
                debug!(generation = self.generation, "listener stopped");
            }
        }
        self.generation += 1;
    }

    /// The most recently published peer set. Empty unless listening.
    pub fn peers(&self) -> Arc<[ConnectionInfo]> {
        match &self.state {
            ServiceState::Listening(listener) => listener.snapshot.borrow().clone(),
            _ => empty_peers(),
        }
    }
}

impl Drop for DiscoveryService {
    fn drop(&mut self) {
        self.stop();
    }
}

fn empty_peers() -> Arc<[ConnectionInfo]> {
    Arc::from(Vec::new())
}

// ---------------------------------------------------------------------------
// Announcer
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Announcer {
    handle: JoinHandle<()>,
    payload: watch::Sender<Vec<u8>>,
}

impl Announcer {
    fn spawn(config: &DiscoveryConfig, announcement: &Announcement) -> Result<Self, DiscoveryError> {
        let packet = encode_announcement(&JsonCodec, announcement)?;
        let socket = create_broadcast_socket()?;
        let target = SocketAddr::new(config.broadcast_addr, config.port);
        let (payload, rx) = watch::channel(packet);
        let scheduler = TickScheduler::new(TickConfig {
            initial_jitter: config.interval / 4,
            ..TickConfig::every(config.interval)
        });

        let handle = tokio::spawn(announce_loop(socket, target, rx, scheduler));
        Ok(Self { handle, payload })
    }

    fn update(&self, announcement: &Announcement) -> Result<(), DiscoveryError> {
        let packet = encode_announcement(&JsonCodec, announcement)?;
        self.payload.send_replace(packet);
        Ok(())
    }

    fn abort(self) {
        self.handle.abort();
    }
}

impl Drop for Announcer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn announce_loop(
    socket: UdpSocket,
    target: SocketAddr,
    mut payload: watch::Receiver<Vec<u8>>,
    mut scheduler: TickScheduler,
) {
    loop {
        let packet = payload.borrow_and_update().clone();
        match socket.send_to(&packet, target).await {
            Ok(_) => trace!(%target, bytes = packet.len(), "announcement sent"),
            Err(err) => warn!(%target, "LAN announcement failed: {err}"),
        }
        scheduler.wait_for_tick().await;
    }
}

fn create_broadcast_socket() -> Result<UdpSocket, DiscoveryError> {
    let std_socket =
        std::net::UdpSocket::bind(SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0))?;
    std_socket.set_nonblocking(true)?;
    std_socket.set_broadcast(true)?;
    UdpSocket::from_std(std_socket).map_err(DiscoveryError::from)
}

// ---------------------------------------------------------------------------
// Listener
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Listener {
    handle: JoinHandle<()>,
    snapshot: watch::Receiver<Arc<[ConnectionInfo]>>,
}

impl Listener {
    fn spawn(
        config: DiscoveryConfig,
        generation: u64,
        ticks: mpsc::UnboundedSender<DiscoveryTick>,
    ) -> Self {
        let (snapshot_tx, snapshot) = watch::channel(empty_peers());
        let handle = tokio::spawn(listen_loop(config, generation, ticks, snapshot_tx));
        Self { handle, snapshot }
    }

    fn abort(self) {
        self.handle.abort();
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn listen_loop(
    config: DiscoveryConfig,
    generation: u64,
    ticks: mpsc::UnboundedSender<DiscoveryTick>,
    snapshot: watch::Sender<Arc<[ConnectionInfo]>>,
) {
    let mut scheduler = TickScheduler::every(config.interval);
    let mut cache = PeerCache::new(config.peer_ttl);
    let mut buf = vec![0u8; config.buffer_size];
    let mut seq = 0u64;
    let mut socket = bind_listener(config.port);

    loop {
        tokio::select! {
            result = recv_from(socket.as_ref(), &mut buf) => {
                match result {
                    Ok((len, source)) => handle_datagram(&buf[..len], source, &mut cache),
                    Err(err) => {
                        warn!(port = config.port, "LAN discovery recv error: {err}");
                        socket = None;
                    }
                }
            }
            _ = scheduler.wait_for_tick() => {
                if socket.is_none() {
                    socket = bind_listener(config.port);
                }
                for expired in cache.expire(Instant::now()) {
                    debug!(peer = %expired, "LAN game expired");
                }

                seq += 1;
                let peers = cache.snapshot();
                snapshot.send_replace(peers.clone());
                let tick = DiscoveryTick { generation, seq, peers };
                if ticks.send(tick).is_err() {
                    debug!(generation, "tick receiver gone, listener exiting");
                    return;
                }
            }
        }
    }
}

/// Binds the listening socket, logging instead of failing so the caller
/// can retry on its next tick.
fn bind_listener(port: u16) -> Option<UdpSocket> {
    match bind_lan_socket(port) {
        Ok(socket) => Some(socket),
        Err(err) => {
            warn!(port, "cannot bind discovery port, retrying next tick: {err}");
            None
        }
    }
}

fn bind_lan_socket(port: u16) -> Result<UdpSocket, DiscoveryError> {
    let std_socket =
        std::net::UdpSocket::bind(SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port))?;
    std_socket.set_nonblocking(true)?;
    std_socket.set_broadcast(true)?;
    UdpSocket::from_std(std_socket).map_err(DiscoveryError::from)
}

/// `recv_from` on the socket if there is one; pends forever otherwise.
async fn recv_from(
    socket: Option<&UdpSocket>,
    buf: &mut [u8],
) -> std::io::Result<(usize, SocketAddr)> {
    match socket {
        Some(socket) => socket.recv_from(buf).await,
        None => std::future::pending().await,
    }
}

fn handle_datagram(bytes: &[u8], source: SocketAddr, cache: &mut PeerCache) {
    let announcement = match decode_announcement(&JsonCodec, bytes) {
        Ok(announcement) => announcement,
        Err(ProtocolError::InvalidMagic) => return,
        Err(err) => {
            debug!(%source, "undecodable discovery packet: {err}");
            return;
        }
    };

    if announcement.version != PROTOCOL_VERSION {
        debug!(%source, version = announcement.version, "ignoring game with other protocol version");
        return;
    }
    if !announcement.has_room() {
        trace!(%source, "ignoring full game");
        return;
    }

    let peer = ConnectionInfo::new(source.ip(), announcement.port, announcement.label);
    if cache.record(peer.clone(), Instant::now()) {
        debug!(%peer, "LAN game discovered");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use std::time::Duration;

    fn source() -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::new(10, 1, 1, 7)), 50000)
    }

    fn packet(announcement: &Announcement) -> Vec<u8> {
        encode_announcement(&JsonCodec, announcement).unwrap()
    }

    #[test]
    fn test_handle_datagram_uses_source_ip_and_announced_port() {
        let mut cache = PeerCache::new(Duration::from_secs(3));

        handle_datagram(&packet(&Announcement::new(9100, "Den")), source(), &mut cache);

        let peers = cache.snapshot();
        assert_eq!(peers.len(), 1);
        assert_eq!(peers[0].socket_addr(), "10.1.1.7:9100".parse::<SocketAddr>().unwrap());
        assert_eq!(peers[0].label, "Den");
    }

    #[test]
    fn test_handle_datagram_ignores_foreign_and_garbled_packets() {
        let mut cache = PeerCache::new(Duration::from_secs(3));

        handle_datagram(b"hello there", source(), &mut cache);
        handle_datagram(b"LANPRTY1{not json", source(), &mut cache);

        assert!(cache.is_empty());
    }

    #[test]
    fn test_handle_datagram_ignores_other_versions_and_full_games() {
        let mut cache = PeerCache::new(Duration::from_secs(3));
        let mut old = Announcement::new(9100, "old");
        old.version = PROTOCOL_VERSION + 1;
        let mut full = Announcement::new(9101, "full");
        full.players = 4;
        full.max_players = 4;

        handle_datagram(&packet(&old), source(), &mut cache);
        handle_datagram(&packet(&full), source(), &mut cache);

        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_stop_when_idle_is_safe_and_bumps_generation() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut service = DiscoveryService::new(DiscoveryConfig::default(), tx);

        service.stop();
        service.stop();

        assert_eq!(service.mode(), DiscoveryMode::Idle);
        assert_eq!(service.generation(), 2);
        assert!(service.peers().is_empty());
    }
}
