//! Shared helpers for controller tests.

#![allow(dead_code)]

use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use lanparty::{
    BackendEvent, BackendSink, ConnectionInfo, DiscoveryConfig, LanParty, LanPartyConfig,
    NetworkBackend, PlayerId, SessionConfig, SessionError, SessionEvent, SessionHandle,
};
use tokio::sync::broadcast;

pub const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

/// The id the mock hands the local player when joining.
pub const CLIENT_ID: PlayerId = PlayerId(2);

// =========================================================================
// MockBackend
// =========================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    StartHost,
    StartClient(SocketAddr),
    SetReady(bool),
    ClearReady(PlayerId),
    StartGame,
    Shutdown,
}

#[derive(Debug, Default)]
struct MockState {
    calls: Vec<Call>,
    sink: Option<BackendSink>,
    local: Option<PlayerId>,
    fail_host: bool,
    fail_client: bool,
    connect_on_join: bool,
}

/// A [`NetworkBackend`] that records every call and answers like a
/// cooperative network would.
///
/// - Hosting attaches the local host player.
/// - With `connect_on_join`, joining immediately connects and attaches
///   the remote host plus the local player as [`CLIENT_ID`].
/// - Readiness changes and clears are echoed back as `ReadyChanged`.
///
/// Clones share state, so a test can keep one while the controller owns
/// the other.
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connecting() -> Self {
        let mock = Self::new();
        mock.state.lock().unwrap().connect_on_join = true;
        mock
    }

    pub fn failing_host() -> Self {
        let mock = Self::new();
        mock.state.lock().unwrap().fail_host = true;
        mock
    }

    pub fn failing_client() -> Self {
        let mock = Self::new();
        mock.state.lock().unwrap().fail_client = true;
        mock
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(c)).count()
    }

    /// The sink of the current role, if one is active.
    pub fn sink(&self) -> Option<BackendSink> {
        self.state.lock().unwrap().sink.clone()
    }

    /// Emits `event` on the current role's sink.
    pub fn emit(&self, event: BackendEvent) {
        let sink = self.sink().expect("no active role to emit from");
        assert!(sink.emit(event), "controller stopped listening");
    }

    fn record(&self, call: Call) -> std::sync::MutexGuard<'_, MockState> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        state
    }
}

impl NetworkBackend for MockBackend {
    fn start_host(&mut self, sink: BackendSink) -> Result<SocketAddr, SessionError> {
        let mut state = self.record(Call::StartHost);
        if state.fail_host {
            return Err(SessionError::backend(std::io::Error::other("port taken")));
        }
        sink.emit(BackendEvent::PlayerAttached {
            player: PlayerId::HOST,
            label: "Host".into(),
            is_local: true,
        });
        state.local = Some(PlayerId::HOST);
        state.sink = Some(sink);
        Ok(SocketAddr::new(LOCALHOST, 9000))
    }

    fn start_client(&mut self, peer: &ConnectionInfo, sink: BackendSink) -> Result<(), SessionError> {
        let mut state = self.record(Call::StartClient(peer.socket_addr()));
        if state.fail_client {
            return Err(SessionError::backend(std::io::Error::other("unreachable")));
        }
        if state.connect_on_join {
            sink.emit(BackendEvent::Connected { local: CLIENT_ID });
            sink.emit(BackendEvent::PlayerAttached {
                player: PlayerId::HOST,
                label: peer.label.clone(),
                is_local: false,
            });
            sink.emit(BackendEvent::PlayerAttached {
                player: CLIENT_ID,
                label: "Me".into(),
                is_local: true,
            });
        }
        state.local = Some(CLIENT_ID);
        state.sink = Some(sink);
        Ok(())
    }

    fn set_ready(&mut self, ready: bool) {
        let state = self.record(Call::SetReady(ready));
        if let (Some(sink), Some(player)) = (&state.sink, state.local) {
            sink.emit(BackendEvent::ReadyChanged { player, ready });
        }
    }

    fn clear_ready(&mut self, player: PlayerId) {
        let state = self.record(Call::ClearReady(player));
        if let Some(sink) = &state.sink {
            sink.emit(BackendEvent::ReadyChanged {
                player,
                ready: false,
            });
        }
    }

    fn start_game(&mut self) {
        self.record(Call::StartGame);
    }

    fn shutdown(&mut self) {
        let mut state = self.record(Call::Shutdown);
        state.sink = None;
        state.local = None;
    }

    fn is_active(&self) -> bool {
        self.state.lock().unwrap().sink.is_some()
    }
}

// =========================================================================
// Controller helpers
// =========================================================================

/// A UDP port that was free a moment ago.
pub fn free_port() -> u16 {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).unwrap();
    socket.local_addr().unwrap().port()
}

/// Discovery on loopback so tests do not depend on the network setup.
pub fn loopback_discovery(port: u16, interval: Duration) -> DiscoveryConfig {
    DiscoveryConfig {
        port,
        broadcast_addr: LOCALHOST,
        interval,
        peer_ttl: interval * 4,
        ..Default::default()
    }
}

pub fn test_config(discovery_port: u16) -> LanPartyConfig {
    LanPartyConfig {
        discovery: loopback_discovery(discovery_port, Duration::from_millis(100)),
        session: SessionConfig {
            bind_addr: SocketAddr::new(LOCALHOST, 0),
            label: "Tester".into(),
            ..Default::default()
        },
        ..Default::default()
    }
}

pub fn spawn_controller(backend: MockBackend) -> SessionHandle {
    LanParty::builder()
        .config(test_config(free_port()))
        .build_with(backend)
}

pub fn peer(port: u16, label: &str) -> ConnectionInfo {
    ConnectionInfo::new(LOCALHOST, port, label)
}

/// Receives events until one matches `pred`, failing after five seconds.
pub async fn wait_for(
    events: &mut broadcast::Receiver<SessionEvent>,
    pred: impl Fn(&SessionEvent) -> bool,
) -> SessionEvent {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match events.recv().await {
                Ok(event) if pred(&event) => return event,
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => panic!("controller stopped"),
            }
        }
    })
    .await
    .expect("expected event never arrived")
}

/// Everything already delivered to `events`.
pub fn drain(events: &mut broadcast::Receiver<SessionEvent>) -> Vec<SessionEvent> {
    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    seen
}

/// Messages among `events`, in order.
pub fn messages(events: &[SessionEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            SessionEvent::Message(text) => Some(text.clone()),
            _ => None,
        })
        .collect()
}
