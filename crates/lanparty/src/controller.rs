//! The session controller actor.
//!
//! [`SessionController`] runs in its own Tokio task and is the only code
//! that touches the session state, the player registry and the peer
//! registry. Everything else reaches it through a [`SessionHandle`]:
//!
//! ```text
//!  SessionHandle ──commands──┐
//!  NetworkBackend ──events───┼──→ SessionController ──broadcast──→ SessionEvent subscribers
//!  DiscoveryService ──ticks──┘          │
//!                                        └── spawns the auto-join task, which talks back
//!                                            through ticketed commands
//! ```
//!
//! Backend events carry the epoch of the role that produced them and
//! discovery ticks the generation of the listener that produced them;
//! both are dropped when they no longer match, so nothing from a torn
//! down role or a stopped listener is ever applied.

use std::net::SocketAddr;

use lanparty_discovery::{DiscoveryMode, DiscoveryService, DiscoveryTick, PeerRegistry};
use lanparty_protocol::{Announcement, ConnectionInfo, PlayerId};
use lanparty_session::{
    BackendEvent, NetworkBackend, Player, PlayerRegistry, Role, SessionManager, SessionState,
    StampedEvent,
};
use lanparty_tick::{CancelHandle, Cancelled, Sequence};
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info, trace, warn};

use crate::autojoin::{AutoJoin, AutoJoinDriver, AutoJoinOutcome};
use crate::events::{SessionEvent, messages};
use crate::{LanPartyConfig, LanPartyError};

/// Pending commands before [`SessionHandle`] calls start to wait.
const COMMAND_CAPACITY: usize = 64;

/// Events a subscriber may lag behind before it starts missing some.
const EVENT_CAPACITY: usize = 256;

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

pub(crate) enum Command {
    StartHost,
    JoinSession(ConnectionInfo),
    LeaveSession,
    StopHosting,
    AutoJoin,
    StartSearch,
    RegisterPlayer {
        player: Player,
        reply: oneshot::Sender<bool>,
    },
    UnregisterPlayer {
        id: PlayerId,
        reply: oneshot::Sender<bool>,
    },
    SetReady(bool),
    ClearAllReady,
    StartGame {
        reply: oneshot::Sender<bool>,
    },
    Reset,
    Snapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },
    /// A step requested by the auto-join task holding `ticket`.
    AutoJoinStep {
        ticket: u64,
        step: AutoJoinStep,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

pub(crate) enum AutoJoinStep {
    Message(&'static str),
    StartSearch,
    PeerCount(oneshot::Sender<usize>),
    JoinFirst(oneshot::Sender<bool>),
    Host,
    Finished(Result<AutoJoinOutcome, Cancelled>),
}

/// A point-in-time copy of the controller's state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub state: SessionState,
    /// Where clients dial us, while hosting.
    pub host_addr: Option<SocketAddr>,
    /// Registered players in registration order.
    pub players: Vec<Player>,
    pub local_player: Option<Player>,
    /// Discovered games in first-seen order.
    pub peers: Vec<ConnectionInfo>,
    pub all_ready: bool,
}

// ---------------------------------------------------------------------------
// SessionHandle
// ---------------------------------------------------------------------------

/// Handle to a running [`SessionController`].
///
/// Cheap to clone. Commands never fail because of what the session is
/// doing: problems are reported as [`SessionEvent::Message`]s and logged.
/// The only error is [`LanPartyError::ControllerStopped`], once the
/// controller task is gone.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionHandle {
    /// Hosts a new game, tearing down whatever was active.
    pub async fn start_host(&self) -> Result<(), LanPartyError> {
        self.send(Command::StartHost).await
    }

    /// Joins `peer`, tearing down whatever was active.
    pub async fn join_session(&self, peer: ConnectionInfo) -> Result<(), LanPartyError> {
        self.send(Command::JoinSession(peer)).await
    }

    pub async fn leave_session(&self) -> Result<(), LanPartyError> {
        self.send(Command::LeaveSession).await
    }

    pub async fn stop_hosting(&self) -> Result<(), LanPartyError> {
        self.send(Command::StopHosting).await
    }

    /// Starts the auto-join sequence, cancelling one already running.
    pub async fn auto_join(&self) -> Result<(), LanPartyError> {
        self.send(Command::AutoJoin).await
    }

    /// Starts listening for games without joining one.
    pub async fn start_search(&self) -> Result<(), LanPartyError> {
        self.send(Command::StartSearch).await
    }

    /// Registers a player. `false` if one with the same id is registered.
    pub async fn register_player(&self, player: Player) -> Result<bool, LanPartyError> {
        self.request(|reply| Command::RegisterPlayer { player, reply }).await
    }

    /// Unregisters a player. `false` if it was not registered.
    pub async fn unregister_player(&self, id: PlayerId) -> Result<bool, LanPartyError> {
        self.request(|reply| Command::UnregisterPlayer { id, reply }).await
    }

    /// Sets the local player's readiness.
    pub async fn set_ready(&self, ready: bool) -> Result<(), LanPartyError> {
        self.send(Command::SetReady(ready)).await
    }

    /// Asks for every player's readiness to be cleared. Does not wait for
    /// the clears to be applied.
    pub async fn clear_all_ready(&self) -> Result<(), LanPartyError> {
        self.send(Command::ClearAllReady).await
    }

    /// Moves the hosted lobby into play. `false` unless hosting a lobby in
    /// which everyone is ready.
    pub async fn start_game(&self) -> Result<bool, LanPartyError> {
        self.request(|reply| Command::StartGame { reply }).await
    }

    /// Drops everything and goes back to `Inactive`.
    pub async fn reset(&self) -> Result<(), LanPartyError> {
        self.send(Command::Reset).await
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot, LanPartyError> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    pub async fn current_state(&self) -> Result<SessionState, LanPartyError> {
        Ok(self.snapshot().await?.state)
    }

    pub async fn all_ready(&self) -> Result<bool, LanPartyError> {
        Ok(self.snapshot().await?.all_ready)
    }

    pub async fn players(&self) -> Result<Vec<Player>, LanPartyError> {
        Ok(self.snapshot().await?.players)
    }

    pub async fn local_player(&self) -> Result<Option<Player>, LanPartyError> {
        Ok(self.snapshot().await?.local_player)
    }

    pub async fn peers(&self) -> Result<Vec<ConnectionInfo>, LanPartyError> {
        Ok(self.snapshot().await?.peers)
    }

    /// Subscribes to session events. Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Tears the session down and stops the controller task.
    pub async fn shutdown(&self) -> Result<(), LanPartyError> {
        self.request(|reply| Command::Shutdown { reply }).await
    }

    async fn send(&self, command: Command) -> Result<(), LanPartyError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| LanPartyError::ControllerStopped)
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, LanPartyError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(command(reply_tx)).await?;
        reply_rx.await.map_err(|_| LanPartyError::ControllerStopped)
    }
}

// ---------------------------------------------------------------------------
// SessionController
// ---------------------------------------------------------------------------

/// The running auto-join sequence, if any.
struct AutoJoinRun {
    ticket: u64,
    cancel: CancelHandle,
}

/// Owns the session and serializes every change to it.
pub struct SessionController<B: NetworkBackend> {
    config: LanPartyConfig,
    manager: SessionManager<B>,
    players: PlayerRegistry,
    peers: PeerRegistry,
    discovery: DiscoveryService,
    auto_join: Option<AutoJoinRun>,
    next_ticket: u64,
    events: broadcast::Sender<SessionEvent>,
    commands: mpsc::Receiver<Command>,
    /// Lets auto-join tasks send steps without keeping the controller alive.
    steps: mpsc::WeakSender<Command>,
    backend_events: mpsc::UnboundedReceiver<StampedEvent>,
    discovery_ticks: mpsc::UnboundedReceiver<DiscoveryTick>,
}

impl<B: NetworkBackend> SessionController<B> {
    /// Spawns a controller over `backend` and returns its handle.
    ///
    /// Must be called from within a Tokio runtime. The controller stops
    /// when every handle is dropped or on [`SessionHandle::shutdown`].
    pub fn spawn(config: LanPartyConfig, backend: B) -> SessionHandle {
        let (controller, handle) = Self::new(config, backend);
        tokio::spawn(controller.run());
        handle
    }

    fn new(config: LanPartyConfig, backend: B) -> (Self, SessionHandle) {
        let config = config.validated();
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CAPACITY);
        let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);
        let (backend_tx, backend_rx) = mpsc::unbounded_channel();
        let (tick_tx, tick_rx) = mpsc::unbounded_channel();

        let controller = Self {
            manager: SessionManager::new(backend, backend_tx),
            players: PlayerRegistry::new(),
            peers: PeerRegistry::new(),
            discovery: DiscoveryService::new(config.discovery.clone(), tick_tx),
            auto_join: None,
            next_ticket: 0,
            events: event_tx.clone(),
            commands: command_rx,
            steps: command_tx.downgrade(),
            backend_events: backend_rx,
            discovery_ticks: tick_rx,
            config,
        };
        let handle = SessionHandle {
            commands: command_tx,
            events: event_tx,
        };
        (controller, handle)
    }

    async fn run(mut self) {
        info!(label = %self.config.session.label, "session controller started");

        loop {
            tokio::select! {
                // Backend events and ticks go first so a command always
                // sees every event its predecessors caused.
                biased;
                Some(stamped) = self.backend_events.recv() => self.on_backend_event(stamped),
                Some(tick) = self.discovery_ticks.recv() => self.on_discovery_tick(tick),
                command = self.commands.recv() => {
                    let Some(command) = command else {
                        debug!("every session handle dropped");
                        self.close();
                        break;
                    };
                    if !self.handle_command(command) {
                        break;
                    }
                }
            }
        }

        info!("session controller stopped");
    }

    /// Returns `false` once the controller should stop.
    fn handle_command(&mut self, command: Command) -> bool {
        match command {
            Command::StartHost => {
                self.cancel_auto_join();
                self.host();
            }
            Command::JoinSession(peer) => {
                self.cancel_auto_join();
                self.message(messages::JOINING);
                self.join(&peer);
            }
            Command::LeaveSession => {
                self.cancel_auto_join();
                self.leave();
            }
            Command::StopHosting => {
                self.cancel_auto_join();
                self.stop_hosting();
            }
            Command::AutoJoin => self.start_auto_join(),
            Command::StartSearch => {
                self.cancel_auto_join();
                self.search();
            }
            Command::RegisterPlayer { player, reply } => {
                let _ = reply.send(self.register_player(player));
            }
            Command::UnregisterPlayer { id, reply } => {
                let _ = reply.send(self.unregister_player(id));
            }
            Command::SetReady(ready) => self.set_local_ready(ready),
            Command::ClearAllReady => self.clear_all_ready(),
            Command::StartGame { reply } => {
                let _ = reply.send(self.start_game());
            }
            Command::Reset => {
                self.cancel_auto_join();
                self.reset();
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
            Command::AutoJoinStep { ticket, step } => self.on_auto_join_step(ticket, step),
            Command::Shutdown { reply } => {
                self.close();
                let _ = reply.send(());
                return false;
            }
        }
        true
    }

    // -----------------------------------------------------------------------
    // Roles
    // -----------------------------------------------------------------------

    fn host(&mut self) {
        let before = self.manager.state();
        self.discovery.stop();
        self.forget_peers();
        self.clear_players();

        match self.manager.start_host() {
            Ok(addr) => {
                let announcement = self.announcement(addr.port());
                if let Err(err) = self.discovery.start_as_host(announcement) {
                    warn!("hosting without LAN announcements: {err}");
                }
            }
            Err(_) => self.message(messages::HOST_FAILED),
        }
        self.publish_state(before);
    }

    /// Returns whether dialing started.
    fn join(&mut self, peer: &ConnectionInfo) -> bool {
        let before = self.manager.state();
        self.discovery.stop();
        self.forget_peers();
        self.clear_players();

        let started = match self.manager.join_specific(peer) {
            Ok(()) => true,
            Err(_) => {
                self.message(messages::JOIN_FAILED);
                false
            }
        };
        self.publish_state(before);
        started
    }

    fn search(&mut self) {
        let before = self.manager.state();
        self.clear_players();
        self.manager.start_client_search();
        if self.discovery.mode() != DiscoveryMode::Listening {
            self.forget_peers();
            self.discovery.start_as_client();
        }
        self.publish_state(before);
    }

    fn leave(&mut self) {
        let before = self.manager.state();
        self.stop_discovery_and_players();
        self.manager.leave_session();
        self.publish_state(before);
    }

    fn stop_hosting(&mut self) {
        let before = self.manager.state();
        self.stop_discovery_and_players();
        self.manager.stop_hosting();
        self.publish_state(before);
    }

    fn reset(&mut self) {
        let before = self.manager.state();
        self.stop_discovery_and_players();
        if self.manager.reset() {
            info!("session reset");
        }
        self.publish_state(before);
    }

    fn close(&mut self) {
        self.cancel_auto_join();
        self.reset();
    }

    fn stop_discovery_and_players(&mut self) {
        self.discovery.stop();
        self.forget_peers();
        self.clear_players();
    }

    // -----------------------------------------------------------------------
    // Players
    // -----------------------------------------------------------------------

    /// Players exist only inside a session; anywhere else this is a no-op.
    fn register_player(&mut self, player: Player) -> bool {
        let state = self.manager.state();
        if !state.allows_players() {
            debug!(player = %player.id, %state, "no session to register a player in, ignoring");
            return false;
        }
        let numbers: Vec<(PlayerId, u32)> =
            self.players.players().iter().map(|p| (p.id, p.number)).collect();
        let registered = match self.players.register(player) {
            Some(registered) => registered.clone(),
            None => return false,
        };
        self.emit(SessionEvent::PlayerRegistered(registered));
        for (id, number) in numbers {
            if let Some(moved) = self.players.get(id).filter(|p| p.number != number) {
                debug!(player = %id, from = number, to = moved.number, "player renumbered");
                self.emit(SessionEvent::PlayerRenumbered(moved.clone()));
            }
        }
        self.refresh_announcement();
        true
    }

    fn unregister_player(&mut self, id: PlayerId) -> bool {
        let Some(player) = self.players.unregister(id) else {
            return false;
        };
        self.emit(SessionEvent::PlayerUnregistered(player));
        self.refresh_announcement();
        true
    }

    fn clear_players(&mut self) {
        for player in self.players.clear() {
            self.emit(SessionEvent::PlayerUnregistered(player));
        }
    }

    /// Readiness is owned by the host, so even a host's own flag goes
    /// through the backend and comes back as `ReadyChanged`.
    fn set_local_ready(&mut self, ready: bool) {
        if self.manager.role().is_none() {
            debug!(ready, "no session, ignoring readiness change");
            return;
        }
        self.manager.backend_mut().set_ready(ready);
    }

    fn clear_all_ready(&mut self) {
        if self.manager.role().is_none() {
            debug!("no session, nothing to clear");
            return;
        }
        let ids: Vec<PlayerId> = self.players.players().iter().map(|p| p.id).collect();
        debug!(players = ids.len(), "clearing readiness");
        let backend = self.manager.backend_mut();
        for id in ids {
            backend.clear_ready(id);
        }
    }

    fn apply_ready(&mut self, player: PlayerId, ready: bool) {
        match self.players.set_ready(player, ready) {
            Some(previous) if previous != ready => {
                debug!(%player, ready, "player readiness changed");
                self.emit(SessionEvent::PlayerReadyChanged { player, ready });
                let is_local = self.players.local_player().is_some_and(|p| p.id == player);
                if ready && is_local {
                    self.emit(SessionEvent::LocalPlayerReady);
                }
            }
            Some(_) => {}
            None => debug!(%player, "readiness for unknown player, ignoring"),
        }
    }

    fn start_game(&mut self) -> bool {
        let state = self.manager.state();
        if !self.manager.is_host() || state != SessionState::InLobby {
            debug!(%state, host = self.manager.is_host(), "not hosting a lobby, cannot start game");
            return false;
        }
        if !self.players.all_ready() {
            self.message(messages::NOT_ALL_READY);
            return false;
        }
        self.manager.backend_mut().start_game();
        self.enter_game()
    }

    fn enter_game(&mut self) -> bool {
        match self.manager.begin_game() {
            Ok(state) => {
                self.discovery.stop();
                self.forget_peers();
                info!(players = self.players.len(), "game started");
                self.emit(SessionEvent::StateChanged(state));
                self.emit(SessionEvent::GameStarted);
                true
            }
            Err(err) => {
                debug!("{err}");
                false
            }
        }
    }

    // -----------------------------------------------------------------------
    // Backend events
    // -----------------------------------------------------------------------

    fn on_backend_event(&mut self, stamped: StampedEvent) {
        if !self.manager.accepts(stamped.epoch) {
            debug!(
                epoch = stamped.epoch,
                current = self.manager.epoch(),
                event = ?stamped.event,
                "dropping event from a torn down session"
            );
            return;
        }

        match stamped.event {
            BackendEvent::Connected { local } => {
                info!(%local, "joined session");
                let before = self.manager.state();
                self.manager.mark_connected();
                self.publish_state(before);
            }
            BackendEvent::ConnectFailed { reason } => {
                warn!(%reason, "could not join session");
                self.message(messages::JOIN_FAILED);
                self.reset();
            }
            BackendEvent::PlayerAttached {
                player,
                label,
                is_local,
            } => {
                let player = if is_local {
                    Player::local(player, label)
                } else {
                    Player::new(player, label)
                };
                self.register_player(player);
            }
            BackendEvent::PlayerDetached { player } => {
                self.unregister_player(player);
            }
            BackendEvent::ReadyChanged { player, ready } => self.apply_ready(player, ready),
            BackendEvent::GameStarted => {
                self.enter_game();
            }
            BackendEvent::Disconnected { reason } => {
                warn!(%reason, "session connection lost");
                self.message(messages::HOST_DISCONNECTED);
                self.reset();
            }
        }
    }

    // -----------------------------------------------------------------------
    // Discovery
    // -----------------------------------------------------------------------

    fn on_discovery_tick(&mut self, tick: DiscoveryTick) {
        if tick.generation != self.discovery.generation() || self.peers.is_stale(tick.seq) {
            trace!(
                generation = tick.generation,
                seq = tick.seq,
                "dropping stale discovery tick"
            );
            return;
        }

        let delta = self.peers.reconcile(tick.seq, &tick.peers);
        for peer in delta.removed {
            info!(%peer, "game no longer announced");
            self.emit(SessionEvent::PeerLost(peer));
        }
        for peer in delta.added {
            info!(%peer, "game discovered");
            self.emit(SessionEvent::PeerDiscovered(peer));
        }
        self.emit(SessionEvent::PeerListUpdated(self.peers.peers()));
    }

    fn forget_peers(&mut self) {
        let forgotten = self.peers.clear();
        if forgotten.is_empty() {
            return;
        }
        for peer in forgotten {
            self.emit(SessionEvent::PeerLost(peer));
        }
        self.emit(SessionEvent::PeerListUpdated(Vec::new()));
    }

    fn announcement(&self, port: u16) -> Announcement {
        let mut announcement = Announcement::new(port, self.config.session.label.clone());
        announcement.players = u16::try_from(self.players.len()).unwrap_or(u16::MAX);
        announcement.max_players = self.config.session.max_players;
        announcement
    }

    fn refresh_announcement(&self) {
        let Some(Role::Host { addr }) = self.manager.role() else {
            return;
        };
        if let Err(err) = self.discovery.update_announcement(&self.announcement(addr.port())) {
            warn!("failed to refresh announcement: {err}");
        }
    }

    // -----------------------------------------------------------------------
    // Auto-join
    // -----------------------------------------------------------------------

    fn start_auto_join(&mut self) {
        self.cancel_auto_join();
        self.next_ticket += 1;
        let ticket = self.next_ticket;
        let (mut sequence, cancel) = Sequence::new();
        self.auto_join = Some(AutoJoinRun { ticket, cancel });
        info!(ticket, "auto-join started");

        let coordinator = AutoJoin::new(self.config.auto_join.clone());
        let mut driver = ControllerDriver {
            ticket,
            commands: self.steps.clone(),
        };
        tokio::spawn(async move {
            let outcome = coordinator.run(&mut sequence, &mut driver).await;
            driver.send(AutoJoinStep::Finished(outcome)).await;
        });
    }

    fn cancel_auto_join(&mut self) {
        if let Some(run) = self.auto_join.take() {
            run.cancel.cancel();
            info!(ticket = run.ticket, "auto-join cancelled");
        }
    }

    fn on_auto_join_step(&mut self, ticket: u64, step: AutoJoinStep) {
        let current = self.auto_join.as_ref().is_some_and(|run| run.ticket == ticket);
        if !current {
            // Dropping a reply sender tells the task it was cancelled.
            debug!(ticket, "dropping step of a cancelled auto-join");
            return;
        }

        match step {
            AutoJoinStep::Message(text) => self.message(text),
            AutoJoinStep::StartSearch => self.search(),
            AutoJoinStep::PeerCount(reply) => {
                let _ = reply.send(self.peers.len());
            }
            AutoJoinStep::JoinFirst(reply) => {
                let joined = match self.peers.first().cloned() {
                    Some(peer) => self.join(&peer),
                    None => false,
                };
                let _ = reply.send(joined);
            }
            AutoJoinStep::Host => self.host(),
            AutoJoinStep::Finished(outcome) => {
                self.auto_join = None;
                debug!(ticket, ?outcome, "auto-join finished");
            }
        }
    }

    // -----------------------------------------------------------------------
    // Events
    // -----------------------------------------------------------------------

    fn snapshot(&self) -> SessionSnapshot {
        let host_addr = match self.manager.role() {
            Some(Role::Host { addr }) => Some(*addr),
            _ => None,
        };
        SessionSnapshot {
            state: self.manager.state(),
            host_addr,
            players: self.players.players().to_vec(),
            local_player: self.players.local_player().cloned(),
            peers: self.peers.peers(),
            all_ready: self.players.all_ready(),
        }
    }

    fn publish_state(&self, before: SessionState) {
        let now = self.manager.state();
        if now != before {
            self.emit(SessionEvent::StateChanged(now));
        }
    }

    fn message(&self, text: &str) {
        info!(message = text, "session status");
        self.emit(SessionEvent::Message(text.to_string()));
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

// ---------------------------------------------------------------------------
// ControllerDriver
// ---------------------------------------------------------------------------

/// Runs auto-join steps on the controller task.
///
/// Replies that never come (the controller dropped a stale step, or is
/// gone) read as "nothing found", and the sequence's own cancellation
/// check stops it right after.
struct ControllerDriver {
    ticket: u64,
    commands: mpsc::WeakSender<Command>,
}

impl ControllerDriver {
    async fn send(&self, step: AutoJoinStep) {
        let Some(commands) = self.commands.upgrade() else {
            return;
        };
        let _ = commands
            .send(Command::AutoJoinStep {
                ticket: self.ticket,
                step,
            })
            .await;
    }
}

impl AutoJoinDriver for ControllerDriver {
    async fn message(&mut self, text: &'static str) {
        self.send(AutoJoinStep::Message(text)).await;
    }

    async fn start_search(&mut self) {
        self.send(AutoJoinStep::StartSearch).await;
    }

    async fn peer_count(&mut self) -> usize {
        let (tx, rx) = oneshot::channel();
        self.send(AutoJoinStep::PeerCount(tx)).await;
        rx.await.unwrap_or(0)
    }

    async fn join_first(&mut self) -> bool {
        let (tx, rx) = oneshot::channel();
        self.send(AutoJoinStep::JoinFirst(tx)).await;
        rx.await.unwrap_or(false)
    }

    async fn host(&mut self) {
        self.send(AutoJoinStep::Host).await;
    }
}
