//! Events the controller publishes to presentation code.

use lanparty_protocol::{ConnectionInfo, PlayerId};
use lanparty_session::{Player, SessionState};

/// Text of the status messages shown while joining or auto-joining.
pub mod messages {
    pub const SEARCHING: &str = "Attempting to find an available game";
    pub const GAME_FOUND: &str = "Game Found!";
    pub const NO_GAMES: &str = "No Games Found. Making Game!";
    pub const JOINING: &str = "Joining Game";
    pub const JOIN_FAILED: &str = "Could not join game";
    pub const HOST_FAILED: &str = "Could not start game";
    pub const HOST_DISCONNECTED: &str = "Host disconnected";
    pub const NOT_ALL_READY: &str = "Not all players are ready";
}

/// Something that happened to the session.
///
/// Delivered on a broadcast channel; see
/// [`SessionHandle::subscribe`](crate::SessionHandle::subscribe). A
/// subscriber that falls too far behind misses events and is told so by
/// its receiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The session moved to a new state.
    StateChanged(SessionState),
    /// The full set of discovered games after a discovery tick.
    PeerListUpdated(Vec<ConnectionInfo>),
    /// A game appeared in the discovered set.
    PeerDiscovered(ConnectionInfo),
    /// A game disappeared from the discovered set.
    PeerLost(ConnectionInfo),
    PlayerRegistered(Player),
    PlayerUnregistered(Player),
    /// A player's lobby number changed because someone else registered.
    PlayerRenumbered(Player),
    PlayerReadyChanged { player: PlayerId, ready: bool },
    /// The local player became ready.
    LocalPlayerReady,
    /// The lobby moved into play.
    GameStarted,
    /// A human-readable status line.
    Message(String),
}
