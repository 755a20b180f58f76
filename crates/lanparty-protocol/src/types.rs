//! Core protocol types for lanparty's wire format.
//!
//! Two kinds of traffic exist on a LAN party:
//!
//! - **Discovery**: a host periodically broadcasts an [`Announcement`]
//!   over UDP so clients can list joinable games.
//! - **Lobby**: once a client dials a host, both sides exchange
//!   [`LobbyMessage`]s over the session connection to keep the player
//!   roster and readiness flags in sync.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::net::{IpAddr, SocketAddr};

use serde::{Deserialize, Serialize};

/// The current lobby protocol version. Hosts reject `Hello`s carrying
/// any other value.
pub const PROTOCOL_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A stable network identifier for a player's connection.
///
/// Assigned by the host when a connection attaches: the host itself is
/// always [`PlayerId::HOST`], clients get increasing ids after that. This
/// is NOT the player's lobby number; that one is recomputed from
/// registration order and may change as players come and go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl PlayerId {
    /// The id the host assigns to its own local player.
    pub const HOST: PlayerId = PlayerId(1);
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// ConnectionInfo
// ---------------------------------------------------------------------------

/// Identity of a discoverable host: where to dial it and what to call it.
///
/// Equality and hashing consider only `(address, port)`. A host that
/// renames itself between two announcements is still the same peer, so
/// it keeps its slot in any map keyed by `ConnectionInfo`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionInfo {
    /// IP address the host's lobby listener is reachable on.
    pub address: IpAddr,
    /// Port of the host's lobby listener.
    pub port: u16,
    /// Human-readable name shown in game lists.
    pub label: String,
}

impl ConnectionInfo {
    pub fn new(address: IpAddr, port: u16, label: impl Into<String>) -> Self {
        Self {
            address,
            port,
            label: label.into(),
        }
    }

    /// The socket address to dial.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.address, self.port)
    }
}

impl PartialEq for ConnectionInfo {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address && self.port == other.port
    }
}

impl Eq for ConnectionInfo {}

impl Hash for ConnectionInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.address.hash(state);
        self.port.hash(state);
    }
}

impl fmt::Display for ConnectionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label, self.socket_addr())
    }
}

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

/// What a host broadcasts to advertise itself as joinable.
///
/// The sender's IP is taken from the datagram source, so only the lobby
/// port travels in the packet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Announcement {
    /// Lobby protocol version of the host.
    pub version: u32,
    /// Port of the host's lobby listener.
    pub port: u16,
    /// Display name of the hosted game.
    pub label: String,
    /// Players currently in the lobby.
    pub players: u16,
    /// Lobby capacity.
    pub max_players: u16,
}

impl Announcement {
    pub fn new(port: u16, label: impl Into<String>) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            port,
            label: label.into(),
            players: 0,
            max_players: 0,
        }
    }

    /// Whether the announced lobby still has a free slot.
    ///
    /// A `max_players` of 0 means the host did not say.
    pub fn has_room(&self) -> bool {
        self.max_players == 0 || self.players < self.max_players
    }
}

// ---------------------------------------------------------------------------
// Lobby
// ---------------------------------------------------------------------------

/// One row of the roster a host sends to a freshly joined client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub player: PlayerId,
    pub label: String,
    pub ready: bool,
}

/// Messages exchanged over a session connection.
///
/// Internally tagged (`{ "type": "SetReady", "ready": true }`), matching
/// how the rest of the wire format is shaped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LobbyMessage {
    // -- Client → Host --
    /// First message a client sends after dialing.
    Hello { version: u32, label: String },

    /// The sender's own readiness changed.
    SetReady { ready: bool },

    /// Asks the host to clear `player`'s ready flag. The host answers
    /// everyone with a `ReadyChanged`.
    ClearReady { player: PlayerId },

    /// The client is leaving on purpose.
    Goodbye,

    // -- Host → Client --
    /// Reply to `Hello`: your id and everyone already in the lobby
    /// (including the host, excluding you).
    Welcome {
        player_id: PlayerId,
        roster: Vec<RosterEntry>,
    },

    /// Another player attached to the session.
    PlayerJoined { player: RosterEntry },

    /// A player detached from the session.
    PlayerLeft { player: PlayerId },

    /// Authoritative readiness update for `player`.
    ReadyChanged { player: PlayerId, ready: bool },

    /// The host moved the lobby into active play.
    GameStarted,

    /// The host refused the connection (version mismatch, lobby full).
    Rejected { reason: String },
}
