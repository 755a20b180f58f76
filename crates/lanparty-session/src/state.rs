//! The session lifecycle.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where the local instance is in a session's lifecycle.
///
/// ```text
///             start_client_search()
///   Inactive ─────────────────────→ Pregame
///      │ ↑                             │
///      │ └──── reset / leave / stop ───┤
///      │                               │ join_specific()
///      │ start_host()                  ▼
///      │                           Connecting
///      │                               │ connected
///      ▼                               ▼
///   InLobby ←───────────────────────────┘
///      │ begin_game()
///      ▼
///   InGame
/// ```
///
/// There is exactly one current value and every change is an explicit
/// transition on [`SessionManager`](crate::SessionManager).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SessionState {
    /// No session and no discovery.
    #[default]
    Inactive,
    /// Searching for hosts, not connected to any.
    Pregame,
    /// Dialing a host, waiting for its welcome.
    Connecting,
    /// In a lobby, hosted or joined.
    InLobby,
    /// The lobby moved into active play.
    InGame,
}

impl SessionState {
    /// Whether a connection (or a pending one) exists.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Connecting | Self::InLobby | Self::InGame)
    }

    /// Whether players may be registered in this state.
    ///
    /// The player registry is only ever non-empty while this holds.
    pub fn allows_players(self) -> bool {
        self.is_active()
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Inactive => "inactive",
            Self::Pregame => "searching",
            Self::Connecting => "connecting",
            Self::InLobby => "in lobby",
            Self::InGame => "in game",
        };
        f.write_str(name)
    }
}
