//! Controller configuration.
//!
//! Every section has a `Default` that matches stock LAN play and a
//! `validated()` that repairs nonsensical values with a warning instead of
//! failing, so a half-edited config file still produces a working lobby.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

pub use lanparty_discovery::DiscoveryConfig;
use serde::{Deserialize, Serialize};
use tracing::warn;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// How this instance hosts and joins lobbies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Where the lobby listener binds when hosting. Port 0 picks a free one.
    pub bind_addr: SocketAddr,
    /// Name shown in game lists and rosters.
    pub label: String,
    /// Lobby capacity, including the host.
    pub max_players: u16,
    /// How long a join may take from dialing to the host's welcome.
    pub connect_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
            label: "lanparty".to_string(),
            max_players: 8,
            connect_timeout: Duration::from_secs(5),
        }
    }
}

impl SessionConfig {
    pub fn validated(mut self) -> Self {
        let defaults = Self::default();
        if self.max_players < 2 {
            warn!(max_players = self.max_players, "a lobby needs room for 2 players, raising");
            self.max_players = 2;
        }
        if self.connect_timeout.is_zero() {
            warn!("connect timeout is zero, using default");
            self.connect_timeout = defaults.connect_timeout;
        }
        if self.label.trim().is_empty() {
            self.label = defaults.label;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// AutoJoinConfig
// ---------------------------------------------------------------------------

/// Timing of the auto-join sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoJoinConfig {
    /// Pause before discovery starts, letting a previous session wind down.
    pub settle_delay: Duration,
    /// How many times to look for games before hosting.
    pub attempts: u32,
    /// Wait before each look.
    pub attempt_interval: Duration,
    /// Pause between finding a game and joining it.
    pub found_grace: Duration,
    /// Pause between giving up and hosting.
    pub fallback_delay: Duration,
}

impl Default for AutoJoinConfig {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(500),
            attempts: 3,
            attempt_interval: Duration::from_secs(1),
            found_grace: Duration::from_secs(1),
            fallback_delay: Duration::from_secs(1),
        }
    }
}

impl AutoJoinConfig {
    pub fn validated(mut self) -> Self {
        if self.attempts == 0 {
            warn!("auto-join needs at least one attempt, raising to 1");
            self.attempts = 1;
        }
        if self.attempt_interval.is_zero() {
            warn!("auto-join attempt interval is zero, using default");
            self.attempt_interval = Self::default().attempt_interval;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// LanPartyConfig
// ---------------------------------------------------------------------------

/// Everything the controller needs, grouped by concern.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LanPartyConfig {
    pub discovery: DiscoveryConfig,
    pub session: SessionConfig,
    pub auto_join: AutoJoinConfig,
}

impl LanPartyConfig {
    pub fn validated(self) -> Self {
        Self {
            discovery: self.discovery.validated(),
            session: self.session.validated(),
            auto_join: self.auto_join.validated(),
        }
    }
}
