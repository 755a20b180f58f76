//! # lanparty
//!
//! Find, host and join multiplayer games on the local network.
//!
//! A [`SessionController`] owns one session. It listens for games that
//! other instances announce over UDP broadcast, hosts or joins a lobby
//! over WebSocket, keeps the player roster and everyone's readiness in
//! sync, and can look for a game on its own and fall back to hosting
//! one ([`SessionHandle::auto_join`]).
//!
//! Presentation code drives it through a cloneable [`SessionHandle`] and
//! watches [`SessionEvent`]s on a broadcast channel.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lanparty::prelude::*;
//!
//! # async fn example() -> Result<(), LanPartyError> {
//! let session = LanParty::builder().label("Den").build();
//! let mut events = session.subscribe();
//!
//! session.auto_join().await?;
//! while let Ok(event) = events.recv().await {
//!     if let SessionEvent::StateChanged(SessionState::InLobby) = event {
//!         session.set_ready(true).await?;
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Layers
//!
//! ```text
//! lanparty-transport   WebSocket listener and dialer
//! lanparty-protocol    announcements, lobby messages, codec
//! lanparty-tick        tick scheduler, cancellable sequences
//! lanparty-discovery   UDP announcer/listener, peer reconciliation
//! lanparty-session     session state machine, player registry
//! lanparty             controller, auto-join, LAN backend
//! ```

mod autojoin;
mod backend;
mod builder;
mod client;
mod config;
mod controller;
mod error;
mod events;
mod host;

pub use autojoin::{AutoJoin, AutoJoinDriver, AutoJoinOutcome};
pub use backend::LanBackend;
pub use builder::{LanParty, LanPartyBuilder};
pub use config::{AutoJoinConfig, DiscoveryConfig, LanPartyConfig, SessionConfig};
pub use controller::{SessionController, SessionHandle, SessionSnapshot};
pub use error::LanPartyError;
pub use events::{SessionEvent, messages};

pub use lanparty_discovery::PeerRegistry;
pub use lanparty_protocol::{Announcement, ConnectionInfo, PlayerId};
pub use lanparty_session::{
    BackendEvent, BackendSink, NetworkBackend, Player, PlayerColor, PlayerRegistry,
    SessionError, SessionState,
};
pub use lanparty_tick::{CancelHandle, Cancelled, Sequence};

/// Convenience re-exports for typical use.
///
/// ```rust
/// use lanparty::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        ConnectionInfo, LanParty, LanPartyBuilder, LanPartyConfig, LanPartyError, Player,
        PlayerColor, PlayerId, SessionEvent, SessionHandle, SessionSnapshot, SessionState,
    };
}
