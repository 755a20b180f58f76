//! Session bookkeeping for lanparty.
//!
//! This crate holds the parts of a LAN session that are pure state:
//!
//! 1. **Lifecycle**: the [`SessionState`] machine and the [`SessionManager`]
//!    that moves through it while owning the active [`NetworkBackend`].
//! 2. **Players**: the [`PlayerRegistry`], which numbers players densely
//!    by registration order and tracks readiness.
//! 3. **Backend seam**: the [`NetworkBackend`] trait plus the
//!    [`BackendEvent`]s a backend reports through its [`BackendSink`].
//!
//! Nothing here spawns tasks or touches sockets on its own. The
//! controller in the `lanparty` crate owns one of each and serializes
//! every mutation on a single task.
//!
//! ```text
//! Controller (above)  ← composes discovery, manager, registry
//!     ↕
//! Session Layer (this crate)  ← who is connected, in which state
//!     ↕
//! Protocol Layer (below)  ← PlayerId, ConnectionInfo
//! ```

mod backend;
mod error;
mod manager;
mod player;
mod registry;
mod state;

pub use backend::{BackendEvent, BackendSink, NetworkBackend, StampedEvent};
pub use error::SessionError;
pub use manager::{Role, SessionManager};
pub use player::{Player, PlayerColor};
pub use registry::PlayerRegistry;
pub use state::SessionState;
