//! LAN discovery for lanparty.
//!
//! - [`DiscoveryService`] broadcasts this instance's [`Announcement`] when
//!   hosting, or listens for other hosts when searching. While listening
//!   it publishes the full peer set on every tick as a [`DiscoveryTick`].
//! - [`PeerCache`] is the listener's TTL-bounded memory of announcing
//!   hosts.
//! - [`PeerRegistry`] sits on the consumer side and reconciles each
//!   reported set against the previous one, yielding add/remove deltas.
//!
//! ```text
//!  host: Announcer ──UDP broadcast──→ client: Listener → PeerCache
//!                                                 │ every tick
//!                                                 ▼
//!                                           DiscoveryTick → PeerRegistry::reconcile
//! ```
//!
//! [`Announcement`]: lanparty_protocol::Announcement

mod cache;
mod config;
mod error;
mod registry;
mod service;

pub use cache::PeerCache;
pub use config::DiscoveryConfig;
pub use error::DiscoveryError;
pub use registry::{PeerEntry, PeerRegistry, Reconciliation};
pub use service::{DiscoveryMode, DiscoveryService, DiscoveryTick};
