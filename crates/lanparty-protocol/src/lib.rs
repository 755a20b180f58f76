//! Wire protocol for lanparty.
//!
//! This crate defines the "language" hosts and clients speak:
//!
//! - **Types** ([`ConnectionInfo`], [`Announcement`], [`LobbyMessage`],
//!   [`PlayerId`]): the structures that travel on the wire.
//! - **Discovery framing** ([`encode_announcement`], [`decode_announcement`]):
//!   how an announcement is packed into a UDP datagram.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how messages are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]).
//!
//! # Architecture
//!
//! ```text
//! Transport (bytes) → Protocol (LobbyMessage / Announcement) → Session (players)
//! ```

mod codec;
mod discovery;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use discovery::{DISCOVERY_MAGIC, decode_announcement, encode_announcement};
pub use error::ProtocolError;
pub use types::{
    Announcement, ConnectionInfo, LobbyMessage, PROTOCOL_VERSION, PlayerId,
    RosterEntry,
};
