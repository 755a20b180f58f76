//! Framing for discovery datagrams.
//!
//! A packet is [`DISCOVERY_MAGIC`] followed by the codec-encoded
//! [`Announcement`]. The magic lets listeners drop unrelated traffic on a
//! shared port without attempting a decode.

use crate::{Announcement, Codec, ProtocolError};

/// Magic bytes prefixed to every discovery packet.
pub const DISCOVERY_MAGIC: &[u8; 8] = b"LANPRTY1";

/// Encodes an announcement into a broadcastable datagram.
pub fn encode_announcement<C: Codec>(
    codec: &C,
    announcement: &Announcement,
) -> Result<Vec<u8>, ProtocolError> {
    let body = codec.encode(announcement)?;
    let mut packet = Vec::with_capacity(DISCOVERY_MAGIC.len() + body.len());
    packet.extend_from_slice(DISCOVERY_MAGIC);
    packet.extend_from_slice(&body);
    Ok(packet)
}

/// Decodes a datagram received on the discovery port.
///
/// Returns [`ProtocolError::InvalidMagic`] for foreign packets so callers
/// can ignore them quietly.
pub fn decode_announcement<C: Codec>(
    codec: &C,
    packet: &[u8],
) -> Result<Announcement, ProtocolError> {
    let body = packet
        .strip_prefix(DISCOVERY_MAGIC.as_slice())
        .ok_or(ProtocolError::InvalidMagic)?;
    codec.decode(body)
}
