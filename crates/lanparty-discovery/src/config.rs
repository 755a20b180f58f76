//! Discovery configuration.

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Configuration for the broadcast announcer and listener.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// UDP port hosts broadcast to and clients listen on.
    pub port: u16,
    /// Destination address of announcements.
    pub broadcast_addr: IpAddr,
    /// How often hosts announce and listeners publish a peer snapshot.
    pub interval: Duration,
    /// A peer not heard from for this long is dropped from the snapshot.
    pub peer_ttl: Duration,
    /// Receive buffer size. Larger datagrams are truncated and fail to decode.
    pub buffer_size: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            port: 47777,
            broadcast_addr: IpAddr::V4(Ipv4Addr::BROADCAST),
            interval: Duration::from_secs(1),
            peer_ttl: Duration::from_secs(3),
            buffer_size: 1024,
        }
    }
}

impl DiscoveryConfig {
    const MIN_BUFFER_SIZE: usize = 64;

    /// Fix any out-of-range values so the config is safe to use.
    pub fn validated(mut self) -> Self {
        let defaults = Self::default();
        if self.port == 0 {
            warn!(default = defaults.port, "discovery port 0 is not joinable, using default");
            self.port = defaults.port;
        }
        if self.interval.is_zero() {
            warn!("discovery interval is zero, using default");
            self.interval = defaults.interval;
        }
        if self.peer_ttl <= self.interval {
            let ttl = self.interval * 3;
            warn!(
                ttl_ms = self.peer_ttl.as_millis() as u64,
                raised_ms = ttl.as_millis() as u64,
                "peer ttl must outlive the announce interval, raising"
            );
            self.peer_ttl = ttl;
        }
        if self.buffer_size < Self::MIN_BUFFER_SIZE {
            warn!(
                buffer_size = self.buffer_size,
                "discovery buffer too small, using default"
            );
            self.buffer_size = defaults.buffer_size;
        }
        self
    }
}
