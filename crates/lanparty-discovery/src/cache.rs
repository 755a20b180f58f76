//! The listener's view of who has been announcing recently.

use std::sync::Arc;
use std::time::Duration;

use lanparty_protocol::ConnectionInfo;
use tokio::time::Instant;

#[derive(Debug)]
struct CachedPeer {
    info: ConnectionInfo,
    last_seen: Instant,
}

/// Announcing hosts heard within the last `ttl`, in first-seen order.
///
/// Owned by the listener task; the rest of the system only ever sees the
/// immutable [`snapshot`](Self::snapshot).
#[derive(Debug)]
pub struct PeerCache {
    ttl: Duration,
    entries: Vec<CachedPeer>,
}

impl PeerCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Vec::new(),
        }
    }

    /// Records an announcement from `info` at `now`.
    ///
    /// Returns `true` if the peer was not cached yet. A known peer keeps
    /// its position; only its label and last-seen time are refreshed.
    pub fn record(&mut self, info: ConnectionInfo, now: Instant) -> bool {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.info == info) {
            entry.info.label = info.label;
            entry.last_seen = now;
            false
        } else {
            self.entries.push(CachedPeer {
                info,
                last_seen: now,
            });
            true
        }
    }

    /// Drops every peer silent for longer than the TTL and returns them.
    pub fn expire(&mut self, now: Instant) -> Vec<ConnectionInfo> {
        let ttl = self.ttl;
        let mut expired = Vec::new();
        self.entries.retain(|entry| {
            if now.saturating_duration_since(entry.last_seen) > ttl {
                expired.push(entry.info.clone());
                false
            } else {
                true
            }
        });
        expired
    }

    /// The current peer set.
    pub fn snapshot(&self) -> Arc<[ConnectionInfo]> {
        self.entries.iter().map(|e| e.info.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
