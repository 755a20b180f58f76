//! Peer-list reconciliation.
//!
//! Discovery reports the full peer set on every tick. [`PeerRegistry`]
//! turns that stream of sets into add/remove deltas so that whatever is
//! attached to a peer (a list row, a pending connection) survives from
//! one tick to the next instead of being torn down and rebuilt.

use lanparty_protocol::ConnectionInfo;
use tracing::{debug, trace};

/// A known peer plus the ticks it was first and last reported in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerEntry {
    pub info: ConnectionInfo,
    pub first_seen: u64,
    pub last_seen: u64,
}

/// The delta produced by one [`PeerRegistry::reconcile`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Peers reported now but unknown before, in report order.
    pub added: Vec<ConnectionInfo>,
    /// Known peers no longer reported, in first-seen order.
    pub removed: Vec<ConnectionInfo>,
}

impl Reconciliation {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Known remote endpoints, deduplicated by `(address, port)` and kept in
/// first-seen order.
#[derive(Debug, Default)]
pub struct PeerRegistry {
    entries: Vec<PeerEntry>,
    last_tick: Option<u64>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconciles the set reported by tick `tick_seq` against the known
    /// peers.
    ///
    /// Ticks must be applied in order: a tick not newer than the last
    /// applied one is discarded and yields an empty delta. Peers present
    /// in both sets keep their entry; only `last_seen` and the label are
    /// refreshed, and a relabel alone is not a delta.
    pub fn reconcile(&mut self, tick_seq: u64, peers: &[ConnectionInfo]) -> Reconciliation {
        if let Some(last) = self.last_tick {
            if tick_seq <= last {
                debug!(tick_seq, last, "discarding stale peer tick");
                return Reconciliation::default();
            }
        }
        self.last_tick = Some(tick_seq);

        let mut delta = Reconciliation::default();

        self.entries.retain(|entry| {
            if peers.contains(&entry.info) {
                true
            } else {
                delta.removed.push(entry.info.clone());
                false
            }
        });

        for info in peers {
            match self.entries.iter_mut().find(|e| e.info == *info) {
                Some(entry) => {
                    entry.last_seen = tick_seq;
                    if entry.info.label != info.label {
                        debug!(peer = %info, old = %entry.info.label, "peer relabelled");
                        entry.info.label = info.label.clone();
                    }
                }
                None => {
                    delta.added.push(info.clone());
                    self.entries.push(PeerEntry {
                        info: info.clone(),
                        first_seen: tick_seq,
                        last_seen: tick_seq,
                    });
                }
            }
        }

        trace!(
            tick_seq,
            added = delta.added.len(),
            removed = delta.removed.len(),
            known = self.entries.len(),
            "peers reconciled"
        );
        delta
    }

    /// Sequence number of the last applied tick.
    pub fn last_tick(&self) -> Option<u64> {
        self.last_tick
    }

    /// Whether tick `tick_seq` would be discarded by [`reconcile`](Self::reconcile).
    pub fn is_stale(&self, tick_seq: u64) -> bool {
        self.last_tick.is_some_and(|last| tick_seq <= last)
    }

    /// The earliest discovered peer that is still present.
    pub fn first(&self) -> Option<&ConnectionInfo> {
        self.entries.first().map(|e| &e.info)
    }

    pub fn get(&self, info: &ConnectionInfo) -> Option<&PeerEntry> {
        self.entries.iter().find(|e| e.info == *info)
    }

    pub fn entries(&self) -> &[PeerEntry] {
        &self.entries
    }

    /// Known peers in first-seen order.
    pub fn peers(&self) -> Vec<ConnectionInfo> {
        self.entries.iter().map(|e| e.info.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forgets every peer and the tick ordering, returning what was known.
    ///
    /// Call this when discovery restarts; its tick numbering restarts too.
    pub fn clear(&mut self) -> Vec<ConnectionInfo> {
        self.last_tick = None;
        self.entries.drain(..).map(|e| e.info).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    fn peer(name: &str, last_octet: u8) -> ConnectionInfo {
        ConnectionInfo::new(IpAddr::V4(Ipv4Addr::new(192, 168, 0, last_octet)), 7000, name)
    }

    #[test]
    fn test_reconcile_replaces_a_keeps_b_adds_c() {
        let (a, b, c) = (peer("A", 1), peer("B", 2), peer("C", 3));
        let mut registry = PeerRegistry::new();
        registry.reconcile(1, &[a.clone(), b.clone()]);

        let delta = registry.reconcile(2, &[b.clone(), c.clone()]);

        assert_eq!(delta.added, vec![c.clone()]);
        assert_eq!(delta.removed, vec![a]);
        assert_eq!(registry.peers(), vec![b.clone(), c]);
        let kept = registry.get(&b).unwrap();
        assert_eq!(kept.first_seen, 1, "B keeps its original entry");
        assert_eq!(kept.last_seen, 2);
    }

    #[test]
    fn test_reconcile_empty_set_removes_everything() {
        let mut registry = PeerRegistry::new();
        registry.reconcile(1, &[peer("A", 1), peer("B", 2)]);

        let delta = registry.reconcile(2, &[]);

        assert!(delta.added.is_empty());
        assert_eq!(delta.removed.len(), 2);
        assert!(registry.is_empty());
        assert!(registry.first().is_none());
    }

    #[test]
    fn test_reconcile_same_set_is_empty_delta() {
        let mut registry = PeerRegistry::new();
        registry.reconcile(1, &[peer("A", 1)]);

        let delta = registry.reconcile(2, &[peer("A", 1)]);

        assert!(delta.is_empty());
    }

    #[test]
    fn test_reconcile_known_peer_picks_up_new_label() {
        let mut registry = PeerRegistry::new();
        registry.reconcile(1, &[peer("Den", 1)]);

        let delta = registry.reconcile(2, &[peer("Attic", 1)]);

        assert!(delta.is_empty(), "same endpoint, not a new peer");
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.peers()[0].label, "Attic");
        let entry = registry.get(&peer("Attic", 1)).unwrap();
        assert_eq!((entry.first_seen, entry.last_seen), (1, 2));
    }

    #[test]
    fn test_reconcile_deduplicates_by_endpoint() {
        let mut registry = PeerRegistry::new();

        let delta = registry.reconcile(1, &[peer("A", 1), peer("A renamed", 1)]);

        assert_eq!(delta.added.len(), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_reconcile_stale_tick_is_discarded() {
        let mut registry = PeerRegistry::new();
        registry.reconcile(5, &[peer("A", 1)]);

        assert!(registry.is_stale(4));
        assert!(!registry.is_stale(6));
        let delta = registry.reconcile(4, &[peer("B", 2)]);

        assert!(delta.is_empty());
        assert_eq!(registry.last_tick(), Some(5));
        assert_eq!(registry.peers(), vec![peer("A", 1)]);
        assert!(registry.reconcile(5, &[]).is_empty(), "same tick twice is stale too");
    }

    #[test]
    fn test_first_is_earliest_still_present() {
        let (a, b, c) = (peer("A", 1), peer("B", 2), peer("C", 3));
        let mut registry = PeerRegistry::new();
        registry.reconcile(1, &[a.clone()]);
        registry.reconcile(2, &[c.clone(), a.clone(), b.clone()]);
        assert_eq!(registry.first(), Some(&a));

        registry.reconcile(3, &[b.clone(), c.clone()]);

        assert_eq!(registry.first(), Some(&c), "C was reported before B");
    }

    #[test]
    fn test_clear_resets_tick_ordering() {
        let mut registry = PeerRegistry::new();
        registry.reconcile(10, &[peer("A", 1)]);

        let cleared = registry.clear();
        let delta = registry.reconcile(1, &[peer("B", 2)]);

        assert_eq!(cleared, vec![peer("A", 1)]);
        assert_eq!(delta.added, vec![peer("B", 2)]);
    }
}
