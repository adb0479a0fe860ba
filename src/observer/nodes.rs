//! Node registry: last-known state per node plus liveness classification.
//!
//! A record appears after the first heartbeat from a node and is then only
//! ever updated in place; operators keep permanent visibility of every node
//! the mesh has ever surfaced. `online`/`offline` is derived at query time
//! from heartbeat recency, never stored.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;

use crate::protocol::HeartbeatPacket;

/// Canonical form of a radio-supplied node identifier.
///
/// Firmware builds disagree on casing and some pad with whitespace; all
/// variants must collapse to a single registry entry.
pub fn normalize_node_id(raw: &str) -> String {
    raw.trim().to_uppercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    Online,
    Offline,
}

/// Last-known state for one node, as reported by its most recent heartbeat.
#[derive(Debug, Clone, Serialize)]
pub struct NodeRecord {
    pub node_id: String,
    pub battery: u8,
    pub rssi: i32,
    pub sos: bool,
    pub is_direct: bool,
    pub last_seen: DateTime<Utc>,
}

#[derive(Debug)]
pub struct NodeRegistry {
    nodes: HashMap<String, NodeRecord>,
    gateway: Option<String>,
    stale_threshold: Duration,
}

impl NodeRegistry {
    pub fn new(stale_threshold: Duration) -> Self {
        Self {
            nodes: HashMap::new(),
            gateway: None,
            stale_threshold,
        }
    }

    /// Upsert the record for a node and stamp `last_seen`.
    ///
    /// A direct heartbeat also claims the gateway slot, last writer wins:
    /// only one node is wired to the serial link, but that node repeats
    /// `is_direct` on every keep-alive.
    ///
    /// Returns the normalized node id.
    pub fn record_heartbeat(&mut self, hb: &HeartbeatPacket, now: DateTime<Utc>) -> String {
        let node_id = normalize_node_id(&hb.node_id);
        if hb.is_direct {
            self.gateway = Some(node_id.clone());
        }
        self.nodes.insert(
            node_id.clone(),
            NodeRecord {
                node_id: node_id.clone(),
                battery: hb.battery,
                rssi: hb.rssi,
                sos: hb.sos,
                is_direct: hb.is_direct,
                last_seen: now,
            },
        );
        node_id
    }

    /// All records with status recomputed against `now`.
    pub fn snapshot(&self, now: DateTime<Utc>) -> Vec<(NodeRecord, NodeStatus)> {
        self.nodes
            .values()
            .map(|record| (record.clone(), self.classify(record, now)))
            .collect()
    }

    fn classify(&self, record: &NodeRecord, now: DateTime<Utc>) -> NodeStatus {
        if now - record.last_seen < self.stale_threshold {
            NodeStatus::Online
        } else {
            NodeStatus::Offline
        }
    }

    /// The node currently wired to the serial link, if any direct heartbeat
    /// has been observed yet.
    pub fn gateway(&self) -> Option<String> {
        self.gateway.clone()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Battery level from the last heartbeat of `node_id`, if ever seen.
    pub fn battery_of(&self, node_id: &str) -> Option<u8> {
        self.nodes
            .get(&normalize_node_id(node_id))
            .map(|r| r.battery)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heartbeat(node_id: &str) -> HeartbeatPacket {
        HeartbeatPacket {
            node_id: node_id.to_string(),
            battery: 75,
            rssi: -60,
            sos: false,
            is_direct: false,
        }
    }

    #[test]
    fn normalization_is_idempotent() {
        let once = normalize_node_id(" node1 ");
        assert_eq!(once, "NODE1");
        assert_eq!(normalize_node_id(&once), once);
    }

    #[test]
    fn casing_variants_collapse_to_one_entry() {
        let mut registry = NodeRegistry::new(Duration::seconds(5));
        let now = Utc::now();
        registry.record_heartbeat(&heartbeat("node1"), now);
        registry.record_heartbeat(&heartbeat(" NODE1 "), now);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn liveness_flips_exactly_at_threshold() {
        let mut registry = NodeRegistry::new(Duration::seconds(5));
        let seen = Utc::now();
        registry.record_heartbeat(&heartbeat("A1"), seen);

        let status_at = |now| registry.snapshot(now)[0].1;
        assert_eq!(status_at(seen), NodeStatus::Online);
        assert_eq!(
            status_at(seen + Duration::milliseconds(4999)),
            NodeStatus::Online
        );
        assert_eq!(status_at(seen + Duration::seconds(5)), NodeStatus::Offline);
        assert_eq!(status_at(seen + Duration::seconds(60)), NodeStatus::Offline);
    }

    #[test]
    fn offline_nodes_are_never_evicted() {
        let mut registry = NodeRegistry::new(Duration::seconds(5));
        let seen = Utc::now();
        registry.record_heartbeat(&heartbeat("A1"), seen);
        let snapshot = registry.snapshot(seen + Duration::days(30));
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].1, NodeStatus::Offline);
    }

    #[test]
    fn direct_heartbeat_claims_gateway_last_writer_wins() {
        let mut registry = NodeRegistry::new(Duration::seconds(5));
        let now = Utc::now();
        assert_eq!(registry.gateway(), None);

        let mut hb = heartbeat("a1");
        hb.is_direct = true;
        registry.record_heartbeat(&hb, now);
        assert_eq!(registry.gateway(), Some("A1".to_string()));

        // Relayed heartbeats never steal the slot.
        registry.record_heartbeat(&heartbeat("b2"), now);
        assert_eq!(registry.gateway(), Some("A1".to_string()));

        let mut hb = heartbeat("b2");
        hb.is_direct = true;
        registry.record_heartbeat(&hb, now);
        assert_eq!(registry.gateway(), Some("B2".to_string()));
    }
}
