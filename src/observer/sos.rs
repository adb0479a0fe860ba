//! Active emergency tracking.
//!
//! Presence of a node id as a key IS the activation flag; there is no
//! separate boolean to drift out of sync. Absence means cleared.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

use super::nodes::normalize_node_id;

#[derive(Debug, Clone, Serialize)]
pub struct SosRecord {
    pub node_id: String,
    /// Battery level at the moment of activation, when the node was known
    /// to the registry at that time.
    pub battery: Option<u8>,
    pub activated_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct SosRegistry {
    active: HashMap<String, SosRecord>,
}

impl SosRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Activate SOS for a node. Idempotent: re-activating overwrites the
    /// record, refreshing battery and timestamp.
    pub fn activate(&mut self, node_id: &str, battery: Option<u8>, now: DateTime<Utc>) {
        let node_id = normalize_node_id(node_id);
        self.active.insert(
            node_id.clone(),
            SosRecord {
                node_id,
                battery,
                activated_at: now,
            },
        );
    }

    /// Clear SOS for a node. Clearing a node that was never active is a
    /// no-op. Returns whether a record was actually removed.
    pub fn clear(&mut self, node_id: &str) -> bool {
        self.active.remove(&normalize_node_id(node_id)).is_some()
    }

    pub fn is_active(&self, node_id: &str) -> bool {
        self.active.contains_key(&normalize_node_id(node_id))
    }

    pub fn snapshot(&self) -> HashMap<String, SosRecord> {
        self.active.clone()
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activate_is_idempotent_and_refreshes() {
        let mut registry = SosRegistry::new();
        let first = Utc::now();
        registry.activate("a1", Some(80), first);
        let later = first + chrono::Duration::seconds(30);
        registry.activate("A1", Some(42), later);

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), 1);
        let record = &snapshot["A1"];
        assert_eq!(record.battery, Some(42));
        assert_eq!(record.activated_at, later);
    }

    #[test]
    fn clear_unknown_node_is_a_noop() {
        let mut registry = SosRegistry::new();
        assert!(!registry.clear("GHOST"));
        assert_eq!(registry.active_count(), 0);
    }

    #[test]
    fn clear_removes_the_record() {
        let mut registry = SosRegistry::new();
        registry.activate("a1", None, Utc::now());
        assert!(registry.is_active(" A1 "));
        assert!(registry.clear("a1"));
        assert!(!registry.is_active("A1"));
        assert!(!registry.clear("a1"));
    }
}
