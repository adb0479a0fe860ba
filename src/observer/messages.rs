//! Append-only message history with a bounded recent-window view.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which side of the bridge a logged message came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Delivered by hardware over the serial link.
    Received,
    /// Submitted by an operator for transmission.
    Sent,
}

/// One logged message. Immutable once appended.
///
/// `packet_id` is opaque and used by consumers for deduplication and display
/// ordering; the log itself does not enforce uniqueness.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    pub packet_id: String,
    pub from_node: String,
    pub to: String,
    pub payload: String,
    pub rssi: i32,
    pub is_direct: bool,
    pub timestamp: DateTime<Utc>,
    pub direction: Direction,
}

#[derive(Debug, Default)]
pub struct MessageLog {
    entries: Vec<MessageRecord>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, record: MessageRecord) {
        self.entries.push(record);
    }

    /// The last `n` entries in insertion order, oldest of the window first.
    /// Cost scales with the window size, not the full history.
    pub fn recent(&self, n: usize) -> Vec<MessageRecord> {
        let start = self.entries.len().saturating_sub(n);
        self.entries[start..].to_vec()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
