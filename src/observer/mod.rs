//! # Observer State Engine
//!
//! The observer owns the four state containers of the system (node
//! registry, message log, SOS registry, outbound command queue) and
//! exposes every operation of its control surface as a method. Handlers and
//! tests talk to [`Observer`]; nothing reaches the containers directly.
//!
//! Each container sits behind its own lock and every operation is atomic
//! with respect to concurrent callers. No invariant spans two containers,
//! so operations that touch more than one (SOS activation enqueues a
//! hardware command; outbound submission both logs and enqueues) take the
//! locks in sequence rather than together.
//!
//! All state is volatile; a restart starts from an empty field view.

pub mod http;
pub mod messages;
pub mod nodes;
pub mod outbox;
pub mod sos;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::MeshConfig;
use crate::protocol::{HeartbeatPacket, OutboundCommand, SOS_OFF, SOS_ON};

use messages::{Direction, MessageLog, MessageRecord};
use nodes::{normalize_node_id, NodeRecord, NodeRegistry, NodeStatus};
use outbox::Outbox;
use sos::{SosRecord, SosRegistry};

/// One state container shared across request handlers.
pub type Shared<T> = Arc<Mutex<T>>;

fn shared<T>(value: T) -> Shared<T> {
    Arc::new(Mutex::new(value))
}

/// Placeholder gateway id reported before any direct heartbeat arrives.
pub const GATEWAY_PLACEHOLDER: &str = "WAITING";

/// A submission rejected at the control-surface boundary.
///
/// Rejection happens before any container is touched, so a bad submission
/// never corrupts registry state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    #[error("node_id must not be empty")]
    EmptyNodeId,
    #[error("battery must be within 0-100")]
    BatteryOutOfRange,
    #[error("destination must not be empty")]
    EmptyDestination,
}

/// Stored node record plus the fields derived at query time.
#[derive(Debug, Clone, Serialize)]
pub struct NodeView {
    #[serde(flatten)]
    pub record: NodeRecord,
    pub status: NodeStatus,
    pub active_sos: bool,
}

/// An operator- or bridge-submitted message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageSubmission {
    pub packet_id: String,
    pub from_node: String,
    #[serde(default = "default_destination")]
    pub to: String,
    pub payload: String,
    pub rssi: i32,
    #[serde(default)]
    pub is_direct: bool,
    pub timestamp: DateTime<Utc>,
}

fn default_destination() -> String {
    crate::protocol::BROADCAST.to_string()
}

/// Field-wide counters for the root endpoint and the status CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    pub nodes: usize,
    pub messages: usize,
    pub active_sos: usize,
}

#[derive(Clone)]
pub struct Observer {
    nodes: Shared<NodeRegistry>,
    messages: Shared<MessageLog>,
    sos: Shared<SosRegistry>,
    outbox: Shared<Outbox>,
    recent_window: usize,
}

impl Observer {
    pub fn new(settings: &MeshConfig) -> Self {
        let stale = chrono::Duration::seconds(settings.stale_threshold_secs as i64);
        Self {
            nodes: shared(NodeRegistry::new(stale)),
            messages: shared(MessageLog::new()),
            sos: shared(SosRegistry::new()),
            outbox: shared(Outbox::new()),
            recent_window: settings.recent_window,
        }
    }

    /// Record a heartbeat, stamping receipt time. Returns the normalized
    /// node id.
    pub fn submit_heartbeat(&self, hb: &HeartbeatPacket) -> Result<String, SubmitError> {
        validate_node_id(&hb.node_id)?;
        if hb.battery > 100 {
            return Err(SubmitError::BatteryOutOfRange);
        }
        Ok(self.nodes.lock().record_heartbeat(hb, Utc::now()))
    }

    /// Log a message delivered by hardware. Appends to the message log only.
    pub fn submit_inbound_message(&self, sub: &MessageSubmission) -> Result<(), SubmitError> {
        validate_node_id(&sub.from_node)?;
        self.messages
            .lock()
            .append(to_record(sub, Direction::Received));
        Ok(())
    }

    /// Log a message submitted for sending AND queue it for the bridge.
    pub fn submit_outbound_message(&self, sub: &MessageSubmission) -> Result<(), SubmitError> {
        validate_node_id(&sub.from_node)?;
        if sub.to.trim().is_empty() {
            return Err(SubmitError::EmptyDestination);
        }
        self.messages.lock().append(to_record(sub, Direction::Sent));
        self.outbox
            .lock()
            .enqueue(OutboundCommand::new(sub.to.clone(), sub.payload.clone()));
        Ok(())
    }

    /// Pop the oldest pending hardware command; `None` when the queue is
    /// empty. This is the bridge's sole read path and is polled forever.
    pub fn poll_outbound_command(&self) -> Option<OutboundCommand> {
        self.outbox.lock().dequeue()
    }

    /// Activate SOS for a node and queue the mesh-wide `SOS_ON` broadcast.
    /// Idempotent on the registry side; each call queues one command.
    pub fn activate_sos(&self, node_id: &str) -> Result<(), SubmitError> {
        validate_node_id(node_id)?;
        let battery = self.nodes.lock().battery_of(node_id);
        self.sos.lock().activate(node_id, battery, Utc::now());
        self.outbox
            .lock()
            .enqueue(OutboundCommand::broadcast(SOS_ON));
        Ok(())
    }

    /// Clear SOS for a node and queue the mesh-wide `SOS_OFF` broadcast.
    /// Clearing a node that was never active still succeeds.
    pub fn clear_sos(&self, node_id: &str) -> Result<(), SubmitError> {
        validate_node_id(node_id)?;
        self.sos.lock().clear(node_id);
        self.outbox
            .lock()
            .enqueue(OutboundCommand::broadcast(SOS_OFF));
        Ok(())
    }

    /// Every known node with status recomputed now, keyed by node id.
    pub fn nodes(&self) -> HashMap<String, NodeView> {
        let active: Vec<String> = self.sos.lock().snapshot().into_keys().collect();
        let now = Utc::now();
        self.nodes
            .lock()
            .snapshot(now)
            .into_iter()
            .map(|(record, status)| {
                let active_sos = active.contains(&record.node_id);
                (
                    record.node_id.clone(),
                    NodeView {
                        record,
                        status,
                        active_sos,
                    },
                )
            })
            .collect()
    }

    /// The most recent messages (configured window, default 50), oldest
    /// first.
    pub fn recent_messages(&self) -> Vec<MessageRecord> {
        self.messages.lock().recent(self.recent_window)
    }

    pub fn sos_status(&self) -> HashMap<String, SosRecord> {
        self.sos.lock().snapshot()
    }

    /// The current wired gateway node id, once a direct heartbeat has been
    /// observed.
    pub fn gateway_node(&self) -> Option<String> {
        self.nodes.lock().gateway()
    }

    pub fn summary(&self) -> Summary {
        Summary {
            nodes: self.nodes.lock().len(),
            messages: self.messages.lock().len(),
            active_sos: self.sos.lock().active_count(),
        }
    }
}

fn validate_node_id(node_id: &str) -> Result<(), SubmitError> {
    if node_id.trim().is_empty() {
        return Err(SubmitError::EmptyNodeId);
    }
    Ok(())
}

fn to_record(sub: &MessageSubmission, direction: Direction) -> MessageRecord {
    MessageRecord {
        packet_id: sub.packet_id.clone(),
        from_node: normalize_node_id(&sub.from_node),
        to: sub.to.clone(),
        payload: sub.payload.clone(),
        rssi: sub.rssi,
        is_direct: sub.is_direct,
        timestamp: sub.timestamp,
        direction,
    }
}
