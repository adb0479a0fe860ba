//! # Serial Wire Protocol
//!
//! The gateway node emits one JSON object per line on its serial console.
//! Three packet shapes are recognized, keyed by a `type` field:
//!
//! - `heartbeat`: periodic liveness/status report from a node
//! - `sos`: emergency flag raised by a node
//! - `message`: free-text traffic relayed over the mesh
//!
//! Anything else on the line (boot chatter, firmware debug prints, partial
//! frames from an unplugged cable) is expected noise. [`decode_line`] rejects
//! those with a typed error the bridge drops at line granularity.
//!
//! Outbound commands travel the other way as plain text lines:
//! `"<destination>:<payload>\n"` for per-node addressing, or the bare payload
//! for broadcasts and the two emergency control tokens.

use serde::{Deserialize, Serialize};

/// Destination marker for traffic addressed to the whole mesh.
pub const BROADCAST: &str = "BROADCAST";

/// Control token: raise the mesh-wide emergency signal.
pub const SOS_ON: &str = "SOS_ON";

/// Control token: lower the mesh-wide emergency signal.
pub const SOS_OFF: &str = "SOS_OFF";

/// Why an inbound line could not be turned into a packet.
///
/// Every variant is droppable: a noisy link produces these continuously and
/// the caller is expected to log-and-continue, never to abort the read loop.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The line does not even look like a JSON object. Cheap pre-filter so
    /// firmware debug text never reaches the JSON parser.
    #[error("line is not a JSON object frame")]
    NotAnObject,

    /// The `type` field is missing or names a packet kind we do not handle.
    #[error("unrecognized packet type `{0}`")]
    UnrecognizedType(String),

    /// Structurally broken JSON, or a recognized type missing required fields.
    #[error("malformed packet: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Periodic liveness/status packet. `sos` mirrors the node's local emergency
/// switch state; `is_direct` marks the single node wired to the serial link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeartbeatPacket {
    pub node_id: String,
    pub battery: u8,
    pub rssi: i32,
    pub sos: bool,
    #[serde(default)]
    pub is_direct: bool,
}

/// Emergency activation packet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SosPacket {
    pub node_id: String,
    pub rssi: i32,
    #[serde(default)]
    pub is_direct: bool,
}

/// Free-text traffic from a node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagePacket {
    pub node_id: String,
    pub payload: String,
    pub rssi: i32,
    #[serde(default)]
    pub is_direct: bool,
}

/// A classified inbound frame.
#[derive(Debug, Clone)]
pub enum InboundPacket {
    Heartbeat(HeartbeatPacket),
    Sos(SosPacket),
    Message(MessagePacket),
}

/// Decode one raw serial line into a typed packet.
///
/// Leading/trailing whitespace is ignored. Lines that do not both start with
/// `{` and end with `}` are rejected before any parsing happens; firmware
/// emits plenty of plain-text diagnostics between packets.
pub fn decode_line(raw: &str) -> Result<InboundPacket, DecodeError> {
    let line = raw.trim();
    if !(line.starts_with('{') && line.ends_with('}')) {
        return Err(DecodeError::NotAnObject);
    }

    let value: serde_json::Value = serde_json::from_str(line)?;
    let kind = value
        .get("type")
        .and_then(|t| t.as_str())
        .unwrap_or_default()
        .to_string();

    match kind.as_str() {
        "heartbeat" => Ok(InboundPacket::Heartbeat(serde_json::from_value(value)?)),
        "sos" => Ok(InboundPacket::Sos(serde_json::from_value(value)?)),
        "message" => Ok(InboundPacket::Message(serde_json::from_value(value)?)),
        _ => Err(DecodeError::UnrecognizedType(kind)),
    }
}

/// A command awaiting transmission to hardware.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundCommand {
    pub to: String,
    pub payload: String,
}

impl OutboundCommand {
    pub fn new(to: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            payload: payload.into(),
        }
    }

    /// Command addressed to the whole mesh.
    pub fn broadcast(payload: impl Into<String>) -> Self {
        Self::new(BROADCAST, payload)
    }
}

/// Render a command as a newline-terminated wire line.
///
/// The emergency control tokens steer the whole mesh and bypass per-node
/// addressing no matter what destination the command carries. Broadcast
/// payloads likewise go out unprefixed.
pub fn encode_command(cmd: &OutboundCommand) -> String {
    let control = matches!(cmd.payload.as_str(), SOS_ON | SOS_OFF);
    if control || cmd.to == BROADCAST {
        format!("{}\n", cmd.payload)
    } else {
        format!("{}:{}\n", cmd.to, cmd.payload)
    }
}
