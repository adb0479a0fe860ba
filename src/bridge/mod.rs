//! # Serial Bridge
//!
//! The bridge is the only component that touches the physical link. It runs
//! a single sequential loop over two states:
//!
//! - **Disconnected**: retry opening the port on a fixed backoff.
//! - **Connected**: each iteration polls for one inbound line (decode,
//!   classify, forward to the observer), and on a coarser, independent
//!   cadence drains one command from the observer's outbound queue onto
//!   the wire.
//!
//! Failure handling is total tolerance: decode errors drop the line, HTTP
//! errors drop the exchange, link errors drop the connection and re-enter
//! Disconnected. Nothing here is ever fatal to the process, and the loop
//! never terminates on its own.

pub mod client;
pub mod link;

use chrono::Utc;
use log::{debug, info, warn};
use tokio::time::{sleep, Duration, Instant};
use uuid::Uuid;

use crate::config::SerialConfig;
use crate::logutil::escape_log;
use crate::observer::MessageSubmission;
use crate::protocol::{self, InboundPacket, MessagePacket, SosPacket, BROADCAST};

use client::ObserverClient;
use link::SerialLink;

/// Payload logged alongside an SOS activation so the alert shows up in the
/// message history, not just the SOS panel.
const SOS_ALERT_TEXT: &str = "SOS ALERT RECEIVED";

pub struct SerialBridge {
    settings: SerialConfig,
    client: ObserverClient,
    link: Option<SerialLink>,
}

impl SerialBridge {
    pub fn new(settings: SerialConfig, client: ObserverClient) -> Self {
        Self {
            settings,
            client,
            link: None,
        }
    }

    /// Run the bridge for the lifetime of the process.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        info!(
            "bridge starting on {} at {} baud",
            self.settings.port, self.settings.baud_rate
        );
        let reconnect_delay = Duration::from_millis(self.settings.reconnect_delay_ms);
        let outbound_interval = Duration::from_millis(self.settings.outbound_poll_ms);
        let idle_tick = Duration::from_millis(self.settings.idle_tick_ms);
        let mut next_outbound = Instant::now();

        loop {
            if self.link.is_none() {
                match SerialLink::open(&self.settings.port, self.settings.baud_rate) {
                    Ok(link) => {
                        info!("serial link open on {}", self.settings.port);
                        self.link = Some(link);
                    }
                    Err(e) => {
                        warn!(
                            "serial link unavailable ({e}); retrying in {}ms",
                            reconnect_delay.as_millis()
                        );
                        sleep(reconnect_delay).await;
                        continue;
                    }
                }
            }

            // Inbound: at most one line per iteration keeps the loop fair
            // between reads and the outbound cadence below.
            let inbound = match self.link.as_mut().map(SerialLink::poll_line) {
                Some(Ok(line)) => line,
                Some(Err(e)) => {
                    warn!("serial read failed ({e}); reconnecting");
                    self.link = None;
                    continue;
                }
                None => continue,
            };
            if let Some(line) = inbound {
                self.handle_line(&line).await;
            }

            if Instant::now() >= next_outbound {
                next_outbound = Instant::now() + outbound_interval;
                self.drain_one_outbound().await;
                if self.link.is_none() {
                    continue;
                }
            }

            sleep(idle_tick).await;
        }
    }

    /// Decode and route one inbound line. Undecodable lines are expected
    /// under a noisy link and dropped here, visibly.
    async fn handle_line(&self, raw: &str) {
        let packet = match protocol::decode_line(raw) {
            Ok(packet) => packet,
            Err(e) => {
                debug!("dropping line ({e}): {}", escape_log(raw));
                return;
            }
        };

        match packet {
            InboundPacket::Heartbeat(hb) => {
                debug!("heartbeat from {}", escape_log(&hb.node_id));
                if let Err(e) = self.client.submit_heartbeat(&hb).await {
                    warn!("heartbeat forward failed: {e}");
                }
            }
            InboundPacket::Sos(packet) => self.handle_sos(packet).await,
            InboundPacket::Message(packet) => self.handle_message(packet).await,
        }
    }

    /// An SOS packet both activates the emergency on the observer and lands
    /// an alert entry in the message history.
    async fn handle_sos(&self, packet: SosPacket) {
        info!("SOS raised by {}", escape_log(&packet.node_id));
        if let Err(e) = self.client.activate_sos(&packet.node_id).await {
            warn!("SOS activation forward failed: {e}");
        }
        let alert = MessageSubmission {
            packet_id: Uuid::new_v4().to_string(),
            from_node: packet.node_id,
            to: BROADCAST.to_string(),
            payload: SOS_ALERT_TEXT.to_string(),
            rssi: packet.rssi,
            is_direct: packet.is_direct,
            timestamp: Utc::now(),
        };
        if let Err(e) = self.client.submit_inbound_message(&alert).await {
            warn!("SOS alert logging failed: {e}");
        }
    }

    async fn handle_message(&self, packet: MessagePacket) {
        info!(
            "message from {}: {}",
            escape_log(&packet.node_id),
            escape_log(&packet.payload)
        );
        let sub = MessageSubmission {
            packet_id: Uuid::new_v4().to_string(),
            from_node: packet.node_id,
            to: BROADCAST.to_string(),
            payload: packet.payload,
            rssi: packet.rssi,
            is_direct: packet.is_direct,
            timestamp: Utc::now(),
        };
        if let Err(e) = self.client.submit_inbound_message(&sub).await {
            warn!("message forward failed: {e}");
        }
    }

    /// Pop one command from the observer and put it on the wire.
    ///
    /// The dequeue already consumed the command, so a write failure here
    /// drops it without re-queueing; the control plane is at-most-once.
    async fn drain_one_outbound(&mut self) {
        let cmd = match self.client.poll_outbound().await {
            Ok(Some(cmd)) => cmd,
            Ok(None) => return,
            Err(e) => {
                debug!("outbox poll failed: {e}");
                return;
            }
        };

        let wire = protocol::encode_command(&cmd);
        info!(
            "sending command to {}: {}",
            escape_log(&cmd.to),
            escape_log(&cmd.payload)
        );
        if let Some(link) = self.link.as_mut() {
            if let Err(e) = link.write_frame(&wire) {
                warn!("serial write failed, command dropped ({e}); reconnecting");
                self.link = None;
            }
        }
    }
}
