//! Bridge-side client for the observer's HTTP control surface.
//!
//! Every call is fire-and-forget from the bridge's point of view: a failed
//! exchange is reported to the caller, logged, and dropped; the next cycle
//! retries with fresh data. Requests carry a timeout so a hung observer can
//! never stall the serial loop for long.

use std::time::Duration;

use crate::observer::{MessageSubmission, Summary};
use crate::protocol::{HeartbeatPacket, OutboundCommand};

pub struct ObserverClient {
    http: reqwest::Client,
    base_url: String,
}

impl ObserverClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn submit_heartbeat(&self, hb: &HeartbeatPacket) -> Result<(), reqwest::Error> {
        self.http
            .post(self.url("/heartbeat"))
            .json(hb)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    pub async fn submit_inbound_message(
        &self,
        sub: &MessageSubmission,
    ) -> Result<(), reqwest::Error> {
        self.http
            .post(self.url("/messages/inbound"))
            .json(sub)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    pub async fn activate_sos(&self, node_id: &str) -> Result<(), reqwest::Error> {
        self.http
            .post(self.url("/sos/on"))
            .json(&serde_json::json!({ "node_id": node_id }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Consume the head of the observer's outbound queue, if any command is
    /// pending. Safe to call on a short fixed interval indefinitely.
    pub async fn poll_outbound(&self) -> Result<Option<OutboundCommand>, reqwest::Error> {
        self.http
            .get(self.url("/outbox"))
            .send()
            .await?
            .error_for_status()?
            .json::<Option<OutboundCommand>>()
            .await
    }

    /// Root summary, used by the status CLI.
    pub async fn summary(&self) -> Result<Summary, reqwest::Error> {
        self.http
            .get(self.url("/"))
            .send()
            .await?
            .error_for_status()?
            .json::<Summary>()
            .await
    }
}
