//! # Configuration
//!
//! TOML configuration shared by the observer and bridge processes, with
//! sensible defaults for every tuning knob so a minimal file only has to
//! name the serial port and the observer address.
//!
//! ```toml
//! [observer]
//! bind_addr = "127.0.0.1:8080"
//! base_url = "http://127.0.0.1:8080"
//!
//! [serial]
//! port = "/dev/ttyUSB0"
//! baud_rate = 115200
//!
//! [logging]
//! level = "info"
//! ```

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub observer: ObserverConfig,
    pub serial: SerialConfig,
    #[serde(default)]
    pub mesh: MeshConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObserverConfig {
    /// Listen address for `meshobserver serve`.
    pub bind_addr: String,
    /// Where the bridge and status CLI reach the observer.
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerialConfig {
    pub port: String,
    pub baud_rate: u32,
    /// Backoff between reopen attempts while the link is down.
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
    /// Cadence for draining the observer's outbound command queue,
    /// independent of the fast inbound poll.
    #[serde(default = "default_outbound_poll_ms")]
    pub outbound_poll_ms: u64,
    /// Idle sleep per loop iteration.
    #[serde(default = "default_idle_tick_ms")]
    pub idle_tick_ms: u64,
    /// Per-request timeout for bridge-to-observer HTTP exchanges.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// State-engine tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeshConfig {
    /// A node with no heartbeat for this long is classified offline.
    #[serde(default = "default_stale_threshold_secs")]
    pub stale_threshold_secs: u64,
    /// How many recent messages the history endpoint returns.
    #[serde(default = "default_recent_window")]
    pub recent_window: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

fn default_reconnect_delay_ms() -> u64 {
    2000
}

fn default_outbound_poll_ms() -> u64 {
    200
}

fn default_idle_tick_ms() -> u64 {
    20
}

fn default_request_timeout_secs() -> u64 {
    5
}

fn default_stale_threshold_secs() -> u64 {
    5
}

fn default_recent_window() -> usize {
    50
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            stale_threshold_secs: default_stale_threshold_secs(),
            recent_window: default_recent_window(),
        }
    }
}

impl Config {
    /// Load configuration from a file.
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("failed to parse config file {}: {}", path, e))?;

        Ok(config)
    }

    /// Write a starter configuration file.
    pub async fn create_default(path: &str) -> Result<()> {
        let content = toml::to_string_pretty(&Config::default())
            .map_err(|e| anyhow!("failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("failed to write config file {}: {}", path, e))?;

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            observer: ObserverConfig {
                bind_addr: "127.0.0.1:8080".to_string(),
                base_url: "http://127.0.0.1:8080".to_string(),
            },
            serial: SerialConfig {
                port: "/dev/ttyUSB0".to_string(),
                baud_rate: 115200,
                reconnect_delay_ms: default_reconnect_delay_ms(),
                outbound_poll_ms: default_outbound_poll_ms(),
                idle_tick_ms: default_idle_tick_ms(),
                request_timeout_secs: default_request_timeout_secs(),
            },
            mesh: MeshConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                file: Some("meshobserver.log".to_string()),
            },
        }
    }
}
