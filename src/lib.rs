//! # Meshobserver - Telemetry Bridge and Observer for LoRa Mesh Fields
//!
//! Meshobserver relays telemetry and control messages between a field of
//! battery-powered mesh radio nodes (reachable only through one node wired
//! to a local serial link) and a central observer process that aggregates
//! node state, message history, and emergency ("SOS") status.
//!
//! ## Architecture
//!
//! Two processes, built from this one crate, talk over HTTP+JSON:
//!
//! ```text
//! ┌──────────────┐  serial   ┌──────────────┐   HTTP    ┌──────────────┐
//! │ gateway node │ ────────→ │ serial bridge│ ────────→ │   observer   │
//! │  (hardware)  │ ←──────── │   (bridge)   │ ←──────── │   (serve)    │
//! └──────────────┘           └──────────────┘           └──────────────┘
//! ```
//!
//! The bridge owns the physical link: it frames newline-delimited JSON
//! packets from the gateway, classifies them, forwards them upstream, and
//! drains the observer's outbound command queue back onto the wire with
//! correct addressing. The observer owns all state: node liveness derived
//! from heartbeat recency, an append-only message history, the idempotent
//! SOS set, and the command outbox.
//!
//! Both sides assume the physical medium and the transport between them are
//! unreliable. Malformed lines are dropped, failed exchanges are retried
//! naturally on the next cycle, and a vanished serial device is reopened on
//! a fixed backoff. Nothing in this crate treats those events as fatal.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use meshobserver::config::Config;
//! use meshobserver::observer::{http, Observer};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     let observer = Observer::new(&config.mesh);
//!     http::serve(observer, &config.observer.bind_addr).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`protocol`] - Serial wire codec: typed inbound packets, outbound
//!   command addressing
//! - [`observer`] - State engine and its HTTP control surface
//! - [`bridge`] - Serial link ownership, reconnection, and forwarding loop
//! - [`config`] - TOML configuration for both processes
//! - [`logutil`] - Log sanitization for radio-supplied text

pub mod bridge;
pub mod config;
pub mod logutil;
pub mod observer;
pub mod protocol;
