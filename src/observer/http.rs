//! HTTP control surface for the observer.
//!
//! Thin marshaling over [`Observer`](super::Observer): every handler
//! validates, performs exactly one logical operation, and returns JSON.
//! The dashboard and the serial bridge are both clients of this surface;
//! neither gets a privileged path into the state containers.

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::net::TcpListener;

use crate::protocol::{HeartbeatPacket, OutboundCommand};

use super::messages::MessageRecord;
use super::sos::SosRecord;
use super::{
    MessageSubmission, NodeView, Observer, SubmitError, Summary, GATEWAY_PLACEHOLDER,
};

/// Rejection at the HTTP boundary. Carries the typed submit error so the
/// response body names the exact field problem.
#[derive(Debug)]
pub struct ApiError(SubmitError);

impl From<SubmitError> for ApiError {
    fn from(err: SubmitError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "error": self.0.to_string() }));
        (StatusCode::UNPROCESSABLE_ENTITY, body).into_response()
    }
}

/// Uniform acknowledgment body.
#[derive(Debug, Serialize)]
struct Ack {
    status: &'static str,
}

impl Ack {
    fn new(status: &'static str) -> Json<Ack> {
        Json(Ack { status })
    }
}

#[derive(Debug, Deserialize)]
struct SosToggle {
    node_id: String,
}

#[derive(Debug, Serialize)]
struct GatewayView {
    gateway_id: String,
}

pub fn build_router(observer: Observer) -> Router {
    Router::new()
        .route("/", get(root_summary))
        .route("/heartbeat", post(submit_heartbeat))
        .route("/messages", get(get_messages))
        .route("/messages/inbound", post(submit_inbound_message))
        .route("/messages/outbound", post(submit_outbound_message))
        .route("/outbox", get(poll_outbox))
        .route("/sos/on", post(sos_on))
        .route("/sos/off", post(sos_off))
        .route("/sos/status", get(sos_status))
        .route("/nodes", get(get_nodes))
        .route("/gateway", get(gateway))
        .with_state(observer)
}

/// Bind and serve until the process is terminated.
pub async fn serve(observer: Observer, bind_addr: &str) -> Result<()> {
    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind observer on {bind_addr}"))?;
    info!("observer listening on http://{bind_addr}");
    axum::serve(listener, build_router(observer))
        .await
        .context("observer HTTP server terminated")?;
    Ok(())
}

async fn root_summary(State(observer): State<Observer>) -> Json<Summary> {
    Json(observer.summary())
}

async fn submit_heartbeat(
    State(observer): State<Observer>,
    Json(hb): Json<HeartbeatPacket>,
) -> Result<Json<Ack>, ApiError> {
    observer.submit_heartbeat(&hb)?;
    Ok(Ack::new("ok"))
}

async fn submit_inbound_message(
    State(observer): State<Observer>,
    Json(sub): Json<MessageSubmission>,
) -> Result<Json<Ack>, ApiError> {
    observer.submit_inbound_message(&sub)?;
    Ok(Ack::new("stored"))
}

async fn submit_outbound_message(
    State(observer): State<Observer>,
    Json(sub): Json<MessageSubmission>,
) -> Result<Json<Ack>, ApiError> {
    observer.submit_outbound_message(&sub)?;
    Ok(Ack::new("queued"))
}

async fn poll_outbox(State(observer): State<Observer>) -> Json<Option<OutboundCommand>> {
    Json(observer.poll_outbound_command())
}

async fn sos_on(
    State(observer): State<Observer>,
    Json(toggle): Json<SosToggle>,
) -> Result<Json<Ack>, ApiError> {
    observer.activate_sos(&toggle.node_id)?;
    Ok(Ack::new("active"))
}

async fn sos_off(
    State(observer): State<Observer>,
    Json(toggle): Json<SosToggle>,
) -> Result<Json<Ack>, ApiError> {
    observer.clear_sos(&toggle.node_id)?;
    Ok(Ack::new("cleared"))
}

async fn sos_status(State(observer): State<Observer>) -> Json<HashMap<String, SosRecord>> {
    Json(observer.sos_status())
}

async fn get_nodes(State(observer): State<Observer>) -> Json<HashMap<String, NodeView>> {
    Json(observer.nodes())
}

async fn get_messages(State(observer): State<Observer>) -> Json<Vec<MessageRecord>> {
    Json(observer.recent_messages())
}

async fn gateway(State(observer): State<Observer>) -> Json<GatewayView> {
    let gateway_id = observer
        .gateway_node()
        .unwrap_or_else(|| GATEWAY_PLACEHOLDER.to_string());
    Json(GatewayView { gateway_id })
}
