//! Accepts media-stream websocket connections from the telephony provider.

use super::{
    bridge::{BridgeSettings, run_bridge},
    leg::Leg,
};
use crate::state::AppState;
use axum::{
    extract::{
        State,
        ws::{WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use callbridge_core::session::AgentDefaults;
use std::sync::Arc;
use tracing::{field, info, instrument};

pub const MEDIA_STREAM_PATH: &str = "/media-stream";
pub const OUTBOUND_MEDIA_STREAM_PATH: &str = "/outbound-media-stream";

/// Media stream for inbound calls.
pub async fn media_stream_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state, MEDIA_STREAM_PATH))
}

/// Media stream for calls placed through `POST /outbound-call`.
pub async fn outbound_media_stream_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state, OUTBOUND_MEDIA_STREAM_PATH))
}

/// Runs one call for the lifetime of the telephony connection.
#[instrument(
    name = "call",
    skip_all,
    fields(endpoint = %endpoint, connection_id = field::Empty, call_sid = field::Empty, stream_sid = field::Empty)
)]
async fn handle_socket(socket: WebSocket, state: Arc<AppState>, endpoint: &'static str) {
    let handle = state.registry.register(endpoint);
    tracing::Span::current().record("connection_id", field::display(handle.id()));
    info!("Telephony connected. Awaiting stream start...");

    let settings = BridgeSettings {
        defaults: AgentDefaults {
            prompt: state.config.default_prompt.clone(),
            first_message: state.config.default_first_message.clone(),
        },
        connect_timeout: state.config.agent_connect_timeout,
    };
    run_bridge(
        Leg::from_axum(socket),
        state.connector.clone(),
        settings,
        handle,
    )
    .await;
}
