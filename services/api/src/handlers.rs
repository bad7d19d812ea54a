//! Axum Handlers for the HTTP API
//!
//! Health reporting, the call-control documents the telephony provider fetches
//! when a call connects, and outbound call placement. Documented with
//! `utoipa` doc comments.

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Json, Response},
};
use callbridge_core::session::PROMPT_PARAMETER;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info};
use utoipa::IntoParams;

use crate::{
    models::{ErrorResponse, HealthResponse, OutboundCallPayload, OutboundCallResponse},
    state::AppState,
    twiml,
};

pub enum ApiError {
    BadRequest(String),
    ServiceUnavailable(String),
    InternalServerError(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(ErrorResponse { message })).into_response()
            }
            ApiError::ServiceUnavailable(message) => {
                (StatusCode::SERVICE_UNAVAILABLE, Json(ErrorResponse { message })).into_response()
            }
            ApiError::InternalServerError(err) => {
                error!("Internal Server Error: {:?}", err);
                let message = "Failed to initiate call".to_string();
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse { message }),
                )
                    .into_response()
            }
        }
    }
}

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::InternalServerError(err.into())
    }
}

/// Public HTTP base URL of this service.
///
/// `PUBLIC_URL` wins when configured. Otherwise the request's `Host` is used
/// with `https`, unless a proxy reports `X-Forwarded-Proto: http`.
pub fn http_base(public_url: Option<&str>, headers: &HeaderMap) -> Option<String> {
    if let Some(url) = public_url {
        return Some(url.trim_end_matches('/').to_string());
    }
    let host = headers.get(header::HOST)?.to_str().ok()?;
    let plain_http = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|proto| proto.trim().eq_ignore_ascii_case("http"));
    let scheme = if plain_http { "http" } else { "https" };
    Some(format!("{}://{}", scheme, host))
}

/// Websocket counterpart of [`http_base`]: `https` becomes `wss`, `http`
/// becomes `ws`.
pub fn ws_base(public_url: Option<&str>, headers: &HeaderMap) -> Option<String> {
    let base = http_base(public_url, headers)?;
    if let Some(rest) = base.strip_prefix("https://") {
        Some(format!("wss://{}", rest))
    } else if let Some(rest) = base.strip_prefix("http://") {
        Some(format!("ws://{}", rest))
    } else {
        Some(base)
    }
}

fn require_ws_base(state: &AppState, headers: &HeaderMap) -> Result<String, ApiError> {
    ws_base(state.config.public_url.as_deref(), headers)
        .ok_or_else(|| ApiError::BadRequest("Host header is required".to_string()))
}

fn xml(document: String) -> Response {
    ([(header::CONTENT_TYPE, "text/xml")], document).into_response()
}

/// Health check.
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        message: "Server is running".to_string(),
        active_calls: state.registry.len(),
    })
}

/// Call-control document for inbound calls.
#[utoipa::path(
    get,
    path = "/incoming-call",
    responses(
        (status = 200, description = "Connects the call to the media stream", body = String, content_type = "text/xml"),
        (status = 400, description = "No Host header and no PUBLIC_URL", body = ErrorResponse)
    )
)]
pub async fn incoming_call(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let base = require_ws_base(&state, &headers)?;
    info!("Answering inbound call.");
    Ok(xml(twiml::connect_stream(
        &format!("{}/media-stream", base),
        &[],
    )?))
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OutboundTwimlQuery {
    /// Prompt forwarded to the agent as a stream parameter.
    #[serde(default)]
    pub prompt: Option<String>,
}

/// Call-control document for calls placed through `POST /outbound-call`.
#[utoipa::path(
    get,
    path = "/outbound-call-twiml",
    params(OutboundTwimlQuery),
    responses(
        (status = 200, description = "Connects the call to the outbound media stream", body = String, content_type = "text/xml"),
        (status = 400, description = "No Host header and no PUBLIC_URL", body = ErrorResponse)
    )
)]
pub async fn outbound_call_twiml(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<OutboundTwimlQuery>,
) -> Result<Response, ApiError> {
    let base = require_ws_base(&state, &headers)?;
    let prompt = query.prompt.unwrap_or_default();
    Ok(xml(twiml::connect_stream(
        &format!("{}/outbound-media-stream", base),
        &[(PROMPT_PARAMETER, prompt.as_str())],
    )?))
}

/// Place an outbound call that is bridged to the agent once answered.
#[utoipa::path(
    post,
    path = "/outbound-call",
    request_body = OutboundCallPayload,
    responses(
        (status = 200, description = "Call initiated", body = OutboundCallResponse),
        (status = 400, description = "Phone number is missing", body = ErrorResponse),
        (status = 503, description = "Outbound calling is not configured", body = ErrorResponse),
        (status = 500, description = "The telephony provider rejected the call", body = ErrorResponse)
    )
)]
pub async fn outbound_call(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<OutboundCallPayload>,
) -> Result<Json<OutboundCallResponse>, ApiError> {
    let number = payload
        .number
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Phone number is required".to_string()))?;

    let twilio = state.twilio.as_ref().ok_or_else(|| {
        ApiError::ServiceUnavailable("Outbound calling is not configured".to_string())
    })?;

    let base = http_base(state.config.public_url.as_deref(), &headers)
        .ok_or_else(|| ApiError::BadRequest("Host header is required".to_string()))?;
    let twiml_url = reqwest::Url::parse_with_params(
        &format!("{}/outbound-call-twiml", base),
        &[(PROMPT_PARAMETER, payload.prompt.as_deref().unwrap_or_default())],
    )?;
    info!(%twiml_url, "Placing outbound call.");

    let call_sid = twilio.create_call(number, twiml_url.as_str()).await?;
    Ok(Json(OutboundCallResponse {
        success: true,
        message: "Call initiated".to_string(),
        call_sid,
    }))
}
