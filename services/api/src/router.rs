//! Axum Router Configuration
//!
//! This module defines the complete HTTP routing for the application,
//! including the call-control endpoints, the media-stream websockets and the
//! OpenAPI documentation.

use crate::{
    handlers,
    models::{ErrorResponse, HealthResponse, OutboundCallPayload, OutboundCallResponse},
    state::AppState,
    ws::{
        media_stream_handler, outbound_media_stream_handler,
        session::{MEDIA_STREAM_PATH, OUTBOUND_MEDIA_STREAM_PATH},
    },
};

use axum::{
    Router,
    routing::{any, get, post},
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::incoming_call,
        handlers::outbound_call_twiml,
        handlers::outbound_call,
    ),
    components(
        schemas(HealthResponse, OutboundCallPayload, OutboundCallResponse, ErrorResponse)
    ),
    tags(
        (name = "Call Bridge API", description = "Connects phone calls to a conversational AI agent")
    )
)]
pub struct ApiDoc;

/// Creates the main Axum router for the application.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    let api_router = Router::new()
        .route("/", get(handlers::health))
        // The telephony provider may fetch call-control documents with GET or POST.
        .route("/incoming-call", any(handlers::incoming_call))
        // Path existing phone number webhooks were configured with.
        .route("/incoming-call-eleven", any(handlers::incoming_call))
        .route("/outbound-call-twiml", any(handlers::outbound_call_twiml))
        .route("/outbound-call", post(handlers::outbound_call))
        .route(MEDIA_STREAM_PATH, get(media_stream_handler))
        .route(OUTBOUND_MEDIA_STREAM_PATH, get(outbound_media_stream_handler))
        .with_state(app_state);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api_router)
}
