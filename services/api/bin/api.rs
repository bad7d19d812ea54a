//! Main Entrypoint for the Call Bridge API Service
//!
//! This binary is responsible for:
//! 1. Loading configuration from the environment.
//! 2. Building the upstream provider clients.
//! 3. Constructing the Axum router and applying middleware.
//! 4. Starting the web server and handling graceful shutdown.

use anyhow::Context;
use callbridge_api::{
    config::Config,
    router::create_router,
    state::AppState,
    twilio::{TWILIO_API_BASE, TwilioClient},
    ws::{
        provider::{SignedUrlConnector, elevenlabs::ElevenLabsSignedUrl},
        registry::CallRegistry,
    },
};
use secrecy::{ExposeSecret, SecretString};
use std::{net::SocketAddr, sync::Arc};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

/// Listens for the `Ctrl+C` signal to gracefully shut down the server.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl+C; running until killed.");
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal. Shutting down gracefully...");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --- 1. Load Configuration ---
    let mut config = Config::from_env().context("Failed to load configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .init();
    info!("Configuration loaded. Initializing application state...");

    // --- 3. Initialize Provider Clients ---
    let http = reqwest::Client::builder()
        .timeout(config.agent_connect_timeout)
        .build()
        .context("Failed to build HTTP client")?;

    let signer = ElevenLabsSignedUrl::new(
        http.clone(),
        config.elevenlabs_api_base.clone(),
        config.elevenlabs_agent_id.clone(),
        SecretString::from(config.elevenlabs_api_key.expose_secret().to_owned()),
    );
    let connector = Arc::new(SignedUrlConnector::new(Arc::new(signer)));

    let twilio = config.twilio.take().map(|twilio| {
        info!(from = %twilio.phone_number, "Outbound calling enabled.");
        Arc::new(TwilioClient::new(http.clone(), TWILIO_API_BASE, twilio))
    });
    if twilio.is_none() {
        info!("Telephony credentials not set; outbound calling disabled.");
    }

    let bind_address = config.bind_address;
    info!(
        agent_id = %config.elevenlabs_agent_id,
        public_url = ?config.public_url,
        %bind_address,
        "Service configured. Starting server..."
    );

    let app_state = Arc::new(AppState {
        config: Arc::new(config),
        registry: CallRegistry::new(),
        connector,
        twilio,
    });

    // --- 4. Create Router and Apply Middleware ---
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(app_state).layer(cors);

    // --- 5. Start Server ---
    let listener = tokio::net::TcpListener::bind(bind_address).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server has shut down.");
    Ok(())
}
