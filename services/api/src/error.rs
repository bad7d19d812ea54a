//! Error types shared by the bridge runtime and the provider connectors.

use reqwest::StatusCode;

/// The signed session URL could not be obtained.
///
/// Every failure mode of the fetch collapses into this one type; the bridge
/// treats any of them as a setup failure and never retries.
#[derive(Debug, thiserror::Error)]
pub enum SignedUrlUnavailable {
    #[error("signed URL request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("signed URL endpoint returned {0}")]
    Status(StatusCode),
    #[error("signed URL response was malformed: {0}")]
    Malformed(String),
}

/// Failures on either leg of a bridged call.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error(transparent)]
    SignedUrl(#[from] SignedUrlUnavailable),
    #[error("agent websocket error: {0}")]
    AgentSocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("caller websocket error: {0}")]
    CallerSocket(#[from] axum::Error),
    #[error("timed out after {0:?} connecting to the agent")]
    ConnectTimeout(std::time::Duration),
    #[error("leg channel closed: {0}")]
    Closed(String),
}
