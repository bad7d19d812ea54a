//! Opens the agent leg of a call against the conversational AI provider.

pub mod elevenlabs;

use super::leg::Leg;
use crate::error::{BridgeError, SignedUrlUnavailable};
use async_trait::async_trait;
use std::sync::Arc;
use tokio_tungstenite::connect_async;
use tracing::info;

/// Obtains a short-lived, pre-authenticated session URL for one agent
/// conversation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SignedUrlSource: Send + Sync {
    async fn signed_url(&self) -> Result<String, SignedUrlUnavailable>;
}

/// Establishes the agent leg for a call.
///
/// The bridge only depends on this seam, which lets tests substitute an
/// in-memory leg for the real provider.
#[async_trait]
pub trait AgentConnector: Send + Sync {
    async fn connect(&self) -> Result<Leg, BridgeError>;
}

/// Dials the provider's websocket at a freshly signed URL.
pub struct SignedUrlConnector {
    signer: Arc<dyn SignedUrlSource>,
}

impl SignedUrlConnector {
    pub fn new(signer: Arc<dyn SignedUrlSource>) -> Self {
        Self { signer }
    }
}

#[async_trait]
impl AgentConnector for SignedUrlConnector {
    async fn connect(&self) -> Result<Leg, BridgeError> {
        let url = self.signer.signed_url().await?;
        let (socket, _) = connect_async(url.as_str()).await?;
        info!("Connected to conversational AI.");
        Ok(Leg::from_tungstenite(socket))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Router,
        extract::ws::{Message, WebSocket, WebSocketUpgrade},
        response::Response,
        routing::get,
    };
    use futures_util::{SinkExt, StreamExt};
    use reqwest::StatusCode;

    async fn echo(ws: WebSocketUpgrade) -> Response {
        ws.on_upgrade(|mut socket: WebSocket| async move {
            while let Some(Ok(msg)) = socket.next().await {
                if let Message::Text(text) = msg {
                    let reply = format!(r#"{{"echo":{}}}"#, text.as_str());
                    if socket.send(Message::Text(reply.into())).await.is_err() {
                        break;
                    }
                }
            }
        })
    }

    async fn spawn_echo_server() -> String {
        let app = Router::new().route("/v1/convai/conversation", get(echo));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("ws://{}/v1/convai/conversation?conversation_signature=abc", addr)
    }

    #[tokio::test]
    async fn test_connect_dials_signed_url() {
        let url = spawn_echo_server().await;
        let mut signer = MockSignedUrlSource::new();
        signer
            .expect_signed_url()
            .times(1)
            .returning(move || Ok(url.clone()));

        let connector = SignedUrlConnector::new(Arc::new(signer));
        let mut leg = connector.connect().await.expect("agent leg");

        leg.sink.send(r#"{"user_audio_chunk":"QUJD"}"#.to_string()).await.unwrap();
        let reply = leg.stream.next().await.unwrap().unwrap();
        assert_eq!(reply, r#"{"echo":{"user_audio_chunk":"QUJD"}}"#);

        let _ = leg.sink.close().await;
    }

    #[tokio::test]
    async fn test_connect_fails_without_signed_url() {
        let mut signer = MockSignedUrlSource::new();
        signer
            .expect_signed_url()
            .times(1)
            .returning(|| Err(SignedUrlUnavailable::Status(StatusCode::UNAUTHORIZED)));

        let connector = SignedUrlConnector::new(Arc::new(signer));
        let err = connector.connect().await.err().expect("connect should fail");
        assert!(matches!(
            err,
            BridgeError::SignedUrl(SignedUrlUnavailable::Status(code)) if code == StatusCode::UNAUTHORIZED
        ));
    }

    #[tokio::test]
    async fn test_connect_reports_unreachable_agent() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let mut signer = MockSignedUrlSource::new();
        signer
            .expect_signed_url()
            .returning(move || Ok(format!("ws://{}/v1/convai/conversation", addr)));

        let connector = SignedUrlConnector::new(Arc::new(signer));
        let err = connector.connect().await.err().expect("connect should fail");
        assert!(matches!(err, BridgeError::AgentSocket(_)));
    }
}
