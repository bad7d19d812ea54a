//! Transport-neutral view of one websocket leg of a call.
//!
//! Both the telephony socket (accepted by axum) and the agent socket (dialled
//! with tokio-tungstenite) are reduced to a sink of text frames and a stream
//! of text frames, so the bridge loop never sees either library's types.

use crate::error::BridgeError;
use axum::extract::ws::{Message, WebSocket};
use futures_util::{
    Sink, SinkExt, Stream, StreamExt, TryStreamExt,
    future::{self, Ready},
};
use std::pin::Pin;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_tungstenite::{WebSocketStream, tungstenite::protocol::Message as WsMessage};

pub type FrameSink = Pin<Box<dyn Sink<String, Error = BridgeError> + Send>>;
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<String, BridgeError>> + Send>>;

/// One full-duplex connection carrying JSON text frames.
///
/// The stream ends when the peer closes the connection. Non-text frames
/// (binary, ping/pong, close) are filtered out.
pub struct Leg {
    pub sink: FrameSink,
    pub stream: FrameStream,
}

impl Leg {
    pub fn new<Si, St>(sink: Si, stream: St) -> Self
    where
        Si: Sink<String, Error = BridgeError> + Send + 'static,
        St: Stream<Item = Result<String, BridgeError>> + Send + 'static,
    {
        Self {
            sink: Box::pin(sink),
            stream: Box::pin(stream),
        }
    }

    /// Wraps the telephony provider's media-stream socket.
    pub fn from_axum(socket: WebSocket) -> Self {
        let (sink, stream) = socket.split();
        let sink = sink
            .sink_map_err(BridgeError::from)
            .with(|text: String| -> Ready<Result<Message, BridgeError>> {
                future::ready(Ok(Message::Text(text.into())))
            });
        let stream = stream.map_err(BridgeError::from).try_filter_map(|msg| {
            future::ready(Ok(match msg {
                Message::Text(text) => Some(text.as_str().to_owned()),
                _ => None,
            }))
        });
        Self::new(sink, stream)
    }

    /// Wraps a client socket dialled to the AI provider.
    pub fn from_tungstenite<S>(socket: WebSocketStream<S>) -> Self
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (sink, stream) = socket.split();
        let sink = sink
            .sink_map_err(BridgeError::from)
            .with(|text: String| -> Ready<Result<WsMessage, BridgeError>> {
                future::ready(Ok(WsMessage::Text(text.into())))
            });
        let stream = stream.map_err(BridgeError::from).try_filter_map(|msg| {
            future::ready(Ok(match msg {
                WsMessage::Text(text) => Some(text.as_str().to_owned()),
                _ => None,
            }))
        });
        Self::new(sink, stream)
    }
}
