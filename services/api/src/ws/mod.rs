//! WebSocket Call Bridging
//!
//! - `session`: accepts the telephony provider's media-stream connections.
//! - `bridge`: the per-call loop relaying frames between caller and agent.
//! - `leg`: transport-neutral view of a websocket connection.
//! - `provider`: opens the agent leg against the conversational AI provider.
//! - `registry`: bookkeeping of live calls.

pub mod bridge;
pub mod leg;
pub mod provider;
pub mod registry;
pub mod session;

pub use session::{media_stream_handler, outbound_media_stream_handler};
