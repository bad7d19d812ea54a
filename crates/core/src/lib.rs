//! Callbridge Core
//!
//! Transport-free building blocks for relaying a live phone call to a
//! conversational AI agent: the two wire protocols and the per-call state
//! machine that translates between them. Nothing in this crate touches a
//! socket; the runtime feeds decoded frames in and executes the returned
//! [`Command`]s.

pub mod convai;
pub mod session;
pub mod telephony;

use convai::AgentFrame;
use telephony::CallerFrame;

/// Represents side effects the session asks its runtime to perform.
///
/// This enum is the only way the state machine reaches the outside world,
/// which keeps the relay rules testable without any network I/O.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Fetch a signed session URL and open the agent leg.
    ConnectAgent,
    /// Write a frame to the agent leg.
    SendToAgent(AgentFrame),
    /// Write a frame to the telephony leg.
    SendToCaller(CallerFrame),
    /// Close both legs and drop the session.
    Teardown(CloseReason),
}

/// Why a call session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The telephony provider sent `stop`.
    StreamStopped,
    /// The telephony connection closed or errored.
    CallerDisconnected,
    /// The agent connection closed or errored.
    AgentDisconnected,
    /// Signed URL fetch or agent dial failed before any audio flowed.
    SetupFailed,
}

impl std::fmt::Display for CloseReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CloseReason::StreamStopped => write!(f, "stream stopped"),
            CloseReason::CallerDisconnected => write!(f, "caller disconnected"),
            CloseReason::AgentDisconnected => write!(f, "agent disconnected"),
            CloseReason::SetupFailed => write!(f, "setup failed"),
        }
    }
}

/// Errors raised while decoding an inbound frame.
///
/// All of these are recoverable from the session's point of view: the frame
/// is logged and skipped.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("frame is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("frame has no `{0}` discriminator")]
    MissingDiscriminator(&'static str),
    #[error("media payload is not valid base64: {0}")]
    InvalidPayload(#[from] base64::DecodeError),
}
