//! Per-call session state machine.
//!
//! A [`CallSession`] composes two independent leg lifecycles (telephony and
//! agent) into the call phases `AwaitingStart -> Bridging -> Closed`. It owns
//! the call's identifiers and decides, for every inbound frame, which single
//! [`Command`] (if any) the runtime must execute.

use crate::{
    CloseReason, Command,
    convai::{AgentEvent, AgentFrame},
    telephony::{CallerFrame, MediaStreamEvent, StreamStart},
};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Custom parameter carrying a per-call prompt override.
pub const PROMPT_PARAMETER: &str = "prompt";
/// Custom parameter carrying a per-call greeting override.
pub const FIRST_MESSAGE_PARAMETER: &str = "first_message";

/// The call-level phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallPhase {
    /// Telephony leg open, no stream identifier yet.
    AwaitingStart,
    /// `start` seen; the agent leg is being dialled or is open.
    Bridging,
    /// Terminal.
    Closed,
}

/// Lifecycle of one leg of the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegState {
    /// Not yet established (agent leg only).
    Pending,
    Open,
    Closed,
}

/// Prompt and greeting used when the call does not override them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentDefaults {
    pub prompt: String,
    pub first_message: String,
}

/// Coordinating state for one bridged phone call.
#[derive(Debug)]
pub struct CallSession {
    phase: CallPhase,
    caller: LegState,
    agent: LegState,
    stream_sid: Option<String>,
    call_sid: Option<String>,
    custom_parameters: HashMap<String, String>,
    defaults: AgentDefaults,
}

impl CallSession {
    /// Creates a session for a freshly accepted telephony connection.
    pub fn new(defaults: AgentDefaults) -> Self {
        Self {
            phase: CallPhase::AwaitingStart,
            caller: LegState::Open,
            agent: LegState::Pending,
            stream_sid: None,
            call_sid: None,
            custom_parameters: HashMap::new(),
            defaults,
        }
    }

    #[cfg(test)]
    pub fn phase(&self) -> CallPhase {
        self.phase
    }

    #[cfg(test)]
    pub fn caller_leg(&self) -> LegState {
        self.caller
    }

    #[cfg(test)]
    pub fn agent_leg(&self) -> LegState {
        self.agent
    }

    pub fn stream_sid(&self) -> Option<&str> {
        self.stream_sid.as_deref()
    }

    pub fn call_sid(&self) -> Option<&str> {
        self.call_sid.as_deref()
    }

    pub fn is_closed(&self) -> bool {
        self.phase == CallPhase::Closed
    }

    /// The prompt the agent will be initiated with.
    ///
    /// Empty overrides fall back to the default.
    pub fn effective_prompt(&self) -> &str {
        self.parameter(PROMPT_PARAMETER)
            .unwrap_or(&self.defaults.prompt)
    }

    pub fn effective_first_message(&self) -> &str {
        self.parameter(FIRST_MESSAGE_PARAMETER)
            .unwrap_or(&self.defaults.first_message)
    }

    fn parameter(&self, key: &str) -> Option<&str> {
        self.custom_parameters
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    /// Handles a frame from the telephony leg.
    pub fn on_telephony(&mut self, event: MediaStreamEvent) -> Option<Command> {
        if self.is_closed() {
            debug!(?event, "Ignoring telephony frame on closed session.");
            return None;
        }

        match event {
            MediaStreamEvent::Start(start) => self.on_start(start),
            MediaStreamEvent::Media(media) => {
                if self.phase == CallPhase::AwaitingStart {
                    debug!("Dropping caller audio received before stream start.");
                    return None;
                }
                if self.agent != LegState::Open {
                    debug!(agent = ?self.agent, "Dropping caller audio, agent leg not open.");
                    return None;
                }
                Some(Command::SendToAgent(AgentFrame::user_audio(media.payload)))
            }
            MediaStreamEvent::Stop => {
                info!(stream_sid = ?self.stream_sid, "Telephony stream stopped.");
                Some(self.close(CloseReason::StreamStopped))
            }
            MediaStreamEvent::Other(name) => {
                debug!(event = %name, "Unhandled telephony event.");
                None
            }
        }
    }

    fn on_start(&mut self, start: StreamStart) -> Option<Command> {
        if self.phase != CallPhase::AwaitingStart {
            warn!(
                stream_sid = %start.stream_sid,
                "Ignoring duplicate start event; stream id is already set."
            );
            return None;
        }

        info!(
            stream_sid = %start.stream_sid,
            call_sid = ?start.call_sid,
            parameters = ?start.custom_parameters,
            "Telephony stream started."
        );
        self.stream_sid = Some(start.stream_sid);
        self.call_sid = start.call_sid;
        self.custom_parameters = start.custom_parameters;
        self.phase = CallPhase::Bridging;
        Some(Command::ConnectAgent)
    }

    /// The agent leg finished dialling; returns the initiation frame.
    pub fn on_agent_connected(&mut self) -> Option<Command> {
        if self.phase != CallPhase::Bridging || self.agent != LegState::Pending {
            warn!(phase = ?self.phase, agent = ?self.agent, "Agent connected in unexpected state.");
            return None;
        }
        self.agent = LegState::Open;
        let prompt = self.effective_prompt().to_owned();
        let first_message = self.effective_first_message().to_owned();
        info!(%prompt, "Agent leg open; sending initiation.");
        Some(Command::SendToAgent(AgentFrame::initiation(
            prompt,
            first_message,
        )))
    }

    /// Signed URL fetch or agent dial failed.
    pub fn on_agent_connect_failed(&mut self) -> Option<Command> {
        if self.is_closed() {
            return None;
        }
        Some(self.close(CloseReason::SetupFailed))
    }

    /// Handles a frame from the agent leg.
    pub fn on_agent(&mut self, event: AgentEvent) -> Option<Command> {
        if self.is_closed() || self.agent != LegState::Open {
            debug!(?event, "Ignoring agent frame; agent leg not open.");
            return None;
        }

        match event {
            AgentEvent::InitiationMetadata => {
                info!("Received conversation initiation metadata.");
                None
            }
            AgentEvent::Audio(Some(audio)) => match &self.stream_sid {
                Some(sid) => Some(Command::SendToCaller(CallerFrame::media(
                    sid.clone(),
                    audio.into_payload(),
                ))),
                None => {
                    debug!("Dropping agent audio; no stream id yet.");
                    None
                }
            },
            AgentEvent::Audio(None) => {
                debug!("Agent audio frame carried no payload.");
                None
            }
            AgentEvent::Interruption => match &self.stream_sid {
                Some(sid) => {
                    debug!("Caller barged in; clearing playback.");
                    Some(Command::SendToCaller(CallerFrame::clear(sid.clone())))
                }
                None => None,
            },
            AgentEvent::Ping {
                event_id: Some(event_id),
            } => Some(Command::SendToAgent(AgentFrame::pong(event_id))),
            AgentEvent::Ping { event_id: None } => {
                warn!("Agent ping without event id.");
                None
            }
            AgentEvent::Other(kind) => {
                debug!(%kind, "Unhandled agent message type.");
                None
            }
        }
    }

    /// The telephony connection closed or errored.
    pub fn on_caller_closed(&mut self) -> Option<Command> {
        if self.is_closed() {
            return None;
        }
        self.caller = LegState::Closed;
        Some(self.close(CloseReason::CallerDisconnected))
    }

    /// The agent connection closed or errored.
    pub fn on_agent_closed(&mut self) -> Option<Command> {
        if self.is_closed() {
            return None;
        }
        self.agent = LegState::Closed;
        Some(self.close(CloseReason::AgentDisconnected))
    }

    fn close(&mut self, reason: CloseReason) -> Command {
        self.phase = CallPhase::Closed;
        self.caller = LegState::Closed;
        self.agent = LegState::Closed;
        Command::Teardown(reason)
    }
}
