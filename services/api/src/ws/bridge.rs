//! Runs one call: pumps frames between the telephony leg and the agent leg.
//!
//! All relay decisions live in [`CallSession`]; this module only reads
//! frames, feeds them to the session and executes the resulting commands in
//! order. Both legs are polled from a single task so frames on a leg are
//! handled in arrival order, and the agent leg is polled first so a `ping`
//! is answered before anything queued behind it.

use super::{leg::Leg, provider::AgentConnector, registry::CallHandle};
use crate::error::BridgeError;
use callbridge_core::{
    CloseReason, Command,
    convai::{AgentEvent, AgentFrame},
    session::{AgentDefaults, CallSession},
    telephony::{CallerFrame, MediaStreamEvent},
};
use futures_util::{SinkExt, StreamExt};
use std::{sync::Arc, time::Duration};
use tracing::{debug, error, info, warn};

/// Per-call settings taken from the service configuration.
#[derive(Debug, Clone)]
pub struct BridgeSettings {
    pub defaults: AgentDefaults,
    pub connect_timeout: Duration,
}

enum Step {
    Caller(Option<Result<String, BridgeError>>),
    Agent(Option<Result<String, BridgeError>>),
}

struct Bridge {
    session: CallSession,
    caller: Leg,
    agent: Option<Leg>,
    connector: Arc<dyn AgentConnector>,
    connect_timeout: Duration,
    handle: CallHandle,
    closed_by: Option<CloseReason>,
}

/// Bridges `caller` to a freshly dialled agent leg until either side ends the
/// call. Both legs are closed and `handle` is released before returning.
pub async fn run_bridge(
    caller: Leg,
    connector: Arc<dyn AgentConnector>,
    settings: BridgeSettings,
    handle: CallHandle,
) -> CloseReason {
    let bridge = Bridge {
        session: CallSession::new(settings.defaults),
        caller,
        agent: None,
        connector,
        connect_timeout: settings.connect_timeout,
        handle,
        closed_by: None,
    };
    bridge.run().await
}

async fn next_frame(leg: &mut Option<Leg>) -> Option<Result<String, BridgeError>> {
    match leg {
        Some(leg) => leg.stream.next().await,
        None => std::future::pending().await,
    }
}

impl Bridge {
    async fn run(mut self) -> CloseReason {
        while !self.session.is_closed() {
            // Agent first so pings never wait behind caller audio. A burst of
            // agent audio holds off the caller leg until the burst is drained.
            let step = tokio::select! {
                biased;
                frame = next_frame(&mut self.agent) => Step::Agent(frame),
                frame = self.caller.stream.next() => Step::Caller(frame),
            };

            let command = match step {
                Step::Caller(frame) => self.on_caller_frame(frame),
                Step::Agent(frame) => self.on_agent_frame(frame),
            };
            self.execute(command).await;
        }

        self.shutdown().await;
        let reason = self.closed_by.unwrap_or(CloseReason::CallerDisconnected);
        info!(%reason, "Call finished.");
        reason
    }

    fn on_caller_frame(&mut self, frame: Option<Result<String, BridgeError>>) -> Option<Command> {
        match frame {
            Some(Ok(text)) => match MediaStreamEvent::decode(&text) {
                Ok(event) => self.session.on_telephony(event),
                Err(e) => {
                    warn!(error = %e, "Ignoring malformed telephony frame.");
                    None
                }
            },
            Some(Err(e)) => {
                warn!(error = %e, "Telephony connection error.");
                self.session.on_caller_closed()
            }
            None => {
                info!("Telephony connection closed.");
                self.session.on_caller_closed()
            }
        }
    }

    fn on_agent_frame(&mut self, frame: Option<Result<String, BridgeError>>) -> Option<Command> {
        match frame {
            Some(Ok(text)) => match AgentEvent::decode(&text) {
                Ok(event) => self.session.on_agent(event),
                Err(e) => {
                    warn!(error = %e, "Ignoring malformed agent frame.");
                    None
                }
            },
            Some(Err(e)) => {
                warn!(error = %e, "Agent connection error.");
                self.session.on_agent_closed()
            }
            None => {
                info!("Agent connection closed.");
                self.session.on_agent_closed()
            }
        }
    }

    /// Executes a command and any follow-up it produces.
    async fn execute(&mut self, mut next: Option<Command>) {
        while let Some(command) = next.take() {
            next = match command {
                Command::ConnectAgent => self.connect_agent().await,
                Command::SendToAgent(frame) => self.send_to_agent(frame).await,
                Command::SendToCaller(frame) => self.send_to_caller(frame).await,
                Command::Teardown(reason) => {
                    info!(%reason, "Tearing down call.");
                    self.closed_by = Some(reason);
                    None
                }
            };
        }
    }

    async fn connect_agent(&mut self) -> Option<Command> {
        if let Some(stream_sid) = self.session.stream_sid() {
            let call_sid = self.session.call_sid();
            self.handle.record_start(stream_sid, call_sid);
            let span = tracing::Span::current();
            span.record("stream_sid", stream_sid);
            if let Some(call_sid) = call_sid {
                span.record("call_sid", call_sid);
            }
        }

        match tokio::time::timeout(self.connect_timeout, self.connector.connect()).await {
            Ok(Ok(leg)) => {
                self.agent = Some(leg);
                self.session.on_agent_connected()
            }
            Ok(Err(e)) => {
                error!(error = %e, "Failed to open agent connection.");
                self.session.on_agent_connect_failed()
            }
            Err(_) => {
                error!(
                    error = %BridgeError::ConnectTimeout(self.connect_timeout),
                    "Failed to open agent connection."
                );
                self.session.on_agent_connect_failed()
            }
        }
    }

    async fn send_to_agent(&mut self, frame: AgentFrame) -> Option<Command> {
        let Some(agent) = self.agent.as_mut() else {
            debug!("No agent leg; dropping outbound frame.");
            return None;
        };
        let text = match frame.encode() {
            Ok(text) => text,
            Err(e) => {
                error!(error = %e, "Failed to encode agent frame.");
                return None;
            }
        };
        match agent.sink.send(text).await {
            Ok(()) => None,
            Err(e) => {
                warn!(error = %e, "Failed to write to agent connection.");
                self.session.on_agent_closed()
            }
        }
    }

    async fn send_to_caller(&mut self, frame: CallerFrame) -> Option<Command> {
        let text = match frame.encode() {
            Ok(text) => text,
            Err(e) => {
                error!(error = %e, "Failed to encode telephony frame.");
                return None;
            }
        };
        match self.caller.sink.send(text).await {
            Ok(()) => None,
            Err(e) => {
                warn!(error = %e, "Failed to write to telephony connection.");
                self.session.on_caller_closed()
            }
        }
    }

    /// Closes both legs. Errors from legs that are already gone are expected.
    async fn shutdown(&mut self) {
        if let Some(mut agent) = self.agent.take() {
            if let Err(e) = agent.sink.close().await {
                debug!(error = %e, "Agent leg already closed.");
            }
        }
        if let Err(e) = self.caller.sink.close().await {
            debug!(error = %e, "Telephony leg already closed.");
        }
    }
}
