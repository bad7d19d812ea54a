//! Conversational AI streaming protocol.
//!
//! Inbound frames carry a `type` discriminator. Outbound frames are a mix of
//! typed control messages and the untyped `user_audio_chunk` envelope.

use crate::FrameError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Audio sent by the agent.
///
/// The provider has shipped two shapes for the same content over time; the
/// variant records which one the frame used.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentAudio {
    /// `{"audio": {"chunk": ...}}`
    Chunk(String),
    /// `{"audio_event": {"audio_base_64": ...}}`
    Event(String),
}

impl AgentAudio {
    #[cfg(test)]
    pub fn payload(&self) -> &str {
        match self {
            AgentAudio::Chunk(payload) | AgentAudio::Event(payload) => payload,
        }
    }

    pub fn into_payload(self) -> String {
        match self {
            AgentAudio::Chunk(payload) | AgentAudio::Event(payload) => payload,
        }
    }
}

#[derive(Deserialize)]
struct AudioMessage {
    audio: Option<ChunkBody>,
    audio_event: Option<AudioEventBody>,
}

#[derive(Deserialize)]
struct ChunkBody {
    chunk: Option<String>,
}

#[derive(Deserialize)]
struct AudioEventBody {
    audio_base_64: Option<String>,
}

impl AudioMessage {
    /// Picks whichever encoding is present, preferring `audio.chunk`.
    fn into_audio(self) -> Option<AgentAudio> {
        let chunk = self
            .audio
            .and_then(|a| a.chunk)
            .filter(|c| !c.is_empty())
            .map(AgentAudio::Chunk);
        chunk.or_else(|| {
            self.audio_event
                .and_then(|e| e.audio_base_64)
                .filter(|c| !c.is_empty())
                .map(AgentAudio::Event)
        })
    }
}

#[derive(Deserialize)]
struct PingMessage {
    ping_event: Option<PingBody>,
}

#[derive(Deserialize)]
struct PingBody {
    event_id: Option<Value>,
}

/// A decoded inbound frame from the agent leg.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent {
    InitiationMetadata,
    /// `None` when neither audio encoding carried a payload.
    Audio(Option<AgentAudio>),
    Interruption,
    /// The id is echoed back verbatim in the `pong`.
    Ping { event_id: Option<Value> },
    Other(String),
}

impl AgentEvent {
    pub fn decode(text: &str) -> Result<Self, FrameError> {
        let frame: Value = serde_json::from_str(text)?;
        let kind = frame
            .get("type")
            .and_then(Value::as_str)
            .ok_or(FrameError::MissingDiscriminator("type"))?
            .to_owned();

        match kind.as_str() {
            "conversation_initiation_metadata" => Ok(Self::InitiationMetadata),
            "audio" => {
                let message: AudioMessage = serde_json::from_value(frame)?;
                Ok(Self::Audio(message.into_audio()))
            }
            "interruption" => Ok(Self::Interruption),
            "ping" => {
                let message: PingMessage = serde_json::from_value(frame)?;
                let event_id = message
                    .ping_event
                    .and_then(|p| p.event_id)
                    .filter(|id| !id.is_null());
                Ok(Self::Ping { event_id })
            }
            _ => Ok(Self::Other(kind)),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct PromptOverride {
    pub prompt: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct AgentOverride {
    pub prompt: PromptOverride,
    pub first_message: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ConversationConfigOverride {
    pub agent: AgentOverride,
}

/// Typed control messages sent to the agent.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    ConversationInitiationClientData {
        conversation_config_override: ConversationConfigOverride,
    },
    Pong {
        event_id: Value,
    },
}

/// A frame written to the agent leg.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum AgentFrame {
    Event(ClientEvent),
    UserAudio { user_audio_chunk: String },
}

impl AgentFrame {
    /// The one-off frame that opens a conversation with a per-call prompt.
    pub fn initiation(prompt: impl Into<String>, first_message: impl Into<String>) -> Self {
        Self::Event(ClientEvent::ConversationInitiationClientData {
            conversation_config_override: ConversationConfigOverride {
                agent: AgentOverride {
                    prompt: PromptOverride {
                        prompt: prompt.into(),
                    },
                    first_message: first_message.into(),
                },
            },
        })
    }

    pub fn user_audio(payload: impl Into<String>) -> Self {
        Self::UserAudio {
            user_audio_chunk: payload.into(),
        }
    }

    pub fn pong(event_id: Value) -> Self {
        Self::Event(ClientEvent::Pong { event_id })
    }

    /// Returns the prompt if this is an initiation frame.
    #[cfg(test)]
    pub fn prompt(&self) -> Option<&str> {
        match self {
            Self::Event(ClientEvent::ConversationInitiationClientData {
                conversation_config_override,
            }) => Some(&conversation_config_override.agent.prompt.prompt),
            _ => None,
        }
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_audio_event_encoding() {
        let event =
            AgentEvent::decode(r#"{"type":"audio","audio_event":{"audio_base_64":"ZFZY","event_id":3}}"#)
                .unwrap();
        assert_eq!(
            event,
            AgentEvent::Audio(Some(AgentAudio::Event("ZFZY".to_string())))
        );
    }

    #[test]
    fn test_decode_audio_chunk_encoding() {
        let event = AgentEvent::decode(r#"{"type":"audio","audio":{"chunk":"QUJD"}}"#).unwrap();
        let AgentEvent::Audio(Some(audio)) = event else {
            panic!("expected audio payload");
        };
        assert_eq!(audio, AgentAudio::Chunk("QUJD".to_string()));
        assert_eq!(audio.payload(), "QUJD");
    }

    #[test]
    fn test_decode_audio_prefers_chunk_when_both_present() {
        let event = AgentEvent::decode(
            r#"{"type":"audio","audio":{"chunk":"AAAA"},"audio_event":{"audio_base_64":"BBBB"}}"#,
        )
        .unwrap();
        assert_eq!(
            event,
            AgentEvent::Audio(Some(AgentAudio::Chunk("AAAA".to_string())))
        );
    }

    #[test]
    fn test_decode_audio_without_payload() {
        assert_eq!(
            AgentEvent::decode(r#"{"type":"audio"}"#).unwrap(),
            AgentEvent::Audio(None)
        );
        assert_eq!(
            AgentEvent::decode(r#"{"type":"audio","audio_event":{}}"#).unwrap(),
            AgentEvent::Audio(None)
        );
    }

    #[test]
    fn test_decode_ping() {
        assert_eq!(
            AgentEvent::decode(r#"{"type":"ping","ping_event":{"event_id":42,"ping_ms":80}}"#)
                .unwrap(),
            AgentEvent::Ping {
                event_id: Some(json!(42))
            }
        );
        assert_eq!(
            AgentEvent::decode(r#"{"type":"ping"}"#).unwrap(),
            AgentEvent::Ping { event_id: None }
        );
    }

    #[test]
    fn test_decode_other_types() {
        assert_eq!(
            AgentEvent::decode(
                r#"{"type":"conversation_initiation_metadata","conversation_initiation_metadata_event":{}}"#
            )
            .unwrap(),
            AgentEvent::InitiationMetadata
        );
        assert_eq!(
            AgentEvent::decode(r#"{"type":"interruption","interruption_event":{"event_id":9}}"#)
                .unwrap(),
            AgentEvent::Interruption
        );
        assert_eq!(
            AgentEvent::decode(r#"{"type":"agent_response","agent_response_event":{}}"#).unwrap(),
            AgentEvent::Other("agent_response".to_string())
        );
        assert!(AgentEvent::decode(r#"{"audio":{"chunk":"QUJD"}}"#).is_err());
    }

    #[test]
    fn test_encode_initiation_frame() {
        let frame = AgentFrame::initiation("gentle reminder assistant", "hello!");
        assert_eq!(frame.prompt(), Some("gentle reminder assistant"));

        let value: Value = serde_json::from_str(&frame.encode().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "conversation_initiation_client_data",
                "conversation_config_override": {
                    "agent": {
                        "prompt": { "prompt": "gentle reminder assistant" },
                        "first_message": "hello!"
                    }
                }
            })
        );
    }

    #[test]
    fn test_encode_user_audio_and_pong() {
        let audio: Value =
            serde_json::from_str(&AgentFrame::user_audio("QUJD").encode().unwrap()).unwrap();
        assert_eq!(audio, json!({ "user_audio_chunk": "QUJD" }));

        let pong: Value =
            serde_json::from_str(&AgentFrame::pong(json!(7)).encode().unwrap()).unwrap();
        assert_eq!(pong, json!({ "type": "pong", "event_id": 7 }));
        assert_eq!(AgentFrame::pong(json!(7)).prompt(), None);
    }
}
