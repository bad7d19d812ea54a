//! Telephony media-stream protocol.
//!
//! The telephony provider streams JSON text frames discriminated by an `event`
//! field. Only `start`, `media` and `stop` drive the bridge; everything else
//! (`connected`, `mark`, `dtmf`, ...) is surfaced as [`MediaStreamEvent::Other`]
//! so the session can log and skip it.

use crate::FrameError;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Metadata delivered with the `start` event.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StreamStart {
    pub stream_sid: String,
    #[serde(default)]
    pub call_sid: Option<String>,
    /// Key/value pairs attached by the call-control document.
    #[serde(default)]
    pub custom_parameters: HashMap<String, String>,
}

/// Body of a `media` frame, in either direction.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MediaBody {
    /// Base64 encoded audio.
    pub payload: String,
}

/// A decoded inbound frame from the telephony leg.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaStreamEvent {
    Start(StreamStart),
    Media(MediaBody),
    Stop,
    /// Any event name the bridge does not act on.
    Other(String),
}

impl MediaStreamEvent {
    /// Decodes one text frame.
    ///
    /// Media payloads are checked to be valid base64 but otherwise left
    /// untouched; the bytes are relayed as-is.
    pub fn decode(text: &str) -> Result<Self, FrameError> {
        let mut frame: Value = serde_json::from_str(text)?;
        let event = frame
            .get("event")
            .and_then(Value::as_str)
            .ok_or(FrameError::MissingDiscriminator("event"))?
            .to_owned();

        match event.as_str() {
            "start" => {
                let start = serde_json::from_value(frame["start"].take())?;
                Ok(Self::Start(start))
            }
            "media" => {
                let media: MediaBody = serde_json::from_value(frame["media"].take())?;
                base64::engine::general_purpose::STANDARD.decode(&media.payload)?;
                Ok(Self::Media(media))
            }
            "stop" => Ok(Self::Stop),
            _ => Ok(Self::Other(event)),
        }
    }
}

/// A frame written back to the telephony leg.
///
/// Both variants are addressed by stream identifier, so one can only be
/// built once the call's `start` has been seen.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum CallerFrame {
    /// Audio to play to the caller.
    Media {
        #[serde(rename = "streamSid")]
        stream_sid: String,
        media: MediaBody,
    },
    /// Flushes any audio the provider has buffered for playback.
    Clear {
        #[serde(rename = "streamSid")]
        stream_sid: String,
    },
}

impl CallerFrame {
    pub fn media(stream_sid: impl Into<String>, payload: impl Into<String>) -> Self {
        Self::Media {
            stream_sid: stream_sid.into(),
            media: MediaBody {
                payload: payload.into(),
            },
        }
    }

    pub fn clear(stream_sid: impl Into<String>) -> Self {
        Self::Clear {
            stream_sid: stream_sid.into(),
        }
    }

    /// Serializes the frame into its JSON text form.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
