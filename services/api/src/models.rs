//! Request and response bodies for the HTTP API, documented with `utoipa`.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct HealthResponse {
    #[schema(example = "Server is running")]
    pub message: String,
    /// Number of telephony connections currently bridged.
    #[schema(example = 2)]
    pub active_calls: usize,
}

/// Body of `POST /outbound-call`.
///
/// `number` is optional at the schema level so a missing value is reported
/// as a 400 with a readable message rather than a deserialization rejection.
#[derive(Deserialize, ToSchema, Debug, Default)]
pub struct OutboundCallPayload {
    #[schema(example = "+15552223333")]
    #[serde(default)]
    pub number: Option<String>,
    #[schema(example = "You are a friendly assistant reminding the user about their dentist appointment.")]
    #[serde(default)]
    pub prompt: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct OutboundCallResponse {
    pub success: bool,
    #[schema(example = "Call initiated")]
    pub message: String,
    #[serde(rename = "callSid")]
    #[schema(example = "CA0123456789abcdef0123456789abcdef")]
    pub call_sid: String,
}

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outbound_call_payload_deserialization() {
        let payload: OutboundCallPayload =
            serde_json::from_str(r#"{"number": "+15552223333", "prompt": "Say hi"}"#).unwrap();
        assert_eq!(payload.number.as_deref(), Some("+15552223333"));
        assert_eq!(payload.prompt.as_deref(), Some("Say hi"));
    }

    #[test]
    fn test_outbound_call_payload_fields_are_optional() {
        let payload: OutboundCallPayload = serde_json::from_str("{}").unwrap();
        assert!(payload.number.is_none());
        assert!(payload.prompt.is_none());
    }

    #[test]
    fn test_outbound_call_response_uses_call_sid_key() {
        let response = OutboundCallResponse {
            success: true,
            message: "Call initiated".to_string(),
            call_sid: "CA42".to_string(),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "success": true, "message": "Call initiated", "callSid": "CA42" })
        );
    }

    #[test]
    fn test_health_response_serialization() {
        let health = HealthResponse {
            message: "Server is running".to_string(),
            active_calls: 3,
        };
        let json = serde_json::to_string(&health).unwrap();
        assert_eq!(json, r#"{"message":"Server is running","active_calls":3}"#);
    }

    #[test]
    fn test_error_response_serialization() {
        let error = ErrorResponse {
            message: "Phone number is required".to_string(),
        };
        let json = serde_json::to_string(&error).unwrap();
        assert_eq!(json, r#"{"message":"Phone number is required"}"#);
    }
}
