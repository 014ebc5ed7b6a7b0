//! Protocol message types for the tool server
//!
//! One JSON object per line in each direction. A caller submits a
//! [`ToolCallRequest`]; the server answers with exactly one [`ServerMessage`]
//! carrying the same `request_id`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// A single tool invocation request
///
/// # Examples
/// ```
/// use govsearch::protocol::ToolCallRequest;
/// use uuid::Uuid;
/// use serde_json::json;
///
/// let call = ToolCallRequest {
///     request_id: Uuid::new_v4(),
///     tool: "lookup_naics".to_string(),
///     params: json!({"naics_code": "541512"}),
/// };
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCallRequest {
    /// UUID v4 request identifier, echoed in the response
    pub request_id: Uuid,
    /// Registered tool name
    pub tool: String,
    /// Tool parameters, validated against the tool's declared schema
    #[serde(default = "default_params")]
    pub params: Value,
}

fn default_params() -> Value {
    Value::Object(serde_json::Map::new())
}

/// Successful tool invocation result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolResultMessage {
    /// Request identifier this result answers
    pub request_id: Uuid,
    /// Tool that produced the result
    pub tool: String,
    /// Tool output in its declared shape
    pub result: Value,
}

/// Error codes surfaced to callers
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    UnknownTool,
    ValidationFailed,
    RateLimited,
    NetworkError,
    UpstreamError,
    NotConfigured,
    DeadlineExceeded,
    InternalError,
}

/// Error payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorDetails {
    pub code: ErrorCode,
    pub message: String,
}

/// Failed tool invocation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorMessage {
    /// Request identifier this error answers
    pub request_id: Uuid,
    /// Tool the caller named, when one was named
    pub tool: Option<String>,
    pub error: ErrorDetails,
}

/// Any server-to-caller message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Result(ToolResultMessage),
    Error(ErrorMessage),
}

impl ServerMessage {
    /// Get the request_id regardless of variant
    pub fn request_id(&self) -> Uuid {
        match self {
            ServerMessage::Result(msg) => msg.request_id,
            ServerMessage::Error(msg) => msg.request_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_call_request_round_trip() {
        let call = ToolCallRequest {
            request_id: Uuid::new_v4(),
            tool: "search_contracts".to_string(),
            params: json!({"naics_code": "541511", "page_size": 10}),
        };

        let serialized = serde_json::to_string(&call).unwrap();
        let deserialized: ToolCallRequest = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized, call);
    }

    #[test]
    fn test_tool_call_request_params_default_to_empty_object() {
        let raw = json!({
            "request_id": "9f1c1e9e-9c2f-4f53-8f39-36a6eb5a5f5a",
            "tool": "search_agencies"
        });

        let call: ToolCallRequest = serde_json::from_value(raw).unwrap();
        assert_eq!(call.tool, "search_agencies");
        assert!(call.params.as_object().unwrap().is_empty());
    }

    #[test]
    fn test_server_message_result_tagging() {
        let msg = ServerMessage::Result(ToolResultMessage {
            request_id: Uuid::new_v4(),
            tool: "lookup_psc".to_string(),
            result: json!({"psc_codes": []}),
        });

        let serialized = serde_json::to_value(&msg).unwrap();
        assert_eq!(serialized["type"], "result");
        assert_eq!(serialized["tool"], "lookup_psc");
    }

    #[test]
    fn test_server_message_error_tagging() {
        let msg = ServerMessage::Error(ErrorMessage {
            request_id: Uuid::new_v4(),
            tool: Some("search_grants".to_string()),
            error: ErrorDetails {
                code: ErrorCode::ValidationFailed,
                message: "last_modified_date_min: expected YYYY-MM-DD".to_string(),
            },
        });

        let serialized = serde_json::to_value(&msg).unwrap();
        assert_eq!(serialized["type"], "error");
        assert_eq!(serialized["error"]["code"], "validation_failed");
    }

    #[test]
    fn test_error_code_serialization() {
        let cases = vec![
            (ErrorCode::UnknownTool, "\"unknown_tool\""),
            (ErrorCode::ValidationFailed, "\"validation_failed\""),
            (ErrorCode::RateLimited, "\"rate_limited\""),
            (ErrorCode::NetworkError, "\"network_error\""),
            (ErrorCode::UpstreamError, "\"upstream_error\""),
            (ErrorCode::NotConfigured, "\"not_configured\""),
            (ErrorCode::DeadlineExceeded, "\"deadline_exceeded\""),
            (ErrorCode::InternalError, "\"internal_error\""),
        ];

        for (code, expected) in cases {
            assert_eq!(serde_json::to_string(&code).unwrap(), expected);
        }
    }

    #[test]
    fn test_request_id_accessor() {
        let id = Uuid::new_v4();
        let msg = ServerMessage::Error(ErrorMessage {
            request_id: id,
            tool: None,
            error: ErrorDetails {
                code: ErrorCode::UnknownTool,
                message: "no such tool".to_string(),
            },
        });
        assert_eq!(msg.request_id(), id);
    }
}
