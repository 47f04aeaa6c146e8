//! JSON-RPC 2.0 envelopes exchanged with the host.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ErrorCode, Severity};

/// A JSON-RPC 2.0 request message.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct JsonRpcRequest<'a> {
    /// Protocol version, always "2.0".
    pub jsonrpc: &'static str,
    /// Request identifier, unique per connection.
    pub id: i64,
    /// Procedure to invoke.
    pub method: &'a str,
    /// Encoded request payload.
    pub params: Value,
}

impl<'a> JsonRpcRequest<'a> {
    /// Creates a request with a specific identifier.
    pub(crate) const fn with_id(id: i64, method: &'a str, params: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method,
            params,
        }
    }
}

/// A JSON-RPC 2.0 response message.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct JsonRpcResponse {
    /// Request identifier this response answers.
    #[serde(default)]
    pub id: Option<i64>,
    /// The result on success.
    #[serde(default)]
    pub result: Option<Value>,
    /// The error on failure.
    #[serde(default)]
    pub error: Option<JsonRpcError>,
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct JsonRpcError {
    /// Protocol-level error code.
    pub code: i64,
    /// Human-readable error message.
    pub message: String,
    /// Optional structured payload.
    #[serde(default)]
    pub data: Option<Value>,
}

/// Classification the host attaches to evaluation failures.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorData {
    /// Stable error code.
    pub code: ErrorCode,
    /// Severity tag.
    pub level: Severity,
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    fn serialises_request_on_one_line() {
        let request = JsonRpcRequest::with_id(7, "Plugin.EvalExpr", json!({"expr": {}}));
        let line = serde_json::to_string(&request).expect("serialise");

        assert!(!line.contains('\n'));
        assert!(line.contains(r#""jsonrpc":"2.0""#));
        assert!(line.contains(r#""id":7"#));
        assert!(line.contains(r#""method":"Plugin.EvalExpr""#));
    }

    #[rstest]
    fn deserialises_response_without_result() {
        let response: JsonRpcResponse =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":3}"#).expect("parse");

        assert_eq!(response.id, Some(3));
        assert!(response.result.is_none());
        assert!(response.error.is_none());
    }

    #[rstest]
    fn error_data_reads_code_and_level() {
        let data: ErrorData =
            serde_json::from_value(json!({"code": 1, "level": "warning"})).expect("parse");

        assert_eq!(data.code, ErrorCode::UnknownValue);
        assert_eq!(data.level, Severity::Warning);
    }
}
