//! JSON-RPC envelopes for the tool-invocation wire protocol.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";

/// Outgoing request or notification (no `id`).
#[derive(Debug, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    pub fn call(id: u64, method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id: Some(id),
            method: method.into(),
            params: Some(params),
        }
    }

    pub fn notification(method: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id: None,
            method: method.into(),
            params: None,
        }
    }
}

/// Incoming response; `id` is absent on server-initiated notifications.
#[derive(Debug, Deserialize)]
pub struct JsonRpcResponse {
    pub id: Option<u64>,
    pub result: Option<Value>,
    pub error: Option<JsonRpcErrorObject>,
}

#[derive(Debug, Deserialize)]
pub struct JsonRpcErrorObject {
    pub code: i64,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_call_serialization() {
        let request = JsonRpcRequest::call(1, "tools/list", json!({}));
        let raw = serde_json::to_value(&request).unwrap();

        assert_eq!(
            raw,
            json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list", "params": {}})
        );
    }

    #[test]
    fn test_notification_omits_id_and_params() {
        let request = JsonRpcRequest::notification("notifications/initialized");
        let raw = serde_json::to_value(&request).unwrap();

        assert_eq!(
            raw,
            json!({"jsonrpc": "2.0", "method": "notifications/initialized"})
        );
    }

    #[test]
    fn test_response_with_error() {
        let raw = r#"{"jsonrpc":"2.0","id":3,"error":{"code":-32601,"message":"unknown method"}}"#;
        let response: JsonRpcResponse = serde_json::from_str(raw).unwrap();

        assert_eq!(response.id, Some(3));
        assert!(response.result.is_none());
        assert_eq!(response.error.unwrap().code, -32601);
    }
}
