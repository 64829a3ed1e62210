//! Tool-invocation session.
//!
//! One logical connection to a remote tool endpoint: the server streams its
//! side over SSE while the client posts JSON-RPC requests to a
//! session-scoped URL announced in the stream's first event. The session is
//! used here to arm the downstream payment listener before a transfer
//! starts.

mod envelope;
mod rpc;
mod sse;

pub use envelope::{
    decode_invocation_result, parse_payment_task_status, PaymentTaskStatus, ToolInvocationResult,
};
pub use sse::{SseDecoder, SseEvent};

use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::error::{CrosspayError, Result};
use rpc::{JsonRpcRequest, JsonRpcResponse};

/// Protocol revision sent during the handshake.
const PROTOCOL_VERSION: &str = "2024-11-05";

/// Budget for the endpoint announcement and handshake round-trip.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Per-request timeout for posted calls.
const POST_TIMEOUT: Duration = Duration::from_secs(30);

/// Server identity returned by the handshake.
#[derive(Debug, Clone)]
pub struct ServerIdentity {
    pub name: String,
    pub version: String,
    pub protocol_version: String,
}

/// One operation exposed by the endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct OperationInfo {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "inputSchema")]
    pub input_schema: Value,
}

/// A single logical connection to a tool-invocation endpoint.
///
/// Operations after [`close`](Self::close) fail with `NotConnected`; `close`
/// itself is safe to call any number of times.
#[derive(Debug)]
pub struct ToolSession {
    inner: Option<Connection>,
}

#[derive(Debug)]
struct Connection {
    client: Client,
    post_url: Url,
    identity: ServerIdentity,
    incoming: mpsc::Receiver<JsonRpcResponse>,
    reader: JoinHandle<()>,
    next_id: u64,
}

impl ToolSession {
    /// Establishes a session with the endpoint and performs the handshake.
    ///
    /// # Errors
    ///
    /// Fails with `Connection` if the endpoint is unreachable, never
    /// announces a session URL, or rejects the handshake.
    pub async fn connect(endpoint: Url) -> Result<Self> {
        let client = Client::new();

        let response = client
            .get(endpoint.clone())
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| CrosspayError::Connection {
                reason: format!("failed to reach {endpoint}: {e}"),
            })?;

        let (message_tx, incoming) = mpsc::channel(64);
        let (endpoint_tx, endpoint_rx) = oneshot::channel();
        let reader = tokio::spawn(read_stream(response, endpoint_tx, message_tx));

        let announced = tokio::time::timeout(HANDSHAKE_TIMEOUT, endpoint_rx)
            .await
            .map_err(|_| CrosspayError::Connection {
                reason: "timed out waiting for session endpoint announcement".to_string(),
            })?
            .map_err(|_| CrosspayError::Connection {
                reason: "stream closed before announcing a session endpoint".to_string(),
            })?;

        // The announcement may be an absolute URL or a path relative to the
        // stream endpoint.
        let post_url = endpoint
            .join(&announced)
            .map_err(|e| CrosspayError::InvalidUrl {
                reason: format!("bad session endpoint {announced:?}: {e}"),
            })?;

        let mut connection = Connection {
            client,
            post_url,
            identity: ServerIdentity {
                name: String::new(),
                version: String::new(),
                protocol_version: String::new(),
            },
            incoming,
            reader,
            next_id: 0,
        };

        // A server may accept the POST yet never answer on the stream; the
        // handshake budget bounds that wait too.
        let handshake = handshake_deadline(connection.request(
            "initialize",
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {},
                "clientInfo": {
                    "name": env!("CARGO_PKG_NAME"),
                    "version": env!("CARGO_PKG_VERSION"),
                },
            }),
        ))
        .await
        .map_err(|e| match e {
            timeout @ CrosspayError::Connection { .. } => timeout,
            other => CrosspayError::Connection {
                reason: format!("handshake rejected: {other}"),
            },
        })?;

        connection.identity = ServerIdentity {
            name: json_string(&handshake, "/serverInfo/name"),
            version: json_string(&handshake, "/serverInfo/version"),
            protocol_version: json_string(&handshake, "/protocolVersion"),
        };
        connection.notify("notifications/initialized").await?;

        info!(
            server = %connection.identity.name,
            version = %connection.identity.version,
            event = "tool_session_connected"
        );

        Ok(Self {
            inner: Some(connection),
        })
    }

    /// Returns the identity reported by the server during the handshake.
    pub fn server_identity(&self) -> Result<&ServerIdentity> {
        self.inner
            .as_ref()
            .map(|c| &c.identity)
            .ok_or(CrosspayError::NotConnected)
    }

    /// Lists the operations the endpoint currently exposes.
    pub async fn list_operations(&mut self) -> Result<Vec<OperationInfo>> {
        let connection = self.connection_mut()?;
        let result = connection.request("tools/list", json!({})).await?;

        let tools = result.get("tools").cloned().unwrap_or(Value::Array(vec![]));
        Ok(serde_json::from_value(tools)?)
    }

    /// Invokes a named operation and decodes its content envelope.
    ///
    /// Blocks until a terminal response or transport error. Invocation is
    /// not idempotent: the operation this system uses arms a remote listener
    /// as a side effect, so it must be called at most once per transfer
    /// attempt.
    pub async fn invoke(
        &mut self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<ToolInvocationResult> {
        let connection = self.connection_mut()?;
        let result = connection
            .request("tools/call", json!({"name": name, "arguments": arguments}))
            .await?;

        if result
            .get("isError")
            .and_then(Value::as_bool)
            .unwrap_or(false)
        {
            return Err(CrosspayError::ToolInvocation {
                reason: error_summary(result),
            });
        }

        Ok(decode_invocation_result(result))
    }

    /// Releases the session and its transport.
    ///
    /// Idempotent; any operation after the first close fails with
    /// `NotConnected`.
    pub fn close(&mut self) {
        if let Some(connection) = self.inner.take() {
            connection.reader.abort();
            debug!(event = "tool_session_closed");
        }
    }

    fn connection_mut(&mut self) -> Result<&mut Connection> {
        self.inner.as_mut().ok_or(CrosspayError::NotConnected)
    }
}

impl Drop for ToolSession {
    fn drop(&mut self) {
        self.close();
    }
}

impl Connection {
    /// Posts a call and waits for the response with the matching id on the
    /// event stream.
    async fn request(&mut self, method: &str, params: Value) -> Result<Value> {
        self.next_id += 1;
        let id = self.next_id;
        let body = JsonRpcRequest::call(id, method, params);

        self.client
            .post(self.post_url.clone())
            .timeout(POST_TIMEOUT)
            .json(&body)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| CrosspayError::Connection {
                reason: format!("failed to post {method}: {e}"),
            })?;

        loop {
            let message =
                self.incoming
                    .recv()
                    .await
                    .ok_or_else(|| CrosspayError::Connection {
                        reason: "event stream closed mid-request".to_string(),
                    })?;

            // Server notifications and stale responses are skipped.
            if message.id != Some(id) {
                continue;
            }

            if let Some(error) = message.error {
                return Err(CrosspayError::ToolInvocation {
                    reason: format!("{} (code {})", error.message, error.code),
                });
            }
            return Ok(message.result.unwrap_or(Value::Null));
        }
    }

    /// Posts a fire-and-forget notification.
    async fn notify(&self, method: &str) -> Result<()> {
        let body = JsonRpcRequest::notification(method);
        self.client
            .post(self.post_url.clone())
            .timeout(POST_TIMEOUT)
            .json(&body)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| CrosspayError::Connection {
                reason: format!("failed to post {method}: {e}"),
            })?;
        Ok(())
    }
}

/// Applies the handshake budget to a wait, mapping expiry to a connection
/// failure.
async fn handshake_deadline<T>(
    wait: impl std::future::Future<Output = Result<T>>,
) -> Result<T> {
    tokio::time::timeout(HANDSHAKE_TIMEOUT, wait)
        .await
        .map_err(|_| CrosspayError::Connection {
            reason: "timed out waiting for the handshake response".to_string(),
        })?
}

/// Reads the SSE stream, routing the endpoint announcement and decoded
/// JSON-RPC messages to the session.
async fn read_stream(
    mut response: reqwest::Response,
    endpoint_tx: oneshot::Sender<String>,
    messages: mpsc::Sender<JsonRpcResponse>,
) {
    let mut decoder = SseDecoder::new();
    let mut endpoint_tx = Some(endpoint_tx);

    loop {
        let chunk = match response.chunk().await {
            Ok(Some(chunk)) => chunk,
            Ok(None) => break,
            Err(e) => {
                debug!(error = %e, event = "tool_stream_closed");
                break;
            }
        };

        for event in decoder.push(&chunk) {
            match event.event.as_str() {
                "endpoint" => {
                    if let Some(tx) = endpoint_tx.take() {
                        let _ = tx.send(event.data);
                    }
                }
                "message" => match serde_json::from_str::<JsonRpcResponse>(&event.data) {
                    Ok(message) => {
                        if messages.send(message).await.is_err() {
                            return;
                        }
                    }
                    Err(e) => warn!(error = %e, event = "tool_message_decode_failed"),
                },
                other => trace!(name = %other, event = "tool_event_ignored"),
            }
        }
    }
}

fn json_string(value: &Value, pointer: &str) -> String {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn error_summary(result: Value) -> String {
    match decode_invocation_result(result) {
        ToolInvocationResult::Single(Value::String(text)) => text,
        other => format!("{other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn closed_session() -> ToolSession {
        ToolSession { inner: None }
    }

    #[tokio::test]
    async fn test_operations_after_close_fail_not_connected() {
        let mut session = closed_session();

        assert!(matches!(
            session.list_operations().await.unwrap_err(),
            CrosspayError::NotConnected
        ));
        assert!(matches!(
            session.invoke("payment-processing", Map::new()).await,
            Err(CrosspayError::NotConnected)
        ));
        assert!(matches!(
            session.server_identity().unwrap_err(),
            CrosspayError::NotConnected
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_handshake_wait_is_bounded() {
        // A stream that stays open but never delivers the response.
        let (_keep_alive, mut incoming) = mpsc::channel::<JsonRpcResponse>(1);

        let result = handshake_deadline(async {
            incoming.recv().await;
            Ok(Value::Null)
        })
        .await;

        assert!(matches!(
            result.unwrap_err(),
            CrosspayError::Connection { reason } if reason.contains("timed out")
        ));
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut session = closed_session();
        session.close();
        session.close();
    }

    #[test]
    fn test_operation_info_deserializes_schema_field() {
        let raw = json!([{
            "name": "payment-processing",
            "description": "Arm the payment listener",
            "inputSchema": {"type": "object"}
        }]);

        let operations: Vec<OperationInfo> = serde_json::from_value(raw).unwrap();
        assert_eq!(operations[0].name, "payment-processing");
        assert_eq!(operations[0].input_schema["type"], "object");
    }
}
