//! Decoding of tool-invocation results.
//!
//! Tool responses arrive as a heterogeneous content envelope. Instead of
//! probing for attribute presence downstream, the envelope is decoded once at
//! the session boundary into an explicit tagged variant; callers branch on
//! the tag before interpreting the payload, never coercing implicitly.

use serde::Deserialize;
use serde_json::Value;

use crate::error::{CrosspayError, Result};

/// Decoded result of a tool invocation.
///
/// The single-vs-multi distinction is load-bearing: callers rely on a lone
/// content entry arriving unwrapped rather than re-wrapped in a list.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolInvocationResult {
    /// The response carried exactly one content entry; its value, unwrapped.
    Single(Value),
    /// The response carried more than one content entry.
    Multi(Vec<Value>),
    /// The response was not list-shaped (or its content list was empty);
    /// returned verbatim.
    Raw(Value),
}

/// Applies the content-envelope decode rule to a raw invocation result.
///
/// A content list with exactly one entry unwraps to that entry's value; more
/// than one entry yields the list of values; anything else is returned
/// verbatim. An entry's value is its `text` field when present, its
/// `resource` field otherwise, or the entry itself as a last resort.
pub fn decode_invocation_result(result: Value) -> ToolInvocationResult {
    let Some(entries) = result.get("content").and_then(Value::as_array) else {
        return ToolInvocationResult::Raw(result);
    };

    let mut values: Vec<Value> = entries.iter().map(entry_value).collect();
    match values.len() {
        0 => ToolInvocationResult::Raw(result),
        1 => ToolInvocationResult::Single(values.remove(0)),
        _ => ToolInvocationResult::Multi(values),
    }
}

fn entry_value(entry: &Value) -> Value {
    if let Some(text) = entry.get("text") {
        text.clone()
    } else if let Some(resource) = entry.get("resource") {
        resource.clone()
    } else {
        entry.clone()
    }
}

/// Payment details echoed back when the listener arms successfully.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentTaskStatus {
    pub success: bool,
    #[serde(default)]
    pub payment_url: Option<String>,
    #[serde(default)]
    pub payment_details: Option<Value>,
}

/// Parses the nested task-status document returned by the payment-processing
/// operation.
///
/// The outer document wraps the useful payload two levels deep: the innermost
/// text field at `status.message.parts[0].text` is itself JSON carrying
/// `{ success, paymentUrl?, paymentDetails? }`.
pub fn parse_payment_task_status(text: &str) -> Result<PaymentTaskStatus> {
    let outer: Value = serde_json::from_str(text)?;

    let inner_text = outer
        .pointer("/status/message/parts/0/text")
        .and_then(Value::as_str)
        .ok_or_else(|| CrosspayError::ToolInvocation {
            reason: "task-status document missing inner text payload".to_string(),
        })?;

    Ok(serde_json::from_str(inner_text)?)
}
