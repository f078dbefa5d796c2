// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::observability::messages::engine::RawOutputFallback;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Outcome of one inference or subtyping request.
///
/// `error` is present exactly when `success` is false.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default)]
    pub steps: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl InvocationResponse {
    pub fn ok(result: Value, steps: Vec<Value>) -> Self {
        Self {
            success: true,
            result: Some(result),
            steps,
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            result: None,
            steps: Vec::new(),
            error: Some(message.into()),
        }
    }
}

/// Decode captured output.
///
/// Structured output is returned as-is with its `steps` array lifted out.
/// Anything that does not parse is still a success: the trimmed text becomes
/// `{"type": text}`.
pub fn decode(raw: &str) -> InvocationResponse {
    let trimmed = raw.trim_end();

    match serde_json::from_str::<Value>(trimmed) {
        Ok(value) => {
            let steps = value
                .get("steps")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            InvocationResponse::ok(value, steps)
        }
        Err(_) => {
            tracing::debug!(
                "{}",
                RawOutputFallback {
                    output_size: trimmed.len(),
                }
            );
            InvocationResponse::ok(json!({ "type": trimmed }), Vec::new())
        }
    }
}
