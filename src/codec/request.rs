// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::PROGRAM_NAME;
use serde::{Deserialize, Serialize};

/// Presentation options carried with a request.
///
/// Accepted and persisted but not encoded into the argument vector; the
/// module's command surface has no flags for them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_steps: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<u32>,
}

/// Type an expression with one algorithm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InferRequest {
    pub algorithm: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    pub expression: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<RequestOptions>,
}

impl InferRequest {
    pub fn new(algorithm: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            algorithm: algorithm.into(),
            variant: None,
            expression: expression.into(),
            options: None,
        }
    }

    pub fn with_variant(mut self, variant: impl Into<String>) -> Self {
        self.variant = Some(variant.into());
        self
    }
}

/// Check whether `left_type` is a subtype of `right_type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtypeRequest {
    pub algorithm: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    pub left_type: String,
    pub right_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<RequestOptions>,
}

impl SubtypeRequest {
    pub fn new(
        algorithm: impl Into<String>,
        left_type: impl Into<String>,
        right_type: impl Into<String>,
    ) -> Self {
        Self {
            algorithm: algorithm.into(),
            variant: None,
            left_type: left_type.into(),
            right_type: right_type.into(),
            options: None,
        }
    }

    pub fn with_variant(mut self, variant: impl Into<String>) -> Self {
        self.variant = Some(variant.into());
        self
    }
}

/// One logical request to the inference module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum InvocationRequest {
    Infer(InferRequest),
    Subtype(SubtypeRequest),
    Metadata,
}

impl InvocationRequest {
    /// Mode flag as it appears in the argument vector.
    pub fn command(&self) -> &'static str {
        match self {
            InvocationRequest::Infer(_) => "--typing",
            InvocationRequest::Subtype(_) => "--subtyping",
            InvocationRequest::Metadata => "--meta",
        }
    }
}

/// Serialize a request into the module's argument vector.
///
/// ```
/// use infer_sandbox::codec::{encode, InferRequest, InvocationRequest};
///
/// let argv = encode(&InvocationRequest::Infer(InferRequest::new("HM", "\\x.x")));
/// assert_eq!(argv, ["infer", "--typing", "HM", "\\x.x"]);
/// ```
pub fn encode(request: &InvocationRequest) -> Vec<String> {
    let mut argv = vec![PROGRAM_NAME.to_string(), request.command().to_string()];

    match request {
        InvocationRequest::Infer(req) => {
            argv.push(req.algorithm.clone());
            push_variant(&mut argv, req.variant.as_deref());
            argv.push(req.expression.clone());
        }
        InvocationRequest::Subtype(req) => {
            argv.push(req.algorithm.clone());
            push_variant(&mut argv, req.variant.as_deref());
            argv.push(req.left_type.clone());
            argv.push(req.right_type.clone());
        }
        InvocationRequest::Metadata => {}
    }

    argv
}

fn push_variant(argv: &mut Vec<String>, variant: Option<&str>) {
    if let Some(variant) = variant {
        argv.push("--variant".to_string());
        argv.push(variant.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_inference_without_variant() {
        let request = InvocationRequest::Infer(InferRequest::new("HM", "\\x.x"));
        assert_eq!(encode(&request), ["infer", "--typing", "HM", "\\x.x"]);
    }

    #[test]
    fn test_encode_inference_with_variant() {
        let request =
            InvocationRequest::Infer(InferRequest::new("HM", "\\x.x").with_variant("let-poly"));
        assert_eq!(
            encode(&request),
            ["infer", "--typing", "HM", "--variant", "let-poly", "\\x.x"]
        );
    }

    #[test]
    fn test_encode_subtyping() {
        let request = InvocationRequest::Subtype(
            SubtypeRequest::new("AP", "Int -> Top", "Bot -> Int").with_variant("recursive"),
        );
        assert_eq!(
            encode(&request),
            [
                "infer",
                "--subtyping",
                "AP",
                "--variant",
                "recursive",
                "Int -> Top",
                "Bot -> Int"
            ]
        );
    }

    #[test]
    fn test_encode_metadata() {
        assert_eq!(encode(&InvocationRequest::Metadata), ["infer", "--meta"]);
    }

    #[test]
    fn test_options_are_not_encoded() {
        let mut req = InferRequest::new("HM", "1");
        req.options = Some(RequestOptions {
            show_steps: Some(true),
            max_depth: Some(3),
        });
        assert_eq!(
            encode(&InvocationRequest::Infer(req)),
            ["infer", "--typing", "HM", "1"]
        );
    }

    #[test]
    fn test_request_serde_shape() {
        let json = r#"{"kind":"subtype","algorithm":"AP","leftType":"Int","rightType":"Top","options":{"showSteps":true}}"#;
        let request: InvocationRequest = serde_json::from_str(json).unwrap();

        match &request {
            InvocationRequest::Subtype(req) => {
                assert_eq!(req.left_type, "Int");
                assert_eq!(req.right_type, "Top");
                assert!(req.variant.is_none());
                assert_eq!(req.options.as_ref().unwrap().show_steps, Some(true));
            }
            other => panic!("Expected subtype request, got {:?}", other),
        }

        let metadata: InvocationRequest = serde_json::from_str(r#"{"kind":"metadata"}"#).unwrap();
        assert_eq!(metadata, InvocationRequest::Metadata);
    }
}
