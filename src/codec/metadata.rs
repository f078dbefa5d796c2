// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::EngineError;
use serde::{Deserialize, Serialize};

/// An algorithm the module can run, as reported by `--meta`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlgorithmDescriptor {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub variants: Vec<VariantDescriptor>,
}

/// A variant is either a bare identifier or a described object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VariantDescriptor {
    Id(String),
    Described {
        id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
}

impl VariantDescriptor {
    pub fn id(&self) -> &str {
        match self {
            VariantDescriptor::Id(id) => id,
            VariantDescriptor::Described { id, .. } => id,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MetadataDocument {
    List(Vec<AlgorithmDescriptor>),
    Wrapped { algorithms: Vec<AlgorithmDescriptor> },
}

/// Decode `--meta` output.
///
/// Accepts a top-level array or an object with an `algorithms` array. Unlike
/// [`decode`](super::decode) there is no text fallback: unparseable output is
/// an error.
pub fn decode_metadata(raw: &str) -> Result<Vec<AlgorithmDescriptor>, EngineError> {
    let document: MetadataDocument =
        serde_json::from_str(raw.trim_end()).map_err(|e| EngineError::Decode(e.to_string()))?;

    Ok(match document {
        MetadataDocument::List(algorithms) => algorithms,
        MetadataDocument::Wrapped { algorithms } => algorithms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_top_level_array() {
        let raw = r#"[{"id":"HM","name":"Hindley-Milner","variants":["let-poly",{"id":"mono","description":"no generalization"}]}]
"#;
        let algorithms = decode_metadata(raw).unwrap();

        assert_eq!(algorithms.len(), 1);
        assert_eq!(algorithms[0].id, "HM");
        assert_eq!(algorithms[0].name.as_deref(), Some("Hindley-Milner"));
        let variants: Vec<&str> = algorithms[0].variants.iter().map(|v| v.id()).collect();
        assert_eq!(variants, ["let-poly", "mono"]);
    }

    #[test]
    fn test_decode_wrapped_object() {
        let algorithms = decode_metadata(r#"{"algorithms":[{"id":"AP"}]}"#).unwrap();
        assert_eq!(algorithms[0].id, "AP");
        assert!(algorithms[0].variants.is_empty());
    }

    #[test]
    fn test_unparseable_metadata_is_error() {
        let result = decode_metadata("Int -> Int");
        assert!(matches!(result, Err(EngineError::Decode(_))));
    }
}
