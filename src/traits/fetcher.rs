use async_trait::async_trait;
use std::collections::HashMap;

use crate::sandbox::WasmResult;

/// A single GET request for remote bytes.
///
/// Requests never carry ambient credentials such as cookies; everything the
/// source needs travels in `headers`. When `max_body_bytes` is set, a fetcher
/// must fail with a validation error rather than buffer a larger body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub max_body_bytes: Option<usize>,
}

impl FetchRequest {
    pub fn new(url: impl Into<String>, headers: Vec<(String, String)>) -> Self {
        Self {
            url: url.into(),
            headers,
            max_body_bytes: None,
        }
    }

    pub fn with_max_body_bytes(mut self, max: usize) -> Self {
        self.max_body_bytes = Some(max);
        self
    }
}

/// Raw response to a [`FetchRequest`].
///
/// Header names are lowercased.
#[derive(Debug, Clone, Default)]
pub struct FetchResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// Fetch seam for module and grammar bytes.
///
/// Transport failures are errors; non-success statuses are returned as a
/// normal response and judged by the caller.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: FetchRequest) -> WasmResult<FetchResponse>;
}
