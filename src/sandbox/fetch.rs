// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Module byte acquisition
//!
//! Two ways to get bytes: [`load_wasm_bytes`] reads a local file with a size
//! guard, [`HttpFetcher`] performs a credential-free GET with explicit
//! headers and an optional body cap. Neither parses the bytes; that is the detector's job.

use crate::observability::messages::loader::{ModuleLoadFailed, ModuleLoaded};
use crate::sandbox::error::{WasmError, WasmResult};
use crate::traits::{FetchRequest, FetchResponse, Fetcher};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::collections::HashMap;
use std::path::Path;

/// Loads WASM bytes from a file and validates the size
///
/// The file's length is checked before it is read, and again afterwards in
/// case it grew in between.
///
/// # Returns
/// * `Ok(Vec<u8>)` - The WASM binary bytes
/// * `Err(WasmError)` - If file cannot be read or size exceeds `max_size`
pub async fn load_wasm_bytes<P: AsRef<Path>>(path: P, max_size: usize) -> WasmResult<Vec<u8>> {
    let path = path.as_ref();
    let result = read_bounded(path, max_size).await;

    match &result {
        Ok(bytes) => tracing::info!(
            "{}",
            ModuleLoaded {
                module_path: &path.display().to_string(),
                size_bytes: bytes.len(),
            }
        ),
        Err(error) => tracing::error!(
            "{}",
            ModuleLoadFailed {
                module_path: &path.display().to_string(),
                error,
            }
        ),
    }

    result
}

async fn read_bounded(path: &Path, max_size: usize) -> WasmResult<Vec<u8>> {
    let metadata = tokio::fs::metadata(path).await?;
    check_length(metadata.len(), max_size)?;

    let bytes = tokio::fs::read(path).await?;
    check_size(&bytes, max_size)?;
    Ok(bytes)
}

/// Rejects payloads larger than `max_size`.
pub fn check_size(bytes: &[u8], max_size: usize) -> WasmResult<()> {
    check_length(bytes.len() as u64, max_size)
}

/// Rejects a declared or observed length larger than `max_size`.
pub fn check_length(len: u64, max_size: usize) -> WasmResult<()> {
    if len > max_size as u64 {
        return Err(WasmError::Validation(format!(
            "WASM file too large: {} bytes (max: {} bytes)",
            len, max_size
        )));
    }
    Ok(())
}

/// [`Fetcher`] backed by `reqwest`.
///
/// The client has no cookie store, so no ambient credentials are ever sent.
#[derive(Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn header_map(headers: &[(String, String)]) -> WasmResult<HeaderMap> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| WasmError::Validation(format!("Invalid header name '{}': {}", name, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| WasmError::Validation(format!("Invalid value for header '{}': {}", name.as_str(), e)))?;
        map.insert(name, value);
    }
    Ok(map)
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: FetchRequest) -> WasmResult<FetchResponse> {
        let headers = header_map(&request.headers)?;

        let mut response = self
            .client
            .get(&request.url)
            .headers(headers)
            .send()
            .await
            .map_err(|e| WasmError::Transport(e.to_string()))?;

        if let (Some(max), Some(declared)) = (request.max_body_bytes, response.content_length()) {
            check_length(declared, max)?;
        }

        let status = response.status();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();

        // Bodies without a declared length are bounded here.
        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| WasmError::Transport(e.to_string()))?
        {
            body.extend_from_slice(&chunk);
            if let Some(max) = request.max_body_bytes {
                check_length(body.len() as u64, max)?;
            }
        }

        Ok(FetchResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
        })
    }
}
