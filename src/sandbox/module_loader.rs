// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! WASM Module Loading and Compilation
//!
//! ## Responsibilities
//! - Build credential headers and fetch module bytes (or read them from disk)
//! - Reject non-success responses and oversized payloads
//! - Record the source's last-modified marker and broadcast it
//! - Classify and compile the bytes into a shareable [`CompiledArtifact`]
//!
//! The loader itself does not memoize. Deciding whether a configuration is
//! unchanged (and therefore a cache hit) belongs to the engine facade.

use crate::config::WasmConfig;
use crate::observability::messages::loader::{
    LastModifiedRefreshed, LastModifiedUnparseable, ModuleCompiled, ModuleFetchStarted,
    ModuleLoadFailed, ModuleLoaded,
};
use crate::sandbox::capability_manager::create_engine;
use crate::sandbox::detector::require_core_module;
use crate::sandbox::error::{WasmError, WasmResult};
use crate::sandbox::fetch::{check_size, load_wasm_bytes};
use crate::source::{build_headers, SourceDescriptor, SourceModified};
use crate::traits::{FetchRequest, Fetcher};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast;
use wasmtime::{Engine, Module};

/// Compiled module bytes, immutable and shared by every instance.
#[derive(Debug)]
pub struct CompiledArtifact {
    engine: Engine,
    module: Module,
    source: SourceDescriptor,
    size_bytes: usize,
    compiled_at: DateTime<Utc>,
}

impl CompiledArtifact {
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    /// Snapshot of the descriptor this artifact was built from.
    pub fn source(&self) -> &SourceDescriptor {
        &self.source
    }

    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }

    pub fn compiled_at(&self) -> DateTime<Utc> {
        self.compiled_at
    }

    #[cfg(test)]
    pub(crate) fn from_bytes(bytes: &[u8]) -> Arc<Self> {
        let engine = create_engine().unwrap();
        let module = Module::new(&engine, bytes).unwrap();
        Arc::new(Self {
            engine,
            module,
            source: SourceDescriptor::local("test", "test.wasm"),
            size_bytes: bytes.len(),
            compiled_at: Utc::now(),
        })
    }
}

/// Fetches and compiles inference modules.
pub struct ModuleLoader {
    engine: Engine,
    fetcher: Arc<dyn Fetcher>,
    notifier: broadcast::Sender<SourceModified>,
    max_module_size: usize,
}

impl ModuleLoader {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        notifier: broadcast::Sender<SourceModified>,
        wasm: &WasmConfig,
    ) -> WasmResult<Self> {
        Ok(Self {
            engine: create_engine()?,
            fetcher,
            notifier,
            max_module_size: wasm.max_module_size_bytes,
        })
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Load and compile the module described by `source`.
    ///
    /// A last-modified marker in the response is written back into `source`
    /// and broadcast as a [`SourceModified`] notification.
    pub async fn load(&self, source: &mut SourceDescriptor) -> WasmResult<Arc<CompiledArtifact>> {
        let bytes = if source.is_local {
            load_wasm_bytes(source.local_path(), self.max_module_size).await?
        } else {
            self.fetch_remote(source).await?
        };

        self.compile(bytes, source).await
    }

    async fn fetch_remote(&self, source: &mut SourceDescriptor) -> WasmResult<Vec<u8>> {
        tracing::debug!(
            "{}",
            ModuleFetchStarted {
                source_name: &source.name,
                url: &source.url,
                auth_scheme: source.auth.kind(),
            }
        );

        let request = FetchRequest::new(source.url.clone(), build_headers(&source.auth))
            .with_max_body_bytes(self.max_module_size);

        let result = self.fetcher.fetch(request).await.and_then(|response| {
            if !response.is_success() {
                return Err(WasmError::Fetch {
                    status: response.status,
                    status_text: response.status_text,
                });
            }
            check_size(&response.body, self.max_module_size)?;
            Ok(response)
        });

        let response = result.map_err(|error| {
            tracing::error!(
                "{}",
                ModuleLoadFailed {
                    module_path: &source.url,
                    error: &error,
                }
            );
            error
        })?;

        if let Some(raw) = response.header("last-modified") {
            self.record_last_modified(source, raw);
        }

        tracing::info!(
            "{}",
            ModuleLoaded {
                module_path: &source.url,
                size_bytes: response.body.len(),
            }
        );

        Ok(response.body)
    }

    fn record_last_modified(&self, source: &mut SourceDescriptor, raw: &str) {
        let parsed = match DateTime::parse_from_rfc2822(raw) {
            Ok(ts) => ts.with_timezone(&Utc),
            Err(_) => {
                tracing::warn!(
                    "{}",
                    LastModifiedUnparseable {
                        source_name: &source.name,
                        raw_value: raw,
                    }
                );
                return;
            }
        };

        source.last_modified = Some(parsed);
        tracing::info!(
            "{}",
            LastModifiedRefreshed {
                source_name: &source.name,
                last_modified: &parsed.to_rfc3339(),
            }
        );

        // No subscribers is fine; the persisted layer is optional.
        let _ = self.notifier.send(SourceModified {
            source_id: source.id,
            last_modified: parsed,
        });
    }

    async fn compile(
        &self,
        bytes: Vec<u8>,
        source: &SourceDescriptor,
    ) -> WasmResult<Arc<CompiledArtifact>> {
        require_core_module(&bytes).map_err(|e| match e {
            WasmError::Parser(err) => WasmError::Compile(err.to_string()),
            other => other,
        })?;

        let started = Instant::now();
        let size_bytes = bytes.len();
        let engine = self.engine.clone();
        let module = tokio::task::spawn_blocking(move || Module::new(&engine, &bytes))
            .await
            .map_err(|e| WasmError::Compile(format!("compile task failed: {}", e)))?
            .map_err(|e| WasmError::Compile(e.to_string()))?;

        tracing::info!(
            "{}",
            ModuleCompiled {
                source_name: &source.name,
                size_bytes,
                elapsed_ms: started.elapsed().as_millis(),
            }
        );

        Ok(Arc::new(CompiledArtifact {
            engine: self.engine.clone(),
            module,
            source: source.clone(),
            size_bytes,
            compiled_at: Utc::now(),
        }))
    }
}
