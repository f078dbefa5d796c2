// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Load-then-invoke orchestration.
//!
//! ## Failure handling
//! - `initialize()` never errors: load failures are logged and reported as `false`.
//! - Inference and subtyping return `Err` only for [`EngineError::Unavailable`];
//!   any later failure becomes a response with `success: false`.
//! - Metadata propagates every failure, including [`EngineError::Decode`].
//!
//! The slot lock is held across a load, so concurrent first requests share a
//! single fetch. It is not held while an instance runs.

use crate::codec::{
    decode, decode_metadata, encode, AlgorithmDescriptor, InferRequest, InvocationRequest,
    InvocationResponse, SubtypeRequest,
};
use crate::config::consts::SOURCE_MODIFIED_CHANNEL_CAPACITY;
use crate::config::{EngineConfig, WasmConfig};
use crate::engine::state::EngineState;
use crate::errors::EngineError;
use crate::observability::messages::engine::{
    EngineDestroyed, EngineInitialized, InitializationFailed, InvocationFailed, SourceChanged,
    SourceUnchanged,
};
use crate::sandbox::{
    CompiledArtifact, HttpFetcher, InstancePool, InstanceSpec, ModuleLoader, WasmResult,
};
use crate::source::{SourceDescriptor, SourceModified};
use crate::traits::Fetcher;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};

struct EngineSlot {
    source: SourceDescriptor,
    state: EngineState,
    metadata: Option<Vec<AlgorithmDescriptor>>,
    last_raw_output: Option<String>,
}

impl EngineSlot {
    fn reset(&mut self, pool: &InstancePool) {
        self.state = EngineState::Uninitialized;
        self.metadata = None;
        pool.reset();
    }
}

/// Facade over module loading, the instance pool and the codec.
pub struct InferenceEngine {
    loader: ModuleLoader,
    pool: InstancePool,
    wasm: WasmConfig,
    env: Vec<(String, String)>,
    notifier: broadcast::Sender<SourceModified>,
    slot: Mutex<EngineSlot>,
}

impl InferenceEngine {
    /// Engine that fetches over HTTP with its own notification channel.
    pub fn new(source: SourceDescriptor, config: &EngineConfig) -> Result<Self, EngineError> {
        let (notifier, _) = broadcast::channel(SOURCE_MODIFIED_CHANNEL_CAPACITY);
        Self::with_fetcher(source, config, Arc::new(HttpFetcher::new()), notifier)
    }

    pub fn with_fetcher(
        source: SourceDescriptor,
        config: &EngineConfig,
        fetcher: Arc<dyn Fetcher>,
        notifier: broadcast::Sender<SourceModified>,
    ) -> Result<Self, EngineError> {
        let loader = ModuleLoader::new(fetcher, notifier.clone(), &config.wasm)?;

        Ok(Self {
            loader,
            pool: InstancePool::new(config.pool.clone()),
            wasm: config.wasm.clone(),
            env: config
                .env
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            notifier,
            slot: Mutex::new(EngineSlot {
                source,
                state: EngineState::Uninitialized,
                metadata: None,
                last_raw_output: None,
            }),
        })
    }

    /// Load the module for the current source unless already loaded.
    pub async fn initialize(&self) -> bool {
        self.ensure_initialized().await.is_ok()
    }

    pub async fn run_inference(
        &self,
        request: InferRequest,
    ) -> Result<InvocationResponse, EngineError> {
        let artifact = self.ensure_initialized().await?;
        Ok(self.invoke(&artifact, InvocationRequest::Infer(request)).await)
    }

    pub async fn run_subtyping(
        &self,
        request: SubtypeRequest,
    ) -> Result<InvocationResponse, EngineError> {
        let artifact = self.ensure_initialized().await?;
        Ok(self.invoke(&artifact, InvocationRequest::Subtype(request)).await)
    }

    /// Algorithms the module supports. Cached until the source changes.
    pub async fn get_metadata(&self) -> Result<Vec<AlgorithmDescriptor>, EngineError> {
        let artifact = self.ensure_initialized().await?;

        if let Some(cached) = self.slot.lock().await.metadata.clone() {
            return Ok(cached);
        }

        let stdout = self
            .execute(&artifact, &InvocationRequest::Metadata)
            .await?;
        self.record_raw_output(&stdout).await;
        let algorithms = decode_metadata(&stdout)?;

        let mut slot = self.slot.lock().await;
        // Only cache against the artifact that produced it
        if slot
            .state
            .artifact()
            .is_some_and(|current| Arc::ptr_eq(current, &artifact))
        {
            slot.metadata = Some(algorithms.clone());
        }

        Ok(algorithms)
    }

    /// Switch to `source`. A no-op when URL, auth and locality are unchanged.
    pub async fn update_source(&self, source: SourceDescriptor) {
        let mut slot = self.slot.lock().await;

        if slot.source.same_configuration(&source) {
            tracing::debug!(
                "{}",
                SourceUnchanged {
                    source_name: &source.name,
                }
            );
            return;
        }

        tracing::info!(
            "{}",
            SourceChanged {
                previous_url: &slot.source.url,
                url: &source.url,
            }
        );
        slot.source = source;
        slot.reset(&self.pool);
    }

    /// Drop the compiled module and every cached output.
    pub async fn destroy(&self) {
        let mut slot = self.slot.lock().await;
        slot.reset(&self.pool);
        slot.last_raw_output = None;
        tracing::info!("{}", EngineDestroyed);
    }

    /// Last-modified notifications from this engine's loads.
    pub fn subscribe(&self) -> broadcast::Receiver<SourceModified> {
        self.notifier.subscribe()
    }

    pub async fn state(&self) -> EngineState {
        self.slot.lock().await.state.clone()
    }

    pub async fn source(&self) -> SourceDescriptor {
        self.slot.lock().await.source.clone()
    }

    /// Captured stdout of the most recent completed run.
    pub async fn last_raw_output(&self) -> Option<String> {
        self.slot.lock().await.last_raw_output.clone()
    }

    pub fn pool(&self) -> &InstancePool {
        &self.pool
    }

    async fn ensure_initialized(&self) -> Result<Arc<CompiledArtifact>, EngineError> {
        let mut slot = self.slot.lock().await;
        if let Some(artifact) = slot.state.artifact() {
            return Ok(Arc::clone(artifact));
        }

        match self.loader.load(&mut slot.source).await {
            Ok(artifact) => {
                tracing::info!(
                    "{}",
                    EngineInitialized {
                        source_name: &slot.source.name,
                        url: &slot.source.url,
                    }
                );
                slot.state = EngineState::Initialized(Arc::clone(&artifact));
                Ok(artifact)
            }
            Err(error) => {
                tracing::error!(
                    "{}",
                    InitializationFailed {
                        source_name: &slot.source.name,
                        error: &error,
                    }
                );
                Err(EngineError::Unavailable {
                    source_name: slot.source.name.clone(),
                })
            }
        }
    }

    async fn invoke(
        &self,
        artifact: &Arc<CompiledArtifact>,
        request: InvocationRequest,
    ) -> InvocationResponse {
        match self.execute(artifact, &request).await {
            Ok(stdout) => {
                self.record_raw_output(&stdout).await;
                decode(&stdout)
            }
            Err(error) => {
                tracing::warn!(
                    "{}",
                    InvocationFailed {
                        command: request.command(),
                        error: &error,
                    }
                );
                InvocationResponse::failure(error.to_string())
            }
        }
    }

    /// Run one instance to completion and return its captured stdout.
    async fn execute(
        &self,
        artifact: &Arc<CompiledArtifact>,
        request: &InvocationRequest,
    ) -> WasmResult<String> {
        let spec = InstanceSpec::new(encode(request), &self.wasm).with_env(self.env.clone());
        let instance = self.pool.create_instance(artifact, spec).await?;

        let output = instance.start().await?;

        Ok(output.stdout)
    }

    async fn record_raw_output(&self, stdout: &str) {
        self.slot.lock().await.last_raw_output = Some(stdout.to_string());
    }
}
