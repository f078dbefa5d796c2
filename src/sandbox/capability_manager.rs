// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! WASM engine configuration
//!
//! Builds the single Wasmtime engine a loader compiles every artifact with.
//! The engine is locked down to the core-module feature set a WASI command
//! needs.

use crate::observability::messages::loader::EngineCreationStarted;
use crate::sandbox::error::{WasmError, WasmResult};
use wasmtime::{Config, Engine};

/// Creates a Wasmtime engine for core WASI command modules
///
/// **Disabled features:** threads, SIMD, relaxed SIMD, multi-memory,
/// memory64 and the component model.
///
/// **Enabled:** fuel consumption, so each instance runs on an instruction
/// budget.
pub fn create_engine() -> WasmResult<Engine> {
    tracing::debug!("{}", EngineCreationStarted { fuel_enabled: true });

    let mut config = Config::new();

    config.wasm_component_model(false);
    config.wasm_threads(false);
    config.wasm_simd(false);
    config.wasm_relaxed_simd(false);
    config.wasm_multi_memory(false);
    config.wasm_memory64(false);
    config.consume_fuel(true);
    config.epoch_interruption(false);

    Engine::new(&config).map_err(|e| WasmError::Engine(e.to_string()))
}
