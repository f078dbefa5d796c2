// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! WASM sandbox
//!
//! Everything between a source descriptor and captured guest output:
//!
//! - [`fetch`]: module bytes from disk or over HTTP
//! - [`detector`]: core module vs component classification
//! - [`capability_manager`]: the locked-down Wasmtime engine
//! - [`module_loader`]: fetch, classify and compile into a [`CompiledArtifact`]
//! - [`pool`]: admission-capped registry of running instances
//! - [`executor`]: one isolated WASI command run

pub mod capability_manager;
pub mod detector;
pub mod error;
pub mod executor;
pub mod fetch;
pub mod module_loader;
pub mod pool;

#[cfg(test)]
pub(crate) mod testing;

pub use detector::{detect_binary_kind, BinaryKind};
pub use error::{WasmError, WasmResult};
pub use executor::{InstanceSpec, RunOutput, SandboxInstance};
pub use fetch::HttpFetcher;
pub use module_loader::{CompiledArtifact, ModuleLoader};
pub use pool::{InstanceHandle, InstancePool, PoolStats};
