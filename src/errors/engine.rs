// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::sandbox::WasmError;
use thiserror::Error;

/// Errors surfaced by the inference engine facade.
///
/// Inference and subtyping requests only ever return `Unavailable`; every
/// other failure is folded into a failed response. Metadata requests
/// propagate all three variants.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Initialization (fetch, compile) failed before the request could run.
    #[error("Inference engine unavailable: initialization from '{source_name}' failed")]
    Unavailable { source_name: String },

    /// Output could not be parsed as structured data.
    #[error("Failed to decode engine output: {0}")]
    Decode(String),

    /// Sandbox-level failure (instantiation, trap, admission).
    #[error(transparent)]
    Sandbox(#[from] WasmError),
}
