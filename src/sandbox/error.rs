// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Error types for sandbox operations.
//!
//! Covers every stage between a source descriptor and captured output:
//! fetching, classification, compilation, admission, instantiation and
//! execution. All errors implement `std::error::Error` via `thiserror`.

use thiserror::Error;

/// Error message for binaries that are not core WASM modules.
pub const WASM_UNSUPPORTED_ENCODING: &str = "Unsupported WASM binary: component binaries are not supported. \
The inference engine must be a core WASI command module.";

/// Error type for all sandbox operations.
#[derive(Error, Debug)]
pub enum WasmError {
    /// The source answered with a non-success status.
    #[error("Fetch failed: {status} {status_text}")]
    Fetch { status: u16, status_text: String },

    /// The request never produced a response (DNS, TLS, connection).
    #[error("Transport error: {0}")]
    Transport(String),

    /// Malformed module bytes.
    #[error("Compile error: {0}")]
    Compile(String),

    /// Sandbox setup failed (linking, memory, start section).
    #[error("Instantiation error: {0}")]
    Instantiation(String),

    /// The module trapped, ran out of fuel or exited non-zero.
    #[error("WASM execution error: {0}")]
    Execution(String),

    /// Input validation error (size limits, header names, etc.).
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Not a core module.
    #[error("Unsupported encoding: {0}")]
    UnsupportedEncoding(String),

    /// The pool stayed full for every allowed admission attempt.
    #[error("Instance pool still full after {attempts} admission attempts")]
    AdmissionExhausted { attempts: u32 },

    /// File I/O error during module loading.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Wasmtime engine creation or configuration error.
    #[error("Engine creation error: {0}")]
    Engine(String),

    /// WASM binary parsing error from wasmparser.
    #[error("WASM parser error: {0}")]
    Parser(#[from] wasmparser::BinaryReaderError),
}

/// Result type alias for sandbox operations.
pub type WasmResult<T> = Result<T, WasmError>;
