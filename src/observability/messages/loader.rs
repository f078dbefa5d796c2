// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for module loading events.
//!
//! This module contains message types for logging events related to:
//! * Fetching module bytes from a remote or local source
//! * Classifying and compiling the bytes into an artifact
//! * Last-modified marker refreshes

use std::fmt::{Display, Formatter};

/// Module fetch started.
///
/// # Log Level
/// `debug!` - Diagnostic detail
///
/// # Example
/// ```
/// use infer_sandbox::observability::messages::loader::ModuleFetchStarted;
///
/// let msg = ModuleFetchStarted {
///     source_name: "public engine",
///     url: "https://example.com/infer.wasm",
///     auth_scheme: "bearer",
/// };
///
/// tracing::debug!("{}", msg);
/// ```
pub struct ModuleFetchStarted<'a> {
    pub source_name: &'a str,
    pub url: &'a str,
    pub auth_scheme: &'a str,
}

impl Display for ModuleFetchStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Fetching module for source '{}' from {} (auth={})",
            self.source_name, self.url, self.auth_scheme
        )
    }
}

/// Module bytes read successfully.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use infer_sandbox::observability::messages::loader::ModuleLoaded;
///
/// let msg = ModuleLoaded {
///     module_path: "wasm_modules/infer.wasm",
///     size_bytes: 4096,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct ModuleLoaded<'a> {
    pub module_path: &'a str,
    pub size_bytes: usize,
}

impl Display for ModuleLoaded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Loaded WASM module: {} ({} bytes)",
            self.module_path, self.size_bytes
        )
    }
}

/// Module loading failed.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use infer_sandbox::observability::messages::loader::ModuleLoadFailed;
///
/// let error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
/// let msg = ModuleLoadFailed {
///     module_path: "wasm_modules/missing.wasm",
///     error: &error,
/// };
///
/// tracing::error!("{}", msg);
/// ```
pub struct ModuleLoadFailed<'a> {
    pub module_path: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for ModuleLoadFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Failed to load WASM module '{}': {}",
            self.module_path, self.error
        )
    }
}

/// Module compiled into a reusable artifact.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ModuleCompiled<'a> {
    pub source_name: &'a str,
    pub size_bytes: usize,
    pub elapsed_ms: u128,
}

impl Display for ModuleCompiled<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Compiled module for source '{}': {} bytes in {}ms",
            self.source_name, self.size_bytes, self.elapsed_ms
        )
    }
}

/// WASM engine creation started.
///
/// # Log Level
/// `debug!` - Diagnostic detail
pub struct EngineCreationStarted {
    pub fuel_enabled: bool,
}

impl Display for EngineCreationStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Creating WASM engine for core modules (fuel={})",
            self.fuel_enabled
        )
    }
}

/// Source reported a new last-modified marker.
///
/// # Log Level
/// `info!` - Important operational event
pub struct LastModifiedRefreshed<'a> {
    pub source_name: &'a str,
    pub last_modified: &'a str,
}

impl Display for LastModifiedRefreshed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Source '{}' last modified at {}",
            self.source_name, self.last_modified
        )
    }
}

/// Source sent a last-modified header that could not be parsed.
///
/// # Log Level
/// `warn!` - Recoverable anomaly
pub struct LastModifiedUnparseable<'a> {
    pub source_name: &'a str,
    pub raw_value: &'a str,
}

impl Display for LastModifiedUnparseable<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Ignoring unparseable last-modified header '{}' from source '{}'",
            self.raw_value, self.source_name
        )
    }
}
