// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for engine facade lifecycle events.

use std::fmt::{Display, Formatter};

/// Engine initialized with a compiled artifact.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use infer_sandbox::observability::messages::engine::EngineInitialized;
///
/// let msg = EngineInitialized {
///     source_name: "public engine",
///     url: "https://example.com/infer.wasm",
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct EngineInitialized<'a> {
    pub source_name: &'a str,
    pub url: &'a str,
}

impl Display for EngineInitialized<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Inference engine initialized from '{}' ({})",
            self.source_name, self.url
        )
    }
}

/// Engine initialization failed.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct InitializationFailed<'a> {
    pub source_name: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for InitializationFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Failed to initialize inference engine from '{}': {}",
            self.source_name, self.error
        )
    }
}

/// Source update matched the current configuration.
///
/// # Log Level
/// `debug!` - Diagnostic detail
pub struct SourceUnchanged<'a> {
    pub source_name: &'a str,
}

impl Display for SourceUnchanged<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Source '{}' unchanged, keeping compiled module",
            self.source_name
        )
    }
}

/// Source configuration changed; engine reset.
///
/// # Log Level
/// `info!` - Important operational event
pub struct SourceChanged<'a> {
    pub previous_url: &'a str,
    pub url: &'a str,
}

impl Display for SourceChanged<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Source configuration changed ({} -> {}), engine reset",
            self.previous_url, self.url
        )
    }
}

/// Engine torn down.
///
/// # Log Level
/// `info!` - Important operational event
pub struct EngineDestroyed;

impl Display for EngineDestroyed {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Inference engine destroyed")
    }
}

/// A single request failed inside the sandbox.
///
/// # Log Level
/// `warn!` - Converted into a failed response
pub struct InvocationFailed<'a> {
    pub command: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for InvocationFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Invocation '{}' failed: {}", self.command, self.error)
    }
}

/// Structured decode failed; raw text is used instead.
///
/// # Log Level
/// `debug!` - Expected for engines that print plain text
pub struct RawOutputFallback {
    pub output_size: usize,
}

impl Display for RawOutputFallback {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Output is not structured data, returning {} bytes as raw type text",
            self.output_size
        )
    }
}
