// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::{
    DEFAULT_ADMISSION_BACKOFF_MS, DEFAULT_FUEL_LEVEL, DEFAULT_MAX_CONCURRENT_INSTANCES,
    DEFAULT_MAX_MEMORY_BYTES, DEFAULT_MAX_MODULE_SIZE, DEFAULT_STDERR_CAPACITY,
    DEFAULT_STDOUT_CAPACITY, MAX_FUEL_LEVEL, MIN_FUEL_LEVEL,
};
use crate::errors::ConfigError;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Main configuration structure for the inference engine runtime.
///
/// Every section is optional; an empty document yields the built-in defaults.
///
/// # Fields
/// * `pool` - Admission control for sandbox instances
/// * `wasm` - Compilation and per-instance resource limits
/// * `env` - Extra environment variables exposed to every instance
///
/// # Example
/// ```yaml
/// pool:
///   max_concurrent_instances: 2
///   admission_backoff_ms: 50
/// wasm:
///   max_module_size_bytes: 16777216
///   fuel:
///     default: 100000000
/// env:
///   RUST_BACKTRACE: "1"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub pool: PoolConfig,
    #[serde(default)]
    pub wasm: WasmConfig,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

/// Instance pool admission settings.
///
/// The pool is a soft limiter: callers that find it full sleep for
/// `admission_backoff_ms` and try again. There is no queue, so a caller can
/// lose the race repeatedly while others are admitted. Setting
/// `max_admission_attempts` bounds that loop.
#[derive(Debug, Clone, Deserialize)]
pub struct PoolConfig {
    #[serde(default = "default_max_concurrent_instances")]
    pub max_concurrent_instances: usize,
    #[serde(default = "default_admission_backoff_ms")]
    pub admission_backoff_ms: u64,
    #[serde(default)]
    pub max_admission_attempts: Option<u32>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_concurrent_instances: DEFAULT_MAX_CONCURRENT_INSTANCES,
            admission_backoff_ms: DEFAULT_ADMISSION_BACKOFF_MS,
            max_admission_attempts: None,
        }
    }
}

impl PoolConfig {
    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.admission_backoff_ms)
    }
}

fn default_max_concurrent_instances() -> usize {
    DEFAULT_MAX_CONCURRENT_INSTANCES
}

fn default_admission_backoff_ms() -> u64 {
    DEFAULT_ADMISSION_BACKOFF_MS
}

/// WASM-specific configuration options.
///
/// These options control module compilation and instance resource limits.
/// All fields are optional and use sensible defaults.
///
/// # Example
/// ```yaml
/// wasm:
///   max_memory_bytes: 67108864
///   stdout_capacity_bytes: 4194304
///   fuel:
///     default: 100000000
///     minimum: 1000000
///     maximum: 500000000
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct WasmConfig {
    #[serde(default)]
    pub fuel: FuelConfig,
    #[serde(default = "default_max_module_size")]
    pub max_module_size_bytes: usize,
    #[serde(default = "default_max_memory_bytes")]
    pub max_memory_bytes: usize,
    #[serde(default = "default_stdout_capacity")]
    pub stdout_capacity_bytes: usize,
    #[serde(default = "default_stderr_capacity")]
    pub stderr_capacity_bytes: usize,
}

impl Default for WasmConfig {
    fn default() -> Self {
        Self {
            fuel: FuelConfig::default(),
            max_module_size_bytes: DEFAULT_MAX_MODULE_SIZE,
            max_memory_bytes: DEFAULT_MAX_MEMORY_BYTES,
            stdout_capacity_bytes: DEFAULT_STDOUT_CAPACITY,
            stderr_capacity_bytes: DEFAULT_STDERR_CAPACITY,
        }
    }
}

fn default_max_module_size() -> usize {
    DEFAULT_MAX_MODULE_SIZE
}

fn default_max_memory_bytes() -> usize {
    DEFAULT_MAX_MEMORY_BYTES
}

fn default_stdout_capacity() -> usize {
    DEFAULT_STDOUT_CAPACITY
}

fn default_stderr_capacity() -> usize {
    DEFAULT_STDERR_CAPACITY
}

/// Fuel consumption configuration for WASM execution.
///
/// Fuel limits prevent infinite loops and resource exhaustion by limiting the number
/// of instructions a WASM module can execute. All values are optional and validated
/// against security bounds.
///
/// # Fields
/// * `default` - Fuel granted to each instance (defaults to 100M)
/// * `minimum` - Minimum allowed fuel level (defaults to 1M)
/// * `maximum` - Maximum allowed fuel level (defaults to 500M) - security limit
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FuelConfig {
    pub default: Option<u64>,
    pub minimum: Option<u64>,
    pub maximum: Option<u64>,
}

impl FuelConfig {
    /// Get the default fuel level, using built-in default if not configured.
    pub fn get_default(&self) -> u64 {
        self.default.unwrap_or(DEFAULT_FUEL_LEVEL)
    }

    /// Get the minimum fuel level, using built-in default if not configured.
    pub fn get_minimum(&self) -> u64 {
        self.minimum.unwrap_or(MIN_FUEL_LEVEL)
    }

    /// Get the maximum fuel level, using built-in default if not configured.
    pub fn get_maximum(&self) -> u64 {
        self.maximum.unwrap_or(MAX_FUEL_LEVEL)
    }

    /// Validate and clamp a fuel level to configured bounds.
    ///
    /// # Example
    /// ```
    /// use infer_sandbox::config::FuelConfig;
    ///
    /// let config = FuelConfig::default();
    /// let fuel = config.validate_and_clamp(1_000_000_000); // Too high
    /// assert_eq!(fuel, 500_000_000); // Clamped to maximum
    /// ```
    pub fn validate_and_clamp(&self, requested: u64) -> u64 {
        let min = self.get_minimum();
        let max = self.get_maximum();

        if requested < min || requested > max {
            tracing::warn!(
                "Fuel level {} outside [{}, {}], clamping",
                requested,
                min,
                max
            );
        }
        requested.clamp(min, max)
    }

    /// Fuel granted to a single instance.
    pub fn per_instance(&self) -> u64 {
        self.validate_and_clamp(self.get_default())
    }
}

/// Load a config from a YAML or TOML file, chosen by extension.
///
/// Files ending in `.toml` are parsed as TOML; anything else as YAML.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<EngineConfig, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;

    let is_toml = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("toml"))
        .unwrap_or(false);

    if is_toml {
        Ok(toml::from_str(&content)?)
    } else {
        Ok(serde_yaml::from_str(&content)?)
    }
}
