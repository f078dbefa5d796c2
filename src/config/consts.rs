/// Default fuel level for WASM execution (100 million instructions)
pub const DEFAULT_FUEL_LEVEL: u64 = 100_000_000;
/// Minimum allowed fuel level (1 million instructions)
pub const MIN_FUEL_LEVEL: u64 = 1_000_000;
/// Maximum allowed fuel level (500 million instructions) - security limit
pub const MAX_FUEL_LEVEL: u64 = 500_000_000;

/// Default number of sandbox instances allowed to run at once
pub const DEFAULT_MAX_CONCURRENT_INSTANCES: usize = 2;
/// Fixed delay before a deferred admission is retried
pub const DEFAULT_ADMISSION_BACKOFF_MS: u64 = 50;

/// Maximum allowed module size (16MB)
pub const DEFAULT_MAX_MODULE_SIZE: usize = 16 * 1024 * 1024;
/// Linear memory cap per instance (64MB)
pub const DEFAULT_MAX_MEMORY_BYTES: usize = 64 * 1024 * 1024;
/// Captured stdout per instance (4MB)
pub const DEFAULT_STDOUT_CAPACITY: usize = 4 * 1024 * 1024;
/// Captured stderr per instance (256KB)
pub const DEFAULT_STDERR_CAPACITY: usize = 256 * 1024;

/// Program name passed as argv[0] to the sandboxed module
pub const PROGRAM_NAME: &str = "infer";

/// Buffered last-modified notifications per subscriber
pub const SOURCE_MODIFIED_CHANNEL_CAPACITY: usize = 16;
