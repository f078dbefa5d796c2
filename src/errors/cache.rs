// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Failure of a shared asset load.
///
/// Cloneable so every caller waiting on the same in-flight load receives the
/// same error value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("Loading '{asset}' failed: {message}")]
    LoadFailed { asset: String, message: String },
}
