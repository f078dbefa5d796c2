// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for the single-flight asset cache.

use std::fmt::{Display, Formatter};

/// A caller started the shared load.
///
/// # Log Level
/// `info!` - Important operational event
pub struct AssetLoadStarted<'a> {
    pub asset: &'a str,
}

impl Display for AssetLoadStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Loading shared asset '{}'", self.asset)
    }
}

/// A caller joined a load already in flight.
///
/// # Log Level
/// `debug!` - Diagnostic detail
pub struct AssetLoadJoined<'a> {
    pub asset: &'a str,
}

impl Display for AssetLoadJoined<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Waiting on in-flight load of '{}'", self.asset)
    }
}

/// The shared load completed.
///
/// # Log Level
/// `info!` - Important operational event
pub struct AssetLoaded<'a> {
    pub asset: &'a str,
}

impl Display for AssetLoaded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Shared asset '{}' loaded", self.asset)
    }
}

/// The shared load failed; the cache returns to empty.
///
/// # Log Level
/// `warn!` - Callers fall back individually
pub struct AssetLoadFailed<'a> {
    pub asset: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for AssetLoadFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Loading shared asset '{}' failed, cache reset: {}",
            self.asset, self.error
        )
    }
}

/// The cache was cleared explicitly.
///
/// # Log Level
/// `info!` - Important operational event
pub struct AssetInvalidated<'a> {
    pub asset: &'a str,
}

impl Display for AssetInvalidated<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Shared asset '{}' invalidated", self.asset)
    }
}
