// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for instance pool events.

use std::fmt::{Display, Formatter};

/// Instance admitted into the active set.
///
/// # Log Level
/// `debug!` - Diagnostic detail
pub struct InstanceAdmitted {
    pub instance_id: u64,
    pub active: usize,
    pub max_concurrent: usize,
}

impl Display for InstanceAdmitted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Admitted instance #{} ({}/{} active)",
            self.instance_id, self.active, self.max_concurrent
        )
    }
}

/// Admission deferred because the pool is at capacity.
///
/// # Log Level
/// `trace!` - Emitted on every back-off
pub struct AdmissionDeferred {
    pub attempt: u32,
    pub backoff_ms: u64,
    pub max_concurrent: usize,
}

impl Display for AdmissionDeferred {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Pool at capacity ({}), retrying admission in {}ms (attempt {})",
            self.max_concurrent, self.backoff_ms, self.attempt
        )
    }
}

/// Instance removed from the active set.
///
/// # Log Level
/// `debug!` - Diagnostic detail
pub struct InstanceReleased {
    pub instance_id: u64,
    pub remaining: usize,
}

impl Display for InstanceReleased {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Released instance #{} ({} still active)",
            self.instance_id, self.remaining
        )
    }
}

/// Instantiating the artifact failed after admission.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct InstantiationFailed<'a> {
    pub instance_id: u64,
    pub error: &'a dyn std::error::Error,
}

impl Display for InstantiationFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Failed to instantiate instance #{}: {}",
            self.instance_id, self.error
        )
    }
}

/// Instance ran to completion.
///
/// # Log Level
/// `debug!` - Diagnostic detail
pub struct InstanceCompleted {
    pub instance_id: u64,
    pub output_size: usize,
    pub fuel_consumed: u64,
}

impl Display for InstanceCompleted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Instance #{} finished: output={} bytes, fuel_consumed={}",
            self.instance_id, self.output_size, self.fuel_consumed
        )
    }
}

/// Pool bookkeeping cleared.
///
/// # Log Level
/// `info!` - Important operational event
pub struct PoolReset {
    pub discarded: usize,
}

impl Display for PoolReset {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Instance pool reset, discarded {} active entries", self.discarded)
    }
}
