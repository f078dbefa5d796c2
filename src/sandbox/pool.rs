// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Instance pool and concurrency limiter.
//!
//! The pool tracks which sandbox instances are running and caps how many may
//! run at once. It is a soft limiter, not a queue: a caller that finds the
//! pool full sleeps for a fixed back-off and tries again. Nothing orders the
//! retries, so under sustained load one caller can keep losing the race while
//! others are admitted. `max_admission_attempts` bounds that wait; by default
//! it is unbounded.
//!
//! Every admitted slot is represented by an [`InstanceHandle`]. Dropping or
//! releasing the handle removes the slot exactly once, so a slot is freed on
//! every exit path, including instantiation failures and traps.

use crate::config::PoolConfig;
use crate::observability::messages::pool::{
    AdmissionDeferred, InstanceAdmitted, InstanceReleased, InstantiationFailed, PoolReset,
};
use crate::sandbox::error::{WasmError, WasmResult};
use crate::sandbox::executor::{InstanceSpec, SandboxInstance};
use crate::sandbox::module_loader::CompiledArtifact;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Pool statistics for observability.
///
/// All counters are atomic and can be read without locking.
#[derive(Debug, Default)]
pub struct PoolStats {
    admitted: AtomicU64,
    released: AtomicU64,
    deferrals: AtomicU64,
    peak_active: AtomicUsize,
}

impl PoolStats {
    /// Slots handed out since the pool was created.
    pub fn admitted(&self) -> u64 {
        self.admitted.load(Ordering::Relaxed)
    }

    /// Slots returned since the pool was created.
    pub fn released(&self) -> u64 {
        self.released.load(Ordering::Relaxed)
    }

    /// Times a caller found the pool full and backed off.
    pub fn deferrals(&self) -> u64 {
        self.deferrals.load(Ordering::Relaxed)
    }

    /// Highest number of simultaneously active slots observed.
    pub fn peak_active(&self) -> usize {
        self.peak_active.load(Ordering::Relaxed)
    }
}

struct PoolInner {
    max_concurrent: usize,
    config: PoolConfig,
    active: Mutex<HashSet<u64>>,
    next_id: AtomicU64,
    stats: PoolStats,
}

impl PoolInner {
    fn lock_active(&self) -> MutexGuard<'_, HashSet<u64>> {
        // The set stays consistent even if a holder panicked.
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn remove(&self, id: u64) {
        let remaining = {
            let mut active = self.lock_active();
            active.remove(&id);
            active.len()
        };
        self.stats.released.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(
            "{}",
            InstanceReleased {
                instance_id: id,
                remaining,
            }
        );
    }
}

/// One admitted slot in the active set.
///
/// Exclusively owned by the invocation that created it.
pub struct InstanceHandle {
    id: u64,
    pool: Arc<PoolInner>,
    released: bool,
}

impl InstanceHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Return the slot to the pool.
    pub fn release(mut self) {
        self.release_slot();
    }

    fn release_slot(&mut self) {
        if !self.released {
            self.released = true;
            self.pool.remove(self.id);
        }
    }
}

impl Drop for InstanceHandle {
    fn drop(&mut self) {
        self.release_slot();
    }
}

impl std::fmt::Debug for InstanceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstanceHandle")
            .field("id", &self.id)
            .field("released", &self.released)
            .finish()
    }
}

/// Admission-capped registry of running sandbox instances.
#[derive(Clone)]
pub struct InstancePool {
    inner: Arc<PoolInner>,
}

impl InstancePool {
    pub fn new(config: PoolConfig) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                max_concurrent: config.max_concurrent_instances.max(1),
                config,
                active: Mutex::new(HashSet::new()),
                next_id: AtomicU64::new(1),
                stats: PoolStats::default(),
            }),
        }
    }

    pub fn max_concurrent(&self) -> usize {
        self.inner.max_concurrent
    }

    pub fn active_count(&self) -> usize {
        self.inner.lock_active().len()
    }

    pub fn stats(&self) -> &PoolStats {
        &self.inner.stats
    }

    /// Admit and instantiate `artifact` with a fresh, isolated environment.
    ///
    /// Instantiation failures release the slot before returning and are not
    /// retried here.
    pub async fn create_instance(
        &self,
        artifact: &Arc<CompiledArtifact>,
        spec: InstanceSpec,
    ) -> WasmResult<SandboxInstance> {
        let handle = self.admit().await?;
        let instance_id = handle.id();

        SandboxInstance::instantiate(artifact, spec, handle).map_err(|error| {
            tracing::error!(
                "{}",
                InstantiationFailed {
                    instance_id,
                    error: &error,
                }
            );
            error
        })
    }

    /// Wait for a free slot, backing off by a fixed delay while the pool is full.
    pub async fn admit(&self) -> WasmResult<InstanceHandle> {
        let backoff = self.inner.config.backoff();
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            if let Some(handle) = self.try_admit() {
                return Ok(handle);
            }

            if let Some(max_attempts) = self.inner.config.max_admission_attempts {
                if attempt >= max_attempts {
                    return Err(WasmError::AdmissionExhausted { attempts: attempt });
                }
            }

            self.inner.stats.deferrals.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(
                "{}",
                AdmissionDeferred {
                    attempt,
                    backoff_ms: backoff.as_millis() as u64,
                    max_concurrent: self.inner.max_concurrent,
                }
            );
            tokio::time::sleep(backoff).await;
        }
    }

    /// Admit without waiting; `None` when the pool is full.
    pub fn try_admit(&self) -> Option<InstanceHandle> {
        let mut active = self.inner.lock_active();
        if active.len() >= self.inner.max_concurrent {
            return None;
        }

        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        active.insert(id);
        let now_active = active.len();
        drop(active);

        self.inner.stats.admitted.fetch_add(1, Ordering::Relaxed);
        self.inner
            .stats
            .peak_active
            .fetch_max(now_active, Ordering::Relaxed);
        tracing::debug!(
            "{}",
            InstanceAdmitted {
                instance_id: id,
                active: now_active,
                max_concurrent: self.inner.max_concurrent,
            }
        );

        Some(InstanceHandle {
            id,
            pool: Arc::clone(&self.inner),
            released: false,
        })
    }

    /// Forget every active slot.
    ///
    /// Outstanding handles stay valid; releasing them later is a no-op on the
    /// set.
    pub fn reset(&self) {
        let discarded = {
            let mut active = self.inner.lock_active();
            let discarded = active.len();
            active.clear();
            discarded
        };
        tracing::info!("{}", PoolReset { discarded });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WasmConfig;
    use crate::sandbox::testing::{trap_module, unlinkable_module};
    use std::time::Duration;

    fn pool(max: usize, attempts: Option<u32>) -> InstancePool {
        InstancePool::new(PoolConfig {
            max_concurrent_instances: max,
            admission_backoff_ms: 2,
            max_admission_attempts: attempts,
        })
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_active_count_never_exceeds_cap() {
        let pool = pool(2, None);
        let mut tasks = Vec::new();

        for _ in 0..12 {
            let pool = pool.clone();
            tasks.push(tokio::spawn(async move {
                let handle = pool.admit().await.unwrap();
                assert!(pool.active_count() <= 2);
                tokio::time::sleep(Duration::from_millis(5)).await;
                handle.release();
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(pool.stats().admitted(), 12);
        assert_eq!(pool.stats().released(), 12);
        assert!(pool.stats().peak_active() <= 2);
        assert!(pool.stats().deferrals() > 0);
        assert_eq!(pool.active_count(), 0);
    }

    #[tokio::test]
    async fn test_handle_released_exactly_once() {
        let pool = pool(1, None);
        let handle = pool.admit().await.unwrap();
        assert_eq!(pool.active_count(), 1);

        // release consumes the handle; its Drop must not release again
        handle.release();
        assert_eq!(pool.active_count(), 0);
        assert_eq!(pool.stats().released(), 1);

        {
            let _scoped = pool.admit().await.unwrap();
        }
        assert_eq!(pool.stats().released(), 2);
    }

    #[tokio::test]
    async fn test_bounded_admission_gives_up() {
        // A holder that never releases starves every other caller.
        let pool = pool(1, Some(3));
        let _holder = pool.admit().await.unwrap();

        let result = pool.admit().await;
        assert!(matches!(
            result,
            Err(WasmError::AdmissionExhausted { attempts: 3 })
        ));
        assert_eq!(pool.stats().deferrals(), 2);
    }

    #[tokio::test]
    async fn test_waiter_admitted_after_release() {
        let pool = pool(1, None);
        let holder = pool.admit().await.unwrap();

        let waiter = {
            let pool = pool.clone();
            tokio::spawn(async move { pool.admit().await.map(|h| h.id()) })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        holder.release();

        let id = waiter.await.unwrap().unwrap();
        assert_eq!(id, 2);
        assert_eq!(pool.active_count(), 0);
    }

    #[tokio::test]
    async fn test_reset_clears_bookkeeping() {
        let pool = pool(2, None);
        let first = pool.admit().await.unwrap();
        let _second = pool.admit().await.unwrap();
        assert!(pool.try_admit().is_none());

        pool.reset();
        assert_eq!(pool.active_count(), 0);

        // Stale handle release does not disturb fresh slots
        let fresh = pool.try_admit().unwrap();
        first.release();
        assert_eq!(pool.active_count(), 1);
        drop(fresh);
        assert_eq!(pool.active_count(), 0);
    }

    #[tokio::test]
    async fn test_instantiation_failure_releases_slot() {
        let pool = pool(1, None);
        let artifact = CompiledArtifact::from_bytes(&unlinkable_module());
        let spec = InstanceSpec::new(vec!["infer".to_string()], &WasmConfig::default());

        let result = pool.create_instance(&artifact, spec).await;

        assert!(matches!(result, Err(WasmError::Instantiation(_))));
        assert_eq!(pool.active_count(), 0);
        assert_eq!(pool.stats().admitted(), pool.stats().released());
    }

    #[tokio::test]
    async fn test_trap_releases_slot() {
        let pool = pool(1, None);
        let artifact = CompiledArtifact::from_bytes(&trap_module());
        let spec = InstanceSpec::new(vec!["infer".to_string()], &WasmConfig::default());

        let instance = pool.create_instance(&artifact, spec).await.unwrap();
        assert_eq!(pool.active_count(), 1);

        assert!(matches!(instance.start().await, Err(WasmError::Execution(_))));
        assert_eq!(pool.active_count(), 0);
        assert_eq!(pool.stats().released(), 1);
    }
}
