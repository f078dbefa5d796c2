// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! `Empty -> Loading -> Loaded` state machine around a shared future.
//!
//! The first caller to find the cache empty starts the load and parks a
//! [`Shared`] future in the slot; everyone arriving while it is in flight
//! awaits a clone of that same future. Whoever finishes first settles the
//! slot: `Loaded` on success, back to `Empty` on failure so a later call can
//! retry. Each load carries a generation number, and only the matching
//! generation may settle the slot, so a load that was invalidated mid-flight
//! cannot overwrite newer state.
//!
//! Waiters never block on the slot lock across an await point.

use crate::errors::CacheError;
use crate::observability::messages::cache::{
    AssetInvalidated, AssetLoadFailed, AssetLoadJoined, AssetLoadStarted, AssetLoaded,
};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type SharedLoad<T> = Shared<BoxFuture<'static, Result<Arc<T>, CacheError>>>;

enum Slot<T> {
    Empty,
    Loading { generation: u64, load: SharedLoad<T> },
    Loaded(Arc<T>),
}

/// Observable cache state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    Empty,
    Loading,
    Loaded,
}

/// A lazily loaded, shared value with single-flight loading.
pub struct AssetCache<T> {
    asset: String,
    slot: Mutex<Slot<T>>,
    generation: AtomicU64,
    loads_started: AtomicU64,
}

impl<T> AssetCache<T>
where
    T: Send + Sync + 'static,
{
    pub fn new(asset: impl Into<String>) -> Self {
        Self {
            asset: asset.into(),
            slot: Mutex::new(Slot::Empty),
            generation: AtomicU64::new(0),
            loads_started: AtomicU64::new(0),
        }
    }

    pub fn asset(&self) -> &str {
        &self.asset
    }

    /// Return the cached value, loading it with `loader` if necessary.
    ///
    /// `loader` is only invoked when the cache is empty; callers that arrive
    /// during a load share its outcome, including its failure.
    pub async fn get<F, Fut, E>(&self, loader: F) -> Result<Arc<T>, CacheError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: Display,
    {
        let (generation, load) = {
            let mut slot = self.lock_slot();
            match &*slot {
                Slot::Loaded(value) => return Ok(Arc::clone(value)),
                Slot::Loading { generation, load } => {
                    tracing::debug!("{}", AssetLoadJoined { asset: &self.asset });
                    (*generation, load.clone())
                }
                Slot::Empty => {
                    let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
                    let asset = self.asset.clone();
                    let load = loader()
                        .map(move |result| {
                            result.map(Arc::new).map_err(|e| CacheError::LoadFailed {
                                asset,
                                message: e.to_string(),
                            })
                        })
                        .boxed()
                        .shared();

                    *slot = Slot::Loading {
                        generation,
                        load: load.clone(),
                    };
                    self.loads_started.fetch_add(1, Ordering::Relaxed);
                    tracing::info!("{}", AssetLoadStarted { asset: &self.asset });
                    (generation, load)
                }
            }
        };

        let result = load.await;
        self.settle(generation, &result);
        result
    }

    fn settle(&self, generation: u64, result: &Result<Arc<T>, CacheError>) {
        let mut slot = self.lock_slot();
        let current = match &*slot {
            Slot::Loading { generation, .. } => *generation,
            _ => return,
        };
        if current != generation {
            return;
        }

        *slot = match result {
            Ok(value) => {
                tracing::info!("{}", AssetLoaded { asset: &self.asset });
                Slot::Loaded(Arc::clone(value))
            }
            Err(error) => {
                tracing::warn!(
                    "{}",
                    AssetLoadFailed {
                        asset: &self.asset,
                        error,
                    }
                );
                Slot::Empty
            }
        };
    }

    /// Reset to `Empty`. An in-flight load still completes for its waiters
    /// but no longer populates the cache.
    pub fn invalidate(&self) {
        *self.lock_slot() = Slot::Empty;
        tracing::info!("{}", AssetInvalidated { asset: &self.asset });
    }

    pub fn state(&self) -> CacheState {
        match &*self.lock_slot() {
            Slot::Empty => CacheState::Empty,
            Slot::Loading { .. } => CacheState::Loading,
            Slot::Loaded(_) => CacheState::Loaded,
        }
    }

    /// The loaded value, without triggering a load.
    pub fn peek(&self) -> Option<Arc<T>> {
        match &*self.lock_slot() {
            Slot::Loaded(value) => Some(Arc::clone(value)),
            _ => None,
        }
    }

    /// Number of times a loader has actually been invoked.
    pub fn loads_started(&self) -> u64 {
        self.loads_started.load(Ordering::Relaxed)
    }

    fn lock_slot(&self) -> MutexGuard<'_, Slot<T>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::join_all;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn counting_loader(
        calls: Arc<AtomicUsize>,
        outcome: Result<u32, &'static str>,
    ) -> impl FnOnce() -> BoxFuture<'static, Result<u32, &'static str>> {
        move || {
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                outcome
            }
            .boxed()
        }
    }

    #[tokio::test]
    async fn test_concurrent_gets_share_one_load() {
        let cache = AssetCache::<u32>::new("grammar");
        let calls = Arc::new(AtomicUsize::new(0));

        let results = join_all(
            (0..8).map(|_| cache.get(counting_loader(calls.clone(), Ok(42)))),
        )
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let values: Vec<u32> = results.into_iter().map(|r| *r.unwrap()).collect();
        assert_eq!(values, vec![42; 8]);
        assert_eq!(cache.state(), CacheState::Loaded);
        assert_eq!(cache.loads_started(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_gets_across_threads() {
        let cache = Arc::new(AssetCache::<u32>::new("grammar"));
        let calls = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                let calls = calls.clone();
                tokio::spawn(async move { cache.get(counting_loader(calls, Ok(7))).await })
            })
            .collect();

        for task in tasks {
            assert_eq!(*task.await.unwrap().unwrap(), 7);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_loaded_value_is_reused() {
        let cache = AssetCache::<u32>::new("grammar");
        let calls = Arc::new(AtomicUsize::new(0));

        let first = cache.get(counting_loader(calls.clone(), Ok(1))).await.unwrap();
        let second = cache.get(counting_loader(calls.clone(), Ok(2))).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_shared_failure_reverts_to_empty() {
        let cache = AssetCache::<u32>::new("grammar");
        let calls = Arc::new(AtomicUsize::new(0));

        let results = join_all(
            (0..4).map(|_| cache.get(counting_loader(calls.clone(), Err("404 Not Found")))),
        )
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let expected = CacheError::LoadFailed {
            asset: "grammar".to_string(),
            message: "404 Not Found".to_string(),
        };
        for result in results {
            assert_eq!(result.unwrap_err(), expected);
        }
        assert_eq!(cache.state(), CacheState::Empty);

        // A later call retries
        let value = cache.get(counting_loader(calls.clone(), Ok(5))).await.unwrap();
        assert_eq!(*value, 5);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidate_clears_loaded_value() {
        let cache = AssetCache::<u32>::new("grammar");
        let calls = Arc::new(AtomicUsize::new(0));

        cache.get(counting_loader(calls.clone(), Ok(1))).await.unwrap();
        cache.invalidate();
        assert_eq!(cache.state(), CacheState::Empty);
        assert!(cache.peek().is_none());

        let value = cache.get(counting_loader(calls.clone(), Ok(2))).await.unwrap();
        assert_eq!(*value, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidated_load_does_not_repopulate() {
        let cache = Arc::new(AssetCache::<u32>::new("grammar"));
        let calls = Arc::new(AtomicUsize::new(0));

        let stale = {
            let cache = cache.clone();
            let calls = calls.clone();
            tokio::spawn(async move { cache.get(counting_loader(calls, Ok(1))).await })
        };
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(cache.state(), CacheState::Loading);

        cache.invalidate();
        assert_eq!(*stale.await.unwrap().unwrap(), 1);
        assert_eq!(cache.state(), CacheState::Empty);
    }
}
