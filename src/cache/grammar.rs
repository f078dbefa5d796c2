// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::cache::single_flight::{AssetCache, CacheState};
use crate::errors::CacheError;
use crate::sandbox::WasmError;
use crate::traits::{FetchRequest, Fetcher};
use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;

/// Raw syntax grammar, opaque to this crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarData {
    pub source_url: String,
    pub bytes: Vec<u8>,
    pub fetched_at: DateTime<Utc>,
}

impl GrammarData {
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.bytes).ok()
    }
}

/// Process-wide grammar cache shared by every editor instance.
pub struct GrammarCache {
    inner: AssetCache<GrammarData>,
}

impl Default for GrammarCache {
    fn default() -> Self {
        Self::new()
    }
}

impl GrammarCache {
    pub fn new() -> Self {
        Self {
            inner: AssetCache::new("grammar"),
        }
    }

    /// Load with an arbitrary loader.
    pub async fn get<F, Fut, E>(&self, loader: F) -> Result<Arc<GrammarData>, CacheError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<GrammarData, E>> + Send + 'static,
        E: std::fmt::Display,
    {
        self.inner.get(loader).await
    }

    /// Load the grammar from `url` unless it is already cached or loading.
    pub async fn load_with(
        &self,
        fetcher: Arc<dyn Fetcher>,
        url: impl Into<String>,
        headers: Vec<(String, String)>,
    ) -> Result<Arc<GrammarData>, CacheError> {
        let url = url.into();
        self.inner
            .get(move || async move {
                let response = fetcher
                    .fetch(FetchRequest::new(url.clone(), headers))
                    .await?;
                if !response.is_success() {
                    return Err(WasmError::Fetch {
                        status: response.status,
                        status_text: response.status_text,
                    });
                }
                Ok(GrammarData {
                    source_url: url,
                    bytes: response.body,
                    fetched_at: Utc::now(),
                })
            })
            .await
    }

    pub fn invalidate(&self) {
        self.inner.invalidate();
    }

    pub fn state(&self) -> CacheState {
        self.inner.state()
    }

    pub fn peek(&self) -> Option<Arc<GrammarData>> {
        self.inner.peek()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::testing::ScriptedFetcher;
    use futures::future::join_all;
    use std::time::Duration;

    const GRAMMAR: &str = r#"{"scopeName":"source.lambda"}"#;

    #[tokio::test]
    async fn test_load_with_fetches_once() {
        let fetcher = Arc::new(
            ScriptedFetcher::serving(GRAMMAR.as_bytes().to_vec())
                .with_delay(Duration::from_millis(10)),
        );
        let cache = GrammarCache::new();

        let results = join_all((0..5).map(|_| {
            cache.load_with(fetcher.clone(), "https://example.com/lambda.json", vec![])
        }))
        .await;

        assert_eq!(fetcher.fetch_count(), 1);
        for result in results {
            let grammar = result.unwrap();
            assert_eq!(grammar.text(), Some(GRAMMAR));
            assert_eq!(grammar.source_url, "https://example.com/lambda.json");
        }
        assert_eq!(cache.state(), CacheState::Loaded);
    }

    #[tokio::test]
    async fn test_fetch_failure_leaves_cache_empty() {
        let fetcher = Arc::new(ScriptedFetcher::failing(404, "Not Found"));
        let cache = GrammarCache::new();

        let err = cache
            .load_with(fetcher.clone(), "https://example.com/lambda.json", vec![])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("404"));
        assert_eq!(cache.state(), CacheState::Empty);

        fetcher.set_body(GRAMMAR.as_bytes().to_vec());
        assert!(cache
            .load_with(fetcher.clone(), "https://example.com/lambda.json", vec![])
            .await
            .is_ok());
        assert_eq!(fetcher.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_headers_are_forwarded() {
        let fetcher = Arc::new(ScriptedFetcher::serving(GRAMMAR.as_bytes().to_vec()));
        let cache = GrammarCache::new();
        let headers = vec![("X-Api-Key".to_string(), "k".to_string())];

        cache
            .load_with(fetcher.clone(), "https://example.com/g.json", headers.clone())
            .await
            .unwrap();

        assert_eq!(fetcher.last_request().unwrap().headers, headers);
    }
}
