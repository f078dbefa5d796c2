// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Application-scoped shared store.
//!
//! Constructed once at startup and passed by reference. Owns the state that
//! would otherwise be process-global: the fetcher, the grammar cache and the
//! last-modified channel. Engines built from one context share all three.

use crate::cache::{GrammarCache, GrammarData};
use crate::config::consts::SOURCE_MODIFIED_CHANNEL_CAPACITY;
use crate::config::{load_config, EngineConfig};
use crate::engine::InferenceEngine;
use crate::errors::{CacheError, EngineError};
use crate::sandbox::HttpFetcher;
use crate::source::{build_headers, SourceDescriptor, SourceModified};
use crate::traits::Fetcher;
use anyhow::Context;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast;

pub struct AppContext {
    config: EngineConfig,
    fetcher: Arc<dyn Fetcher>,
    grammar: Arc<GrammarCache>,
    notifier: broadcast::Sender<SourceModified>,
}

impl AppContext {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_fetcher(config, Arc::new(HttpFetcher::new()))
    }

    pub fn with_fetcher(config: EngineConfig, fetcher: Arc<dyn Fetcher>) -> Self {
        let (notifier, _) = broadcast::channel(SOURCE_MODIFIED_CHANNEL_CAPACITY);
        Self {
            config,
            fetcher,
            grammar: Arc::new(GrammarCache::new()),
            notifier,
        }
    }

    /// Build a context from a YAML or TOML configuration file.
    pub fn from_config_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let config = load_config(path)
            .with_context(|| format!("Failed to load engine config from {}", path.display()))?;
        Ok(Self::new(config))
    }

    /// A new engine for `source` sharing this context's fetcher and channel.
    pub fn engine(&self, source: SourceDescriptor) -> Result<InferenceEngine, EngineError> {
        InferenceEngine::with_fetcher(
            source,
            &self.config,
            Arc::clone(&self.fetcher),
            self.notifier.clone(),
        )
    }

    /// Load the grammar once for the whole context, using `source`'s credentials.
    pub async fn load_grammar(
        &self,
        source: &SourceDescriptor,
    ) -> Result<Arc<GrammarData>, CacheError> {
        self.grammar
            .load_with(
                Arc::clone(&self.fetcher),
                source.url.clone(),
                build_headers(&source.auth),
            )
            .await
    }

    pub fn grammar(&self) -> &Arc<GrammarCache> {
        &self.grammar
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SourceModified> {
        self.notifier.subscribe()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn fetcher(&self) -> &Arc<dyn Fetcher> {
        &self.fetcher
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheState;
    use crate::codec::InferRequest;
    use crate::sandbox::testing::{print_module, ScriptedFetcher};
    use crate::source::AuthScheme;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_engines_share_notification_channel() {
        let fetcher = Arc::new(
            ScriptedFetcher::serving(print_module("Int"))
                .with_header("Last-Modified", "Sun, 06 Nov 1994 08:49:37 GMT"),
        );
        let context = AppContext::with_fetcher(EngineConfig::default(), fetcher);
        let mut rx = context.subscribe();

        let source = SourceDescriptor::new("remote", "https://example.com/a.wasm", AuthScheme::None);
        let engine = context.engine(source.clone()).unwrap();
        let response = engine
            .run_inference(InferRequest::new("HM", "1"))
            .await
            .unwrap();

        assert!(response.success);
        assert_eq!(rx.recv().await.unwrap().source_id, source.id);
    }

    #[tokio::test]
    async fn test_grammar_is_shared_across_callers() {
        let fetcher = Arc::new(ScriptedFetcher::serving(b"grammar".to_vec()));
        let context = AppContext::with_fetcher(EngineConfig::default(), fetcher.clone());
        let source = SourceDescriptor::new(
            "grammar",
            "https://example.com/g.json",
            AuthScheme::Header {
                name: "X-Api-Key".to_string(),
                value: "k".to_string(),
            },
        );

        let first = context.load_grammar(&source).await.unwrap();
        let second = context.load_grammar(&source).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(fetcher.fetch_count(), 1);
        assert_eq!(
            fetcher.last_request().unwrap().headers,
            vec![("X-Api-Key".to_string(), "k".to_string())]
        );

        context.grammar().invalidate();
        assert_eq!(context.grammar().state(), CacheState::Empty);
    }

    #[test]
    fn test_from_config_file() {
        let mut file = NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(file, "[pool]\nmax_concurrent_instances = 3").unwrap();

        let context = AppContext::from_config_file(file.path()).unwrap();
        assert_eq!(context.config().pool.max_concurrent_instances, 3);
    }

    #[test]
    fn test_from_missing_config_file() {
        let err = AppContext::from_config_file("/nonexistent/engine.yaml").err().unwrap();
        assert!(err.to_string().contains("Failed to load engine config"));
    }
}
