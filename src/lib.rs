// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod cache;      // single-flight asset cache (grammar)
pub mod codec;      // request argv encoding + output decoding
pub mod config;     // engine configuration
pub mod context;    // application-scoped shared store
pub mod engine;     // inference engine facade
pub mod errors;     // error handling
pub mod observability;
pub mod sandbox;    // module loading, instance pool, execution
pub mod source;     // source descriptors + credential headers
pub mod traits;     // unified abstractions

pub use cache::{AssetCache, CacheState, GrammarCache, GrammarData};
pub use codec::{
    AlgorithmDescriptor, InferRequest, InvocationRequest, InvocationResponse, RequestOptions,
    SubtypeRequest,
};
pub use config::{load_config, EngineConfig};
pub use context::AppContext;
pub use engine::{EngineState, InferenceEngine};
pub use errors::{CacheError, EngineError};
pub use source::{AuthScheme, SourceDescriptor, SourceModified};
