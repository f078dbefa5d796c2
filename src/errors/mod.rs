// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod cache;
mod config;
mod engine;

pub use cache::CacheError;
pub use config::ConfigError;
pub use engine::EngineError;
