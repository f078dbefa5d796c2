// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Single-flight asset caching
//!
//! [`AssetCache`] guards one expensive async load so that concurrent callers
//! share a single in-flight future. [`GrammarCache`] is the instance used
//! for the syntax grammar.

pub mod grammar;
pub mod single_flight;

pub use grammar::{GrammarCache, GrammarData};
pub use single_flight::{AssetCache, CacheState};
