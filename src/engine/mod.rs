// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Inference engine facade
//!
//! [`InferenceEngine`] ties the sandbox together: it lazily loads the module
//! for its current source, runs one isolated instance per request through the
//! pool, and decodes the output. It also owns re-initialization when the
//! source configuration changes.

pub mod facade;
pub mod state;

pub use facade::InferenceEngine;
pub use state::EngineState;
