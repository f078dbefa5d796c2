// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::sandbox::CompiledArtifact;
use std::sync::Arc;

/// Whether the facade currently holds a compiled module.
///
/// `Uninitialized -> Initialized` on a successful load. A source change or
/// `destroy()` forces `Initialized -> Uninitialized`; the next request
/// reloads.
#[derive(Debug, Clone, Default)]
pub enum EngineState {
    #[default]
    Uninitialized,
    Initialized(Arc<CompiledArtifact>),
}

impl EngineState {
    pub fn is_initialized(&self) -> bool {
        matches!(self, EngineState::Initialized(_))
    }

    pub fn artifact(&self) -> Option<&Arc<CompiledArtifact>> {
        match self {
            EngineState::Initialized(artifact) => Some(artifact),
            EngineState::Uninitialized => None,
        }
    }
}
