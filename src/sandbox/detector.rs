// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! WASM binary encoding detection
//!
//! Detection of WASM binary formats using wasmparser.
//! Only classic core modules can be run as WASI commands; everything else is
//! rejected before compilation so the caller gets a precise error.

use crate::sandbox::error::{WasmError, WasmResult, WASM_UNSUPPORTED_ENCODING};

use wasmparser::{Encoding, Parser, Payload};

/// Binary format of a WebAssembly payload.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BinaryKind {
    /// Classic core module (binary version 1)
    CoreModule,
    /// Component Model binary (version 2+) or legacy component section
    Component,
}

impl BinaryKind {
    #[inline]
    pub fn is_core_module(self) -> bool {
        matches!(self, Self::CoreModule)
    }
}

/// Detects the binary kind by inspecting the version header and, for
/// version 1, custom sections.
///
/// # Errors
/// Returns an error if the input is empty, truncated, or otherwise malformed.
pub fn detect_binary_kind(bytes: &[u8]) -> WasmResult<BinaryKind> {
    let parser = Parser::new(0);
    let mut encoding = None;
    let mut has_component_section = false;

    for payload in parser.parse_all(bytes) {
        match payload? {
            Payload::Version { encoding: enc, .. } => {
                encoding = Some(enc);
            }
            Payload::CustomSection(reader) if reader.name() == "component" => {
                has_component_section = true;
            }
            _ => {}
        }
    }

    let encoding = encoding.ok_or_else(|| WasmError::Compile("Invalid WASM binary".to_string()))?;

    match encoding {
        Encoding::Component => Ok(BinaryKind::Component),
        Encoding::Module if has_component_section => Ok(BinaryKind::Component),
        Encoding::Module => Ok(BinaryKind::CoreModule),
    }
}

/// Accepts core modules only.
pub fn require_core_module(bytes: &[u8]) -> WasmResult<()> {
    match detect_binary_kind(bytes)? {
        BinaryKind::CoreModule => Ok(()),
        BinaryKind::Component => Err(WasmError::UnsupportedEncoding(
            WASM_UNSUPPORTED_ENCODING.to_string(),
        )),
    }
}
