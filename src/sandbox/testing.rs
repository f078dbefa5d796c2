// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Test doubles: a scripted fetcher and WAT guest modules.

use crate::sandbox::error::WasmResult;
use crate::traits::{FetchRequest, FetchResponse, Fetcher};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Serves one canned response and records every request.
pub struct ScriptedFetcher {
    response: Mutex<FetchResponse>,
    requests: Mutex<Vec<FetchRequest>>,
    fetches: AtomicUsize,
    delay: Option<Duration>,
}

impl ScriptedFetcher {
    pub fn serving(body: Vec<u8>) -> Self {
        Self::respond(FetchResponse {
            status: 200,
            status_text: "OK".to_string(),
            headers: HashMap::new(),
            body,
        })
    }

    pub fn failing(status: u16, status_text: &str) -> Self {
        Self::respond(FetchResponse {
            status,
            status_text: status_text.to_string(),
            headers: HashMap::new(),
            body: Vec::new(),
        })
    }

    fn respond(response: FetchResponse) -> Self {
        Self {
            response: Mutex::new(response),
            requests: Mutex::new(Vec::new()),
            fetches: AtomicUsize::new(0),
            delay: None,
        }
    }

    pub fn with_header(self, name: &str, value: &str) -> Self {
        self.response
            .lock()
            .unwrap()
            .headers
            .insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Replace the body served from now on.
    pub fn set_body(&self, body: Vec<u8>) {
        let mut response = self.response.lock().unwrap();
        response.status = 200;
        response.status_text = "OK".to_string();
        response.body = body;
    }

    pub fn set_status(&self, status: u16, status_text: &str) {
        let mut response = self.response.lock().unwrap();
        response.status = status;
        response.status_text = status_text.to_string();
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<FetchRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, request: FetchRequest) -> WasmResult<FetchResponse> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.response.lock().unwrap().clone())
    }
}

/// Escape arbitrary bytes for a WAT data segment.
fn wat_bytes(text: &str) -> String {
    text.bytes().map(|b| format!("\\{:02x}", b)).collect()
}

/// A WASI command that writes `text` to stdout and returns.
pub fn print_module(text: &str) -> Vec<u8> {
    wat::parse_str(format!(
        r#"(module
            (import "wasi_snapshot_preview1" "fd_write"
                (func $fd_write (param i32 i32 i32 i32) (result i32)))
            (memory (export "memory") 1)
            (data (i32.const 1024) "{data}")
            (func (export "_start")
                (i32.store (i32.const 0) (i32.const 1024))
                (i32.store (i32.const 4) (i32.const {len}))
                (drop (call $fd_write (i32.const 1) (i32.const 0) (i32.const 1) (i32.const 8)))))"#,
        data = wat_bytes(text),
        len = text.len()
    ))
    .unwrap()
}

/// A WASI command that writes its NUL-separated argv to stdout.
pub fn args_echo_module() -> Vec<u8> {
    wat::parse_str(
        r#"(module
            (import "wasi_snapshot_preview1" "args_sizes_get"
                (func $args_sizes_get (param i32 i32) (result i32)))
            (import "wasi_snapshot_preview1" "args_get"
                (func $args_get (param i32 i32) (result i32)))
            (import "wasi_snapshot_preview1" "fd_write"
                (func $fd_write (param i32 i32 i32 i32) (result i32)))
            (memory (export "memory") 1)
            (func (export "_start")
                (drop (call $args_sizes_get (i32.const 0) (i32.const 4)))
                (drop (call $args_get (i32.const 64) (i32.const 1024)))
                (i32.store (i32.const 16) (i32.const 1024))
                (i32.store (i32.const 20) (i32.load (i32.const 4)))
                (drop (call $fd_write (i32.const 1) (i32.const 16) (i32.const 1) (i32.const 24)))))"#,
    )
    .unwrap()
}

/// A WASI command that calls `proc_exit(code)`.
pub fn exit_module(code: i32) -> Vec<u8> {
    wat::parse_str(format!(
        r#"(module
            (import "wasi_snapshot_preview1" "proc_exit" (func $proc_exit (param i32)))
            (memory (export "memory") 1)
            (func (export "_start") (call $proc_exit (i32.const {code}))))"#
    ))
    .unwrap()
}

/// A module that traps immediately.
pub fn trap_module() -> Vec<u8> {
    wat::parse_str(r#"(module (memory (export "memory") 1) (func (export "_start") unreachable))"#)
        .unwrap()
}

/// A module that never finishes; only fuel stops it.
pub fn spin_module() -> Vec<u8> {
    wat::parse_str(
        r#"(module (memory (export "memory") 1) (func (export "_start") (loop $l (br $l))))"#,
    )
    .unwrap()
}

/// A module whose import no linker provides.
pub fn unlinkable_module() -> Vec<u8> {
    wat::parse_str(
        r#"(module
            (import "env" "missing" (func))
            (memory (export "memory") 1)
            (func (export "_start")))"#,
    )
    .unwrap()
}
