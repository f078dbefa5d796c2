// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! WASI command execution
//!
//! A [`SandboxInstance`] is one isolated run of a compiled artifact: its own
//! store, WASI context, argument vector, environment and in-memory stdout and
//! stderr pipes. The guest's `_start` runs once; when it returns the pool
//! slot is released and the captured output is handed back.
//!
//! ## Exit semantics
//! - `_start` returns, or calls `proc_exit(0)`: success
//! - `proc_exit(n)` with `n != 0`: [`WasmError::Execution`] carrying stderr
//! - trap or fuel exhaustion: [`WasmError::Execution`]
//!
//! Standard output is line-buffered: every line, including a final line with
//! no terminator, is delivered with a trailing `\n`.

use crate::config::WasmConfig;
use crate::observability::messages::pool::InstanceCompleted;
use crate::sandbox::error::{WasmError, WasmResult};
use crate::sandbox::module_loader::CompiledArtifact;
use crate::sandbox::pool::InstanceHandle;
use std::sync::Arc;
use wasmtime::{Instance, Linker, Store, StoreLimits, StoreLimitsBuilder, Trap};
use wasmtime_wasi::p1::WasiP1Ctx;
use wasmtime_wasi::p2::pipe::MemoryOutputPipe;
use wasmtime_wasi::{I32Exit, WasiCtxBuilder};

/// Everything an instance is created with.
#[derive(Debug, Clone)]
pub struct InstanceSpec {
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub fuel: u64,
    pub max_memory_bytes: usize,
    pub stdout_capacity: usize,
    pub stderr_capacity: usize,
}

impl InstanceSpec {
    pub fn new(args: Vec<String>, wasm: &WasmConfig) -> Self {
        Self {
            args,
            env: Vec::new(),
            fuel: wasm.fuel.per_instance(),
            max_memory_bytes: wasm.max_memory_bytes,
            stdout_capacity: wasm.stdout_capacity_bytes,
            stderr_capacity: wasm.stderr_capacity_bytes,
        }
    }

    pub fn with_env(mut self, env: Vec<(String, String)>) -> Self {
        self.env = env;
        self
    }
}

/// Captured result of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutput {
    pub stdout: String,
    pub stderr: String,
    pub fuel_consumed: u64,
}

struct InstanceState {
    wasi: WasiP1Ctx,
    limits: StoreLimits,
}

/// One instantiated, not yet started, guest.
pub struct SandboxInstance {
    handle: InstanceHandle,
    store: Store<InstanceState>,
    instance: Instance,
    stdout: MemoryOutputPipe,
    stderr: MemoryOutputPipe,
    fuel_budget: u64,
}

impl SandboxInstance {
    /// Build a fresh store and link WASI preview 1 into it.
    ///
    /// On failure `handle` is dropped, which releases the pool slot.
    pub(crate) fn instantiate(
        artifact: &Arc<CompiledArtifact>,
        spec: InstanceSpec,
        handle: InstanceHandle,
    ) -> WasmResult<Self> {
        let stdout = MemoryOutputPipe::new(spec.stdout_capacity);
        let stderr = MemoryOutputPipe::new(spec.stderr_capacity);

        let mut builder = WasiCtxBuilder::new();
        builder
            .args(spec.args.as_slice())
            .envs(spec.env.as_slice())
            .stdout(stdout.clone())
            .stderr(stderr.clone());
        let wasi = builder.build_p1();

        let limits = StoreLimitsBuilder::new()
            .memory_size(spec.max_memory_bytes)
            .instances(1)
            .build();

        let mut store = Store::new(artifact.engine(), InstanceState { wasi, limits });
        store.limiter(|state| &mut state.limits);
        store
            .set_fuel(spec.fuel)
            .map_err(|e| WasmError::Instantiation(format!("Failed to set fuel: {e}")))?;

        let mut linker: Linker<InstanceState> = Linker::new(artifact.engine());
        wasmtime_wasi::p1::add_to_linker_sync(&mut linker, |state: &mut InstanceState| {
            &mut state.wasi
        })
        .map_err(|e| WasmError::Instantiation(format!("Failed to link WASI: {e}")))?;

        let instance = linker
            .instantiate(&mut store, artifact.module())
            .map_err(|e| WasmError::Instantiation(format!("{e:#}")))?;

        Ok(Self {
            handle,
            store,
            instance,
            stdout,
            stderr,
            fuel_budget: spec.fuel,
        })
    }

    pub fn id(&self) -> u64 {
        self.handle.id()
    }

    /// Run `_start` to completion on the blocking thread pool.
    ///
    /// The guest's WASI calls block on the runtime handle, so the run never
    /// happens on an async worker. The pool slot is released before this
    /// returns, whatever the outcome.
    pub async fn start(self) -> WasmResult<RunOutput> {
        tokio::task::spawn_blocking(move || self.run_to_completion())
            .await
            .map_err(|e| WasmError::Execution(format!("execution task failed: {e}")))?
    }

    fn run_to_completion(self) -> WasmResult<RunOutput> {
        let Self {
            handle,
            mut store,
            instance,
            stdout,
            stderr,
            fuel_budget,
        } = self;

        let instance_id = handle.id();
        let exit = run_start(&mut store, &instance);
        handle.release();

        let captured_stderr = String::from_utf8_lossy(&stderr.contents()).into_owned();
        match exit? {
            0 => {}
            code => {
                return Err(WasmError::Execution(format!(
                    "module exited with status {code}: {}",
                    captured_stderr.trim_end()
                )))
            }
        }

        let fuel_consumed = fuel_budget.saturating_sub(store.get_fuel().unwrap_or(0));
        let output = accumulate_lines(&stdout.contents());

        tracing::debug!(
            "{}",
            InstanceCompleted {
                instance_id,
                output_size: output.len(),
                fuel_consumed,
            }
        );

        Ok(RunOutput {
            stdout: output,
            stderr: captured_stderr,
            fuel_consumed,
        })
    }
}

fn run_start(store: &mut Store<InstanceState>, instance: &Instance) -> WasmResult<i32> {
    let start = instance
        .get_typed_func::<(), ()>(&mut *store, "_start")
        .map_err(|e| WasmError::Execution(format!("No _start entry point: {e}")))?;

    match start.call(&mut *store, ()) {
        Ok(()) => Ok(0),
        Err(e) => {
            if let Some(exit) = e.downcast_ref::<I32Exit>() {
                return Ok(exit.0);
            }
            if let Some(Trap::OutOfFuel) = e.downcast_ref::<Trap>() {
                return Err(WasmError::Execution(
                    "fuel exhausted before the module finished".to_string(),
                ));
            }
            Err(WasmError::Execution(format!("{e:#}")))
        }
    }
}

/// Re-emit raw stdout one line at a time, each terminated by `\n`.
fn accumulate_lines(raw: &[u8]) -> String {
    let text = String::from_utf8_lossy(raw);
    let mut out = String::with_capacity(text.len() + 1);
    for line in text.split_terminator('\n') {
        out.push_str(line);
        out.push('\n');
    }
    out
}
