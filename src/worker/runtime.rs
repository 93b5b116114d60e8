//! The resolved runtime instance handed out by the initializer.

use std::fmt;
use std::time::Duration;

use wasmtime::{Engine, Linker, Module, Store};
use wasmtime_wasi::pipe::MemoryOutputPipe;
use wasmtime_wasi::preview1;
use wasmtime_wasi::{I32Exit, WasiCtxBuilder};

use crate::error::{Result, RuntimeError};
use crate::worker::config::WorkerConfig;
use crate::worker::io::{OutputRouter, StdoutCallback};
use crate::worker::limits::{StoreData, StoreLimiterExt};

/// Capacity of the stdout/stderr capture buffers per run.
const CAPTURE_CAPACITY: usize = 1 << 20;

/// Result of a single Python run.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// Captured stdout output.
    pub stdout: String,
    /// Captured stderr output.
    pub stderr: String,
    /// Exit code (0 for success).
    pub exit_code: i32,
}

impl ExecutionResult {
    /// Check if the run was successful (exit code 0).
    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }

    /// Parse a Python exception out of the captured stderr, if present.
    pub fn exception(&self) -> Option<PythonException> {
        parse_exception(&self.stderr)
    }
}

/// A Python exception extracted from a run's stderr.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PythonException {
    /// The exception type, e.g. "ValueError" or "ModuleNotFoundError".
    pub exception_type: String,
    /// The exception message, possibly empty.
    pub message: String,
}

impl fmt::Display for PythonException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.exception_type)
        } else {
            write!(f, "{}: {}", self.exception_type, self.message)
        }
    }
}

/// A running embedded Python runtime.
///
/// Holds the engine and the compiled interpreter module; each [`run`]
/// executes in a fresh store with the configured memory and time limits.
/// Stdout from every run is routed through the callback supplied at
/// initialization, in addition to being returned in the result.
///
/// [`run`]: PythonRuntime::run
pub struct PythonRuntime {
    engine: Engine,
    module: Module,
    config: WorkerConfig,
    packages: Vec<String>,
    preamble: String,
    stdout: OutputRouter,
}

impl PythonRuntime {
    pub(crate) fn new(
        engine: Engine,
        module: Module,
        config: WorkerConfig,
        packages: Vec<String>,
        stdout: Option<StdoutCallback>,
    ) -> Self {
        let preamble = packages
            .iter()
            .map(|package| format!("import {package}"))
            .collect::<Vec<_>>()
            .join("\n");
        Self {
            engine,
            module,
            config,
            packages,
            preamble,
            stdout: OutputRouter::new(stdout),
        }
    }

    /// The packages requested when the runtime was initialized.
    pub fn packages(&self) -> &[String] {
        &self.packages
    }

    /// The worker configuration this runtime was launched with.
    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Execute Python source in the runtime.
    ///
    /// The import preamble for the requested packages is prepended, so the
    /// packages are available to `code`. Captured stdout is forwarded to
    /// the stdout callback line by line after the run completes.
    pub async fn run(&self, code: &str) -> Result<ExecutionResult> {
        let program = self.compose(code);
        let result = self.run_program(program).await?;
        self.stdout.forward(&result.stdout);
        Ok(result)
    }

    fn compose(&self, code: &str) -> String {
        if self.preamble.is_empty() {
            code.to_string()
        } else {
            format!("{}\n{}", self.preamble, code)
        }
    }

    async fn run_program(&self, code: String) -> Result<ExecutionResult> {
        let timeout = self.config.timeout;
        let epoch_interval = self.config.epoch_tick_interval;
        let max_memory = self.config.max_memory;
        let engine = self.engine.clone();
        let module = self.module.clone();

        // Drive epoch interruption for this run
        let ticker_engine = engine.clone();
        let ticker_handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(epoch_interval);
            loop {
                interval.tick().await;
                ticker_engine.increment_epoch();
            }
        });

        let ticks = deadline_ticks(timeout, epoch_interval);
        let exec_engine = engine.clone();
        let exec_handle = tokio::task::spawn_blocking(move || {
            run_sync(&exec_engine, &module, &code, max_memory, ticks)
        });

        let result = tokio::select! {
            result = exec_handle => {
                ticker_handle.abort();
                match result {
                    Ok(inner) => inner,
                    Err(e) => Err(RuntimeError::ExecutionFailed(format!("task panicked: {e}"))),
                }
            }
            _ = tokio::time::sleep(timeout) => {
                ticker_handle.abort();
                engine.increment_epoch(); // force the trap
                Err(RuntimeError::Timeout(timeout))
            }
        };

        result
    }
}

impl fmt::Debug for PythonRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PythonRuntime")
            .field("packages", &self.packages)
            .field("config", &self.config)
            .field("stdout", &self.stdout)
            .finish_non_exhaustive()
    }
}

/// Number of epoch ticks a run may consume before the deadline trap fires.
fn deadline_ticks(timeout: Duration, interval: Duration) -> u64 {
    let interval_ms = interval.as_millis().max(1);
    (timeout.as_millis() / interval_ms) as u64 + 1
}

/// Synchronous execution of one program (runs in a blocking task).
fn run_sync(
    engine: &Engine,
    module: &Module,
    code: &str,
    max_memory: u64,
    deadline_ticks: u64,
) -> Result<ExecutionResult> {
    let stdout = MemoryOutputPipe::new(CAPTURE_CAPACITY);
    let stderr = MemoryOutputPipe::new(CAPTURE_CAPACITY);

    // No preopened directories, no inherited environment
    let wasi_ctx = WasiCtxBuilder::new()
        .args(&["python", "-c", code])
        .stdout(stdout.clone())
        .stderr(stderr.clone())
        .build_p1();

    let store_data = StoreData::new(max_memory, wasi_ctx);
    let mut store = Store::new(engine, store_data);
    store.configure_limiter();

    store.epoch_deadline_trap();
    store.set_epoch_deadline(deadline_ticks);

    let mut linker = Linker::new(engine);
    preview1::add_to_linker_sync(&mut linker, |data: &mut StoreData| &mut data.wasi)
        .map_err(|e| RuntimeError::RuntimeInit(anyhow::anyhow!("failed to link WASI: {}", e)))?;

    let instance = linker.instantiate(&mut store, module).map_err(|e| {
        if store.data().limiter.limit_exceeded() {
            return RuntimeError::MemoryLimitExceeded(
                "memory limit exceeded during instantiation".to_string(),
            );
        }
        RuntimeError::ModuleLoad(anyhow::anyhow!("failed to instantiate: {}", e))
    })?;

    let start = instance
        .get_typed_func::<(), ()>(&mut store, "_start")
        .map_err(|e| {
            RuntimeError::ModuleLoad(anyhow::anyhow!("failed to get _start function: {}", e))
        })?;

    let exit_code = match start.call(&mut store, ()) {
        Ok(()) => 0,
        Err(e) => {
            if store.data().limiter.limit_exceeded() {
                return Err(RuntimeError::MemoryLimitExceeded(
                    "memory limit exceeded during execution".to_string(),
                ));
            }

            // Epoch interrupt means the run hit its deadline
            if e.to_string().contains("epoch") || e.to_string().contains("interrupt") {
                return Err(RuntimeError::Timeout(Duration::ZERO));
            }

            if let Some(exit) = e.downcast_ref::<I32Exit>() {
                exit.0
            } else {
                return Err(RuntimeError::ExecutionFailed(e.to_string()));
            }
        }
    };

    Ok(ExecutionResult {
        stdout: String::from_utf8_lossy(&stdout.contents()).into_owned(),
        stderr: String::from_utf8_lossy(&stderr.contents()).into_owned(),
        exit_code,
    })
}

/// Extract the exception line from Python's standard error output format.
fn parse_exception(stderr: &str) -> Option<PythonException> {
    stderr
        .lines()
        .rev()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .find_map(|line| {
            if line.starts_with(' ') || line.starts_with("Traceback") {
                return None;
            }
            let (name, message) = match line.split_once(':') {
                Some((name, message)) => (name.trim(), message.trim()),
                None => (line.trim(), ""),
            };
            looks_like_exception(name).then(|| PythonException {
                exception_type: name.to_string(),
                message: message.to_string(),
            })
        })
}

fn looks_like_exception(name: &str) -> bool {
    const BARE: [&str; 4] = [
        "KeyboardInterrupt",
        "SystemExit",
        "StopIteration",
        "GeneratorExit",
    ];
    if BARE.contains(&name) {
        return true;
    }
    name.chars().next().is_some_and(|c| c.is_ascii_uppercase())
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
        && (name.ends_with("Error") || name.ends_with("Exception") || name.ends_with("Warning"))
}
