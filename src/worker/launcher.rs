//! Worker startup: the seam the initializer drives, and its wasm-backed
//! implementation.

use futures::future::BoxFuture;
use wasmtime::{Engine, Module};

use crate::error::{Result, RuntimeError};
use crate::worker::config::WorkerConfig;
use crate::worker::io::StdoutCallback;
use crate::worker::runtime::PythonRuntime;

/// Starts the embedded runtime and resolves once it is ready to accept
/// work.
///
/// A launcher is a single-shot asynchronous operation with no retry or
/// cancellation contract; the initializer invokes it at most once per
/// process lifetime and caches whatever it produces.
pub trait WorkerLauncher: Send + Sync + 'static {
    /// The runtime instance type this launcher produces.
    type Runtime: Send + Sync + 'static;

    /// Boot the runtime, loading the given packages and routing its
    /// stdout through the given callback.
    fn launch(
        &self,
        packages: Vec<String>,
        stdout: Option<StdoutCallback>,
    ) -> BoxFuture<'_, Result<Self::Runtime>>;
}

/// Launcher that boots a Python interpreter compiled to WebAssembly.
///
/// Reads the interpreter module from [`WorkerConfig::interpreter_path`],
/// compiles it on a blocking task, and verifies the requested packages
/// import cleanly before declaring the runtime ready.
#[derive(Debug, Clone, Default)]
pub struct WasmWorkerLauncher {
    config: WorkerConfig,
}

impl WasmWorkerLauncher {
    /// Create a launcher with the given worker configuration.
    pub fn new(config: WorkerConfig) -> Self {
        Self { config }
    }

    /// The worker configuration this launcher boots with.
    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }
}

impl WorkerLauncher for WasmWorkerLauncher {
    type Runtime = PythonRuntime;

    fn launch(
        &self,
        packages: Vec<String>,
        stdout: Option<StdoutCallback>,
    ) -> BoxFuture<'_, Result<PythonRuntime>> {
        Box::pin(boot(self.config.clone(), packages, stdout))
    }
}

async fn boot(
    config: WorkerConfig,
    packages: Vec<String>,
    stdout: Option<StdoutCallback>,
) -> Result<PythonRuntime> {
    tracing::debug!(
        interpreter = %config.interpreter_path.display(),
        "loading python interpreter"
    );

    let mut engine_config = wasmtime::Config::new();
    engine_config.epoch_interruption(true);
    let engine = Engine::new(&engine_config)
        .map_err(|e| RuntimeError::RuntimeInit(anyhow::anyhow!("failed to create engine: {}", e)))?;

    // Reading and compiling the interpreter is CPU-heavy; keep it off the
    // async threads
    let path = config.interpreter_path.clone();
    let compile_engine = engine.clone();
    let module = tokio::task::spawn_blocking(move || -> Result<Module> {
        let wasm_bytes = std::fs::read(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                RuntimeError::InterpreterNotFound(path.display().to_string())
            } else {
                RuntimeError::Io(e)
            }
        })?;
        Module::new(&compile_engine, &wasm_bytes).map_err(|e| {
            RuntimeError::ModuleLoad(anyhow::anyhow!("failed to compile module: {}", e))
        })
    })
    .await
    .map_err(|e| RuntimeError::RuntimeInit(anyhow::anyhow!("compilation task failed: {}", e)))??;

    let runtime = PythonRuntime::new(engine, module, config, packages, stdout);

    // Ready means the requested packages actually import; probe with an
    // empty program so only the preamble runs
    if !runtime.packages().is_empty() {
        let probe = runtime.run("").await?;
        if !probe.is_success() {
            let message = probe
                .exception()
                .map(|exc| exc.to_string())
                .unwrap_or_else(|| probe.stderr.trim().to_string());
            return Err(RuntimeError::PackageLoad(message));
        }
        tracing::debug!(packages = ?runtime.packages(), "packages loaded");
    }

    Ok(runtime)
}
