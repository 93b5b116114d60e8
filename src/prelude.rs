//! Prelude module for convenient imports.

pub use crate::error::{InitError, Result, RuntimeError};
pub use crate::init::{
    initializer::{initialize, instance, RuntimeInitializer},
    options::InitOptions,
};
pub use crate::worker::{
    config::WorkerConfig,
    launcher::{WasmWorkerLauncher, WorkerLauncher},
    runtime::{ExecutionResult, PythonRuntime},
};
