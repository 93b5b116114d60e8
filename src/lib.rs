//! # Python Runtime Initialization
//!
//! Lazy, at-most-once initialization for an embedded Python runtime
//! running on WebAssembly.
//!
//! This crate wraps the startup of a Python interpreter (RustPython
//! compiled to wasm, running in Wasmtime) in a memoized async singleton:
//! the first call boots the runtime, and every other call (concurrent or
//! later) gets the same instance back. Initialization can load extra
//! packages and route the runtime's stdout through a callback.
//!
//! ## Example
//!
//! ```rust,ignore
//! use wasm_python_runtime_rs::{initialize, instance, InitOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let runtime = initialize(
//!         InitOptions::builder()
//!             .debug(true)
//!             .packages(["json"])
//!             .stdout(|line| println!("py: {line}"))
//!             .build(),
//!     )
//!     .await?;
//!
//!     let result = runtime.run("print(1 + 1)").await?;
//!     assert_eq!(result.stdout.trim(), "2");
//!
//!     // Anywhere else in the process: same instance, no second boot
//!     let again = instance().await?;
//!     assert!(std::sync::Arc::ptr_eq(&runtime, &again));
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Initialization Contract
//!
//! - The launcher runs **at most once** per process; callers racing
//!   before the first resolution share one underlying future.
//! - `packages` and the stdout callback are read from the call that wins
//!   the slot; later calls' values are discarded.
//! - The `debug` option updates a process-wide flag on every call and
//!   gates a one-line elapsed-time log for the boot.
//! - A failed boot is cached like a successful one: every later call
//!   receives the same error until the process restarts.

pub mod error;
pub mod init;
pub mod prelude;
pub mod worker;

// Re-export main types at crate root for convenience
pub use error::{InitError, Result, RuntimeError};
pub use init::debug::{debug_enabled, set_debug};
pub use init::initializer::{global_initializer, initialize, instance, RuntimeInitializer};
pub use init::options::{InitOptions, InitOptionsBuilder};
pub use worker::config::{WorkerConfig, WorkerConfigBuilder};
pub use worker::io::StdoutCallback;
pub use worker::launcher::{WasmWorkerLauncher, WorkerLauncher};
pub use worker::runtime::{ExecutionResult, PythonException, PythonRuntime};
