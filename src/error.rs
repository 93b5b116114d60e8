//! Error types for runtime initialization and execution.

use std::sync::Arc;

use thiserror::Error;

/// Errors that can occur while booting or driving the Python runtime.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Failed to initialize the Wasm engine or its plumbing.
    #[error("failed to initialize runtime: {0}")]
    RuntimeInit(#[source] anyhow::Error),

    /// Failed to compile or instantiate the Python interpreter module.
    #[error("failed to load Python interpreter: {0}")]
    ModuleLoad(#[source] anyhow::Error),

    /// The interpreter wasm file was not found.
    #[error("Python interpreter wasm not found at: {0}")]
    InterpreterNotFound(String),

    /// One of the requested packages failed to import during startup.
    #[error("failed to load packages: {0}")]
    PackageLoad(String),

    /// A run exceeded the configured timeout.
    #[error("execution timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// A run exceeded the configured memory limit.
    #[error("memory limit exceeded: {0}")]
    MemoryLimitExceeded(String),

    /// The Python code execution failed for another reason.
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// I/O error while reading the interpreter or during execution.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RuntimeError {
    /// Check if this error represents a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, RuntimeError::Timeout(_))
    }

    /// Check if this error represents a memory limit violation.
    pub fn is_memory_limit(&self) -> bool {
        matches!(self, RuntimeError::MemoryLimitExceeded(_))
    }

    /// Check if this error represents a missing interpreter asset.
    pub fn is_interpreter_not_found(&self) -> bool {
        matches!(self, RuntimeError::InterpreterNotFound(_))
    }

    /// Check if this error represents a package that failed to load.
    pub fn is_package_load(&self) -> bool {
        matches!(self, RuntimeError::PackageLoad(_))
    }
}

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, RuntimeError>;

/// An initialization failure handed out by the singleton initializer.
///
/// The initializer caches the outcome of the one launch attempt, so the
/// same failure is returned to every caller for the rest of the process
/// lifetime. That makes this type `Clone`: it shares the underlying
/// [`RuntimeError`] rather than duplicating it.
#[derive(Debug, Clone)]
pub struct InitError(Arc<RuntimeError>);

impl InitError {
    /// The underlying runtime error that rejected initialization.
    pub fn inner(&self) -> &RuntimeError {
        &self.0
    }
}

impl std::fmt::Display for InitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&*self.0, f)
    }
}

impl std::error::Error for InitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(&*self.0)
    }
}

impl From<RuntimeError> for InitError {
    fn from(err: RuntimeError) -> Self {
        Self(Arc::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_error_helpers() {
        let timeout = RuntimeError::Timeout(std::time::Duration::from_secs(5));
        assert!(timeout.is_timeout());
        assert!(!timeout.is_memory_limit());

        let missing = RuntimeError::InterpreterNotFound("assets/rustpython.wasm".into());
        assert!(missing.is_interpreter_not_found());

        let pkg = RuntimeError::PackageLoad("No module named 'numpy'".into());
        assert!(pkg.is_package_load());
    }

    #[test]
    fn init_error_shares_the_underlying_failure() {
        let err = InitError::from(RuntimeError::ExecutionFailed("boot failed".into()));
        let clone = err.clone();

        assert_eq!(err.to_string(), clone.to_string());
        assert!(matches!(clone.inner(), RuntimeError::ExecutionFailed(_)));
    }
}
