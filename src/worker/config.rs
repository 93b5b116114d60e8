//! Worker configuration with builder pattern.

use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the embedded Python worker.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Path to the Python interpreter wasm file.
    pub interpreter_path: PathBuf,
    /// Maximum wall-clock time for a single run.
    pub timeout: Duration,
    /// Maximum memory in bytes for a single run.
    pub max_memory: u64,
    /// Epoch interruption interval for cooperative timeout.
    pub epoch_tick_interval: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            interpreter_path: PathBuf::from("assets/rustpython.wasm"),
            timeout: Duration::from_secs(30),
            max_memory: 64 * 1024 * 1024, // 64MB
            epoch_tick_interval: Duration::from_millis(10),
        }
    }
}

impl WorkerConfig {
    /// Create a new builder for WorkerConfig.
    pub fn builder() -> WorkerConfigBuilder {
        WorkerConfigBuilder::default()
    }
}

/// Builder for creating WorkerConfig instances.
#[derive(Debug, Clone, Default)]
pub struct WorkerConfigBuilder {
    interpreter_path: Option<PathBuf>,
    timeout: Option<Duration>,
    max_memory: Option<u64>,
    epoch_tick_interval: Option<Duration>,
}

impl WorkerConfigBuilder {
    /// Set the path to the Python interpreter wasm file.
    pub fn interpreter_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.interpreter_path = Some(path.into());
        self
    }

    /// Set the per-run timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the per-run memory limit in bytes.
    pub fn max_memory(mut self, bytes: u64) -> Self {
        self.max_memory = Some(bytes);
        self
    }

    /// Set the epoch tick interval for timeout checking.
    pub fn epoch_tick_interval(mut self, interval: Duration) -> Self {
        self.epoch_tick_interval = Some(interval);
        self
    }

    /// Build the WorkerConfig.
    pub fn build(self) -> WorkerConfig {
        let default = WorkerConfig::default();
        WorkerConfig {
            interpreter_path: self.interpreter_path.unwrap_or(default.interpreter_path),
            timeout: self.timeout.unwrap_or(default.timeout),
            max_memory: self.max_memory.unwrap_or(default.max_memory),
            epoch_tick_interval: self
                .epoch_tick_interval
                .unwrap_or(default.epoch_tick_interval),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = WorkerConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_memory, 64 * 1024 * 1024);
        assert_eq!(
            config.interpreter_path,
            PathBuf::from("assets/rustpython.wasm")
        );
    }

    #[test]
    fn builder_overrides() {
        let config = WorkerConfig::builder()
            .interpreter_path("interp/python.wasm")
            .timeout(Duration::from_secs(5))
            .max_memory(32 * 1024 * 1024)
            .build();

        assert_eq!(config.interpreter_path, PathBuf::from("interp/python.wasm"));
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.max_memory, 32 * 1024 * 1024);
        assert_eq!(config.epoch_tick_interval, Duration::from_millis(10));
    }
}
