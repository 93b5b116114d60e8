//! Options for the first initialization call.

use std::fmt;
use std::sync::Arc;

use crate::worker::io::StdoutCallback;

/// Configuration read once, by the first call that triggers
/// initialization.
///
/// `packages` and `stdout` from later calls are discarded; `debug` is
/// applied to the process-wide flag on every call.
#[derive(Clone, Default)]
pub struct InitOptions {
    /// Enable debug timing/log output.
    pub debug: bool,
    /// Additional Python package names to load.
    pub packages: Vec<String>,
    /// Callback invoked with each line of the runtime's stdout.
    pub stdout: Option<StdoutCallback>,
}

impl InitOptions {
    /// Create a new builder for InitOptions.
    pub fn builder() -> InitOptionsBuilder {
        InitOptionsBuilder::default()
    }
}

impl fmt::Debug for InitOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InitOptions")
            .field("debug", &self.debug)
            .field("packages", &self.packages)
            .field("stdout", &self.stdout.as_ref().map(|_| "<callback>"))
            .finish()
    }
}

/// Builder for creating InitOptions instances.
#[derive(Clone, Default)]
pub struct InitOptionsBuilder {
    debug: bool,
    packages: Vec<String>,
    stdout: Option<StdoutCallback>,
}

impl InitOptionsBuilder {
    /// Enable or disable debug timing/log output.
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Set the packages to load at initialization.
    pub fn packages<I, S>(mut self, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.packages = packages.into_iter().map(Into::into).collect();
        self
    }

    /// Set the callback that receives the runtime's stdout lines.
    pub fn stdout(mut self, callback: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.stdout = Some(Arc::new(callback));
        self
    }

    /// Build the InitOptions.
    pub fn build(self) -> InitOptions {
        InitOptions {
            debug: self.debug,
            packages: self.packages,
            stdout: self.stdout,
        }
    }
}
