//! At-most-once initialization of the embedded Python runtime.

use std::sync::{Arc, LazyLock, Mutex};
use std::time::Instant;

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;

use crate::error::InitError;
use crate::init::debug::{log_elapsed, set_debug};
use crate::init::options::InitOptions;
use crate::worker::launcher::{WasmWorkerLauncher, WorkerLauncher};
use crate::worker::runtime::PythonRuntime;

/// The future stored in the initialization slot: shared by every caller,
/// whether it is still pending or already settled.
type InitFuture<R> = Shared<BoxFuture<'static, Result<Arc<R>, InitError>>>;

/// Initializes a runtime exactly once and caches the outcome.
///
/// The slot transitions from empty to holding a shared future and never
/// goes back: all concurrent and subsequent callers observe the same
/// eventual value, including a failure. One initializer instance backs
/// the module-level [`initialize`]/[`instance`] entry points; tests and
/// embedders can own their own instance instead.
pub struct RuntimeInitializer<L: WorkerLauncher> {
    launcher: Arc<L>,
    slot: Mutex<Option<InitFuture<L::Runtime>>>,
}

impl<L: WorkerLauncher> RuntimeInitializer<L> {
    /// Create an initializer around the given launcher.
    pub fn new(launcher: L) -> Self {
        Self {
            launcher: Arc::new(launcher),
            slot: Mutex::new(None),
        }
    }

    /// The launcher this initializer drives.
    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    /// Whether initialization has been started (pending or settled).
    pub fn started(&self) -> bool {
        self.slot.lock().unwrap().is_some()
    }

    /// Initialize the runtime, ensuring the launcher runs at most once.
    ///
    /// Applies `options.debug` to the process-wide flag on every call.
    /// The first call stores a pending future built from `options`; later
    /// calls get that same future back and their `packages`/`stdout` are
    /// discarded. A launch failure is cached like a success: every caller
    /// for the rest of the process sees the same error.
    pub async fn initialize(&self, options: InitOptions) -> Result<Arc<L::Runtime>, InitError> {
        set_debug(options.debug);
        self.obtain(options).await
    }

    /// Get the runtime, initializing it with default options if needed.
    ///
    /// If initialization is already underway or complete, joins it
    /// without touching the debug flag or supplying options.
    pub async fn get(&self) -> Result<Arc<L::Runtime>, InitError> {
        let existing = self.slot.lock().unwrap().clone();
        match existing {
            Some(init) => init.await,
            None => self.initialize(InitOptions::default()).await,
        }
    }

    /// Check-and-store of the shared future. Runs synchronously, so
    /// there is no window in which two callers can both observe an empty
    /// slot.
    fn obtain(&self, options: InitOptions) -> InitFuture<L::Runtime> {
        let mut slot = self.slot.lock().unwrap();
        if let Some(init) = slot.as_ref() {
            return init.clone();
        }

        let launcher = Arc::clone(&self.launcher);
        let InitOptions {
            packages, stdout, ..
        } = options;
        let start = Instant::now();
        let init = async move {
            let runtime = launcher
                .launch(packages, stdout)
                .await
                .map_err(InitError::from)?;
            log_elapsed("python runtime initialized", start);
            Ok(Arc::new(runtime))
        }
        .boxed()
        .shared();

        *slot = Some(init.clone());
        init
    }
}

static GLOBAL_INITIALIZER: LazyLock<RuntimeInitializer<WasmWorkerLauncher>> =
    LazyLock::new(|| RuntimeInitializer::new(WasmWorkerLauncher::default()));

/// The process-wide initializer backing [`initialize`] and [`instance`].
pub fn global_initializer() -> &'static RuntimeInitializer<WasmWorkerLauncher> {
    &GLOBAL_INITIALIZER
}

/// Initialize the embedded Python runtime, ensuring it is initialized
/// only once per process.
pub async fn initialize(options: InitOptions) -> Result<Arc<PythonRuntime>, InitError> {
    GLOBAL_INITIALIZER.initialize(options).await
}

/// Get the runtime instance, initializing it if needed.
///
/// Provides access outside whatever startup code called [`initialize`],
/// without forcing call sites to carry options.
pub async fn instance() -> Result<Arc<PythonRuntime>, InitError> {
    GLOBAL_INITIALIZER.get().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use crate::error::RuntimeError;
    use crate::worker::io::StdoutCallback;

    #[derive(Debug)]
    struct StubWorker;

    /// Launcher that records how it was driven.
    struct StubLauncher {
        calls: AtomicUsize,
        delay: Duration,
        fail_with: Option<String>,
    }

    impl StubLauncher {
        fn ready() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                delay: Duration::ZERO,
                fail_with: None,
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                fail_with: Some(message.to_string()),
                ..Self::ready()
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl WorkerLauncher for StubLauncher {
        type Runtime = StubWorker;

        fn launch(
            &self,
            _packages: Vec<String>,
            _stdout: Option<StdoutCallback>,
        ) -> BoxFuture<'_, Result<StubWorker, RuntimeError>> {
            Box::pin(async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                if !self.delay.is_zero() {
                    tokio::time::sleep(self.delay).await;
                }
                match &self.fail_with {
                    Some(message) => Err(RuntimeError::ExecutionFailed(message.clone())),
                    None => Ok(StubWorker),
                }
            })
        }
    }

    #[tokio::test]
    async fn initializes_exactly_once() {
        let init = RuntimeInitializer::new(StubLauncher::ready());
        assert!(!init.started());

        let first = init.initialize(InitOptions::default()).await.unwrap();
        assert!(init.started());
        let second = init.initialize(InitOptions::default()).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(init.launcher().calls(), 1);
    }

    #[tokio::test]
    async fn accessor_initializes_lazily() {
        let init = RuntimeInitializer::new(StubLauncher::ready());

        let via_get = init.get().await.unwrap();
        let via_initialize = init.initialize(InitOptions::default()).await.unwrap();

        assert!(Arc::ptr_eq(&via_get, &via_initialize));
        assert_eq!(init.launcher().calls(), 1);
    }

    #[tokio::test]
    async fn failure_stays_cached() {
        let init = RuntimeInitializer::new(StubLauncher::failing("network error"));

        let first = init.initialize(InitOptions::default()).await.unwrap_err();
        let second = init.get().await.unwrap_err();

        assert_eq!(first.to_string(), second.to_string());
        assert_eq!(init.launcher().calls(), 1);
    }
}
