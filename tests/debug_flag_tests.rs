//! Process-wide debug flag behavior.
//!
//! Lives in its own test binary: the flag is process-global, and the
//! initializer tests in other binaries set it concurrently.

use std::sync::atomic::{AtomicUsize, Ordering};

use futures::future::BoxFuture;

use wasm_python_runtime_rs::{
    debug_enabled, set_debug, InitOptions, RuntimeError, RuntimeInitializer, StdoutCallback,
    WorkerLauncher,
};

struct TestWorker;

struct CountingLauncher {
    calls: AtomicUsize,
}

impl CountingLauncher {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

impl WorkerLauncher for CountingLauncher {
    type Runtime = TestWorker;

    fn launch(
        &self,
        _packages: Vec<String>,
        _stdout: Option<StdoutCallback>,
    ) -> BoxFuture<'_, Result<TestWorker, RuntimeError>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(TestWorker)
        })
    }
}

#[tokio::test]
async fn debug_flag_follows_every_initialize_call() {
    let init = RuntimeInitializer::new(CountingLauncher::new());

    init.initialize(InitOptions::builder().debug(true).build())
        .await
        .unwrap();
    assert!(debug_enabled());

    // The runtime already exists; the flag still follows the options
    init.initialize(InitOptions::builder().debug(false).build())
        .await
        .unwrap();
    assert!(!debug_enabled());
    assert_eq!(init.launcher().calls.load(Ordering::SeqCst), 1);

    // The accessor joins a populated slot without touching the flag
    set_debug(true);
    init.get().await.unwrap();
    assert!(debug_enabled());

    // On an empty slot the accessor initializes with default options,
    // which reset the flag
    let fresh = RuntimeInitializer::new(CountingLauncher::new());
    fresh.get().await.unwrap();
    assert!(!debug_enabled());
}
