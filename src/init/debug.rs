//! Process-wide debug flag consumed by timing logs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

static DEBUG: AtomicBool = AtomicBool::new(false);

/// Set the process-wide debug flag.
///
/// Updated from the options of every [`initialize`] call, even once the
/// runtime already exists.
///
/// [`initialize`]: crate::initialize
pub fn set_debug(enabled: bool) {
    DEBUG.store(enabled, Ordering::Relaxed);
}

/// Whether debug logging is currently enabled.
pub fn debug_enabled() -> bool {
    DEBUG.load(Ordering::Relaxed)
}

/// Emit an elapsed-time log line when the debug flag is set.
pub(crate) fn log_elapsed(what: &str, start: Instant) {
    if debug_enabled() {
        tracing::debug!(elapsed_ms = start.elapsed().as_millis() as u64, "{}", what);
    }
}
