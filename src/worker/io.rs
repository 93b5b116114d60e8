//! Output routing between the embedded runtime and the host.

use std::fmt;
use std::sync::Arc;

/// Callback invoked with each line the runtime writes to stdout.
pub type StdoutCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Routes captured stdout to an optional host callback, line by line.
#[derive(Clone, Default)]
pub struct OutputRouter {
    callback: Option<StdoutCallback>,
}

impl OutputRouter {
    /// Create a router around an optional callback.
    pub fn new(callback: Option<StdoutCallback>) -> Self {
        Self { callback }
    }

    /// Whether a callback is attached.
    pub fn is_attached(&self) -> bool {
        self.callback.is_some()
    }

    /// Forward the captured output to the callback, one call per line.
    ///
    /// A trailing newline does not produce an empty final call.
    pub fn forward(&self, captured: &str) {
        if let Some(callback) = &self.callback {
            for line in captured.lines() {
                callback(line);
            }
        }
    }
}

impl fmt::Debug for OutputRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputRouter")
            .field("callback", &self.callback.as_ref().map(|_| "<callback>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn collecting_router() -> (OutputRouter, Arc<Mutex<Vec<String>>>) {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&lines);
        let router = OutputRouter::new(Some(Arc::new(move |line: &str| {
            sink.lock().unwrap().push(line.to_string());
        })));
        (router, lines)
    }

    #[test]
    fn forwards_each_line() {
        let (router, lines) = collecting_router();
        router.forward("hello\nworld\n");
        assert_eq!(*lines.lock().unwrap(), vec!["hello", "world"]);
    }

    #[test]
    fn empty_capture_forwards_nothing() {
        let (router, lines) = collecting_router();
        router.forward("");
        assert!(lines.lock().unwrap().is_empty());
    }

    #[test]
    fn detached_router_is_a_no_op() {
        let router = OutputRouter::new(None);
        assert!(!router.is_attached());
        router.forward("ignored\n");
    }
}
