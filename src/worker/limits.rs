//! Resource limiting for worker runs.

use wasmtime::{ResourceLimiter, Store};

/// Resource limiter that enforces memory and table size limits on a run.
pub struct RunLimiter {
    /// Maximum memory in bytes.
    max_memory: u64,
    /// Current memory allocation.
    current_memory: u64,
    /// Maximum table elements.
    max_table_elements: u64,
    /// Whether a limit has been exceeded.
    limit_exceeded: bool,
}

impl RunLimiter {
    /// Create a new limiter with the specified memory limit.
    pub fn new(max_memory: u64) -> Self {
        Self {
            max_memory,
            current_memory: 0,
            max_table_elements: 10_000,
            limit_exceeded: false,
        }
    }

    /// Check if any limit has been exceeded.
    pub fn limit_exceeded(&self) -> bool {
        self.limit_exceeded
    }

    /// Get the current memory usage.
    pub fn current_memory(&self) -> u64 {
        self.current_memory
    }
}

impl ResourceLimiter for RunLimiter {
    fn memory_growing(
        &mut self,
        _current: usize,
        desired: usize,
        _maximum: Option<usize>,
    ) -> anyhow::Result<bool> {
        let desired_bytes = desired as u64;
        if desired_bytes > self.max_memory {
            self.limit_exceeded = true;
            return Ok(false);
        }
        self.current_memory = desired_bytes;
        Ok(true)
    }

    fn table_growing(
        &mut self,
        _current: usize,
        desired: usize,
        _maximum: Option<usize>,
    ) -> anyhow::Result<bool> {
        if desired as u64 > self.max_table_elements {
            self.limit_exceeded = true;
            return Ok(false);
        }
        Ok(true)
    }
}

/// Store data for a single run: the limiter plus the WASI context.
pub struct StoreData {
    /// The resource limiter.
    pub limiter: RunLimiter,
    /// WASI Preview 1 context for the run.
    pub wasi: wasmtime_wasi::preview1::WasiP1Ctx,
}

impl StoreData {
    /// Create new store data with the given memory limit and WASI context.
    pub fn new(max_memory: u64, wasi: wasmtime_wasi::preview1::WasiP1Ctx) -> Self {
        Self {
            limiter: RunLimiter::new(max_memory),
            wasi,
        }
    }
}

/// Extension trait for Store to configure resource limiting.
pub trait StoreLimiterExt {
    /// Configure the store with resource limiting enabled.
    fn configure_limiter(&mut self);
}

impl StoreLimiterExt for Store<StoreData> {
    fn configure_limiter(&mut self) {
        self.limiter(|data| &mut data.limiter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limiter_allows_within_limit() {
        let mut limiter = RunLimiter::new(1024 * 1024);

        let result = limiter.memory_growing(0, 512 * 1024, None).unwrap();
        assert!(result);
        assert!(!limiter.limit_exceeded());
        assert_eq!(limiter.current_memory(), 512 * 1024);
    }

    #[test]
    fn limiter_denies_over_limit() {
        let mut limiter = RunLimiter::new(1024 * 1024);

        let result = limiter.memory_growing(0, 2 * 1024 * 1024, None).unwrap();
        assert!(!result);
        assert!(limiter.limit_exceeded());
    }

    #[test]
    fn limiter_denies_oversized_table() {
        let mut limiter = RunLimiter::new(1024 * 1024);

        let result = limiter.table_growing(0, 100_000, None).unwrap();
        assert!(!result);
        assert!(limiter.limit_exceeded());
    }
}
