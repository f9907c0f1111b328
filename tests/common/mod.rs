//! Helpers shared by the integration and property suites.

#![allow(dead_code)]

use purus::PureFn;

/// Serialize tests that touch process-global state (check mode, the sweep
/// registry) or assert exact cache statistics. Cargo runs tests in one
/// binary concurrently; without this, one test's check scope or sweep
/// would distort another's counters.
pub fn serial() -> std::sync::MutexGuard<'static, ()> {
    use std::sync::{Mutex, OnceLock, PoisonError};
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

/// Fibonacci body in wrapper form, the canonical recursive workload.
pub fn fib_body(fib: &dyn PureFn<u64, u64>, x: u64) -> u64 {
    if x < 2 {
        1
    } else {
        fib.invoke(x - 1) + fib.invoke(x - 2)
    }
}

/// Reference Fibonacci for comparing against wrapped results.
pub fn fib(x: u64) -> u64 {
    if x < 2 {
        1
    } else {
        fib(x - 1) + fib(x - 2)
    }
}
