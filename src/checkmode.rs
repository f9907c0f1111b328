// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The reentrant, process-wide "verify everything" toggle.
//!
//! While at least one [`CheckScope`] is alive, every verification-capable
//! wrapper treats every call as a verification call, regardless of its own
//! sampling state. Because the toggle is a depth counter rather than a
//! flag, scopes nest: a test can open one outer scope and the whole call
//! tree underneath it, including functions called transitively, runs
//! checked. Typical use is unit tests; production leaves the counter at
//! zero and pays only the sampled verification cost.
//!
//! The counter is an atomic with relaxed ordering: it gates behavior but
//! orders no data, and the replay guard in the wrappers is what keeps
//! verification from recursing.

use std::sync::atomic::{AtomicUsize, Ordering};

static CHECK_DEPTH: AtomicUsize = AtomicUsize::new(0);

/// True while any check scope is active anywhere in the process.
pub fn check_mode_active() -> bool {
    CHECK_DEPTH.load(Ordering::Relaxed) > 0
}

/// RAII handle for check mode. Dropping it ends the scope on every exit
/// path, normal return or unwind, so the depth counter cannot go negative
/// by construction.
#[must_use = "check mode ends when the scope is dropped"]
pub struct CheckScope {
    _priv: (),
}

/// Enter check mode until the returned scope is dropped.
pub fn check_scope() -> CheckScope {
    CHECK_DEPTH.fetch_add(1, Ordering::Relaxed);
    CheckScope { _priv: () }
}

impl Drop for CheckScope {
    fn drop(&mut self) {
        let prev = CHECK_DEPTH.fetch_sub(1, Ordering::Relaxed);
        debug_assert!(prev > 0, "check-mode depth underflow");
    }
}

/// Run `f` under check mode; the decorator form of [`check_scope`].
pub fn with_check_mode<T>(f: impl FnOnce() -> T) -> T {
    let _scope = check_scope();
    f()
}

/// Serializes tests that touch the process-global counter or depend on it
/// staying untouched. Cargo runs tests in one binary concurrently; exact
/// assertions about check mode need this.
#[cfg(test)]
pub(crate) fn test_serial() -> std::sync::MutexGuard<'static, ()> {
    use std::sync::{Mutex, OnceLock};
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}
