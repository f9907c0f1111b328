// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The composition layer: wrappers binding cache, scheduler, history and
//! check mode into the public entry points.
//!
//! A wrapped function takes `&dyn PureFn` as its first parameter and makes
//! recursive calls through it, so recursion flows back through the wrapper
//! the way calling a decorated name does in a dynamic language:
//!
//! ```
//! use purus::{cache, CacheOptions, PureFn};
//!
//! let fib = cache("fib", CacheOptions::default(), |fib: &dyn PureFn<u64, u64>, x| {
//!     if x < 2 { 1 } else { fib.invoke(x - 1) + fib.invoke(x - 2) }
//! });
//! assert_eq!(fib.call(10), 89);
//! ```
//!
//! Three wrappers cover the four public behaviors:
//!
//! - [`Cached`]: memoization only, never verifies.
//! - [`Checked`]: verification only, always executes the real function.
//! - [`VerifiedCache`]: memoization plus sampled verification, comparing
//!   fresh executions against both the memo cache and past history.
//!
//! The fourth behavior, forcing verification across a whole call tree, is
//! [`crate::check_scope`] / [`crate::with_check_mode`].
//!
//! # Violation latching
//!
//! A mismatch found during a nested (recursive) invocation cannot unwind
//! through user code, so it is latched in the per-function state and
//! surfaced as `Err` by the outermost `call`. The first latched violation
//! wins; the real result of the triggering call is discarded, which is the
//! `Result` rendering of "the raise preempts returning it".

use std::hash::Hash;
use std::sync::Arc;

use parking_lot::Mutex;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::cache::{CacheOptions, CacheStats, MemoCache};
use crate::checkmode::check_mode_active;
use crate::error::{ConfigError, NotPureError};
use crate::history::CallHistory;
use crate::sampling::SamplingScheduler;

/// The capability a wrapped function recurses through.
///
/// Object-safe on purpose: the wrapped closure names `&dyn PureFn<A, R>`
/// rather than its own wrapper type, which would be unnameable.
pub trait PureFn<A, R> {
    /// Run the function through the wrapper. Recursive calls made inside a
    /// wrapped function must go through here so caching and verification
    /// see them.
    fn invoke(&self, arg: A) -> R;
}

/// Configuration for the verification-only wrapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyOptions {
    /// Backoff base: windows grow as `base^check_count`. `1` verifies
    /// every call; `0` is a configuration error.
    pub base: u64,
    /// Fixed RNG seed for deterministic replay order. `None` seeds from
    /// entropy.
    pub seed: Option<u64>,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        VerifyOptions {
            base: 2,
            seed: None,
        }
    }
}

/// Configuration for the combined cache + verification wrapper.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VerifiedCacheOptions {
    pub cache: CacheOptions,
    pub verify: VerifyOptions,
}

/// Per-function mutable record: sampling counters, call history, the
/// replay re-entrancy guard, and any latched violation.
struct FuncState<A, R> {
    scheduler: SamplingScheduler,
    history: CallHistory<A, R>,
    rng: ChaCha8Rng,
    /// True only while a history replay is in flight for this function.
    checking: bool,
    violation: Option<NotPureError>,
}

impl<A: Clone, R: Clone> FuncState<A, R> {
    fn new(base: u64, seed: Option<u64>) -> Self {
        FuncState {
            scheduler: SamplingScheduler::new(base),
            history: CallHistory::new(),
            rng: match seed {
                Some(seed) => ChaCha8Rng::seed_from_u64(seed),
                None => ChaCha8Rng::from_entropy(),
            },
            checking: false,
            violation: None,
        }
    }

    fn snapshot_shuffled(&mut self) -> Vec<(A, R)> {
        self.history.snapshot_shuffled(&mut self.rng)
    }

    fn latch(&mut self, violation: NotPureError) {
        if self.violation.is_none() {
            self.violation = Some(violation);
        }
    }
}

/// What this invocation is, decided before the function runs.
enum Decision {
    /// A replay call made by the verifier itself: run bare, touch nothing.
    Replay,
    /// A sampled or forced verification call.
    Verify,
    /// An ordinary call.
    Plain,
}

fn decide<A, R>(state: &Mutex<FuncState<A, R>>) -> Decision {
    let mut st = state.lock();
    if st.checking {
        Decision::Replay
    } else if check_mode_active() || st.scheduler.should_verify() {
        Decision::Verify
    } else {
        Decision::Plain
    }
}

/// Clears the replay guard even if a replayed call unwinds.
struct ReplayGuard<'a, A, R> {
    state: &'a Mutex<FuncState<A, R>>,
}

impl<A, R> Drop for ReplayGuard<'_, A, R> {
    fn drop(&mut self) {
        self.state.lock().checking = false;
    }
}

/// Replay the recorded history in shuffled order, latching a violation on
/// the first mismatch. `run` executes the real function; the guard keeps
/// calls it makes from being verified or recorded themselves.
fn replay_history<A, R>(name: &str, state: &Mutex<FuncState<A, R>>, mut run: impl FnMut(A) -> R)
where
    A: Clone,
    R: Clone + PartialEq,
{
    let snapshot = {
        let mut st = state.lock();
        st.checking = true;
        st.snapshot_shuffled()
    };
    let guard = ReplayGuard { state };
    let mut violation = None;
    for (past_arg, expected) in snapshot {
        if run(past_arg) != expected {
            violation = Some(NotPureError::history(name));
            break;
        }
    }
    drop(guard);
    if let Some(violation) = violation {
        state.lock().latch(violation);
    }
}

// ============================================================================
// CACHE-ONLY WRAPPER
// ============================================================================

/// Memoizing wrapper with no verification. Produced by [`cache`].
pub struct Cached<A, R, F> {
    name: String,
    cache: Arc<MemoCache<A, R>>,
    func: F,
}

/// Wrap `func` with sweep-synchronized memoization.
///
/// Never verifies, so the result type needs no equality and calls cannot
/// fail. The cache participates in [`crate::sweep`] unless the options opt
/// out.
pub fn cache<A, R, F>(name: impl Into<String>, options: CacheOptions, func: F) -> Cached<A, R, F>
where
    A: Eq + Hash + Clone + Send + 'static,
    R: Clone + Send + 'static,
    F: Fn(&dyn PureFn<A, R>, A) -> R,
{
    Cached {
        name: name.into(),
        cache: MemoCache::shared(&options),
        func,
    }
}

impl<A, R, F> Cached<A, R, F>
where
    A: Eq + Hash + Clone + Send + 'static,
    R: Clone + Send + 'static,
    F: Fn(&dyn PureFn<A, R>, A) -> R,
{
    pub fn call(&self, arg: A) -> R {
        self.invoke(arg)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The wrapped function, callable directly to bypass the cache.
    pub fn inner(&self) -> &F {
        &self.func
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn clear(&self) {
        self.cache.clear();
    }
}

impl<A, R, F> PureFn<A, R> for Cached<A, R, F>
where
    A: Eq + Hash + Clone + Send + 'static,
    R: Clone + Send + 'static,
    F: Fn(&dyn PureFn<A, R>, A) -> R,
{
    fn invoke(&self, arg: A) -> R {
        let func = &self.func;
        self.cache.get_or_compute(arg.clone(), || func(self, arg))
    }
}

// ============================================================================
// VERIFICATION-ONLY WRAPPER
// ============================================================================

/// Verifying wrapper with no cache. Produced by [`verify`].
///
/// Always executes the real function. On a verification call (sampled, or
/// every call under check mode) it replays recorded history and records
/// the fresh pair.
pub struct Checked<A, R, F> {
    name: String,
    state: Mutex<FuncState<A, R>>,
    func: F,
}

/// Wrap `func` with sampled purity verification.
pub fn verify<A, R, F>(
    name: impl Into<String>,
    options: VerifyOptions,
    func: F,
) -> Result<Checked<A, R, F>, ConfigError>
where
    A: Clone,
    R: Clone + PartialEq,
    F: Fn(&dyn PureFn<A, R>, A) -> R,
{
    if options.base == 0 {
        return Err(ConfigError::InvalidBase { base: options.base });
    }
    Ok(Checked {
        name: name.into(),
        state: Mutex::new(FuncState::new(options.base, options.seed)),
        func,
    })
}

impl<A, R, F> Checked<A, R, F>
where
    A: Clone,
    R: Clone + PartialEq,
    F: Fn(&dyn PureFn<A, R>, A) -> R,
{
    /// Run the function; `Err` if this call (or a nested one) detected a
    /// purity violation.
    pub fn call(&self, arg: A) -> Result<R, NotPureError> {
        let res = self.invoke(arg);
        match self.state.lock().violation.take() {
            Some(violation) => Err(violation),
            None => Ok(res),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The wrapped function, callable directly to bypass verification.
    pub fn inner(&self) -> &F {
        &self.func
    }

    /// Sampled verification events performed so far (forced check-mode
    /// verifications do not advance the schedule).
    pub fn check_count(&self) -> u32 {
        self.state.lock().scheduler.check_count()
    }
}

impl<A, R, F> PureFn<A, R> for Checked<A, R, F>
where
    A: Clone,
    R: Clone + PartialEq,
    F: Fn(&dyn PureFn<A, R>, A) -> R,
{
    fn invoke(&self, arg: A) -> R {
        match decide(&self.state) {
            Decision::Replay | Decision::Plain => (self.func)(self, arg),
            Decision::Verify => {
                let res = (self.func)(self, arg.clone());
                replay_history(&self.name, &self.state, |past| (self.func)(self, past));
                self.state.lock().history.record(arg, res.clone());
                res
            }
        }
    }
}

// ============================================================================
// COMBINED WRAPPER
// ============================================================================

/// Memoizing wrapper with sampled verification. Produced by
/// [`verified_cache`].
///
/// Ordinary calls are served from the cache. A verification call computes
/// the fresh result anyway and compares it against the memoized value,
/// catching impurity the cache would otherwise mask, then replays history.
pub struct VerifiedCache<A, R, F> {
    name: String,
    cache: Arc<MemoCache<A, R>>,
    state: Mutex<FuncState<A, R>>,
    func: F,
}

/// Wrap `func` with memoization plus sampled purity verification.
pub fn verified_cache<A, R, F>(
    name: impl Into<String>,
    options: VerifiedCacheOptions,
    func: F,
) -> Result<VerifiedCache<A, R, F>, ConfigError>
where
    A: Eq + Hash + Clone + Send + 'static,
    R: Clone + PartialEq + Send + 'static,
    F: Fn(&dyn PureFn<A, R>, A) -> R,
{
    if options.verify.base == 0 {
        return Err(ConfigError::InvalidBase {
            base: options.verify.base,
        });
    }
    Ok(VerifiedCache {
        name: name.into(),
        cache: MemoCache::shared(&options.cache),
        state: Mutex::new(FuncState::new(options.verify.base, options.verify.seed)),
        func,
    })
}

impl<A, R, F> VerifiedCache<A, R, F>
where
    A: Eq + Hash + Clone + Send + 'static,
    R: Clone + PartialEq + Send + 'static,
    F: Fn(&dyn PureFn<A, R>, A) -> R,
{
    /// Run the function; `Err` if this call (or a nested one) detected a
    /// purity violation.
    pub fn call(&self, arg: A) -> Result<R, NotPureError> {
        let res = self.invoke(arg);
        match self.state.lock().violation.take() {
            Some(violation) => Err(violation),
            None => Ok(res),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The wrapped function, callable directly to bypass the engine.
    pub fn inner(&self) -> &F {
        &self.func
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn cache_clear(&self) {
        self.cache.clear();
    }

    /// Sampled verification events performed so far.
    pub fn check_count(&self) -> u32 {
        self.state.lock().scheduler.check_count()
    }
}

impl<A, R, F> PureFn<A, R> for VerifiedCache<A, R, F>
where
    A: Eq + Hash + Clone + Send + 'static,
    R: Clone + PartialEq + Send + 'static,
    F: Fn(&dyn PureFn<A, R>, A) -> R,
{
    fn invoke(&self, arg: A) -> R {
        match decide(&self.state) {
            // Only nested calls land here: the replayed top-level input
            // is executed directly by `replay_history` and never passes
            // through `invoke`. Nested recursion is served from the
            // cache, so replaying a recursive function stays at a
            // bounded number of real executions.
            Decision::Replay => {
                let func = &self.func;
                self.cache.get_or_compute(arg.clone(), || func(self, arg))
            }
            Decision::Plain => {
                let func = &self.func;
                self.cache.get_or_compute(arg.clone(), || func(self, arg))
            }
            Decision::Verify => {
                let fresh = (self.func)(self, arg.clone());
                // Peek, not get: verification traffic must not distort the
                // hit/miss accounting callers observe.
                match self.cache.peek(&arg) {
                    Some(cached) => {
                        if cached != fresh {
                            self.state.lock().latch(NotPureError::cache(&self.name));
                        }
                    }
                    None => self.cache.insert(arg.clone(), fresh.clone()),
                }
                replay_history(&self.name, &self.state, |past| (self.func)(self, past));
                self.state.lock().history.record(arg, fresh.clone());
                fresh
            }
        }
    }
}
