//! Runtime purity verification and sweep-synchronized memoization.
//!
//! Whether a function is pure cannot be decided statically in general, so
//! this crate checks it at run time: mark a function as believed pure and
//! get memoization for speed, plus an opt-in verification mode that
//! re-executes the function against past inputs and fails loudly (a
//! [`NotPureError`]) when the outputs drift. One code path serves both the
//! unit-test suite and the performance-sensitive call site.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐      ┌───────────────┐     ┌──────────────┐
//! │ sampling.rs  │      │  history.rs   │     │ checkmode.rs │
//! │ (exponential │      │ (3-slot replay│     │ (reentrant   │
//! │   backoff)   │      │    buffer)    │     │ global force)│
//! └──────┬───────┘      └───────┬───────┘     └──────┬───────┘
//!        │                      │                    │
//!        ▼                      ▼                    ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │                         wrap/                           │
//! │   (Cached, Checked, VerifiedCache — the entry points)   │
//! └──────┬──────────────────────────────────────────────────┘
//!        │
//!        ▼
//! ┌──────────────┐      ┌───────────────┐
//! │   cache/     │─────▶│   sweep.rs    │
//! │ (bounded LRU │      │ (process-wide │
//! │  memo cache) │      │  invalidation)│
//! └──────────────┘      └───────────────┘
//! ```
//!
//! # Usage
//!
//! ```
//! use purus::{verified_cache, PureFn, VerifiedCacheOptions};
//!
//! let fib = verified_cache(
//!     "fib",
//!     VerifiedCacheOptions::default(),
//!     |fib: &dyn PureFn<u64, u64>, x| {
//!         if x < 2 { 1 } else { fib.invoke(x - 1) + fib.invoke(x - 2) }
//!     },
//! )
//! .unwrap();
//!
//! assert_eq!(fib.call(10).unwrap(), 89);
//! assert_eq!(fib.call(10).unwrap(), 89); // served from cache
//! assert!(fib.cache_stats().hits >= 1);
//! ```
//!
//! In tests, force every wrapped function in the whole call tree to verify:
//!
//! ```
//! use purus::with_check_mode;
//!
//! # fn run_workload() {}
//! with_check_mode(|| run_workload());
//! ```
//!
//! Verification works best when inputs and outputs are plain values with
//! honest `Eq` and `Hash`; interior mutability in arguments defeats the
//! point.

// Module declarations
pub mod cache;
mod checkmode;
mod error;
mod history;
mod sampling;
pub mod sweep;
pub mod testing;
mod wrap;

// Re-exports for public API
pub use cache::{CacheOptions, CacheStats, MemoCache};
pub use checkmode::{check_mode_active, check_scope, with_check_mode, CheckScope};
pub use error::{ConfigError, ImpurityKind, NotPureError};
pub use history::HISTORY_SLOTS;
pub use sweep::{Invalidate, SweepRegistry, SweepStats};
pub use wrap::{
    cache, verified_cache, verify, Cached, Checked, PureFn, VerifiedCache, VerifiedCacheOptions,
    VerifyOptions,
};

/// Fire the process-wide invalidation epoch: every sweep-registered cache
/// is cleared. Wire this to whatever memory-pressure or epoch signal the
/// host application has.
pub fn sweep() -> SweepStats {
    sweep::global().sweep()
}
