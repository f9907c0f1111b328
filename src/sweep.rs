// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Process-wide cache invalidation, modeled as an explicit epoch signal.
//!
//! The original design cleared memo caches at the start of every garbage
//! collection so that cached results could never pin soon-to-be-collected
//! values or outlive a collection epoch. Rust has no collector to hook, so
//! the trigger is inverted: anything holding invalidatable state registers
//! itself here, and the host application fires [`SweepRegistry::sweep`]
//! from whatever memory-pressure or epoch signal it has (a periodic tick,
//! an allocator high-water mark, a test harness between cases).
//!
//! Registrations are weak. A cache dropped by its owner is pruned on the
//! next sweep rather than kept alive by the registry, so registering is a
//! fire-and-forget subscription with no teardown protocol.
//!
//! Sweeping must be infallible: `invalidate` implementations are required
//! not to panic, and clearing an already-empty cache is a no-op, which is
//! what makes the snapshot-then-invalidate strategy below safe against
//! registrations that race with an in-flight sweep.

use std::sync::{OnceLock, Weak};

use parking_lot::RwLock;

/// Capability of having all derived state dropped at an epoch boundary.
///
/// Implementations must be infallible and idempotent: a sweep may observe
/// a cache that was cleared moments ago and clear it again.
pub trait Invalidate: Send + Sync {
    fn invalidate(&self);
}

/// Outcome of one sweep, mostly useful for diagnostics and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SweepStats {
    /// Registered entries that were still alive and got invalidated.
    pub swept: usize,
    /// Entries whose owner had dropped them; pruned from the registry.
    pub dead: usize,
}

/// Registry of everything that must be invalidated at an epoch boundary.
///
/// Lives for the process lifetime. Registration is append-only; there is no
/// unregister, dead entries are reaped during sweeps.
pub struct SweepRegistry {
    entries: RwLock<Vec<Weak<dyn Invalidate>>>,
}

impl SweepRegistry {
    pub const fn new() -> Self {
        SweepRegistry {
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Subscribe a cache (or anything invalidatable) to future sweeps.
    pub fn register(&self, entry: Weak<dyn Invalidate>) {
        self.entries.write().push(entry);
    }

    /// Number of registrations still alive.
    pub fn live_count(&self) -> usize {
        self.entries
            .read()
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count()
    }

    /// Invalidate every live registration, then prune dead ones.
    ///
    /// The entry list is snapshotted under the read lock and invalidation
    /// runs outside it, so an `invalidate` implementation that triggers a
    /// registration (a cache rebuilt during clearing) cannot deadlock.
    /// Entries registered mid-sweep are simply picked up next time.
    pub fn sweep(&self) -> SweepStats {
        let snapshot: Vec<Weak<dyn Invalidate>> = self.entries.read().clone();

        let mut stats = SweepStats::default();
        for weak in &snapshot {
            match weak.upgrade() {
                Some(entry) => {
                    entry.invalidate();
                    stats.swept += 1;
                }
                None => stats.dead += 1,
            }
        }

        if stats.dead > 0 {
            self.entries.write().retain(|w| w.strong_count() > 0);
        }
        stats
    }
}

impl Default for SweepRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// The process-wide registry all sweep-participating caches attach to.
pub fn global() -> &'static SweepRegistry {
    static GLOBAL: OnceLock<SweepRegistry> = OnceLock::new();
    GLOBAL.get_or_init(SweepRegistry::new)
}
