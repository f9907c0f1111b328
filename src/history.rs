// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Bounded history of past calls, replayed to detect impurity.
//!
//! Three slots hold `(input, output)` pairs: slot 0 is always the newest
//! verified call, slot 1 the one before it, and slot 2 is refreshed from
//! slot 1 only every 13th call, so one aged sample survives long enough to
//! catch slow-developing state drift. Replay order is shuffled each time
//! to avoid positional bias when the function's misbehavior depends on
//! call order.
//!
//! The memory bound (three pairs) and the work bound (at most three extra
//! invocations per verification) are what make always-on verification
//! affordable in a test suite.

use rand::seq::SliceRandom;
use rand::Rng;

/// Slot 2 ages: it is refreshed only once per this many recorded calls.
const AGED_SLOT_PERIOD: u32 = 13;

/// Number of remembered `(input, output)` pairs.
pub const HISTORY_SLOTS: usize = 3;

/// Fixed-size record of past calls for one wrapped function.
#[derive(Debug, Clone)]
pub struct CallHistory<A, R> {
    slots: [Option<(A, R)>; HISTORY_SLOTS],
    call_count: u32,
}

impl<A, R> Default for CallHistory<A, R> {
    fn default() -> Self {
        CallHistory {
            slots: [None, None, None],
            call_count: 0,
        }
    }
}

impl<A, R> CallHistory<A, R>
where
    A: Clone,
    R: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Push the newest call into slot 0, shifting slot 0's previous
    /// occupant down and aging slot 2 on the period boundary.
    pub fn record(&mut self, arg: A, result: R) {
        if self.call_count == 0 {
            self.slots[2] = self.slots[1].clone();
        }
        self.slots[1] = self.slots[0].take();
        self.slots[0] = Some((arg, result));
        self.call_count = (self.call_count + 1) % AGED_SLOT_PERIOD;
    }

    /// Clone the occupied slots in a freshly shuffled order for replay.
    pub fn snapshot_shuffled<G: Rng>(&self, rng: &mut G) -> Vec<(A, R)> {
        let mut order = [0usize, 1, 2];
        order.shuffle(rng);
        order
            .iter()
            .filter_map(|&i| self.slots[i].clone())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    #[cfg(test)]
    fn slot(&self, i: usize) -> Option<&(A, R)> {
        self.slots[i].as_ref()
    }
}
