// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Exponential-backoff decision of when a call must be verified.
//!
//! The scheduler answers one question per invocation: is this the call we
//! re-check? Verification fires when `call_count` sits at the start of the
//! current window; each firing widens the window to `base^check_count`, so
//! with `base = 2` checks land on calls 1, 2, 4, 8, 16, … and the amortized
//! overhead over N calls is O(log N). Confidence in purity accrues, checks
//! decay geometrically, and every doubling interval still performs one
//! check so regressions are eventually caught.
//!
//! `base == 1` pins the window at one call: verify always. A base of zero
//! is rejected by the wrapper constructors before a scheduler is ever
//! built, so `base >= 1` is an invariant here.

/// Per-function backoff state. One per wrapper, advanced once per
/// non-replay invocation.
#[derive(Debug, Clone)]
pub struct SamplingScheduler {
    base: u64,
    /// Position inside the current window, wrapped modulo its size.
    call_count: u64,
    /// Completed verification events; exponent of the next window.
    check_count: u32,
    /// Size of the window established at the last verification.
    window: u64,
}

impl SamplingScheduler {
    /// `base` must already be validated as `>= 1`.
    pub fn new(base: u64) -> Self {
        debug_assert!(base >= 1, "scheduler built with base {}", base);
        SamplingScheduler {
            base,
            call_count: 0,
            check_count: 0,
            window: 1,
        }
    }

    /// Decide whether this invocation is verified, advancing the state.
    pub fn should_verify(&mut self) -> bool {
        if self.base == 1 {
            self.check_count = self.check_count.saturating_add(1);
            return true;
        }
        let due = self.call_count == 0;
        if due {
            // The window grows only at a verification boundary; mid-window
            // calls keep cycling through the window they started in.
            self.window = self.base.saturating_pow(self.check_count);
            self.check_count = self.check_count.saturating_add(1);
        }
        self.call_count = (self.call_count + 1) % self.window;
        due
    }

    /// Verification events so far.
    pub fn check_count(&self) -> u32 {
        self.check_count
    }
}
