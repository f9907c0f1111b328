// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Error types for the verification engine.
//!
//! Two failure modes exist and they are deliberately kept apart:
//!
//! - [`ConfigError`] is a builder mistake, rejected before any wrapper is
//!   handed out. It is always fatal to that construction.
//! - [`NotPureError`] is a correctness signal raised at call time when a
//!   function believed pure produced inconsistent results. It is never
//!   swallowed or retried; the point is to fail tests loudly.

use std::fmt;

/// Invalid wrapper configuration, detected at construction time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Sampling base of zero. The backoff law needs `base >= 1`:
    /// `base == 1` means verify every call, larger bases decay geometrically.
    InvalidBase { base: u64 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidBase { base } => {
                write!(f, "sampling base must be >= 1, got {}", base)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// What kind of inconsistency the verifier observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImpurityKind {
    /// Replaying a past input produced a different output than it did before.
    HistoryMismatch,
    /// A fresh execution disagreed with the memoized result for the same key.
    CacheMismatch,
}

/// A function believed pure turned out not to be.
///
/// Carries the offending function's name so a failing test names the culprit
/// directly. The call that detected the violation has already computed its
/// real result; surfacing this error preempts returning it, so callers must
/// treat the call as failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotPureError {
    function: String,
    kind: ImpurityKind,
}

impl NotPureError {
    pub(crate) fn history(function: &str) -> Self {
        NotPureError {
            function: function.to_string(),
            kind: ImpurityKind::HistoryMismatch,
        }
    }

    pub(crate) fn cache(function: &str) -> Self {
        NotPureError {
            function: function.to_string(),
            kind: ImpurityKind::CacheMismatch,
        }
    }

    /// Name of the function that violated purity.
    pub fn function(&self) -> &str {
        &self.function
    }

    /// Which comparison failed.
    pub fn kind(&self) -> ImpurityKind {
        self.kind
    }
}

impl fmt::Display for NotPureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ImpurityKind::HistoryMismatch => {
                write!(f, "{}() has side-effects", self.function)
            }
            ImpurityKind::CacheMismatch => {
                write!(f, "{}() disagrees with its memoized result", self.function)
            }
        }
    }
}

impl std::error::Error for NotPureError {}
