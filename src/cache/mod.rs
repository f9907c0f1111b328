// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Bounded memoization keyed by call arguments.
//!
//! The cache is the speed half of the engine. It never decides anything
//! about purity on its own; the wrappers consult it and the sweep registry
//! empties it at epoch boundaries.

mod lru;

pub use lru::{CacheOptions, CacheStats, MemoCache};
