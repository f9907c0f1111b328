//! Canonical workload functions for tests and benches.
//!
//! Always compiled but hidden from documentation. Fibonacci and mergesort
//! exercise the engine's recursive paths; keeping them here means tests,
//! doctests and benches share one definition.

#![doc(hidden)]

use crate::wrap::PureFn;

/// Reference Fibonacci with the 1, 1, 2, 3, ... convention.
pub fn fib(x: u64) -> u64 {
    if x < 2 {
        1
    } else {
        fib(x - 1) + fib(x - 2)
    }
}

/// Fibonacci body in wrapper form; recursion goes through the wrapper.
pub fn fib_body(fib: &dyn PureFn<u64, u64>, x: u64) -> u64 {
    if x < 2 {
        1
    } else {
        fib.invoke(x - 1) + fib.invoke(x - 2)
    }
}

/// Merge two sorted sequences; the body the mergesort tests wrap.
pub fn merge_body(
    merge: &dyn PureFn<(Vec<u64>, Vec<u64>), Vec<u64>>,
    (a, b): (Vec<u64>, Vec<u64>),
) -> Vec<u64> {
    if a.is_empty() {
        return b;
    }
    if b.is_empty() {
        return a;
    }
    if a[0] < b[0] {
        let mut out = vec![a[0]];
        out.extend(merge.invoke((a[1..].to_vec(), b)));
        out
    } else {
        let mut out = vec![b[0]];
        out.extend(merge.invoke((a, b[1..].to_vec())));
        out
    }
}

/// Mergesort driver over any merge implementation.
pub fn mergesort(x: &[u64], merge: &mut impl FnMut(Vec<u64>, Vec<u64>) -> Vec<u64>) -> Vec<u64> {
    if x.len() < 2 {
        return x.to_vec();
    }
    let h = x.len() / 2;
    let left = mergesort(&x[..h], merge);
    let right = mergesort(&x[h..], merge);
    merge(left, right)
}
