// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Order-insensitive comparisons used by update plans.

use std::collections::HashMap;
use std::hash::Hash;

/// Whether `a` and `b` hold the same elements with the same multiplicity,
/// ignoring order.
#[must_use]
pub fn list_content_equals<T: Eq + Hash>(a: &[T], b: &[T]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut counts: HashMap<&T, i64> = HashMap::with_capacity(a.len());
    for item in a {
        *counts.entry(item).or_default() += 1;
    }
    for item in b {
        match counts.get_mut(item) {
            Some(n) if *n > 0 => *n -= 1,
            _ => return false,
        }
    }
    true
}

/// `desired` differs from `observed`; an unset desired value never differs.
#[must_use]
pub fn differs<T: PartialEq + ?Sized>(desired: Option<&T>, observed: &T) -> bool {
    desired.is_some_and(|d| d != observed)
}

#[cfg(test)]
#[path = "compare_tests.rs"]
mod compare_tests;
