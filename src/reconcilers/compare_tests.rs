// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `compare.rs`

#[cfg(test)]
mod tests {
    use crate::reconcilers::compare::{differs, list_content_equals};

    #[test]
    fn test_list_content_equals_ignores_order() {
        assert!(list_content_equals(&["8.8.8.8", "1.1.1.1"], &["1.1.1.1", "8.8.8.8"]));
        assert!(list_content_equals::<&str>(&[], &[]));
    }

    #[test]
    fn test_list_content_equals_counts_duplicates() {
        assert!(!list_content_equals(&["a", "a", "b"], &["a", "b", "b"]));
        assert!(!list_content_equals(&["a"], &["a", "a"]));
        assert!(!list_content_equals(&["a", "b"], &["a", "c"]));
    }

    #[test]
    fn test_differs() {
        assert!(!differs(None, "observed"));
        assert!(!differs(Some("same"), "same"));
        assert!(differs(Some("new"), "old"));
        assert!(differs(Some(&true), &false));
    }
}
