// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `adapter.rs`

#[cfg(test)]
mod tests {
    use crate::errors::TerminalReason;
    use crate::reconcilers::actuator::Lookup;
    use crate::reconcilers::adapter::{
        at_most_one, import_lookup, required, resource_name, single_match, unclaimed,
    };
    use std::collections::HashSet;

    #[test]
    fn test_resource_name_defaults_to_object_name() {
        assert_eq!(resource_name("n1", None), "n1");
        assert_eq!(resource_name("n1", Some(&"custom".to_string())), "custom");
    }

    #[test]
    fn test_at_most_one() {
        assert_eq!(at_most_one::<u8>(vec![]).unwrap(), None);
        assert_eq!(at_most_one(vec![7]).unwrap(), Some(7));

        let err = at_most_one(vec![1, 2]).unwrap_err();
        assert_eq!(
            err.terminal_reason(),
            Some(TerminalReason::InvalidConfiguration)
        );
        assert!(err.to_string().ends_with("Found 2"));
    }

    #[test]
    fn test_single_match_names_the_kind() {
        assert_eq!(single_match::<u8>("network", vec![]).unwrap(), None);
        assert_eq!(single_match("network", vec![7]).unwrap(), Some(7));

        let err = single_match("network", vec![1, 2]).unwrap_err();
        assert_eq!(
            err.terminal_reason(),
            Some(TerminalReason::InvalidConfiguration)
        );
        assert_eq!(err.to_string(), "found more than one matching network");
    }

    #[test]
    fn test_import_lookup() {
        assert_eq!(import_lookup::<u8>(vec![]).unwrap(), Lookup::Absent);
        assert_eq!(import_lookup(vec![3]).unwrap(), Lookup::Found(3));
        assert!(import_lookup(vec![3, 4]).is_err());
    }

    #[test]
    fn test_unclaimed_drops_ids_owned_elsewhere() {
        let claimed: HashSet<String> = ["b".to_string()].into_iter().collect();
        let left = unclaimed(
            vec!["a".to_string(), "b".to_string(), "c".to_string()],
            &claimed,
            String::as_str,
        );
        assert_eq!(left, vec!["a", "c"]);
    }

    #[test]
    fn test_required() {
        let id = Some("abc".to_string());
        assert_eq!(required(id.as_ref(), "Network", "n1").unwrap(), "abc");
        let err = required(None, "Network", "n1").unwrap_err();
        assert!(!err.is_terminal());
        assert!(err.to_string().contains("Network n1"));
    }
}
