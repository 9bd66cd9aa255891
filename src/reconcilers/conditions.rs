// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Condition algebra for the `Available` and `Progressing` conditions.
//!
//! [`compute_conditions`] is pure: given the previous conditions, the object's
//! generation, the readiness of the observed resource, the wait set and the
//! reconcile error, it returns the two conditions to write.
//!
//! # Example
//!
//! ```rust
//! use orc::reconcilers::conditions::compute_conditions;
//!
//! let conditions = compute_conditions(&[], Some(1), true, &[], None, "2025-01-01T00:00:00Z");
//! assert_eq!(conditions[0].r#type, "Available");
//! assert_eq!(conditions[0].status, "True");
//! assert_eq!(conditions[1].reason.as_deref(), Some("Success"));
//! ```

use crate::crd::Condition;
use crate::errors::OrcError;
use crate::reconcilers::wait::{wait_message, WaitEvent};
use crate::status_reasons::{
    CONDITION_STATUS_FALSE, CONDITION_STATUS_TRUE, CONDITION_TYPE_AVAILABLE,
    CONDITION_TYPE_PROGRESSING, MESSAGE_AVAILABLE, MESSAGE_UP_TO_DATE, REASON_PROGRESSING,
    REASON_SUCCESS, REASON_TRANSIENT_ERROR,
};

/// Find a condition by type in a list of conditions.
#[must_use]
pub fn find_condition<'a>(
    conditions: &'a [Condition],
    condition_type: &str,
) -> Option<&'a Condition> {
    conditions.iter().find(|c| c.r#type == condition_type)
}

/// Build a condition, keeping the previous `lastTransitionTime` when status,
/// reason and message are all unchanged.
#[must_use]
pub fn build_condition(
    existing: &[Condition],
    condition_type: &str,
    status: &str,
    reason: &str,
    message: &str,
    generation: Option<i64>,
    now: &str,
) -> Condition {
    let last_transition_time = find_condition(existing, condition_type)
        .filter(|c| {
            c.status == status
                && c.reason.as_deref() == Some(reason)
                && c.message.as_deref() == Some(message)
        })
        .and_then(|c| c.last_transition_time.clone())
        .unwrap_or_else(|| now.to_string());

    Condition {
        r#type: condition_type.to_string(),
        status: status.to_string(),
        reason: Some(reason.to_string()),
        message: Some(message.to_string()),
        observed_generation: generation,
        last_transition_time: Some(last_transition_time),
    }
}

/// Compute `[Available, Progressing]` for one reconcile.
///
/// * `available` - an OpenStack resource was observed and its readiness predicate holds
/// * `waits` - reasons the reconcile is incomplete
/// * `error` - the reconcile error, if any
/// * `now` - RFC3339 timestamp used for new transitions
#[must_use]
pub fn compute_conditions(
    existing: &[Condition],
    generation: Option<i64>,
    available: bool,
    waits: &[WaitEvent],
    error: Option<&OrcError>,
    now: &str,
) -> Vec<Condition> {
    let (progressing_status, reason, message) = match error {
        Some(err) => match err.terminal_reason() {
            Some(reason) => (CONDITION_STATUS_FALSE, reason.as_str(), err.to_string()),
            None => (CONDITION_STATUS_TRUE, REASON_TRANSIENT_ERROR, err.to_string()),
        },
        None if !waits.is_empty() => (
            CONDITION_STATUS_TRUE,
            REASON_PROGRESSING,
            wait_message(waits),
        ),
        None => (
            CONDITION_STATUS_FALSE,
            REASON_SUCCESS,
            MESSAGE_UP_TO_DATE.to_string(),
        ),
    };

    let progressing = build_condition(
        existing,
        CONDITION_TYPE_PROGRESSING,
        progressing_status,
        reason,
        &message,
        generation,
        now,
    );

    let available = if available {
        build_condition(
            existing,
            CONDITION_TYPE_AVAILABLE,
            CONDITION_STATUS_TRUE,
            REASON_SUCCESS,
            MESSAGE_AVAILABLE,
            generation,
            now,
        )
    } else {
        build_condition(
            existing,
            CONDITION_TYPE_AVAILABLE,
            CONDITION_STATUS_FALSE,
            reason,
            &message,
            generation,
            now,
        )
    };

    vec![available, progressing]
}

/// Whether `Available=True` is set.
#[must_use]
pub fn is_available(conditions: &[Condition]) -> bool {
    find_condition(conditions, CONDITION_TYPE_AVAILABLE)
        .is_some_and(|c| c.status == CONDITION_STATUS_TRUE)
}

/// Whether a live object needs another reconcile.
///
/// Objects whose `Progressing` condition is `False` for the current generation
/// are done: either up to date or terminally failed. Only a spec change (a new
/// generation) brings them back.
#[must_use]
pub fn needs_reconcile(conditions: &[Condition], generation: Option<i64>) -> bool {
    match find_condition(conditions, CONDITION_TYPE_PROGRESSING) {
        None => true,
        Some(progressing) => {
            progressing.status == CONDITION_STATUS_TRUE
                || progressing.observed_generation != generation
        }
    }
}

/// Compare two condition lists ignoring `lastTransitionTime`.
#[must_use]
pub fn conditions_equal(current: &[Condition], new: &[Condition]) -> bool {
    current.len() == new.len()
        && new.iter().all(|n| {
            find_condition(current, &n.r#type).is_some_and(|c| {
                c.status == n.status
                    && c.reason == n.reason
                    && c.message == n.message
                    && c.observed_generation == n.observed_generation
            })
        })
}

#[cfg(test)]
#[path = "conditions_tests.rs"]
mod conditions_tests;
