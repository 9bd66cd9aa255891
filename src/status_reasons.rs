// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Standard Kubernetes status condition types and reasons for ORC resources.
//!
//! Reasons are programmatic identifiers in CamelCase that explain why a condition has
//! a particular status.
//!
//! # Condition Types
//!
//! Every managed resource carries exactly two conditions:
//!
//! - **`Available`** - the OpenStack resource exists and is operationally ready
//! - **`Progressing`** - the controller expects to reconcile the object again
//!
//! `Available=False` always copies its reason and message from `Progressing`, so
//! a user only needs to read one condition to learn why a resource is not ready.
//!
//! # Example Status
//!
//! ```yaml
//! status:
//!   id: 0b5a6a1e-5a3f-4f4e-9a52-6d1d0cf1d1a3
//!   conditions:
//!     - type: Available
//!       status: "False"
//!       reason: Progressing
//!       message: "Waiting for Network/n1 to be ready"
//!     - type: Progressing
//!       status: "True"
//!       reason: Progressing
//!       message: "Waiting for Network/n1 to be ready"
//! ```

// ============================================================================
// Condition Types
// ============================================================================

/// The OpenStack resource exists and is ready.
pub const CONDITION_TYPE_AVAILABLE: &str = "Available";

/// More reconciles are expected.
pub const CONDITION_TYPE_PROGRESSING: &str = "Progressing";

// ============================================================================
// Condition Status Values
// ============================================================================

pub const CONDITION_STATUS_TRUE: &str = "True";
pub const CONDITION_STATUS_FALSE: &str = "False";

// ============================================================================
// Reasons
// ============================================================================

/// Reconciliation completed and the resource is up to date.
pub const REASON_SUCCESS: &str = "Success";

/// Reconciliation is waiting on a dependency, a finalizer, or OpenStack.
pub const REASON_PROGRESSING: &str = "Progressing";

/// Reconciliation failed with an error that will be retried.
pub const REASON_TRANSIENT_ERROR: &str = "TransientError";

/// The object's configuration can never succeed without a spec change.
///
/// **Examples:**
/// - neither `spec.resource` nor `spec.import` is set
/// - an adoption lookup matched more than one OpenStack resource
/// - OpenStack rejected a create with a conflict
pub const REASON_INVALID_CONFIGURATION: &str = "InvalidConfiguration";

/// The OpenStack resource is in a state the controller cannot recover from.
///
/// **Examples:**
/// - the resource recorded in `status.id` was deleted out of band
/// - a Server entered `ERROR`
/// - an Image import was `killed`
pub const REASON_UNRECOVERABLE_ERROR: &str = "UnrecoverableError";

/// Keystone rejected the credentials of a `Cloud`.
pub const REASON_BAD_CREDENTIALS: &str = "BadCredentials";

// ============================================================================
// Messages
// ============================================================================

/// Progressing message once reconciliation has nothing left to do.
pub const MESSAGE_UP_TO_DATE: &str = "OpenStack resource is up to date";

/// Available message when the readiness predicate holds.
pub const MESSAGE_AVAILABLE: &str = "OpenStack resource is available";

/// Whether `reason` marks a terminal condition.
#[must_use]
pub fn is_terminal_reason(reason: &str) -> bool {
    matches!(
        reason,
        REASON_INVALID_CONFIGURATION | REASON_UNRECOVERABLE_ERROR | REASON_BAD_CREDENTIALS
    )
}

#[cfg(test)]
#[path = "status_reasons_tests.rs"]
mod status_reasons_tests;
