// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Reasons a reconcile is not complete.
//!
//! Wait events are not errors. They are returned alongside the observed
//! resource and feed both the `Progressing` message and the requeue interval.

use std::fmt;
use std::time::Duration;

/// Phase of a sibling Kubernetes object being waited on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SiblingPhase {
    Exist,
    Ready,
    Deleted,
}

/// Phase of the OpenStack resource being waited on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpenStackPhase {
    Create,
    Ready,
    Deleted,
}

/// Why the current reconcile is incomplete.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WaitEvent {
    /// Another object in the same namespace must exist, become ready or go away.
    Sibling {
        kind: String,
        name: String,
        phase: SiblingPhase,
        /// `None` when the watch on `kind` is enough to wake us up.
        poll_after: Option<Duration>,
    },
    /// A foreign finalizer must be removed before deletion proceeds.
    Finalizer { name: String },
    /// OpenStack must finish an operation. There is no watch, so we poll.
    OpenStack {
        phase: OpenStackPhase,
        poll_after: Duration,
    },
}

impl WaitEvent {
    pub fn sibling(kind: impl Into<String>, name: impl Into<String>, phase: SiblingPhase) -> Self {
        Self::Sibling {
            kind: kind.into(),
            name: name.into(),
            phase,
            poll_after: None,
        }
    }

    pub fn finalizer(name: impl Into<String>) -> Self {
        Self::Finalizer { name: name.into() }
    }

    #[must_use]
    pub fn openstack(phase: OpenStackPhase, poll_after: Duration) -> Self {
        Self::OpenStack { phase, poll_after }
    }

    /// Polling interval; zero for purely watch-driven waits.
    #[must_use]
    pub fn requeue(&self) -> Duration {
        match self {
            Self::Sibling { poll_after, .. } => poll_after.unwrap_or(Duration::ZERO),
            Self::Finalizer { .. } => Duration::ZERO,
            Self::OpenStack { poll_after, .. } => *poll_after,
        }
    }
}

impl fmt::Display for WaitEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sibling {
                kind, name, phase, ..
            } => {
                let phase = match phase {
                    SiblingPhase::Exist => "created",
                    SiblingPhase::Ready => "ready",
                    SiblingPhase::Deleted => "deleted",
                };
                write!(f, "Waiting for {kind}/{name} to be {phase}")
            }
            Self::Finalizer { name } => write!(f, "Waiting for finalizer {name} to be removed"),
            Self::OpenStack { phase, .. } => {
                let phase = match phase {
                    OpenStackPhase::Create => "be created externally",
                    OpenStackPhase::Ready => "be ready",
                    OpenStackPhase::Deleted => "be deleted",
                };
                write!(f, "Waiting for OpenStack resource to {phase}")
            }
        }
    }
}

/// Largest requeue interval over `waits`. Zero means watch-driven only.
#[must_use]
pub fn max_requeue(waits: &[WaitEvent]) -> Duration {
    waits
        .iter()
        .map(WaitEvent::requeue)
        .max()
        .unwrap_or(Duration::ZERO)
}

/// Human-readable summary of `waits`, in order.
#[must_use]
pub fn wait_message(waits: &[WaitEvent]) -> String {
    waits
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
#[path = "wait_tests.rs"]
mod wait_tests;
