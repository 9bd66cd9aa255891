// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Kubernetes Event recording.
//!
//! Events are emitted when an object's `Available` or `Progressing` condition
//! changes. Publishing is fire-and-forget: a failed event is logged and never
//! fails the reconcile.

use crate::crd::Condition;
use crate::reconcilers::conditions::find_condition;
use crate::status_reasons::{
    is_terminal_reason, CONDITION_STATUS_TRUE, CONDITION_TYPE_AVAILABLE,
    CONDITION_TYPE_PROGRESSING, REASON_TRANSIENT_ERROR,
};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::ObjectReference;
use kube::runtime::events::{Event, EventType, Recorder, Reporter};
use kube::Client;
use tracing::warn;

/// Action recorded on every event emitted by a reconcile.
pub const ACTION_RECONCILE: &str = "Reconcile";

/// Publishes Kubernetes Events for an object.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(
        &self,
        resource_ref: &ObjectReference,
        type_: EventType,
        reason: &str,
        action: &str,
        note: Option<String>,
    );
}

/// [`EventPublisher`] backed by `kube::runtime::events::Recorder`.
pub struct KubeEventPublisher {
    recorder: Recorder,
}

impl KubeEventPublisher {
    /// `controller_name` is reported as the event's reporting component.
    #[must_use]
    pub fn new(client: Client, controller_name: &str) -> Self {
        let reporter = Reporter {
            controller: controller_name.to_string(),
            instance: std::env::var("POD_NAME").ok(),
        };
        Self {
            recorder: Recorder::new(client, reporter),
        }
    }
}

#[async_trait]
impl EventPublisher for KubeEventPublisher {
    async fn publish(
        &self,
        resource_ref: &ObjectReference,
        type_: EventType,
        reason: &str,
        action: &str,
        note: Option<String>,
    ) {
        let event = Event {
            type_,
            reason: reason.to_string(),
            note,
            action: action.to_string(),
            secondary: None,
        };
        if let Err(e) = self.recorder.publish(&event, resource_ref).await {
            warn!(reason, action, error = %e, "Failed to publish Kubernetes event");
        }
    }
}

/// An event to emit for a condition change.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionEvent {
    pub type_: EventType,
    pub reason: String,
    pub note: Option<String>,
}

/// Warning for transient and terminal failures, Normal otherwise.
#[must_use]
pub fn event_type_for_reason(reason: &str) -> EventType {
    if reason == REASON_TRANSIENT_ERROR || is_terminal_reason(reason) {
        EventType::Warning
    } else {
        EventType::Normal
    }
}

/// Events for conditions in `new` whose status, reason or message differ from `old`.
///
/// `Available` flipping to True reports its own reason. Otherwise the
/// `Progressing` condition carries the reason, since it explains why the
/// object is not yet available.
#[must_use]
pub fn condition_events(old: &[Condition], new: &[Condition]) -> Vec<ConditionEvent> {
    let changed = |type_: &str| {
        let before = find_condition(old, type_);
        let after = find_condition(new, type_)?;
        let same = before.is_some_and(|b| {
            b.status == after.status && b.reason == after.reason && b.message == after.message
        });
        (!same).then_some(after)
    };

    let mut events = Vec::new();

    if let Some(available) = changed(CONDITION_TYPE_AVAILABLE) {
        if available.status == CONDITION_STATUS_TRUE {
            let reason = available.reason.clone().unwrap_or_default();
            events.push(ConditionEvent {
                type_: event_type_for_reason(&reason),
                reason,
                note: available.message.clone(),
            });
        }
    }

    if let Some(progressing) = changed(CONDITION_TYPE_PROGRESSING) {
        let reason = progressing.reason.clone().unwrap_or_default();
        if !reason.is_empty() {
            events.push(ConditionEvent {
                type_: event_type_for_reason(&reason),
                reason,
                note: progressing.message.clone(),
            });
        }
    }

    events
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod events_tests;
