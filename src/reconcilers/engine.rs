// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! The generic reconciliation state machine.
//!
//! These functions drive any [`Actuator`] and never touch the object store
//! directly; the few queries they need go through a [`ResourceStore`]. The
//! Kubernetes-facing wrapper lives in [`crate::reconcilers::runner`].
//!
//! # Get-or-create order
//!
//! 1. `status.id` set: fetch it. NotFound is terminal.
//! 2. `spec.import.id` set: fetch it. NotFound is terminal.
//! 3. `spec.import.filter` set: look it up. Nothing yet means poll.
//! 4. Unmanaged without import: terminal.
//! 5. Adoption lookup, then create.
//!
//! # Deletion order
//!
//! 1. Fetch by `status.id`, tolerating NotFound.
//! 2. Foreign finalizers block.
//! 3. Unmanaged or detach: release immediately.
//! 4. No `status.id`: adoption lookup once.
//! 5. Nothing observed: release.
//! 6. Referencing objects block, polling every 10s.
//! 7. Delete, then confirm after 1s.

use crate::constants::{
    DELETE_CONFIRM_POLL_SECS, EXTERNAL_UPDATE_POLL_SECS, REFERENCING_KINDS_POLL_SECS,
};
use crate::crd::ManagementPolicy;
use crate::errors::OrcError;
use crate::reconcilers::actuator::{Actuator, Lookup, ResourceIdentity, ResourceStore};
use crate::reconcilers::wait::{OpenStackPhase, SiblingPhase, WaitEvent};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Result of a normal (non-deleting) reconcile.
pub struct Outcome<R> {
    pub observed: Option<R>,
    pub waits: Vec<WaitEvent>,
    pub error: Option<OrcError>,
    /// This reconcile issued a create.
    pub created: bool,
    /// This reconcile ran at least one update step.
    pub updated: bool,
}

impl<R> Outcome<R> {
    fn failed(error: OrcError) -> Self {
        Self {
            observed: None,
            waits: Vec::new(),
            error: Some(error),
            created: false,
            updated: false,
        }
    }
}

/// What [`get_or_create`] resolved.
struct Resolved<R> {
    observed: Option<R>,
    waits: Vec<WaitEvent>,
    created: bool,
}

impl<R> Resolved<R> {
    fn found(resource: R) -> Self {
        Self {
            observed: Some(resource),
            waits: Vec::new(),
            created: false,
        }
    }
}

/// Result of the OpenStack side of a deletion.
#[derive(Debug, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The OpenStack resource is gone or detached. Our finalizer can go.
    RemoveFinalizer,
    /// Deletion is blocked or in flight. `available` is the readiness of the
    /// OpenStack resource as observed during this pass.
    Waiting { waits: Vec<WaitEvent>, available: bool },
}

async fn get_or_create<A, S>(
    actuator: &A,
    store: &S,
    identity: &ResourceIdentity,
) -> Result<Resolved<A::Resource>, OrcError>
where
    A: Actuator + ?Sized,
    S: ResourceStore + ?Sized,
{
    if let Some(id) = &identity.status_id {
        return match actuator.get_by_id(id).await {
            Ok(resource) => Ok(Resolved::found(resource)),
            Err(e) if e.is_not_found() => Err(OrcError::unrecoverable(
                "resource has been deleted from OpenStack",
            )),
            Err(e) => Err(e),
        };
    }

    if let Some(id) = &identity.import_id {
        return match actuator.get_by_id(id).await {
            Ok(resource) => Ok(Resolved::found(resource)),
            Err(e) if e.is_not_found() => Err(OrcError::unrecoverable(
                "referenced resource does not exist in OpenStack",
            )),
            Err(e) => Err(e),
        };
    }

    match actuator.get_by_import_filter().await? {
        Lookup::Found(resource) => return Ok(Resolved::found(resource)),
        Lookup::Absent => {
            return Ok(Resolved {
                observed: None,
                waits: vec![WaitEvent::openstack(
                    OpenStackPhase::Create,
                    Duration::from_secs(EXTERNAL_UPDATE_POLL_SECS),
                )],
                created: false,
            })
        }
        Lookup::Skipped => {}
    }

    if identity.policy == ManagementPolicy::Unmanaged {
        return Err(OrcError::invalid_configuration(
            "not creating unmanaged resource",
        ));
    }

    let claimed = store.claimed_ids().await?;
    if let Some(resource) = actuator.get_by_spec(&claimed).await? {
        info!(
            openstack_id = %actuator.extract_id(&resource),
            "Adopted existing OpenStack resource"
        );
        return Ok(Resolved::found(resource));
    }

    let created = actuator.create().await.map_err(classify_create_error)?;
    if let Some(resource) = &created.resource {
        info!(
            openstack_id = %actuator.extract_id(resource),
            "Created OpenStack resource"
        );
    }
    Ok(Resolved {
        observed: created.resource,
        waits: created.waits,
        created: true,
    })
}

/// Create failures that will not succeed on retry need a spec change.
fn classify_create_error(err: OrcError) -> OrcError {
    match err {
        OrcError::OpenStack(ref e) if !e.is_retryable() => OrcError::invalid_configuration(
            format!("invalid configuration creating resource: {err}"),
        ),
        other => other,
    }
}

/// Resolve, create and update the OpenStack resource of a live object.
pub async fn reconcile_normal<A, S>(actuator: &A, store: &S) -> Outcome<A::Resource>
where
    A: Actuator + ?Sized,
    S: ResourceStore + ?Sized,
{
    let identity = actuator.identity();

    let Resolved {
        observed,
        mut waits,
        created,
    } = match get_or_create(actuator, store, &identity).await {
        Ok(resolved) => resolved,
        Err(e) => return Outcome::failed(e),
    };

    let Some(mut observed) = observed else {
        if waits.is_empty() {
            return Outcome::failed(OrcError::from(anyhow::anyhow!(
                "OpenStack resource was neither resolved nor pending"
            )));
        }
        return Outcome {
            observed: None,
            waits,
            error: None,
            created,
            updated: false,
        };
    };

    let id = actuator.extract_id(&observed);
    if identity.status_id.is_none() {
        if let Err(e) = store.record_id(&id).await {
            return Outcome {
                observed: Some(observed),
                waits,
                error: Some(e),
                created,
                updated: false,
            };
        }
        debug!(openstack_id = %id, "Recorded status.id");
    }

    let mut errors = Vec::new();
    let mut updated = false;

    if identity.policy == ManagementPolicy::Managed {
        let steps = actuator.planned_updates(&observed);
        if !steps.is_empty() {
            updated = true;
            info!(openstack_id = %id, steps = steps.len(), "Updating OpenStack resource");
            for step in steps {
                if let Err(e) = step.await {
                    warn!(openstack_id = %id, error = %e, "Update step failed");
                    errors.push(e);
                }
            }
            match actuator.get_by_id(&id).await {
                Ok(refreshed) => observed = refreshed,
                Err(e) => errors.push(e),
            }
        }
    }

    match actuator.progress(&observed) {
        Ok(progress) => waits.extend(progress),
        Err(e) => errors.push(e),
    }

    Outcome {
        observed: Some(observed),
        waits,
        error: OrcError::join(errors),
        created,
        updated,
    }
}

/// Drive deletion of the OpenStack resource.
///
/// `foreign_finalizers` are finalizers other than ours still on the object.
/// `search_orphans` allows the adoption lookup when `status.id` was never
/// recorded; callers disable it when the object's dependencies cannot be resolved.
///
/// # Errors
///
/// Returns any OpenStack error other than NotFound.
pub async fn delete_os_resource<A, S>(
    actuator: &A,
    store: &S,
    foreign_finalizers: &[String],
    search_orphans: bool,
) -> Result<DeleteOutcome, OrcError>
where
    A: Actuator + ?Sized,
    S: ResourceStore + ?Sized,
{
    let identity = actuator.identity();

    let mut observed = match &identity.status_id {
        Some(id) => match actuator.get_by_id(id).await {
            Ok(resource) => Some(resource),
            Err(e) if e.is_not_found() => None,
            Err(e) => return Err(e),
        },
        None => None,
    };

    if !foreign_finalizers.is_empty() {
        return Ok(DeleteOutcome::Waiting {
            waits: foreign_finalizers
                .iter()
                .map(|f| WaitEvent::finalizer(f.clone()))
                .collect(),
            available: observed.as_ref().is_some_and(|r| actuator.is_ready(r)),
        });
    }

    if identity.detaches_on_delete() {
        debug!("Detaching from OpenStack resource");
        return Ok(DeleteOutcome::RemoveFinalizer);
    }

    if identity.status_id.is_none() && search_orphans {
        let claimed = store.claimed_ids().await?;
        observed = actuator.get_by_spec(&claimed).await?;
    }

    let Some(observed) = observed else {
        return Ok(DeleteOutcome::RemoveFinalizer);
    };

    let referencing_kinds = actuator.referencing_kinds();
    if !referencing_kinds.is_empty() {
        let referencing = store.find_referencing(referencing_kinds).await?;
        if !referencing.is_empty() {
            info!(
                blocking = ?referencing,
                "Deletion blocked by referencing objects"
            );
            return Ok(DeleteOutcome::Waiting {
                waits: referencing
                    .into_iter()
                    .map(|(kind, name)| WaitEvent::Sibling {
                        kind,
                        name,
                        phase: SiblingPhase::Deleted,
                        poll_after: Some(Duration::from_secs(REFERENCING_KINDS_POLL_SECS)),
                    })
                    .collect(),
                available: actuator.is_ready(&observed),
            });
        }
    }

    // Once deletion is underway the resource no longer counts as available.
    let confirm = DeleteOutcome::Waiting {
        waits: vec![WaitEvent::openstack(
            OpenStackPhase::Deleted,
            Duration::from_secs(DELETE_CONFIRM_POLL_SECS),
        )],
        available: false,
    };

    let id = actuator.extract_id(&observed);
    if actuator.deletion_in_progress(&observed) {
        debug!(openstack_id = %id, "OpenStack deletion already in progress");
        return Ok(confirm);
    }

    match actuator.delete(&observed).await {
        Ok(()) => {
            info!(openstack_id = %id, "Requested deletion of OpenStack resource");
            Ok(confirm)
        }
        Err(e) if e.is_not_found() => Ok(DeleteOutcome::RemoveFinalizer),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod engine_tests;
