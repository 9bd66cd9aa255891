// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Per-kind capability set consumed by the reconciliation engine.
//!
//! An [`Actuator`] binds one managed object to one OpenStack service. The engine
//! drives it through lookups, create, updates and delete without knowing the
//! kind. A [`ResourceStore`] gives the engine the few object-store queries it
//! needs about other objects of the same kind.

use crate::crd::{ManagementPolicy, OnDelete};
use crate::errors::OrcError;
use crate::reconcilers::wait::{OpenStackPhase, WaitEvent};
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::collections::HashSet;
use std::time::Duration;

/// Result of a lookup that may not apply to the object.
#[derive(Clone, Debug, PartialEq)]
pub enum Lookup<R> {
    /// The object carries no input for this strategy.
    Skipped,
    Found(R),
    /// The strategy applies but nothing matched.
    Absent,
}

/// Policy and identifiers read from the managed object.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResourceIdentity {
    pub policy: ManagementPolicy,
    pub on_delete: OnDelete,
    pub status_id: Option<String>,
    pub import_id: Option<String>,
}

impl ResourceIdentity {
    /// Deletion leaves the OpenStack resource in place.
    #[must_use]
    pub fn detaches_on_delete(&self) -> bool {
        self.policy == ManagementPolicy::Unmanaged || self.on_delete == OnDelete::Detach
    }
}

/// One in-place OpenStack update.
pub type UpdateStep<'a> = BoxFuture<'a, Result<(), OrcError>>;

/// Outcome of [`Actuator::create`].
pub struct Created<R> {
    pub waits: Vec<WaitEvent>,
    pub resource: Option<R>,
}

impl<R> Created<R> {
    pub fn done(resource: R) -> Self {
        Self {
            waits: Vec::new(),
            resource: Some(resource),
        }
    }

    #[must_use]
    pub fn waiting(waits: Vec<WaitEvent>) -> Self {
        Self {
            waits,
            resource: None,
        }
    }
}

/// Binding of one managed object to its OpenStack resource.
#[async_trait]
pub trait Actuator: Send + Sync {
    /// Observed OpenStack representation.
    type Resource: Clone + Send + Sync;

    fn identity(&self) -> ResourceIdentity;

    fn extract_id(&self, resource: &Self::Resource) -> String;

    /// Fetch by OpenStack ID. A missing resource is an `OpenStackError::NotFound`.
    async fn get_by_id(&self, id: &str) -> Result<Self::Resource, OrcError>;

    /// Resolve `spec.import.filter`. `Absent` means not present yet.
    async fn get_by_import_filter(&self) -> Result<Lookup<Self::Resource>, OrcError>;

    /// Adoption lookup: find an orphan matching what [`Actuator::create`] would
    /// create, ignoring IDs in `claimed`.
    ///
    /// More than one candidate is a terminal `InvalidConfiguration`.
    async fn get_by_spec(
        &self,
        claimed: &HashSet<String>,
    ) -> Result<Option<Self::Resource>, OrcError>;

    async fn create(&self) -> Result<Created<Self::Resource>, OrcError>;

    /// Steps needed to bring `observed` in line with `spec.resource`. Empty when up to date.
    fn planned_updates<'a>(&'a self, _observed: &'a Self::Resource) -> Vec<UpdateStep<'a>> {
        Vec::new()
    }

    async fn delete(&self, observed: &Self::Resource) -> Result<(), OrcError>;

    /// Kinds whose objects block deletion while they reference this one.
    fn referencing_kinds(&self) -> &'static [&'static str] {
        &[]
    }

    /// Kind-specific readiness predicate.
    fn is_ready(&self, resource: &Self::Resource) -> bool;

    /// Waits (or a terminal error) derived from the observed state.
    ///
    /// # Errors
    ///
    /// Kinds return a terminal error for states they cannot recover from.
    fn progress(&self, resource: &Self::Resource) -> Result<Vec<WaitEvent>, OrcError> {
        if self.is_ready(resource) {
            Ok(Vec::new())
        } else {
            Ok(vec![WaitEvent::openstack(
                OpenStackPhase::Ready,
                Duration::from_secs(crate::constants::EXTERNAL_UPDATE_POLL_SECS),
            )])
        }
    }

    /// OpenStack already started deleting the resource. No second delete is sent.
    fn deletion_in_progress(&self, _resource: &Self::Resource) -> bool {
        false
    }

    /// Mirror of the observed resource written to `status.resource`.
    ///
    /// # Errors
    ///
    /// Returns an error if the mirror cannot be serialized.
    fn resource_status(&self, resource: &Self::Resource) -> Result<serde_json::Value, OrcError>;
}

/// Object-store queries the engine needs beyond the object itself.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// OpenStack IDs recorded in `status.id` by other objects of the same kind
    /// in the same namespace.
    async fn claimed_ids(&self) -> Result<HashSet<String>, OrcError>;

    /// `(kind, name)` of objects of `kinds` carrying this object's dependency label.
    async fn find_referencing(
        &self,
        kinds: &[&'static str],
    ) -> Result<Vec<(String, String)>, OrcError>;

    /// Persist `status.id` under the `id` field owner.
    async fn record_id(&self, id: &str) -> Result<(), OrcError>;
}
