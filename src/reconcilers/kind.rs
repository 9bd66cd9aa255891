// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Traits shared by every managed kind.
//!
//! - [`OrcResource`] - any object carrying `Available`/`Progressing` conditions,
//!   including [`Cloud`]
//! - [`OrcObject`] - the common `spec`/`status` envelope of OpenStack-backed kinds
//! - [`Reconcilable`] - how one kind resolves its siblings and builds its
//!   [`Actuator`]
//!
//! [`Dependencies`] collects sibling lookups for one reconcile. A missing
//! sibling or one that is not yet available becomes a [`WaitEvent`] instead of
//! an error.

use crate::constants::{KIND_CLOUD, KIND_SECRET};
use crate::context::Context;
use crate::crd::{
    Cloud, Condition, FloatingIP, Flavor, Image, KeyPair, ManagementPolicy, Network, OnDelete,
    Port, Router, SecurityGroup, SecurityGroupRule, Server, Subnet,
};
use crate::errors::OrcError;
use crate::openstack::CloudClients;
use crate::reconcilers::actuator::{Actuator, ResourceIdentity};
use crate::reconcilers::cloud::resolve_cloud_clients;
use crate::reconcilers::conditions::is_available;
use crate::reconcilers::wait::{SiblingPhase, WaitEvent};
use async_trait::async_trait;
use kube::core::NamespaceResourceScope;
use kube::{Api, Resource};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;
use std::sync::Arc;

/// An object whose status carries ORC conditions.
pub trait OrcResource:
    Resource<DynamicType = (), Scope = NamespaceResourceScope>
    + Clone
    + Debug
    + DeserializeOwned
    + Serialize
    + Send
    + Sync
    + 'static
{
    /// The kind (e.g., `Network`, `FloatingIP`)
    const KIND: &'static str;

    fn conditions(&self) -> &[Condition];

    /// Lowercase kind used in finalizers, field owners and dependency labels.
    #[must_use]
    fn label_kind() -> String {
        Self::KIND.to_ascii_lowercase()
    }
}

/// The `spec`/`status` envelope common to every OpenStack-backed kind.
pub trait OrcObject: OrcResource {
    /// Name of the `Cloud` in the same namespace.
    fn cloud(&self) -> &str;

    fn management_policy(&self) -> ManagementPolicy;

    fn on_delete(&self) -> OnDelete;

    fn has_resource(&self) -> bool;

    fn has_import(&self) -> bool;

    fn import_id(&self) -> Option<&str>;

    fn has_import_filter(&self) -> bool;

    /// `status.id`, once recorded.
    fn status_id(&self) -> Option<&str>;

    fn identity(&self) -> ResourceIdentity {
        ResourceIdentity {
            policy: self.management_policy(),
            on_delete: self.on_delete(),
            status_id: self.status_id().map(str::to_string),
            import_id: self.import_id().map(str::to_string),
        }
    }

    /// Cross-field rules the CRD schema cannot express.
    ///
    /// # Errors
    ///
    /// Returns a terminal `InvalidConfiguration` error describing the first
    /// violated rule.
    fn validate(&self) -> Result<(), OrcError> {
        if !self.has_resource() && !self.has_import() {
            return Err(OrcError::invalid_configuration(
                "one of spec.resource or spec.import must be set",
            ));
        }
        if self.has_import() && self.import_id().is_none() && !self.has_import_filter() {
            return Err(OrcError::invalid_configuration(
                "spec.import must set either id or filter",
            ));
        }
        match self.management_policy() {
            ManagementPolicy::Unmanaged if !self.has_import() => Err(
                OrcError::invalid_configuration("spec.import is required for unmanaged resources"),
            ),
            ManagementPolicy::Managed if !self.has_resource() => Err(
                OrcError::invalid_configuration("spec.resource is required for managed resources"),
            ),
            _ => Ok(()),
        }
    }
}

/// How one kind is wired into the generic runner.
#[async_trait]
pub trait Reconcilable: OrcObject {
    /// Sibling OpenStack IDs the actuator needs.
    type Deps: Send + Sync;

    type Actuator: Actuator;

    /// `(label kind, name)` of siblings referenced by `spec`, the Cloud excluded.
    fn dependency_refs(&self) -> Vec<(String, String)> {
        Vec::new()
    }

    /// Look up every sibling. Unresolved siblings are recorded in `deps` as waits.
    ///
    /// # Errors
    ///
    /// Returns Kubernetes API errors.
    async fn resolve_dependencies(&self, deps: &mut Dependencies<'_>)
        -> Result<Self::Deps, OrcError>;

    /// # Errors
    ///
    /// Returns an error if the cloud lacks the kind's OpenStack service.
    fn actuator(
        obj: Arc<Self>,
        clients: Arc<CloudClients>,
        deps: Self::Deps,
    ) -> Result<Self::Actuator, OrcError>;
}

/// Sibling lookups for one reconcile, scoped to the object's namespace.
pub struct Dependencies<'a> {
    ctx: &'a Context,
    namespace: &'a str,
    waits: Vec<WaitEvent>,
}

impl<'a> Dependencies<'a> {
    #[must_use]
    pub fn new(ctx: &'a Context, namespace: &'a str) -> Self {
        Self {
            ctx,
            namespace,
            waits: Vec::new(),
        }
    }

    /// Authenticated clients of the named Cloud, or `None` with a wait recorded.
    ///
    /// # Errors
    ///
    /// Returns Kubernetes API errors and transient OpenStack errors.
    pub async fn cloud(&mut self, name: &str) -> Result<Option<Arc<CloudClients>>, OrcError> {
        match resolve_cloud_clients(self.ctx, self.namespace, name).await? {
            Ok(clients) => Ok(Some(clients)),
            Err(wait) => {
                self.waits.push(wait);
                Ok(None)
            }
        }
    }

    /// `status.id` of the named sibling, or `None` with a wait recorded.
    ///
    /// # Errors
    ///
    /// Returns Kubernetes API errors.
    pub async fn id_of<D: OrcObject>(&mut self, name: &str) -> Result<Option<String>, OrcError> {
        let api: Api<D> = Api::namespaced(self.ctx.client.clone(), self.namespace);
        let sibling = api.get_opt(name).await?;
        match sibling_id(name, sibling.as_ref()) {
            Ok(id) => Ok(Some(id)),
            Err(wait) => {
                self.waits.push(wait);
                Ok(None)
            }
        }
    }

    /// IDs of every named sibling, in order. `None` if any is unresolved.
    ///
    /// # Errors
    ///
    /// Returns Kubernetes API errors.
    pub async fn ids_of<D: OrcObject>(
        &mut self,
        names: &[String],
    ) -> Result<Option<Vec<String>>, OrcError> {
        let mut ids = Vec::with_capacity(names.len());
        let mut complete = true;
        for name in names {
            match self.id_of::<D>(name).await? {
                Some(id) => ids.push(id),
                None => complete = false,
            }
        }
        Ok(complete.then_some(ids))
    }

    #[must_use]
    pub fn waits(&self) -> &[WaitEvent] {
        &self.waits
    }

    #[must_use]
    pub fn into_waits(self) -> Vec<WaitEvent> {
        self.waits
    }
}

/// The sibling's `status.id` if it is usable, otherwise what to wait for.
///
/// # Errors
///
/// Returns the wait event when the sibling is missing or not yet available.
pub fn sibling_id<D: OrcObject>(name: &str, sibling: Option<&D>) -> Result<String, WaitEvent> {
    let Some(sibling) = sibling else {
        return Err(WaitEvent::sibling(D::KIND, name, SiblingPhase::Exist));
    };
    match sibling.status_id() {
        Some(id) if is_available(sibling.conditions()) => Ok(id.to_string()),
        _ => Err(WaitEvent::sibling(D::KIND, name, SiblingPhase::Ready)),
    }
}

impl OrcResource for Cloud {
    const KIND: &'static str = KIND_CLOUD;

    fn conditions(&self) -> &[Condition] {
        self.status.as_ref().map_or(&[], |s| s.conditions.as_slice())
    }
}

/// Label kind of the core `Secret` a Cloud depends on.
#[must_use]
pub fn secret_label_kind() -> String {
    KIND_SECRET.to_ascii_lowercase()
}

/// Implement [`OrcResource`] and [`OrcObject`] for kinds sharing the common envelope.
macro_rules! impl_orc_object {
    ($($ty:ty => $kind:expr),* $(,)?) => {
        $(
            impl OrcResource for $ty {
                const KIND: &'static str = $kind;

                fn conditions(&self) -> &[Condition] {
                    self.status.as_ref().map_or(&[], |s| s.conditions.as_slice())
                }
            }

            impl OrcObject for $ty {
                fn cloud(&self) -> &str {
                    &self.spec.cloud
                }

                fn management_policy(&self) -> ManagementPolicy {
                    self.spec.management_policy
                }

                fn on_delete(&self) -> OnDelete {
                    self.spec
                        .managed_options
                        .as_ref()
                        .map(|o| o.on_delete)
                        .unwrap_or_default()
                }

                fn has_resource(&self) -> bool {
                    self.spec.resource.is_some()
                }

                fn has_import(&self) -> bool {
                    self.spec.import.is_some()
                }

                fn import_id(&self) -> Option<&str> {
                    self.spec.import.as_ref().and_then(|i| i.id.as_deref())
                }

                fn has_import_filter(&self) -> bool {
                    self.spec.import.as_ref().is_some_and(|i| i.filter.is_some())
                }

                fn status_id(&self) -> Option<&str> {
                    self.status.as_ref().and_then(|s| s.id.as_deref())
                }
            }
        )*
    };
}

impl_orc_object! {
    Network => crate::constants::KIND_NETWORK,
    Subnet => crate::constants::KIND_SUBNET,
    Port => crate::constants::KIND_PORT,
    Router => crate::constants::KIND_ROUTER,
    FloatingIP => crate::constants::KIND_FLOATING_IP,
    SecurityGroup => crate::constants::KIND_SECURITY_GROUP,
    SecurityGroupRule => crate::constants::KIND_SECURITY_GROUP_RULE,
    Flavor => crate::constants::KIND_FLAVOR,
    Image => crate::constants::KIND_IMAGE,
    KeyPair => crate::constants::KIND_KEY_PAIR,
    Server => crate::constants::KIND_SERVER,
}

#[cfg(test)]
#[path = "kind_tests.rs"]
mod kind_tests;
