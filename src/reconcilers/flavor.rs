// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `Flavor` actuator (Nova flavors).
//!
//! Flavors are immutable. Nova offers no server-side filter on name or size,
//! so both adoption and import filters run over the full flavor list.

use crate::constants::KIND_SERVER;
use crate::crd::{Flavor, FlavorFilter, FlavorResourceSpec, FlavorResourceStatus};
use crate::errors::OrcError;
use crate::openstack::compute::{self as nova, ComputeClient};
use crate::openstack::CloudClients;
use crate::reconcilers::actuator::{Actuator, Created, Lookup, ResourceIdentity};
use crate::reconcilers::adapter::{
    import_lookup, mirror, missing_resource, resource_name, single_match, unclaimed,
};
use crate::reconcilers::kind::{Dependencies, OrcObject, Reconcilable};
use async_trait::async_trait;
use kube::ResourceExt;
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::sync::Arc;

const REFERENCING_KINDS: &[&str] = &[KIND_SERVER];

pub struct FlavorActuator {
    obj: Arc<Flavor>,
    client: ComputeClient,
}

impl FlavorActuator {
    #[must_use]
    pub fn new(obj: Arc<Flavor>, client: ComputeClient) -> Self {
        Self { obj, client }
    }

    fn name(&self) -> String {
        resource_name(
            &self.obj.name_any(),
            self.obj.spec.resource.as_ref().and_then(|r| r.name.as_ref()),
        )
    }
}

#[must_use]
pub fn create_attributes(name: &str, resource: &FlavorResourceSpec) -> Value {
    let mut attrs = Map::new();
    attrs.insert("name".into(), json!(name));
    attrs.insert("ram".into(), json!(resource.ram));
    attrs.insert("vcpus".into(), json!(resource.vcpus));
    attrs.insert("disk".into(), json!(resource.disk));
    if let Some(swap) = resource.swap {
        attrs.insert("swap".into(), json!(swap));
    }
    if let Some(ephemeral) = resource.ephemeral {
        attrs.insert("OS-FLV-EXT-DATA:ephemeral".into(), json!(ephemeral));
    }
    if let Some(rxtx_factor) = resource.rxtx_factor {
        attrs.insert("rxtx_factor".into(), json!(rxtx_factor));
    }
    if let Some(is_public) = resource.is_public {
        attrs.insert("os-flavor-access:is_public".into(), json!(is_public));
    }
    if let Some(description) = &resource.description {
        attrs.insert("description".into(), json!(description));
    }
    Value::Object(attrs)
}

/// Whether `flavor` has the name and size `resource` would create.
#[must_use]
pub fn matches_spec(name: &str, resource: &FlavorResourceSpec, flavor: &nova::Flavor) -> bool {
    flavor.name == name
        && flavor.ram == i64::from(resource.ram)
        && flavor.vcpus == i64::from(resource.vcpus)
        && flavor.disk == i64::from(resource.disk)
}

#[must_use]
pub fn matches_filter(filter: &FlavorFilter, flavor: &nova::Flavor) -> bool {
    filter.name.as_ref().is_none_or(|name| *name == flavor.name)
        && filter.ram.is_none_or(|ram| i64::from(ram) == flavor.ram)
        && filter.vcpus.is_none_or(|vcpus| i64::from(vcpus) == flavor.vcpus)
        && filter.disk.is_none_or(|disk| i64::from(disk) == flavor.disk)
}

fn narrow(value: i64) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

#[must_use]
pub fn flavor_status(flavor: &nova::Flavor) -> FlavorResourceStatus {
    FlavorResourceStatus {
        name: flavor.name.clone(),
        ram: narrow(flavor.ram),
        vcpus: narrow(flavor.vcpus),
        disk: narrow(flavor.disk),
        swap: narrow(flavor.swap),
        ephemeral: narrow(flavor.ephemeral),
        rxtx_factor: Some(flavor.rxtx_factor),
        is_public: flavor.is_public,
        description: flavor.description.clone(),
    }
}

#[async_trait]
impl Actuator for FlavorActuator {
    type Resource = nova::Flavor;

    fn identity(&self) -> ResourceIdentity {
        self.obj.identity()
    }

    fn extract_id(&self, resource: &nova::Flavor) -> String {
        resource.id.clone()
    }

    async fn get_by_id(&self, id: &str) -> Result<nova::Flavor, OrcError> {
        Ok(self.client.get_flavor(id).await?)
    }

    async fn get_by_import_filter(&self) -> Result<Lookup<nova::Flavor>, OrcError> {
        let Some(filter) = self.obj.spec.import.as_ref().and_then(|i| i.filter.as_ref()) else {
            return Ok(Lookup::Skipped);
        };
        let flavors = self.client.list_flavors().await?;
        import_lookup(
            flavors
                .into_iter()
                .filter(|f| matches_filter(filter, f))
                .collect(),
        )
    }

    async fn get_by_spec(
        &self,
        claimed: &HashSet<String>,
    ) -> Result<Option<nova::Flavor>, OrcError> {
        let Some(resource) = &self.obj.spec.resource else {
            return Ok(None);
        };
        let name = self.name();
        let flavors = self.client.list_flavors().await?;
        single_match(
            "flavor",
            unclaimed(flavors, claimed, |f| f.id.as_str())
                .into_iter()
                .filter(|f| matches_spec(&name, resource, f))
                .collect(),
        )
    }

    async fn create(&self) -> Result<Created<nova::Flavor>, OrcError> {
        let resource = self.obj.spec.resource.as_ref().ok_or_else(missing_resource)?;
        let flavor = self
            .client
            .create_flavor(create_attributes(&self.name(), resource))
            .await?;
        Ok(Created::done(flavor))
    }

    async fn delete(&self, observed: &nova::Flavor) -> Result<(), OrcError> {
        Ok(self.client.delete_flavor(&observed.id).await?)
    }

    fn referencing_kinds(&self) -> &'static [&'static str] {
        REFERENCING_KINDS
    }

    fn is_ready(&self, _resource: &nova::Flavor) -> bool {
        true
    }

    fn resource_status(&self, resource: &nova::Flavor) -> Result<Value, OrcError> {
        mirror(&flavor_status(resource))
    }
}

#[async_trait]
impl Reconcilable for Flavor {
    type Deps = ();
    type Actuator = FlavorActuator;

    async fn resolve_dependencies(&self, _deps: &mut Dependencies<'_>) -> Result<(), OrcError> {
        Ok(())
    }

    fn actuator(
        obj: Arc<Self>,
        clients: Arc<CloudClients>,
        _deps: (),
    ) -> Result<FlavorActuator, OrcError> {
        Ok(FlavorActuator::new(obj, clients.compute()?.clone()))
    }
}

#[cfg(test)]
#[path = "flavor_tests.rs"]
mod flavor_tests;
