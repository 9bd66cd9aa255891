// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `FloatingIP` actuator (Neutron floating IPs).
//!
//! The address is allocated from the external `Network` named by
//! `floatingNetworkRef` and optionally associated with a `Port`. Description,
//! tags and the port association are updated in place; dropping `portRef`
//! disassociates the address.

use crate::crd::{FloatingIP, FloatingIPResourceSpec, FloatingIPResourceStatus, Network, Port};
use crate::errors::OrcError;
use crate::openstack::client::{normalize_opt_timestamp, Query};
use crate::openstack::network::{self as neutron, collection, NetworkClient};
use crate::openstack::CloudClients;
use crate::reconcilers::actuator::{Actuator, Created, Lookup, ResourceIdentity, UpdateStep};
use crate::reconcilers::adapter::{
    import_lookup, mirror, missing_resource, required, single_match, step, unclaimed,
};
use crate::reconcilers::compare::{differs, list_content_equals};
use crate::reconcilers::kind::{Dependencies, OrcObject, OrcResource, Reconcilable};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::sync::Arc;

pub const STATUS_ACTIVE: &str = "ACTIVE";
pub const STATUS_DOWN: &str = "DOWN";

/// Resolved sibling IDs of a floating IP.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FloatingIPDeps {
    pub floating_network_id: Option<String>,
    pub port_id: Option<String>,
}

pub struct FloatingIPActuator {
    obj: Arc<FloatingIP>,
    client: NetworkClient,
    deps: FloatingIPDeps,
}

impl FloatingIPActuator {
    #[must_use]
    pub fn new(obj: Arc<FloatingIP>, client: NetworkClient, deps: FloatingIPDeps) -> Self {
        Self { obj, client, deps }
    }

    fn floating_network_id(&self, resource: &FloatingIPResourceSpec) -> Result<&str, OrcError> {
        required(
            self.deps.floating_network_id.as_ref(),
            Network::KIND,
            &resource.floating_network_ref,
        )
    }

    fn port_id(&self, resource: &FloatingIPResourceSpec) -> Result<Option<&str>, OrcError> {
        resource
            .port_ref
            .as_ref()
            .map(|port_ref| required(self.deps.port_id.as_ref(), Port::KIND, port_ref))
            .transpose()
    }
}

/// Create request attributes for `resource`.
#[must_use]
pub fn create_attributes(
    resource: &FloatingIPResourceSpec,
    floating_network_id: &str,
    port_id: Option<&str>,
) -> Value {
    let mut attrs = Map::new();
    attrs.insert("floating_network_id".into(), json!(floating_network_id));
    if let Some(port_id) = port_id {
        attrs.insert("port_id".into(), json!(port_id));
    }
    if let Some(address) = &resource.floating_ip_address {
        attrs.insert("floating_ip_address".into(), json!(address));
    }
    if let Some(address) = &resource.fixed_ip_address {
        attrs.insert("fixed_ip_address".into(), json!(address));
    }
    if let Some(description) = &resource.description {
        attrs.insert("description".into(), json!(description));
    }
    Value::Object(attrs)
}

/// Attributes that differ from `observed` and Neutron can change in place.
///
/// `port_id` is the resolved `portRef`; `None` means no association is wanted.
#[must_use]
pub fn update_attributes(
    resource: &FloatingIPResourceSpec,
    port_id: Option<&str>,
    observed: &neutron::FloatingIp,
) -> Option<Value> {
    let mut attrs = Map::new();
    if differs(resource.description.as_ref(), &observed.description) {
        attrs.insert("description".into(), json!(resource.description));
    }
    if port_id != observed.port_id.as_deref() {
        attrs.insert("port_id".into(), json!(port_id));
        if port_id.is_some() {
            if let Some(address) = &resource.fixed_ip_address {
                attrs.insert("fixed_ip_address".into(), json!(address));
            }
        }
    }
    (!attrs.is_empty()).then_some(Value::Object(attrs))
}

/// Mirror of an observed floating IP for `status.resource`.
#[must_use]
pub fn floating_ip_status(fip: &neutron::FloatingIp) -> FloatingIPResourceStatus {
    FloatingIPResourceStatus {
        description: fip.description.clone(),
        floating_network_id: fip.floating_network_id.clone(),
        floating_ip_address: fip.floating_ip_address.clone(),
        port_id: fip.port_id.clone(),
        fixed_ip_address: fip.fixed_ip_address.clone(),
        router_id: fip.router_id.clone(),
        project_id: fip.project_id.clone(),
        status: fip.status.clone(),
        tags: fip.tags.clone(),
        created_at: normalize_opt_timestamp(fip.created_at.as_deref()),
        updated_at: normalize_opt_timestamp(fip.updated_at.as_deref()),
    }
}

#[async_trait]
impl Actuator for FloatingIPActuator {
    type Resource = neutron::FloatingIp;

    fn identity(&self) -> ResourceIdentity {
        self.obj.identity()
    }

    fn extract_id(&self, resource: &neutron::FloatingIp) -> String {
        resource.id.clone()
    }

    async fn get_by_id(&self, id: &str) -> Result<neutron::FloatingIp, OrcError> {
        Ok(self.client.get(collection::FLOATING_IPS, id).await?)
    }

    async fn get_by_import_filter(&self) -> Result<Lookup<neutron::FloatingIp>, OrcError> {
        let Some(filter) = self.obj.spec.import.as_ref().and_then(|i| i.filter.as_ref()) else {
            return Ok(Lookup::Skipped);
        };
        let query = Query::new()
            .opt("floating_ip_address", filter.floating_ip_address.as_ref())
            .opt("description", filter.description.as_ref())
            .tags("tags", &filter.tags);
        import_lookup(self.client.list(collection::FLOATING_IPS, &query).await?)
    }

    async fn get_by_spec(
        &self,
        claimed: &HashSet<String>,
    ) -> Result<Option<neutron::FloatingIp>, OrcError> {
        let Some(resource) = &self.obj.spec.resource else {
            return Ok(None);
        };
        // Floating IPs have no name. Without an address or description any
        // address on the network would match, so nothing is adopted.
        if resource.floating_ip_address.is_none() && resource.description.is_none() {
            return Ok(None);
        }
        let query = Query::new()
            .push("floating_network_id", self.floating_network_id(resource)?)
            .opt("floating_ip_address", resource.floating_ip_address.as_ref())
            .opt("description", resource.description.as_ref());
        let candidates: Vec<neutron::FloatingIp> =
            self.client.list(collection::FLOATING_IPS, &query).await?;
        single_match("floating IP", unclaimed(candidates, claimed, |f| f.id.as_str()))
    }

    async fn create(&self) -> Result<Created<neutron::FloatingIp>, OrcError> {
        let resource = self.obj.spec.resource.as_ref().ok_or_else(missing_resource)?;
        let attrs = create_attributes(
            resource,
            self.floating_network_id(resource)?,
            self.port_id(resource)?,
        );
        let mut fip: neutron::FloatingIp = self.client.create(collection::FLOATING_IPS, attrs).await?;
        if !resource.tags.is_empty() {
            self.client
                .replace_tags(collection::FLOATING_IPS, &fip.id, &resource.tags)
                .await?;
            fip.tags.clone_from(&resource.tags);
        }
        Ok(Created::done(fip))
    }

    fn planned_updates<'a>(&'a self, observed: &'a neutron::FloatingIp) -> Vec<UpdateStep<'a>> {
        let Some(resource) = &self.obj.spec.resource else {
            return Vec::new();
        };
        // An unresolved port is reported by dependency resolution, not here.
        let Ok(port_id) = self.port_id(resource) else {
            return Vec::new();
        };
        let mut steps = Vec::new();
        if let Some(attrs) = update_attributes(resource, port_id, observed) {
            steps.push(step(async move {
                self.client
                    .update::<Value>(collection::FLOATING_IPS, &observed.id, attrs)
                    .await
                    .map(drop)
            }));
        }
        if !list_content_equals(&resource.tags, &observed.tags) {
            steps.push(step(self.client.replace_tags(
                collection::FLOATING_IPS,
                &observed.id,
                &resource.tags,
            )));
        }
        steps
    }

    async fn delete(&self, observed: &neutron::FloatingIp) -> Result<(), OrcError> {
        Ok(self.client.delete(collection::FLOATING_IPS, &observed.id).await?)
    }

    fn is_ready(&self, resource: &neutron::FloatingIp) -> bool {
        resource.status == STATUS_ACTIVE || resource.status == STATUS_DOWN
    }

    fn resource_status(&self, resource: &neutron::FloatingIp) -> Result<Value, OrcError> {
        mirror(&floating_ip_status(resource))
    }
}

#[async_trait]
impl Reconcilable for FloatingIP {
    type Deps = FloatingIPDeps;
    type Actuator = FloatingIPActuator;

    fn dependency_refs(&self) -> Vec<(String, String)> {
        let Some(resource) = &self.spec.resource else {
            return Vec::new();
        };
        std::iter::once((Network::label_kind(), resource.floating_network_ref.clone()))
            .chain(
                resource
                    .port_ref
                    .iter()
                    .map(|name| (Port::label_kind(), name.clone())),
            )
            .collect()
    }

    async fn resolve_dependencies(
        &self,
        deps: &mut Dependencies<'_>,
    ) -> Result<FloatingIPDeps, OrcError> {
        let mut resolved = FloatingIPDeps::default();
        if let Some(resource) = &self.spec.resource {
            resolved.floating_network_id = deps
                .id_of::<Network>(&resource.floating_network_ref)
                .await?;
            if let Some(port_ref) = &resource.port_ref {
                resolved.port_id = deps.id_of::<Port>(port_ref).await?;
            }
        }
        Ok(resolved)
    }

    fn actuator(
        obj: Arc<Self>,
        clients: Arc<CloudClients>,
        deps: FloatingIPDeps,
    ) -> Result<FloatingIPActuator, OrcError> {
        Ok(FloatingIPActuator::new(obj, clients.network()?.clone(), deps))
    }
}

#[cfg(test)]
#[path = "floatingip_tests.rs"]
mod floatingip_tests;
