// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `Network` actuator (Neutron networks).
//!
//! Adoption matches on name, then in code on MTU, DNS domain, port security,
//! external and shared. Name, description, admin state, port security and
//! tags are updated in place. Deletion is blocked while a `Subnet`, `Port`,
//! `FloatingIP` or `Router` still references the network.

use crate::constants::{KIND_FLOATING_IP, KIND_PORT, KIND_ROUTER, KIND_SUBNET};
use crate::crd::{Network, NetworkResourceSpec, NetworkResourceStatus};
use crate::errors::OrcError;
use crate::openstack::client::{normalize_opt_timestamp, Query};
use crate::openstack::network::{self as neutron, collection, NetworkClient};
use crate::openstack::CloudClients;
use crate::reconcilers::actuator::{Actuator, Created, Lookup, ResourceIdentity, UpdateStep};
use crate::reconcilers::adapter::{
    import_lookup, mirror, missing_resource, resource_name, single_match, step, unclaimed,
};
use crate::reconcilers::compare::{differs, list_content_equals};
use crate::reconcilers::kind::{Dependencies, OrcObject, Reconcilable};
use async_trait::async_trait;
use kube::ResourceExt;
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::sync::Arc;

/// Neutron network status once usable.
pub const STATUS_ACTIVE: &str = "ACTIVE";

const REFERENCING_KINDS: &[&str] = &[KIND_SUBNET, KIND_PORT, KIND_FLOATING_IP, KIND_ROUTER];

pub struct NetworkActuator {
    obj: Arc<Network>,
    client: NetworkClient,
}

impl NetworkActuator {
    #[must_use]
    pub fn new(obj: Arc<Network>, client: NetworkClient) -> Self {
        Self { obj, client }
    }

    fn name(&self) -> String {
        resource_name(
            &self.obj.name_any(),
            self.obj.spec.resource.as_ref().and_then(|r| r.name.as_ref()),
        )
    }
}

/// Create request attributes for `resource`.
#[must_use]
pub fn create_attributes(name: &str, resource: &NetworkResourceSpec) -> Value {
    let mut attrs = Map::new();
    attrs.insert("name".into(), json!(name));
    if let Some(description) = &resource.description {
        attrs.insert("description".into(), json!(description));
    }
    if let Some(admin_state_up) = resource.admin_state_up {
        attrs.insert("admin_state_up".into(), json!(admin_state_up));
    }
    if let Some(shared) = resource.shared {
        attrs.insert("shared".into(), json!(shared));
    }
    if let Some(external) = resource.external {
        attrs.insert("router:external".into(), json!(external));
    }
    if let Some(mtu) = resource.mtu {
        attrs.insert("mtu".into(), json!(mtu));
    }
    if let Some(dns_domain) = &resource.dns_domain {
        attrs.insert("dns_domain".into(), json!(dns_domain));
    }
    if let Some(port_security) = resource.port_security_enabled {
        attrs.insert("port_security_enabled".into(), json!(port_security));
    }
    if !resource.availability_zone_hints.is_empty() {
        attrs.insert(
            "availability_zone_hints".into(),
            json!(resource.availability_zone_hints),
        );
    }
    Value::Object(attrs)
}

/// Attributes that differ from `observed` and Neutron can change in place.
#[must_use]
pub fn update_attributes(
    name: &str,
    resource: &NetworkResourceSpec,
    observed: &neutron::Network,
) -> Option<Value> {
    let mut attrs = Map::new();
    if name != observed.name {
        attrs.insert("name".into(), json!(name));
    }
    if differs(resource.description.as_ref(), &observed.description) {
        attrs.insert("description".into(), json!(resource.description));
    }
    if differs(resource.admin_state_up.as_ref(), &observed.admin_state_up) {
        attrs.insert("admin_state_up".into(), json!(resource.admin_state_up));
    }
    if resource.port_security_enabled.is_some()
        && resource.port_security_enabled != observed.port_security_enabled
    {
        attrs.insert(
            "port_security_enabled".into(),
            json!(resource.port_security_enabled),
        );
    }
    (!attrs.is_empty()).then_some(Value::Object(attrs))
}

/// Properties the list API cannot filter on.
fn matches_spec(resource: &NetworkResourceSpec, network: &neutron::Network) -> bool {
    resource.mtu.is_none_or(|mtu| network.mtu == Some(mtu))
        && resource
            .dns_domain
            .as_ref()
            .is_none_or(|d| network.dns_domain.as_ref() == Some(d))
        && resource
            .port_security_enabled
            .is_none_or(|p| network.port_security_enabled == Some(p))
        && resource.external.is_none_or(|e| network.external == e)
        && resource.shared.is_none_or(|s| network.shared == s)
}

/// Mirror of an observed network for `status.resource`.
#[must_use]
pub fn network_status(network: &neutron::Network) -> NetworkResourceStatus {
    NetworkResourceStatus {
        name: network.name.clone(),
        description: network.description.clone(),
        project_id: network.project_id.clone(),
        status: network.status.clone(),
        admin_state_up: network.admin_state_up,
        shared: network.shared,
        external: network.external,
        mtu: network.mtu,
        dns_domain: network.dns_domain.clone().unwrap_or_default(),
        port_security_enabled: network.port_security_enabled,
        availability_zone_hints: network.availability_zone_hints.clone(),
        subnets: network.subnets.clone(),
        tags: network.tags.clone(),
        created_at: normalize_opt_timestamp(network.created_at.as_deref()),
        updated_at: normalize_opt_timestamp(network.updated_at.as_deref()),
        revision_number: None,
    }
}

#[async_trait]
impl Actuator for NetworkActuator {
    type Resource = neutron::Network;

    fn identity(&self) -> ResourceIdentity {
        self.obj.identity()
    }

    fn extract_id(&self, resource: &neutron::Network) -> String {
        resource.id.clone()
    }

    async fn get_by_id(&self, id: &str) -> Result<neutron::Network, OrcError> {
        Ok(self.client.get(collection::NETWORKS, id).await?)
    }

    async fn get_by_import_filter(&self) -> Result<Lookup<neutron::Network>, OrcError> {
        let Some(filter) = self.obj.spec.import.as_ref().and_then(|i| i.filter.as_ref()) else {
            return Ok(Lookup::Skipped);
        };
        let query = Query::new()
            .opt("name", filter.name.as_ref())
            .opt("description", filter.description.as_ref())
            .opt("router:external", filter.external)
            .opt("project_id", filter.project_id.as_ref())
            .tags("tags", &filter.tags);
        import_lookup(self.client.list(collection::NETWORKS, &query).await?)
    }

    async fn get_by_spec(
        &self,
        claimed: &HashSet<String>,
    ) -> Result<Option<neutron::Network>, OrcError> {
        let Some(resource) = &self.obj.spec.resource else {
            return Ok(None);
        };
        // Scoped to our project so a shared network owned elsewhere is never adopted.
        let project_id = self.client.project_id().await?;
        let query = Query::new()
            .push("name", self.name())
            .opt("project_id", project_id);
        let candidates: Vec<neutron::Network> =
            self.client.list(collection::NETWORKS, &query).await?;
        single_match(
            "network",
            unclaimed(candidates, claimed, |n| n.id.as_str())
                .into_iter()
                .filter(|n| matches_spec(resource, n))
                .collect(),
        )
    }

    async fn create(&self) -> Result<Created<neutron::Network>, OrcError> {
        let resource = self.obj.spec.resource.as_ref().ok_or_else(missing_resource)?;
        let mut network: neutron::Network = self
            .client
            .create(collection::NETWORKS, create_attributes(&self.name(), resource))
            .await?;
        if !resource.tags.is_empty() {
            self.client
                .replace_tags(collection::NETWORKS, &network.id, &resource.tags)
                .await?;
            network.tags.clone_from(&resource.tags);
        }
        Ok(Created::done(network))
    }

    fn planned_updates<'a>(&'a self, observed: &'a neutron::Network) -> Vec<UpdateStep<'a>> {
        let Some(resource) = &self.obj.spec.resource else {
            return Vec::new();
        };
        let mut steps = Vec::new();
        if let Some(attrs) = update_attributes(&self.name(), resource, observed) {
            steps.push(step(async move {
                self.client
                    .update::<Value>(collection::NETWORKS, &observed.id, attrs)
                    .await
                    .map(drop)
            }));
        }
        if !list_content_equals(&resource.tags, &observed.tags) {
            steps.push(step(self.client.replace_tags(
                collection::NETWORKS,
                &observed.id,
                &resource.tags,
            )));
        }
        steps
    }

    async fn delete(&self, observed: &neutron::Network) -> Result<(), OrcError> {
        Ok(self.client.delete(collection::NETWORKS, &observed.id).await?)
    }

    fn referencing_kinds(&self) -> &'static [&'static str] {
        REFERENCING_KINDS
    }

    fn is_ready(&self, resource: &neutron::Network) -> bool {
        resource.status == STATUS_ACTIVE
    }

    fn resource_status(&self, resource: &neutron::Network) -> Result<Value, OrcError> {
        mirror(&network_status(resource))
    }
}

#[async_trait]
impl Reconcilable for Network {
    type Deps = ();
    type Actuator = NetworkActuator;

    async fn resolve_dependencies(&self, _deps: &mut Dependencies<'_>) -> Result<(), OrcError> {
        Ok(())
    }

    fn actuator(
        obj: Arc<Self>,
        clients: Arc<CloudClients>,
        _deps: (),
    ) -> Result<NetworkActuator, OrcError> {
        Ok(NetworkActuator::new(obj, clients.network()?.clone()))
    }
}

#[cfg(test)]
#[path = "network_tests.rs"]
mod network_tests;
