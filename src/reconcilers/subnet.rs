// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `Subnet` actuator (Neutron subnets).
//!
//! A subnet belongs to the `Network` named by `spec.resource.networkRef`. The
//! network must be Available before the subnet is created or adopted. DNS
//! nameservers are compared as a multiset; host routes keep their order.

use crate::crd::{
    AllocationPool, HostRoute, Network, Subnet, SubnetResourceSpec, SubnetResourceStatus,
};
use crate::errors::OrcError;
use crate::openstack::client::{normalize_opt_timestamp, Query};
use crate::openstack::network::{self as neutron, collection, NetworkClient};
use crate::openstack::CloudClients;
use crate::reconcilers::actuator::{Actuator, Created, Lookup, ResourceIdentity, UpdateStep};
use crate::reconcilers::adapter::{
    import_lookup, mirror, missing_resource, required, resource_name, single_match, step, unclaimed,
};
use crate::reconcilers::compare::{differs, list_content_equals};
use crate::reconcilers::kind::{Dependencies, OrcObject, OrcResource, Reconcilable};
use async_trait::async_trait;
use kube::ResourceExt;
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::sync::Arc;

/// Resolved sibling IDs of a subnet.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubnetDeps {
    /// Network of `spec.resource`.
    pub network_id: Option<String>,
    /// Network of `spec.import.filter`.
    pub filter_network_id: Option<String>,
}

pub struct SubnetActuator {
    obj: Arc<Subnet>,
    client: NetworkClient,
    deps: SubnetDeps,
}

impl SubnetActuator {
    #[must_use]
    pub fn new(obj: Arc<Subnet>, client: NetworkClient, deps: SubnetDeps) -> Self {
        Self { obj, client, deps }
    }

    fn name(&self) -> String {
        resource_name(
            &self.obj.name_any(),
            self.obj.spec.resource.as_ref().and_then(|r| r.name.as_ref()),
        )
    }

    fn network_id(&self, resource: &SubnetResourceSpec) -> Result<&str, OrcError> {
        required(
            self.deps.network_id.as_ref(),
            Network::KIND,
            &resource.network_ref,
        )
    }
}

fn pools(pools: &[AllocationPool]) -> Value {
    pools
        .iter()
        .map(|p| json!({ "start": p.start, "end": p.end }))
        .collect()
}

fn routes(routes: &[HostRoute]) -> Value {
    routes
        .iter()
        .map(|r| json!({ "destination": r.destination, "nexthop": r.next_hop }))
        .collect()
}

fn observed_routes(observed: &neutron::Subnet) -> Vec<HostRoute> {
    observed
        .host_routes
        .iter()
        .map(|r| HostRoute {
            destination: r.destination.clone(),
            next_hop: r.nexthop.clone(),
        })
        .collect()
}

/// Create request attributes for `resource` on `network_id`.
#[must_use]
pub fn create_attributes(name: &str, network_id: &str, resource: &SubnetResourceSpec) -> Value {
    let mut attrs = Map::new();
    attrs.insert("name".into(), json!(name));
    attrs.insert("network_id".into(), json!(network_id));
    attrs.insert("cidr".into(), json!(resource.cidr));
    attrs.insert("ip_version".into(), json!(resource.ip_version));
    if let Some(description) = &resource.description {
        attrs.insert("description".into(), json!(description));
    }
    if let Some(gateway_ip) = &resource.gateway_ip {
        attrs.insert("gateway_ip".into(), json!(gateway_ip));
    }
    if let Some(enable_dhcp) = resource.enable_dhcp {
        attrs.insert("enable_dhcp".into(), json!(enable_dhcp));
    }
    if !resource.dns_nameservers.is_empty() {
        attrs.insert("dns_nameservers".into(), json!(resource.dns_nameservers));
    }
    if !resource.allocation_pools.is_empty() {
        attrs.insert("allocation_pools".into(), pools(&resource.allocation_pools));
    }
    if !resource.host_routes.is_empty() {
        attrs.insert("host_routes".into(), routes(&resource.host_routes));
    }
    if let Some(mode) = &resource.ipv6_address_mode {
        attrs.insert("ipv6_address_mode".into(), json!(mode));
    }
    if let Some(mode) = &resource.ipv6_ra_mode {
        attrs.insert("ipv6_ra_mode".into(), json!(mode));
    }
    Value::Object(attrs)
}

/// Attributes that differ from `observed` and Neutron can change in place.
#[must_use]
pub fn update_attributes(
    name: &str,
    resource: &SubnetResourceSpec,
    observed: &neutron::Subnet,
) -> Option<Value> {
    let mut attrs = Map::new();
    if name != observed.name {
        attrs.insert("name".into(), json!(name));
    }
    if differs(resource.description.as_ref(), &observed.description) {
        attrs.insert("description".into(), json!(resource.description));
    }
    if resource.gateway_ip.is_some() && resource.gateway_ip != observed.gateway_ip {
        attrs.insert("gateway_ip".into(), json!(resource.gateway_ip));
    }
    if differs(resource.enable_dhcp.as_ref(), &observed.enable_dhcp) {
        attrs.insert("enable_dhcp".into(), json!(resource.enable_dhcp));
    }
    if !list_content_equals(&resource.dns_nameservers, &observed.dns_nameservers) {
        attrs.insert("dns_nameservers".into(), json!(resource.dns_nameservers));
    }
    if resource.host_routes != observed_routes(observed) {
        attrs.insert("host_routes".into(), routes(&resource.host_routes));
    }
    (!attrs.is_empty()).then_some(Value::Object(attrs))
}

/// Mirror of an observed subnet for `status.resource`.
#[must_use]
pub fn subnet_status(subnet: &neutron::Subnet) -> SubnetResourceStatus {
    SubnetResourceStatus {
        name: subnet.name.clone(),
        description: subnet.description.clone(),
        network_id: subnet.network_id.clone(),
        project_id: subnet.project_id.clone(),
        ip_version: subnet.ip_version,
        cidr: subnet.cidr.clone(),
        gateway_ip: subnet.gateway_ip.clone(),
        enable_dhcp: subnet.enable_dhcp,
        dns_nameservers: subnet.dns_nameservers.clone(),
        allocation_pools: subnet
            .allocation_pools
            .iter()
            .map(|p| AllocationPool {
                start: p.start.clone(),
                end: p.end.clone(),
            })
            .collect(),
        host_routes: observed_routes(subnet),
        ipv6_address_mode: subnet.ipv6_address_mode.clone(),
        ipv6_ra_mode: subnet.ipv6_ra_mode.clone(),
        tags: subnet.tags.clone(),
        created_at: normalize_opt_timestamp(subnet.created_at.as_deref()),
        updated_at: normalize_opt_timestamp(subnet.updated_at.as_deref()),
    }
}

#[async_trait]
impl Actuator for SubnetActuator {
    type Resource = neutron::Subnet;

    fn identity(&self) -> ResourceIdentity {
        self.obj.identity()
    }

    fn extract_id(&self, resource: &neutron::Subnet) -> String {
        resource.id.clone()
    }

    async fn get_by_id(&self, id: &str) -> Result<neutron::Subnet, OrcError> {
        Ok(self.client.get(collection::SUBNETS, id).await?)
    }

    async fn get_by_import_filter(&self) -> Result<Lookup<neutron::Subnet>, OrcError> {
        let Some(filter) = self.obj.spec.import.as_ref().and_then(|i| i.filter.as_ref()) else {
            return Ok(Lookup::Skipped);
        };
        let network_id = match &filter.network_ref {
            Some(network_ref) => Some(required(
                self.deps.filter_network_id.as_ref(),
                Network::KIND,
                network_ref,
            )?),
            None => None,
        };
        let query = Query::new()
            .opt("name", filter.name.as_ref())
            .opt("network_id", network_id)
            .opt("cidr", filter.cidr.as_ref())
            .opt("ip_version", filter.ip_version)
            .tags("tags", &filter.tags);
        import_lookup(self.client.list(collection::SUBNETS, &query).await?)
    }

    async fn get_by_spec(
        &self,
        claimed: &HashSet<String>,
    ) -> Result<Option<neutron::Subnet>, OrcError> {
        let Some(resource) = &self.obj.spec.resource else {
            return Ok(None);
        };
        let query = Query::new()
            .push("name", self.name())
            .push("network_id", self.network_id(resource)?)
            .push("cidr", &resource.cidr)
            .push("ip_version", resource.ip_version);
        let candidates: Vec<neutron::Subnet> = self.client.list(collection::SUBNETS, &query).await?;
        single_match("subnet", unclaimed(candidates, claimed, |s| s.id.as_str()))
    }

    async fn create(&self) -> Result<Created<neutron::Subnet>, OrcError> {
        let resource = self.obj.spec.resource.as_ref().ok_or_else(missing_resource)?;
        let attrs = create_attributes(&self.name(), self.network_id(resource)?, resource);
        let mut subnet: neutron::Subnet = self.client.create(collection::SUBNETS, attrs).await?;
        if !resource.tags.is_empty() {
            self.client
                .replace_tags(collection::SUBNETS, &subnet.id, &resource.tags)
                .await?;
            subnet.tags.clone_from(&resource.tags);
        }
        Ok(Created::done(subnet))
    }

    fn planned_updates<'a>(&'a self, observed: &'a neutron::Subnet) -> Vec<UpdateStep<'a>> {
        let Some(resource) = &self.obj.spec.resource else {
            return Vec::new();
        };
        let mut steps = Vec::new();
        if let Some(attrs) = update_attributes(&self.name(), resource, observed) {
            steps.push(step(async move {
                self.client
                    .update::<Value>(collection::SUBNETS, &observed.id, attrs)
                    .await
                    .map(drop)
            }));
        }
        if !list_content_equals(&resource.tags, &observed.tags) {
            steps.push(step(self.client.replace_tags(
                collection::SUBNETS,
                &observed.id,
                &resource.tags,
            )));
        }
        steps
    }

    async fn delete(&self, observed: &neutron::Subnet) -> Result<(), OrcError> {
        Ok(self.client.delete(collection::SUBNETS, &observed.id).await?)
    }

    fn is_ready(&self, _resource: &neutron::Subnet) -> bool {
        true
    }

    fn resource_status(&self, resource: &neutron::Subnet) -> Result<Value, OrcError> {
        mirror(&subnet_status(resource))
    }
}

#[async_trait]
impl Reconcilable for Subnet {
    type Deps = SubnetDeps;
    type Actuator = SubnetActuator;

    fn dependency_refs(&self) -> Vec<(String, String)> {
        let resource = self.spec.resource.as_ref().map(|r| &r.network_ref);
        let filter = self
            .spec
            .import
            .as_ref()
            .and_then(|i| i.filter.as_ref())
            .and_then(|f| f.network_ref.as_ref());
        resource
            .into_iter()
            .chain(filter)
            .map(|name| (Network::label_kind(), name.clone()))
            .collect()
    }

    async fn resolve_dependencies(
        &self,
        deps: &mut Dependencies<'_>,
    ) -> Result<SubnetDeps, OrcError> {
        let mut resolved = SubnetDeps::default();
        if let Some(resource) = &self.spec.resource {
            resolved.network_id = deps.id_of::<Network>(&resource.network_ref).await?;
        }
        let filter_ref = self
            .spec
            .import
            .as_ref()
            .and_then(|i| i.filter.as_ref())
            .and_then(|f| f.network_ref.as_ref());
        if let Some(network_ref) = filter_ref {
            resolved.filter_network_id = deps.id_of::<Network>(network_ref).await?;
        }
        Ok(resolved)
    }

    fn actuator(
        obj: Arc<Self>,
        clients: Arc<CloudClients>,
        deps: SubnetDeps,
    ) -> Result<SubnetActuator, OrcError> {
        Ok(SubnetActuator::new(obj, clients.network()?.clone(), deps))
    }
}

#[cfg(test)]
#[path = "subnet_tests.rs"]
mod subnet_tests;
