// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `Port` actuator (Neutron ports).
//!
//! A port sits on a `Network`, takes fixed addresses from `Subnet` objects and
//! carries `SecurityGroup` objects. It is ready once Neutron reports `ACTIVE`
//! or `DOWN` (an unbound port is `DOWN`). Deletion waits for floating IPs,
//! routers and servers that use the port.

use crate::constants::{KIND_FLOATING_IP, KIND_ROUTER, KIND_SERVER};
use crate::crd::{
    AllowedAddressPair, FixedIpStatus, Network, Port, PortResourceSpec, PortResourceStatus,
    SecurityGroup, Subnet,
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
use anyhow::anyhow;
use async_trait::async_trait;
use kube::ResourceExt;
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::sync::Arc;

pub const STATUS_ACTIVE: &str = "ACTIVE";
pub const STATUS_DOWN: &str = "DOWN";

const REFERENCING_KINDS: &[&str] = &[KIND_FLOATING_IP, KIND_ROUTER, KIND_SERVER];

/// Resolved sibling IDs of a port.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PortDeps {
    pub network_id: Option<String>,
    /// One subnet ID per `spec.resource.addresses` entry, in order.
    pub subnet_ids: Option<Vec<String>>,
    /// One ID per `spec.resource.securityGroupRefs` entry, in order.
    pub security_group_ids: Option<Vec<String>>,
    /// Network of `spec.import.filter`.
    pub filter_network_id: Option<String>,
}

pub struct PortActuator {
    obj: Arc<Port>,
    client: NetworkClient,
    deps: PortDeps,
}

/// Sibling IDs every create or adoption needs.
struct Resolved<'a> {
    network_id: &'a str,
    subnet_ids: &'a [String],
    security_group_ids: &'a [String],
}

impl PortActuator {
    #[must_use]
    pub fn new(obj: Arc<Port>, client: NetworkClient, deps: PortDeps) -> Self {
        Self { obj, client, deps }
    }

    fn name(&self) -> String {
        resource_name(
            &self.obj.name_any(),
            self.obj.spec.resource.as_ref().and_then(|r| r.name.as_ref()),
        )
    }

    fn resolved(&self, resource: &PortResourceSpec) -> Result<Resolved<'_>, OrcError> {
        let network_id = required(
            self.deps.network_id.as_ref(),
            Network::KIND,
            &resource.network_ref,
        )?;
        let subnet_ids = self
            .deps
            .subnet_ids
            .as_deref()
            .ok_or_else(|| OrcError::from(anyhow!("{} of port are not resolved", Subnet::KIND)))?;
        let security_group_ids = self.deps.security_group_ids.as_deref().ok_or_else(|| {
            OrcError::from(anyhow!("{} of port are not resolved", SecurityGroup::KIND))
        })?;
        Ok(Resolved {
            network_id,
            subnet_ids,
            security_group_ids,
        })
    }
}

fn address_pairs(pairs: &[AllowedAddressPair]) -> Value {
    pairs
        .iter()
        .map(|p| match &p.mac {
            Some(mac) => json!({ "ip_address": p.ip, "mac_address": mac }),
            None => json!({ "ip_address": p.ip }),
        })
        .collect()
}

/// Neutron fills in the port MAC on pairs created without one, so a desired
/// pair without a MAC matches any observed MAC.
#[must_use]
pub fn address_pairs_match(desired: &[AllowedAddressPair], observed: &[neutron::AddressPair]) -> bool {
    desired.len() == observed.len()
        && desired.iter().all(|d| {
            observed.iter().any(|o| {
                o.ip_address == d.ip
                    && d.mac.as_ref().is_none_or(|mac| o.mac_address.as_ref() == Some(mac))
            })
        })
}

/// Create request attributes for `resource`.
///
/// `subnet_ids` pairs with `resource.addresses` by position.
#[must_use]
pub fn create_attributes(
    name: &str,
    resource: &PortResourceSpec,
    network_id: &str,
    subnet_ids: &[String],
    security_group_ids: &[String],
) -> Value {
    let mut attrs = Map::new();
    attrs.insert("name".into(), json!(name));
    attrs.insert("network_id".into(), json!(network_id));
    if let Some(description) = &resource.description {
        attrs.insert("description".into(), json!(description));
    }
    if let Some(admin_state_up) = resource.admin_state_up {
        attrs.insert("admin_state_up".into(), json!(admin_state_up));
    }
    if !resource.addresses.is_empty() {
        let fixed_ips: Vec<Value> = resource
            .addresses
            .iter()
            .zip(subnet_ids)
            .map(|(address, subnet_id)| match &address.ip {
                Some(ip) => json!({ "subnet_id": subnet_id, "ip_address": ip }),
                None => json!({ "subnet_id": subnet_id }),
            })
            .collect();
        attrs.insert("fixed_ips".into(), Value::Array(fixed_ips));
    }
    if !security_group_ids.is_empty() {
        attrs.insert("security_groups".into(), json!(security_group_ids));
    }
    if !resource.allowed_address_pairs.is_empty() {
        attrs.insert(
            "allowed_address_pairs".into(),
            address_pairs(&resource.allowed_address_pairs),
        );
    }
    Value::Object(attrs)
}

/// Attributes that differ from `observed` and Neutron can change in place.
///
/// Security groups are only managed when `spec.resource` names at least one.
#[must_use]
pub fn update_attributes(
    name: &str,
    resource: &PortResourceSpec,
    security_group_ids: &[String],
    observed: &neutron::Port,
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
    if !security_group_ids.is_empty()
        && !list_content_equals(security_group_ids, &observed.security_groups)
    {
        attrs.insert("security_groups".into(), json!(security_group_ids));
    }
    if !address_pairs_match(&resource.allowed_address_pairs, &observed.allowed_address_pairs) {
        attrs.insert(
            "allowed_address_pairs".into(),
            address_pairs(&resource.allowed_address_pairs),
        );
    }
    (!attrs.is_empty()).then_some(Value::Object(attrs))
}

/// Mirror of an observed port for `status.resource`.
#[must_use]
pub fn port_status(port: &neutron::Port) -> PortResourceStatus {
    PortResourceStatus {
        name: port.name.clone(),
        description: port.description.clone(),
        network_id: port.network_id.clone(),
        project_id: port.project_id.clone(),
        status: port.status.clone(),
        admin_state_up: port.admin_state_up,
        mac_address: port.mac_address.clone(),
        device_id: port.device_id.clone(),
        device_owner: port.device_owner.clone(),
        fixed_ips: port
            .fixed_ips
            .iter()
            .map(|f| FixedIpStatus {
                ip: f.ip_address.clone(),
                subnet_id: f.subnet_id.clone(),
            })
            .collect(),
        security_groups: port.security_groups.clone(),
        allowed_address_pairs: port
            .allowed_address_pairs
            .iter()
            .map(|p| AllowedAddressPair {
                ip: p.ip_address.clone(),
                mac: p.mac_address.clone(),
            })
            .collect(),
        tags: port.tags.clone(),
        created_at: normalize_opt_timestamp(port.created_at.as_deref()),
        updated_at: normalize_opt_timestamp(port.updated_at.as_deref()),
    }
}

#[async_trait]
impl Actuator for PortActuator {
    type Resource = neutron::Port;

    fn identity(&self) -> ResourceIdentity {
        self.obj.identity()
    }

    fn extract_id(&self, resource: &neutron::Port) -> String {
        resource.id.clone()
    }

    async fn get_by_id(&self, id: &str) -> Result<neutron::Port, OrcError> {
        Ok(self.client.get(collection::PORTS, id).await?)
    }

    async fn get_by_import_filter(&self) -> Result<Lookup<neutron::Port>, OrcError> {
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
            .opt("description", filter.description.as_ref())
            .opt("network_id", network_id)
            .tags("tags", &filter.tags);
        import_lookup(self.client.list(collection::PORTS, &query).await?)
    }

    async fn get_by_spec(
        &self,
        claimed: &HashSet<String>,
    ) -> Result<Option<neutron::Port>, OrcError> {
        let Some(resource) = &self.obj.spec.resource else {
            return Ok(None);
        };
        let resolved = self.resolved(resource)?;
        let query = Query::new()
            .push("name", self.name())
            .push("network_id", resolved.network_id);
        let candidates: Vec<neutron::Port> = self.client.list(collection::PORTS, &query).await?;
        single_match(
            "port",
            unclaimed(candidates, claimed, |p| p.id.as_str())
                .into_iter()
                .filter(|p| {
                    resolved.security_group_ids.is_empty()
                        || list_content_equals(resolved.security_group_ids, &p.security_groups)
                })
                .collect(),
        )
    }

    async fn create(&self) -> Result<Created<neutron::Port>, OrcError> {
        let resource = self.obj.spec.resource.as_ref().ok_or_else(missing_resource)?;
        let resolved = self.resolved(resource)?;
        let attrs = create_attributes(
            &self.name(),
            resource,
            resolved.network_id,
            resolved.subnet_ids,
            resolved.security_group_ids,
        );
        let mut port: neutron::Port = self.client.create(collection::PORTS, attrs).await?;
        if !resource.tags.is_empty() {
            self.client
                .replace_tags(collection::PORTS, &port.id, &resource.tags)
                .await?;
            port.tags.clone_from(&resource.tags);
        }
        Ok(Created::done(port))
    }

    fn planned_updates<'a>(&'a self, observed: &'a neutron::Port) -> Vec<UpdateStep<'a>> {
        let Some(resource) = &self.obj.spec.resource else {
            return Vec::new();
        };
        let security_group_ids = self.deps.security_group_ids.as_deref().unwrap_or_default();
        let mut steps = Vec::new();
        if let Some(attrs) = update_attributes(&self.name(), resource, security_group_ids, observed)
        {
            steps.push(step(async move {
                self.client
                    .update::<Value>(collection::PORTS, &observed.id, attrs)
                    .await
                    .map(drop)
            }));
        }
        if !list_content_equals(&resource.tags, &observed.tags) {
            steps.push(step(self.client.replace_tags(
                collection::PORTS,
                &observed.id,
                &resource.tags,
            )));
        }
        steps
    }

    async fn delete(&self, observed: &neutron::Port) -> Result<(), OrcError> {
        Ok(self.client.delete(collection::PORTS, &observed.id).await?)
    }

    fn referencing_kinds(&self) -> &'static [&'static str] {
        REFERENCING_KINDS
    }

    fn is_ready(&self, resource: &neutron::Port) -> bool {
        resource.status == STATUS_ACTIVE || resource.status == STATUS_DOWN
    }

    fn resource_status(&self, resource: &neutron::Port) -> Result<Value, OrcError> {
        mirror(&port_status(resource))
    }
}

#[async_trait]
impl Reconcilable for Port {
    type Deps = PortDeps;
    type Actuator = PortActuator;

    fn dependency_refs(&self) -> Vec<(String, String)> {
        let mut refs = Vec::new();
        if let Some(resource) = &self.spec.resource {
            refs.push((Network::label_kind(), resource.network_ref.clone()));
            refs.extend(
                resource
                    .addresses
                    .iter()
                    .map(|a| (Subnet::label_kind(), a.subnet_ref.clone())),
            );
            refs.extend(
                resource
                    .security_group_refs
                    .iter()
                    .map(|name| (SecurityGroup::label_kind(), name.clone())),
            );
        }
        if let Some(network_ref) = self
            .spec
            .import
            .as_ref()
            .and_then(|i| i.filter.as_ref())
            .and_then(|f| f.network_ref.as_ref())
        {
            refs.push((Network::label_kind(), network_ref.clone()));
        }
        refs
    }

    async fn resolve_dependencies(&self, deps: &mut Dependencies<'_>) -> Result<PortDeps, OrcError> {
        let mut resolved = PortDeps::default();
        if let Some(resource) = &self.spec.resource {
            resolved.network_id = deps.id_of::<Network>(&resource.network_ref).await?;
            let subnet_refs: Vec<String> = resource
                .addresses
                .iter()
                .map(|a| a.subnet_ref.clone())
                .collect();
            resolved.subnet_ids = deps.ids_of::<Subnet>(&subnet_refs).await?;
            resolved.security_group_ids = deps
                .ids_of::<SecurityGroup>(&resource.security_group_refs)
                .await?;
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
        deps: PortDeps,
    ) -> Result<PortActuator, OrcError> {
        Ok(PortActuator::new(obj, clients.network()?.clone(), deps))
    }
}

#[cfg(test)]
#[path = "port_tests.rs"]
mod port_tests;
