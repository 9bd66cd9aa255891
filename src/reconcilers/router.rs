// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `Router` actuator (Neutron routers).
//!
//! The observed state pairs the router with the IDs of its interface ports, so
//! interface attachment is planned like any other update. Ports named in
//! `spec.resource.portRefs` are attached; interfaces added by other means are
//! left alone. Deletion detaches every interface port first because Neutron
//! refuses to delete a router that still has interfaces.

use crate::crd::{Network, Port, Router, RouterResourceSpec, RouterResourceStatus};
use crate::errors::OrcError;
use crate::openstack::client::{normalize_opt_timestamp, Query};
use crate::openstack::network::{self as neutron, collection, NetworkClient};
use crate::openstack::CloudClients;
use crate::reconcilers::actuator::{Actuator, Created, Lookup, ResourceIdentity, UpdateStep};
use crate::reconcilers::adapter::{
    at_most_one, mirror, missing_resource, required, resource_name, single_match, step, unclaimed,
};
use crate::reconcilers::compare::{differs, list_content_equals};
use crate::reconcilers::kind::{Dependencies, OrcObject, OrcResource, Reconcilable};
use async_trait::async_trait;
use kube::ResourceExt;
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

pub const STATUS_ACTIVE: &str = "ACTIVE";

/// A router and the ports currently attached to it as interfaces.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RouterState {
    pub router: neutron::Router,
    pub interface_port_ids: Vec<String>,
}

/// Resolved sibling IDs of a router.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RouterDeps {
    pub gateway_network_id: Option<String>,
    /// One ID per `spec.resource.portRefs` entry, in order.
    pub port_ids: Option<Vec<String>>,
}

pub struct RouterActuator {
    obj: Arc<Router>,
    client: NetworkClient,
    deps: RouterDeps,
}

impl RouterActuator {
    #[must_use]
    pub fn new(obj: Arc<Router>, client: NetworkClient, deps: RouterDeps) -> Self {
        Self { obj, client, deps }
    }

    fn name(&self) -> String {
        resource_name(
            &self.obj.name_any(),
            self.obj.spec.resource.as_ref().and_then(|r| r.name.as_ref()),
        )
    }

    fn gateway_network_id(&self, resource: &RouterResourceSpec) -> Result<Option<&str>, OrcError> {
        resource
            .external_gateway
            .as_ref()
            .map(|gw| {
                required(
                    self.deps.gateway_network_id.as_ref(),
                    Network::KIND,
                    &gw.network_ref,
                )
            })
            .transpose()
    }

    async fn with_interfaces(&self, router: neutron::Router) -> Result<RouterState, OrcError> {
        let interface_port_ids = self
            .client
            .router_interface_ports(&router.id)
            .await?
            .into_iter()
            .map(|p| p.id)
            .collect();
        Ok(RouterState {
            router,
            interface_port_ids,
        })
    }
}

/// Create request attributes for `resource`.
#[must_use]
pub fn create_attributes(
    name: &str,
    resource: &RouterResourceSpec,
    gateway_network_id: Option<&str>,
) -> Value {
    let mut attrs = Map::new();
    attrs.insert("name".into(), json!(name));
    if let Some(description) = &resource.description {
        attrs.insert("description".into(), json!(description));
    }
    if let Some(admin_state_up) = resource.admin_state_up {
        attrs.insert("admin_state_up".into(), json!(admin_state_up));
    }
    if let Some(distributed) = resource.distributed {
        attrs.insert("distributed".into(), json!(distributed));
    }
    if let Some(network_id) = gateway_network_id {
        attrs.insert(
            "external_gateway_info".into(),
            json!({ "network_id": network_id }),
        );
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
    resource: &RouterResourceSpec,
    observed: &neutron::Router,
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
    (!attrs.is_empty()).then_some(Value::Object(attrs))
}

/// Desired interface ports not yet attached, in spec order.
#[must_use]
pub fn missing_interfaces<'a>(desired: &'a [String], attached: &[String]) -> Vec<&'a str> {
    desired
        .iter()
        .filter(|id| !attached.contains(*id))
        .map(String::as_str)
        .collect()
}

/// Mirror of an observed router for `status.resource`.
#[must_use]
pub fn router_status(router: &neutron::Router) -> RouterResourceStatus {
    RouterResourceStatus {
        name: router.name.clone(),
        description: router.description.clone(),
        project_id: router.project_id.clone(),
        status: router.status.clone(),
        admin_state_up: router.admin_state_up,
        distributed: router.distributed.unwrap_or_default(),
        external_gateway_network_id: router
            .external_gateway_info
            .as_ref()
            .map(|gw| gw.network_id.clone()),
        availability_zone_hints: router.availability_zone_hints.clone(),
        tags: router.tags.clone(),
        created_at: normalize_opt_timestamp(router.created_at.as_deref()),
        updated_at: normalize_opt_timestamp(router.updated_at.as_deref()),
    }
}

#[async_trait]
impl Actuator for RouterActuator {
    type Resource = RouterState;

    fn identity(&self) -> ResourceIdentity {
        self.obj.identity()
    }

    fn extract_id(&self, resource: &RouterState) -> String {
        resource.router.id.clone()
    }

    async fn get_by_id(&self, id: &str) -> Result<RouterState, OrcError> {
        let router = self.client.get(collection::ROUTERS, id).await?;
        self.with_interfaces(router).await
    }

    async fn get_by_import_filter(&self) -> Result<Lookup<RouterState>, OrcError> {
        let Some(filter) = self.obj.spec.import.as_ref().and_then(|i| i.filter.as_ref()) else {
            return Ok(Lookup::Skipped);
        };
        let query = Query::new()
            .opt("name", filter.name.as_ref())
            .opt("description", filter.description.as_ref())
            .opt("project_id", filter.project_id.as_ref())
            .tags("tags", &filter.tags);
        let candidates: Vec<neutron::Router> = self.client.list(collection::ROUTERS, &query).await?;
        match at_most_one(candidates)? {
            Some(router) => Ok(Lookup::Found(self.with_interfaces(router).await?)),
            None => Ok(Lookup::Absent),
        }
    }

    async fn get_by_spec(&self, claimed: &HashSet<String>) -> Result<Option<RouterState>, OrcError> {
        if self.obj.spec.resource.is_none() {
            return Ok(None);
        }
        let project_id = self.client.project_id().await?;
        let query = Query::new()
            .push("name", self.name())
            .opt("project_id", project_id);
        let candidates: Vec<neutron::Router> = self.client.list(collection::ROUTERS, &query).await?;
        match single_match("router", unclaimed(candidates, claimed, |r| r.id.as_str()))? {
            Some(router) => Ok(Some(self.with_interfaces(router).await?)),
            None => Ok(None),
        }
    }

    async fn create(&self) -> Result<Created<RouterState>, OrcError> {
        let resource = self.obj.spec.resource.as_ref().ok_or_else(missing_resource)?;
        let attrs = create_attributes(&self.name(), resource, self.gateway_network_id(resource)?);
        let mut router: neutron::Router = self.client.create(collection::ROUTERS, attrs).await?;
        if !resource.tags.is_empty() {
            self.client
                .replace_tags(collection::ROUTERS, &router.id, &resource.tags)
                .await?;
            router.tags.clone_from(&resource.tags);
        }
        Ok(Created::done(RouterState {
            router,
            interface_port_ids: Vec::new(),
        }))
    }

    fn planned_updates<'a>(&'a self, observed: &'a RouterState) -> Vec<UpdateStep<'a>> {
        let Some(resource) = &self.obj.spec.resource else {
            return Vec::new();
        };
        let router = &observed.router;
        let mut steps = Vec::new();
        if let Some(attrs) = update_attributes(&self.name(), resource, router) {
            steps.push(step(async move {
                self.client
                    .update::<Value>(collection::ROUTERS, &router.id, attrs)
                    .await
                    .map(drop)
            }));
        }
        if !list_content_equals(&resource.tags, &router.tags) {
            steps.push(step(self.client.replace_tags(
                collection::ROUTERS,
                &router.id,
                &resource.tags,
            )));
        }
        let desired = self.deps.port_ids.as_deref().unwrap_or_default();
        for port_id in missing_interfaces(desired, &observed.interface_port_ids) {
            steps.push(step(async move {
                info!(router_id = %router.id, port_id, "Attaching router interface");
                self.client.add_router_interface(&router.id, port_id).await
            }));
        }
        steps
    }

    async fn delete(&self, observed: &RouterState) -> Result<(), OrcError> {
        let router_id = &observed.router.id;
        for port in self.client.router_interface_ports(router_id).await? {
            match self.client.remove_router_interface(router_id, &port.id).await {
                Ok(()) => info!(%router_id, port_id = %port.id, "Detached router interface"),
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(self.client.delete(collection::ROUTERS, router_id).await?)
    }

    fn is_ready(&self, resource: &RouterState) -> bool {
        resource.router.status == STATUS_ACTIVE
    }

    fn resource_status(&self, resource: &RouterState) -> Result<Value, OrcError> {
        mirror(&router_status(&resource.router))
    }
}

#[async_trait]
impl Reconcilable for Router {
    type Deps = RouterDeps;
    type Actuator = RouterActuator;

    fn dependency_refs(&self) -> Vec<(String, String)> {
        let Some(resource) = &self.spec.resource else {
            return Vec::new();
        };
        resource
            .external_gateway
            .iter()
            .map(|gw| (Network::label_kind(), gw.network_ref.clone()))
            .chain(
                resource
                    .port_refs
                    .iter()
                    .map(|name| (Port::label_kind(), name.clone())),
            )
            .collect()
    }

    async fn resolve_dependencies(
        &self,
        deps: &mut Dependencies<'_>,
    ) -> Result<RouterDeps, OrcError> {
        let mut resolved = RouterDeps::default();
        if let Some(resource) = &self.spec.resource {
            if let Some(gateway) = &resource.external_gateway {
                resolved.gateway_network_id = deps.id_of::<Network>(&gateway.network_ref).await?;
            }
            resolved.port_ids = deps.ids_of::<Port>(&resource.port_refs).await?;
        }
        Ok(resolved)
    }

    fn actuator(
        obj: Arc<Self>,
        clients: Arc<CloudClients>,
        deps: RouterDeps,
    ) -> Result<RouterActuator, OrcError> {
        Ok(RouterActuator::new(obj, clients.network()?.clone(), deps))
    }
}

#[cfg(test)]
#[path = "router_tests.rs"]
mod router_tests;
