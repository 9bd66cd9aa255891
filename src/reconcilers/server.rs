// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `Server` actuator (Nova servers).
//!
//! A server boots from an `Image` with a `Flavor`, attaches `Port`s in order
//! and optionally injects a `KeyPair`. Servers are never updated in place. A
//! server in `ERROR` state is reported as unrecoverable.

use crate::constants::EXTERNAL_UPDATE_POLL_SECS;
use crate::crd::{Flavor, Image, KeyPair, Port, Server, ServerResourceSpec, ServerResourceStatus};
use crate::errors::OrcError;
use crate::openstack::client::{normalize_opt_timestamp, Query};
use crate::openstack::compute::{self as nova, ComputeClient, TASK_STATE_DELETING};
use crate::openstack::CloudClients;
use crate::reconcilers::actuator::{Actuator, Created, Lookup, ResourceIdentity};
use crate::reconcilers::adapter::{
    import_lookup, mirror, missing_resource, required, resource_name, single_match, unclaimed,
};
use crate::reconcilers::kind::{Dependencies, OrcObject, OrcResource, Reconcilable};
use crate::reconcilers::wait::{OpenStackPhase, WaitEvent};
use anyhow::anyhow;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use kube::ResourceExt;
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

pub const STATUS_ACTIVE: &str = "ACTIVE";
pub const STATUS_ERROR: &str = "ERROR";

/// Resolved sibling IDs of a server.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ServerDeps {
    pub image_id: Option<String>,
    pub flavor_id: Option<String>,
    pub port_ids: Option<Vec<String>>,
    /// Nova identifies keypairs by name, which is what `status.id` holds.
    pub key_name: Option<String>,
}

pub struct ServerActuator {
    obj: Arc<Server>,
    client: ComputeClient,
    deps: ServerDeps,
}

/// What a server boots with.
#[derive(Debug)]
pub struct BootSource<'a> {
    pub image_id: &'a str,
    pub flavor_id: &'a str,
    pub port_ids: &'a [String],
    pub key_name: Option<&'a str>,
}

impl ServerActuator {
    #[must_use]
    pub fn new(obj: Arc<Server>, client: ComputeClient, deps: ServerDeps) -> Self {
        Self { obj, client, deps }
    }

    fn name(&self) -> String {
        resource_name(
            &self.obj.name_any(),
            self.obj.spec.resource.as_ref().and_then(|r| r.name.as_ref()),
        )
    }

    fn boot_source(&self, resource: &ServerResourceSpec) -> Result<BootSource<'_>, OrcError> {
        let image_id = required(self.deps.image_id.as_ref(), Image::KIND, &resource.image_ref)?;
        let flavor_id = required(
            self.deps.flavor_id.as_ref(),
            Flavor::KIND,
            &resource.flavor_ref,
        )?;
        let port_ids = self
            .deps
            .port_ids
            .as_deref()
            .ok_or_else(|| OrcError::from(anyhow!("{} of server are not resolved", Port::KIND)))?;
        let key_name = resource
            .key_pair_ref
            .as_ref()
            .map(|name| required(self.deps.key_name.as_ref(), KeyPair::KIND, name))
            .transpose()?;
        Ok(BootSource {
            image_id,
            flavor_id,
            port_ids,
            key_name,
        })
    }
}

/// Create request attributes. User data is sent base64-encoded.
#[must_use]
pub fn create_attributes(
    name: &str,
    resource: &ServerResourceSpec,
    boot: &BootSource<'_>,
) -> Value {
    let mut attrs = Map::new();
    attrs.insert("name".into(), json!(name));
    attrs.insert("imageRef".into(), json!(boot.image_id));
    attrs.insert("flavorRef".into(), json!(boot.flavor_id));
    if boot.port_ids.is_empty() {
        attrs.insert("networks".into(), json!("none"));
    } else {
        let networks = boot.port_ids.iter().map(|id| json!({ "port": id })).collect();
        attrs.insert("networks".into(), Value::Array(networks));
    }
    if let Some(key_name) = boot.key_name {
        attrs.insert("key_name".into(), json!(key_name));
    }
    if let Some(user_data) = &resource.user_data {
        attrs.insert("user_data".into(), json!(BASE64.encode(user_data)));
    }
    if let Some(zone) = &resource.availability_zone {
        attrs.insert("availability_zone".into(), json!(zone));
    }
    if !resource.metadata.is_empty() {
        attrs.insert("metadata".into(), json!(resource.metadata));
    }
    if !resource.tags.is_empty() {
        attrs.insert("tags".into(), json!(resource.tags));
    }
    Value::Object(attrs)
}

#[must_use]
pub fn server_status(server: &nova::Server) -> ServerResourceStatus {
    let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
    ServerResourceStatus {
        name: server.name.clone(),
        status: server.status.clone(),
        host_id: server.host_id.clone(),
        project_id: server.tenant_id.clone(),
        image_id: server.image_id().map(str::to_string),
        flavor_name: non_empty(&server.flavor.original_name),
        key_name: server.key_name.clone(),
        access_ipv4: non_empty(&server.access_ipv4),
        access_ipv6: non_empty(&server.access_ipv6),
        task_state: server.task_state.clone(),
        fault: server.fault.as_ref().map(|f| f.message.clone()),
        tags: server.tags.clone(),
        created_at: normalize_opt_timestamp(server.created.as_deref()),
        updated_at: normalize_opt_timestamp(server.updated.as_deref()),
    }
}

#[async_trait]
impl Actuator for ServerActuator {
    type Resource = nova::Server;

    fn identity(&self) -> ResourceIdentity {
        self.obj.identity()
    }

    fn extract_id(&self, resource: &nova::Server) -> String {
        resource.id.clone()
    }

    async fn get_by_id(&self, id: &str) -> Result<nova::Server, OrcError> {
        Ok(self.client.get_server(id).await?)
    }

    async fn get_by_import_filter(&self) -> Result<Lookup<nova::Server>, OrcError> {
        let Some(filter) = self.obj.spec.import.as_ref().and_then(|i| i.filter.as_ref()) else {
            return Ok(Lookup::Skipped);
        };
        let servers = match &filter.name {
            Some(name) => self.client.list_servers_named(name, &filter.tags).await?,
            None => {
                let query = Query::new().tags("tags", &filter.tags);
                self.client.list_servers(&query).await?
            }
        };
        import_lookup(servers)
    }

    async fn get_by_spec(
        &self,
        claimed: &HashSet<String>,
    ) -> Result<Option<nova::Server>, OrcError> {
        if self.obj.spec.resource.is_none() {
            return Ok(None);
        }
        let candidates = self.client.list_servers_named(&self.name(), &[]).await?;
        single_match("server", unclaimed(candidates, claimed, |s| s.id.as_str()))
    }

    async fn create(&self) -> Result<Created<nova::Server>, OrcError> {
        let resource = self.obj.spec.resource.as_ref().ok_or_else(missing_resource)?;
        let boot = self.boot_source(resource)?;
        let id = self
            .client
            .create_server(create_attributes(&self.name(), resource, &boot))
            .await?;
        let server = self.client.get_server(&id).await?;
        Ok(Created::done(server))
    }

    async fn delete(&self, observed: &nova::Server) -> Result<(), OrcError> {
        Ok(self.client.delete_server(&observed.id).await?)
    }

    fn is_ready(&self, resource: &nova::Server) -> bool {
        resource.status == STATUS_ACTIVE
    }

    fn progress(&self, resource: &nova::Server) -> Result<Vec<WaitEvent>, OrcError> {
        if resource.status == STATUS_ERROR {
            let fault = resource
                .fault
                .as_ref()
                .map_or("no fault reported", |f| f.message.as_str());
            return Err(OrcError::unrecoverable(format!(
                "server {} is in {STATUS_ERROR} state: {fault}",
                resource.id
            )));
        }
        if self.is_ready(resource) {
            return Ok(Vec::new());
        }
        Ok(vec![WaitEvent::openstack(
            OpenStackPhase::Ready,
            Duration::from_secs(EXTERNAL_UPDATE_POLL_SECS),
        )])
    }

    fn deletion_in_progress(&self, resource: &nova::Server) -> bool {
        resource.task_state.as_deref() == Some(TASK_STATE_DELETING)
    }

    fn resource_status(&self, resource: &nova::Server) -> Result<Value, OrcError> {
        mirror(&server_status(resource))
    }
}

#[async_trait]
impl Reconcilable for Server {
    type Deps = ServerDeps;
    type Actuator = ServerActuator;

    fn dependency_refs(&self) -> Vec<(String, String)> {
        let Some(resource) = &self.spec.resource else {
            return Vec::new();
        };
        let mut refs = vec![
            (Image::label_kind(), resource.image_ref.clone()),
            (Flavor::label_kind(), resource.flavor_ref.clone()),
        ];
        refs.extend(
            resource
                .port_refs
                .iter()
                .map(|name| (Port::label_kind(), name.clone())),
        );
        if let Some(name) = &resource.key_pair_ref {
            refs.push((KeyPair::label_kind(), name.clone()));
        }
        refs
    }

    async fn resolve_dependencies(
        &self,
        deps: &mut Dependencies<'_>,
    ) -> Result<ServerDeps, OrcError> {
        let Some(resource) = &self.spec.resource else {
            return Ok(ServerDeps::default());
        };
        Ok(ServerDeps {
            image_id: deps.id_of::<Image>(&resource.image_ref).await?,
            flavor_id: deps.id_of::<Flavor>(&resource.flavor_ref).await?,
            port_ids: deps.ids_of::<Port>(&resource.port_refs).await?,
            key_name: match &resource.key_pair_ref {
                Some(name) => deps.id_of::<KeyPair>(name).await?,
                None => None,
            },
        })
    }

    fn actuator(
        obj: Arc<Self>,
        clients: Arc<CloudClients>,
        deps: ServerDeps,
    ) -> Result<ServerActuator, OrcError> {
        Ok(ServerActuator::new(obj, clients.compute()?.clone(), deps))
    }
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod server_tests;
