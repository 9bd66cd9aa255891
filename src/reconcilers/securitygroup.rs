// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `SecurityGroup` actuator (Neutron security groups).
//!
//! Rules are managed by `SecurityGroupRule` objects, not here. Statefulness is
//! fixed at creation.

use crate::crd::{SecurityGroup, SecurityGroupResourceSpec, SecurityGroupResourceStatus};
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

pub struct SecurityGroupActuator {
    obj: Arc<SecurityGroup>,
    client: NetworkClient,
}

impl SecurityGroupActuator {
    #[must_use]
    pub fn new(obj: Arc<SecurityGroup>, client: NetworkClient) -> Self {
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
pub fn create_attributes(name: &str, resource: &SecurityGroupResourceSpec) -> Value {
    let mut attrs = Map::new();
    attrs.insert("name".into(), json!(name));
    if let Some(description) = &resource.description {
        attrs.insert("description".into(), json!(description));
    }
    if let Some(stateful) = resource.stateful {
        attrs.insert("stateful".into(), json!(stateful));
    }
    Value::Object(attrs)
}

#[must_use]
pub fn update_attributes(
    name: &str,
    resource: &SecurityGroupResourceSpec,
    observed: &neutron::SecurityGroup,
) -> Option<Value> {
    let mut attrs = Map::new();
    if name != observed.name {
        attrs.insert("name".into(), json!(name));
    }
    if differs(resource.description.as_ref(), &observed.description) {
        attrs.insert("description".into(), json!(resource.description));
    }
    (!attrs.is_empty()).then_some(Value::Object(attrs))
}

/// Statefulness cannot change in place. Unset means stateful on both sides.
#[must_use]
pub fn stateful_matches(
    resource: &SecurityGroupResourceSpec,
    group: &neutron::SecurityGroup,
) -> bool {
    resource.stateful.unwrap_or(true) == group.stateful.unwrap_or(true)
}

#[must_use]
pub fn security_group_status(group: &neutron::SecurityGroup) -> SecurityGroupResourceStatus {
    SecurityGroupResourceStatus {
        name: group.name.clone(),
        description: group.description.clone(),
        project_id: group.project_id.clone(),
        // Neutron omits the attribute when the stateful extension is off.
        stateful: group.stateful.unwrap_or(true),
        rule_ids: group
            .security_group_rules
            .iter()
            .map(|r| r.id.clone())
            .collect(),
        tags: group.tags.clone(),
        created_at: normalize_opt_timestamp(group.created_at.as_deref()),
        updated_at: normalize_opt_timestamp(group.updated_at.as_deref()),
    }
}

#[async_trait]
impl Actuator for SecurityGroupActuator {
    type Resource = neutron::SecurityGroup;

    fn identity(&self) -> ResourceIdentity {
        self.obj.identity()
    }

    fn extract_id(&self, resource: &neutron::SecurityGroup) -> String {
        resource.id.clone()
    }

    async fn get_by_id(&self, id: &str) -> Result<neutron::SecurityGroup, OrcError> {
        Ok(self.client.get(collection::SECURITY_GROUPS, id).await?)
    }

    async fn get_by_import_filter(&self) -> Result<Lookup<neutron::SecurityGroup>, OrcError> {
        let Some(filter) = self.obj.spec.import.as_ref().and_then(|i| i.filter.as_ref()) else {
            return Ok(Lookup::Skipped);
        };
        let query = Query::new()
            .opt("name", filter.name.as_ref())
            .opt("description", filter.description.as_ref())
            .opt("project_id", filter.project_id.as_ref())
            .tags("tags", &filter.tags);
        import_lookup(self.client.list(collection::SECURITY_GROUPS, &query).await?)
    }

    async fn get_by_spec(
        &self,
        claimed: &HashSet<String>,
    ) -> Result<Option<neutron::SecurityGroup>, OrcError> {
        let Some(resource) = &self.obj.spec.resource else {
            return Ok(None);
        };
        let project_id = self.client.project_id().await?;
        let query = Query::new()
            .push("name", self.name())
            .opt("project_id", project_id);
        let candidates: Vec<neutron::SecurityGroup> =
            self.client.list(collection::SECURITY_GROUPS, &query).await?;
        single_match(
            "security group",
            unclaimed(candidates, claimed, |g| g.id.as_str())
                .into_iter()
                .filter(|g| stateful_matches(resource, g))
                .collect(),
        )
    }

    async fn create(&self) -> Result<Created<neutron::SecurityGroup>, OrcError> {
        let resource = self.obj.spec.resource.as_ref().ok_or_else(missing_resource)?;
        let mut group: neutron::SecurityGroup = self
            .client
            .create(collection::SECURITY_GROUPS, create_attributes(&self.name(), resource))
            .await?;
        if !resource.tags.is_empty() {
            self.client
                .replace_tags(collection::SECURITY_GROUPS, &group.id, &resource.tags)
                .await?;
            group.tags.clone_from(&resource.tags);
        }
        Ok(Created::done(group))
    }

    fn planned_updates<'a>(&'a self, observed: &'a neutron::SecurityGroup) -> Vec<UpdateStep<'a>> {
        let Some(resource) = &self.obj.spec.resource else {
            return Vec::new();
        };
        let mut steps = Vec::new();
        if let Some(attrs) = update_attributes(&self.name(), resource, observed) {
            steps.push(step(async move {
                self.client
                    .update::<Value>(collection::SECURITY_GROUPS, &observed.id, attrs)
                    .await
                    .map(drop)
            }));
        }
        if !list_content_equals(&resource.tags, &observed.tags) {
            steps.push(step(self.client.replace_tags(
                collection::SECURITY_GROUPS,
                &observed.id,
                &resource.tags,
            )));
        }
        steps
    }

    async fn delete(&self, observed: &neutron::SecurityGroup) -> Result<(), OrcError> {
        Ok(self
            .client
            .delete(collection::SECURITY_GROUPS, &observed.id)
            .await?)
    }

    fn is_ready(&self, _resource: &neutron::SecurityGroup) -> bool {
        true
    }

    fn resource_status(&self, resource: &neutron::SecurityGroup) -> Result<Value, OrcError> {
        mirror(&security_group_status(resource))
    }
}

#[async_trait]
impl Reconcilable for SecurityGroup {
    type Deps = ();
    type Actuator = SecurityGroupActuator;

    async fn resolve_dependencies(&self, _deps: &mut Dependencies<'_>) -> Result<(), OrcError> {
        Ok(())
    }

    fn actuator(
        obj: Arc<Self>,
        clients: Arc<CloudClients>,
        _deps: (),
    ) -> Result<SecurityGroupActuator, OrcError> {
        Ok(SecurityGroupActuator::new(obj, clients.network()?.clone()))
    }
}

#[cfg(test)]
#[path = "securitygroup_tests.rs"]
mod securitygroup_tests;
