// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `SecurityGroupRule` actuator (Neutron security group rules).
//!
//! Rules are immutable. A rule is adopted only when every field matches,
//! including the ones left unset.

use crate::crd::{
    SecurityGroup, SecurityGroupRule, SecurityGroupRuleResourceSpec,
    SecurityGroupRuleResourceStatus,
};
use crate::errors::OrcError;
use crate::openstack::client::{normalize_opt_timestamp, Query};
use crate::openstack::network::{self as neutron, collection, NetworkClient};
use crate::openstack::CloudClients;
use crate::reconcilers::actuator::{Actuator, Created, Lookup, ResourceIdentity};
use crate::reconcilers::adapter::{
    import_lookup, mirror, missing_resource, required, single_match, unclaimed,
};
use crate::reconcilers::kind::{Dependencies, OrcObject, OrcResource, Reconcilable};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::sync::Arc;

/// Resolved sibling IDs of a rule.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SecurityGroupRuleDeps {
    pub security_group_id: Option<String>,
    pub remote_group_id: Option<String>,
    /// Group of `spec.import.filter`.
    pub filter_security_group_id: Option<String>,
}

pub struct SecurityGroupRuleActuator {
    obj: Arc<SecurityGroupRule>,
    client: NetworkClient,
    deps: SecurityGroupRuleDeps,
}

/// Sibling IDs of a rule once resolved.
struct RuleTarget<'a> {
    security_group_id: &'a str,
    remote_group_id: Option<&'a str>,
}

impl SecurityGroupRuleActuator {
    #[must_use]
    pub fn new(
        obj: Arc<SecurityGroupRule>,
        client: NetworkClient,
        deps: SecurityGroupRuleDeps,
    ) -> Self {
        Self { obj, client, deps }
    }

    fn target(&self, resource: &SecurityGroupRuleResourceSpec) -> Result<RuleTarget<'_>, OrcError> {
        let security_group_id = required(
            self.deps.security_group_id.as_ref(),
            SecurityGroup::KIND,
            &resource.security_group_ref,
        )?;
        let remote_group_id = resource
            .remote_group_ref
            .as_ref()
            .map(|name| required(self.deps.remote_group_id.as_ref(), SecurityGroup::KIND, name))
            .transpose()?;
        Ok(RuleTarget {
            security_group_id,
            remote_group_id,
        })
    }
}

/// Create request attributes for `resource`.
#[must_use]
pub fn create_attributes(
    resource: &SecurityGroupRuleResourceSpec,
    security_group_id: &str,
    remote_group_id: Option<&str>,
) -> Value {
    let mut attrs = Map::new();
    attrs.insert("security_group_id".into(), json!(security_group_id));
    attrs.insert("direction".into(), json!(resource.direction));
    attrs.insert("ethertype".into(), json!(resource.ether_type));
    if let Some(protocol) = &resource.protocol {
        attrs.insert("protocol".into(), json!(protocol));
    }
    if let Some(min) = resource.port_range_min {
        attrs.insert("port_range_min".into(), json!(min));
    }
    if let Some(max) = resource.port_range_max {
        attrs.insert("port_range_max".into(), json!(max));
    }
    if let Some(prefix) = &resource.remote_ip_prefix {
        attrs.insert("remote_ip_prefix".into(), json!(prefix));
    }
    if let Some(remote_group_id) = remote_group_id {
        attrs.insert("remote_group_id".into(), json!(remote_group_id));
    }
    if let Some(description) = &resource.description {
        attrs.insert("description".into(), json!(description));
    }
    Value::Object(attrs)
}

/// Whether `rule` is exactly the rule `resource` would create.
#[must_use]
pub fn rule_matches(
    resource: &SecurityGroupRuleResourceSpec,
    remote_group_id: Option<&str>,
    rule: &neutron::SecurityGroupRule,
) -> bool {
    rule.direction == resource.direction
        && rule.ethertype == resource.ether_type
        && rule.protocol == resource.protocol
        && rule.port_range_min == resource.port_range_min
        && rule.port_range_max == resource.port_range_max
        && rule.remote_ip_prefix == resource.remote_ip_prefix
        && rule.remote_group_id.as_deref() == remote_group_id
}

#[must_use]
pub fn rule_status(rule: &neutron::SecurityGroupRule) -> SecurityGroupRuleResourceStatus {
    SecurityGroupRuleResourceStatus {
        security_group_id: rule.security_group_id.clone(),
        direction: rule.direction.clone(),
        ether_type: rule.ethertype.clone(),
        protocol: rule.protocol.clone(),
        port_range_min: rule.port_range_min,
        port_range_max: rule.port_range_max,
        remote_ip_prefix: rule.remote_ip_prefix.clone(),
        remote_group_id: rule.remote_group_id.clone(),
        description: rule.description.clone(),
        project_id: rule.project_id.clone(),
        created_at: normalize_opt_timestamp(rule.created_at.as_deref()),
    }
}

#[async_trait]
impl Actuator for SecurityGroupRuleActuator {
    type Resource = neutron::SecurityGroupRule;

    fn identity(&self) -> ResourceIdentity {
        self.obj.identity()
    }

    fn extract_id(&self, resource: &neutron::SecurityGroupRule) -> String {
        resource.id.clone()
    }

    async fn get_by_id(&self, id: &str) -> Result<neutron::SecurityGroupRule, OrcError> {
        Ok(self.client.get(collection::SECURITY_GROUP_RULES, id).await?)
    }

    async fn get_by_import_filter(&self) -> Result<Lookup<neutron::SecurityGroupRule>, OrcError> {
        let Some(filter) = self.obj.spec.import.as_ref().and_then(|i| i.filter.as_ref()) else {
            return Ok(Lookup::Skipped);
        };
        let security_group_id = match &filter.security_group_ref {
            Some(name) => Some(required(
                self.deps.filter_security_group_id.as_ref(),
                SecurityGroup::KIND,
                name,
            )?),
            None => None,
        };
        let query = Query::new()
            .opt("security_group_id", security_group_id)
            .opt("direction", filter.direction.as_ref())
            .opt("protocol", filter.protocol.as_ref())
            .opt("description", filter.description.as_ref());
        import_lookup(
            self.client
                .list(collection::SECURITY_GROUP_RULES, &query)
                .await?,
        )
    }

    async fn get_by_spec(
        &self,
        claimed: &HashSet<String>,
    ) -> Result<Option<neutron::SecurityGroupRule>, OrcError> {
        let Some(resource) = &self.obj.spec.resource else {
            return Ok(None);
        };
        let target = self.target(resource)?;
        let query = Query::new()
            .push("security_group_id", target.security_group_id)
            .push("direction", &resource.direction)
            .push("ethertype", &resource.ether_type)
            .opt("protocol", resource.protocol.as_ref())
            .opt("port_range_min", resource.port_range_min)
            .opt("port_range_max", resource.port_range_max)
            .opt("remote_ip_prefix", resource.remote_ip_prefix.as_ref())
            .opt("remote_group_id", target.remote_group_id);
        let candidates: Vec<neutron::SecurityGroupRule> = self
            .client
            .list(collection::SECURITY_GROUP_RULES, &query)
            .await?;
        single_match(
            "security group rule",
            unclaimed(candidates, claimed, |r| r.id.as_str())
                .into_iter()
                .filter(|r| rule_matches(resource, target.remote_group_id, r))
                .collect(),
        )
    }

    async fn create(&self) -> Result<Created<neutron::SecurityGroupRule>, OrcError> {
        let resource = self.obj.spec.resource.as_ref().ok_or_else(missing_resource)?;
        let target = self.target(resource)?;
        let attrs = create_attributes(resource, target.security_group_id, target.remote_group_id);
        let rule = self
            .client
            .create(collection::SECURITY_GROUP_RULES, attrs)
            .await?;
        Ok(Created::done(rule))
    }

    async fn delete(&self, observed: &neutron::SecurityGroupRule) -> Result<(), OrcError> {
        Ok(self
            .client
            .delete(collection::SECURITY_GROUP_RULES, &observed.id)
            .await?)
    }

    fn is_ready(&self, _resource: &neutron::SecurityGroupRule) -> bool {
        true
    }

    fn resource_status(&self, resource: &neutron::SecurityGroupRule) -> Result<Value, OrcError> {
        mirror(&rule_status(resource))
    }
}

#[async_trait]
impl Reconcilable for SecurityGroupRule {
    type Deps = SecurityGroupRuleDeps;
    type Actuator = SecurityGroupRuleActuator;

    fn dependency_refs(&self) -> Vec<(String, String)> {
        let mut refs = Vec::new();
        if let Some(resource) = &self.spec.resource {
            refs.push((SecurityGroup::label_kind(), resource.security_group_ref.clone()));
            if let Some(remote) = &resource.remote_group_ref {
                refs.push((SecurityGroup::label_kind(), remote.clone()));
            }
        }
        if let Some(name) = self
            .spec
            .import
            .as_ref()
            .and_then(|i| i.filter.as_ref())
            .and_then(|f| f.security_group_ref.as_ref())
        {
            refs.push((SecurityGroup::label_kind(), name.clone()));
        }
        refs
    }

    async fn resolve_dependencies(
        &self,
        deps: &mut Dependencies<'_>,
    ) -> Result<SecurityGroupRuleDeps, OrcError> {
        let mut resolved = SecurityGroupRuleDeps::default();
        if let Some(resource) = &self.spec.resource {
            resolved.security_group_id = deps
                .id_of::<SecurityGroup>(&resource.security_group_ref)
                .await?;
            if let Some(remote) = &resource.remote_group_ref {
                resolved.remote_group_id = deps.id_of::<SecurityGroup>(remote).await?;
            }
        }
        let filter_ref = self
            .spec
            .import
            .as_ref()
            .and_then(|i| i.filter.as_ref())
            .and_then(|f| f.security_group_ref.as_ref());
        if let Some(name) = filter_ref {
            resolved.filter_security_group_id = deps.id_of::<SecurityGroup>(name).await?;
        }
        Ok(resolved)
    }

    fn actuator(
        obj: Arc<Self>,
        clients: Arc<CloudClients>,
        deps: SecurityGroupRuleDeps,
    ) -> Result<SecurityGroupRuleActuator, OrcError> {
        Ok(SecurityGroupRuleActuator::new(
            obj,
            clients.network()?.clone(),
            deps,
        ))
    }
}

#[cfg(test)]
#[path = "securitygrouprule_tests.rs"]
mod securitygrouprule_tests;
