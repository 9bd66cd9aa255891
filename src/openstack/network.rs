// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Neutron (networking v2.0) API.

use crate::openstack::client::{unwrap_key, Query, ServiceClient};
use crate::openstack::error::OpenStackError;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

/// Neutron device owner prefix of router interface ports.
pub const DEVICE_OWNER_ROUTER_INTERFACE: &str = "network:router_interface";

/// Neutron collection path and JSON key pairs.
pub mod collection {
    pub const NETWORKS: (&str, &str) = ("networks", "network");
    pub const SUBNETS: (&str, &str) = ("subnets", "subnet");
    pub const PORTS: (&str, &str) = ("ports", "port");
    pub const ROUTERS: (&str, &str) = ("routers", "router");
    pub const FLOATING_IPS: (&str, &str) = ("floatingips", "floatingip");
    pub const SECURITY_GROUPS: (&str, &str) = ("security-groups", "security_group");
    pub const SECURITY_GROUP_RULES: (&str, &str) =
        ("security-group-rules", "security_group_rule");
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Network {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub admin_state_up: bool,
    #[serde(default)]
    pub shared: bool,
    #[serde(rename = "router:external", default)]
    pub external: bool,
    #[serde(default)]
    pub status: String,
    pub mtu: Option<i32>,
    pub dns_domain: Option<String>,
    pub port_security_enabled: Option<bool>,
    #[serde(default)]
    pub availability_zone_hints: Vec<String>,
    #[serde(default)]
    pub availability_zones: Vec<String>,
    #[serde(default)]
    pub subnets: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub project_id: String,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct AllocationPool {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct HostRoute {
    pub destination: String,
    pub nexthop: String,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Subnet {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub network_id: String,
    #[serde(default)]
    pub cidr: String,
    #[serde(default)]
    pub ip_version: i32,
    pub gateway_ip: Option<String>,
    #[serde(default)]
    pub enable_dhcp: bool,
    #[serde(default)]
    pub dns_nameservers: Vec<String>,
    #[serde(default)]
    pub allocation_pools: Vec<AllocationPool>,
    #[serde(default)]
    pub host_routes: Vec<HostRoute>,
    pub ipv6_address_mode: Option<String>,
    pub ipv6_ra_mode: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub project_id: String,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct FixedIp {
    pub subnet_id: String,
    pub ip_address: String,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct AddressPair {
    pub ip_address: String,
    pub mac_address: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Port {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub network_id: String,
    #[serde(default)]
    pub admin_state_up: bool,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub mac_address: String,
    #[serde(default)]
    pub fixed_ips: Vec<FixedIp>,
    #[serde(default)]
    pub security_groups: Vec<String>,
    #[serde(default)]
    pub allowed_address_pairs: Vec<AddressPair>,
    #[serde(default)]
    pub device_id: String,
    #[serde(default)]
    pub device_owner: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub project_id: String,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct GatewayInfo {
    pub network_id: String,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Router {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub admin_state_up: bool,
    #[serde(default)]
    pub status: String,
    pub distributed: Option<bool>,
    pub external_gateway_info: Option<GatewayInfo>,
    #[serde(default)]
    pub availability_zone_hints: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub project_id: String,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct FloatingIp {
    pub id: String,
    #[serde(default)]
    pub floating_ip_address: String,
    #[serde(default)]
    pub floating_network_id: String,
    pub fixed_ip_address: Option<String>,
    pub port_id: Option<String>,
    pub router_id: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub project_id: String,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct SecurityGroupRule {
    pub id: String,
    #[serde(default)]
    pub security_group_id: String,
    #[serde(default)]
    pub direction: String,
    #[serde(default)]
    pub ethertype: String,
    pub protocol: Option<String>,
    pub port_range_min: Option<i32>,
    pub port_range_max: Option<i32>,
    pub remote_ip_prefix: Option<String>,
    pub remote_group_id: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub project_id: String,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct SecurityGroup {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub stateful: Option<bool>,
    #[serde(default)]
    pub security_group_rules: Vec<SecurityGroupRule>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub project_id: String,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Neutron API client.
#[derive(Clone)]
pub struct NetworkClient {
    client: ServiceClient,
}

impl NetworkClient {
    #[must_use]
    pub fn new(client: ServiceClient) -> Self {
        Self { client }
    }

    /// Project the cloud credentials are scoped to.
    ///
    /// # Errors
    ///
    /// Returns the authentication error.
    pub async fn project_id(&self) -> Result<Option<String>, OpenStackError> {
        self.client.project_id().await
    }

    /// Fetch one object of a collection by id.
    ///
    /// # Errors
    ///
    /// Returns [`OpenStackError::NotFound`] when the id does not exist.
    pub async fn get<T: DeserializeOwned>(
        &self,
        (path, key): (&str, &str),
        id: &str,
    ) -> Result<T, OpenStackError> {
        self.client.get_wrapped(&format!("{path}/{id}"), key).await
    }

    /// List a collection with filters.
    ///
    /// # Errors
    ///
    /// Returns the HTTP or decode error.
    pub async fn list<T: DeserializeOwned>(
        &self,
        (path, _key): (&str, &str),
        query: &Query,
    ) -> Result<Vec<T>, OpenStackError> {
        // Neutron names the list key after the path with underscores.
        self.client
            .list(path, query, &path.replace('-', "_"))
            .await
    }

    /// Create an object from its attribute map.
    ///
    /// # Errors
    ///
    /// Returns the HTTP or decode error.
    pub async fn create<T: DeserializeOwned>(
        &self,
        (path, key): (&str, &str),
        attributes: Value,
    ) -> Result<T, OpenStackError> {
        let response: Value = self.client.post(path, &json!({ key: attributes })).await?;
        unwrap_key(response, key)
    }

    /// Update the attributes present in `attributes`.
    ///
    /// # Errors
    ///
    /// Returns the HTTP or decode error.
    pub async fn update<T: DeserializeOwned>(
        &self,
        (path, key): (&str, &str),
        id: &str,
        attributes: Value,
    ) -> Result<T, OpenStackError> {
        let response: Value = self
            .client
            .put(&format!("{path}/{id}"), &json!({ key: attributes }))
            .await?;
        unwrap_key(response, key)
    }

    /// # Errors
    ///
    /// Returns [`OpenStackError::NotFound`] if the object is already gone.
    pub async fn delete(&self, (path, _key): (&str, &str), id: &str) -> Result<(), OpenStackError> {
        self.client.delete(&format!("{path}/{id}")).await
    }

    /// Replace the full tag set of an object.
    ///
    /// # Errors
    ///
    /// Returns the HTTP error.
    pub async fn replace_tags(
        &self,
        (path, _key): (&str, &str),
        id: &str,
        tags: &[String],
    ) -> Result<(), OpenStackError> {
        let _: Value = self
            .client
            .put(&format!("{path}/{id}/tags"), &json!({ "tags": tags }))
            .await?;
        Ok(())
    }

    /// Attach a port to a router as an interface.
    ///
    /// # Errors
    ///
    /// Returns the HTTP error; 409 when the port is in use elsewhere.
    pub async fn add_router_interface(
        &self,
        router_id: &str,
        port_id: &str,
    ) -> Result<(), OpenStackError> {
        let _: Value = self
            .client
            .put(
                &format!("routers/{router_id}/add_router_interface"),
                &json!({ "port_id": port_id }),
            )
            .await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`OpenStackError::NotFound`] if the port is not attached.
    pub async fn remove_router_interface(
        &self,
        router_id: &str,
        port_id: &str,
    ) -> Result<(), OpenStackError> {
        let _: Value = self
            .client
            .put(
                &format!("routers/{router_id}/remove_router_interface"),
                &json!({ "port_id": port_id }),
            )
            .await?;
        Ok(())
    }

    /// Router interface ports of a router, gateway port excluded.
    ///
    /// # Errors
    ///
    /// Returns the HTTP or decode error.
    pub async fn router_interface_ports(&self, router_id: &str) -> Result<Vec<Port>, OpenStackError> {
        let ports: Vec<Port> = self
            .list(collection::PORTS, &Query::new().push("device_id", router_id))
            .await?;
        Ok(ports
            .into_iter()
            .filter(|p| p.device_owner.starts_with(DEVICE_OWNER_ROUTER_INTERFACE))
            .collect())
    }
}

#[cfg(test)]
#[path = "network_tests.rs"]
mod network_tests;
