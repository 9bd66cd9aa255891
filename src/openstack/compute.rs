// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Nova (compute v2.1) API: flavors, keypairs and servers.

use crate::openstack::client::{Query, ServiceClient};
use crate::openstack::error::OpenStackError;
use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Nova task state of a server being torn down.
pub const TASK_STATE_DELETING: &str = "deleting";

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Flavor {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub ram: i64,
    #[serde(default)]
    pub vcpus: i64,
    #[serde(default)]
    pub disk: i64,
    /// Nova reports no swap as an empty string before microversion 2.75.
    #[serde(default, deserialize_with = "int_or_empty")]
    pub swap: i64,
    #[serde(rename = "OS-FLV-EXT-DATA:ephemeral", default)]
    pub ephemeral: i64,
    #[serde(default)]
    pub rxtx_factor: f64,
    #[serde(rename = "os-flavor-access:is_public", default = "default_true")]
    pub is_public: bool,
    pub description: Option<String>,
}

fn default_true() -> bool {
    true
}

fn int_or_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Number(n) => Ok(n.as_i64().unwrap_or_default()),
        Value::String(s) if s.is_empty() => Ok(0),
        Value::String(s) => s.parse().map_err(serde::de::Error::custom),
        _ => Ok(0),
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct KeyPair {
    pub name: String,
    #[serde(default)]
    pub public_key: String,
    #[serde(default)]
    pub fingerprint: String,
    #[serde(rename = "type", default)]
    pub key_type: String,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ServerFault {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

/// Flavor as embedded in a server since microversion 2.47.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ServerFlavor {
    #[serde(default)]
    pub original_name: String,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Server {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(rename = "hostId", default)]
    pub host_id: String,
    #[serde(default)]
    pub tenant_id: String,
    /// `{"id": ...}`, or an empty string for volume-backed servers.
    #[serde(default)]
    pub image: Value,
    #[serde(default)]
    pub flavor: ServerFlavor,
    pub key_name: Option<String>,
    #[serde(rename = "accessIPv4", default)]
    pub access_ipv4: String,
    #[serde(rename = "accessIPv6", default)]
    pub access_ipv6: String,
    #[serde(rename = "OS-EXT-STS:task_state")]
    pub task_state: Option<String>,
    #[serde(rename = "OS-EXT-AZ:availability_zone")]
    pub availability_zone: Option<String>,
    pub fault: Option<ServerFault>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created: Option<String>,
    pub updated: Option<String>,
}

impl Server {
    /// Image id the server booted from, if any.
    #[must_use]
    pub fn image_id(&self) -> Option<&str> {
        self.image.get("id").and_then(Value::as_str)
    }
}

/// Nova API client.
#[derive(Clone)]
pub struct ComputeClient {
    client: ServiceClient,
}

impl ComputeClient {
    #[must_use]
    pub fn new(client: ServiceClient) -> Self {
        Self { client }
    }

    /// # Errors
    ///
    /// Returns [`OpenStackError::NotFound`] when the flavor does not exist.
    pub async fn get_flavor(&self, id: &str) -> Result<Flavor, OpenStackError> {
        self.client.get_wrapped(&format!("flavors/{id}"), "flavor").await
    }

    /// All flavors visible to the project, public and private.
    ///
    /// # Errors
    ///
    /// Returns the HTTP or decode error.
    pub async fn list_flavors(&self) -> Result<Vec<Flavor>, OpenStackError> {
        self.client
            .list("flavors/detail", &Query::new().push("is_public", "None"), "flavors")
            .await
    }

    /// # Errors
    ///
    /// Returns the HTTP or decode error.
    pub async fn create_flavor(&self, attributes: Value) -> Result<Flavor, OpenStackError> {
        let response: Value = self
            .client
            .post("flavors", &json!({ "flavor": attributes }))
            .await?;
        crate::openstack::client::unwrap_key(response, "flavor")
    }

    /// # Errors
    ///
    /// Returns [`OpenStackError::NotFound`] if the flavor is already gone.
    pub async fn delete_flavor(&self, id: &str) -> Result<(), OpenStackError> {
        self.client.delete(&format!("flavors/{id}")).await
    }

    /// # Errors
    ///
    /// Returns [`OpenStackError::NotFound`] when the keypair does not exist.
    pub async fn get_keypair(&self, name: &str) -> Result<KeyPair, OpenStackError> {
        self.client
            .get_wrapped(&format!("os-keypairs/{name}"), "keypair")
            .await
    }

    /// # Errors
    ///
    /// Returns the HTTP or decode error.
    pub async fn list_keypairs(&self) -> Result<Vec<KeyPair>, OpenStackError> {
        #[derive(Deserialize)]
        struct Wrapped {
            keypair: KeyPair,
        }
        let wrapped: Vec<Wrapped> = self
            .client
            .list("os-keypairs", &Query::new(), "keypairs")
            .await?;
        Ok(wrapped.into_iter().map(|w| w.keypair).collect())
    }

    /// # Errors
    ///
    /// Returns the HTTP or decode error; 409 when the name is taken.
    pub async fn create_keypair(&self, attributes: Value) -> Result<KeyPair, OpenStackError> {
        let response: Value = self
            .client
            .post("os-keypairs", &json!({ "keypair": attributes }))
            .await?;
        crate::openstack::client::unwrap_key(response, "keypair")
    }

    /// # Errors
    ///
    /// Returns [`OpenStackError::NotFound`] if the keypair is already gone.
    pub async fn delete_keypair(&self, name: &str) -> Result<(), OpenStackError> {
        self.client.delete(&format!("os-keypairs/{name}")).await
    }

    /// # Errors
    ///
    /// Returns [`OpenStackError::NotFound`] when the server does not exist.
    pub async fn get_server(&self, id: &str) -> Result<Server, OpenStackError> {
        self.client.get_wrapped(&format!("servers/{id}"), "server").await
    }

    /// Servers matching `query`. Pagination links are followed.
    ///
    /// # Errors
    ///
    /// Returns the HTTP or decode error.
    pub async fn list_servers(&self, query: &Query) -> Result<Vec<Server>, OpenStackError> {
        self.client.list("servers/detail", query, "servers").await
    }

    /// Servers whose name matches exactly, optionally carrying all of `tags`.
    ///
    /// Nova treats the `name` filter as a regular expression, so the name is
    /// anchored and escaped, and the result filtered again client-side.
    ///
    /// # Errors
    ///
    /// Returns the HTTP or decode error.
    pub async fn list_servers_named(
        &self,
        name: &str,
        tags: &[String],
    ) -> Result<Vec<Server>, OpenStackError> {
        let query = Query::new()
            .push("name", format!("^{}$", escape_regex(name)))
            .tags("tags", tags);
        let servers = self.list_servers(&query).await?;
        Ok(servers.into_iter().filter(|s| s.name == name).collect())
    }

    /// Boot a server. Nova returns only the id; callers fetch the full record.
    ///
    /// # Errors
    ///
    /// Returns the HTTP or decode error.
    pub async fn create_server(&self, attributes: Value) -> Result<String, OpenStackError> {
        #[derive(Deserialize)]
        struct Created {
            id: String,
        }
        let response: Value = self
            .client
            .post("servers", &json!({ "server": attributes }))
            .await?;
        let created: Created = crate::openstack::client::unwrap_key(response, "server")?;
        Ok(created.id)
    }

    /// # Errors
    ///
    /// Returns [`OpenStackError::NotFound`] if the server is already gone.
    pub async fn delete_server(&self, id: &str) -> Result<(), OpenStackError> {
        self.client.delete(&format!("servers/{id}")).await
    }
}

fn escape_regex(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if "\\.+*?()|[]{}^$".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
#[path = "compute_tests.rs"]
mod compute_tests;
