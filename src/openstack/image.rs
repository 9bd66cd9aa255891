// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Glance (image v2) API.

use crate::openstack::client::{Query, ServiceClient};
use crate::openstack::error::OpenStackError;
use serde::Deserialize;
use serde_json::{json, Value};

pub const STATUS_ACTIVE: &str = "active";
pub const STATUS_QUEUED: &str = "queued";
pub const STATUS_KILLED: &str = "killed";

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Image {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub visibility: String,
    #[serde(default)]
    pub protected: bool,
    pub container_format: Option<String>,
    pub disk_format: Option<String>,
    #[serde(default)]
    pub min_disk: i64,
    #[serde(default)]
    pub min_ram: i64,
    pub checksum: Option<String>,
    pub size: Option<i64>,
    pub virtual_size: Option<i64>,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// One JSON-patch operation for [`ImageClient::update_image`].
#[must_use]
pub fn replace_op(attribute: &str, value: Value) -> Value {
    json!({ "op": "replace", "path": format!("/{attribute}"), "value": value })
}

/// Glance API client.
#[derive(Clone)]
pub struct ImageClient {
    client: ServiceClient,
}

impl ImageClient {
    #[must_use]
    pub fn new(client: ServiceClient) -> Self {
        Self { client }
    }

    /// # Errors
    ///
    /// Returns [`OpenStackError::NotFound`] when the image does not exist.
    pub async fn get_image(&self, id: &str) -> Result<Image, OpenStackError> {
        self.client.get(&format!("images/{id}")).await
    }

    /// # Errors
    ///
    /// Returns the HTTP or decode error.
    pub async fn list_images(&self, query: &Query) -> Result<Vec<Image>, OpenStackError> {
        self.client.list("images", query, "images").await
    }

    /// Create an image record. Data arrives later through an import.
    ///
    /// # Errors
    ///
    /// Returns the HTTP or decode error.
    pub async fn create_image(&self, attributes: &Value) -> Result<Image, OpenStackError> {
        self.client.post("images", attributes).await
    }

    /// Apply JSON-patch `operations`.
    ///
    /// # Errors
    ///
    /// Returns the HTTP or decode error.
    pub async fn update_image(&self, id: &str, operations: &[Value]) -> Result<Image, OpenStackError> {
        self.client
            .patch_json(&format!("images/{id}"), &Value::Array(operations.to_vec()))
            .await
    }

    /// Start a `web-download` import of `url` into a queued image.
    ///
    /// # Errors
    ///
    /// Returns the HTTP error; 409 when the image is not queued.
    pub async fn import_web_download(&self, id: &str, url: &str) -> Result<(), OpenStackError> {
        self.client
            .post_no_content(
                &format!("images/{id}/import"),
                &json!({ "method": { "name": "web-download", "uri": url } }),
            )
            .await
    }

    /// # Errors
    ///
    /// Returns [`OpenStackError::NotFound`] if the image is already gone.
    pub async fn delete_image(&self, id: &str) -> Result<(), OpenStackError> {
        self.client.delete(&format!("images/{id}")).await
    }
}

#[cfg(test)]
#[path = "image_tests.rs"]
mod image_tests;
