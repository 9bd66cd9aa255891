// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `Image` actuator (Glance images).
//!
//! An image is created empty. When `spec.resource.webDownload` is set and the
//! image is still `queued`, a `web-download` import is started as an update
//! step; the actuator then polls until Glance reports `active`. An image in
//! `killed` state never recovers.

use crate::constants::{EXTERNAL_UPDATE_POLL_SECS, KIND_SERVER};
use crate::crd::{Image, ImageResourceSpec, ImageResourceStatus};
use crate::errors::OrcError;
use crate::openstack::client::{normalize_opt_timestamp, Query};
use crate::openstack::image::{
    self as glance, replace_op, ImageClient, STATUS_ACTIVE, STATUS_KILLED, STATUS_QUEUED,
};
use crate::openstack::CloudClients;
use crate::reconcilers::actuator::{Actuator, Created, Lookup, ResourceIdentity, UpdateStep};
use crate::reconcilers::adapter::{
    import_lookup, mirror, missing_resource, resource_name, single_match, step, unclaimed,
};
use crate::reconcilers::compare::list_content_equals;
use crate::reconcilers::kind::{Dependencies, OrcObject, Reconcilable};
use crate::reconcilers::wait::{OpenStackPhase, WaitEvent};
use async_trait::async_trait;
use kube::ResourceExt;
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

const REFERENCING_KINDS: &[&str] = &[KIND_SERVER];

pub struct ImageActuator {
    obj: Arc<Image>,
    client: ImageClient,
}

impl ImageActuator {
    #[must_use]
    pub fn new(obj: Arc<Image>, client: ImageClient) -> Self {
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
pub fn create_attributes(name: &str, resource: &ImageResourceSpec) -> Value {
    let mut attrs = Map::new();
    attrs.insert("name".into(), json!(name));
    attrs.insert("container_format".into(), json!(resource.container_format));
    attrs.insert("disk_format".into(), json!(resource.disk_format));
    if let Some(min_disk) = resource.min_disk {
        attrs.insert("min_disk".into(), json!(min_disk));
    }
    if let Some(min_ram) = resource.min_ram {
        attrs.insert("min_ram".into(), json!(min_ram));
    }
    if let Some(protected) = resource.protected {
        attrs.insert("protected".into(), json!(protected));
    }
    if let Some(visibility) = &resource.visibility {
        attrs.insert("visibility".into(), json!(visibility));
    }
    if !resource.tags.is_empty() {
        attrs.insert("tags".into(), json!(resource.tags));
    }
    Value::Object(attrs)
}

/// JSON-patch operations bringing `observed` in line with `resource`.
#[must_use]
pub fn update_operations(
    name: &str,
    resource: &ImageResourceSpec,
    observed: &glance::Image,
) -> Vec<Value> {
    let mut ops = Vec::new();
    if name != observed.name {
        ops.push(replace_op("name", json!(name)));
    }
    if !list_content_equals(&resource.tags, &observed.tags) {
        ops.push(replace_op("tags", json!(resource.tags)));
    }
    if let Some(protected) = resource.protected.filter(|p| *p != observed.protected) {
        ops.push(replace_op("protected", json!(protected)));
    }
    if let Some(visibility) = resource
        .visibility
        .as_ref()
        .filter(|v| **v != observed.visibility)
    {
        ops.push(replace_op("visibility", json!(visibility)));
    }
    if let Some(min_disk) = resource.min_disk.filter(|m| i64::from(*m) != observed.min_disk) {
        ops.push(replace_op("min_disk", json!(min_disk)));
    }
    if let Some(min_ram) = resource.min_ram.filter(|m| i64::from(*m) != observed.min_ram) {
        ops.push(replace_op("min_ram", json!(min_ram)));
    }
    ops
}

/// Whether `image` has the formats `resource` would create it with.
#[must_use]
pub fn formats_match(resource: &ImageResourceSpec, image: &glance::Image) -> bool {
    image.container_format.as_deref() == Some(resource.container_format.as_str())
        && image.disk_format.as_deref() == Some(resource.disk_format.as_str())
}

#[must_use]
pub fn image_status(image: &glance::Image) -> ImageResourceStatus {
    ImageResourceStatus {
        name: image.name.clone(),
        status: image.status.clone(),
        container_format: image.container_format.clone(),
        disk_format: image.disk_format.clone(),
        min_disk: i32::try_from(image.min_disk).unwrap_or(i32::MAX),
        min_ram: i32::try_from(image.min_ram).unwrap_or(i32::MAX),
        protected: image.protected,
        visibility: image.visibility.clone(),
        owner: image.owner.clone(),
        checksum: image.checksum.clone(),
        size: image.size,
        virtual_size: image.virtual_size,
        tags: image.tags.clone(),
        created_at: normalize_opt_timestamp(image.created_at.as_deref()),
        updated_at: normalize_opt_timestamp(image.updated_at.as_deref()),
    }
}

#[async_trait]
impl Actuator for ImageActuator {
    type Resource = glance::Image;

    fn identity(&self) -> ResourceIdentity {
        self.obj.identity()
    }

    fn extract_id(&self, resource: &glance::Image) -> String {
        resource.id.clone()
    }

    async fn get_by_id(&self, id: &str) -> Result<glance::Image, OrcError> {
        Ok(self.client.get_image(id).await?)
    }

    async fn get_by_import_filter(&self) -> Result<Lookup<glance::Image>, OrcError> {
        let Some(filter) = self.obj.spec.import.as_ref().and_then(|i| i.filter.as_ref()) else {
            return Ok(Lookup::Skipped);
        };
        let query = Query::new()
            .opt("name", filter.name.as_ref())
            .opt("visibility", filter.visibility.as_ref())
            .repeated("tag", &filter.tags);
        import_lookup(self.client.list_images(&query).await?)
    }

    async fn get_by_spec(
        &self,
        claimed: &HashSet<String>,
    ) -> Result<Option<glance::Image>, OrcError> {
        let Some(resource) = &self.obj.spec.resource else {
            return Ok(None);
        };
        let query = Query::new().push("name", self.name());
        let candidates = self.client.list_images(&query).await?;
        single_match(
            "image",
            unclaimed(candidates, claimed, |i| i.id.as_str())
                .into_iter()
                .filter(|i| formats_match(resource, i))
                .collect(),
        )
    }

    async fn create(&self) -> Result<Created<glance::Image>, OrcError> {
        let resource = self.obj.spec.resource.as_ref().ok_or_else(missing_resource)?;
        let image = self
            .client
            .create_image(&create_attributes(&self.name(), resource))
            .await?;
        Ok(Created::done(image))
    }

    fn planned_updates<'a>(&'a self, observed: &'a glance::Image) -> Vec<UpdateStep<'a>> {
        let Some(resource) = &self.obj.spec.resource else {
            return Vec::new();
        };
        let mut steps = Vec::new();
        let ops = update_operations(&self.name(), resource, observed);
        if !ops.is_empty() {
            steps.push(step(async move {
                self.client.update_image(&observed.id, &ops).await.map(drop)
            }));
        }
        if let Some(download) = resource.web_download.as_ref() {
            if observed.status == STATUS_QUEUED {
                steps.push(step(async move {
                    info!(image = %observed.id, url = %download.url, "Starting web-download import");
                    self.client
                        .import_web_download(&observed.id, &download.url)
                        .await
                }));
            }
        }
        steps
    }

    async fn delete(&self, observed: &glance::Image) -> Result<(), OrcError> {
        Ok(self.client.delete_image(&observed.id).await?)
    }

    fn referencing_kinds(&self) -> &'static [&'static str] {
        REFERENCING_KINDS
    }

    fn is_ready(&self, resource: &glance::Image) -> bool {
        resource.status == STATUS_ACTIVE
    }

    fn progress(&self, resource: &glance::Image) -> Result<Vec<WaitEvent>, OrcError> {
        if resource.status == STATUS_KILLED {
            return Err(OrcError::unrecoverable(format!(
                "image {} failed to upload and is in state {STATUS_KILLED}",
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

    fn resource_status(&self, resource: &glance::Image) -> Result<Value, OrcError> {
        mirror(&image_status(resource))
    }
}

#[async_trait]
impl Reconcilable for Image {
    type Deps = ();
    type Actuator = ImageActuator;

    async fn resolve_dependencies(&self, _deps: &mut Dependencies<'_>) -> Result<(), OrcError> {
        Ok(())
    }

    fn actuator(
        obj: Arc<Self>,
        clients: Arc<CloudClients>,
        _deps: (),
    ) -> Result<ImageActuator, OrcError> {
        Ok(ImageActuator::new(obj, clients.image()?.clone()))
    }
}

#[cfg(test)]
#[path = "image_tests.rs"]
mod image_tests;
