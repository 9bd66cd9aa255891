// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `KeyPair` actuator (Nova keypairs).
//!
//! A keypair is identified by its name, which therefore doubles as the
//! OpenStack ID recorded in `status.id`.

use crate::constants::KIND_SERVER;
use crate::crd::{KeyPair, KeyPairResourceSpec, KeyPairResourceStatus};
use crate::errors::OrcError;
use crate::openstack::compute::{self as nova, ComputeClient};
use crate::openstack::CloudClients;
use crate::reconcilers::actuator::{Actuator, Created, Lookup, ResourceIdentity};
use crate::reconcilers::adapter::{missing_resource, mirror, resource_name};
use crate::reconcilers::kind::{Dependencies, OrcObject, Reconcilable};
use async_trait::async_trait;
use kube::ResourceExt;
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::sync::Arc;

const REFERENCING_KINDS: &[&str] = &[KIND_SERVER];

pub struct KeyPairActuator {
    obj: Arc<KeyPair>,
    client: ComputeClient,
}

impl KeyPairActuator {
    #[must_use]
    pub fn new(obj: Arc<KeyPair>, client: ComputeClient) -> Self {
        Self { obj, client }
    }

    fn name(&self) -> String {
        resource_name(
            &self.obj.name_any(),
            self.obj.spec.resource.as_ref().and_then(|r| r.name.as_ref()),
        )
    }

    async fn find(&self, name: &str) -> Result<Option<nova::KeyPair>, OrcError> {
        match self.client.get_keypair(name).await {
            Ok(keypair) => Ok(Some(keypair)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[must_use]
pub fn create_attributes(name: &str, resource: &KeyPairResourceSpec) -> Value {
    let mut attrs = Map::new();
    attrs.insert("name".into(), json!(name));
    attrs.insert("public_key".into(), json!(resource.public_key));
    if let Some(key_type) = &resource.r#type {
        attrs.insert("type".into(), json!(key_type));
    }
    Value::Object(attrs)
}

/// Public keys compare equal ignoring surrounding whitespace.
#[must_use]
pub fn same_public_key(desired: &str, observed: &str) -> bool {
    desired.trim() == observed.trim()
}

#[must_use]
pub fn keypair_status(keypair: &nova::KeyPair) -> KeyPairResourceStatus {
    KeyPairResourceStatus {
        name: keypair.name.clone(),
        public_key: keypair.public_key.clone(),
        fingerprint: keypair.fingerprint.clone(),
        r#type: (!keypair.key_type.is_empty()).then(|| keypair.key_type.clone()),
    }
}

#[async_trait]
impl Actuator for KeyPairActuator {
    type Resource = nova::KeyPair;

    fn identity(&self) -> ResourceIdentity {
        self.obj.identity()
    }

    fn extract_id(&self, resource: &nova::KeyPair) -> String {
        resource.name.clone()
    }

    async fn get_by_id(&self, id: &str) -> Result<nova::KeyPair, OrcError> {
        Ok(self.client.get_keypair(id).await?)
    }

    async fn get_by_import_filter(&self) -> Result<Lookup<nova::KeyPair>, OrcError> {
        let Some(name) = self
            .obj
            .spec
            .import
            .as_ref()
            .and_then(|i| i.filter.as_ref())
            .and_then(|f| f.name.as_ref())
        else {
            return Ok(Lookup::Skipped);
        };
        Ok(match self.find(name).await? {
            Some(keypair) => Lookup::Found(keypair),
            None => Lookup::Absent,
        })
    }

    async fn get_by_spec(
        &self,
        claimed: &HashSet<String>,
    ) -> Result<Option<nova::KeyPair>, OrcError> {
        let Some(resource) = &self.obj.spec.resource else {
            return Ok(None);
        };
        let name = self.name();
        if claimed.contains(&name) {
            return Ok(None);
        }
        Ok(self
            .find(&name)
            .await?
            .filter(|k| same_public_key(&resource.public_key, &k.public_key)))
    }

    async fn create(&self) -> Result<Created<nova::KeyPair>, OrcError> {
        let resource = self.obj.spec.resource.as_ref().ok_or_else(missing_resource)?;
        let keypair = self
            .client
            .create_keypair(create_attributes(&self.name(), resource))
            .await?;
        Ok(Created::done(keypair))
    }

    async fn delete(&self, observed: &nova::KeyPair) -> Result<(), OrcError> {
        Ok(self.client.delete_keypair(&observed.name).await?)
    }

    fn referencing_kinds(&self) -> &'static [&'static str] {
        REFERENCING_KINDS
    }

    fn is_ready(&self, _resource: &nova::KeyPair) -> bool {
        true
    }

    fn resource_status(&self, resource: &nova::KeyPair) -> Result<Value, OrcError> {
        mirror(&keypair_status(resource))
    }
}

#[async_trait]
impl Reconcilable for KeyPair {
    type Deps = ();
    type Actuator = KeyPairActuator;

    async fn resolve_dependencies(&self, _deps: &mut Dependencies<'_>) -> Result<(), OrcError> {
        Ok(())
    }

    fn actuator(
        obj: Arc<Self>,
        clients: Arc<CloudClients>,
        _deps: (),
    ) -> Result<KeyPairActuator, OrcError> {
        Ok(KeyPairActuator::new(obj, clients.compute()?.clone()))
    }
}

#[cfg(test)]
#[path = "keypair_tests.rs"]
mod keypair_tests;
