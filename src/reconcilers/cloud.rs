// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `Cloud` reconciliation and credential resolution.
//!
//! A `Cloud` points at a `Secret` holding a clouds.yaml document. Its
//! controller:
//!
//! 1. Places its own finalizer and a dependency label on the Secret's name
//! 2. Checks the credentials source is `secret`
//! 3. Places a finalizer on the Secret so it outlives the Cloud
//! 4. Authenticates once against Keystone; a rejection is `BadCredentials`
//!
//! Deleting a Cloud releases the Secret and then the Cloud itself. Dependent
//! objects are not waited on; they see the Cloud disappear and wait for it.
//!
//! Other controllers call [`resolve_cloud_clients`] to get authenticated
//! OpenStack clients for the Cloud named in their spec.

use crate::constants::{EXTERNAL_UPDATE_POLL_SECS, KIND_CLOUD, KIND_SECRET};
use crate::context::{CloudCacheKey, Context};
use crate::controller::ReconcileError;
use crate::crd::{Cloud, CloudSpec};
use crate::errors::{is_kube_not_found, OrcError};
use crate::labels::{cloud_secret_finalizer, dependency_labels, field_owner, finalizer, TXN_FINALIZER};
use crate::openstack::config::CloudConfig;
use crate::openstack::{CloudClients, OpenStackError};
use crate::reconcilers::apply::{apply, envelope, finalizer_patch, ignore_not_found};
use crate::reconcilers::conditions::{compute_conditions, is_available};
use crate::reconcilers::kind::{secret_label_kind, OrcResource};
use crate::reconcilers::runner::{
    ensure_finalizer_and_labels, finish, now, write_status, Reconciled,
};
use crate::reconcilers::wait::{SiblingPhase, WaitEvent};
use anyhow::anyhow;
use k8s_openapi::api::core::v1::Secret;
use kube::runtime::controller::Action;
use kube::{Api, Resource, ResourceExt};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// The only supported `spec.credentials.source`.
pub const CREDENTIALS_SOURCE_SECRET: &str = "secret";

/// Parse the Cloud's clouds.yaml out of its Secret.
///
/// # Errors
///
/// Returns [`OpenStackError::Config`] if the key is missing, not UTF-8, or
/// the document does not contain a usable `spec.cloud` entry.
pub fn cloud_config(spec: &CloudSpec, secret: &Secret) -> Result<CloudConfig, OpenStackError> {
    let secret_ref = &spec.credentials.secret_ref;
    let bytes = secret
        .data
        .as_ref()
        .and_then(|data| data.get(&secret_ref.key))
        .map(|b| b.0.clone())
        .or_else(|| {
            secret
                .string_data
                .as_ref()
                .and_then(|data| data.get(&secret_ref.key))
                .map(|s| s.clone().into_bytes())
        })
        .ok_or_else(|| {
            OpenStackError::Config(format!(
                "secret {} has no key {}",
                secret_ref.name, secret_ref.key
            ))
        })?;
    let document = String::from_utf8(bytes).map_err(|e| {
        OpenStackError::Config(format!("secret {} key {}: {e}", secret_ref.name, secret_ref.key))
    })?;
    CloudConfig::from_clouds_yaml(&document, &spec.cloud)
}

/// Cache key for a Cloud and the Secret revision it was built from.
#[must_use]
pub fn cache_key(namespace: &str, cloud: &Cloud, secret: &Secret) -> CloudCacheKey {
    CloudCacheKey {
        namespace: namespace.to_string(),
        cloud: cloud.name_any(),
        cloud_resource_version: cloud.resource_version().unwrap_or_default(),
        secret_resource_version: secret.resource_version().unwrap_or_default(),
    }
}

/// Classify a trial authentication failure.
#[must_use]
pub fn classify_auth_error(err: OpenStackError) -> OrcError {
    match err {
        OpenStackError::Unauthorized { .. } => {
            OrcError::bad_credentials(format!("OpenStack rejected the credentials: {err}"))
        }
        OpenStackError::Config(_) => OrcError::invalid_configuration(err.to_string()),
        other => OrcError::from(other),
    }
}

/// Authenticated clients for the named Cloud in `namespace`.
///
/// Returns `Ok(Err(wait))` when the Cloud or its Secret is missing, or the
/// Cloud is not yet available. A Cloud being deleted stays usable until its
/// finalizer is gone so dependents can finish their own deletion.
///
/// # Errors
///
/// Returns Kubernetes API errors and authentication failures.
pub async fn resolve_cloud_clients(
    ctx: &Context,
    namespace: &str,
    name: &str,
) -> Result<Result<Arc<CloudClients>, WaitEvent>, OrcError> {
    let clouds: Api<Cloud> = Api::namespaced(ctx.client.clone(), namespace);
    let Some(cloud) = clouds.get_opt(name).await? else {
        return Ok(Err(WaitEvent::sibling(KIND_CLOUD, name, SiblingPhase::Exist)));
    };
    if !is_available(cloud.conditions()) {
        return Ok(Err(WaitEvent::sibling(KIND_CLOUD, name, SiblingPhase::Ready)));
    }

    let secret_name = &cloud.spec.credentials.secret_ref.name;
    let secrets: Api<Secret> = Api::namespaced(ctx.client.clone(), namespace);
    let Some(secret) = secrets.get_opt(secret_name).await? else {
        // Dependents do not watch Secrets.
        return Ok(Err(WaitEvent::Sibling {
            kind: KIND_SECRET.to_string(),
            name: secret_name.clone(),
            phase: SiblingPhase::Exist,
            poll_after: Some(Duration::from_secs(EXTERNAL_UPDATE_POLL_SECS)),
        }));
    };

    let key = cache_key(namespace, &cloud, &secret);
    let clients = ctx
        .clouds
        .get_or_connect(key, || cloud_config(&cloud.spec, &secret))
        .await?;
    Ok(Ok(clients))
}

/// Reconcile one `Cloud`.
///
/// # Errors
///
/// Returns transient errors so the controller's error policy requeues the object.
pub async fn reconcile_cloud(
    cloud: Arc<Cloud>,
    ctx: Arc<Context>,
) -> Result<Action, ReconcileError> {
    let start = Instant::now();
    let name = cloud.name_any();
    let Some(namespace) = cloud.namespace() else {
        return Err(ReconcileError::from(OrcError::from(anyhow!(
            "Cloud {name} has no namespace"
        ))));
    };

    let result = if cloud.meta().deletion_timestamp.is_some() {
        delete_cloud(&cloud, &ctx, &namespace).await
    } else {
        apply_cloud(&cloud, &ctx, &namespace).await
    };

    finish(KIND_CLOUD, &ctx, &namespace, &name, start, result)
}

fn secret_labels(cloud: &Cloud) -> BTreeMap<String, String> {
    let kind = secret_label_kind();
    dependency_labels([(kind.as_str(), cloud.spec.credentials.secret_ref.name.as_str())])
}

/// Field owner for the finalizer a Cloud holds on its Secret.
#[must_use]
pub fn secret_field_owner(cloud_name: &str) -> String {
    field_owner(&Cloud::label_kind(), &format!("secret-{cloud_name}"))
}

async fn apply_cloud(cloud: &Cloud, ctx: &Context, namespace: &str) -> Result<Reconciled, OrcError> {
    let name = cloud.name_any();
    let api: Api<Cloud> = Api::namespaced(ctx.client.clone(), namespace);
    let label_kind = Cloud::label_kind();
    let owner = field_owner(&label_kind, TXN_FINALIZER);

    if ensure_finalizer_and_labels(&api, cloud, &finalizer(&label_kind), &secret_labels(cloud), &owner)
        .await?
    {
        return Ok(Reconciled::done());
    }

    let (waits, error) = match check_credentials(cloud, ctx, namespace).await {
        Ok(waits) => (waits, None),
        Err(e) => (Vec::new(), Some(e)),
    };
    let available = waits.is_empty() && error.is_none();

    let conditions = compute_conditions(
        cloud.conditions(),
        cloud.meta().generation,
        available,
        &waits,
        error.as_ref(),
        &now(),
    );
    write_status(ctx, &api, cloud, None, conditions).await?;

    match error {
        Some(e) if e.is_terminal() => {
            warn!(cloud = %name, error = %e, "Cloud credentials unusable");
            Ok(Reconciled::done())
        }
        Some(e) => Err(e),
        None => {
            if available {
                debug!(cloud = %name, "Cloud credentials verified");
            }
            Ok(Reconciled::waiting(&waits))
        }
    }
}

/// Protect the Secret and try the credentials. Returns waits when the Secret
/// is missing or going away.
async fn check_credentials(
    cloud: &Cloud,
    ctx: &Context,
    namespace: &str,
) -> Result<Vec<WaitEvent>, OrcError> {
    let credentials = &cloud.spec.credentials;
    if credentials.source != CREDENTIALS_SOURCE_SECRET {
        return Err(OrcError::invalid_configuration(format!(
            "unsupported credentials source {:?}",
            credentials.source
        )));
    }

    let secret_name = &credentials.secret_ref.name;
    let secrets: Api<Secret> = Api::namespaced(ctx.client.clone(), namespace);
    let secret = match secrets.get_opt(secret_name).await? {
        Some(secret) if secret.meta().deletion_timestamp.is_none() => secret,
        Some(_) => {
            return Ok(vec![WaitEvent::sibling(KIND_SECRET, secret_name.clone(), SiblingPhase::Ready)])
        }
        None => {
            return Ok(vec![WaitEvent::sibling(KIND_SECRET, secret_name.clone(), SiblingPhase::Exist)])
        }
    };

    let cloud_name = cloud.name_any();
    let secret_finalizer = cloud_secret_finalizer(&cloud_name);
    if !secret.finalizers().contains(&secret_finalizer) {
        let mut patch = envelope::<Secret>(secret_name, Some(namespace));
        patch["metadata"]["finalizers"] = json!([secret_finalizer]);
        apply(&secrets, secret_name, patch, &[], &secret_field_owner(&cloud_name)).await?;
        info!(cloud = %cloud_name, secret = %secret_name, "Added finalizer to credentials secret");
    }

    let key = cache_key(namespace, cloud, &secret);
    ctx.clouds
        .get_or_connect(key, || cloud_config(&cloud.spec, &secret))
        .await
        .map_err(classify_auth_error)?;
    Ok(Vec::new())
}

async fn delete_cloud(cloud: &Cloud, ctx: &Context, namespace: &str) -> Result<Reconciled, OrcError> {
    let name = cloud.name_any();
    let label_kind = Cloud::label_kind();
    let our_finalizer = finalizer(&label_kind);
    if !cloud.finalizers().contains(&our_finalizer) {
        return Ok(Reconciled::done());
    }

    let secret_name = &cloud.spec.credentials.secret_ref.name;
    let secrets: Api<Secret> = Api::namespaced(ctx.client.clone(), namespace);
    let mut patch = envelope::<Secret>(secret_name, Some(namespace));
    patch["metadata"]["finalizers"] = json!([]);
    match apply(&secrets, secret_name, patch, &[], &secret_field_owner(&name)).await {
        Ok(_) => debug!(cloud = %name, secret = %secret_name, "Released credentials secret"),
        Err(OrcError::Kube(ref e)) if is_kube_not_found(e) => {}
        Err(e) => return Err(e),
    }

    ctx.clouds.evict(namespace, &name).await;

    let api: Api<Cloud> = Api::namespaced(ctx.client.clone(), namespace);
    let owner = field_owner(&label_kind, TXN_FINALIZER);
    ignore_not_found(
        apply(&api, &name, finalizer_patch(cloud, None, &secret_labels(cloud)), &[], &owner).await,
    )?;
    info!(cloud = %name, "Removed finalizer");
    Ok(Reconciled::done())
}

#[cfg(test)]
#[path = "cloud_tests.rs"]
mod cloud_tests;
