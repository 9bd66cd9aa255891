// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Controller registration for every kind.
//!
//! Each kind gets one `kube::runtime::Controller` with a primary watch on its
//! own objects and one secondary watch per sibling kind its spec can reference.
//! A sibling change is mapped back through the dependency labels to the
//! same-namespace objects that reference it and are not yet available.
//!
//! Every watch stream is filtered by [`watch_fingerprint`] so that writes which
//! only touch `managedFields` or `resourceVersion` do not trigger a reconcile.

use crate::config::Args;
use crate::constants::{
    KIND_CLOUD, KIND_FLAVOR, KIND_FLOATING_IP, KIND_IMAGE, KIND_KEY_PAIR, KIND_NETWORK, KIND_PORT,
    KIND_ROUTER, KIND_SECURITY_GROUP, KIND_SECURITY_GROUP_RULE, KIND_SERVER, KIND_SUBNET,
};
use crate::context::{Context, ErrorBackoff};
use crate::crd::{
    Cloud, FloatingIP, Flavor, Image, KeyPair, Network, Port, Router, SecurityGroup,
    SecurityGroupRule, Server, Subnet,
};
use crate::errors::OrcError;
use crate::labels::dependency_label;
use crate::metrics;
use crate::reconcilers::cloud::reconcile_cloud;
use crate::reconcilers::conditions::is_available;
use crate::reconcilers::kind::{secret_label_kind, OrcResource, Reconcilable};
use crate::reconcilers::runner::reconcile;
use anyhow::{bail, Result};
use futures::StreamExt;
use k8s_openapi::api::core::v1::Secret;
use kube::core::NamespaceResourceScope;
use kube::runtime::controller::{Action, Config as ControllerConfig};
use kube::runtime::reflector::{self, ObjectRef};
use kube::runtime::watcher::{self, Config as WatcherConfig};
use kube::runtime::{Controller, PredicateConfig, WatchStreamExt};
use kube::{Api, Client, Resource, ResourceExt};
use serde::Serialize;
use serde_json::json;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Reconciliation error wrapper
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct ReconcileError(#[from] OrcError);

impl ReconcileError {
    #[must_use]
    pub fn inner(&self) -> &OrcError {
        &self.0
    }
}

/// Requeue a failed object with its own exponential backoff.
#[allow(clippy::needless_pass_by_value)] // Signature required by kube::runtime::Controller
fn error_policy<K: OrcResource>(obj: Arc<K>, err: &ReconcileError, ctx: Arc<Context>) -> Action {
    let namespace = obj.namespace().unwrap_or_default();
    let name = obj.name_any();
    let delay = ctx
        .error_backoff
        .next_delay(&ErrorBackoff::key(K::KIND, &namespace, &name));
    metrics::record_reconciliation_requeue(K::KIND, "error");
    error!(
        kind = K::KIND,
        %namespace,
        %name,
        error = %err,
        retry_secs = delay.as_secs(),
        "Reconciliation error - will retry"
    );
    Action::requeue(delay)
}

/// Objects in `candidates` that reference the sibling `dep_kind/dep_name` in
/// `namespace`. With `skip_available`, objects already Available are left alone.
#[must_use]
pub fn referencing_objects<K: OrcResource>(
    candidates: &[Arc<K>],
    dep_kind: &str,
    namespace: &str,
    dep_name: &str,
    skip_available: bool,
) -> Vec<ObjectRef<K>> {
    let label = dependency_label(dep_kind, dep_name);
    candidates
        .iter()
        .filter(|obj| obj.namespace().as_deref() == Some(namespace))
        .filter(|obj| obj.labels().contains_key(&label))
        .filter(|obj| !(skip_available && is_available(obj.conditions())))
        .map(|obj| ObjectRef::from_obj(obj.as_ref()))
        .collect()
}

/// `Api` over one namespace, or all namespaces when `namespace` is `None`.
fn scoped_api<T>(client: Client, namespace: Option<&str>) -> Api<T>
where
    T: Resource<Scope = NamespaceResourceScope>,
    T::DynamicType: Default,
{
    match namespace {
        Some(ns) => Api::namespaced(client, ns),
        None => Api::all(client),
    }
}

fn watcher_config() -> WatcherConfig {
    WatcherConfig::default().any_semantic()
}

/// Hash of the parts of an object a reconcile depends on: everything outside
/// `metadata`, plus labels, finalizers and the deletion timestamp.
///
/// `managedFields` and `resourceVersion` are not part of the hash. Returns
/// `None` when the object cannot be serialized, which lets the event through.
#[must_use]
pub fn watch_fingerprint<K: Resource + Serialize>(obj: &K) -> Option<u64> {
    let mut value = serde_json::to_value(obj).ok()?;
    let meta = obj.meta();
    let relevant = json!({
        "labels": meta.labels,
        "finalizers": meta.finalizers,
        "deletionTimestamp": meta.deletion_timestamp,
    });
    match value.as_object_mut() {
        Some(map) => {
            map.insert("metadata".to_string(), relevant);
        }
        None => value = relevant,
    }
    let mut hasher = DefaultHasher::new();
    value.to_string().hash(&mut hasher);
    Some(hasher.finish())
}

/// Controller for `K` with its primary watch and the watch on `Cloud`.
fn base_controller<K: Reconcilable>(client: &Client, args: &Args) -> Controller<K> {
    let (reader, writer) = reflector::store();
    let trigger = watcher::watcher(
        scoped_api::<K>(client.clone(), args.namespace.as_deref()),
        watcher_config(),
    )
    .default_backoff()
    .reflect(writer)
    .touched_objects()
    .predicate_filter(watch_fingerprint::<K>, PredicateConfig::default());
    let controller = Controller::for_stream(trigger, reader);
    watch_sibling::<K, Cloud>(controller, client, args)
}

/// Re-reconcile unavailable `K` objects when a sibling `D` they reference changes.
fn watch_sibling<K, D>(controller: Controller<K>, client: &Client, args: &Args) -> Controller<K>
where
    K: Reconcilable,
    D: OrcResource,
{
    let store = controller.store();
    let dep_kind = D::label_kind();
    let trigger = watcher::watcher(
        scoped_api::<D>(client.clone(), args.namespace.as_deref()),
        watcher_config(),
    )
    .default_backoff()
    .touched_objects()
    .predicate_filter(watch_fingerprint::<D>, PredicateConfig::default());
    controller.watches_stream(trigger, move |sibling: D| {
        let Some(namespace) = sibling.namespace() else {
            return Vec::new();
        };
        referencing_objects(&store.state(), &dep_kind, &namespace, &sibling.name_any(), true)
    })
}

/// Drive a controller until shutdown.
async fn drive<K>(controller: Controller<K>, ctx: Arc<Context>, args: &Args) -> Result<()>
where
    K: Reconcilable,
{
    info!(kind = K::KIND, concurrency = args.concurrency, "Starting controller");
    controller
        .with_config(ControllerConfig::default().concurrency(args.concurrency))
        .shutdown_on_signal()
        .run(reconcile::<K>, error_policy::<K>, ctx)
        .for_each(|result| async move { log_result(K::KIND, result) })
        .await;
    info!(kind = K::KIND, "Controller stopped");
    Ok(())
}

fn log_result<K, E>(kind: &str, result: Result<(ObjectRef<K>, Action), E>)
where
    K: Resource,
    E: std::error::Error,
{
    match result {
        Ok((obj, action)) => debug!(kind, object = %obj, ?action, "Reconciled"),
        Err(e) => warn!(kind, error = %e, "Reconcile failed"),
    }
}

/// Run the `Cloud` controller, which also watches credential Secrets.
///
/// # Errors
///
/// Returns an error if the controller exits abnormally.
pub async fn run_cloud_controller(ctx: Arc<Context>, args: &Args) -> Result<()> {
    let client = ctx.client.clone();
    let (reader, writer) = reflector::store();
    let trigger = watcher::watcher(
        scoped_api::<Cloud>(client.clone(), args.namespace.as_deref()),
        watcher_config(),
    )
    .default_backoff()
    .reflect(writer)
    .touched_objects()
    .predicate_filter(watch_fingerprint::<Cloud>, PredicateConfig::default());
    let controller = Controller::for_stream(trigger, reader);
    let store = controller.store();
    let secret_kind = secret_label_kind();
    let secrets = watcher::watcher(
        scoped_api::<Secret>(client, args.namespace.as_deref()),
        WatcherConfig::default(),
    )
    .default_backoff()
    .touched_objects()
    .predicate_filter(watch_fingerprint::<Secret>, PredicateConfig::default());

    info!(kind = KIND_CLOUD, concurrency = args.concurrency, "Starting controller");
    controller
        .watches_stream(secrets, move |secret: Secret| {
            let Some(namespace) = secret.namespace() else {
                return Vec::new();
            };
            // A rotated secret must be re-verified even for available clouds.
            referencing_objects(&store.state(), &secret_kind, &namespace, &secret.name_any(), false)
        })
        .with_config(ControllerConfig::default().concurrency(args.concurrency))
        .shutdown_on_signal()
        .run(reconcile_cloud, error_policy::<Cloud>, ctx)
        .for_each(|result| async move { log_result(KIND_CLOUD, result) })
        .await;
    info!(kind = KIND_CLOUD, "Controller stopped");
    Ok(())
}

/// Run the controller for one kind.
///
/// # Errors
///
/// Returns an error for an unknown kind or if the controller exits abnormally.
pub async fn run_controller(kind: &str, ctx: Arc<Context>, args: Args) -> Result<()> {
    let client = ctx.client.clone();
    let args = &args;
    match kind {
        KIND_CLOUD => run_cloud_controller(ctx, args).await,
        KIND_NETWORK => drive(base_controller::<Network>(&client, args), ctx, args).await,
        KIND_SUBNET => {
            let c = base_controller::<Subnet>(&client, args);
            let c = watch_sibling::<_, Network>(c, &client, args);
            drive(c, ctx, args).await
        }
        KIND_PORT => {
            let c = base_controller::<Port>(&client, args);
            let c = watch_sibling::<_, Network>(c, &client, args);
            let c = watch_sibling::<_, Subnet>(c, &client, args);
            let c = watch_sibling::<_, SecurityGroup>(c, &client, args);
            drive(c, ctx, args).await
        }
        KIND_ROUTER => {
            let c = base_controller::<Router>(&client, args);
            let c = watch_sibling::<_, Network>(c, &client, args);
            let c = watch_sibling::<_, Port>(c, &client, args);
            drive(c, ctx, args).await
        }
        KIND_FLOATING_IP => {
            let c = base_controller::<FloatingIP>(&client, args);
            let c = watch_sibling::<_, Network>(c, &client, args);
            let c = watch_sibling::<_, Port>(c, &client, args);
            drive(c, ctx, args).await
        }
        KIND_SECURITY_GROUP => {
            drive(base_controller::<SecurityGroup>(&client, args), ctx, args).await
        }
        KIND_SECURITY_GROUP_RULE => {
            let c = base_controller::<SecurityGroupRule>(&client, args);
            let c = watch_sibling::<_, SecurityGroup>(c, &client, args);
            drive(c, ctx, args).await
        }
        KIND_FLAVOR => drive(base_controller::<Flavor>(&client, args), ctx, args).await,
        KIND_IMAGE => drive(base_controller::<Image>(&client, args), ctx, args).await,
        KIND_KEY_PAIR => drive(base_controller::<KeyPair>(&client, args), ctx, args).await,
        KIND_SERVER => {
            let c = base_controller::<Server>(&client, args);
            let c = watch_sibling::<_, Image>(c, &client, args);
            let c = watch_sibling::<_, Flavor>(c, &client, args);
            let c = watch_sibling::<_, Port>(c, &client, args);
            let c = watch_sibling::<_, KeyPair>(c, &client, args);
            drive(c, ctx, args).await
        }
        other => bail!("no controller for kind {other}"),
    }
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod controller_tests;
