// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Kubernetes-facing wrapper around the reconciliation engine.
//!
//! [`reconcile`] is the entry point every kind controller hands to
//! `kube::runtime::Controller`. For one object it:
//!
//! 1. Places the finalizer and dependency labels (one apply, then waits for
//!    the resulting watch event)
//! 2. Skips objects that are up to date for their generation
//! 3. Validates `spec`
//! 4. Resolves the Cloud and sibling objects
//! 5. Runs [`reconcile_normal`] or [`delete_os_resource`]
//! 6. Writes `status` under its own field owner and emits events on transitions
//!
//! Terminal errors end the reconcile without a requeue. Transient errors are
//! returned to the controller, whose error policy requeues with backoff.

use crate::constants::{API_GROUP, API_VERSION};
use crate::context::{Context, ErrorBackoff};
use crate::controller::ReconcileError;
use crate::crd::{Cloud, Condition};
use crate::errors::OrcError;
use crate::events::{condition_events, ACTION_RECONCILE};
use crate::labels::{
    dependency_label, dependency_labels, field_owner, finalizer, replace_prefixed,
    ORC_LABEL_PREFIX, TXN_FINALIZER, TXN_ID, TXN_STATUS,
};
use crate::metrics;
use crate::reconcilers::actuator::{Actuator, ResourceStore};
use crate::reconcilers::apply::{
    apply, apply_status, envelope, finalizer_patch, ignore_not_found, remove_labels,
    status_patch,
};
use crate::reconcilers::conditions::{
    compute_conditions, conditions_equal, is_available, needs_reconcile,
};
use crate::reconcilers::engine::{delete_os_resource, reconcile_normal, DeleteOutcome};
use crate::reconcilers::kind::{Dependencies, OrcObject, OrcResource, Reconcilable};
use crate::reconcilers::pagination::list_all_paginated;
use crate::reconcilers::retry::retry_api_call;
use crate::reconcilers::wait::{max_requeue, WaitEvent};
use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use kube::api::{ApiResource, DynamicObject, GroupVersionKind, ListParams};
use kube::runtime::controller::Action;
use kube::{Api, Client, ResourceExt};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// How a reconcile ended, for metrics.
#[derive(Debug)]
pub struct Reconciled {
    pub action: Action,
    pub waiting: bool,
}

impl Reconciled {
    #[must_use]
    pub fn done() -> Self {
        Self {
            action: Action::await_change(),
            waiting: false,
        }
    }

    /// Requeue after the longest poll interval in `waits`, or wait for a watch
    /// event when every wait is watch-driven.
    #[must_use]
    pub fn waiting(waits: &[WaitEvent]) -> Self {
        if waits.is_empty() {
            return Self::done();
        }
        let requeue = max_requeue(waits);
        Self {
            action: if requeue.is_zero() {
                Action::await_change()
            } else {
                Action::requeue(requeue)
            },
            waiting: true,
        }
    }
}

/// RFC 3339 timestamp used for new condition transitions.
#[must_use]
pub fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Reconcile one object of kind `K`.
///
/// # Errors
///
/// Returns transient errors so the controller's error policy requeues the object.
pub async fn reconcile<K: Reconcilable>(
    obj: Arc<K>,
    ctx: Arc<Context>,
) -> Result<Action, ReconcileError> {
    let start = Instant::now();
    let name = obj.name_any();
    let Some(namespace) = obj.namespace() else {
        return Err(ReconcileError::from(OrcError::from(anyhow!(
            "{} {name} has no namespace",
            K::KIND
        ))));
    };

    debug!(kind = K::KIND, %namespace, %name, "Reconciling");
    let result = reconcile_object(obj, &ctx, &namespace).await;

    finish(K::KIND, &ctx, &namespace, &name, start, result)
}

/// Record metrics and backoff state for a finished reconcile.
///
/// # Errors
///
/// Passes the reconcile error through.
pub fn finish(
    kind: &str,
    ctx: &Context,
    namespace: &str,
    name: &str,
    start: Instant,
    result: Result<Reconciled, OrcError>,
) -> Result<Action, ReconcileError> {
    let duration = start.elapsed();
    match result {
        Ok(reconciled) => {
            ctx.error_backoff
                .reset(&ErrorBackoff::key(kind, namespace, name));
            if reconciled.waiting {
                metrics::record_reconciliation_waiting(kind, duration);
                metrics::record_reconciliation_requeue(kind, "waiting");
            } else {
                metrics::record_reconciliation_success(kind, duration);
            }
            Ok(reconciled.action)
        }
        Err(e) => {
            metrics::record_reconciliation_error(kind, duration);
            metrics::record_error(kind, e.category());
            Err(ReconcileError::from(e))
        }
    }
}

async fn reconcile_object<K: Reconcilable>(
    obj: Arc<K>,
    ctx: &Context,
    namespace: &str,
) -> Result<Reconciled, OrcError> {
    let api: Api<K> = Api::namespaced(ctx.client.clone(), namespace);
    let label_kind = K::label_kind();
    let our_finalizer = finalizer(&label_kind);
    let labels = desired_labels(obj.as_ref());

    if obj.meta().deletion_timestamp.is_some() {
        return reconcile_delete(obj, ctx, &api, namespace, &our_finalizer, &labels).await;
    }

    let finalizer_owner = field_owner(&label_kind, TXN_FINALIZER);
    if ensure_finalizer_and_labels(&api, obj.as_ref(), &our_finalizer, &labels, &finalizer_owner)
        .await?
    {
        debug!(kind = K::KIND, name = %obj.name_any(), "Applied finalizer and dependency labels");
        return Ok(Reconciled::done());
    }

    let generation = obj.meta().generation;
    if !needs_reconcile(obj.conditions(), generation) {
        debug!(kind = K::KIND, name = %obj.name_any(), "Up to date for this generation");
        return Ok(Reconciled::done());
    }

    if let Err(e) = obj.validate() {
        warn!(kind = K::KIND, name = %obj.name_any(), error = %e, "Invalid spec");
        let conditions =
            compute_conditions(obj.conditions(), generation, false, &[], Some(&e), &now());
        write_status(ctx, &api, obj.as_ref(), None, conditions).await?;
        return Ok(Reconciled::done());
    }

    let observation = observe(&obj, ctx, namespace).await;
    let conditions = compute_conditions(
        obj.conditions(),
        generation,
        observation.available,
        &observation.waits,
        observation.error.as_ref(),
        &now(),
    );

    if let Err(write_err) =
        write_status(ctx, &api, obj.as_ref(), observation.resource, conditions).await
    {
        let errors = observation.error.into_iter().chain([write_err]).collect();
        return Err(OrcError::join(errors)
            .unwrap_or_else(|| OrcError::from(anyhow!("status write failed"))));
    }

    conclude(K::KIND, &obj.name_any(), observation.waits, observation.error)
}

/// What one normal reconcile learned about the OpenStack resource.
struct Observation {
    resource: Option<Value>,
    available: bool,
    waits: Vec<WaitEvent>,
    error: Option<OrcError>,
}

impl Observation {
    fn failed(error: OrcError) -> Self {
        Self {
            resource: None,
            available: false,
            waits: Vec::new(),
            error: Some(error),
        }
    }

    fn waiting(waits: Vec<WaitEvent>) -> Self {
        Self {
            resource: None,
            available: false,
            waits,
            error: None,
        }
    }
}

async fn observe<K: Reconcilable>(obj: &Arc<K>, ctx: &Context, namespace: &str) -> Observation {
    let mut deps = Dependencies::new(ctx, namespace);
    let clients = match deps.cloud(obj.cloud()).await {
        Ok(clients) => clients,
        Err(e) => return Observation::failed(e),
    };
    let resolved = match obj.resolve_dependencies(&mut deps).await {
        Ok(resolved) => resolved,
        Err(e) => return Observation::failed(e),
    };
    let waits = deps.into_waits();
    let Some(clients) = clients.filter(|_| waits.is_empty()) else {
        return Observation::waiting(waits);
    };

    let actuator = match K::actuator(obj.clone(), clients, resolved) {
        Ok(actuator) => actuator,
        Err(e) => return Observation::failed(e),
    };
    let store = KubeResourceStore::<K>::new(ctx.client.clone(), obj.as_ref(), namespace);

    let outcome = reconcile_normal(&actuator, &store).await;
    if outcome.created {
        metrics::record_resource_created(K::KIND);
    }
    if outcome.updated {
        metrics::record_resource_updated(K::KIND);
    }

    let mut errors: Vec<OrcError> = outcome.error.into_iter().collect();
    let (resource, available) = match &outcome.observed {
        Some(observed) => {
            let available = actuator.is_ready(observed);
            match actuator.resource_status(observed) {
                Ok(mirror) => (Some(mirror), available),
                Err(e) => {
                    errors.push(e);
                    (None, available)
                }
            }
        }
        None => (None, false),
    };

    Observation {
        resource,
        available,
        waits: outcome.waits,
        error: OrcError::join(errors),
    }
}

async fn reconcile_delete<K: Reconcilable>(
    obj: Arc<K>,
    ctx: &Context,
    api: &Api<K>,
    namespace: &str,
    our_finalizer: &str,
    labels: &BTreeMap<String, String>,
) -> Result<Reconciled, OrcError> {
    if !obj.finalizers().iter().any(|f| f == our_finalizer) {
        return Ok(Reconciled::done());
    }

    let name = obj.name_any();
    let foreign: Vec<String> = obj
        .finalizers()
        .iter()
        .filter(|f| *f != our_finalizer)
        .cloned()
        .collect();
    let identity = obj.identity();

    // An invalid spec never reached OpenStack.
    let detach = identity.detaches_on_delete() || obj.validate().is_err();
    let outcome = if detach {
        Ok(if foreign.is_empty() {
            DeleteOutcome::RemoveFinalizer
        } else {
            DeleteOutcome::Waiting {
                waits: foreign.iter().map(WaitEvent::finalizer).collect(),
                available: is_available(obj.conditions()),
            }
        })
    } else {
        delete_resource(&obj, ctx, namespace, &foreign).await
    };

    match outcome {
        Ok(DeleteOutcome::RemoveFinalizer) => {
            let owner = field_owner(&K::label_kind(), TXN_FINALIZER);
            ignore_not_found(
                apply(api, &name, finalizer_patch(obj.as_ref(), None, labels), &[], &owner).await,
            )?;
            if !detach && identity.status_id.is_some() {
                metrics::record_resource_deleted(K::KIND);
            }
            info!(kind = K::KIND, %name, detach, "Removed finalizer");
            Ok(Reconciled::done())
        }
        Ok(DeleteOutcome::Waiting { waits, available }) => {
            let conditions = compute_conditions(
                obj.conditions(),
                obj.meta().generation,
                available,
                &waits,
                None,
                &now(),
            );
            write_status(ctx, api, obj.as_ref(), None, conditions).await?;
            Ok(Reconciled::waiting(&waits))
        }
        Err(e) => {
            let conditions = compute_conditions(
                obj.conditions(),
                obj.meta().generation,
                is_available(obj.conditions()),
                &[],
                Some(&e),
                &now(),
            );
            write_status(ctx, api, obj.as_ref(), None, conditions).await?;
            conclude(K::KIND, &name, Vec::new(), Some(e))
        }
    }
}

async fn delete_resource<K: Reconcilable>(
    obj: &Arc<K>,
    ctx: &Context,
    namespace: &str,
    foreign: &[String],
) -> Result<DeleteOutcome, OrcError> {
    let mut deps = Dependencies::new(ctx, namespace);
    let clients = deps.cloud(obj.cloud()).await?;
    let resolved = obj.resolve_dependencies(&mut deps).await?;
    let Some(clients) = clients else {
        return Ok(DeleteOutcome::Waiting {
            waits: deps.into_waits(),
            available: is_available(obj.conditions()),
        });
    };

    // Without every sibling the adoption lookup could match the wrong resource.
    let search_orphans = deps.waits().is_empty();
    let actuator = K::actuator(obj.clone(), clients, resolved)?;
    let store = KubeResourceStore::<K>::new(ctx.client.clone(), obj.as_ref(), namespace);
    delete_os_resource(&actuator, &store, foreign, search_orphans).await
}

/// Map a finished reconcile to an action. Terminal errors end without requeue.
fn conclude(
    kind: &str,
    name: &str,
    waits: Vec<WaitEvent>,
    error: Option<OrcError>,
) -> Result<Reconciled, OrcError> {
    match error {
        Some(e) if e.is_terminal() => {
            warn!(kind, name, error = %e, "Terminal error, not retrying");
            Ok(Reconciled::done())
        }
        Some(e) => Err(e),
        None => Ok(Reconciled::waiting(&waits)),
    }
}

/// Dependency labels for the Cloud and every sibling referenced by `spec`.
#[must_use]
pub fn desired_labels<K: Reconcilable>(obj: &K) -> BTreeMap<String, String> {
    let cloud_kind = Cloud::label_kind();
    let refs = obj.dependency_refs();
    dependency_labels(
        std::iter::once((cloud_kind.as_str(), obj.cloud()))
            .chain(refs.iter().map(|(kind, name)| (kind.as_str(), name.as_str()))),
    )
}

/// Place our finalizer and exactly `labels` under the controller prefix.
///
/// Returns `true` when a write was made; the caller then waits for the watch
/// event it produces.
///
/// # Errors
///
/// Returns an error if either patch is rejected.
pub async fn ensure_finalizer_and_labels<K: OrcResource>(
    api: &Api<K>,
    obj: &K,
    our_finalizer: &str,
    labels: &BTreeMap<String, String>,
    owner: &str,
) -> Result<bool, OrcError> {
    let has_finalizer = obj.finalizers().iter().any(|f| f == our_finalizer);
    let (merged, labels_changed) = replace_prefixed(ORC_LABEL_PREFIX, obj.labels(), labels);
    if has_finalizer && !labels_changed {
        return Ok(false);
    }

    let name = obj.name_any();
    let stale: Vec<&String> = obj
        .labels()
        .keys()
        .filter(|k| !merged.contains_key(*k))
        .collect();
    let applied = apply(
        api,
        &name,
        finalizer_patch(obj, Some(our_finalizer), labels),
        &[],
        owner,
    )
    .await?;

    // Labels another writer set survive our apply.
    let remaining: Vec<String> = stale
        .into_iter()
        .filter(|k| applied.labels().contains_key(*k))
        .cloned()
        .collect();
    remove_labels(api, &name, &remaining).await?;
    Ok(true)
}

/// Write `status.conditions` and, when known, `status.resource`.
///
/// Skipped when nothing would change. A `None` mirror keeps the last observed
/// one.
///
/// # Errors
///
/// Returns an error if the status patch is rejected for a reason other than
/// the object being gone.
pub async fn write_status<K: OrcResource>(
    ctx: &Context,
    api: &Api<K>,
    obj: &K,
    resource: Option<Value>,
    conditions: Vec<Condition>,
) -> Result<(), OrcError> {
    let existing = serde_json::to_value(obj)?
        .get("status")
        .cloned()
        .unwrap_or(Value::Null);
    let previous_resource = existing.get("resource").filter(|v| !v.is_null());
    let resource = resource.or_else(|| previous_resource.cloned());

    let old = obj.conditions();
    if conditions_equal(old, &conditions) && resource.as_ref() == previous_resource {
        return Ok(());
    }

    let mut status = json!({ "conditions": conditions });
    if let Some(resource) = resource {
        status["resource"] = resource;
    }
    let owner = field_owner(&K::label_kind(), TXN_STATUS);
    let written = ignore_not_found(
        apply_status(api, &obj.name_any(), status_patch(obj, status), &[], &owner).await,
    )?;
    if written.is_none() {
        return Ok(());
    }

    let object_ref = obj.object_ref(&());
    for event in condition_events(old, &conditions) {
        ctx.events
            .publish(
                &object_ref,
                event.type_,
                &event.reason,
                ACTION_RECONCILE,
                event.note,
            )
            .await;
    }

    let was_available = is_available(old);
    let now_available = is_available(&conditions);
    if was_available != now_available {
        metrics::record_availability_change(K::KIND, now_available);
    }
    Ok(())
}

/// [`ResourceStore`] backed by the Kubernetes API.
pub struct KubeResourceStore<K> {
    client: Client,
    api: Api<K>,
    namespace: String,
    name: String,
}

impl<K: OrcObject> KubeResourceStore<K> {
    #[must_use]
    pub fn new(client: Client, obj: &K, namespace: &str) -> Self {
        Self {
            api: Api::namespaced(client.clone(), namespace),
            client,
            namespace: namespace.to_string(),
            name: obj.name_any(),
        }
    }
}

#[async_trait]
impl<K: OrcObject> ResourceStore for KubeResourceStore<K> {
    async fn claimed_ids(&self) -> Result<HashSet<String>, OrcError> {
        let objects = list_all_paginated(&self.api, ListParams::default()).await?;
        Ok(objects
            .iter()
            .filter(|o| o.name_any() != self.name)
            .filter_map(|o| o.status_id().map(str::to_string))
            .collect())
    }

    async fn find_referencing(
        &self,
        kinds: &[&'static str],
    ) -> Result<Vec<(String, String)>, OrcError> {
        let selector = dependency_label(&K::label_kind(), &self.name);
        let params = ListParams::default().labels(&selector).limit(1);

        let mut referencing = Vec::new();
        for kind in kinds {
            let gvk = GroupVersionKind::gvk(API_GROUP, API_VERSION, kind);
            let resource = ApiResource::from_gvk(&gvk);
            let api: Api<DynamicObject> =
                Api::namespaced_with(self.client.clone(), &self.namespace, &resource);
            let list = retry_api_call(|| api.list(&params), "list referencing objects").await?;
            if let Some(obj) = list.items.first() {
                referencing.push(((*kind).to_string(), obj.name_any()));
            }
        }
        Ok(referencing)
    }

    async fn record_id(&self, id: &str) -> Result<(), OrcError> {
        let mut patch = envelope::<K>(&self.name, Some(&self.namespace));
        patch["status"] = json!({ "id": id });
        let owner = field_owner(&K::label_kind(), TXN_ID);
        apply_status(&self.api, &self.name, patch, &[], &owner).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod runner_tests;
