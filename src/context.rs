// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared context for all controllers.
//!
//! Every controller receives an `Arc<Context>` holding:
//! - the Kubernetes client
//! - the OpenStack client cache, shared across kinds
//! - the event publisher
//! - per-object transient error counters driving the requeue backoff

use crate::events::EventPublisher;
use crate::openstack::config::CloudConfig;
use crate::openstack::{CloudClients, OpenStackError};
use crate::reconcilers::retry::error_requeue_delay;
use kube::Client;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

/// Shared context passed to all controllers.
#[derive(Clone)]
pub struct Context {
    /// Kubernetes client for API operations
    pub client: Client,

    /// Authenticated OpenStack clients per Cloud object
    pub clouds: Arc<CloudClientCache>,

    /// Kubernetes event sink
    pub events: Arc<dyn EventPublisher>,

    /// Consecutive transient failures per object
    pub error_backoff: Arc<ErrorBackoff>,
}

impl Context {
    #[must_use]
    pub fn new(client: Client, events: Arc<dyn EventPublisher>) -> Self {
        Self {
            client,
            clouds: Arc::new(CloudClientCache::default()),
            events,
            error_backoff: Arc::new(ErrorBackoff::default()),
        }
    }
}

/// Identity of one cached client set.
///
/// A new `resourceVersion` on either the Cloud or its Secret produces a new
/// key, so edited credentials are picked up on the next reconcile.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CloudCacheKey {
    pub namespace: String,
    pub cloud: String,
    pub cloud_resource_version: String,
    pub secret_resource_version: String,
}

/// Cache of [`CloudClients`] keyed by [`CloudCacheKey`].
#[derive(Default)]
pub struct CloudClientCache {
    entries: RwLock<HashMap<CloudCacheKey, Arc<CloudClients>>>,
}

impl CloudClientCache {
    /// Cached clients for `key`, connecting with `config` on a miss.
    ///
    /// Entries for the same Cloud with other resource versions are evicted.
    ///
    /// # Errors
    ///
    /// Returns the authentication or endpoint resolution error.
    pub async fn get_or_connect(
        &self,
        key: CloudCacheKey,
        config: impl FnOnce() -> Result<CloudConfig, OpenStackError>,
    ) -> Result<Arc<CloudClients>, OpenStackError> {
        if let Some(clients) = self.entries.read().await.get(&key) {
            return Ok(clients.clone());
        }

        debug!(
            namespace = %key.namespace,
            cloud = %key.cloud,
            "Connecting to OpenStack"
        );
        let clients = Arc::new(CloudClients::connect(config()?).await?);

        let mut entries = self.entries.write().await;
        entries.retain(|k, _| k.namespace != key.namespace || k.cloud != key.cloud);
        entries.insert(key, clients.clone());
        Ok(clients)
    }

    /// Drop every entry for one Cloud.
    pub async fn evict(&self, namespace: &str, cloud: &str) {
        self.entries
            .write()
            .await
            .retain(|k, _| k.namespace != namespace || k.cloud != cloud);
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

/// Per-object transient error counters.
///
/// Keys are `kind/namespace/name`. A success resets the counter.
#[derive(Default)]
pub struct ErrorBackoff {
    attempts: Mutex<HashMap<String, u32>>,
}

impl ErrorBackoff {
    #[must_use]
    pub fn key(kind: &str, namespace: &str, name: &str) -> String {
        format!("{kind}/{namespace}/{name}")
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, u32>> {
        // A panic while holding the lock leaves the counters usable.
        self.attempts
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Record one more failure and return the delay before the next attempt.
    pub fn next_delay(&self, key: &str) -> Duration {
        let mut attempts = self.lock();
        let count = attempts.entry(key.to_string()).or_insert(0);
        *count = count.saturating_add(1);
        error_requeue_delay(*count)
    }

    pub fn reset(&self, key: &str) {
        self.lock().remove(key);
    }

    #[must_use]
    pub fn attempts(&self, key: &str) -> u32 {
        self.lock().get(key).copied().unwrap_or(0)
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod context_tests;
