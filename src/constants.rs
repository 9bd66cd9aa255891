// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the OpenStack resource controller.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// API Constants
// ============================================================================

/// API group for all ORC CRDs
pub const API_GROUP: &str = "openstack.k-orc.cloud";

/// API version for all ORC CRDs
pub const API_VERSION: &str = "v1alpha1";

/// Kind name for `Cloud` resource
pub const KIND_CLOUD: &str = "Cloud";

/// Kind name for `Network` resource
pub const KIND_NETWORK: &str = "Network";

/// Kind name for `Subnet` resource
pub const KIND_SUBNET: &str = "Subnet";

/// Kind name for `Port` resource
pub const KIND_PORT: &str = "Port";

/// Kind name for `Router` resource
pub const KIND_ROUTER: &str = "Router";

/// Kind name for `FloatingIP` resource
pub const KIND_FLOATING_IP: &str = "FloatingIP";

/// Kind name for `SecurityGroup` resource
pub const KIND_SECURITY_GROUP: &str = "SecurityGroup";

/// Kind name for `SecurityGroupRule` resource
pub const KIND_SECURITY_GROUP_RULE: &str = "SecurityGroupRule";

/// Kind name for `Flavor` resource
pub const KIND_FLAVOR: &str = "Flavor";

/// Kind name for `Image` resource
pub const KIND_IMAGE: &str = "Image";

/// Kind name for `KeyPair` resource
pub const KIND_KEY_PAIR: &str = "KeyPair";

/// Kind name for `Server` resource
pub const KIND_SERVER: &str = "Server";

/// Kind name for core `Secret` resources referenced by a `Cloud`
pub const KIND_SECRET: &str = "Secret";

// ============================================================================
// Reconciliation Timing Constants
// ============================================================================

/// Follow-up delay after issuing an OpenStack delete, used to confirm the deletion
pub const DELETE_CONFIRM_POLL_SECS: u64 = 1;

/// Poll interval while other objects still reference an object being deleted
pub const REFERENCING_KINDS_POLL_SECS: u64 = 10;

/// Poll interval while waiting on OpenStack to reach a ready state or for an
/// imported resource to appear
pub const EXTERNAL_UPDATE_POLL_SECS: u64 = 15;

/// Initial requeue delay after a transient reconcile error
pub const ERROR_REQUEUE_INITIAL_SECS: u64 = 1;

/// Upper bound for the transient error requeue delay (5 minutes)
pub const ERROR_REQUEUE_MAX_SECS: u64 = 300;

// ============================================================================
// OpenStack Client Constants
// ============================================================================

/// Default endpoint interface selected from the Keystone catalog
pub const DEFAULT_ENDPOINT_INTERFACE: &str = "public";

/// Renew Keystone tokens this long before they expire
pub const TOKEN_RENEWAL_MARGIN_SECS: i64 = 60;

/// Timeout applied to every OpenStack HTTP request
pub const OPENSTACK_REQUEST_TIMEOUT_SECS: u64 = 60;

/// OpenStack service type for Neutron
pub const SERVICE_NETWORK: &str = "network";

/// OpenStack service type for Nova
pub const SERVICE_COMPUTE: &str = "compute";

/// OpenStack service type for Glance
pub const SERVICE_IMAGE: &str = "image";

/// Nova microversion requested on compute calls (adds server tags and keypair types)
pub const COMPUTE_MICROVERSION: &str = "2.55";

// ============================================================================
// Runtime Constants
// ============================================================================

/// Number of worker threads for Tokio runtime
pub const TOKIO_WORKER_THREADS: usize = 4;

/// Page size for Kubernetes list calls
pub const KUBE_LIST_PAGE_SIZE: u32 = 100;

// ============================================================================
// Metrics Server Constants
// ============================================================================

/// Default bind address for the metrics and health HTTP server
pub const METRICS_SERVER_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Path for Prometheus metrics endpoint
pub const METRICS_SERVER_PATH: &str = "/metrics";

/// Path for the liveness probe
pub const HEALTHZ_PATH: &str = "/healthz";

/// Path for the readiness probe
pub const READYZ_PATH: &str = "/readyz";

/// Controller name reported on Kubernetes events
pub const EVENT_REPORTER: &str = "openstack-resource-controller";
