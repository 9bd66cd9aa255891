// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Custom Resource Definitions (CRDs) for OpenStack resources.
//!
//! Every managed kind shares the same envelope:
//!
//! - `spec.cloud` names a [`Cloud`] in the same namespace
//! - `spec.resource` describes the OpenStack object to create, or
//!   `spec.import` selects an existing one by ID or by filter
//! - `spec.managementPolicy` and `spec.managedOptions.onDelete` control whether
//!   the controller may mutate or delete the OpenStack object
//! - `status.id` records the bound OpenStack ID, `status.resource` mirrors the
//!   observed OpenStack properties and `status.conditions` carries the
//!   `Available` and `Progressing` conditions
//!
//! # Resource Types
//!
//! ## Credentials
//!
//! - [`Cloud`] - clouds.yaml credentials stored in a `Secret`
//!
//! ## Networking (Neutron)
//!
//! - [`Network`], [`Subnet`], [`Port`], [`Router`], [`FloatingIP`],
//!   [`SecurityGroup`], [`SecurityGroupRule`]
//!
//! ## Compute (Nova)
//!
//! - [`Flavor`], [`KeyPair`], [`Server`]
//!
//! ## Image (Glance)
//!
//! - [`Image`]
//!
//! # Example: Creating a Network
//!
//! ```rust,no_run
//! use orc::crd::{ManagementPolicy, NetworkResourceSpec, NetworkSpec};
//!
//! let spec = NetworkSpec {
//!     cloud: "devstack".to_string(),
//!     management_policy: ManagementPolicy::Managed,
//!     managed_options: None,
//!     resource: Some(NetworkResourceSpec {
//!         name: Some("n1".to_string()),
//!         ..Default::default()
//!     }),
//!     import: None,
//! };
//! ```

use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::{CustomResource, CustomResourceExt};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Common types
// ============================================================================

/// Whether the controller may mutate the OpenStack resource.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ManagementPolicy {
    /// The controller creates, updates and deletes the OpenStack resource.
    #[default]
    Managed,
    /// The controller only observes an imported OpenStack resource.
    Unmanaged,
}

/// What happens to the OpenStack resource when the Kubernetes object is deleted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum OnDelete {
    /// Delete the OpenStack resource.
    #[default]
    Delete,
    /// Leave the OpenStack resource in place.
    Detach,
}

/// Options that only apply to managed resources.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ManagedOptions {
    /// Behaviour on deletion of the Kubernetes object. Defaults to `delete`.
    #[serde(default)]
    pub on_delete: OnDelete,
}

/// Selects an existing OpenStack resource instead of creating one.
///
/// Exactly one of `id` or `filter` is expected.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Import<F> {
    /// OpenStack ID of the resource to import. The resource must already exist.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Filter matching exactly one existing OpenStack resource. The controller
    /// keeps polling until a match appears.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<F>,
}

/// Condition represents an observation of a resource's current state.
///
/// The controller writes exactly two conditions: `Available` and `Progressing`.
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition: `Available` or `Progressing`.
    pub r#type: String,

    /// Status of the condition: True, False, or Unknown.
    pub status: String,

    /// Brief CamelCase reason for the condition's last transition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Human-readable message indicating details about the transition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Generation of the object this condition was computed from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,

    /// Last time the condition transitioned from one status to another (RFC3339 format).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
}

/// An IP allocation pool of a subnet.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AllocationPool {
    pub start: String,
    pub end: String,
}

/// A static route advertised by DHCP.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HostRoute {
    pub destination: String,
    pub next_hop: String,
}

// ============================================================================
// Cloud
// ============================================================================

/// Reference to the `Secret` key holding a clouds.yaml document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CloudCredentialsSecretRef {
    /// Name of the `Secret` in the same namespace.
    pub name: String,
    /// Key within the `Secret` containing clouds.yaml.
    pub key: String,
}

/// Where the cloud credentials come from.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CloudCredentials {
    /// Credentials source. Only `secret` is supported.
    pub source: String,
    /// Secret holding clouds.yaml.
    pub secret_ref: CloudCredentialsSecretRef,
}

/// Cloud holds the credentials used to reach an OpenStack deployment.
///
/// # Example
///
/// ```yaml
/// apiVersion: openstack.k-orc.cloud/v1alpha1
/// kind: Cloud
/// metadata:
///   name: devstack
/// spec:
///   cloud: devstack
///   credentials:
///     source: secret
///     secretRef:
///       name: devstack-clouds
///       key: clouds.yaml
/// ```
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "openstack.k-orc.cloud",
    version = "v1alpha1",
    kind = "Cloud",
    namespaced,
    doc = "Cloud references OpenStack credentials in a Secret. Every other resource names a Cloud in its spec."
)]
#[kube(status = "CloudStatus")]
#[serde(rename_all = "camelCase")]
pub struct CloudSpec {
    /// Name of the entry under `clouds:` in clouds.yaml.
    pub cloud: String,

    /// Credentials source.
    pub credentials: CloudCredentials,
}

/// `Cloud` status
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CloudStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

// ============================================================================
// Network
// ============================================================================

/// Desired properties of a Neutron network.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NetworkResourceSpec {
    /// OpenStack name. Defaults to the object name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_state_up: Option<bool>,

    /// Share the network with all projects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared: Option<bool>,

    /// Mark the network as external (router gateway capable).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external: Option<bool>,

    /// Maximum transmission unit. Cannot be changed after creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mtu: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_domain: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_security_enabled: Option<bool>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub availability_zone_hints: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// Filter selecting an existing network to import.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NetworkFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// Observed properties of a Neutron network.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NetworkResourceStatus {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub project_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub status: String,
    #[serde(default)]
    pub admin_state_up: bool,
    #[serde(default)]
    pub shared: bool,
    #[serde(default)]
    pub external: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mtu: Option<i32>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub dns_domain: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_security_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub availability_zone_hints: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subnets: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision_number: Option<i64>,
}

/// Network manages a Neutron network.
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "openstack.k-orc.cloud",
    version = "v1alpha1",
    kind = "Network",
    namespaced,
    doc = "Network manages a Neutron network."
)]
#[kube(status = "NetworkStatus")]
#[serde(rename_all = "camelCase")]
pub struct NetworkSpec {
    /// Name of the `Cloud` providing credentials.
    pub cloud: String,
    #[serde(default)]
    pub management_policy: ManagementPolicy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub managed_options: Option<ManagedOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<NetworkResourceSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import: Option<Import<NetworkFilter>>,
}

/// `Network` status
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NetworkStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<NetworkResourceStatus>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

// ============================================================================
// Subnet
// ============================================================================

/// Desired properties of a Neutron subnet.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubnetResourceSpec {
    /// Name of the `Network` object this subnet belongs to.
    pub network_ref: String,

    /// CIDR of the subnet, e.g. `192.168.0.0/24`.
    pub cidr: String,

    /// IP version, 4 or 6.
    #[serde(default = "default_ip_version")]
    pub ip_version: i32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Gateway address. Leave unset for the Neutron default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway_ip: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_dhcp: Option<bool>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dns_nameservers: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allocation_pools: Vec<AllocationPool>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub host_routes: Vec<HostRoute>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv6_address_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv6_ra_mode: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

fn default_ip_version() -> i32 {
    4
}

/// Filter selecting an existing subnet to import.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubnetFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Name of the `Network` object the subnet must belong to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cidr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_version: Option<i32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// Observed properties of a Neutron subnet.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubnetResourceStatus {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub network_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub project_id: String,
    #[serde(default)]
    pub ip_version: i32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cidr: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway_ip: Option<String>,
    #[serde(default)]
    pub enable_dhcp: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dns_nameservers: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allocation_pools: Vec<AllocationPool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub host_routes: Vec<HostRoute>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv6_address_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv6_ra_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Subnet manages a Neutron subnet.
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "openstack.k-orc.cloud",
    version = "v1alpha1",
    kind = "Subnet",
    namespaced,
    doc = "Subnet manages a Neutron subnet on a Network."
)]
#[kube(status = "SubnetStatus")]
#[serde(rename_all = "camelCase")]
pub struct SubnetSpec {
    pub cloud: String,
    #[serde(default)]
    pub management_policy: ManagementPolicy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub managed_options: Option<ManagedOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<SubnetResourceSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import: Option<Import<SubnetFilter>>,
}

/// `Subnet` status
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubnetStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<SubnetResourceStatus>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

// ============================================================================
// Port
// ============================================================================

/// A fixed address requested on a port.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PortAddress {
    /// Name of the `Subnet` object to allocate from.
    pub subnet_ref: String,
    /// Specific IP address. Neutron picks one when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
}

/// An additional address allowed to send traffic through the port.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AllowedAddressPair {
    pub ip: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac: Option<String>,
}

/// Desired properties of a Neutron port.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PortResourceSpec {
    /// Name of the `Network` object the port is created on.
    pub network_ref: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_state_up: Option<bool>,

    /// Fixed addresses, each referencing a `Subnet` object.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub addresses: Vec<PortAddress>,

    /// Names of `SecurityGroup` objects applied to the port.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security_group_refs: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_address_pairs: Vec<AllowedAddressPair>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// Filter selecting an existing port to import.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PortFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Name of the `Network` object the port must be on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// A fixed IP observed on a port.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FixedIpStatus {
    pub ip: String,
    pub subnet_id: String,
}

/// Observed properties of a Neutron port.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PortResourceStatus {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub network_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub project_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub status: String,
    #[serde(default)]
    pub admin_state_up: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub mac_address: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub device_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub device_owner: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fixed_ips: Vec<FixedIpStatus>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security_groups: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_address_pairs: Vec<AllowedAddressPair>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Port manages a Neutron port.
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "openstack.k-orc.cloud",
    version = "v1alpha1",
    kind = "Port",
    namespaced,
    doc = "Port manages a Neutron port on a Network."
)]
#[kube(status = "PortStatus")]
#[serde(rename_all = "camelCase")]
pub struct PortSpec {
    pub cloud: String,
    #[serde(default)]
    pub management_policy: ManagementPolicy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub managed_options: Option<ManagedOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<PortResourceSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import: Option<Import<PortFilter>>,
}

/// `Port` status
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PortStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<PortResourceStatus>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

// ============================================================================
// Router
// ============================================================================

/// External gateway of a router.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExternalGateway {
    /// Name of the external `Network` object.
    pub network_ref: String,
}

/// Desired properties of a Neutron router.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RouterResourceSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_state_up: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distributed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_gateway: Option<ExternalGateway>,

    /// Names of `Port` objects attached to the router as interfaces.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub port_refs: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub availability_zone_hints: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// Filter selecting an existing router to import.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RouterFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// Observed properties of a Neutron router.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RouterResourceStatus {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub project_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub status: String,
    #[serde(default)]
    pub admin_state_up: bool,
    #[serde(default)]
    pub distributed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_gateway_network_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub availability_zone_hints: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Router manages a Neutron router.
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "openstack.k-orc.cloud",
    version = "v1alpha1",
    kind = "Router",
    namespaced,
    doc = "Router manages a Neutron router, its external gateway and its port interfaces."
)]
#[kube(status = "RouterStatus")]
#[serde(rename_all = "camelCase")]
pub struct RouterSpec {
    pub cloud: String,
    #[serde(default)]
    pub management_policy: ManagementPolicy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub managed_options: Option<ManagedOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<RouterResourceSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import: Option<Import<RouterFilter>>,
}

/// `Router` status
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RouterStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<RouterResourceStatus>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

// ============================================================================
// FloatingIP
// ============================================================================

/// Desired properties of a Neutron floating IP.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FloatingIPResourceSpec {
    /// Name of the external `Network` object to allocate from.
    pub floating_network_ref: String,

    /// Name of the `Port` object to associate with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_ref: Option<String>,

    /// Specific floating address to request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floating_ip_address: Option<String>,

    /// Fixed address on the port to map to, when the port has several.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_ip_address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// Filter selecting an existing floating IP to import.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FloatingIPFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floating_ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// Observed properties of a Neutron floating IP.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FloatingIPResourceStatus {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub floating_network_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub floating_ip_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub router_id: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub project_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub status: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// FloatingIP manages a Neutron floating IP.
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "openstack.k-orc.cloud",
    version = "v1alpha1",
    kind = "FloatingIP",
    namespaced,
    doc = "FloatingIP manages a Neutron floating IP, optionally associated with a Port."
)]
#[kube(status = "FloatingIPStatus")]
#[serde(rename_all = "camelCase")]
pub struct FloatingIPSpec {
    pub cloud: String,
    #[serde(default)]
    pub management_policy: ManagementPolicy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub managed_options: Option<ManagedOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<FloatingIPResourceSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import: Option<Import<FloatingIPFilter>>,
}

/// `FloatingIP` status
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FloatingIPStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<FloatingIPResourceStatus>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

// ============================================================================
// SecurityGroup
// ============================================================================

/// Desired properties of a Neutron security group.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecurityGroupResourceSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Stateful (default) or stateless filtering. Cannot be changed after creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stateful: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// Filter selecting an existing security group to import.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecurityGroupFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// Observed properties of a Neutron security group.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecurityGroupResourceStatus {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub project_id: String,
    #[serde(default)]
    pub stateful: bool,
    /// IDs of the rules currently in the group.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rule_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// SecurityGroup manages a Neutron security group.
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "openstack.k-orc.cloud",
    version = "v1alpha1",
    kind = "SecurityGroup",
    namespaced,
    doc = "SecurityGroup manages a Neutron security group."
)]
#[kube(status = "SecurityGroupStatus")]
#[serde(rename_all = "camelCase")]
pub struct SecurityGroupSpec {
    pub cloud: String,
    #[serde(default)]
    pub management_policy: ManagementPolicy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub managed_options: Option<ManagedOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<SecurityGroupResourceSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import: Option<Import<SecurityGroupFilter>>,
}

/// `SecurityGroup` status
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecurityGroupStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<SecurityGroupResourceStatus>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

// ============================================================================
// SecurityGroupRule
// ============================================================================

/// Desired properties of a Neutron security group rule.
///
/// Rules are immutable in Neutron. Any change requires deleting and
/// recreating the object.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecurityGroupRuleResourceSpec {
    /// Name of the `SecurityGroup` object the rule belongs to.
    pub security_group_ref: String,

    /// `ingress` or `egress`.
    pub direction: String,

    /// `IPv4` or `IPv6`.
    #[serde(default = "default_ether_type")]
    pub ether_type: String,

    /// Protocol name or number, e.g. `tcp`, `udp`, `icmp`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_range_min: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_range_max: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_ip_prefix: Option<String>,

    /// Name of a `SecurityGroup` object used as the remote group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_group_ref: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn default_ether_type() -> String {
    "IPv4".to_string()
}

/// Filter selecting an existing security group rule to import.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecurityGroupRuleFilter {
    /// Name of the `SecurityGroup` object the rule must belong to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_group_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Observed properties of a Neutron security group rule.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecurityGroupRuleResourceStatus {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub security_group_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub direction: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ether_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_range_min: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_range_max: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_ip_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_group_id: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub project_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// SecurityGroupRule manages a single Neutron security group rule.
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "openstack.k-orc.cloud",
    version = "v1alpha1",
    kind = "SecurityGroupRule",
    namespaced,
    doc = "SecurityGroupRule manages a single rule of a SecurityGroup."
)]
#[kube(status = "SecurityGroupRuleStatus")]
#[serde(rename_all = "camelCase")]
pub struct SecurityGroupRuleSpec {
    pub cloud: String,
    #[serde(default)]
    pub management_policy: ManagementPolicy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub managed_options: Option<ManagedOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<SecurityGroupRuleResourceSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import: Option<Import<SecurityGroupRuleFilter>>,
}

/// `SecurityGroupRule` status
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecurityGroupRuleStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<SecurityGroupRuleResourceStatus>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

// ============================================================================
// Flavor
// ============================================================================

/// Desired properties of a Nova flavor. Flavors cannot be changed after creation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FlavorResourceSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Memory in MiB.
    pub ram: i32,
    pub vcpus: i32,
    /// Root disk size in GiB.
    pub disk: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swap: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ephemeral: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rxtx_factor: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Filter selecting an existing flavor to import.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FlavorFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ram: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vcpus: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk: Option<i32>,
}

/// Observed properties of a Nova flavor.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FlavorResourceStatus {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default)]
    pub ram: i32,
    #[serde(default)]
    pub vcpus: i32,
    #[serde(default)]
    pub disk: i32,
    #[serde(default)]
    pub swap: i32,
    #[serde(default)]
    pub ephemeral: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rxtx_factor: Option<f64>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Flavor manages a Nova flavor.
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "openstack.k-orc.cloud",
    version = "v1alpha1",
    kind = "Flavor",
    namespaced,
    doc = "Flavor manages a Nova flavor."
)]
#[kube(status = "FlavorStatus")]
#[serde(rename_all = "camelCase")]
pub struct FlavorSpec {
    pub cloud: String,
    #[serde(default)]
    pub management_policy: ManagementPolicy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub managed_options: Option<ManagedOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<FlavorResourceSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import: Option<Import<FlavorFilter>>,
}

/// `Flavor` status
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FlavorStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<FlavorResourceStatus>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

// ============================================================================
// Image
// ============================================================================

/// Source for a Glance `web-download` import.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageWebDownload {
    /// URL Glance downloads the image data from.
    pub url: String,
}

/// Desired properties of a Glance image.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageResourceSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Container format, e.g. `bare`.
    pub container_format: String,
    /// Disk format, e.g. `qcow2` or `raw`.
    pub disk_format: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_disk: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_ram: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protected: Option<bool>,
    /// `public`, `private`, `shared` or `community`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Populate the image from a URL after creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_download: Option<ImageWebDownload>,
}

/// Filter selecting an existing image to import.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// Observed properties of a Glance image.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageResourceStatus {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_format: Option<String>,
    #[serde(default)]
    pub min_disk: i32,
    #[serde(default)]
    pub min_ram: i32,
    #[serde(default)]
    pub protected: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub visibility: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub owner: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_size: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Image manages a Glance image.
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "openstack.k-orc.cloud",
    version = "v1alpha1",
    kind = "Image",
    namespaced,
    doc = "Image manages a Glance image, optionally populated by a web-download import."
)]
#[kube(status = "ImageStatus")]
#[serde(rename_all = "camelCase")]
pub struct ImageSpec {
    pub cloud: String,
    #[serde(default)]
    pub management_policy: ManagementPolicy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub managed_options: Option<ManagedOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<ImageResourceSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import: Option<Import<ImageFilter>>,
}

/// `Image` status
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<ImageResourceStatus>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

// ============================================================================
// KeyPair
// ============================================================================

/// Desired properties of a Nova keypair. Keypairs are immutable.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KeyPairResourceSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// OpenSSH public key.
    pub public_key: String,
    /// `ssh` (default) or `x509`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r#type: Option<String>,
}

/// Filter selecting an existing keypair to import.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KeyPairFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Observed properties of a Nova keypair.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KeyPairResourceStatus {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub public_key: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub fingerprint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r#type: Option<String>,
}

/// KeyPair manages a Nova keypair.
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "openstack.k-orc.cloud",
    version = "v1alpha1",
    kind = "KeyPair",
    namespaced,
    doc = "KeyPair manages a Nova keypair. The OpenStack ID of a keypair is its name."
)]
#[kube(status = "KeyPairStatus")]
#[serde(rename_all = "camelCase")]
pub struct KeyPairSpec {
    pub cloud: String,
    #[serde(default)]
    pub management_policy: ManagementPolicy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub managed_options: Option<ManagedOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<KeyPairResourceSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import: Option<Import<KeyPairFilter>>,
}

/// `KeyPair` status
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KeyPairStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<KeyPairResourceStatus>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

// ============================================================================
// Server
// ============================================================================

/// Desired properties of a Nova server. Servers are never updated in place.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServerResourceSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Name of the `Image` object to boot from.
    pub image_ref: String,

    /// Name of the `Flavor` object.
    pub flavor_ref: String,

    /// Names of `Port` objects attached to the server, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub port_refs: Vec<String>,

    /// Name of the `KeyPair` object injected into the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_pair_ref: Option<String>,

    /// Cloud-init user data in plain text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_data: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability_zone: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// Filter selecting an existing server to import.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServerFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// Observed properties of a Nova server.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServerResourceStatus {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub status: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub host_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub project_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flavor_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_ipv4: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_ipv6: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fault: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Server manages a Nova server.
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "openstack.k-orc.cloud",
    version = "v1alpha1",
    kind = "Server",
    namespaced,
    doc = "Server manages a Nova server booted from an Image with a Flavor and a set of Ports."
)]
#[kube(status = "ServerStatus")]
#[serde(rename_all = "camelCase")]
pub struct ServerSpec {
    pub cloud: String,
    #[serde(default)]
    pub management_policy: ManagementPolicy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub managed_options: Option<ManagedOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<ServerResourceSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import: Option<Import<ServerFilter>>,
}

/// `Server` status
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServerStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<ServerResourceStatus>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

/// Every CustomResourceDefinition served by the controller, `Cloud` first.
#[must_use]
pub fn all_crds() -> Vec<CustomResourceDefinition> {
    vec![
        Cloud::crd(),
        Network::crd(),
        Subnet::crd(),
        Port::crd(),
        Router::crd(),
        FloatingIP::crd(),
        SecurityGroup::crd(),
        SecurityGroupRule::crd(),
        Flavor::crd(),
        Image::crd(),
        KeyPair::crd(),
        Server::crd(),
    ]
}

#[cfg(test)]
#[path = "crd_tests.rs"]
mod crd_tests;
