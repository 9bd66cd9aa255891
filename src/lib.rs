// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

#![allow(unexpected_cfgs)]

//! # ORC - OpenStack Resource Controller for Kubernetes
//!
//! ORC manages OpenStack resources (networks, subnets, ports, routers,
//! floating IPs, security groups, flavors, images, keypairs and servers)
//! through namespaced Custom Resource Definitions.
//!
//! ## Overview
//!
//! Each object names a `Cloud` in its namespace, which holds the credentials
//! used to reach OpenStack. The controller:
//!
//! - creates, adopts or imports the OpenStack resource
//! - records its OpenStack ID in `status.id` and mirrors it in `status.resource`
//! - applies in-place updates where OpenStack allows them
//! - deletes it once nothing references it, unless told to detach
//!
//! ## Modules
//!
//! - [`crd`] - Custom Resource Definition types
//! - [`reconcilers`] - the generic reconcile pipeline and one actuator per kind
//! - [`openstack`] - Keystone authentication and Neutron, Nova and Glance clients
//! - [`controller`] - controller registration and sibling watches
//! - [`context`] - state shared by every controller
//! - [`metrics`] - Prometheus metrics and health probes
//!
//! ## Example
//!
//! ```rust,no_run
//! use orc::crd::{NetworkResourceSpec, NetworkSpec};
//!
//! let spec = NetworkSpec {
//!     cloud: "devstack".to_string(),
//!     management_policy: Default::default(),
//!     managed_options: None,
//!     resource: Some(NetworkResourceSpec {
//!         description: Some("application network".to_string()),
//!         ..Default::default()
//!     }),
//!     import: None,
//! };
//! ```

pub mod config;
pub mod constants;
pub mod context;
pub mod controller;
pub mod crd;
pub mod errors;
pub mod events;
pub mod labels;
pub mod metrics;
pub mod openstack;
pub mod reconcilers;
pub mod status_reasons;
