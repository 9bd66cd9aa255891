// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Reconciliation of OpenStack-backed Kubernetes objects.
//!
//! Every kind runs through the same pipeline:
//!
//! 1. **Runner** ([`runner::reconcile`]) - loads the object, manages the
//!    finalizer and dependency labels, resolves the `Cloud` and siblings
//! 2. **Engine** ([`engine`]) - resolves, adopts, creates, updates or deletes
//!    the OpenStack resource through the kind's [`actuator::Actuator`]
//! 3. **Status** ([`apply`], [`conditions`]) - writes `status.id`,
//!    `status.resource` and the `Available`/`Progressing` conditions
//!
//! # Kinds
//!
//! ## Networking (Neutron)
//!
//! - [`network`], [`subnet`], [`port`], [`router`], [`floatingip`]
//! - [`securitygroup`], [`securitygrouprule`]
//!
//! ## Compute (Nova)
//!
//! - [`flavor`], [`keypair`], [`server`]
//!
//! ## Images (Glance)
//!
//! - [`image`]
//!
//! The `Cloud` kind has its own reconciler in [`cloud`]: it verifies
//! credentials and never owns an OpenStack resource.

pub mod actuator;
pub mod adapter;
pub mod apply;
pub mod cloud;
pub mod compare;
pub mod conditions;
pub mod engine;
pub mod kind;
pub mod pagination;
pub mod retry;
pub mod runner;
pub mod wait;

pub mod flavor;
pub mod floatingip;
pub mod image;
pub mod keypair;
pub mod network;
pub mod port;
pub mod router;
pub mod securitygroup;
pub mod securitygrouprule;
pub mod server;
pub mod subnet;

pub use cloud::reconcile_cloud;
pub use runner::reconcile;
