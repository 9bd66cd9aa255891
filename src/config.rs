// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Command-line configuration of the controller manager.

use crate::constants::{
    KIND_CLOUD, KIND_FLAVOR, KIND_FLOATING_IP, KIND_IMAGE, KIND_KEY_PAIR, KIND_NETWORK, KIND_PORT,
    KIND_ROUTER, KIND_SECURITY_GROUP, KIND_SECURITY_GROUP_RULE, KIND_SERVER, KIND_SUBNET,
    METRICS_SERVER_BIND_ADDRESS,
};
use anyhow::{bail, Result};
use clap::Parser;

/// Every kind with a controller, in start-up order.
pub const CONTROLLER_KINDS: &[&str] = &[
    KIND_CLOUD,
    KIND_NETWORK,
    KIND_SUBNET,
    KIND_SECURITY_GROUP,
    KIND_SECURITY_GROUP_RULE,
    KIND_PORT,
    KIND_ROUTER,
    KIND_FLOATING_IP,
    KIND_FLAVOR,
    KIND_IMAGE,
    KIND_KEY_PAIR,
    KIND_SERVER,
];

/// ORC - OpenStack resource controller for Kubernetes
#[derive(Parser, Debug, Clone)]
#[command(name = "orc", version, about, long_about = None)]
pub struct Args {
    /// Address the metrics and health server listens on
    #[arg(long, default_value = METRICS_SERVER_BIND_ADDRESS)]
    pub metrics_bind_address: String,

    /// Concurrent reconciles per controller
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..))]
    pub concurrency: u16,

    /// Only watch this namespace. All namespaces when unset.
    #[arg(long)]
    pub namespace: Option<String>,

    /// Comma-separated kinds to run controllers for. All kinds when unset.
    #[arg(long, value_delimiter = ',')]
    pub controllers: Vec<String>,

    /// Print the CustomResourceDefinitions as YAML and exit
    #[arg(long)]
    pub crd: bool,
}

impl Args {
    /// Kinds selected by `--controllers`, matched case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first unknown kind.
    pub fn enabled_kinds(&self) -> Result<Vec<&'static str>> {
        if self.controllers.is_empty() {
            return Ok(CONTROLLER_KINDS.to_vec());
        }

        let mut kinds = Vec::new();
        for requested in &self.controllers {
            let requested = requested.trim();
            let Some(kind) = CONTROLLER_KINDS
                .iter()
                .find(|k| k.eq_ignore_ascii_case(requested))
            else {
                bail!(
                    "unknown controller {requested:?}, expected one of {}",
                    CONTROLLER_KINDS.join(", ")
                );
            };
            if !kinds.contains(kind) {
                kinds.push(*kind);
            }
        }
        Ok(kinds)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
