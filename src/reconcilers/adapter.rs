// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Helpers shared by the per-kind actuators.

use crate::errors::OrcError;
use crate::reconcilers::actuator::{Lookup, UpdateStep};
use anyhow::anyhow;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::future::Future;

/// OpenStack name for an object: `spec.resource.name`, else the object's name.
#[must_use]
pub fn resource_name(object_name: &str, name: Option<&String>) -> String {
    name.cloned().unwrap_or_else(|| object_name.to_string())
}

/// At most one candidate. More than one is a terminal `InvalidConfiguration`.
///
/// # Errors
///
/// Returns the terminal error when the candidates are ambiguous.
pub fn at_most_one<R>(mut candidates: Vec<R>) -> Result<Option<R>, OrcError> {
    match candidates.len() {
        0 => Ok(None),
        1 => Ok(candidates.pop()),
        n => Err(OrcError::invalid_configuration(format!(
            "Expected to find exactly one OpenStack resource to import. Found {n}"
        ))),
    }
}

/// The adoption candidate, if any. More than one `kind` matching `spec.resource`
/// is a terminal `InvalidConfiguration`.
///
/// # Errors
///
/// Returns the terminal error when the candidates are ambiguous.
pub fn single_match<R>(kind: &str, mut candidates: Vec<R>) -> Result<Option<R>, OrcError> {
    match candidates.len() {
        0 => Ok(None),
        1 => Ok(candidates.pop()),
        _ => Err(OrcError::invalid_configuration(format!(
            "found more than one matching {kind}"
        ))),
    }
}

/// Import filter result from a filtered list.
///
/// # Errors
///
/// Returns a terminal error when the filter matches more than one resource.
pub fn import_lookup<R>(candidates: Vec<R>) -> Result<Lookup<R>, OrcError> {
    Ok(match at_most_one(candidates)? {
        Some(resource) => Lookup::Found(resource),
        None => Lookup::Absent,
    })
}

/// Candidates whose ID is not already recorded by another object.
pub fn unclaimed<R>(
    candidates: Vec<R>,
    claimed: &HashSet<String>,
    id: impl Fn(&R) -> &str,
) -> Vec<R> {
    candidates
        .into_iter()
        .filter(|r| !claimed.contains(id(r)))
        .collect()
}

/// The ID of a resolved sibling, or an error when deletion proceeds without it.
///
/// # Errors
///
/// Returns an error naming the unresolved sibling.
pub fn required<'a>(id: Option<&'a String>, kind: &str, name: &str) -> Result<&'a str, OrcError> {
    id.map(String::as_str)
        .ok_or_else(|| OrcError::from(anyhow!("{kind} {name} is not resolved")))
}

/// Error for a create requested without `spec.resource`.
#[must_use]
pub fn missing_resource() -> OrcError {
    OrcError::invalid_configuration("Creation requested, but spec.resource is not set")
}

/// Serialize a status mirror.
///
/// # Errors
///
/// Returns a serialization error.
pub fn mirror<T: Serialize>(status: &T) -> Result<Value, OrcError> {
    Ok(serde_json::to_value(status)?)
}

/// Box one update call as an [`UpdateStep`].
pub fn step<'a, F, E>(future: F) -> UpdateStep<'a>
where
    F: Future<Output = Result<(), E>> + Send + 'a,
    E: Into<OrcError>,
{
    Box::pin(async move { future.await.map_err(Into::into) })
}

#[cfg(test)]
#[path = "adapter_tests.rs"]
mod adapter_tests;
