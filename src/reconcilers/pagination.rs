// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Pagination helpers for Kubernetes API list operations.
//!
//! Adoption checks and referencing-object lookups list whole namespaces of a
//! kind; fetching in pages keeps each response bounded.

use crate::constants::KUBE_LIST_PAGE_SIZE;
use kube::{api::ListParams, Api};
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use tracing::debug;

/// List all objects matching `list_params`, one page at a time.
///
/// Works for typed resources and for `DynamicObject`.
///
/// # Example
///
/// ```no_run
/// use kube::{Api, Client, api::ListParams};
/// use orc::crd::Network;
/// use orc::reconcilers::pagination::list_all_paginated;
///
/// # async fn example() -> Result<(), kube::Error> {
/// let client = Client::try_default().await?;
/// let api: Api<Network> = Api::namespaced(client, "default");
///
/// let networks = list_all_paginated(&api, ListParams::default()).await?;
/// println!("Found {} networks", networks.len());
/// # Ok(())
/// # }
/// ```
///
/// # Errors
///
/// Returns the first Kubernetes API error.
pub async fn list_all_paginated<K>(
    api: &Api<K>,
    mut list_params: ListParams,
) -> Result<Vec<K>, kube::Error>
where
    K: Clone + DeserializeOwned + Debug,
{
    list_params.limit = Some(page_limit(list_params.limit));

    let mut all_items = Vec::new();
    let mut page_count = 0;

    loop {
        page_count += 1;
        let result = api.list(&list_params).await?;

        let item_count = result.items.len();
        all_items.extend(result.items);

        debug!(
            page = page_count,
            items_in_page = item_count,
            total_items = all_items.len(),
            "Fetched page from Kubernetes API"
        );

        match next_continue_token(result.metadata.continue_) {
            Some(token) => list_params.continue_token = Some(token),
            None => break,
        }
    }

    Ok(all_items)
}

/// Caller-requested page size, capped at [`KUBE_LIST_PAGE_SIZE`].
#[must_use]
pub fn page_limit(requested: Option<u32>) -> u32 {
    requested.map_or(KUBE_LIST_PAGE_SIZE, |r| r.clamp(1, KUBE_LIST_PAGE_SIZE))
}

/// The API server signals the last page with a missing or empty token.
#[must_use]
pub fn next_continue_token(token: Option<String>) -> Option<String> {
    token.filter(|t| !t.is_empty())
}

#[cfg(test)]
#[path = "pagination_tests.rs"]
mod pagination_tests;
