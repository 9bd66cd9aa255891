// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! OpenStack API clients.
//!
//! A [`CloudClients`] bundles one authenticated [`auth::Session`] with a typed
//! client per service found in the Keystone catalog:
//!
//! - [`network::NetworkClient`] for Neutron
//! - [`compute::ComputeClient`] for Nova
//! - [`image::ImageClient`] for Glance

pub mod auth;
pub mod client;
pub mod compute;
pub mod config;
pub mod error;
pub mod image;
pub mod network;

#[cfg(test)]
pub(crate) mod testing;

pub use client::ServiceClient;
pub use error::OpenStackError;

use crate::constants::{SERVICE_COMPUTE, SERVICE_IMAGE, SERVICE_NETWORK};
use auth::Session;
use compute::ComputeClient;
use config::CloudConfig;
use image::ImageClient;
use network::NetworkClient;
use std::sync::Arc;
use tracing::debug;

/// Authenticated clients for every service of one cloud.
#[derive(Clone)]
pub struct CloudClients {
    session: Arc<Session>,
    network: Option<NetworkClient>,
    compute: Option<ComputeClient>,
    image: Option<ImageClient>,
}

impl CloudClients {
    /// Authenticate against `config` and resolve the service endpoints.
    ///
    /// Services missing from the catalog are tolerated here; using one later
    /// returns [`OpenStackError::EndpointNotFound`].
    ///
    /// # Errors
    ///
    /// Returns [`OpenStackError::Unauthorized`] when Keystone rejects the
    /// credentials, or any transport error.
    pub async fn connect(config: CloudConfig) -> Result<Self, OpenStackError> {
        let session = Arc::new(Session::new(config)?);
        session.authenticate().await?;

        let network = optional(ServiceClient::network(session.clone()).await)?;
        let compute = optional(ServiceClient::compute(session.clone()).await)?;
        let image = optional(ServiceClient::image(session.clone()).await)?;

        debug!(
            network = network.is_some(),
            compute = compute.is_some(),
            image = image.is_some(),
            "Resolved OpenStack service endpoints"
        );

        Ok(Self::from_services(session, network, compute, image))
    }

    /// Assemble clients from already-resolved service clients.
    #[must_use]
    pub fn from_services(
        session: Arc<Session>,
        network: Option<ServiceClient>,
        compute: Option<ServiceClient>,
        image: Option<ServiceClient>,
    ) -> Self {
        Self {
            session,
            network: network.map(NetworkClient::new),
            compute: compute.map(ComputeClient::new),
            image: image.map(ImageClient::new),
        }
    }

    #[must_use]
    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Project the cloud credentials are scoped to.
    ///
    /// # Errors
    ///
    /// Returns the authentication error.
    pub async fn project_id(&self) -> Result<Option<String>, OpenStackError> {
        self.session.project_id().await
    }

    /// # Errors
    ///
    /// Returns [`OpenStackError::EndpointNotFound`] if the cloud has no network service.
    pub fn network(&self) -> Result<&NetworkClient, OpenStackError> {
        self.network
            .as_ref()
            .ok_or_else(|| self.missing(SERVICE_NETWORK))
    }

    /// # Errors
    ///
    /// Returns [`OpenStackError::EndpointNotFound`] if the cloud has no compute service.
    pub fn compute(&self) -> Result<&ComputeClient, OpenStackError> {
        self.compute
            .as_ref()
            .ok_or_else(|| self.missing(SERVICE_COMPUTE))
    }

    /// # Errors
    ///
    /// Returns [`OpenStackError::EndpointNotFound`] if the cloud has no image service.
    pub fn image(&self) -> Result<&ImageClient, OpenStackError> {
        self.image.as_ref().ok_or_else(|| self.missing(SERVICE_IMAGE))
    }

    fn missing(&self, service: &str) -> OpenStackError {
        OpenStackError::EndpointNotFound {
            service: service.to_string(),
            interface: self.session.config().interface().to_string(),
        }
    }
}

fn optional(
    result: Result<ServiceClient, OpenStackError>,
) -> Result<Option<ServiceClient>, OpenStackError> {
    match result {
        Ok(client) => Ok(Some(client)),
        Err(OpenStackError::EndpointNotFound { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}
