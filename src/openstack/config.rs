// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `clouds.yaml` parsing.
//!
//! A `Cloud` object points at a Secret key holding a standard `clouds.yaml`
//! document; `spec.cloud` selects one entry of it.

use crate::constants::DEFAULT_ENDPOINT_INTERFACE;
use crate::openstack::error::OpenStackError;
use serde::Deserialize;
use std::collections::HashMap;

/// Top-level `clouds.yaml` document.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct CloudsYaml {
    #[serde(default)]
    pub clouds: HashMap<String, CloudConfig>,
}

/// One entry under `clouds:`.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct CloudConfig {
    #[serde(default)]
    pub auth: AuthConfig,
    pub auth_type: Option<String>,
    pub region_name: Option<String>,
    pub interface: Option<String>,
    /// `false` disables TLS certificate verification.
    pub verify: Option<bool>,
    /// CA bundle: inline PEM or a path to a PEM file.
    pub cacert: Option<String>,
}

/// The `auth:` block of a cloud entry.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct AuthConfig {
    pub auth_url: Option<String>,
    pub username: Option<String>,
    pub user_id: Option<String>,
    pub password: Option<String>,
    pub project_name: Option<String>,
    pub project_id: Option<String>,
    pub user_domain_name: Option<String>,
    pub user_domain_id: Option<String>,
    pub project_domain_name: Option<String>,
    pub project_domain_id: Option<String>,
    /// Fallback for both user and project domain when the specific keys are absent.
    pub domain_name: Option<String>,
    pub domain_id: Option<String>,
    pub application_credential_id: Option<String>,
    pub application_credential_name: Option<String>,
    pub application_credential_secret: Option<String>,
}

/// Authentication method selected from `auth_type` and the keys present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthMethod {
    Password,
    ApplicationCredential,
}

impl CloudsYaml {
    /// Parse a `clouds.yaml` document.
    ///
    /// # Errors
    ///
    /// Returns [`OpenStackError::Config`] when the YAML is malformed.
    pub fn parse(document: &str) -> Result<Self, OpenStackError> {
        serde_yaml::from_str(document)
            .map_err(|e| OpenStackError::Config(format!("unmarshaling clouds.yaml: {e}")))
    }

    /// Take the named cloud entry out of the document.
    ///
    /// # Errors
    ///
    /// Returns [`OpenStackError::Config`] when the entry is missing.
    pub fn into_cloud(mut self, name: &str) -> Result<CloudConfig, OpenStackError> {
        self.clouds
            .remove(name)
            .ok_or_else(|| OpenStackError::Config(format!("cloud {name:?} not found in clouds.yaml")))
    }
}

impl CloudConfig {
    /// Parse `document` and select the `name` entry.
    ///
    /// # Errors
    ///
    /// Returns [`OpenStackError::Config`] if the document is malformed, the
    /// entry is missing, or the entry cannot authenticate.
    pub fn from_clouds_yaml(document: &str, name: &str) -> Result<Self, OpenStackError> {
        let cloud = CloudsYaml::parse(document)?.into_cloud(name)?;
        cloud.validate()?;
        Ok(cloud)
    }

    /// Endpoint interface to select from the catalog.
    #[must_use]
    pub fn interface(&self) -> &str {
        self.interface
            .as_deref()
            .map_or(DEFAULT_ENDPOINT_INTERFACE, |i| i.trim_end_matches("URL"))
    }

    /// # Errors
    ///
    /// Returns [`OpenStackError::Config`] for an unsupported `auth_type`.
    pub fn auth_method(&self) -> Result<AuthMethod, OpenStackError> {
        match self.auth_type.as_deref() {
            Some("password" | "v3password") => Ok(AuthMethod::Password),
            Some("v3applicationcredential") => Ok(AuthMethod::ApplicationCredential),
            Some(other) => Err(OpenStackError::Config(format!(
                "unsupported auth_type {other:?}"
            ))),
            None if self.auth.application_credential_secret.is_some() => {
                Ok(AuthMethod::ApplicationCredential)
            }
            None => Ok(AuthMethod::Password),
        }
    }

    /// Check that the entry carries what its auth method needs.
    ///
    /// # Errors
    ///
    /// Returns [`OpenStackError::Config`] naming the first missing key.
    pub fn validate(&self) -> Result<(), OpenStackError> {
        let missing = |key: &str| OpenStackError::Config(format!("auth.{key} is required"));

        if self.auth.auth_url.as_deref().is_none_or(str::is_empty) {
            return Err(missing("auth_url"));
        }

        match self.auth_method()? {
            AuthMethod::Password => {
                if self.auth.username.is_none() && self.auth.user_id.is_none() {
                    return Err(missing("username"));
                }
                if self.auth.password.is_none() {
                    return Err(missing("password"));
                }
            }
            AuthMethod::ApplicationCredential => {
                if self.auth.application_credential_secret.is_none() {
                    return Err(missing("application_credential_secret"));
                }
                if self.auth.application_credential_id.is_none()
                    && self.auth.application_credential_name.is_none()
                {
                    return Err(missing("application_credential_id"));
                }
            }
        }
        Ok(())
    }

    pub(crate) fn user_domain(&self) -> (Option<&str>, Option<&str>) {
        (
            self.auth
                .user_domain_id
                .as_deref()
                .or(self.auth.domain_id.as_deref()),
            self.auth
                .user_domain_name
                .as_deref()
                .or(self.auth.domain_name.as_deref()),
        )
    }

    pub(crate) fn project_domain(&self) -> (Option<&str>, Option<&str>) {
        (
            self.auth
                .project_domain_id
                .as_deref()
                .or(self.auth.domain_id.as_deref()),
            self.auth
                .project_domain_name
                .as_deref()
                .or(self.auth.domain_name.as_deref()),
        )
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
