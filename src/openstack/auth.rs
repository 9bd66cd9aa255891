// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Keystone v3 authentication.
//!
//! A [`Session`] holds one scoped token and its service catalog. Service
//! clients ask it for a token before each request; it re-authenticates when
//! the token is within [`TOKEN_RENEWAL_MARGIN_SECS`] of expiry or after a
//! service rejected it.

use crate::constants::{OPENSTACK_REQUEST_TIMEOUT_SECS, TOKEN_RENEWAL_MARGIN_SECS};
use crate::openstack::client::{error_from_response, send_with_retry};
use crate::openstack::config::{AuthMethod, CloudConfig};
use crate::openstack::error::OpenStackError;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Service type used for Keystone in metrics and errors.
pub const SERVICE_IDENTITY: &str = "identity";

const SUBJECT_TOKEN_HEADER: &str = "X-Subject-Token";

/// An issued token with its catalog.
#[derive(Debug, Clone)]
pub struct Token {
    pub value: String,
    pub expires_at: DateTime<Utc>,
    pub catalog: Vec<CatalogEntry>,
    /// Project the token is scoped to. `None` for an unscoped token.
    pub project_id: Option<String>,
}

impl Token {
    /// Whether the token is still usable at `now`, keeping the renewal margin.
    #[must_use]
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - ChronoDuration::seconds(TOKEN_RENEWAL_MARGIN_SECS) > now
    }

    /// URL of the `service_type` endpoint for `interface`, optionally in `region`.
    #[must_use]
    pub fn endpoint(&self, service_type: &str, interface: &str, region: Option<&str>) -> Option<&str> {
        self.catalog
            .iter()
            .filter(|entry| entry.r#type == service_type)
            .flat_map(|entry| entry.endpoints.iter())
            .find(|ep| {
                ep.interface == interface
                    && region.is_none_or(|r| {
                        ep.region_id.as_deref() == Some(r) || ep.region.as_deref() == Some(r)
                    })
            })
            .map(|ep| ep.url.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogEntry {
    pub r#type: String,
    #[serde(default)]
    pub endpoints: Vec<CatalogEndpoint>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogEndpoint {
    pub interface: String,
    pub region: Option<String>,
    pub region_id: Option<String>,
    pub url: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    token: TokenBody,
}

#[derive(Deserialize)]
struct TokenBody {
    expires_at: DateTime<Utc>,
    #[serde(default)]
    catalog: Vec<CatalogEntry>,
    project: Option<TokenProject>,
}

#[derive(Deserialize)]
struct TokenProject {
    id: String,
}

/// Authenticated connection to one cloud.
pub struct Session {
    http: reqwest::Client,
    config: CloudConfig,
    token: RwLock<Option<Token>>,
}

impl Session {
    /// Build the HTTP client for `config`. No request is made.
    ///
    /// # Errors
    ///
    /// Returns [`OpenStackError::Config`] if the CA bundle cannot be loaded or
    /// the HTTP client cannot be built.
    pub fn new(config: CloudConfig) -> Result<Self, OpenStackError> {
        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(OPENSTACK_REQUEST_TIMEOUT_SECS));

        if config.verify == Some(false) {
            builder = builder.danger_accept_invalid_certs(true);
        }

        if let Some(cacert) = &config.cacert {
            let pem = if cacert.trim_start().starts_with("-----BEGIN") {
                cacert.clone().into_bytes()
            } else {
                std::fs::read(cacert).map_err(|e| {
                    OpenStackError::Config(format!("reading cacert {cacert}: {e}"))
                })?
            };
            let cert = reqwest::Certificate::from_pem(&pem)
                .map_err(|e| OpenStackError::Config(format!("parsing cacert: {e}")))?;
            builder = builder.add_root_certificate(cert);
        }

        let http = builder
            .build()
            .map_err(|e| OpenStackError::Config(format!("building HTTP client: {e}")))?;

        Ok(Self {
            http,
            config,
            token: RwLock::new(None),
        })
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    #[must_use]
    pub fn config(&self) -> &CloudConfig {
        &self.config
    }

    /// A valid token value, authenticating if needed.
    ///
    /// # Errors
    ///
    /// Returns the authentication error.
    pub async fn token(&self) -> Result<String, OpenStackError> {
        {
            let guard = self.token.read().await;
            if let Some(token) = guard.as_ref().filter(|t| t.is_fresh(Utc::now())) {
                return Ok(token.value.clone());
            }
        }

        let mut guard = self.token.write().await;
        if let Some(token) = guard.as_ref().filter(|t| t.is_fresh(Utc::now())) {
            return Ok(token.value.clone());
        }
        let token = self.request_token().await?;
        let value = token.value.clone();
        *guard = Some(token);
        Ok(value)
    }

    /// Force a new token, replacing any cached one.
    ///
    /// # Errors
    ///
    /// Returns [`OpenStackError::Unauthorized`] when Keystone rejects the
    /// credentials, or the transport error.
    pub async fn authenticate(&self) -> Result<(), OpenStackError> {
        let token = self.request_token().await?;
        *self.token.write().await = Some(token);
        Ok(())
    }

    /// Drop the cached token so the next call re-authenticates.
    pub async fn invalidate(&self) {
        *self.token.write().await = None;
    }

    /// Catalog URL for `service_type` on the configured interface and region.
    ///
    /// # Errors
    ///
    /// Returns [`OpenStackError::EndpointNotFound`] if the catalog has no match.
    pub async fn endpoint(&self, service_type: &str) -> Result<String, OpenStackError> {
        self.token().await?;
        let guard = self.token.read().await;
        let interface = self.config.interface();
        guard
            .as_ref()
            .and_then(|t| t.endpoint(service_type, interface, self.config.region_name.as_deref()))
            .map(|url| url.trim_end_matches('/').to_string())
            .ok_or_else(|| OpenStackError::EndpointNotFound {
                service: service_type.to_string(),
                interface: interface.to_string(),
            })
    }

    /// ID of the project the current token is scoped to.
    ///
    /// # Errors
    ///
    /// Returns the authentication error.
    pub async fn project_id(&self) -> Result<Option<String>, OpenStackError> {
        self.token().await?;
        let guard = self.token.read().await;
        Ok(guard.as_ref().and_then(|t| t.project_id.clone()))
    }

    async fn request_token(&self) -> Result<Token, OpenStackError> {
        let url = tokens_url(self.config.auth.auth_url.as_deref().unwrap_or_default());
        let body = auth_request_body(&self.config)?;
        debug!(url = %url, "Requesting Keystone token");

        let response = send_with_retry(SERVICE_IDENTITY, &Method::POST, &url, || {
            self.http.post(&url).json(&body)
        })
        .await?;

        let status = response.status();
        if !status.is_success() {
            let err = error_from_response(SERVICE_IDENTITY, response).await;
            if status.is_client_error() {
                return Err(OpenStackError::Unauthorized {
                    status: status.as_u16(),
                    message: err.to_string(),
                });
            }
            return Err(err);
        }

        let value = response
            .headers()
            .get(SUBJECT_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| OpenStackError::decode("Keystone token", "missing X-Subject-Token header"))?;

        let parsed: TokenResponse = response
            .json()
            .await
            .map_err(|e| OpenStackError::decode("Keystone token", e))?;

        let project_id = parsed.token.project.map(|p| p.id);
        info!(
            expires_at = %parsed.token.expires_at,
            project_id = ?project_id,
            "Authenticated with Keystone"
        );

        Ok(Token {
            value,
            expires_at: parsed.token.expires_at,
            catalog: parsed.token.catalog,
            project_id,
        })
    }
}

/// `{auth_url}/v3/auth/tokens`, tolerating an `auth_url` that already ends in `/v3`.
#[must_use]
pub fn tokens_url(auth_url: &str) -> String {
    let base = auth_url.trim_end_matches('/');
    if base.ends_with("/v3") {
        format!("{base}/auth/tokens")
    } else {
        format!("{base}/v3/auth/tokens")
    }
}

fn insert_opt(map: &mut Map<String, Value>, key: &str, value: Option<&str>) {
    if let Some(v) = value {
        map.insert(key.to_string(), Value::String(v.to_string()));
    }
}

fn domain(id: Option<&str>, name: Option<&str>) -> Option<Value> {
    let mut map = Map::new();
    insert_opt(&mut map, "id", id);
    insert_opt(&mut map, "name", name);
    (!map.is_empty()).then_some(Value::Object(map))
}

fn user_object(config: &CloudConfig) -> Map<String, Value> {
    let mut user = Map::new();
    insert_opt(&mut user, "id", config.auth.user_id.as_deref());
    insert_opt(&mut user, "name", config.auth.username.as_deref());
    if config.auth.user_id.is_none() {
        let (id, name) = config.user_domain();
        if let Some(d) = domain(id, name) {
            user.insert("domain".to_string(), d);
        }
    }
    user
}

/// Keystone v3 `auth` request body for the configured method.
///
/// # Errors
///
/// Returns [`OpenStackError::Config`] for an unsupported `auth_type`.
pub fn auth_request_body(config: &CloudConfig) -> Result<Value, OpenStackError> {
    let identity = match config.auth_method()? {
        AuthMethod::Password => {
            let mut user = user_object(config);
            insert_opt(&mut user, "password", config.auth.password.as_deref());
            json!({ "methods": ["password"], "password": { "user": user } })
        }
        AuthMethod::ApplicationCredential => {
            let mut credential = Map::new();
            insert_opt(&mut credential, "id", config.auth.application_credential_id.as_deref());
            insert_opt(
                &mut credential,
                "secret",
                config.auth.application_credential_secret.as_deref(),
            );
            if config.auth.application_credential_id.is_none() {
                insert_opt(
                    &mut credential,
                    "name",
                    config.auth.application_credential_name.as_deref(),
                );
                credential.insert("user".to_string(), Value::Object(user_object(config)));
            }
            // Application credentials carry their own project scope.
            return Ok(json!({
                "auth": {
                    "identity": {
                        "methods": ["application_credential"],
                        "application_credential": credential,
                    }
                }
            }));
        }
    };

    let mut auth = Map::new();
    auth.insert("identity".to_string(), identity);

    let mut project = Map::new();
    insert_opt(&mut project, "id", config.auth.project_id.as_deref());
    insert_opt(&mut project, "name", config.auth.project_name.as_deref());
    if !project.is_empty() {
        if config.auth.project_id.is_none() {
            let (id, name) = config.project_domain();
            if let Some(d) = domain(id, name) {
                project.insert("domain".to_string(), d);
            }
        }
        auth.insert("scope".to_string(), json!({ "project": project }));
    }

    Ok(json!({ "auth": auth }))
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod auth_tests;
