// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Authenticated HTTP client for one OpenStack service.
//!
//! [`ServiceClient`] adds the token and microversion headers, retries 429 and
//! 5xx responses with [`http_backoff`], re-authenticates once after a 401 and
//! maps failures onto [`OpenStackError`]. List calls follow pagination links
//! until the collection is exhausted.

use crate::metrics::record_openstack_request;
use crate::openstack::auth::Session;
use crate::openstack::error::OpenStackError;
use crate::reconcilers::retry::{http_backoff, is_retryable_http_status};
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";
const NOVA_MICROVERSION_HEADER: &str = "X-OpenStack-Nova-API-Version";
const GLANCE_PATCH_CONTENT_TYPE: &str = "application/openstack-images-v2.1-json-patch";
const MAX_ERROR_BODY_LEN: usize = 512;

/// Send a request built by `build`, retrying 429, 5xx and connection failures.
///
/// The last response is returned unchanged once the backoff is exhausted or
/// the status is not retryable; callers map non-success statuses.
///
/// # Errors
///
/// Returns [`OpenStackError::Transport`] when no response could be obtained.
pub(crate) async fn send_with_retry<F>(
    service: &str,
    method: &Method,
    url: &str,
    build: F,
) -> Result<Response, OpenStackError>
where
    F: Fn() -> RequestBuilder,
{
    let mut backoff = http_backoff();

    loop {
        let started = Instant::now();
        let result = build().send().await;
        record_openstack_request(
            service,
            method.as_str(),
            result.as_ref().ok().map(|r| r.status().as_u16()),
            started.elapsed(),
        );

        let retry_reason = match &result {
            Ok(response) if is_retryable_http_status(response.status()) => {
                Some(format!("HTTP {}", response.status().as_u16()))
            }
            Err(e) if e.is_connect() || e.is_timeout() => Some(e.to_string()),
            _ => None,
        };

        let Some(retry_reason) = retry_reason else {
            break result.map_err(|source| OpenStackError::Transport {
                url: url.to_string(),
                source,
            });
        };

        match backoff.next_backoff() {
            Some(delay) => {
                warn!(
                    service,
                    method = %method,
                    url,
                    reason = %retry_reason,
                    retry_after = ?delay,
                    "Retryable OpenStack response, will retry"
                );
                tokio::time::sleep(delay).await;
            }
            None => {
                break result.map_err(|source| OpenStackError::Transport {
                    url: url.to_string(),
                    source,
                });
            }
        }
    }
}

/// Map a non-success response onto [`OpenStackError`].
pub(crate) async fn error_from_response(service: &str, response: Response) -> OpenStackError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body);

    match status {
        StatusCode::NOT_FOUND => OpenStackError::not_found(service, message),
        StatusCode::CONFLICT => OpenStackError::conflict(service, message),
        _ => OpenStackError::Http {
            service: service.to_string(),
            status: status.as_u16(),
            message,
        },
    }
}

/// Human readable message from an OpenStack error body.
///
/// Services wrap the message differently: Neutron under `NeutronError`, Nova
/// under a fault name such as `itemNotFound`, Keystone under `error`.
#[must_use]
pub fn error_message(body: &str) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        if let Some(Value::String(message)) = map.get("message") {
            return message.clone();
        }
        let nested = map
            .values()
            .filter_map(|v| v.get("message").and_then(Value::as_str))
            .next();
        if let Some(message) = nested {
            return message.to_string();
        }
    }
    let trimmed = body.trim();
    if trimmed.len() > MAX_ERROR_BODY_LEN {
        let mut end = MAX_ERROR_BODY_LEN;
        while !trimmed.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &trimmed[..end])
    } else {
        trimmed.to_string()
    }
}

/// Normalize an OpenStack timestamp to UTC RFC 3339.
///
/// Neutron and Nova sometimes omit the offset; those values are UTC.
/// Unparseable input is returned unchanged.
#[must_use]
pub fn normalize_timestamp(raw: &str) -> String {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed
            .with_timezone(&Utc)
            .to_rfc3339_opts(SecondsFormat::Secs, true);
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return naive
                .and_utc()
                .to_rfc3339_opts(SecondsFormat::Secs, true);
        }
    }
    raw.to_string()
}

/// [`normalize_timestamp`] over an optional value, dropping empty strings.
#[must_use]
pub fn normalize_opt_timestamp(raw: Option<&str>) -> Option<String> {
    raw.filter(|s| !s.is_empty()).map(normalize_timestamp)
}

/// Query string parameters for list calls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query(Vec<(String, String)>);

impl Query {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn push(mut self, key: &str, value: impl ToString) -> Self {
        self.0.push((key.to_string(), value.to_string()));
        self
    }

    /// Add `key` only when `value` is set.
    #[must_use]
    pub fn opt<V: ToString>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.push(key, v),
            None => self,
        }
    }

    /// Neutron-style tag filter: all tags comma-joined under one key.
    #[must_use]
    pub fn tags(self, key: &str, tags: &[String]) -> Self {
        if tags.is_empty() {
            self
        } else {
            self.push(key, tags.join(","))
        }
    }

    /// Glance-style tag filter: one repeated key per tag.
    #[must_use]
    pub fn repeated(mut self, key: &str, values: &[String]) -> Self {
        for v in values {
            self.0.push((key.to_string(), v.clone()));
        }
        self
    }

    #[must_use]
    pub fn pairs(&self) -> &[(String, String)] {
        &self.0
    }
}

/// Which pagination convention a service uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pagination {
    /// `<collection>_links` with a `rel: next` entry (Neutron, Nova).
    Links,
    /// Top-level `next` path relative to the service root (Glance).
    Next,
}

/// HTTP client bound to one service endpoint of a [`Session`].
#[derive(Clone)]
pub struct ServiceClient {
    session: Arc<Session>,
    service: &'static str,
    endpoint: String,
    microversion: Option<&'static str>,
    pagination: Pagination,
}

impl ServiceClient {
    /// Neutron client: the catalog URL with `/v2.0` appended.
    ///
    /// # Errors
    ///
    /// Returns [`OpenStackError::EndpointNotFound`] if the catalog lacks the service.
    pub async fn network(session: Arc<Session>) -> Result<Self, OpenStackError> {
        let endpoint = session.endpoint(crate::constants::SERVICE_NETWORK).await?;
        Ok(Self::with_endpoint(
            session,
            crate::constants::SERVICE_NETWORK,
            with_version_suffix(&endpoint, "v2.0"),
        ))
    }

    /// Nova client pinned to [`crate::constants::COMPUTE_MICROVERSION`].
    ///
    /// # Errors
    ///
    /// Returns [`OpenStackError::EndpointNotFound`] if the catalog lacks the service.
    pub async fn compute(session: Arc<Session>) -> Result<Self, OpenStackError> {
        let endpoint = session.endpoint(crate::constants::SERVICE_COMPUTE).await?;
        let mut client = Self::with_endpoint(session, crate::constants::SERVICE_COMPUTE, endpoint);
        client.microversion = Some(crate::constants::COMPUTE_MICROVERSION);
        Ok(client)
    }

    /// Glance client: the catalog URL with `/v2` appended.
    ///
    /// # Errors
    ///
    /// Returns [`OpenStackError::EndpointNotFound`] if the catalog lacks the service.
    pub async fn image(session: Arc<Session>) -> Result<Self, OpenStackError> {
        let endpoint = session.endpoint(crate::constants::SERVICE_IMAGE).await?;
        let mut client = Self::with_endpoint(
            session,
            crate::constants::SERVICE_IMAGE,
            with_version_suffix(&endpoint, "v2"),
        );
        client.pagination = Pagination::Next;
        Ok(client)
    }

    /// Client for an explicit endpoint, bypassing the catalog.
    #[must_use]
    pub fn with_endpoint(session: Arc<Session>, service: &'static str, endpoint: String) -> Self {
        Self {
            session,
            service,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            microversion: None,
            pagination: Pagination::Links,
        }
    }

    #[must_use]
    pub fn service(&self) -> &'static str {
        self.service
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Project the session's token is scoped to.
    ///
    /// # Errors
    ///
    /// Returns the authentication error.
    pub async fn project_id(&self) -> Result<Option<String>, OpenStackError> {
        self.session.project_id().await
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path.trim_start_matches('/'))
    }

    fn url_with_query(&self, path: &str, query: &Query) -> Result<String, OpenStackError> {
        let mut url = url::Url::parse(&self.url(path))
            .map_err(|e| OpenStackError::Config(format!("invalid endpoint URL: {e}")))?;
        if !query.pairs().is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in query.pairs() {
                pairs.append_pair(k, v);
            }
        }
        Ok(url.into())
    }

    /// Send one request and return the successful response.
    async fn execute(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
        content_type: Option<&str>,
    ) -> Result<Response, OpenStackError> {
        let mut reauthenticated = false;

        loop {
            let token = self.session.token().await?;
            let build = || {
                let mut request = self
                    .session
                    .http()
                    .request(method.clone(), url)
                    .header(AUTH_TOKEN_HEADER, token.as_str())
                    .header(reqwest::header::ACCEPT, "application/json");
                if let Some(version) = self.microversion {
                    request = request.header(NOVA_MICROVERSION_HEADER, version);
                }
                if let Some(body) = body {
                    request = request
                        .header(
                            reqwest::header::CONTENT_TYPE,
                            content_type.unwrap_or("application/json"),
                        )
                        .body(body.to_string());
                }
                request
            };

            let response = send_with_retry(self.service, &method, url, build).await?;
            let status = response.status();

            if status == StatusCode::UNAUTHORIZED && !reauthenticated {
                debug!(service = self.service, "Token rejected, re-authenticating");
                self.session.invalidate().await;
                reauthenticated = true;
                continue;
            }

            if status.is_success() {
                return Ok(response);
            }
            return Err(error_from_response(self.service, response).await);
        }
    }

    async fn decode<T: DeserializeOwned>(&self, response: Response) -> Result<T, OpenStackError> {
        response
            .json()
            .await
            .map_err(|e| OpenStackError::decode(&format!("{} response", self.service), e))
    }

    /// `GET` a path and decode the JSON body.
    ///
    /// # Errors
    ///
    /// Returns the mapped HTTP or decode error.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, OpenStackError> {
        let url = self.url(path);
        let response = self.execute(Method::GET, &url, None, None).await?;
        self.decode(response).await
    }

    /// `GET` a path and take the object under `key`.
    ///
    /// # Errors
    ///
    /// Returns the mapped HTTP or decode error.
    pub async fn get_wrapped<T: DeserializeOwned>(
        &self,
        path: &str,
        key: &str,
    ) -> Result<T, OpenStackError> {
        let value: Value = self.get(path).await?;
        unwrap_key(value, key)
    }

    /// `POST` a JSON body and decode the response.
    ///
    /// # Errors
    ///
    /// Returns the mapped HTTP or decode error.
    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &Value,
    ) -> Result<T, OpenStackError> {
        let url = self.url(path);
        let response = self.execute(Method::POST, &url, Some(body), None).await?;
        self.decode(response).await
    }

    /// `POST` a JSON body and ignore the response body.
    ///
    /// # Errors
    ///
    /// Returns the mapped HTTP error.
    pub async fn post_no_content(&self, path: &str, body: &Value) -> Result<(), OpenStackError> {
        let url = self.url(path);
        self.execute(Method::POST, &url, Some(body), None).await?;
        Ok(())
    }

    /// `PUT` a JSON body and decode the response.
    ///
    /// # Errors
    ///
    /// Returns the mapped HTTP or decode error.
    pub async fn put<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &Value,
    ) -> Result<T, OpenStackError> {
        let url = self.url(path);
        let response = self.execute(Method::PUT, &url, Some(body), None).await?;
        self.decode(response).await
    }

    /// `PATCH` a Glance JSON-patch document and decode the response.
    ///
    /// # Errors
    ///
    /// Returns the mapped HTTP or decode error.
    pub async fn patch_json<T: DeserializeOwned>(
        &self,
        path: &str,
        operations: &Value,
    ) -> Result<T, OpenStackError> {
        let url = self.url(path);
        let response = self
            .execute(
                Method::PATCH,
                &url,
                Some(operations),
                Some(GLANCE_PATCH_CONTENT_TYPE),
            )
            .await?;
        self.decode(response).await
    }

    /// `DELETE` a path.
    ///
    /// # Errors
    ///
    /// Returns the mapped HTTP error; 404 maps to [`OpenStackError::NotFound`].
    pub async fn delete(&self, path: &str) -> Result<(), OpenStackError> {
        let url = self.url(path);
        self.execute(Method::DELETE, &url, None, None).await?;
        Ok(())
    }

    /// List a collection, following pagination until exhausted.
    ///
    /// `key` names the JSON array in each page, e.g. `networks`.
    ///
    /// # Errors
    ///
    /// Returns the mapped HTTP or decode error of any page.
    pub async fn list<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &Query,
        key: &str,
    ) -> Result<Vec<T>, OpenStackError> {
        let mut items = Vec::new();
        let mut next = Some(self.url_with_query(path, query)?);

        while let Some(url) = next.take() {
            let response = self.execute(Method::GET, &url, None, None).await?;
            let mut page: Value = self.decode(response).await?;

            let batch = page
                .get_mut(key)
                .map(Value::take)
                .ok_or_else(|| OpenStackError::decode(key, "missing collection in list response"))?;
            let batch: Vec<T> =
                serde_json::from_value(batch).map_err(|e| OpenStackError::decode(key, e))?;
            let exhausted = batch.is_empty();
            items.extend(batch);

            if !exhausted {
                next = self.next_page(&page, key).filter(|n| *n != url);
            }
        }

        Ok(items)
    }

    fn next_page(&self, page: &Value, key: &str) -> Option<String> {
        match self.pagination {
            Pagination::Links => page
                .get(format!("{key}_links"))
                .and_then(Value::as_array)
                .and_then(|links| {
                    links
                        .iter()
                        .find(|l| l.get("rel").and_then(Value::as_str) == Some("next"))
                })
                .and_then(|l| l.get("href").and_then(Value::as_str))
                .map(str::to_string),
            Pagination::Next => page
                .get("next")
                .and_then(Value::as_str)
                .map(|next| {
                    // Glance returns the next page relative to the service root,
                    // version prefix included.
                    let relative = next.trim_start_matches('/');
                    let relative = relative.strip_prefix("v2/").unwrap_or(relative);
                    self.url(relative)
                }),
        }
    }
}

/// Take the object under `key` of a wrapped response such as `{"network": {...}}`.
///
/// # Errors
///
/// Returns [`OpenStackError::Decode`] if `key` is missing or has the wrong shape.
pub fn unwrap_key<T: DeserializeOwned>(mut value: Value, key: &str) -> Result<T, OpenStackError> {
    let inner = value
        .get_mut(key)
        .map(Value::take)
        .ok_or_else(|| OpenStackError::decode(key, "missing key in response"))?;
    serde_json::from_value(inner).map_err(|e| OpenStackError::decode(key, e))
}

fn with_version_suffix(endpoint: &str, version: &str) -> String {
    let trimmed = endpoint.trim_end_matches('/');
    if trimmed.ends_with(&format!("/{version}")) {
        trimmed.to_string()
    } else {
        format!("{trimmed}/{version}")
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod client_tests;
