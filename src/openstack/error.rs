// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types returned by the OpenStack service clients.
//!
//! 404 and Keystone authentication failures have their own variants so the
//! reconciliation engine can classify them without inspecting messages.

use thiserror::Error;

/// Errors returned by OpenStack HTTP calls.
#[derive(Error, Debug)]
pub enum OpenStackError {
    /// The requested resource does not exist (HTTP 404).
    #[error("{service}: resource not found: {message}")]
    NotFound {
        /// Service type that returned the error, e.g. `network`
        service: String,
        message: String,
    },

    /// The request conflicts with existing state (HTTP 409).
    #[error("{service}: conflict: {message}")]
    Conflict { service: String, message: String },

    /// Keystone rejected the credentials (any 4xx from the identity service).
    #[error("authentication failed (HTTP {status}): {message}")]
    Unauthorized { status: u16, message: String },

    /// Any other non-success HTTP status.
    #[error("{service}: HTTP {status}: {message}")]
    Http {
        service: String,
        status: u16,
        message: String,
    },

    /// The request never produced a response.
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// A response body could not be decoded.
    #[error("failed to decode {what}: {message}")]
    Decode { what: String, message: String },

    /// The clouds.yaml document or the selected cloud entry is unusable.
    #[error("invalid cloud configuration: {0}")]
    Config(String),

    /// The Keystone catalog has no endpoint for a required service.
    #[error("no {service} endpoint with interface {interface} in the service catalog")]
    EndpointNotFound { service: String, interface: String },
}

impl OpenStackError {
    pub fn not_found(service: &str, message: impl Into<String>) -> Self {
        Self::NotFound {
            service: service.to_string(),
            message: message.into(),
        }
    }

    pub fn conflict(service: &str, message: impl Into<String>) -> Self {
        Self::Conflict {
            service: service.to_string(),
            message: message.into(),
        }
    }

    pub fn decode(what: &str, err: impl std::fmt::Display) -> Self {
        Self::Decode {
            what: what.to_string(),
            message: err.to_string(),
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// Whether repeating the same request could succeed.
    ///
    /// Client errors other than 404, 408 and 429 will fail again until the
    /// request changes.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Conflict { .. } | Self::Config(_) => false,
            Self::Http { status, .. } => !(400..500).contains(status) || matches!(status, 408 | 429),
            _ => true,
        }
    }

    /// HTTP status code, when the error came from a response.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::NotFound { .. } => Some(404),
            Self::Conflict { .. } => Some(409),
            Self::Unauthorized { status, .. } | Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;
