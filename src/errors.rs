// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Reconciliation error types.
//!
//! Errors are classified by variant, never by message:
//!
//! - [`OrcError::Terminal`] - the controller refuses to retry; `Progressing=False`
//!   carries the [`TerminalReason`]
//! - everything else is transient; `Progressing=True/TransientError` and the
//!   work queue retries with backoff
//!
//! A NotFound from OpenStack is not itself an error for the engine. Callers use
//! [`OrcError::is_not_found`] to interpret it in context.

use crate::openstack::OpenStackError;
use crate::status_reasons::{
    REASON_BAD_CREDENTIALS, REASON_INVALID_CONFIGURATION, REASON_UNRECOVERABLE_ERROR,
};
use std::fmt;
use thiserror::Error;

/// Reason code carried by a terminal error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TerminalReason {
    InvalidConfiguration,
    UnrecoverableError,
    BadCredentials,
}

impl TerminalReason {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidConfiguration => REASON_INVALID_CONFIGURATION,
            Self::UnrecoverableError => REASON_UNRECOVERABLE_ERROR,
            Self::BadCredentials => REASON_BAD_CREDENTIALS,
        }
    }
}

impl fmt::Display for TerminalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced by a reconcile.
#[derive(Error, Debug)]
pub enum OrcError {
    /// An error the controller will not retry.
    #[error("{message}")]
    Terminal {
        reason: TerminalReason,
        message: String,
    },

    #[error(transparent)]
    OpenStack(#[from] OpenStackError),

    #[error(transparent)]
    Kube(#[from] kube::Error),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),

    /// Several independent failures, e.g. from an update plan.
    #[error("{}", join_messages(.0))]
    Multiple(Vec<OrcError>),
}

fn join_messages(errors: &[OrcError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl OrcError {
    pub fn terminal(reason: TerminalReason, message: impl Into<String>) -> Self {
        Self::Terminal {
            reason,
            message: message.into(),
        }
    }

    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        Self::terminal(TerminalReason::InvalidConfiguration, message)
    }

    pub fn unrecoverable(message: impl Into<String>) -> Self {
        Self::terminal(TerminalReason::UnrecoverableError, message)
    }

    pub fn bad_credentials(message: impl Into<String>) -> Self {
        Self::terminal(TerminalReason::BadCredentials, message)
    }

    /// Combine zero or more errors. Returns `None` when `errors` is empty.
    #[must_use]
    pub fn join(mut errors: Vec<OrcError>) -> Option<OrcError> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(Self::Multiple(errors)),
        }
    }

    /// The terminal reason of this error, or of the first terminal error it wraps.
    #[must_use]
    pub fn terminal_reason(&self) -> Option<TerminalReason> {
        match self {
            Self::Terminal { reason, .. } => Some(*reason),
            Self::Multiple(errors) => errors.iter().find_map(OrcError::terminal_reason),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.terminal_reason().is_some()
    }

    /// Whether OpenStack reported the resource as missing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::OpenStack(e) if e.is_not_found())
    }

    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::OpenStack(e) if e.is_conflict())
    }

    /// Short category used for metrics labels.
    #[must_use]
    pub fn category(&self) -> &'static str {
        match self {
            Self::Terminal { reason, .. } => reason.as_str(),
            Self::OpenStack(_) => "openstack",
            Self::Kube(_) => "kubernetes",
            Self::Serialization(_) => "serialization",
            Self::Other(_) => "other",
            Self::Multiple(_) => "multiple",
        }
    }
}

/// Whether a Kubernetes API error is a 404.
#[must_use]
pub fn is_kube_not_found(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(ae) if ae.code == 404)
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod errors_tests;
