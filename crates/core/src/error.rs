//! Error taxonomy shared across the workspace.

use std::collections::BTreeMap;

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Per-field messages reported by the server (field name -> messages).
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Domain-level error.
///
/// Keep this focused on deterministic, local failures (validation, malformed
/// identifiers). Failures of the remote API are modelled by [`ApiError`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A requested resource was not found (domain-level).
    #[error("not found")]
    NotFound,
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }
}

/// Failure of a call to the remote API.
///
/// Every network-facing operation returns this instead of panicking. The
/// variants are machine-distinguishable so callers can decide between showing
/// the server's message, dropping a stale reference, or offering a retry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The caller is not authenticated or lacks permission (401/403).
    #[error("not authorized ({status}): {detail}")]
    Unauthorized { status: u16, detail: String },

    /// The server rejected the request content (400/422).
    #[error("rejected by server: {detail}")]
    Validation { detail: String, fields: FieldErrors },

    /// The referenced resource no longer exists server-side (404).
    #[error("{resource} not found")]
    NotFound { resource: String },

    /// Network failure, server error, or a response we could not understand.
    #[error("request failed: {0}")]
    Transient(String),
}

impl ApiError {
    pub fn unauthorized(status: u16, detail: impl Into<String>) -> Self {
        Self::Unauthorized {
            status,
            detail: detail.into(),
        }
    }

    pub fn validation(detail: impl Into<String>, fields: FieldErrors) -> Self {
        Self::Validation {
            detail: detail.into(),
            fields,
        }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    pub fn transient(msg: impl Into<String>) -> Self {
        Self::Transient(msg.into())
    }

    /// Only transient failures are worth retrying unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::Transient(_))
    }

    /// Message suitable for showing to the user.
    ///
    /// Authorization and validation messages come from the server and are
    /// surfaced verbatim; transient failures get a generic retry hint.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Unauthorized { detail, .. } => detail.clone(),
            ApiError::Validation { detail, fields } => {
                if fields.is_empty() {
                    return detail.clone();
                }
                let per_field: Vec<String> = fields
                    .iter()
                    .map(|(field, messages)| format!("{field}: {}", messages.join(" ")))
                    .collect();
                format!("{detail} ({})", per_field.join("; "))
            }
            ApiError::NotFound { resource } => format!("{resource} no longer exists"),
            ApiError::Transient(_) => {
                "Could not reach the server. Please try again.".to_string()
            }
        }
    }
}
