// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Crate error types.
//!
//! Unknown catalog references and stale durable records are silent
//! degradations and never surface here; these variants cover real faults
//! and caller-enforced preconditions.

use crate::models::PolicyKind;

#[derive(Debug, thiserror::Error)]
pub enum CoverageError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Unknown policy type: {0}")]
    UnknownPolicyType(String),

    #[error("Invalid {policy_type} policy, missing fields: {}", missing_fields.join(", "))]
    InvalidPolicy {
        policy_type: &'static str,
        missing_fields: Vec<String>,
    },

    #[error("No user selection is loaded")]
    NotReady,

    #[error("Identity mismatch: expected {expected}, got {actual}")]
    IdentityMismatch { expected: String, actual: String },

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl CoverageError {
    pub fn invalid_policy(kind: PolicyKind, missing_fields: Vec<String>) -> Self {
        CoverageError::InvalidPolicy {
            policy_type: kind.as_str(),
            missing_fields,
        }
    }
}

/// Errors from loading the static catalog data.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to read {path}: {message}")]
    Io { path: String, message: String },

    #[error("Failed to parse {file}: {source}")]
    Parse {
        file: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Catalog invariant violated: {0}")]
    Invariant(String),
}

/// Result type alias for library operations
pub type Result<T> = std::result::Result<T, CoverageError>;
