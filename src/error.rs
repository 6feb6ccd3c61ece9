//! Error types for the HCP frontend
//!
//! Provides structured error types for resource addressing, the Cluster
//! Service clients, the database probe and the service lifecycle.

use thiserror::Error;

use crate::domain::internal_id::ResourceKind;
use crate::frontend::lifecycle::LifecycleState;

/// Unified error type for the frontend
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Internal Errors
    // =========================================================================
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // =========================================================================
    // Resource Addressing Errors
    // =========================================================================
    #[error("Invalid resource path: {0}")]
    InvalidResourcePath(String),

    #[error("Resource path is not a {expected}: {path}")]
    KindMismatch { expected: ResourceKind, path: String },

    // =========================================================================
    // Cluster Service Errors
    // =========================================================================
    #[error("Resource not found: {kind}/{id}")]
    NotFound { kind: ResourceKind, id: String },

    #[error("Resource already exists: {kind}/{id}")]
    AlreadyExists { kind: ResourceKind, id: String },

    #[error("Empty response body from Cluster Service: {operation}")]
    EmptyBody { operation: String },

    #[error("Cluster Service connection error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Cluster Service returned {status}: {reason}")]
    Api { status: u16, reason: String },

    #[error("Request cancelled")]
    Cancelled,

    // =========================================================================
    // Lifecycle Errors
    // =========================================================================
    #[error("Invalid lifecycle transition: {from} -> {to}")]
    InvalidTransition {
        from: LifecycleState,
        to: LifecycleState,
    },

    // =========================================================================
    // Database Errors
    // =========================================================================
    #[error("Database error: {0}")]
    Database(String),

    // =========================================================================
    // Parse Errors
    // =========================================================================
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    // =========================================================================
    // IO Errors
    // =========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a not-found error for the given kind and id
    pub fn not_found(kind: ResourceKind, id: impl Into<String>) -> Self {
        Error::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Create an empty-body error for the given remote operation
    pub fn empty_body(operation: impl Into<String>) -> Self {
        Error::EmptyBody {
            operation: operation.into(),
        }
    }

    /// Check if this error reports a missing resource
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    /// Check if this error is transient
    ///
    /// Retrying is left to the caller; nothing in this crate retries.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Transport(e) => e.is_timeout() || e.is_connect(),
            Error::Api { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

/// Result type alias for the frontend
pub type Result<T> = std::result::Result<T, Error>;
