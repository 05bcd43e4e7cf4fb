//! Error types for the authorization engine

use crate::store::StoreError;
use thiserror::Error;

/// Authorization engine errors
#[derive(Debug, Error)]
pub enum AuthzError {
    /// Malformed identifier, path, URN or action, rejected before construction
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Identity, group, policy or proxy resource absent
    #[error("Not found: {0}")]
    NotFound(String),

    /// Evaluation verdict was Deny or NoMatch
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Duplicate external identifier on create
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Authorization server or backend unreachable
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Unexpected repository fault
    #[error("Internal error: {0}")]
    Internal(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<StoreError> for AuthzError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(msg) => AuthzError::NotFound(msg),
            StoreError::AlreadyExists(msg) => AuthzError::AlreadyExists(msg),
            StoreError::Internal(msg) => AuthzError::Internal(msg),
        }
    }
}

/// Result type for authorization operations
pub type Result<T> = std::result::Result<T, AuthzError>;
