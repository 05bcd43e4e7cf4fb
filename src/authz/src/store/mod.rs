//! Repository traits consumed by the authorization engine
//!
//! The engine only ever reads through [`AuthzRepository`]. User
//! administration additionally writes through [`UserRepository`].

pub mod memory;

pub use memory::{InMemoryRepository, Snapshot};

use crate::policy::Policy;
use crate::types::{Group, ProxyResource, User};
use async_trait::async_trait;
use thiserror::Error;

/// Repository errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0} already exists")]
    AlreadyExists(String),

    #[error("{0}")]
    Internal(String),
}

/// Result type for repository operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Read operations needed to resolve an identity's effective statements
#[async_trait]
pub trait AuthzRepository: Send + Sync {
    /// Look up a user by the identifier the authenticator hands out
    async fn get_user_by_external_id(&self, external_id: &str) -> StoreResult<User>;

    /// All groups the user is a member of
    async fn get_groups_by_user_id(&self, user_id: &str) -> StoreResult<Vec<Group>>;

    /// All policies attached to the group
    async fn get_attached_policies(&self, group_id: &str) -> StoreResult<Vec<Policy>>;
}

/// User persistence
#[async_trait]
pub trait UserRepository: AuthzRepository {
    async fn add_user(&self, user: User) -> StoreResult<User>;

    async fn update_user(&self, user: User) -> StoreResult<User>;

    async fn remove_user(&self, id: &str) -> StoreResult<()>;

    /// Users whose path starts with `path_prefix`, in insertion order
    async fn get_users_filtered(&self, path_prefix: &str) -> StoreResult<Vec<User>>;
}

/// Source of the gateway's resource table
#[async_trait]
pub trait ProxyResourceRepository: Send + Sync {
    async fn get_proxy_resources(&self) -> StoreResult<Vec<ProxyResource>>;
}
