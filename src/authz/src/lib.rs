//! # Warden Authorization Engine
//!
//! Decides whether an identity may perform an action on a resource.
//!
//! ## Model
//!
//! - Resources are addressed by URNs built with [`urn::build_urn`]
//! - Policies hold Allow/Deny [`Statement`]s scoped by action and URN patterns
//! - Users inherit the statements of every policy attached to their groups
//! - Any applying Deny wins; nothing applying means deny
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use warden_authz::{Authorizer, InMemoryRepository, RequestInfo};
//!
//! # async fn example() -> warden_authz::Result<()> {
//! let repo = Arc::new(InMemoryRepository::new());
//! let authorizer = Authorizer::new(repo);
//!
//! let identity = RequestInfo::new("alice");
//! let allowed = authorizer
//!     .is_allowed(&identity, "urn:ews:org1:widget/42", "widget:read")
//!     .await?;
//!
//! // alice holds no policies yet
//! assert!(!allowed);
//! # Ok(())
//! # }
//! ```

pub mod engine;
pub mod error;
pub mod policy;
pub mod store;
pub mod types;
pub mod urn;
pub mod users;

// Re-export commonly used types
pub use engine::Authorizer;
pub use error::{AuthzError, Result};
pub use policy::{evaluate, Effect, Policy, Statement, Verdict};
pub use store::{
    AuthzRepository, InMemoryRepository, ProxyResourceRepository, Snapshot, StoreError,
    UserRepository,
};
pub use types::{Group, GroupIdentity, ProxyResource, RequestInfo, UrnResource, User};
pub use users::UserService;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
