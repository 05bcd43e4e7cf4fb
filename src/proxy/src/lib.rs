//! Warden proxy gateway
//!
//! Fronts backend services: each registered `(method, path)` maps to a
//! resource URN and action that must be authorized before the request is
//! forwarded to the resource's host.

pub mod client;
pub mod error;
pub mod forward;
pub mod gateway;
pub mod resources;

pub use client::{AuthzClient, LocalAuthzClient, RemoteAuthzClient};
pub use error::{ProxyError, Result};
pub use forward::Forwarder;
pub use gateway::{create_router, Gateway};
pub use resources::ResourceTable;
