//! Warden authorization server
//!
//! REST surface over [`warden_authz`]: authorization queries for opaque
//! resource URNs, user administration and OpenAPI documentation.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;
pub mod state;

pub use auth::{AuthError, Authenticator, HeaderAuthenticator};
pub use error::{ApiError, Result};
pub use routes::create_router;
pub use server::Server;
pub use state::AppState;

/// API version
pub const API_VERSION: &str = "v1";
