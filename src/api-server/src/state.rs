use crate::auth::{Authenticator, HeaderAuthenticator};
use std::sync::Arc;
use std::time::Instant;
use warden_authz::{Authorizer, InMemoryRepository, UserRepository, UserService};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Authorization filter
    pub authorizer: Authorizer,

    /// User administration
    pub users: UserService,

    /// Turns request headers into an identity
    pub authenticator: Arc<dyn Authenticator>,

    /// Server start time for uptime calculation
    pub start_time: Instant,

    /// Application version
    pub version: String,
}

impl AppState {
    pub fn new<R>(repo: Arc<R>, authenticator: Arc<dyn Authenticator>) -> Self
    where
        R: UserRepository + 'static,
    {
        let users = UserService::new(repo);
        Self {
            authorizer: users.authorizer().clone(),
            users,
            authenticator,
            start_time: Instant::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

impl Default for AppState {
    /// Empty repository, no admin credentials
    fn default() -> Self {
        Self::new(
            Arc::new(InMemoryRepository::new()),
            Arc::new(HeaderAuthenticator::default()),
        )
    }
}
