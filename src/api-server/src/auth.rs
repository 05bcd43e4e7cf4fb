//! Caller authentication
//!
//! Identity verification happens outside the authorization core; an
//! [`Authenticator`] only turns request headers into a [`RequestInfo`].

use axum::http::{header, HeaderMap, HeaderName};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use warden_authz::RequestInfo;

use crate::error::ApiError;

/// Default header carrying an externally verified subject
pub const DEFAULT_USER_HEADER: &str = "x-warden-user";

/// Authenticator rejection
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// Credentials present but unreadable
    #[error("malformed credentials: {0}")]
    BadRequest(String),

    /// Credentials missing or wrong
    #[error("{0}")]
    Unauthorized(String),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::BadRequest(msg) => ApiError::BadRequest(msg),
            AuthError::Unauthorized(msg) => ApiError::Unauthorized(msg),
        }
    }
}

/// Produces the caller identity from request headers
pub trait Authenticator: Send + Sync {
    fn authenticate(&self, headers: &HeaderMap) -> Result<RequestInfo, AuthError>;
}

/// Admin credentials through HTTP basic auth, regular users through a
/// trusted header set by an upstream identity provider.
#[derive(Debug, Clone)]
pub struct HeaderAuthenticator {
    admin: Option<(String, String)>,
    user_header: HeaderName,
}

impl HeaderAuthenticator {
    pub fn new(user_header: HeaderName) -> Self {
        Self {
            admin: None,
            user_header,
        }
    }

    /// Enable the basic-auth admin identity
    pub fn with_admin(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.admin = Some((user.into(), password.into()));
        self
    }

    fn basic(&self, value: &str) -> Result<RequestInfo, AuthError> {
        let encoded = value
            .strip_prefix("Basic ")
            .ok_or_else(|| AuthError::Unauthorized("unsupported authorization scheme".into()))?;

        let decoded = STANDARD
            .decode(encoded.trim())
            .map_err(|e| AuthError::BadRequest(format!("basic credentials: {}", e)))?;
        let decoded = String::from_utf8(decoded)
            .map_err(|_| AuthError::BadRequest("basic credentials are not utf-8".into()))?;
        let (user, password) = decoded
            .split_once(':')
            .ok_or_else(|| AuthError::BadRequest("basic credentials without separator".into()))?;

        match &self.admin {
            Some((admin_user, admin_password)) if user == admin_user && password == admin_password => {
                Ok(RequestInfo::admin(user))
            }
            _ => Err(AuthError::Unauthorized("invalid credentials".into())),
        }
    }
}

impl Default for HeaderAuthenticator {
    fn default() -> Self {
        Self::new(HeaderName::from_static(DEFAULT_USER_HEADER))
    }
}

impl Authenticator for HeaderAuthenticator {
    fn authenticate(&self, headers: &HeaderMap) -> Result<RequestInfo, AuthError> {
        if let Some(value) = headers.get(header::AUTHORIZATION) {
            let value = value
                .to_str()
                .map_err(|_| AuthError::BadRequest("authorization header is not ascii".into()))?;
            return self.basic(value);
        }

        match headers.get(&self.user_header) {
            Some(value) => {
                let subject = value
                    .to_str()
                    .map_err(|_| AuthError::BadRequest("user header is not ascii".into()))?
                    .trim();
                if subject.is_empty() {
                    return Err(AuthError::Unauthorized("empty subject".into()));
                }
                Ok(RequestInfo::new(subject))
            }
            None => Err(AuthError::Unauthorized("missing credentials".into())),
        }
    }
}

/// `Authorization` header value for basic credentials
pub fn basic_auth_value(user: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:{}", user, password)))
}
