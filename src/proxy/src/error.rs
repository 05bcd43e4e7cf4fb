//! Gateway rejection outcomes

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;
use warden_api_server::AuthError;
use warden_authz::AuthzError;

pub type Result<T> = std::result::Result<T, ProxyError>;

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    /// No proxy resource registered for the request signature
    #[error("No resource registered for {method} {path}")]
    NotFound { method: String, path: String },

    /// Authenticator rejection, passed through as 400/401
    #[error("Authentication failed: {0}")]
    Authentication(#[from] AuthError),

    /// Request body over the buffering limit
    #[error("Request body exceeds {0} bytes")]
    PayloadTooLarge(usize),

    /// Request body could not be read
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Verdict was Deny or NoMatch
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authorization server unreachable or erroring
    #[error("Authorization unavailable: {0}")]
    AuthorizationUnavailable(String),

    /// Malformed backend host or unreachable backend
    #[error("Bad gateway: {0}")]
    BadGateway(String),

    /// Backend did not answer in time
    #[error("Gateway timeout: {0}")]
    Timeout(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::NotFound { .. } => StatusCode::NOT_FOUND,
            ProxyError::Authentication(AuthError::BadRequest(_)) => StatusCode::BAD_REQUEST,
            ProxyError::Authentication(AuthError::Unauthorized(_)) => StatusCode::UNAUTHORIZED,
            ProxyError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ProxyError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ProxyError::Unauthorized(_) => StatusCode::FORBIDDEN,
            ProxyError::AuthorizationUnavailable(_) | ProxyError::BadGateway(_) => {
                StatusCode::BAD_GATEWAY
            }
            ProxyError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AuthzError> for ProxyError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::Unauthorized(msg) => ProxyError::Unauthorized(msg),
            AuthzError::UpstreamUnavailable(msg) | AuthzError::Internal(msg) => {
                ProxyError::AuthorizationUnavailable(msg)
            }
            AuthzError::Io(e) => ProxyError::AuthorizationUnavailable(e.to_string()),
            other => ProxyError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "Proxy request rejected");
        }

        let body = Json(json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}
