use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;
use warden_authz::AuthzError;

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Authz(#[from] AuthzError),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Authz(e) => match e {
                AuthzError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                AuthzError::NotFound(_) => StatusCode::NOT_FOUND,
                AuthzError::Unauthorized(_) => StatusCode::FORBIDDEN,
                AuthzError::AlreadyExists(_) => StatusCode::CONFLICT,
                AuthzError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
                AuthzError::Internal(_) | AuthzError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::ValidationError(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "Request failed");
        }

        let body = Json(json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}
