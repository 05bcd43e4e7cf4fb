use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use std::sync::Arc;
use tracing::{info, warn};
use validator::Validate;
use warden_authz::RequestInfo;

use crate::{
    error::{ApiError, Result},
    models::*,
    state::AppState,
};

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        uptime_seconds: state.uptime_seconds(),
    })
}

/// Filter resource URNs down to the ones the identity may act on
#[utoipa::path(
    post,
    path = "/api/v1/authorize",
    request_body = AuthorizeRequest,
    responses(
        (status = 200, description = "Authorized resources", body = AuthorizeResponse),
        (status = 400, description = "Malformed action or URN", body = ErrorResponse),
        (status = 401, description = "Missing credentials", body = ErrorResponse),
        (status = 403, description = "On-behalf evaluation by a non-admin caller", body = ErrorResponse),
        (status = 500, description = "Repository failure", body = ErrorResponse)
    ),
    tag = "authorization"
)]
pub async fn authorize(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<RequestInfo>,
    Json(req): Json<AuthorizeRequest>,
) -> Result<Json<AuthorizeResponse>> {
    req.validate()
        .map_err(|e| ApiError::ValidationError(e.to_string()))?;

    let identity = match req.identity {
        Some(on_behalf) if caller.admin => RequestInfo::from(on_behalf),
        Some(on_behalf) => {
            warn!(
                caller = %caller.identifier,
                identifier = %on_behalf.identifier,
                "On-behalf evaluation refused"
            );
            return Err(ApiError::Forbidden(format!(
                "{} may not evaluate on behalf of {}",
                caller.identifier, on_behalf.identifier
            )));
        }
        None => caller,
    };

    let resources_allowed = state
        .authorizer
        .authorized_external_resources(&identity, &req.action, req.resources)
        .await?;

    Ok(Json(AuthorizeResponse { resources_allowed }))
}

#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Invalid external id or path", body = ErrorResponse),
        (status = 403, description = "Not allowed", body = ErrorResponse),
        (status = 409, description = "External id already taken", body = ErrorResponse)
    ),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<RequestInfo>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    req.validate()
        .map_err(|e| ApiError::ValidationError(e.to_string()))?;

    let user = state
        .users
        .add_user(&caller, &req.external_id, &req.path)
        .await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/users",
    params(ListUsersQuery),
    responses(
        (status = 200, description = "External ids the caller may list", body = ListUsersResponse),
        (status = 400, description = "Invalid path prefix", body = ErrorResponse)
    ),
    tag = "users"
)]
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<RequestInfo>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<ListUsersResponse>> {
    let prefix = query.path_prefix.unwrap_or_default();
    let users = state.users.list_users(&caller, &prefix).await?;
    Ok(Json(ListUsersResponse { users }))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{external_id}",
    params(
        ("external_id" = String, Path, description = "User external id")
    ),
    responses(
        (status = 200, description = "User details", body = UserResponse),
        (status = 403, description = "Not allowed", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    tag = "users"
)]
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<RequestInfo>,
    Path(external_id): Path<String>,
) -> Result<Json<UserResponse>> {
    let user = state.users.get_user(&caller, &external_id).await?;
    Ok(Json(user.into()))
}

#[utoipa::path(
    put,
    path = "/api/v1/users/{external_id}",
    params(
        ("external_id" = String, Path, description = "User external id")
    ),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User moved", body = UserResponse),
        (status = 403, description = "Not allowed", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    tag = "users"
)]
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<RequestInfo>,
    Path(external_id): Path<String>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>> {
    req.validate()
        .map_err(|e| ApiError::ValidationError(e.to_string()))?;

    let user = state
        .users
        .update_user(&caller, &external_id, &req.path)
        .await?;

    Ok(Json(user.into()))
}

#[utoipa::path(
    delete,
    path = "/api/v1/users/{external_id}",
    params(
        ("external_id" = String, Path, description = "User external id")
    ),
    responses(
        (status = 204, description = "User removed"),
        (status = 403, description = "Not allowed", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    tag = "users"
)]
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<RequestInfo>,
    Path(external_id): Path<String>,
) -> Result<StatusCode> {
    state.users.remove_user(&caller, &external_id).await?;
    info!(caller = %caller.identifier, external_id = %external_id, "User deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{external_id}/groups",
    params(
        ("external_id" = String, Path, description = "User external id")
    ),
    responses(
        (status = 200, description = "Groups of the user", body = ListGroupsResponse),
        (status = 403, description = "Not allowed", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    tag = "users"
)]
pub async fn list_user_groups(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<RequestInfo>,
    Path(external_id): Path<String>,
) -> Result<Json<ListGroupsResponse>> {
    let groups = state
        .users
        .list_groups_by_user(&caller, &external_id)
        .await?
        .into_iter()
        .map(GroupIdentityResponse::from)
        .collect();

    Ok(Json(ListGroupsResponse { groups }))
}
