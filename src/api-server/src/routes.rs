//! Route definitions for the authorization server
//!
//! - `/health` (unauthenticated)
//! - `/api/v1/authorize` and `/api/v1/users/...` (authenticated)
//! - `/api-docs` OpenAPI/Swagger UI

use crate::{handlers, middleware, state::AppState};
use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// OpenAPI documentation configuration
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Warden Authorization API",
        version = "1.0.0",
        description = "URN-addressed authorization with deny-overrides policy evaluation"
    ),
    paths(
        handlers::health_check,
        handlers::authorize,
        handlers::create_user,
        handlers::list_users,
        handlers::get_user,
        handlers::update_user,
        handlers::delete_user,
        handlers::list_user_groups,
    ),
    components(
        schemas(
            crate::models::HealthResponse,
            crate::models::IdentityPayload,
            crate::models::AuthorizeRequest,
            crate::models::AuthorizeResponse,
            crate::models::CreateUserRequest,
            crate::models::UpdateUserRequest,
            crate::models::UserResponse,
            crate::models::ListUsersResponse,
            crate::models::GroupIdentityResponse,
            crate::models::ListGroupsResponse,
            crate::models::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health endpoint"),
        (name = "authorization", description = "Authorization queries"),
        (name = "users", description = "User administration"),
    )
)]
pub struct ApiDoc;

/// Create the application router with all routes and middleware
pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        .route("/authorize", post(handlers::authorize))
        .route("/users", post(handlers::create_user).get(handlers::list_users))
        .route(
            "/users/:external_id",
            get(handlers::get_user)
                .put(handlers::update_user)
                .delete(handlers::delete_user),
        )
        .route("/users/:external_id/groups", get(handlers::list_user_groups))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", api_routes)
        .merge(SwaggerUi::new("/api-docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        // Executed bottom to top
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
        .layer(axum_middleware::from_fn(middleware::request_id_middleware))
        .layer(middleware::cors_layer())
        .layer(TraceLayer::new_for_http())
}
