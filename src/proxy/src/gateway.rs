//! Proxy request gateway
//!
//! ```text
//! Received ─► Resolved ─► Authorized ─► Forwarded ─► Completed
//!    │            │            │             │
//!    └── 404      └── 400/401  └── 403/502   └── 502/504
//! ```

use axum::{
    extract::{MatchedPath, Request, State},
    middleware as axum_middleware,
    response::Response,
    routing::any,
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};
use warden_api_server::{middleware, Authenticator};

use crate::client::AuthzClient;
use crate::error::{ProxyError, Result};
use crate::forward::Forwarder;
use crate::resources::ResourceTable;

/// Collaborators of the gateway, fixed at startup
pub struct Gateway {
    resources: ResourceTable,
    authenticator: Arc<dyn Authenticator>,
    authz: Arc<dyn AuthzClient>,
    forwarder: Forwarder,
}

impl Gateway {
    pub fn new(
        resources: ResourceTable,
        authenticator: Arc<dyn Authenticator>,
        authz: Arc<dyn AuthzClient>,
        forwarder: Forwarder,
    ) -> Self {
        Self {
            resources,
            authenticator,
            authz,
            forwarder,
        }
    }

    pub fn resources(&self) -> &ResourceTable {
        &self.resources
    }

    async fn handle(&self, matched_path: &str, request: Request) -> Result<Response> {
        let request_id = middleware::request_id_of(&request);

        let resource = self
            .resources
            .resolve(request.method(), matched_path)
            .ok_or_else(|| ProxyError::NotFound {
                method: request.method().to_string(),
                path: request.uri().path().to_string(),
            })?;

        let identity = self.authenticator.authenticate(request.headers())?;

        let allowed = self
            .authz
            .is_allowed(&identity, &resource.urn, &resource.action)
            .await?;

        if !allowed {
            warn!(
                request_id = %request_id,
                identifier = %identity.identifier,
                urn = %resource.urn,
                action = %resource.action,
                "Proxy request denied"
            );
            return Err(ProxyError::Unauthorized(format!(
                "{} is not allowed to perform {} on {}",
                identity.identifier, resource.action, resource.urn
            )));
        }

        debug!(
            request_id = %request_id,
            identifier = %identity.identifier,
            resource = %resource.id,
            "Proxy request authorized"
        );

        self.forwarder.forward(&resource.host, request).await
    }
}

async fn proxy_handler(
    State(gateway): State<Arc<Gateway>>,
    matched_path: MatchedPath,
    request: Request,
) -> Result<Response> {
    gateway.handle(matched_path.as_str(), request).await
}

async fn not_registered(request: Request) -> ProxyError {
    ProxyError::NotFound {
        method: request.method().to_string(),
        path: request.uri().path().to_string(),
    }
}

/// One route per registered path; method selection happens in the table
pub fn create_router(gateway: Arc<Gateway>) -> Router {
    let router = gateway
        .resources()
        .paths()
        .into_iter()
        .fold(Router::new(), |router, path| {
            router.route(path, any(proxy_handler))
        });

    router
        .fallback(not_registered)
        .with_state(gateway)
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
        .layer(axum_middleware::from_fn(middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http())
}
