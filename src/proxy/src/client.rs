//! Single-resource authorization queries from the gateway
//!
//! The remote and in-process clients answer the same question with the same
//! failure modes: `Ok(bool)` for a verdict, `UpstreamUnavailable` when the
//! authorization engine cannot be consulted.

use async_trait::async_trait;
use reqwest::Url;
use std::time::Duration;
use tracing::{debug, error};
use warden_api_server::models::{AuthorizeRequest, AuthorizeResponse};
use warden_authz::{Authorizer, AuthzError, RequestInfo, Result};

/// Authorization engine as seen by the gateway
#[async_trait]
pub trait AuthzClient: Send + Sync {
    /// May `identity` perform `action` on `urn`?
    async fn is_allowed(&self, identity: &RequestInfo, urn: &str, action: &str) -> Result<bool>;
}

/// Authorization server reached over HTTP with service credentials
#[derive(Debug, Clone)]
pub struct RemoteAuthzClient {
    client: reqwest::Client,
    authorize_url: Url,
    service_user: String,
    service_password: String,
}

impl RemoteAuthzClient {
    /// `base_url` is the server root, e.g. `http://warden:8080`
    pub fn new(
        base_url: &str,
        service_user: impl Into<String>,
        service_password: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let authorize_url = Url::parse(base_url)
            .and_then(|base| base.join("/api/v1/authorize"))
            .map_err(|e| AuthzError::InvalidInput(format!("worker url {}: {}", base_url, e)))?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AuthzError::Internal(e.to_string()))?;

        Ok(Self {
            client,
            authorize_url,
            service_user: service_user.into(),
            service_password: service_password.into(),
        })
    }
}

#[async_trait]
impl AuthzClient for RemoteAuthzClient {
    async fn is_allowed(&self, identity: &RequestInfo, urn: &str, action: &str) -> Result<bool> {
        let body = AuthorizeRequest {
            action: action.to_string(),
            resources: vec![urn.to_string()],
            identity: Some(identity.into()),
        };

        let response = self
            .client
            .post(self.authorize_url.clone())
            .basic_auth(&self.service_user, Some(&self.service_password))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(url = %self.authorize_url, error = %e, "Authorization server unreachable");
                AuthzError::UpstreamUnavailable(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), detail = %detail, "Authorization server refused the query");
            return Err(AuthzError::UpstreamUnavailable(format!(
                "authorization server answered {}",
                status
            )));
        }

        let decision: AuthorizeResponse = response
            .json()
            .await
            .map_err(|e| AuthzError::UpstreamUnavailable(format!("unreadable answer: {}", e)))?;

        let allowed = decision.resources_allowed.iter().any(|r| r == urn);
        debug!(identifier = %identity.identifier, urn, action, allowed, "Remote authorization");
        Ok(allowed)
    }
}

/// Authorization engine in the same process
#[derive(Clone)]
pub struct LocalAuthzClient {
    authorizer: Authorizer,
}

impl LocalAuthzClient {
    pub fn new(authorizer: Authorizer) -> Self {
        Self { authorizer }
    }
}

#[async_trait]
impl AuthzClient for LocalAuthzClient {
    async fn is_allowed(&self, identity: &RequestInfo, urn: &str, action: &str) -> Result<bool> {
        self.authorizer.is_allowed(identity, urn, action).await
    }
}
