//! Authorization filter
//!
//! Resolves an identity's effective statements and keeps the candidates
//! the statements allow.
//!
//! ```text
//! RequestInfo ─ admin? ─────────────────────────────► candidates
//!      │
//!      ▼
//!  user ─► groups ─► attached policies ─► statements
//!                                            │
//!  candidates ─► urn_of(c) ─► evaluate ──────┘ ─► Allow? keep
//! ```

use crate::error::{AuthzError, Result};
use crate::policy::{evaluate, Policy, Statement, Verdict};
use crate::store::{AuthzRepository, StoreError};
use crate::types::{Group, ProxyResource, RequestInfo, UrnResource, User};
use crate::urn;
use futures::future::join_all;
use std::sync::Arc;
use tracing::debug;

/// Filter over any resource kind, parameterized by how to address a candidate
#[derive(Clone)]
pub struct Authorizer {
    repo: Arc<dyn AuthzRepository>,
}

impl Authorizer {
    /// Create an authorizer reading through `repo`
    pub fn new(repo: Arc<dyn AuthzRepository>) -> Self {
        Self { repo }
    }

    /// Union of statements from every policy attached to every group of the identity.
    ///
    /// An unknown identity, or one without groups, has no statements.
    pub async fn effective_statements(&self, identity: &RequestInfo) -> Result<Vec<Statement>> {
        let user = match self.repo.get_user_by_external_id(&identity.identifier).await {
            Ok(user) => user,
            Err(StoreError::NotFound(_)) => {
                debug!(identifier = %identity.identifier, "Unknown identity, no statements");
                return Ok(Vec::new());
            }
            Err(e) => return Err(internal(e)),
        };

        let groups = match self.repo.get_groups_by_user_id(&user.id).await {
            Ok(groups) => groups,
            Err(StoreError::NotFound(_)) => Vec::new(),
            Err(e) => return Err(internal(e)),
        };

        let attached = join_all(
            groups
                .iter()
                .map(|group| self.repo.get_attached_policies(&group.id)),
        )
        .await;

        let mut statements = Vec::new();
        for policies in attached {
            match policies {
                Ok(policies) => statements.extend(policies.into_iter().flat_map(|p| p.statements)),
                Err(StoreError::NotFound(_)) => continue,
                Err(e) => return Err(internal(e)),
            }
        }

        debug!(
            identifier = %identity.identifier,
            groups = groups.len(),
            statements = statements.len(),
            "Resolved effective statements"
        );

        Ok(statements)
    }

    /// Keep the candidates `identity` may perform `action` on, in input order.
    ///
    /// `resource_urn` is the address the query is about (a concrete URN or a
    /// prefix pattern for list queries); each candidate is evaluated at its
    /// own address given by `urn_of`.
    pub async fn authorize<T, F>(
        &self,
        identity: &RequestInfo,
        resource_urn: &str,
        action: &str,
        candidates: Vec<T>,
        urn_of: F,
    ) -> Result<Vec<T>>
    where
        F: Fn(&T) -> &str,
    {
        validate_query(resource_urn, action)?;

        if identity.admin {
            return Ok(candidates);
        }

        let statements = self.effective_statements(identity).await?;
        let total = candidates.len();
        let authorized = filter_allowed(&statements, action, candidates, urn_of);

        debug!(
            identifier = %identity.identifier,
            urn = %resource_urn,
            action = %action,
            authorized = authorized.len(),
            total,
            "Filtered candidates"
        );

        Ok(authorized)
    }

    /// Typed variant of [`Authorizer::authorize`] for URN-addressable resources
    pub async fn authorize_resources<T: UrnResource>(
        &self,
        identity: &RequestInfo,
        resource_urn: &str,
        action: &str,
        candidates: Vec<T>,
    ) -> Result<Vec<T>> {
        self.authorize(identity, resource_urn, action, candidates, |c| c.urn())
            .await
    }

    pub async fn authorized_users(
        &self,
        identity: &RequestInfo,
        resource_urn: &str,
        action: &str,
        users: Vec<User>,
    ) -> Result<Vec<User>> {
        self.authorize_resources(identity, resource_urn, action, users).await
    }

    pub async fn authorized_groups(
        &self,
        identity: &RequestInfo,
        resource_urn: &str,
        action: &str,
        groups: Vec<Group>,
    ) -> Result<Vec<Group>> {
        self.authorize_resources(identity, resource_urn, action, groups).await
    }

    pub async fn authorized_policies(
        &self,
        identity: &RequestInfo,
        resource_urn: &str,
        action: &str,
        policies: Vec<Policy>,
    ) -> Result<Vec<Policy>> {
        self.authorize_resources(identity, resource_urn, action, policies).await
    }

    pub async fn authorized_proxy_resources(
        &self,
        identity: &RequestInfo,
        resource_urn: &str,
        action: &str,
        resources: Vec<ProxyResource>,
    ) -> Result<Vec<ProxyResource>> {
        self.authorize_resources(identity, resource_urn, action, resources).await
    }

    /// Filter opaque resource URNs; every URN must be well formed
    pub async fn authorized_external_resources(
        &self,
        identity: &RequestInfo,
        action: &str,
        resources: Vec<String>,
    ) -> Result<Vec<String>> {
        if !urn::is_valid_action(action) {
            return Err(AuthzError::InvalidInput(format!("action {}", action)));
        }
        if let Some(bad) = resources.iter().find(|r| !urn::is_valid_urn(r)) {
            return Err(AuthzError::InvalidInput(format!("resource urn {}", bad)));
        }

        if identity.admin {
            return Ok(resources);
        }

        let statements = self.effective_statements(identity).await?;
        Ok(filter_allowed(&statements, action, resources, |r| r.as_str()))
    }

    /// Single-resource query
    pub async fn is_allowed(
        &self,
        identity: &RequestInfo,
        resource_urn: &str,
        action: &str,
    ) -> Result<bool> {
        let authorized = self
            .authorized_external_resources(identity, action, vec![resource_urn.to_string()])
            .await?;
        Ok(!authorized.is_empty())
    }
}

/// Evaluate each candidate independently and keep the allowed ones in order
pub fn filter_allowed<T, F>(
    statements: &[Statement],
    action: &str,
    candidates: Vec<T>,
    urn_of: F,
) -> Vec<T>
where
    F: Fn(&T) -> &str,
{
    candidates
        .into_iter()
        .filter(|c| evaluate(statements, urn_of(c), action) == Verdict::Allow)
        .collect()
}

fn validate_query(resource_urn: &str, action: &str) -> Result<()> {
    if !urn::is_valid_urn(resource_urn) {
        return Err(AuthzError::InvalidInput(format!("resource urn {}", resource_urn)));
    }
    if !urn::is_valid_action(action) {
        return Err(AuthzError::InvalidInput(format!("action {}", action)));
    }
    Ok(())
}

fn internal(err: StoreError) -> AuthzError {
    AuthzError::Internal(err.to_string())
}
