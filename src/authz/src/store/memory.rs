//! In-memory repository implementation

use super::{
    AuthzRepository, ProxyResourceRepository, StoreError, StoreResult, UserRepository,
};
use crate::error::{AuthzError, Result};
use crate::policy::Policy;
use crate::types::{Group, ProxyResource, User};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Group membership link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    pub group_id: String,
    pub user_id: String,
}

/// Policy attachment link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub group_id: String,
    pub policy_id: String,
}

/// Serialized repository contents, used to seed a server at startup
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Snapshot {
    pub users: Vec<User>,
    pub groups: Vec<Group>,
    pub policies: Vec<Policy>,
    pub memberships: Vec<Membership>,
    pub attachments: Vec<Attachment>,
    pub proxy_resources: Vec<ProxyResource>,
}

#[derive(Default)]
struct State {
    users: Vec<User>,
    groups: HashMap<String, Group>,
    policies: HashMap<String, Policy>,
    memberships: Vec<Membership>,
    attachments: Vec<Attachment>,
    proxy_resources: Vec<ProxyResource>,
}

/// Repository backed by process memory
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    state: Arc<RwLock<State>>,
}

impl InMemoryRepository {
    /// Create an empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository holding the snapshot's contents
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let state = State {
            users: snapshot.users,
            groups: snapshot
                .groups
                .into_iter()
                .map(|g| (g.id.clone(), g))
                .collect(),
            policies: snapshot
                .policies
                .into_iter()
                .map(|p| (p.id.clone(), p))
                .collect(),
            memberships: snapshot.memberships,
            attachments: snapshot.attachments,
            proxy_resources: snapshot.proxy_resources,
        };

        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Load a JSON snapshot from disk
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path).await?;
        let snapshot: Snapshot = serde_json::from_str(&raw).map_err(|e| {
            AuthzError::InvalidInput(format!("invalid snapshot {}: {}", path.display(), e))
        })?;

        info!(
            users = snapshot.users.len(),
            groups = snapshot.groups.len(),
            policies = snapshot.policies.len(),
            proxy_resources = snapshot.proxy_resources.len(),
            "Loaded repository snapshot from {}",
            path.display()
        );

        Ok(Self::from_snapshot(snapshot))
    }

    pub async fn insert_user(&self, user: User) {
        let mut state = self.state.write().await;
        state.users.push(user);
    }

    pub async fn insert_group(&self, group: Group) {
        let mut state = self.state.write().await;
        state.groups.insert(group.id.clone(), group);
    }

    pub async fn insert_policy(&self, policy: Policy) {
        let mut state = self.state.write().await;
        state.policies.insert(policy.id.clone(), policy);
    }

    pub async fn insert_proxy_resource(&self, resource: ProxyResource) {
        let mut state = self.state.write().await;
        state.proxy_resources.push(resource);
    }

    pub async fn add_member(&self, group_id: &str, user_id: &str) {
        let mut state = self.state.write().await;
        state.memberships.push(Membership {
            group_id: group_id.to_string(),
            user_id: user_id.to_string(),
        });
    }

    pub async fn attach_policy(&self, group_id: &str, policy_id: &str) {
        let mut state = self.state.write().await;
        state.attachments.push(Attachment {
            group_id: group_id.to_string(),
            policy_id: policy_id.to_string(),
        });
    }
}

#[async_trait]
impl AuthzRepository for InMemoryRepository {
    async fn get_user_by_external_id(&self, external_id: &str) -> StoreResult<User> {
        let state = self.state.read().await;
        state
            .users
            .iter()
            .find(|u| u.external_id == external_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("user with externalId {}", external_id)))
    }

    async fn get_groups_by_user_id(&self, user_id: &str) -> StoreResult<Vec<Group>> {
        let state = self.state.read().await;
        Ok(state
            .memberships
            .iter()
            .filter(|m| m.user_id == user_id)
            .filter_map(|m| state.groups.get(&m.group_id).cloned())
            .collect())
    }

    async fn get_attached_policies(&self, group_id: &str) -> StoreResult<Vec<Policy>> {
        let state = self.state.read().await;
        if !state.groups.contains_key(group_id) {
            return Err(StoreError::NotFound(format!("group {}", group_id)));
        }
        Ok(state
            .attachments
            .iter()
            .filter(|a| a.group_id == group_id)
            .filter_map(|a| state.policies.get(&a.policy_id).cloned())
            .collect())
    }
}

#[async_trait]
impl UserRepository for InMemoryRepository {
    async fn add_user(&self, user: User) -> StoreResult<User> {
        let mut state = self.state.write().await;
        if state.users.iter().any(|u| u.external_id == user.external_id) {
            return Err(StoreError::AlreadyExists(format!(
                "user with externalId {}",
                user.external_id
            )));
        }
        state.users.push(user.clone());
        Ok(user)
    }

    async fn update_user(&self, user: User) -> StoreResult<User> {
        let mut state = self.state.write().await;
        let existing = state
            .users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or_else(|| StoreError::NotFound(format!("user {}", user.id)))?;
        *existing = user.clone();
        Ok(user)
    }

    async fn remove_user(&self, id: &str) -> StoreResult<()> {
        let mut state = self.state.write().await;
        let before = state.users.len();
        state.users.retain(|u| u.id != id);
        if state.users.len() == before {
            return Err(StoreError::NotFound(format!("user {}", id)));
        }
        state.memberships.retain(|m| m.user_id != id);
        Ok(())
    }

    async fn get_users_filtered(&self, path_prefix: &str) -> StoreResult<Vec<User>> {
        let state = self.state.read().await;
        Ok(state
            .users
            .iter()
            .filter(|u| u.path.starts_with(path_prefix))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ProxyResourceRepository for InMemoryRepository {
    async fn get_proxy_resources(&self) -> StoreResult<Vec<ProxyResource>> {
        let state = self.state.read().await;
        Ok(state.proxy_resources.clone())
    }
}
