//! User administration
//!
//! Every operation is authorized through [`Authorizer`] before the
//! repository is touched for writes.

use crate::engine::Authorizer;
use crate::error::{AuthzError, Result};
use crate::store::{StoreError, UserRepository};
use crate::types::{GroupIdentity, RequestInfo, User};
use crate::urn::{self, REALM, RESOURCE_USER};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

pub const ACTION_CREATE_USER: &str = "iam:CreateUser";
pub const ACTION_GET_USER: &str = "iam:GetUser";
pub const ACTION_LIST_USERS: &str = "iam:ListUsers";
pub const ACTION_UPDATE_USER: &str = "iam:UpdateUser";
pub const ACTION_DELETE_USER: &str = "iam:DeleteUser";
pub const ACTION_LIST_GROUPS_FOR_USER: &str = "iam:ListGroupsForUser";

/// Users are not scoped to an organization
const USER_ORG: &str = "";

/// User administration service
#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UserRepository>,
    authorizer: Authorizer,
}

impl UserService {
    pub fn new<R>(repo: Arc<R>) -> Self
    where
        R: UserRepository + 'static,
    {
        Self {
            authorizer: Authorizer::new(repo.clone()),
            repo,
        }
    }

    pub fn authorizer(&self) -> &Authorizer {
        &self.authorizer
    }

    pub async fn add_user(
        &self,
        identity: &RequestInfo,
        external_id: &str,
        path: &str,
    ) -> Result<User> {
        validate_external_id(external_id)?;
        validate_path(path)?;

        let user = new_user(external_id, path);
        self.require(identity, &user, ACTION_CREATE_USER).await?;

        match self.repo.get_user_by_external_id(external_id).await {
            Ok(_) => {
                return Err(AuthzError::AlreadyExists(format!(
                    "unable to create user, user with externalId {} already exist",
                    external_id
                )))
            }
            Err(StoreError::NotFound(_)) => {}
            Err(e) => return Err(AuthzError::Internal(e.to_string())),
        }

        let created = self.repo.add_user(user).await.map_err(|e| match e {
            StoreError::AlreadyExists(msg) => AuthzError::AlreadyExists(msg),
            other => AuthzError::Internal(other.to_string()),
        })?;

        info!(identifier = %identity.identifier, urn = %created.urn, "User created");
        Ok(created)
    }

    pub async fn get_user(&self, identity: &RequestInfo, external_id: &str) -> Result<User> {
        validate_external_id(external_id)?;

        let user = self
            .repo
            .get_user_by_external_id(external_id)
            .await
            .map_err(not_found_or_internal)?;

        self.require(identity, &user, ACTION_GET_USER).await?;
        Ok(user)
    }

    /// External ids of the users under `path_prefix` the identity may list
    pub async fn list_users(&self, identity: &RequestInfo, path_prefix: &str) -> Result<Vec<String>> {
        if !path_prefix.is_empty() {
            validate_path(path_prefix)?;
        }
        let path_prefix = if path_prefix.is_empty() { "/" } else { path_prefix };

        let users = self
            .repo
            .get_users_filtered(path_prefix)
            .await
            .map_err(|e| AuthzError::Internal(e.to_string()))?;

        let urn_prefix = urn::build_urn_prefix(REALM, USER_ORG, RESOURCE_USER, path_prefix);
        let authorized = self
            .authorizer
            .authorized_users(identity, &urn_prefix, ACTION_LIST_USERS, users)
            .await?;

        Ok(authorized.into_iter().map(|u| u.external_id).collect())
    }

    pub async fn update_user(
        &self,
        identity: &RequestInfo,
        external_id: &str,
        new_path: &str,
    ) -> Result<User> {
        validate_external_id(external_id)?;
        validate_path(new_path)?;

        let current = self.get_user(identity, external_id).await?;
        self.require(identity, &current, ACTION_UPDATE_USER).await?;

        // The identity must also be able to see the user at its new address
        let moved = User {
            path: new_path.to_string(),
            urn: urn::build_urn(REALM, USER_ORG, RESOURCE_USER, new_path, external_id),
            ..current
        };
        self.require(identity, &moved, ACTION_GET_USER).await?;

        let updated = self
            .repo
            .update_user(moved)
            .await
            .map_err(|e| AuthzError::Internal(e.to_string()))?;

        info!(identifier = %identity.identifier, urn = %updated.urn, "User updated");
        Ok(updated)
    }

    pub async fn remove_user(&self, identity: &RequestInfo, external_id: &str) -> Result<()> {
        let user = self.get_user(identity, external_id).await?;
        self.require(identity, &user, ACTION_DELETE_USER).await?;

        self.repo
            .remove_user(&user.id)
            .await
            .map_err(|e| AuthzError::Internal(e.to_string()))?;

        info!(identifier = %identity.identifier, urn = %user.urn, "User removed");
        Ok(())
    }

    pub async fn list_groups_by_user(
        &self,
        identity: &RequestInfo,
        external_id: &str,
    ) -> Result<Vec<GroupIdentity>> {
        let user = self.get_user(identity, external_id).await?;
        self.require(identity, &user, ACTION_LIST_GROUPS_FOR_USER).await?;

        let groups = self
            .repo
            .get_groups_by_user_id(&user.id)
            .await
            .map_err(|e| AuthzError::Internal(e.to_string()))?;

        Ok(groups.iter().map(GroupIdentity::from).collect())
    }

    /// Single-target check: an empty filter result means the target was denied
    async fn require(&self, identity: &RequestInfo, user: &User, action: &str) -> Result<()> {
        let allowed = self
            .authorizer
            .authorized_users(identity, &user.urn, action, vec![user.clone()])
            .await?;

        if allowed.is_empty() {
            return Err(AuthzError::Unauthorized(format!(
                "user with externalId {} is not allowed to access to resource {}",
                identity.identifier, user.urn
            )));
        }
        Ok(())
    }
}

fn new_user(external_id: &str, path: &str) -> User {
    User {
        id: Uuid::new_v4().to_string(),
        external_id: external_id.to_string(),
        path: path.to_string(),
        urn: urn::build_urn(REALM, USER_ORG, RESOURCE_USER, path, external_id),
        created_at: Utc::now(),
    }
}

fn validate_external_id(external_id: &str) -> Result<()> {
    if !urn::is_valid_external_id(external_id) {
        return Err(AuthzError::InvalidInput(format!("externalId {}", external_id)));
    }
    Ok(())
}

fn validate_path(path: &str) -> Result<()> {
    if !urn::is_valid_path(path) {
        return Err(AuthzError::InvalidInput(format!("path {}", path)));
    }
    Ok(())
}

fn not_found_or_internal(err: StoreError) -> AuthzError {
    match err {
        StoreError::NotFound(msg) => AuthzError::NotFound(msg),
        other => AuthzError::Internal(other.to_string()),
    }
}
