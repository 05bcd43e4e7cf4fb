//! Request and response bodies
//!
//! These types are also the wire contract between the gateway and the
//! authorization server.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;
use warden_authz::{GroupIdentity, RequestInfo, User};

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}

/// Identity to evaluate on behalf of
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IdentityPayload {
    pub identifier: String,
    #[serde(default)]
    pub admin: bool,
}

impl From<IdentityPayload> for RequestInfo {
    fn from(payload: IdentityPayload) -> Self {
        RequestInfo {
            identifier: payload.identifier,
            admin: payload.admin,
        }
    }
}

impl From<&RequestInfo> for IdentityPayload {
    fn from(info: &RequestInfo) -> Self {
        IdentityPayload {
            identifier: info.identifier.clone(),
            admin: info.admin,
        }
    }
}

/// Authorization query over opaque resource URNs
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizeRequest {
    /// Action to check, e.g. `widget:read`
    #[validate(length(min = 1, max = 128))]
    pub action: String,

    /// Candidate resource URNs
    pub resources: Vec<String>,

    /// Evaluate for this identity instead of the caller (admin callers only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<IdentityPayload>,
}

/// Authorized subset of the requested URNs, in request order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizeResponse {
    pub resources_allowed: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 128))]
    pub external_id: String,

    #[validate(length(min = 1, max = 128))]
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 128))]
    pub path: String,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListUsersQuery {
    /// Only users whose path starts with this prefix
    pub path_prefix: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub external_id: String,
    pub path: String,
    pub urn: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            external_id: user.external_id,
            path: user.path,
            urn: user.urn,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ListUsersResponse {
    /// External ids
    pub users: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct GroupIdentityResponse {
    pub org: String,
    pub name: String,
}

impl From<GroupIdentity> for GroupIdentityResponse {
    fn from(group: GroupIdentity) -> Self {
        Self {
            org: group.org,
            name: group.name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ListGroupsResponse {
    pub groups: Vec<GroupIdentityResponse>,
}

/// Error body
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub status: u16,
}
