//! Core authorization types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity of the caller, produced per request by the authenticator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestInfo {
    /// Verified subject identifier (a user's external id)
    pub identifier: String,

    /// Admins skip statement evaluation entirely
    #[serde(default)]
    pub admin: bool,
}

impl RequestInfo {
    /// Create a regular (non-admin) identity
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            admin: false,
        }
    }

    /// Create an admin identity
    pub fn admin(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            admin: true,
        }
    }
}

/// Anything addressable by a URN
pub trait UrnResource {
    fn urn(&self) -> &str;
}

impl UrnResource for String {
    fn urn(&self) -> &str {
        self
    }
}

/// User account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,

    /// Stable identifier supplied by the authenticator, unique
    pub external_id: String,

    pub path: String,
    pub urn: String,
    pub created_at: DateTime<Utc>,
}

impl UrnResource for User {
    fn urn(&self) -> &str {
        &self.urn
    }
}

/// Group of users with attached policies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub org: String,
    pub name: String,
    pub path: String,
    pub urn: String,
}

impl UrnResource for Group {
    fn urn(&self) -> &str {
        &self.urn
    }
}

/// Public identity of a group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupIdentity {
    pub org: String,
    pub name: String,
}

impl From<&Group> for GroupIdentity {
    fn from(group: &Group) -> Self {
        Self {
            org: group.org.clone(),
            name: group.name.clone(),
        }
    }
}

/// Static mapping from an inbound request signature to an authorization
/// target and a forwarding destination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyResource {
    pub id: String,

    /// Backend base URL, e.g. `http://widgets.internal:8080`
    pub host: String,

    /// Registered route, may contain `:param` placeholders
    pub path: String,

    /// HTTP method, upper case
    pub method: String,

    /// Authorization target
    pub urn: String,

    /// Action checked against `urn`
    pub action: String,
}

impl UrnResource for ProxyResource {
    fn urn(&self) -> &str {
        &self.urn
    }
}
