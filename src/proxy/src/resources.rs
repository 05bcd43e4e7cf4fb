//! Registered proxy resources
//!
//! The table is built once before the gateway accepts traffic and never
//! changes afterwards.

use axum::http::Method;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use tracing::info;
use warden_authz::{urn, AuthzError, ProxyResource, ProxyResourceRepository, Result};

const METHODS: [Method; 7] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::HEAD,
    Method::OPTIONS,
];

/// Immutable `(method, path) -> resource` lookup
#[derive(Debug, Clone, Default)]
pub struct ResourceTable {
    entries: HashMap<(Method, String), ProxyResource>,
}

impl ResourceTable {
    /// Validate and index `resources`.
    ///
    /// Fails on a malformed URN or action, an unknown method, a path the
    /// router cannot register, a duplicate `(method, path)` or two paths
    /// naming the same parameter position differently.
    pub fn new(resources: Vec<ProxyResource>) -> Result<Self> {
        let mut entries = HashMap::with_capacity(resources.len());
        let mut params: HashMap<String, (String, String)> = HashMap::new();

        for resource in resources {
            let method = parse_method(&resource)?;

            if !urn::is_valid_urn(&resource.urn) {
                return Err(invalid(&resource, "malformed urn"));
            }
            if !urn::is_valid_action(&resource.action) {
                return Err(invalid(&resource, "malformed action"));
            }

            let captures = route_params(&resource.path).map_err(|r| invalid(&resource, r))?;
            for (prefix, name) in captures {
                match params.get(&prefix) {
                    Some((existing, path)) if existing != &name => {
                        return Err(invalid(
                            &resource,
                            &format!("parameter :{} conflicts with {}", name, path),
                        ));
                    }
                    Some(_) => {}
                    None => {
                        params.insert(prefix, (name, resource.path.clone()));
                    }
                }
            }

            let key = (method, resource.path.clone());
            if entries.contains_key(&key) {
                return Err(invalid(&resource, "duplicate method and path"));
            }
            entries.insert(key, resource);
        }

        info!(resources = entries.len(), "Proxy resource table built");
        Ok(Self { entries })
    }

    /// Read a JSON array of resources
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path.as_ref()).await?;
        let resources: Vec<ProxyResource> = serde_json::from_str(&raw).map_err(|e| {
            AuthzError::InvalidInput(format!("{}: {}", path.as_ref().display(), e))
        })?;
        Self::new(resources)
    }

    /// Take the resources registered in a repository
    pub async fn from_repository(repo: &dyn ProxyResourceRepository) -> Result<Self> {
        let resources = repo.get_proxy_resources().await?;
        Self::new(resources)
    }

    /// Exact lookup of a registered `(method, path)` signature
    pub fn resolve(&self, method: &Method, path: &str) -> Option<&ProxyResource> {
        self.entries.get(&(method.clone(), path.to_string()))
    }

    /// Distinct registered paths, sorted
    pub fn paths(&self) -> Vec<&str> {
        self.entries
            .keys()
            .map(|(_, path)| path.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn parse_method(resource: &ProxyResource) -> Result<Method> {
    let upper = resource.method.to_ascii_uppercase();
    METHODS
        .iter()
        .find(|m| m.as_str() == upper)
        .cloned()
        .ok_or_else(|| invalid(resource, "unknown method"))
}

/// Parameters of `path`, each keyed by its prefix with parameter names
/// erased: `/users/:id/groups` yields `("/users/:", "id")`.
///
/// Only literal segments and whole-segment `:name` parameters are
/// accepted; there is no wildcard path matching.
fn route_params(path: &str) -> std::result::Result<Vec<(String, String)>, &'static str> {
    if !path.starts_with('/') {
        return Err("path must start with '/'");
    }

    let mut prefix = String::new();
    let mut params = Vec::new();
    for segment in path[1..].split('/') {
        prefix.push('/');
        if segment.contains('*') {
            return Err("wildcard segments are not supported");
        }
        match segment.strip_prefix(':') {
            Some("") => return Err("empty parameter name"),
            Some(name) if name.contains(':') => return Err("malformed parameter"),
            Some(name) => {
                prefix.push(':');
                params.push((prefix.clone(), name.to_string()));
            }
            None if segment.contains(':') => return Err("parameter must span a whole segment"),
            None => prefix.push_str(segment),
        }
    }
    Ok(params)
}

fn invalid(resource: &ProxyResource, reason: &str) -> AuthzError {
    AuthzError::InvalidInput(format!(
        "proxy resource {} ({} {}): {}",
        resource.id, resource.method, resource.path, reason
    ))
}
