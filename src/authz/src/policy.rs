//! Policy definition and statement evaluation

use crate::types::UrnResource;
use crate::urn;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Statement effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effect {
    /// Allow the action
    Allow,
    /// Deny the action
    Deny,
}

/// Allow/Deny rule scoped by action and resource patterns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    pub effect: Effect,

    /// Action patterns, e.g. `widget:read`, `widget:*`, `*`
    pub actions: Vec<String>,

    /// URN patterns, e.g. `urn:ews:org1:widget/*`
    pub resources: Vec<String>,
}

impl Statement {
    pub fn allow<A, R>(actions: A, resources: R) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self::new(Effect::Allow, actions, resources)
    }

    pub fn deny<A, R>(actions: A, resources: R) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self::new(Effect::Deny, actions, resources)
    }

    fn new<A, R>(effect: Effect, actions: A, resources: R) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self {
            effect,
            actions: actions.into_iter().map(Into::into).collect(),
            resources: resources.into_iter().map(Into::into).collect(),
        }
    }

    /// A statement applies when one action pattern and one resource pattern both match
    pub fn applies(&self, resource: &str, action: &str) -> bool {
        self.actions.iter().any(|p| urn::matches(p, action))
            && self.resources.iter().any(|p| urn::matches(p, resource))
    }
}

/// Policy definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    pub id: String,
    pub name: String,
    pub org: String,
    pub path: String,
    pub urn: String,

    /// Replaced wholesale on update
    pub statements: Vec<Statement>,

    pub created_at: DateTime<Utc>,
}

impl UrnResource for Policy {
    fn urn(&self) -> &str {
        &self.urn
    }
}

/// Outcome of evaluating a statement set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    Deny,
    /// No statement applied; callers treat it as Deny
    NoMatch,
}

impl Verdict {
    pub fn is_allowed(self) -> bool {
        self == Verdict::Allow
    }
}

/// Resolve `statements` for `(resource, action)` with deny-overrides.
///
/// Any applying Deny wins regardless of position; otherwise any applying
/// Allow wins; otherwise nothing applied.
pub fn evaluate(statements: &[Statement], resource: &str, action: &str) -> Verdict {
    let mut allowed = false;

    for statement in statements.iter().filter(|s| s.applies(resource, action)) {
        match statement.effect {
            Effect::Deny => return Verdict::Deny,
            Effect::Allow => allowed = true,
        }
    }

    if allowed {
        Verdict::Allow
    } else {
        Verdict::NoMatch
    }
}
