//! Resource addresses and wildcard matching
//!
//! Every component builds URNs through [`build_urn`] / [`build_urn_prefix`]
//! so addresses produced in different places compare byte for byte.
//!
//! ```text
//! urn:<realm>:<org>:<resourceType><path><id>
//! urn:ews:org1:user/team/alice
//! urn:ews:org1:user/team/*        (prefix pattern)
//! ```

use once_cell::sync::Lazy;
use regex::Regex;

/// Realm used for every resource managed by this server
pub const REALM: &str = "ews";

/// Resource type of user URNs
pub const RESOURCE_USER: &str = "user";

/// Resource type of group URNs
pub const RESOURCE_GROUP: &str = "group";

/// Resource type of policy URNs
pub const RESOURCE_POLICY: &str = "policy";

/// Wildcard token for actions and URN patterns
pub const WILDCARD: &str = "*";

const MAX_NAME_LENGTH: usize = 128;
const MAX_PATH_LENGTH: usize = 128;
const MAX_URN_LENGTH: usize = 1024;

static EXTERNAL_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w+.@=\-]+$").expect("valid external id regex"));

static PATH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/$|^/([\w+\-]+/)+$").expect("valid path regex"));

static ACTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\*|[\w\-]+:(\*|[\w\-]+\*?))$").expect("valid action regex")
});

static URN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\*|urn:[\w+\-.:/@=]*\*?)$").expect("valid urn regex")
});

/// Check whether `pattern` matches `candidate`.
///
/// A trailing `*` matches zero or more trailing characters; `*` alone
/// matches everything. Anything else is compared byte for byte.
pub fn matches(pattern: &str, candidate: &str) -> bool {
    if pattern == WILDCARD {
        return true;
    }

    match pattern.strip_suffix('*') {
        Some(prefix) => candidate.starts_with(prefix),
        None => pattern == candidate,
    }
}

/// Normalize a `/`-delimited path: leading and trailing separator, no empty segments.
pub fn normalize_path(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        return "/".to_string();
    }
    format!("/{}/", segments.join("/"))
}

/// Build the canonical URN of a concrete resource
pub fn build_urn(realm: &str, org: &str, resource_type: &str, path: &str, id: &str) -> String {
    format!(
        "urn:{}:{}:{}{}{}",
        realm,
        org,
        resource_type,
        normalize_path(path),
        id
    )
}

/// Build a `*`-terminated pattern covering everything under `path_prefix`
pub fn build_urn_prefix(realm: &str, org: &str, resource_type: &str, path_prefix: &str) -> String {
    format!(
        "urn:{}:{}:{}{}*",
        realm,
        org,
        resource_type,
        normalize_path(path_prefix)
    )
}

/// Whether `external_id` can be embedded in a URN
pub fn is_valid_external_id(external_id: &str) -> bool {
    external_id.len() <= MAX_NAME_LENGTH && EXTERNAL_ID_RE.is_match(external_id)
}

/// Whether `path` is a well-formed `/seg/.../` path
pub fn is_valid_path(path: &str) -> bool {
    path.len() <= MAX_PATH_LENGTH && PATH_RE.is_match(path)
}

/// Whether `action` is a well-formed `<domain>:<verb>` action or action pattern
pub fn is_valid_action(action: &str) -> bool {
    action.len() <= MAX_NAME_LENGTH && ACTION_RE.is_match(action)
}

/// Whether `urn` is a well-formed URN or URN prefix pattern
pub fn is_valid_urn(urn: &str) -> bool {
    urn.len() <= MAX_URN_LENGTH && URN_RE.is_match(urn)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        assert!(matches("urn:ews:org1:widget/42", "urn:ews:org1:widget/42"));
        assert!(!matches("urn:ews:org1:widget/42", "urn:ews:org1:widget/43"));
        assert!(!matches("urn:ews:org1:widget/42", "urn:ews:org1:widget/420"));
    }

    #[test]
    fn test_prefix_match() {
        let pattern = "urn:ews:org1:user/team/*";
        assert!(matches(pattern, "urn:ews:org1:user/team/alice"));
        assert!(matches(pattern, "urn:ews:org1:user/team/sub/bob"));
        assert!(!matches(pattern, "urn:ews:org1:user/other/alice"));
    }

    #[test]
    fn test_wildcard_alone() {
        assert!(matches("*", "urn:ews:org1:user/team/alice"));
        assert!(matches("*", "iam:GetUser"));
        assert!(matches("*", ""));
    }

    #[test]
    fn test_star_matches_empty_suffix() {
        assert!(matches("widget:*", "widget:"));
        assert!(matches("urn:ews:org1:widget/*", "urn:ews:org1:widget/"));
    }

    #[test]
    fn test_case_sensitive() {
        assert!(!matches("urn:ews:org1:User/*", "urn:ews:org1:user/alice"));
        assert!(!matches("iam:getuser", "iam:GetUser"));
    }

    #[test]
    fn test_inner_star_is_literal() {
        assert!(!matches("urn:*:org1:user/alice", "urn:ews:org1:user/alice"));
        assert!(matches("urn:*:org1:user/alice", "urn:*:org1:user/alice"));
    }

    #[test]
    fn test_build_urn() {
        assert_eq!(
            build_urn(REALM, "org1", RESOURCE_USER, "/team/", "alice"),
            "urn:ews:org1:user/team/alice"
        );
        assert_eq!(build_urn(REALM, "org1", "widget", "/", "42"), "urn:ews:org1:widget/42");
        assert_eq!(build_urn(REALM, "", RESOURCE_USER, "", "bob"), "urn:ews::user/bob");
    }

    #[test]
    fn test_build_urn_normalizes_path() {
        let expected = "urn:ews:org1:user/a/b/alice";
        assert_eq!(build_urn(REALM, "org1", RESOURCE_USER, "a/b", "alice"), expected);
        assert_eq!(build_urn(REALM, "org1", RESOURCE_USER, "//a//b/", "alice"), expected);
        assert_eq!(build_urn(REALM, "org1", RESOURCE_USER, "/a/b/", "alice"), expected);
    }

    #[test]
    fn test_build_urn_prefix() {
        assert_eq!(
            build_urn_prefix(REALM, "org1", RESOURCE_USER, "/team/"),
            "urn:ews:org1:user/team/*"
        );
        assert_eq!(build_urn_prefix(REALM, "org1", RESOURCE_GROUP, ""), "urn:ews:org1:group/*");
    }

    #[test]
    fn test_prefix_covers_built_urns() {
        let prefix = build_urn_prefix(REALM, "org1", RESOURCE_USER, "/team/");
        let inside = build_urn(REALM, "org1", RESOURCE_USER, "/team/dev/", "alice");
        let outside = build_urn(REALM, "org1", RESOURCE_USER, "/other/", "alice");
        assert!(matches(&prefix, &inside));
        assert!(!matches(&prefix, &outside));
    }

    #[test]
    fn test_validation() {
        assert!(is_valid_external_id("alice@example.com"));
        assert!(!is_valid_external_id(""));
        assert!(!is_valid_external_id("al ice"));
        assert!(!is_valid_external_id(&"a".repeat(129)));

        assert!(is_valid_path("/"));
        assert!(is_valid_path("/team/dev/"));
        assert!(!is_valid_path("/team"));
        assert!(!is_valid_path("team/"));
        assert!(!is_valid_path("/te am/"));

        assert!(is_valid_action("*"));
        assert!(is_valid_action("widget:read"));
        assert!(is_valid_action("widget:*"));
        assert!(is_valid_action("iam:Get*"));
        assert!(!is_valid_action("&%"));
        assert!(!is_valid_action("widget"));
        assert!(!is_valid_action("wid*get:read"));

        assert!(is_valid_urn("*"));
        assert!(is_valid_urn("urn:*"));
        assert!(is_valid_urn("urn:ews:org1:widget/42"));
        assert!(is_valid_urn("urn:ews::user/team/*"));
        assert!(!is_valid_urn("%&"));
        assert!(!is_valid_urn("urn:ews:example:resource/{userid}"));
        assert!(!is_valid_urn("arn:ews:org1:widget/42"));
    }
}
