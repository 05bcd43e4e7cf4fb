//! Authorization filter tests
//!
//! Statement resolution through group membership, admin bypass, ordering and
//! repository fault propagation.

use async_trait::async_trait;
use chrono::Utc;
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use warden_authz::{
    store::StoreResult, AuthzError, AuthzRepository, Authorizer, Group, InMemoryRepository,
    Policy, RequestInfo, Statement, StoreError, User,
};

// ============================================================================
// FIXTURES
// ============================================================================

fn user(id: &str, external_id: &str) -> User {
    User {
        id: id.to_string(),
        external_id: external_id.to_string(),
        path: "/".to_string(),
        urn: format!("urn:ews::user/{}", external_id),
        created_at: Utc::now(),
    }
}

fn group(id: &str) -> Group {
    Group {
        id: id.to_string(),
        org: "org1".to_string(),
        name: id.to_string(),
        path: "/".to_string(),
        urn: format!("urn:ews:org1:group/{}", id),
    }
}

fn policy(id: &str, statements: Vec<Statement>) -> Policy {
    Policy {
        id: id.to_string(),
        name: id.to_string(),
        org: "org1".to_string(),
        path: "/".to_string(),
        urn: format!("urn:ews:org1:policy/{}", id),
        statements,
        created_at: Utc::now(),
    }
}

/// alice is in `readers` (widget read allowed) and `auditors` (secret widget denied)
async fn seeded_repo() -> Arc<InMemoryRepository> {
    let repo = Arc::new(InMemoryRepository::new());
    repo.insert_user(user("u-alice", "alice")).await;
    repo.insert_user(user("u-bob", "bob")).await;

    repo.insert_group(group("readers")).await;
    repo.insert_group(group("auditors")).await;

    repo.insert_policy(policy(
        "read-widgets",
        vec![Statement::allow(["widget:*"], ["urn:ews:org1:widget/*"])],
    ))
    .await;
    repo.insert_policy(policy(
        "hide-secret",
        vec![Statement::deny(["widget:read"], ["urn:ews:org1:widget/secret"])],
    ))
    .await;

    repo.add_member("readers", "u-alice").await;
    repo.add_member("auditors", "u-alice").await;
    repo.attach_policy("readers", "read-widgets").await;
    repo.attach_policy("auditors", "hide-secret").await;

    repo
}

fn widgets(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|id| format!("urn:ews:org1:widget/{}", id)).collect()
}

/// Repository that fails every read with the given error and counts calls
struct FaultyRepository {
    error: StoreError,
    calls: AtomicUsize,
}

impl FaultyRepository {
    fn new(error: StoreError) -> Self {
        Self {
            error,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl AuthzRepository for FaultyRepository {
    async fn get_user_by_external_id(&self, _external_id: &str) -> StoreResult<User> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(self.error.clone())
    }

    async fn get_groups_by_user_id(&self, _user_id: &str) -> StoreResult<Vec<Group>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(self.error.clone())
    }

    async fn get_attached_policies(&self, _group_id: &str) -> StoreResult<Vec<Policy>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(self.error.clone())
    }
}

// ============================================================================
// STATEMENT RESOLUTION
// ============================================================================

#[tokio::test]
async fn test_effective_statements_union_of_groups() {
    let authorizer = Authorizer::new(seeded_repo().await);

    let statements = authorizer
        .effective_statements(&RequestInfo::new("alice"))
        .await
        .unwrap();

    assert_eq!(statements.len(), 2);
}

#[tokio::test]
async fn test_identity_without_groups_gets_empty_result() {
    let authorizer = Authorizer::new(seeded_repo().await);

    let authorized = authorizer
        .authorized_external_resources(&RequestInfo::new("bob"), "widget:read", widgets(&["1", "2"]))
        .await
        .unwrap();

    assert!(authorized.is_empty());
}

#[tokio::test]
async fn test_unknown_identity_is_not_an_error() {
    let authorizer = Authorizer::new(seeded_repo().await);

    let allowed = authorizer
        .is_allowed(&RequestInfo::new("mallory"), "urn:ews:org1:widget/1", "widget:read")
        .await
        .unwrap();

    assert!(!allowed);
}

// ============================================================================
// FILTERING
// ============================================================================

#[tokio::test]
async fn test_filter_preserves_candidate_order() {
    let authorizer = Authorizer::new(seeded_repo().await);

    let authorized = authorizer
        .authorized_external_resources(
            &RequestInfo::new("alice"),
            "widget:read",
            widgets(&["a", "secret", "c"]),
        )
        .await
        .unwrap();

    assert_eq!(authorized, widgets(&["a", "c"]));
}

#[tokio::test]
async fn test_deny_from_one_group_overrides_allow_from_another() {
    let authorizer = Authorizer::new(seeded_repo().await);
    let alice = RequestInfo::new("alice");

    assert!(!authorizer
        .is_allowed(&alice, "urn:ews:org1:widget/secret", "widget:read")
        .await
        .unwrap());

    // The deny only covers widget:read
    assert!(authorizer
        .is_allowed(&alice, "urn:ews:org1:widget/secret", "widget:update")
        .await
        .unwrap());
}

#[tokio::test]
async fn test_typed_filter_uses_candidate_urns() {
    let repo = seeded_repo().await;
    repo.insert_policy(policy(
        "see-team-users",
        vec![Statement::allow(["iam:GetUser"], ["urn:ews::user/team/*"])],
    ))
    .await;
    repo.attach_policy("readers", "see-team-users").await;
    let authorizer = Authorizer::new(repo);

    let mut inside = user("u1", "carol");
    inside.urn = "urn:ews::user/team/carol".to_string();
    let mut outside = user("u2", "dave");
    outside.urn = "urn:ews::user/other/dave".to_string();

    let authorized = authorizer
        .authorized_users(
            &RequestInfo::new("alice"),
            "urn:ews::user/*",
            "iam:GetUser",
            vec![inside.clone(), outside],
        )
        .await
        .unwrap();

    assert_eq!(authorized, vec![inside]);
}

#[tokio::test]
async fn test_generic_filter_with_custom_extractor() {
    let authorizer = Authorizer::new(seeded_repo().await);

    let candidates = vec![("first", "urn:ews:org1:widget/1"), ("second", "urn:ews:org2:widget/1")];
    let authorized = authorizer
        .authorize(
            &RequestInfo::new("alice"),
            "urn:ews:*",
            "widget:read",
            candidates,
            |candidate| candidate.1,
        )
        .await
        .unwrap();

    assert_eq!(authorized, vec![("first", "urn:ews:org1:widget/1")]);
}

#[tokio::test]
async fn test_groups_and_policies_filters() {
    let repo = seeded_repo().await;
    repo.insert_policy(policy(
        "org1-iam-read",
        vec![Statement::allow(["iam:Get*"], ["urn:ews:org1:*"])],
    ))
    .await;
    repo.attach_policy("readers", "org1-iam-read").await;
    let authorizer = Authorizer::new(repo);
    let alice = RequestInfo::new("alice");

    let groups = authorizer
        .authorized_groups(&alice, "urn:ews:org1:group/*", "iam:GetGroup", vec![group("g1")])
        .await
        .unwrap();
    assert_eq!(groups.len(), 1);

    let policies = authorizer
        .authorized_policies(
            &alice,
            "urn:ews:org1:policy/*",
            "iam:DeletePolicy",
            vec![policy("p1", vec![])],
        )
        .await
        .unwrap();
    assert!(policies.is_empty());
}

// ============================================================================
// ADMIN BYPASS
// ============================================================================

#[tokio::test]
async fn test_admin_bypass_skips_repository() {
    let repo = Arc::new(FaultyRepository::new(StoreError::Internal("down".to_string())));
    let authorizer = Authorizer::new(repo.clone());

    let candidates = widgets(&["1", "2", "3"]);
    let authorized = authorizer
        .authorized_external_resources(&RequestInfo::admin("root"), "widget:read", candidates.clone())
        .await
        .unwrap();

    assert_eq!(authorized, candidates);
    assert_eq!(repo.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_super_admin_policy_is_distinct_from_bypass() {
    let repo = seeded_repo().await;
    repo.insert_policy(policy("everything", vec![Statement::allow(["*"], ["urn:*"])]))
        .await;
    repo.insert_group(group("admins")).await;
    repo.add_member("admins", "u-bob").await;
    repo.attach_policy("admins", "everything").await;
    let authorizer = Authorizer::new(repo);

    let authorized = authorizer
        .authorized_external_resources(&RequestInfo::new("bob"), "iam:DeleteUser", widgets(&["x"]))
        .await
        .unwrap();
    assert_eq!(authorized, widgets(&["x"]));
}

// ============================================================================
// ERRORS
// ============================================================================

#[tokio::test]
async fn test_repository_internal_error_propagates() {
    let repo = Arc::new(FaultyRepository::new(StoreError::Internal("connection reset".to_string())));
    let authorizer = Authorizer::new(repo);

    let result = authorizer
        .is_allowed(&RequestInfo::new("alice"), "urn:ews:org1:widget/1", "widget:read")
        .await;

    match result {
        Err(AuthzError::Internal(msg)) => assert!(msg.contains("connection reset")),
        other => panic!("expected internal error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_repository_not_found_means_no_statements() {
    let repo = Arc::new(FaultyRepository::new(StoreError::NotFound("user".to_string())));
    let authorizer = Authorizer::new(repo);

    let authorized = authorizer
        .authorized_external_resources(&RequestInfo::new("alice"), "widget:read", widgets(&["1"]))
        .await
        .unwrap();

    assert!(authorized.is_empty());
}

#[tokio::test]
async fn test_malformed_input_rejected_before_matching() {
    let authorizer = Authorizer::new(seeded_repo().await);
    let alice = RequestInfo::new("alice");

    let bad_urn = authorizer
        .authorized_external_resources(&alice, "widget:read", vec!["%&".to_string()])
        .await;
    assert!(matches!(bad_urn, Err(AuthzError::InvalidInput(_))));

    let bad_action = authorizer
        .authorized_external_resources(&alice, "&%", widgets(&["1"]))
        .await;
    assert!(matches!(bad_action, Err(AuthzError::InvalidInput(_))));

    let bad_query = authorizer
        .authorized_users(&alice, "not a urn", "iam:GetUser", vec![])
        .await;
    assert!(matches!(bad_query, Err(AuthzError::InvalidInput(_))));
}

// ============================================================================
// PROPERTY-BASED TESTS (PROPTEST)
// ============================================================================

proptest! {
    #[test]
    fn test_admin_bypass_returns_every_candidate(ids in prop::collection::vec("[a-z0-9]{1,8}", 0..20)) {
        tokio_test::block_on(async {
            let repo = Arc::new(FaultyRepository::new(StoreError::Internal("down".to_string())));
            let authorizer = Authorizer::new(repo);
            let candidates: Vec<String> = ids.iter().map(|id| format!("urn:ews:org1:widget/{}", id)).collect();

            let authorized = authorizer
                .authorized_external_resources(&RequestInfo::admin("root"), "widget:read", candidates.clone())
                .await
                .unwrap();

            assert_eq!(authorized, candidates);
        });
    }

    #[test]
    fn test_filter_result_is_ordered_subsequence(ids in prop::collection::vec("(secret|[a-z0-9]{1,8})", 0..20)) {
        tokio_test::block_on(async {
            let authorizer = Authorizer::new(seeded_repo().await);
            let candidates: Vec<String> = ids.iter().map(|id| format!("urn:ews:org1:widget/{}", id)).collect();

            let authorized = authorizer
                .authorized_external_resources(&RequestInfo::new("alice"), "widget:read", candidates.clone())
                .await
                .unwrap();

            let expected: Vec<String> = candidates
                .into_iter()
                .filter(|urn| urn != "urn:ews:org1:widget/secret")
                .collect();
            assert_eq!(authorized, expected);
        });
    }
}
