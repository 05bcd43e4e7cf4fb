//! User administration tests
//!
//! Each operation must be authorized before it touches the repository.

use chrono::Utc;
use std::sync::Arc;
use warden_authz::{
    AuthzError, Group, InMemoryRepository, Policy, RequestInfo, Statement, User, UserService,
};

fn admin() -> RequestInfo {
    RequestInfo::admin("root")
}

fn group(id: &str) -> Group {
    Group {
        id: id.to_string(),
        org: "org1".to_string(),
        name: format!("{}-name", id),
        path: "/".to_string(),
        urn: format!("urn:ews:org1:group/{}", id),
    }
}

/// Service with `operator` granted the given statements through one group
async fn service_with_operator(statements: Vec<Statement>) -> (UserService, Arc<InMemoryRepository>) {
    let repo = Arc::new(InMemoryRepository::new());
    repo.insert_user(User {
        id: "u-operator".to_string(),
        external_id: "operator".to_string(),
        path: "/ops/".to_string(),
        urn: "urn:ews::user/ops/operator".to_string(),
        created_at: Utc::now(),
    })
    .await;
    repo.insert_group(group("operators")).await;
    repo.insert_policy(Policy {
        id: "p-operators".to_string(),
        name: "operators".to_string(),
        org: "org1".to_string(),
        path: "/".to_string(),
        urn: "urn:ews:org1:policy/operators".to_string(),
        statements,
        created_at: Utc::now(),
    })
    .await;
    repo.add_member("operators", "u-operator").await;
    repo.attach_policy("operators", "p-operators").await;

    (UserService::new(repo.clone()), repo)
}

#[tokio::test]
async fn test_admin_creates_and_fetches_user() {
    let (service, _) = service_with_operator(vec![]).await;

    let created = service.add_user(&admin(), "alice", "/team/").await.unwrap();
    assert_eq!(created.urn, "urn:ews::user/team/alice");
    assert!(!created.id.is_empty());

    let fetched = service.get_user(&admin(), "alice").await.unwrap();
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn test_add_user_rejects_duplicate_external_id() {
    let (service, _) = service_with_operator(vec![]).await;
    service.add_user(&admin(), "alice", "/").await.unwrap();

    let result = service.add_user(&admin(), "alice", "/other/").await;
    assert!(matches!(result, Err(AuthzError::AlreadyExists(_))));
}

#[tokio::test]
async fn test_add_user_validates_input() {
    let (service, _) = service_with_operator(vec![]).await;

    let bad_id = service.add_user(&admin(), "al ice", "/").await;
    assert!(matches!(bad_id, Err(AuthzError::InvalidInput(_))));

    let bad_path = service.add_user(&admin(), "alice", "team").await;
    assert!(matches!(bad_path, Err(AuthzError::InvalidInput(_))));
}

#[tokio::test]
async fn test_add_user_requires_create_permission() {
    let (service, _) = service_with_operator(vec![Statement::allow(
        ["iam:CreateUser"],
        ["urn:ews::user/team/*"],
    )])
    .await;
    let operator = RequestInfo::new("operator");

    assert!(service.add_user(&operator, "alice", "/team/").await.is_ok());

    let outside = service.add_user(&operator, "bob", "/finance/").await;
    assert!(matches!(outside, Err(AuthzError::Unauthorized(_))));
}

#[tokio::test]
async fn test_get_user_distinguishes_missing_from_denied() {
    let (service, _) = service_with_operator(vec![]).await;
    service.add_user(&admin(), "alice", "/team/").await.unwrap();
    let operator = RequestInfo::new("operator");

    let missing = service.get_user(&operator, "nobody").await;
    assert!(matches!(missing, Err(AuthzError::NotFound(_))));

    let denied = service.get_user(&operator, "alice").await;
    assert!(matches!(denied, Err(AuthzError::Unauthorized(_))));
}

#[tokio::test]
async fn test_list_users_filters_by_permission_and_keeps_order() {
    let (service, _) = service_with_operator(vec![
        Statement::allow(["iam:ListUsers"], ["urn:ews::user/team/*"]),
        Statement::deny(["iam:ListUsers"], ["urn:ews::user/team/bob"]),
    ])
    .await;
    for (id, path) in [("alice", "/team/"), ("bob", "/team/"), ("carol", "/team/dev/"), ("dave", "/finance/")] {
        service.add_user(&admin(), id, path).await.unwrap();
    }
    let operator = RequestInfo::new("operator");

    let listed = service.list_users(&operator, "").await.unwrap();
    assert_eq!(listed, vec!["alice", "carol"]);

    let scoped = service.list_users(&operator, "/team/dev/").await.unwrap();
    assert_eq!(scoped, vec!["carol"]);

    let invalid = service.list_users(&operator, "team").await;
    assert!(matches!(invalid, Err(AuthzError::InvalidInput(_))));
}

#[tokio::test]
async fn test_update_user_needs_access_to_old_and_new_location() {
    let (service, _) = service_with_operator(vec![Statement::allow(
        ["iam:GetUser", "iam:UpdateUser"],
        ["urn:ews::user/team/*"],
    )])
    .await;
    service.add_user(&admin(), "alice", "/team/").await.unwrap();
    let operator = RequestInfo::new("operator");

    let moved = service.update_user(&operator, "alice", "/team/dev/").await.unwrap();
    assert_eq!(moved.urn, "urn:ews::user/team/dev/alice");
    assert_eq!(moved.path, "/team/dev/");

    let escaped = service.update_user(&operator, "alice", "/finance/").await;
    assert!(matches!(escaped, Err(AuthzError::Unauthorized(_))));
}

#[tokio::test]
async fn test_remove_user() {
    let (service, _) = service_with_operator(vec![Statement::allow(
        ["iam:GetUser"],
        ["urn:ews::user/*"],
    )])
    .await;
    service.add_user(&admin(), "alice", "/").await.unwrap();
    let operator = RequestInfo::new("operator");

    let denied = service.remove_user(&operator, "alice").await;
    assert!(matches!(denied, Err(AuthzError::Unauthorized(_))));

    service.remove_user(&admin(), "alice").await.unwrap();
    let gone = service.get_user(&admin(), "alice").await;
    assert!(matches!(gone, Err(AuthzError::NotFound(_))));
}

#[tokio::test]
async fn test_list_groups_by_user() {
    let (service, repo) = service_with_operator(vec![]).await;
    let alice = service.add_user(&admin(), "alice", "/").await.unwrap();
    repo.insert_group(group("devs")).await;
    repo.add_member("devs", &alice.id).await;

    let groups = service.list_groups_by_user(&admin(), "alice").await.unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].name, "devs-name");
    assert_eq!(groups[0].org, "org1");

    let denied = service
        .list_groups_by_user(&RequestInfo::new("operator"), "alice")
        .await;
    assert!(matches!(denied, Err(AuthzError::Unauthorized(_))));
}
