//! Connector behaviour against a mock FreshBooks API.

use std::sync::Arc;
use std::time::Duration;

use freshbooks_client::{ClientConfig, ClientError, Credentials, FreshBooksClient, SecretString};
use freshbooks_connector::Connector;
use freshbooks_connector_sdk::{
    ConnectorApi, PageToken, Resource, ResourceId, ResourceSyncer, SyncError, UserStatus,
};
use httpmock::prelude::*;
use serde_json::json;

const ME_PATH: &str = "/auth/api/v1/users/me";
const MEMBERS_PATH: &str = "/auth/api/v1/businesses/42/team_members";

fn connector(server: &MockServer) -> Connector {
    let client = FreshBooksClient::builder(Credentials::Static {
        access_token: SecretString::new("tok"),
    })
    .config(ClientConfig::with_base_url(&server.url("/auth/")).unwrap())
    .build()
    .unwrap();
    Connector::new(Arc::new(client))
}

fn mock_me(server: &MockServer) -> httpmock::Mock<'_> {
    server.mock(|when, then| {
        when.method(GET).path(ME_PATH);
        then.status(200)
            .json_body(json!({"response": {"business_memberships": [{"business": {"id": 42}}]}}));
    })
}

fn member(uuid: &str, role: &str) -> serde_json::Value {
    json!({
        "uuid": uuid,
        "first_name": format!("First {uuid}"),
        "last_name": "Member",
        "email": format!("{uuid}@example.com"),
        "business_role_name": role,
        "active": true
    })
}

/// Members `a` (owner), `b` (business_manager), `c` (owner) on one page.
fn mock_members(server: &MockServer) -> httpmock::Mock<'_> {
    server.mock(|when, then| {
        when.method(GET).path(MEMBERS_PATH);
        then.status(200).json_body(json!({
            "response": [
                member("a", "owner"),
                member("b", "business_manager"),
                member("c", "owner")
            ]
        }));
    })
}

fn split(syncers: Vec<Box<dyn ResourceSyncer>>) -> (Box<dyn ResourceSyncer>, Box<dyn ResourceSyncer>) {
    let mut users = None;
    let mut roles = None;
    for syncer in syncers {
        match syncer.resource_type().id.as_str() {
            "user" => users = Some(syncer),
            "role" => roles = Some(syncer),
            other => panic!("unexpected resource type {other}"),
        }
    }
    (users.unwrap(), roles.unwrap())
}

async fn role(roles: &dyn ResourceSyncer, key: &str) -> Resource {
    roles
        .list(None, &PageToken::default())
        .await
        .unwrap()
        .items
        .into_iter()
        .find(|r| r.id.resource == key)
        .unwrap()
}

fn principals(grants: &[freshbooks_connector_sdk::Grant]) -> Vec<&str> {
    grants.iter().map(|g| g.principal.resource.as_str()).collect()
}

#[tokio::test]
async fn roles_are_the_static_table() {
    let server = MockServer::start();
    let (_, roles) = split(connector(&server).resource_syncers());

    let page = roles.list(None, &PageToken::default()).await.unwrap();
    let ids: Vec<_> = page.items.iter().map(|r| r.id.resource.as_str()).collect();
    let names: Vec<_> = page.items.iter().map(|r| r.display_name.as_str()).collect();

    assert!(page.is_last());
    assert_eq!(
        ids,
        ["owner", "business_manager", "business_employee", "contractor", "no_seat_employee"]
    );
    assert_eq!(names, ["admin", "manager", "employee", "contractor", "accountant"]);
}

#[tokio::test]
async fn role_offers_single_assigned_entitlement() {
    let server = MockServer::start();
    let (_, roles) = split(connector(&server).resource_syncers());
    let owner = role(roles.as_ref(), "owner").await;

    let page = roles
        .entitlements(&owner, &PageToken::default())
        .await
        .unwrap();

    assert_eq!(page.items.len(), 1);
    let ent = &page.items[0];
    assert_eq!(ent.id, "role:owner:assigned");
    assert_eq!(ent.slug, "assigned");
    assert_eq!(ent.display_name, "admin");
    assert_eq!(ent.grantable_to, ["user"]);
}

#[tokio::test]
async fn grants_follow_business_role_name() {
    let server = MockServer::start();
    mock_me(&server);
    mock_members(&server);
    let (_, roles) = split(connector(&server).resource_syncers());

    let owner = role(roles.as_ref(), "owner").await;
    let manager = role(roles.as_ref(), "business_manager").await;
    let contractor = role(roles.as_ref(), "contractor").await;

    let owner_grants = roles.grants(&owner, &PageToken::default()).await.unwrap();
    let manager_grants = roles.grants(&manager, &PageToken::default()).await.unwrap();
    let contractor_grants = roles.grants(&contractor, &PageToken::default()).await.unwrap();

    assert_eq!(principals(&owner_grants.items), ["a", "c"]);
    assert_eq!(principals(&manager_grants.items), ["b"]);
    assert!(contractor_grants.items.is_empty());
    assert_eq!(owner_grants.items[0].id, "role:owner:assigned:user:a");
    assert_eq!(owner_grants.items[0].entitlement_id, "role:owner:assigned");
}

#[tokio::test]
async fn role_match_is_case_sensitive() {
    let server = MockServer::start();
    mock_me(&server);
    server.mock(|when, then| {
        when.method(GET).path(MEMBERS_PATH);
        then.status(200)
            .json_body(json!({"response": [member("x", "Owner"), member("y", "owner ")]}));
    });
    let (_, roles) = split(connector(&server).resource_syncers());
    let owner = role(roles.as_ref(), "owner").await;

    let grants = roles.grants(&owner, &PageToken::default()).await.unwrap();
    assert!(grants.items.is_empty());
}

#[tokio::test]
async fn grant_derivations_share_one_fetch() {
    let server = MockServer::start();
    let me = mock_me(&server);
    let members = mock_members(&server);
    let (_, roles) = split(connector(&server).resource_syncers());

    let owner = role(roles.as_ref(), "owner").await;
    let manager = role(roles.as_ref(), "business_manager").await;

    roles.grants(&owner, &PageToken::default()).await.unwrap();
    roles.grants(&manager, &PageToken::default()).await.unwrap();

    me.assert_calls(1);
    members.assert_calls(1);
}

#[tokio::test]
async fn concurrent_grant_derivations_share_one_fetch() {
    let server = MockServer::start();
    mock_me(&server);
    let members = server.mock(|when, then| {
        when.method(GET).path(MEMBERS_PATH);
        then.status(200)
            .delay(Duration::from_millis(100))
            .json_body(json!({"response": [member("a", "owner"), member("b", "contractor")]}));
    });
    let (_, roles) = split(connector(&server).resource_syncers());
    let all_roles = roles.list(None, &PageToken::default()).await.unwrap().items;
    let token = PageToken::default();

    let results =
        futures::future::join_all(all_roles.iter().map(|r| roles.grants(r, &token))).await;

    let total: usize = results.into_iter().map(|r| r.unwrap().items.len()).sum();
    assert_eq!(total, 2);
    members.assert_calls(1);
}

#[tokio::test]
async fn cache_walks_every_page() {
    let server = MockServer::start();
    mock_me(&server);
    let pages: Vec<_> = (1..=3u32)
        .map(|n| {
            server.mock(move |when, then| {
                when.method(GET)
                    .path(MEMBERS_PATH)
                    .query_param("page", n.to_string());
                then.status(200).json_body(json!({
                    "response": [member(&format!("m{n}"), "owner")],
                    "meta": {"page": n, "per_page": 1, "total": 3}
                }));
            })
        })
        .collect();
    let (_, roles) = split(connector(&server).with_page_size(1).resource_syncers());
    let owner = role(roles.as_ref(), "owner").await;

    let grants = roles.grants(&owner, &PageToken::default()).await.unwrap();

    assert_eq!(principals(&grants.items), ["m1", "m2", "m3"]);
    for page in &pages {
        page.assert_calls(1);
    }
}

#[tokio::test]
async fn each_sync_run_gets_a_fresh_cache() {
    let server = MockServer::start();
    mock_me(&server);
    let members = mock_members(&server);
    let connector = connector(&server);

    for _ in 0..2 {
        let (_, roles) = split(connector.resource_syncers());
        let owner = role(roles.as_ref(), "owner").await;
        roles.grants(&owner, &PageToken::default()).await.unwrap();
    }

    members.assert_calls(2);
}

#[tokio::test]
async fn empty_member_list_is_cached() {
    let server = MockServer::start();
    mock_me(&server);
    let members = server.mock(|when, then| {
        when.method(GET).path(MEMBERS_PATH);
        then.status(200).json_body(json!({"response": []}));
    });
    let (_, roles) = split(connector(&server).resource_syncers());
    let owner = role(roles.as_ref(), "owner").await;
    let contractor = role(roles.as_ref(), "contractor").await;

    let first = roles.grants(&owner, &PageToken::default()).await.unwrap();
    let second = roles.grants(&contractor, &PageToken::default()).await.unwrap();

    // An empty business is a valid result: the second derivation reuses it
    // instead of fetching again.
    assert!(first.items.is_empty());
    assert!(second.items.is_empty());
    members.assert_calls(1);
}

#[tokio::test]
async fn failed_fetch_is_not_cached() {
    let server = MockServer::start();
    mock_me(&server);
    let mut failing = server.mock(|when, then| {
        when.method(GET).path(MEMBERS_PATH);
        then.status(500);
    });
    let (_, roles) = split(connector(&server).resource_syncers());
    let owner = role(roles.as_ref(), "owner").await;

    let err = roles.grants(&owner, &PageToken::default()).await.unwrap_err();
    assert!(matches!(
        err.upstream_as::<ClientError>(),
        Some(ClientError::Status { .. })
    ));

    failing.delete();
    mock_members(&server);
    let grants = roles.grants(&owner, &PageToken::default()).await.unwrap();
    assert_eq!(grants.items.len(), 2);
}

#[tokio::test]
async fn users_map_team_members() {
    let server = MockServer::start();
    mock_me(&server);
    server.mock(|when, then| {
        when.method(GET).path(MEMBERS_PATH);
        then.status(200).json_body(json!({
            "response": [
                {"uuid": "n1", "first_name": "", "last_name": "", "email": "noname@example.com", "active": false},
                {"uuid": "n2", "first_name": "Grace", "last_name": "Hopper", "email": "grace@example.com", "active": true}
            ]
        }));
    });
    let (users, _) = split(connector(&server).resource_syncers());

    let page = users.list(None, &PageToken::first(50)).await.unwrap();

    assert!(page.is_last());
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[0].id, ResourceId::new("user", "n1"));
    assert_eq!(page.items[0].display_name, "noname@example.com");
    assert_eq!(page.items[1].display_name, "Grace Hopper");
    for user in &page.items {
        assert_eq!(user.user_trait().unwrap().status, UserStatus::Enabled);
    }
}

#[tokio::test]
async fn user_listing_returns_page_cursor() {
    let server = MockServer::start();
    mock_me(&server);
    let first = server.mock(|when, then| {
        when.method(GET)
            .path(MEMBERS_PATH)
            .query_param("page", "1")
            .query_param("per_page", "2");
        then.status(200).json_body(json!({
            "response": [member("a", "owner"), member("b", "owner")],
            "meta": {"page": 1, "per_page": 2, "total": 3}
        }));
    });
    let second = server.mock(|when, then| {
        when.method(GET)
            .path(MEMBERS_PATH)
            .query_param("page", "2")
            .query_param("per_page", "2");
        then.status(200).json_body(json!({
            "response": [member("c", "owner")],
            "meta": {"page": 2, "per_page": 2, "total": 3}
        }));
    });
    let (users, _) = split(connector(&server).resource_syncers());

    let page1 = users.list(None, &PageToken::first(2)).await.unwrap();
    assert_eq!(page1.next_token.as_deref(), Some("2"));

    let token = PageToken {
        size: 2,
        token: page1.next_token.unwrap(),
    };
    let page2 = users.list(None, &token).await.unwrap();
    assert!(page2.is_last());
    assert_eq!(page2.items[0].id.resource, "c");

    first.assert_calls(1);
    second.assert_calls(1);
}

#[tokio::test]
async fn users_have_no_entitlements_or_grants() {
    let server = MockServer::start();
    let (users, _) = split(connector(&server).resource_syncers());
    let user = Resource::new(users.resource_type(), "u-1", "User One");

    assert!(users.entitlements(&user, &PageToken::default()).await.unwrap().items.is_empty());
    assert!(users.grants(&user, &PageToken::default()).await.unwrap().items.is_empty());
}

#[tokio::test]
async fn garbage_page_token_is_rejected() {
    let server = MockServer::start();
    let (users, _) = split(connector(&server).resource_syncers());

    let token = PageToken {
        size: 50,
        token: "not-a-page".into(),
    };
    let err = users.list(None, &token).await.unwrap_err();
    assert!(matches!(err, SyncError::InvalidPageToken(_)));
}

#[tokio::test]
async fn validate_resolves_business() {
    let server = MockServer::start();
    let me = mock_me(&server);
    let connector = connector(&server);

    connector.validate().await.unwrap();
    connector.validate().await.unwrap();

    me.assert_calls(1);
    assert_eq!(connector.client().business_id().unwrap().as_str(), "42");
}

#[tokio::test]
async fn validate_reports_missing_business() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path(ME_PATH);
        then.status(200)
            .json_body(json!({"response": {"business_memberships": []}}));
    });

    let err = connector(&server).validate().await.unwrap_err();
    assert!(matches!(
        err.upstream_as::<ClientError>(),
        Some(ClientError::TenantNotFound)
    ));
}

#[tokio::test]
async fn metadata_names_freshbooks() {
    let server = MockServer::start();
    assert_eq!(connector(&server).metadata().display_name, "FreshBooks");
}
