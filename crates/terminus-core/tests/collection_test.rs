#![allow(clippy::unwrap_used)]
// Integration tests for `Collection` and `Model` against a mock gateway.

mod common;

use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use common::{record, setup};
use terminus_core::{
    Collection, ConnectionMode, CoreError, Environment, Model, Organization, Scope, Site,
    SiteMembership, TerminusConfig,
};

const ENVS: &str = "/api/sites/abc/environments";

fn environments() -> Value {
    json!({
        "live": { "domain": "live-abc.pantheonsite.io", "on_server_development": false },
        "dev": { "domain": "dev-abc.pantheonsite.io", "connection_mode": "sftp" },
        "test": { "domain": "test-abc.pantheonsite.io" }
    })
}

// ── Fetch ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_fetch_preserves_response_order() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path(ENVS))
        .respond_with(ResponseTemplate::new(200).set_body_json(environments()))
        .mount(&server)
        .await;

    let mut envs = Collection::<Environment>::new(Scope::site("abc"));
    assert!(!envs.is_fetched());
    envs.fetch(&client).await.unwrap();

    assert!(envs.is_fetched());
    assert_eq!(envs.ids(), vec!["live", "dev", "test"]);
    let dev = envs.get("dev").unwrap();
    assert_eq!(dev.connection_mode(), ConnectionMode::Sftp);
    assert_eq!(dev.attribute("id"), Some(&json!("dev")));
    assert_eq!(dev.scope(), &Scope::site("abc"));
}

#[tokio::test]
async fn test_fetch_accepts_an_array_listing() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path(ENVS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "test" },
            { "id": "dev", "on_server_development": true }
        ])))
        .mount(&server)
        .await;

    let mut envs = Collection::<Environment>::new(Scope::site("abc"));
    envs.fetch(&client).await.unwrap();
    assert_eq!(envs.ids(), vec!["test", "dev"]);
    assert_eq!(
        envs.get("dev").unwrap().connection_mode(),
        ConnectionMode::Sftp
    );
}

#[tokio::test]
async fn test_fetch_replaces_membership() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path(ENVS))
        .respond_with(ResponseTemplate::new(200).set_body_json(environments()))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(ENVS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "dev": {} })))
        .mount(&server)
        .await;

    let mut envs = Collection::<Environment>::new(Scope::site("abc"));
    envs.fetch(&client).await.unwrap();
    assert_eq!(envs.len(), 3);
    envs.fetch(&client).await.unwrap();
    assert_eq!(envs.ids(), vec!["dev"]);
    assert!(!envs.contains("live"));
}

#[tokio::test]
async fn test_failed_fetch_leaves_membership_untouched() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path(ENVS))
        .respond_with(ResponseTemplate::new(200).set_body_json(environments()))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(ENVS))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let mut envs = Collection::<Environment>::new(Scope::site("abc"));
    envs.fetch(&client).await.unwrap();

    let err = envs.fetch(&client).await.unwrap_err();
    assert!(matches!(err, CoreError::Api(ref e) if e.is_transient()), "got: {err:?}");
    assert_eq!(envs.ids(), vec!["live", "dev", "test"]);
}

#[tokio::test]
async fn test_invalid_member_rejects_whole_listing() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path(ENVS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "dev": {},
            "test": { "connection_mode": "carrier-pigeon" }
        })))
        .mount(&server)
        .await;

    let mut envs = Collection::<Environment>::new(Scope::site("abc"));
    let err = envs.fetch(&client).await.unwrap_err();
    assert!(matches!(err, CoreError::InvalidRecord { .. }), "got: {err:?}");
    assert!(envs.is_empty());
    assert!(!envs.is_fetched());
}

#[tokio::test]
async fn test_fetch_under_unaddressable_scope_makes_no_request() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let mut envs = Collection::<Environment>::new(Scope::Root);
    let err = envs.fetch(&client).await.unwrap_err();
    assert!(matches!(err, CoreError::Validation { .. }), "got: {err:?}");
}

// ── Lookup and views ────────────────────────────────────────────────

async fn fetched_environments() -> Collection<Environment> {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path(ENVS))
        .respond_with(ResponseTemplate::new(200).set_body_json(environments()))
        .mount(&server)
        .await;
    let mut envs = Collection::<Environment>::new(Scope::site("abc"));
    envs.fetch(&client).await.unwrap();
    envs
}

#[tokio::test]
async fn test_get_missing_member_is_not_found() {
    let envs = fetched_environments().await;
    let err = envs.get("multidev").unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(
        err.to_string(),
        "Entity not found: environment with id multidev"
    );
}

#[tokio::test]
async fn test_listing_reads_member_attributes() {
    let envs = fetched_environments().await;
    let listing = envs.listing("id", "domain");
    assert_eq!(
        listing.into_iter().collect::<Vec<_>>(),
        vec![
            ("live".to_string(), json!("live-abc.pantheonsite.io")),
            ("dev".to_string(), json!("dev-abc.pantheonsite.io")),
            ("test".to_string(), json!("test-abc.pantheonsite.io")),
        ]
    );

    let missing_value = envs.listing("id", "no_such_field");
    assert_eq!(missing_value.get("dev"), Some(&Value::Null));

    assert!(envs.listing("no_such_field", "id").is_empty());
}

#[tokio::test]
async fn test_filtered_member_list() {
    let envs = fetched_environments().await;
    let sftp = envs.filtered_member_list(
        &record(json!({ "connection_mode": "sftp" })),
        "id",
        "domain",
    );
    assert_eq!(sftp.keys().collect::<Vec<_>>(), vec!["dev"]);

    let everything = envs.filtered_member_list(&record(json!({})), "domain", "id");
    assert_eq!(everything.len(), 3);
    assert_eq!(everything.get("test-abc.pantheonsite.io"), Some(&json!("test")));
}

#[tokio::test]
async fn test_add_builds_without_inserting() {
    let envs = fetched_environments().await;
    let model = envs
        .add(
            record(json!({ "id": "multi", "connection_mode": "git" })),
            record(json!({ "origin": "create" })),
        )
        .unwrap();
    assert_eq!(model.id(), "multi");
    assert_eq!(model.context().get("origin"), Some(&json!("create")));
    assert!(!envs.contains("multi"));
}

#[tokio::test]
async fn test_serialize_in_member_order() {
    let envs = fetched_environments().await;
    let summary = serde_json::to_value(envs.serialize(&TerminusConfig::default())).unwrap();
    assert_eq!(
        summary,
        json!({
            "live": {
                "id": "live",
                "domain": "live-abc.pantheonsite.io",
                "connection_mode": "git",
                "initialized": false
            },
            "dev": {
                "id": "dev",
                "domain": "dev-abc.pantheonsite.io",
                "connection_mode": "sftp",
                "initialized": false
            },
            "test": {
                "id": "test",
                "domain": "test-abc.pantheonsite.io",
                "connection_mode": "git",
                "initialized": false
            }
        })
    );
}

// ── Single models ───────────────────────────────────────────────────

#[tokio::test]
async fn test_model_get_and_refetch() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/sites/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "my-site", "framework": "drupal8"
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/sites/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "renamed", "frozen": true
        })))
        .mount(&server)
        .await;

    let mut site = Model::<Site>::get(&client, Scope::Root, "abc").await.unwrap();
    assert!(site.is_fetched());
    assert_eq!(site.name(), "my-site");
    assert_eq!(site.attribute("id"), Some(&json!("abc")));

    site.fetch(&client).await.unwrap();
    assert_eq!(site.name(), "renamed");
    assert!(site.is_frozen());
    assert_eq!(site.attribute("framework"), None);
}

#[tokio::test]
async fn test_failed_refetch_keeps_attributes() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/sites/abc"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let mut site =
        Model::<Site>::from_record(record(json!({ "id": "abc", "name": "my-site" })), Scope::Root)
            .unwrap();
    let err = site.fetch(&client).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(site.name(), "my-site");
    assert!(!site.is_fetched());
}

#[tokio::test]
async fn test_refetch_with_invalid_record_keeps_attributes() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/sites/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "framework": "wordpress" })))
        .mount(&server)
        .await;

    let mut site =
        Model::<Site>::from_record(record(json!({ "id": "abc", "name": "my-site" })), Scope::Root)
            .unwrap();
    assert!(site.fetch(&client).await.is_err());
    assert_eq!(site.name(), "my-site");
    assert_eq!(site.attribute("framework"), None);
}

#[tokio::test]
async fn test_organization_features_are_requested_once() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/organizations/org1/features"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "change_management": true,
            "multidev": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut org = Model::<Organization>::from_record(
        record(json!({ "id": "org1", "profile": { "name": "Agency" } })),
        Scope::user("u1"),
    )
    .unwrap();

    assert_eq!(
        org.feature(&client, "change_management").await.unwrap(),
        Some(json!(true))
    );
    assert_eq!(org.feature(&client, "multidev").await.unwrap(), Some(json!(false)));
    assert_eq!(org.feature(&client, "unknown").await.unwrap(), None);
}

#[tokio::test]
async fn test_non_object_features_are_rejected_and_not_cached() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/organizations/org1/features"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["multidev"])))
        .expect(2)
        .mount(&server)
        .await;

    let mut org = Model::<Organization>::from_record(
        record(json!({ "id": "org1" })),
        Scope::user("u1"),
    )
    .unwrap();

    for _ in 0..2 {
        let err = org.feature(&client, "multidev").await.unwrap_err();
        assert!(
            matches!(err, CoreError::InvalidRecord { entity_type: "organization", .. }),
            "got: {err:?}"
        );
    }
}

#[tokio::test]
async fn test_null_features_mean_none_enabled() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/organizations/org1/features"))
        .respond_with(ResponseTemplate::new(200).set_body_json(Value::Null))
        .expect(1)
        .mount(&server)
        .await;

    let mut org = Model::<Organization>::from_record(
        record(json!({ "id": "org1" })),
        Scope::user("u1"),
    )
    .unwrap();
    assert_eq!(org.feature(&client, "multidev").await.unwrap(), None);
    assert_eq!(org.feature(&client, "multidev").await.unwrap(), None);
}

// ── Duplicates ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_duplicate_ids_in_an_array_listing_are_rejected() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path(ENVS))
        .respond_with(ResponseTemplate::new(200).set_body_json(environments()))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(ENVS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "dev", "connection_mode": "sftp" },
            { "id": "dev", "connection_mode": "git" }
        ])))
        .mount(&server)
        .await;

    let mut envs = Collection::<Environment>::new(Scope::site("abc"));
    envs.fetch(&client).await.unwrap();

    let err = envs.fetch(&client).await.unwrap_err();
    assert!(
        matches!(err, CoreError::InvalidRecord { ref identifier, .. } if identifier == "dev"),
        "got: {err:?}"
    );
    assert_eq!(envs.ids(), vec!["live", "dev", "test"]);
}

// ── Organizations and memberships ───────────────────────────────────

#[tokio::test]
async fn test_user_organizations_are_listed_from_memberships() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/users/u1/memberships/organizations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "org1", "role": "admin", "organization": { "profile": { "name": "Agency" } } },
            { "id": "org2", "role": "team_member", "organization": { "profile": { "name": "Client" } } }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let mut orgs = Collection::<Organization>::new(Scope::user("u1"));
    orgs.fetch(&client).await.unwrap();

    assert_eq!(orgs.ids(), vec!["org1", "org2"]);
    assert_eq!(orgs.get("org2").unwrap().name(), Some("Client"));
    assert_eq!(
        orgs.get("org1").unwrap().workflows().scope(),
        &Scope::organization("org1")
    );
}

#[tokio::test]
async fn test_organization_sites_come_from_site_memberships() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/organizations/org1/memberships/sites"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "m1", "role": "team_member", "site": { "id": "s1", "name": "alpha" } },
            { "id": "m2", "site": { "id": "s2", "name": "beta", "frozen": true } }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let org = Model::<Organization>::from_record(
        record(json!({ "id": "org1" })),
        Scope::user("u1"),
    )
    .unwrap();
    let sites = org.sites(&client).await.unwrap();

    assert_eq!(sites.keys().map(String::as_str).collect::<Vec<_>>(), vec!["s1", "s2"]);
    assert_eq!(sites["s1"].name(), "alpha");
    assert!(sites["s2"].is_frozen());
    assert_eq!(sites["s2"].scope(), &Scope::Root);
}

#[tokio::test]
async fn test_organization_users_come_from_user_memberships() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/organizations/org1/memberships/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": "m1",
                "role": "admin",
                "user": {
                    "id": "u7",
                    "email": "dana@example.com",
                    "profile": { "firstname": "Dana", "lastname": "Smith" }
                }
            }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let org = Model::<Organization>::from_record(
        record(json!({ "id": "org1" })),
        Scope::user("u1"),
    )
    .unwrap();
    let users = org.users(&client).await.unwrap();

    assert_eq!(users.len(), 1);
    assert_eq!(users["u7"].email(), Some("dana@example.com"));
    assert_eq!(users["u7"].full_name(), "Dana Smith");
}

#[tokio::test]
async fn test_invalid_site_membership_fails_the_listing() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/organizations/org1/memberships/sites"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "m1", "site": { "id": "s1", "name": "alpha" } },
            { "id": "m2" }
        ])))
        .mount(&server)
        .await;

    let mut memberships = Collection::<SiteMembership>::new(Scope::organization("org1"));
    let err = memberships.fetch(&client).await.unwrap_err();
    assert!(
        matches!(err, CoreError::InvalidRecord { entity_type: "site membership", .. }),
        "got: {err:?}"
    );
    assert!(!memberships.is_fetched());
}
