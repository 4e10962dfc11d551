//! End-to-end tests of the `/users` API over a real socket.

use jsontable::config::InsertPersistence;
use jsontable_sdk::{NewUser, SdkError, UserFilter, UserPatch};
use reqwest::StatusCode;
use serde_json::{json, Value};

mod common;

fn new_user(name: &str, email: &str) -> NewUser {
    NewUser {
        name: name.into(),
        email: email.into(),
    }
}

#[tokio::test]
async fn test_create_then_list() {
    let server = common::start_server(28301).await;
    let users = server.users();

    let created = users.create(&new_user("Ana", "ana@x.io")).await.unwrap();
    assert!(uuid::Uuid::parse_str(&created.id).is_ok());

    let listed = users.list(&UserFilter::default()).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, created.id);
    assert_eq!(listed[0].name.as_deref(), Some("Ana"));
    assert_eq!(listed[0].email.as_deref(), Some("ana@x.io"));

    let file: Value = serde_json::from_slice(&std::fs::read(server.storage_path()).unwrap()).unwrap();
    assert_eq!(file["users"][0]["id"], json!(created.id));

    server.stop().await;
}

#[tokio::test]
async fn test_list_filters_by_substring_with_or() {
    let server = common::start_server(28302).await;
    let users = server.users();

    users.create(&new_user("Ana Silva", "ana@x.io")).await.unwrap();
    users.create(&new_user("Bruno", "bruno@y.io")).await.unwrap();
    users.create(&new_user("Carla", "carla@x.io")).await.unwrap();

    let by_name = users
        .list(&UserFilter {
            name: Some("Silva".into()),
            email: None,
        })
        .await
        .unwrap();
    assert_eq!(by_name.len(), 1);
    assert_eq!(by_name[0].name.as_deref(), Some("Ana Silva"));

    let either = users
        .list(&UserFilter {
            name: Some("Bruno".into()),
            email: Some("carla@".into()),
        })
        .await
        .unwrap();
    let names: Vec<_> = either.iter().filter_map(|u| u.name.as_deref()).collect();
    assert_eq!(names, vec!["Bruno", "Carla"]);

    let none = users
        .list(&UserFilter {
            name: None,
            email: Some("nobody".into()),
        })
        .await
        .unwrap();
    assert!(none.is_empty());

    server.stop().await;
}

#[tokio::test]
async fn test_unknown_query_keys_are_ignored() {
    let server = common::start_server(28303).await;
    let users = server.users();
    users.create(&new_user("Ana", "ana@x.io")).await.unwrap();

    let res = common::client()
        .get(server.url("/users?page=2&sort=name"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers()["content-type"].to_str().unwrap(),
        "application/json"
    );
    let body: Vec<Value> = res.json().await.unwrap();
    assert_eq!(body.len(), 1);

    server.stop().await;
}

#[tokio::test]
async fn test_update_overwrites_only_existing_fields() {
    let server = common::start_server(28304).await;
    let users = server.users();
    let ana = users.create(&new_user("Ana", "ana@x.io")).await.unwrap();
    let bruno = users.create(&new_user("Bruno", "bruno@y.io")).await.unwrap();

    let res = common::client()
        .put(server.url(&format!("/users/{}", ana.id)))
        .json(&json!({ "name": "Ana Maria", "role": "admin" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let listed = users.list(&UserFilter::default()).await.unwrap();
    let raw: Vec<Value> = common::client()
        .get(server.url("/users"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(listed[0].name.as_deref(), Some("Ana Maria"));
    assert_eq!(listed[0].email.as_deref(), Some("ana@x.io"));
    assert!(raw[0].get("role").is_none());
    assert_eq!(listed[1].id, bruno.id);
    assert_eq!(listed[1].name.as_deref(), Some("Bruno"));

    users
        .update(
            &bruno.id,
            &UserPatch {
                name: None,
                email: Some("b@y.io".into()),
            },
        )
        .await
        .unwrap();
    let listed = users.list(&UserFilter::default()).await.unwrap();
    assert_eq!(listed[1].email.as_deref(), Some("b@y.io"));

    server.stop().await;
}

#[tokio::test]
async fn test_delete_removes_only_target() {
    let server = common::start_server(28305).await;
    let users = server.users();
    let ana = users.create(&new_user("Ana", "ana@x.io")).await.unwrap();
    let bruno = users.create(&new_user("Bruno", "bruno@y.io")).await.unwrap();

    users.delete(&ana.id).await.unwrap();
    // Deleting an id that no longer exists is still 204.
    users.delete(&ana.id).await.unwrap();

    let listed = users.list(&UserFilter::default()).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, bruno.id);

    server.stop().await;
}

#[tokio::test]
async fn test_unmatched_routes_are_not_found() {
    let server = common::start_server(28306).await;
    let client = common::client();

    for (method, path) in [
        (reqwest::Method::GET, "/users/abc/extra"),
        (reqwest::Method::PATCH, "/users/abc"),
        (reqwest::Method::GET, "/"),
        (reqwest::Method::POST, "/users/abc"),
    ] {
        let res = client
            .request(method.clone(), server.url(path))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND, "{} {}", method, path);
        assert_eq!(res.headers()["content-type"], "application/json");
        assert_eq!(res.text().await.unwrap(), "NOT FOUND");
    }

    server.stop().await;
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let server = common::start_server(28307).await;
    let client = common::client();

    let res = client
        .post(server.url("/users"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert!(body["error"].is_string());

    let res = client
        .put(server.url("/users/abc"))
        .json(&json!(["not", "an", "object"]))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    server.stop().await;
}

#[tokio::test]
async fn test_filter_on_missing_field_is_server_error() {
    let server = common::start_server(28308).await;
    let client = common::client();

    // A user without a name makes a name filter undefined for that record.
    let res = client
        .post(server.url("/users"))
        .json(&json!({ "email": "anon@x.io" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let users = server.users();
    let result = users
        .list(&UserFilter {
            name: Some("a".into()),
            email: None,
        })
        .await;
    match result {
        Err(SdkError::Status { status, body }) => {
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert!(body.contains("name"));
        }
        other => panic!("expected a 500, got {:?}", other),
    }

    server.stop().await;
}

#[tokio::test]
async fn test_request_id_echoed() {
    let server = common::start_server(28309).await;

    let res = common::client()
        .get(server.url("/users"))
        .header("x-request-id", "trace-me")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["x-request-id"], "trace-me");

    server.stop().await;
}

#[tokio::test]
async fn test_existing_storage_is_loaded_and_kept() {
    let initial = r#"{"users":[{"id":"u1","name":"Seed","email":"seed@x.io","age":40}]}"#;
    let server = common::start_server_with(28310, InsertPersistence::Awaited, Some(initial)).await;
    let users = server.users();

    let listed = users.list(&UserFilter::default()).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, "u1");

    let (_store, dir) = server.stop().await;
    let file: Value =
        serde_json::from_slice(&std::fs::read(dir.path().join("storage.json")).unwrap()).unwrap();
    assert_eq!(file["users"][0]["age"], json!(40));
}

#[tokio::test]
async fn test_malformed_storage_starts_empty() {
    let server =
        common::start_server_with(28311, InsertPersistence::Awaited, Some("{broken")).await;
    let users = server.users();

    assert!(users.list(&UserFilter::default()).await.unwrap().is_empty());

    let file: Value = serde_json::from_slice(&std::fs::read(server.storage_path()).unwrap()).unwrap();
    assert!(file.is_object());

    server.stop().await;
}
