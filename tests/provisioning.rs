mod common;

use axum::http::StatusCode;
use common::*;
use serde_json::{json, Value};
use taskflow::api::Db;
use taskflow::auth::{Auth, User};
use taskflow::profile::{ProfileProvisioner, Provisioning};
use taskflow::Backend;
use tower::ServiceExt;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn profile_json(id: &str, username: &str, full_name: &str) -> Value {
    json!({
        "id": id,
        "username": username,
        "full_name": full_name,
        "avatar_url": null,
        "created_at": "2024-01-01T00:00:00Z",
        "updated_at": "2024-01-01T00:00:00Z"
    })
}

fn signed_in(server: &MockServer) -> (Auth, Db) {
    let backend = Backend::new(&server.uri(), "anon-key");
    let auth = backend.auth_with_session(Some(session()));
    let db = Db::new(&backend, Some(USER_TOKEN.to_string()), None);
    (auth, db)
}

/// Profiles are missing for the first `misses` reads and present afterwards
async fn mount_profile_reads(server: &MockServer, misses: u64, row: Value) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/profiles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .up_to_n_times(misses)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/profiles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row])))
        .mount(server)
        .await;
}

#[tokio::test]
async fn first_visit_creates_profile_once() {
    let server = MockServer::start().await;
    mount_user(&server).await;
    let row = profile_json(USER_ID, "a", "Jane Doe");
    mount_profile_reads(&server, 2, row.clone()).await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/profiles"))
        .and(header("Authorization", format!("Bearer {}", USER_TOKEN).as_str()))
        .and(body_json(json!({"id": USER_ID, "username": "a", "full_name": "Jane Doe"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([row])))
        .expect(1)
        .mount(&server)
        .await;

    let (auth, db) = signed_in(&server);
    let profiles = db.profiles();
    let provisioner = ProfileProvisioner::new(&auth, &profiles);

    let first = provisioner.get_user_profile(USER_ID).await;
    assert!(first.is_created());
    assert_eq!(first.profile().unwrap().full_name.as_deref(), Some("Jane Doe"));

    let second = provisioner.get_user_profile(USER_ID).await;
    assert!(matches!(second, Provisioning::Existing(_)));
    assert_eq!(second.profile().unwrap().username.as_deref(), Some("a"));
}

#[tokio::test]
async fn profile_without_names_uses_email_local_part() {
    let server = MockServer::start().await;
    let user: User = serde_json::from_value(user_json("user-2", "b@x.com", json!({}))).unwrap();
    mount_profile_reads(&server, 1, profile_json("user-2", "b", "b")).await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/profiles"))
        .and(body_json(json!({"id": "user-2", "username": "b", "full_name": "b"})))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!([profile_json("user-2", "b", "b")])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (auth, db) = signed_in(&server);
    let profiles = db.profiles();
    let created = ProfileProvisioner::new(&auth, &profiles)
        .create_user_profile(&user)
        .await;

    let profile = created.into_profile().unwrap();
    assert_eq!(profile.username.as_deref(), Some("b"));
    assert_eq!(profile.full_name.as_deref(), Some("b"));
}

#[tokio::test]
async fn never_creates_a_profile_for_someone_else() {
    let server = MockServer::start().await;
    mount_user(&server).await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/profiles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/profiles"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let (auth, db) = signed_in(&server);
    let profiles = db.profiles();
    let outcome = ProfileProvisioner::new(&auth, &profiles)
        .get_user_profile("someone-else")
        .await;

    assert!(matches!(outcome, Provisioning::Missing));
}

#[tokio::test]
async fn concurrent_insert_surfaces_as_failure() {
    let server = MockServer::start().await;
    mount_user(&server).await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/profiles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/profiles"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "23505",
            "message": "duplicate key value violates unique constraint \"profiles_pkey\""
        })))
        .mount(&server)
        .await;

    let (auth, db) = signed_in(&server);
    let profiles = db.profiles();
    let outcome = ProfileProvisioner::new(&auth, &profiles)
        .get_user_profile(USER_ID)
        .await;

    match outcome {
        Provisioning::Failed(e) => assert!(e.is_unique_violation()),
        other => panic!("Expected a failed insert, got {:?}", other),
    }
}

#[tokio::test]
async fn signup_provisions_profile_and_asks_for_confirmation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/signup"))
        .and(body_json(json!({
            "email": "a@x.com",
            "password": "secret",
            "data": {"first_name": "Jane", "last_name": "Doe"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json(
            USER_ID,
            "a@x.com",
            json!({"first_name": "Jane", "last_name": "Doe"}),
        )))
        .expect(1)
        .mount(&server)
        .await;
    mount_profile_reads(&server, 1, profile_json(USER_ID, "a", "Jane Doe")).await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/profiles"))
        .and(body_json(json!({"id": USER_ID, "username": "a", "full_name": "Jane Doe"})))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!([profile_json(USER_ID, "a", "Jane Doe")])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let response = app(&server)
        .oneshot(post_form(
            "/signup",
            "email=a%40x.com&password=secret&first_name=Jane&last_name=Doe",
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&response),
        Some("/login?message=Check+email+to+continue+sign+in+process")
    );
}

#[tokio::test]
async fn rejected_signup_redirects_with_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/signup"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "code": 422,
            "msg": "User already registered"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/profiles"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let response = app(&server)
        .oneshot(post_form("/signup", "email=a%40x.com&password=secret", None))
        .await
        .unwrap();

    assert_eq!(
        location(&response),
        Some("/signup?message=Could+not+create+account")
    );
}

async fn mount_count(server: &MockServer, item_type: &str, status: Option<&str>, total: i64) {
    let mut mock = Mock::given(method("GET"))
        .and(path("/rest/v1/items"))
        .and(query_param("select", "id"))
        .and(query_param("type", format!("eq.{}", item_type).as_str()));
    if let Some(status) = status {
        mock = mock.and(query_param("status", format!("eq.{}", status).as_str()));
    }
    mock.respond_with(
        ResponseTemplate::new(200)
            .insert_header("Content-Range", format!("*/{}", total).as_str())
            .set_body_json(json!([])),
    )
    .mount(server)
    .await;
}

#[tokio::test]
async fn dashboard_shows_profile_and_summary() {
    let server = MockServer::start().await;
    mount_user(&server).await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/profiles"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([profile_json(USER_ID, "a", "Jane Doe")])),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/projects"))
        .and(query_param("is_archived", "eq.false"))
        .and(query_param("limit", "6"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([project_json("p1", "Site")])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/items"))
        .and(query_param("select", "*"))
        .and(query_param("limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            item_json("i1", "p1", "task", Some("todo"))
        ])))
        .mount(&server)
        .await;
    mount_count(&server, "task", Some("todo"), 3).await;
    mount_count(&server, "task", Some("in_progress"), 1).await;
    mount_count(&server, "task", Some("done"), 4).await;
    mount_count(&server, "document", None, 2).await;

    let cookie = session_cookie(&session());
    let response = app(&server)
        .oneshot(get("/dashboard", Some(&cookie)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["profile"]["full_name"], "Jane Doe");
    assert_eq!(body["summary"]["projects"][0]["name"], "Site");
    assert_eq!(body["summary"]["recent_items"].as_array().unwrap().len(), 1);
    assert_eq!(
        body["summary"]["tasks"],
        json!({"todo": 3, "in_progress": 1, "done": 4})
    );
    assert_eq!(body["summary"]["documents"], 2);
}
