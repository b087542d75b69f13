#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, Response},
    Router,
};
use serde_json::{json, Value};
use taskflow::auth::Session;
use taskflow::config::AppConfig;
use taskflow::web::{self, AppState};
use wiremock::matchers::{header as header_eq, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const USER_ID: &str = "user-1";
pub const USER_TOKEN: &str = "user-access-token";
pub const COOKIE_NAME: &str = "sb-auth-token";

pub fn config(server: &MockServer) -> AppConfig {
    let mut config = AppConfig::new(&server.uri(), "anon-key").unwrap();
    config.client = config.client.with_cookie_secure(false);
    config
}

pub fn app(server: &MockServer) -> Router {
    web::router(AppState::new(config(server)))
}

pub fn session() -> Session {
    Session::new(USER_TOKEN.to_string(), "refresh-1".to_string(), 3600)
}

pub fn session_cookie(session: &Session) -> String {
    format!("{}={}", COOKIE_NAME, session.to_cookie_value().unwrap())
}

pub fn user_json(id: &str, email: &str, metadata: Value) -> Value {
    json!({
        "id": id,
        "email": email,
        "app_metadata": {},
        "user_metadata": metadata,
        "created_at": "2024-01-01T00:00:00Z"
    })
}

/// Answer `GET /auth/v1/user` for the standard access token
pub async fn mount_user(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .and(header_eq("Authorization", format!("Bearer {}", USER_TOKEN).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json(
            USER_ID,
            "a@x.com",
            json!({"first_name": "Jane", "last_name": "Doe"}),
        )))
        .mount(server)
        .await;
}

pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn post_form(uri: &str, form: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(form.to_string())).unwrap()
}

pub fn location(response: &Response<Body>) -> Option<&str> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
}

pub fn set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::to_string)
        .collect()
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn project_json(id: &str, name: &str) -> Value {
    json!({
        "id": id,
        "user_id": USER_ID,
        "name": name,
        "description": null,
        "color": null,
        "is_archived": false,
        "created_at": "2024-01-01T00:00:00Z",
        "updated_at": "2024-01-02T00:00:00Z"
    })
}

pub fn item_json(id: &str, project_id: &str, item_type: &str, status: Option<&str>) -> Value {
    json!({
        "id": id,
        "user_id": USER_ID,
        "project_id": project_id,
        "title": format!("Item {}", id),
        "content": "",
        "type": item_type,
        "status": status,
        "created_at": "2024-01-01T00:00:00Z",
        "updated_at": "2024-01-02T00:00:00Z"
    })
}
