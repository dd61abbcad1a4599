use std::sync::Arc;

use accounts::{
    app::build_app,
    auth::TokenIssuer,
    config::DbConfig,
    rdbms::{Engine, Rdbms},
    state::AppState,
    users::{UserId, UserRepository},
};
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

const MIGRATIONS: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/migrations");

struct CountingTokens;

#[async_trait]
impl TokenIssuer for CountingTokens {
    async fn generate_token(&self, user_id: UserId) -> anyhow::Result<String> {
        Ok(format!("tok-{user_id}"))
    }
}

async fn setup() -> (Router, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let cfg = DbConfig {
        engine: Engine::Sqlite,
        host: String::new(),
        port: 0,
        username: String::new(),
        password: String::new(),
        database: dir.path().join("api.db").display().to_string(),
        max_connections: 2,
    };
    let rdbms = Rdbms::connect(&cfg).await.unwrap();
    let users = UserRepository::new(rdbms, format!("file://{MIGRATIONS}"));
    users.migrate_up().await.unwrap();

    let state = AppState::from_parts(users, Arc::new(CountingTokens));
    (build_app(state), dir)
}

async fn call(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn json_req(method: &str, uri: &str, caller: Option<UserId>, body: Value) -> Request<Body> {
    let mut req = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(id) = caller {
        req = req.header("x-user-id", id.to_string());
    }
    req.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn account_lifecycle_over_http() {
    let (app, _dir) = setup().await;

    let (status, body) = call(
        &app,
        json_req("POST", "/v1/register", None, json!({"email": "A@x.com", "password": "p1-long-enough"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["token"], "tok-1");

    let (status, _) = call(
        &app,
        json_req("POST", "/v1/update/information", Some(1), json!({"first_name": "A"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, me) = call(&app, json_req("GET", "/v1/me", Some(1), Value::Null)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["id"], 1);
    assert_eq!(me["first_name"], "A");
    assert_eq!(me["last_name"], "");
    assert_eq!(me["email"], "a@x.com");
    assert!(!me["created_at"].as_str().unwrap().is_empty());

    let (status, body) = call(
        &app,
        json_req("POST", "/v1/login", None, json!({"email": "a@x.com", "password": "p1-long-enough"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token"], "tok-1");

    let (status, _) = call(&app, json_req("DELETE", "/v1/me", Some(1), Value::Null)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(&app, json_req("GET", "/v1/1", None, Value::Null)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["type"], "not_found");
}
