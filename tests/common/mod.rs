//! Common test utilities

#![allow(dead_code)]

use std::str::FromStr;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tower::util::ServiceExt;

use bank_api::{api, db, AppState};

/// Fresh in-memory database with the schema applied.
///
/// One connection that never expires: an in-memory database lives exactly
/// as long as its connection.
pub async fn setup_test_db() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("Invalid SQLite URL")
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .expect("Failed to open in-memory database");

    db::init_schema(&pool).await.expect("Failed to create schema");
    pool
}

pub fn test_state(pool: SqlitePool) -> AppState {
    AppState::new(pool, Duration::from_secs(3600))
}

pub fn test_app(state: AppState) -> Router {
    api::create_router().with_state(state)
}

/// POST a JSON body and return status plus parsed JSON (Null when the body is empty)
pub async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

/// Register and log in, returning the session token
pub async fn register_and_login(app: &Router, username: &str, password: &str) -> String {
    let credentials = serde_json::json!({ "username": username, "password": password });

    let (status, _) = post_json(app, "/users", credentials.clone()).await;
    assert_eq!(status, StatusCode::CREATED, "registration of {} failed", username);

    let (status, body) = post_json(app, "/sessions", credentials).await;
    assert_eq!(status, StatusCode::OK, "login of {} failed", username);
    body["token"].as_str().unwrap().to_string()
}

/// The caller's accounts as returned by `/me/accounts`
pub async fn list_accounts(app: &Router, token: &str) -> Vec<Value> {
    let (status, body) = post_json(app, "/me/accounts", serde_json::json!({ "token": token })).await;
    assert_eq!(status, StatusCode::OK);
    body.as_array().unwrap().clone()
}

pub fn find_by_type<'a>(accounts: &'a [Value], account_type: &str) -> &'a Value {
    accounts
        .iter()
        .find(|a| a["type"] == account_type)
        .unwrap_or_else(|| panic!("no {} account", account_type))
}
