//! Session relay integration tests.
//!
//! Run with: `cargo test -p kongre-api --test auth_session_test`

mod helpers;

use chrono::Utc;
use helpers::{setup_test_app, JWT_SECRET};
use jsonwebtoken::{encode, EncodingKey, Header};
use kongre_core::SessionResponse;
use serde_json::{json, Value};

fn access_token(audience: &str, expires_in_secs: i64) -> String {
    let claims = json!({
        "sub": "user-42",
        "email": "chair@example.org",
        "role": "authenticated",
        "aud": audience,
        "exp": Utc::now().timestamp() + expires_in_secs,
    });
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

fn set_cookies(response: &axum_test::TestResponse) -> Vec<String> {
    response
        .headers()
        .get_all("set-cookie")
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_set_session_stores_both_tokens() {
    let app = setup_test_app().await;
    let token = access_token("authenticated", 3600);

    let response = app
        .server
        .post("/api/auth/set")
        .json(&json!({ "access_token": token, "refresh_token": "refresh-abc" }))
        .await;

    assert_eq!(response.status_code(), 200, "{}", response.text());
    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 2);
    assert!(cookies[0].starts_with(&format!("kongre-access-token={};", token)));
    assert!(cookies[1].starts_with("kongre-refresh-token=refresh-abc;"));
    for cookie in &cookies {
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Path=/"));
        assert!(!cookie.contains("Secure"));
    }
}

#[tokio::test]
async fn test_set_session_rejects_bad_tokens() {
    let app = setup_test_app().await;

    for access in [
        "not-a-jwt".to_string(),
        access_token("someone-else", 3600),
        access_token("authenticated", -3600),
    ] {
        let response = app
            .server
            .post("/api/auth/set")
            .json(&json!({ "access_token": access, "refresh_token": "refresh-abc" }))
            .await;
        assert_eq!(response.status_code(), 401);
        assert!(set_cookies(&response).is_empty());
    }
}

#[tokio::test]
async fn test_set_session_requires_both_tokens() {
    let app = setup_test_app().await;

    let response = app
        .server
        .post("/api/auth/set")
        .json(&json!({ "access_token": access_token("authenticated", 3600), "refresh_token": "" }))
        .await;

    assert_eq!(response.status_code(), 400);
    assert_eq!(response.json::<Value>()["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_current_session_reads_cookie() {
    let app = setup_test_app().await;
    let token = access_token("authenticated", 3600);

    let response = app
        .server
        .get("/api/auth/session")
        .add_header("Cookie", format!("theme=dark; kongre-access-token={}", token))
        .await;

    assert_eq!(response.status_code(), 200);
    let user = response.json::<SessionResponse>().user.unwrap();
    assert_eq!(user.id, "user-42");
    assert_eq!(user.email.as_deref(), Some("chair@example.org"));
}

#[tokio::test]
async fn test_current_session_without_cookie_is_null() {
    let app = setup_test_app().await;

    let response = app.server.get("/api/auth/session").await;

    assert_eq!(response.status_code(), 200);
    assert_eq!(response.json::<Value>()["user"], Value::Null);
}

#[tokio::test]
async fn test_logout_expires_cookies() {
    let app = setup_test_app().await;

    let response = app.server.post("/api/auth/logout").await;

    assert_eq!(response.status_code(), 200);
    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 2);
    assert!(cookies.iter().all(|cookie| cookie.contains("Max-Age=0")));
}
