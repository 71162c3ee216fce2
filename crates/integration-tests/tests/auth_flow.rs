//! Registration, login, and profile access.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use orchard_integration_tests::spawn_app;

#[tokio::test]
async fn register_creates_a_user_account() {
    let app = spawn_app();

    let account = app
        .register("alice@example.com", "Alice", "pw1-secret")
        .await;

    assert_eq!(account["email"], "alice@example.com");
    assert_eq!(account["displayName"], "Alice");
    assert_eq!(account["role"], "user");
    assert!(account["id"].as_str().is_some());
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() {
    let app = spawn_app();
    app.register("alice@example.com", "Alice", "pw1-secret")
        .await;

    let (status, body) = app
        .request(
            "POST",
            "/api/auth/register",
            None,
            Some(serde_json::json!({
                "email": "alice@example.com",
                "displayName": "Also Alice",
                "password": "pw2-secret",
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
}

#[tokio::test]
async fn malformed_registration_is_a_validation_error() {
    let app = spawn_app();

    let (status, body) = app
        .request(
            "POST",
            "/api/auth/register",
            None,
            Some(serde_json::json!({
                "email": "not-an-email",
                "displayName": "X",
                "password": "pw1-secret",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_failed");

    let (status, body) = app
        .request(
            "POST",
            "/api/auth/register",
            None,
            Some(serde_json::json!({
                "email": "short@example.com",
                "displayName": "X",
                "password": "short",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_failed");
}

#[tokio::test]
async fn login_returns_a_token_and_account_summary() {
    let app = spawn_app();
    app.register("alice@example.com", "Alice", "pw1-secret")
        .await;

    let (status, body) = app
        .request(
            "POST",
            "/api/auth/login",
            None,
            Some(serde_json::json!({
                "email": "alice@example.com",
                "password": "pw1-secret",
            })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].as_str().is_some());
    assert_eq!(body["account"]["email"], "alice@example.com");
    assert_eq!(body["account"]["role"], "user");
}

#[tokio::test]
async fn wrong_password_and_unknown_email_are_indistinguishable() {
    let app = spawn_app();
    app.register("alice@example.com", "Alice", "pw1-secret")
        .await;

    let (wrong_status, wrong_body) = app
        .request(
            "POST",
            "/api/auth/login",
            None,
            Some(serde_json::json!({
                "email": "alice@example.com",
                "password": "not-the-password",
            })),
        )
        .await;
    let (unknown_status, unknown_body) = app
        .request(
            "POST",
            "/api/auth/login",
            None,
            Some(serde_json::json!({
                "email": "nobody@example.com",
                "password": "pw1-secret",
            })),
        )
        .await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body["error"], unknown_body["error"]);
    assert_eq!(wrong_body["message"], unknown_body["message"]);
}

#[tokio::test]
async fn profile_requires_a_bearer_token() {
    let app = spawn_app();

    let (status, body) = app.request("GET", "/api/account", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
    assert_eq!(body["message"], "unauthorized: authorization header missing");

    let (status, body) = app
        .request("GET", "/api/account", Some("garbage.token.here"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "unauthorized: invalid token");
}

#[tokio::test]
async fn tampered_token_is_rejected() {
    let app = spawn_app();
    app.register("alice@example.com", "Alice", "pw1-secret")
        .await;
    let token = app.login("alice@example.com", "pw1-secret").await;

    // Flip one character in the signature segment.
    let sig_start = token.rfind('.').unwrap() + 1;
    let (head, sig) = token.split_at(sig_start);
    let mut chars: Vec<char> = sig.chars().collect();
    chars[0] = if chars[0] == 'A' { 'B' } else { 'A' };
    let tampered = format!("{head}{}", chars.into_iter().collect::<String>());

    let (status, body) = app
        .request("GET", "/api/account", Some(&tampered), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn profile_read_and_display_name_update() {
    let app = spawn_app();
    app.register("alice@example.com", "Alice", "pw1-secret")
        .await;
    let token = app.login("alice@example.com", "pw1-secret").await;

    let (status, body) = app.request("GET", "/api/account", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["displayName"], "Alice");

    // The update path only touches the display name; a role field in the
    // payload is ignored, never applied.
    let (status, body) = app
        .request(
            "PUT",
            "/api/account",
            Some(&token),
            Some(serde_json::json!({
                "displayName": "Alice Cooper",
                "role": "admin",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["displayName"], "Alice Cooper");
    assert_eq!(body["role"], "user");
}

#[tokio::test]
async fn health_endpoints_respond() {
    let app = spawn_app();

    let (status, _) = app.request("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.request("GET", "/health/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
}
