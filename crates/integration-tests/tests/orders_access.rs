//! Ownership scoping, role gates, and concurrent checkout behavior.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use orchard_integration_tests::{checkout_body, spawn_app};

#[tokio::test]
async fn my_orders_never_leak_across_owners() {
    let app = spawn_app();
    app.register("alice@example.com", "Alice", "pw1-secret")
        .await;
    app.register("bob@example.com", "Bob", "pw2-secret").await;
    let alice = app.login("alice@example.com", "pw1-secret").await;
    let bob = app.login("bob@example.com", "pw2-secret").await;

    let product = app.seed_product("Walnut Board", "24.99").await;
    let (status, _) = app
        .request(
            "POST",
            "/api/orders",
            Some(&alice),
            Some(checkout_body(product, "Walnut Board", "24.99", 1, "24.99")),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, alices) = app
        .request("GET", "/api/orders/mine", Some(&alice), None)
        .await;
    let (_, bobs) = app
        .request("GET", "/api/orders/mine", Some(&bob), None)
        .await;

    assert_eq!(alices.as_array().unwrap().len(), 1);
    assert!(bobs.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn all_orders_is_forbidden_for_non_admins() {
    let app = spawn_app();
    app.register("alice@example.com", "Alice", "pw1-secret")
        .await;
    let token = app.login("alice@example.com", "pw1-secret").await;

    let (status, body) = app.request("GET", "/api/orders", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");
}

#[tokio::test]
async fn all_orders_joins_the_owner_identity() {
    let app = spawn_app();
    app.register("alice@example.com", "Alice", "pw1-secret")
        .await;
    let token = app.login("alice@example.com", "pw1-secret").await;
    let admin = app.admin_token().await;

    let product = app.seed_product("Walnut Board", "24.99").await;
    app.request(
        "POST",
        "/api/orders",
        Some(&token),
        Some(checkout_body(product, "Walnut Board", "24.99", 1, "24.99")),
    )
    .await;

    let (status, all) = app.request("GET", "/api/orders", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    let orders = all.as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["owner"]["email"], "alice@example.com");
    assert_eq!(orders[0]["owner"]["displayName"], "Alice");
    assert_eq!(orders[0]["totalAmount"], "24.99");
}

#[tokio::test]
async fn revoked_admin_privilege_is_effective_immediately() {
    let app = spawn_app();
    let account = app
        .register("carol@example.com", "Carol", "pw3-secret")
        .await;
    app.promote_to_admin(&account).await;
    let token = app.login("carol@example.com", "pw3-secret").await;

    // The token's role claim says admin, and the gate accepts it while the
    // store agrees.
    let (status, _) = app.request("GET", "/api/orders", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    // Demote carol. The same token is now refused: the admin gate re-reads
    // the stored role instead of trusting the claim.
    let id = account["id"].as_str().unwrap().parse().unwrap();
    use orchard_server::db::CredentialStore;
    app.accounts
        .set_role(id, orchard_core::Role::User)
        .await
        .unwrap();

    let (status, body) = app.request("GET", "/api/orders", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");
}

#[tokio::test]
async fn concurrent_checkouts_create_two_distinct_orders() {
    let app = spawn_app();
    app.register("alice@example.com", "Alice", "pw1-secret")
        .await;
    let token = app.login("alice@example.com", "pw1-secret").await;
    let product = app.seed_product("Walnut Board", "24.99").await;

    let body = checkout_body(product, "Walnut Board", "24.99", 2, "49.98");
    let (first, second) = tokio::join!(
        app.request("POST", "/api/orders", Some(&token), Some(body.clone())),
        app.request("POST", "/api/orders", Some(&token), Some(body)),
    );

    assert_eq!(first.0, StatusCode::CREATED);
    assert_eq!(second.0, StatusCode::CREATED);
    assert_ne!(first.1["id"], second.1["id"]);
    assert_eq!(first.1["totalAmount"], "49.98");
    assert_eq!(second.1["totalAmount"], "49.98");

    let (_, mine) = app
        .request("GET", "/api/orders/mine", Some(&token), None)
        .await;
    assert_eq!(mine.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn payment_resolves_exactly_once_over_http() {
    let app = spawn_app();
    app.register("alice@example.com", "Alice", "pw1-secret")
        .await;
    let token = app.login("alice@example.com", "pw1-secret").await;
    let admin = app.admin_token().await;

    let product = app.seed_product("Walnut Board", "24.99").await;
    let (_, order) = app
        .request(
            "POST",
            "/api/orders",
            Some(&token),
            Some(checkout_body(product, "Walnut Board", "24.99", 1, "24.99")),
        )
        .await;
    let order_id = order["id"].as_str().unwrap().to_owned();

    let (status, _) = app
        .request(
            "PATCH",
            &format!("/api/orders/{order_id}/payment"),
            Some(&admin),
            Some(serde_json::json!({ "status": "paid" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .request(
            "PATCH",
            &format!("/api/orders/{order_id}/payment"),
            Some(&admin),
            Some(serde_json::json!({ "status": "failed" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "invalid_transition");
}

#[tokio::test]
async fn payment_transitions_require_the_admin_gate() {
    let app = spawn_app();
    app.register("alice@example.com", "Alice", "pw1-secret")
        .await;
    let token = app.login("alice@example.com", "pw1-secret").await;

    let product = app.seed_product("Walnut Board", "24.99").await;
    let (_, order) = app
        .request(
            "POST",
            "/api/orders",
            Some(&token),
            Some(checkout_body(product, "Walnut Board", "24.99", 1, "24.99")),
        )
        .await;
    let order_id = order["id"].as_str().unwrap().to_owned();

    // The owner is authenticated but not privileged.
    let (status, body) = app
        .request(
            "PATCH",
            &format!("/api/orders/{order_id}/payment"),
            Some(&token),
            Some(serde_json::json!({ "status": "paid" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");
}

#[tokio::test]
async fn transitions_on_a_missing_order_are_not_found() {
    let app = spawn_app();
    let admin = app.admin_token().await;

    let ghost = orchard_core::OrderId::generate();
    let (status, body) = app
        .request(
            "PATCH",
            &format!("/api/orders/{ghost}/payment"),
            Some(&admin),
            Some(serde_json::json!({ "status": "paid" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}
