//! End-to-end test harness for the Orchard Market server.
//!
//! Builds the real router over in-memory stores and a static catalog, and
//! drives it with `tower::ServiceExt::oneshot` - no network, no database.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use rust_decimal::Decimal;
use secrecy::SecretString;
use tower::ServiceExt;

use orchard_core::{ProductId, Role};
use orchard_server::catalog::{CatalogProduct, ProductCatalog, StaticCatalog};
use orchard_server::config::AppConfig;
use orchard_server::db::{
    CredentialStore, MemoryCredentialStore, MemoryOrderStore, OrderStore,
};
use orchard_server::routes;
use orchard_server::state::AppState;

/// A fully wired application over in-memory dependencies.
pub struct TestApp {
    pub router: Router,
    pub accounts: Arc<MemoryCredentialStore>,
    pub orders: Arc<MemoryOrderStore>,
    pub catalog: Arc<StaticCatalog>,
}

/// Configuration used by every test app. Light hash parameters keep the
/// suite fast; the token secret only has to satisfy the service, not an
/// operator.
#[must_use]
pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: SecretString::from("postgres://unused-in-tests"),
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        token_secret: SecretString::from("kD8#mQ2$vN5@pL9!wR4&xT7*yB3^zH6%"),
        token_ttl_hours: 24,
        hash_memory_kib: 1024,
        hash_iterations: 1,
        catalog_url: "http://catalog.unused.test".parse().unwrap(),
        catalog_cache_capacity: 64,
        catalog_cache_ttl_secs: 30,
        external_call_timeout_ms: 5000,
    }
}

/// Build an app over fresh in-memory stores.
#[must_use]
pub fn spawn_app() -> TestApp {
    let accounts = Arc::new(MemoryCredentialStore::new());
    let orders = Arc::new(MemoryOrderStore::new());
    let catalog = Arc::new(StaticCatalog::new());

    let state = AppState::new(
        test_config(),
        Arc::clone(&accounts) as Arc<dyn CredentialStore>,
        Arc::clone(&orders) as Arc<dyn OrderStore>,
        Arc::clone(&catalog) as Arc<dyn ProductCatalog>,
    )
    .expect("test state should build");

    TestApp {
        router: routes::app(state),
        accounts,
        orders,
        catalog,
    }
}

impl TestApp {
    /// Send a request with an optional bearer token and JSON body; returns
    /// the status and the parsed response body (or `Null` for empty
    /// bodies).
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("request should complete");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
        };

        (status, json)
    }

    /// Register an account; panics unless the server answers 201.
    pub async fn register(&self, email: &str, display_name: &str, password: &str) -> serde_json::Value {
        let (status, body) = self
            .request(
                "POST",
                "/api/auth/register",
                None,
                Some(serde_json::json!({
                    "email": email,
                    "displayName": display_name,
                    "password": password,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
        body
    }

    /// Login and return the bearer token.
    pub async fn login(&self, email: &str, password: &str) -> String {
        let (status, body) = self
            .request(
                "POST",
                "/api/auth/login",
                None,
                Some(serde_json::json!({ "email": email, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["token"].as_str().unwrap().to_owned()
    }

    /// Promote a registered account (by the id from its register response)
    /// to admin, bypassing HTTP - role changes have no client-facing path.
    pub async fn promote_to_admin(&self, account: &serde_json::Value) {
        let id = account["id"].as_str().unwrap().parse().unwrap();
        self.accounts
            .set_role(id, Role::Admin)
            .await
            .expect("account should exist");
    }

    /// Register an admin account and return its bearer token.
    pub async fn admin_token(&self) -> String {
        let account = self
            .register("admin@example.com", "Admin", "admin-pass-1")
            .await;
        self.promote_to_admin(&account).await;
        self.login("admin@example.com", "admin-pass-1").await
    }

    /// Seed a catalog product and return its id.
    pub async fn seed_product(&self, title: &str, price: &str) -> ProductId {
        let id = ProductId::generate();
        self.catalog
            .put(CatalogProduct {
                id,
                title: title.to_owned(),
                price: price.parse::<Decimal>().unwrap(),
                available: true,
            })
            .await;
        id
    }
}

/// A single-line checkout body for `product` at `unit_price` x `quantity`.
#[must_use]
pub fn checkout_body(
    product: ProductId,
    title: &str,
    unit_price: &str,
    quantity: u32,
    line_total: &str,
) -> serde_json::Value {
    serde_json::json!({
        "lineItems": [{
            "productId": product,
            "title": title,
            "unitPrice": unit_price,
            "quantity": quantity,
            "lineTotal": line_total,
        }],
        "totalAmount": line_total,
        "paymentMethod": "stripe",
    })
}
