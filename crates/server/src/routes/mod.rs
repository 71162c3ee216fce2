//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET   /health                        - Liveness check
//! GET   /health/ready                  - Readiness check (store connectivity)
//!
//! # Auth
//! POST  /api/auth/register             - Create an account
//! POST  /api/auth/login                - Exchange credentials for a bearer token
//!
//! # Account (requires auth)
//! GET   /api/account                   - Profile read
//! PUT   /api/account                   - Profile update (display name only)
//!
//! # Orders
//! POST  /api/orders                    - Checkout (requires auth)
//! GET   /api/orders/mine               - Caller's orders (requires auth)
//! GET   /api/orders                    - All orders (requires admin)
//! PATCH /api/orders/{id}/payment       - Payment transition (requires admin)
//! PATCH /api/orders/{id}/fulfillment   - Fulfillment transition (requires admin)
//! ```

pub mod account;
pub mod auth;
pub mod orders;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, patch, post},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new().route("/", get(account::profile).put(account::update_profile))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(orders::checkout).get(orders::all_orders))
        .route("/mine", get(orders::my_orders))
        .route("/{id}/payment", patch(orders::set_payment_status))
        .route("/{id}/fulfillment", patch(orders::set_fulfillment_status))
}

/// Create all API routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/api/auth", auth_routes())
        .nest("/api/account", account_routes())
        .nest("/api/orders", order_routes())
}

/// Assemble the full application router, including health endpoints.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(api_routes())
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Verifies credential-store connectivity before returning OK.
/// Returns 503 Service Unavailable if the store is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.accounts().ping().await {
        Ok(()) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}
