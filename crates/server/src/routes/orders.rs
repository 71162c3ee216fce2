//! Checkout and order handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;

use orchard_core::{FulfillmentStatus, OrderId, PaymentStatus};

use crate::error::Result;
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::{Order, OrderWithOwner};
use crate::orders::CheckoutRequest;
use crate::state::AppState;

/// Payment transition request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentTransitionRequest {
    pub status: PaymentStatus,
}

/// Fulfillment transition request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FulfillmentTransitionRequest {
    pub status: FulfillmentStatus,
}

/// Place an order from a cart snapshot.
///
/// On any failure the client cart is untouched (nothing here mutates it),
/// so the user can correct and retry; the cart is only cleared client-side
/// on a confirmed 201.
pub async fn checkout(
    State(state): State<AppState>,
    RequireAuth(identity): RequireAuth,
    Json(request): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<Order>)> {
    let order = state.engine().place_order(&identity, request).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// The caller's orders, newest first.
pub async fn my_orders(
    State(state): State<AppState>,
    RequireAuth(identity): RequireAuth,
) -> Result<Json<Vec<Order>>> {
    let orders = state.engine().my_orders(&identity).await?;
    Ok(Json(orders))
}

/// Every order with its owner joined in, newest first. Admin only.
pub async fn all_orders(
    State(state): State<AppState>,
    RequireAdmin(identity): RequireAdmin,
) -> Result<Json<Vec<OrderWithOwner>>> {
    let orders = state.engine().all_orders(&identity).await?;
    Ok(Json(orders))
}

/// Resolve an order's payment status. Privileged: a payment callback or an
/// admin action.
pub async fn set_payment_status(
    State(state): State<AppState>,
    RequireAdmin(_identity): RequireAdmin,
    Path(id): Path<OrderId>,
    Json(request): Json<PaymentTransitionRequest>,
) -> Result<Json<Order>> {
    let order = state.engine().transition_payment(id, request.status).await?;
    Ok(Json(order))
}

/// Advance an order's fulfillment status. Admin only.
pub async fn set_fulfillment_status(
    State(state): State<AppState>,
    RequireAdmin(_identity): RequireAdmin,
    Path(id): Path<OrderId>,
    Json(request): Json<FulfillmentTransitionRequest>,
) -> Result<Json<Order>> {
    let order = state
        .engine()
        .transition_fulfillment(id, request.status)
        .await?;
    Ok(Json(order))
}
