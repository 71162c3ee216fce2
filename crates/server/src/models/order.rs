//! Order domain types.
//!
//! The serialized shape of [`Order`] is the durable contract that admin
//! dashboards and reporting depend on - field names are stable.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use orchard_core::{
    AccountId, CartItem, Email, FulfillmentStatus, OrderId, PaymentMethod, PaymentStatus,
};

/// A placed order.
///
/// `line_items` and `total_amount` are frozen at checkout - later catalog
/// price changes never alter a placed order. Orders are never deleted;
/// cancellation is a fulfillment transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub owner_account_id: AccountId,
    /// Snapshot of the cart at checkout time; immutable thereafter.
    pub line_items: Vec<CartItem>,
    pub total_amount: Decimal,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub fulfillment_status: FulfillmentStatus,
    /// Set when a paid order is cancelled, for the external payment system
    /// to pick up. Refund orchestration itself happens elsewhere.
    pub refund_due: bool,
    pub created_at: DateTime<Utc>,
}

/// The owner fields joined into admin order listings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerSummary {
    pub id: AccountId,
    pub email: Email,
    pub display_name: String,
}

/// An order with its owner identity joined in, as returned to admins.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderWithOwner {
    #[serde(flatten)]
    pub order: Order,
    pub owner: OwnerSummary,
}
