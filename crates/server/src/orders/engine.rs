//! Converts validated cart snapshots into persisted orders and drives their
//! payment and fulfillment state machines.
//!
//! Checkout is all-or-nothing: every line item is re-validated against the
//! catalog at call time, and an order is only written once the whole
//! snapshot passed. No partially-validated order is ever persisted.
//! Concurrent checkouts from the same account are independent and produce
//! distinct orders.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use orchard_core::{
    CartItem, FulfillmentStatus, OrderId, PaymentMethod, PaymentStatus, Role,
};

use crate::catalog::ProductCatalog;
use crate::db::{CredentialStore, OrderStore, StoreError};
use crate::models::{Identity, Order, OrderWithOwner, OwnerSummary};

/// The checkout payload: a cart snapshot plus the chosen payment method.
///
/// `payment_status` is only present when a synchronous payment flow already
/// resolved the payment; otherwise the order starts `pending`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub line_items: Vec<CartItem>,
    pub total_amount: Decimal,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub payment_status: Option<PaymentStatus>,
}

/// Errors from order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The snapshot failed re-validation; nothing was persisted.
    #[error("order validation failed: {0}")]
    Validation(String),

    /// Disallowed payment-status move.
    #[error("invalid payment transition: {from} -> {to}")]
    PaymentTransition {
        from: PaymentStatus,
        to: PaymentStatus,
    },

    /// Disallowed fulfillment-status move.
    #[error("invalid fulfillment transition: {from} -> {to}")]
    FulfillmentTransition {
        from: FulfillmentStatus,
        to: FulfillmentStatus,
    },

    /// The referenced order does not exist.
    #[error("order not found")]
    NotFound,

    /// The caller's role does not permit this read.
    #[error("not permitted")]
    Forbidden,

    /// A dependency (catalog, store) timed out or failed.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// Store error.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Server-resident order engine.
pub struct OrderEngine {
    orders: Arc<dyn OrderStore>,
    accounts: Arc<dyn CredentialStore>,
    catalog: Arc<dyn ProductCatalog>,
    call_timeout: Duration,
}

impl OrderEngine {
    /// Create a new order engine.
    #[must_use]
    pub fn new(
        orders: Arc<dyn OrderStore>,
        accounts: Arc<dyn CredentialStore>,
        catalog: Arc<dyn ProductCatalog>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            orders,
            accounts,
            catalog,
            call_timeout,
        }
    }

    /// Place an order from a cart snapshot.
    ///
    /// Every line is re-validated against the catalog at call time: the
    /// product must exist, be available, and still carry the price the cart
    /// saw. The client's total must equal the sum of the validated lines.
    /// Any failure rejects the whole order.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Validation` for an empty, inconsistent, or
    /// stale snapshot, `OrderError::Unavailable` when the catalog or store
    /// does not answer in time.
    pub async fn place_order(
        &self,
        identity: &Identity,
        request: CheckoutRequest,
    ) -> Result<Order, OrderError> {
        if request.line_items.is_empty() {
            return Err(OrderError::Validation(
                "order must contain at least one line item".to_owned(),
            ));
        }

        let mut computed_total = Decimal::ZERO;
        for item in &request.line_items {
            self.validate_line(item).await?;
            computed_total += item.line_total;
        }

        if computed_total != request.total_amount {
            return Err(OrderError::Validation(format!(
                "cart total {} does not match the sum of line items {computed_total}",
                request.total_amount
            )));
        }

        let order = Order {
            id: OrderId::generate(),
            owner_account_id: identity.account_id,
            line_items: request.line_items,
            total_amount: computed_total,
            payment_method: request.payment_method,
            payment_status: request.payment_status.unwrap_or_default(),
            fulfillment_status: FulfillmentStatus::Processing,
            refund_due: false,
            created_at: Utc::now(),
        };

        self.store_call(self.orders.insert(&order)).await?;

        tracing::info!(
            order_id = %order.id,
            owner = %order.owner_account_id,
            total = %order.total_amount,
            "order placed"
        );

        Ok(order)
    }

    /// Resolve the payment status of an order: `pending -> paid` or
    /// `pending -> failed`, exactly once.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::PaymentTransition` for any move out of a
    /// terminal payment state, including one lost to a concurrent caller.
    pub async fn transition_payment(
        &self,
        id: OrderId,
        to: PaymentStatus,
    ) -> Result<Order, OrderError> {
        let order = self.load(id).await?;
        let from = order.payment_status;

        if !from.can_transition_to(to) {
            return Err(OrderError::PaymentTransition { from, to });
        }

        let moved = self
            .store_call(self.orders.compare_and_set_payment(id, from, to))
            .await?;
        if !moved {
            // Lost the race; report the transition against the current state.
            let current = self.load(id).await?;
            return Err(OrderError::PaymentTransition {
                from: current.payment_status,
                to,
            });
        }

        tracing::info!(order_id = %id, %from, %to, "payment status updated");

        self.load(id).await
    }

    /// Advance the fulfillment status of an order.
    ///
    /// Cancelling an order whose payment already resolved to `paid` is
    /// accepted, but the order is flagged `refund_due` for the external
    /// payment system.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::FulfillmentTransition` for any move the state
    /// machine disallows, including one lost to a concurrent caller.
    pub async fn transition_fulfillment(
        &self,
        id: OrderId,
        to: FulfillmentStatus,
    ) -> Result<Order, OrderError> {
        let order = self.load(id).await?;
        let from = order.fulfillment_status;

        if !from.can_transition_to(to) {
            return Err(OrderError::FulfillmentTransition { from, to });
        }

        let refund_due = order.refund_due
            || (to == FulfillmentStatus::Cancelled && order.payment_status == PaymentStatus::Paid);
        if refund_due && !order.refund_due {
            tracing::warn!(order_id = %id, "paid order cancelled; flagged for refund");
        }

        let moved = self
            .store_call(
                self.orders
                    .compare_and_set_fulfillment(id, from, to, refund_due),
            )
            .await?;
        if !moved {
            let current = self.load(id).await?;
            return Err(OrderError::FulfillmentTransition {
                from: current.fulfillment_status,
                to,
            });
        }

        tracing::info!(order_id = %id, %from, %to, "fulfillment status updated");

        self.load(id).await
    }

    /// All orders owned by the caller, newest first.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Unavailable` when the store does not answer in
    /// time.
    pub async fn my_orders(&self, identity: &Identity) -> Result<Vec<Order>, OrderError> {
        self.store_call(self.orders.owned_by(identity.account_id))
            .await
    }

    /// Every order in the store with its owner joined in, newest first.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Forbidden` unless the caller's role is admin -
    /// never a filtered empty list, so clients can distinguish "no orders"
    /// from "not permitted".
    pub async fn all_orders(&self, identity: &Identity) -> Result<Vec<OrderWithOwner>, OrderError> {
        if identity.role != Role::Admin {
            return Err(OrderError::Forbidden);
        }

        let orders = self.store_call(self.orders.all()).await?;

        let mut owners: HashMap<_, OwnerSummary> = HashMap::new();
        let mut joined = Vec::with_capacity(orders.len());
        for order in orders {
            let owner_id = order.owner_account_id;
            if !owners.contains_key(&owner_id) {
                let account = self
                    .store_call(self.accounts.account_by_id(owner_id))
                    .await?
                    .ok_or_else(|| {
                        StoreError::DataCorruption(format!(
                            "order {} references missing account {owner_id}",
                            order.id
                        ))
                    })?;
                owners.insert(
                    owner_id,
                    OwnerSummary {
                        id: account.id,
                        email: account.email,
                        display_name: account.display_name,
                    },
                );
            }
            // Entry is guaranteed present after the insert above.
            if let Some(owner) = owners.get(&owner_id) {
                joined.push(OrderWithOwner {
                    order,
                    owner: owner.clone(),
                });
            }
        }

        Ok(joined)
    }

    /// Validate one line item against its catalog record.
    async fn validate_line(&self, item: &CartItem) -> Result<(), OrderError> {
        if item.quantity == 0 {
            return Err(OrderError::Validation(format!(
                "quantity must be at least 1 for '{}'",
                item.title
            )));
        }

        let expected_line_total = item.unit_price * Decimal::from(item.quantity);
        if item.line_total != expected_line_total {
            return Err(OrderError::Validation(format!(
                "line total {} for '{}' does not equal unit price x quantity ({expected_line_total})",
                item.line_total, item.title
            )));
        }

        let product = self.catalog_call(item.product_id).await?.ok_or_else(|| {
            OrderError::Validation(format!("unknown product '{}'", item.title))
        })?;

        if !product.available {
            return Err(OrderError::Validation(format!(
                "product '{}' is unavailable",
                item.title
            )));
        }

        if product.price != item.unit_price {
            return Err(OrderError::Validation(format!(
                "stale price for '{}': cart has {}, catalog has {}",
                item.title, item.unit_price, product.price
            )));
        }

        Ok(())
    }

    async fn catalog_call(
        &self,
        id: orchard_core::ProductId,
    ) -> Result<Option<crate::catalog::CatalogProduct>, OrderError> {
        match tokio::time::timeout(self.call_timeout, self.catalog.product(id)).await {
            Ok(Ok(product)) => Ok(product),
            Ok(Err(e)) => Err(OrderError::Unavailable(format!("product catalog: {e}"))),
            Err(_) => Err(OrderError::Unavailable(
                "product catalog timed out".to_owned(),
            )),
        }
    }

    async fn load(&self, id: OrderId) -> Result<Order, OrderError> {
        self.store_call(self.orders.by_id(id))
            .await?
            .ok_or(OrderError::NotFound)
    }

    async fn store_call<T>(
        &self,
        fut: impl Future<Output = Result<T, StoreError>> + Send,
    ) -> Result<T, OrderError> {
        match tokio::time::timeout(self.call_timeout, fut).await {
            Ok(result) => result.map_err(OrderError::from),
            Err(_) => Err(OrderError::Unavailable("order store timed out".to_owned())),
        }
    }
}
