//! Order store: immutable order records and their status columns.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use orchard_core::{
    AccountId, CartItem, FulfillmentStatus, OrderId, PaymentMethod, PaymentStatus,
};

use super::StoreError;
use crate::models::Order;

/// Persistence contract for order records.
///
/// Line items and totals are written once at insert and never updated;
/// only the status columns and the refund flag change afterwards, and only
/// through the compare-and-set methods so a lost race is detected rather
/// than overwritten.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persist a new order.
    async fn insert(&self, order: &Order) -> Result<(), StoreError>;

    /// Look up an order by ID.
    async fn by_id(&self, id: OrderId) -> Result<Option<Order>, StoreError>;

    /// All orders owned by `owner`, newest first.
    async fn owned_by(&self, owner: AccountId) -> Result<Vec<Order>, StoreError>;

    /// Every order in the store, newest first.
    async fn all(&self) -> Result<Vec<Order>, StoreError>;

    /// Move `payment_status` from `from` to `to` if it still equals `from`.
    ///
    /// Returns `false` when the precondition no longer holds (the record
    /// moved concurrently); the caller decides how to report that.
    async fn compare_and_set_payment(
        &self,
        id: OrderId,
        from: PaymentStatus,
        to: PaymentStatus,
    ) -> Result<bool, StoreError>;

    /// Move `fulfillment_status` from `from` to `to` if it still equals
    /// `from`, recording `refund_due` in the same write.
    async fn compare_and_set_fulfillment(
        &self,
        id: OrderId,
        from: FulfillmentStatus,
        to: FulfillmentStatus,
        refund_due: bool,
    ) -> Result<bool, StoreError>;
}

/// `PostgreSQL`-backed order store.
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    /// Create a new order store over the given pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Raw `orders` row, translated into [`Order`] after validation.
#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    owner_account_id: Uuid,
    line_items: serde_json::Value,
    total_amount: Decimal,
    payment_method: String,
    payment_status: String,
    fulfillment_status: String,
    refund_due: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = StoreError;

    fn try_from(row: OrderRow) -> Result<Self, StoreError> {
        let line_items: Vec<CartItem> = serde_json::from_value(row.line_items).map_err(|e| {
            StoreError::DataCorruption(format!("invalid line items in database: {e}"))
        })?;
        let payment_method: PaymentMethod = row.payment_method.parse().map_err(|e| {
            StoreError::DataCorruption(format!("invalid payment method in database: {e}"))
        })?;
        let payment_status: PaymentStatus = row.payment_status.parse().map_err(|e| {
            StoreError::DataCorruption(format!("invalid payment status in database: {e}"))
        })?;
        let fulfillment_status: FulfillmentStatus =
            row.fulfillment_status.parse().map_err(|e| {
                StoreError::DataCorruption(format!("invalid fulfillment status in database: {e}"))
            })?;

        Ok(Self {
            id: OrderId::new(row.id),
            owner_account_id: AccountId::new(row.owner_account_id),
            line_items,
            total_amount: row.total_amount,
            payment_method,
            payment_status,
            fulfillment_status,
            refund_due: row.refund_due,
            created_at: row.created_at,
        })
    }
}

const ORDER_COLUMNS: &str = "id, owner_account_id, line_items, total_amount, payment_method, \
                             payment_status, fulfillment_status, refund_due, created_at";

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn insert(&self, order: &Order) -> Result<(), StoreError> {
        let line_items = serde_json::to_value(&order.line_items).map_err(|e| {
            StoreError::DataCorruption(format!("failed to serialize line items: {e}"))
        })?;

        sqlx::query(
            "INSERT INTO orders \
             (id, owner_account_id, line_items, total_amount, payment_method, \
              payment_status, fulfillment_status, refund_due, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(order.id)
        .bind(order.owner_account_id)
        .bind(line_items)
        .bind(order.total_amount)
        .bind(order.payment_method.as_str())
        .bind(order.payment_status.as_str())
        .bind(order.fulfillment_status.as_str())
        .bind(order.refund_due)
        .bind(order.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn by_id(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Order::try_from).transpose()
    }

    async fn owned_by(&self, owner: AccountId) -> Result<Vec<Order>, StoreError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders \
             WHERE owner_account_id = $1 ORDER BY created_at DESC"
        ))
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Order::try_from).collect()
    }

    async fn all(&self) -> Result<Vec<Order>, StoreError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Order::try_from).collect()
    }

    async fn compare_and_set_payment(
        &self,
        id: OrderId,
        from: PaymentStatus,
        to: PaymentStatus,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE orders SET payment_status = $1 \
             WHERE id = $2 AND payment_status = $3",
        )
        .bind(to.as_str())
        .bind(id)
        .bind(from.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn compare_and_set_fulfillment(
        &self,
        id: OrderId,
        from: FulfillmentStatus,
        to: FulfillmentStatus,
        refund_due: bool,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE orders SET fulfillment_status = $1, refund_due = $2 \
             WHERE id = $3 AND fulfillment_status = $4",
        )
        .bind(to.as_str())
        .bind(refund_due)
        .bind(id)
        .bind(from.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
