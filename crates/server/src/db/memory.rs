//! In-memory store implementations for testing.
//!
//! These provide the same interface and atomicity guarantees as the
//! `PostgreSQL` implementations: every mutation happens under a single
//! write lock, so no reader ever observes a half-applied transition.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use orchard_core::{AccountId, Email, FulfillmentStatus, OrderId, PaymentStatus, Role};

use super::{CredentialStore, OrderStore, StoreError};
use crate::models::{Account, Order};

/// In-memory credential store.
#[derive(Clone, Default)]
pub struct MemoryCredentialStore {
    accounts: Arc<RwLock<Vec<(Account, String)>>>,
}

impl MemoryCredentialStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn create_account(
        &self,
        email: &Email,
        display_name: &str,
        password_hash: &str,
    ) -> Result<Account, StoreError> {
        let mut accounts = self.accounts.write().await;

        if accounts.iter().any(|(a, _)| a.email == *email) {
            return Err(StoreError::Conflict("email already exists".to_owned()));
        }

        let account = Account {
            id: AccountId::generate(),
            email: email.clone(),
            display_name: display_name.to_owned(),
            role: Role::User,
            created_at: Utc::now(),
        };
        accounts.push((account.clone(), password_hash.to_owned()));

        Ok(account)
    }

    async fn account_by_id(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
        let accounts = self.accounts.read().await;
        Ok(accounts.iter().find(|(a, _)| a.id == id).map(|(a, _)| a.clone()))
    }

    async fn account_by_email(&self, email: &Email) -> Result<Option<Account>, StoreError> {
        let accounts = self.accounts.read().await;
        Ok(accounts
            .iter()
            .find(|(a, _)| a.email == *email)
            .map(|(a, _)| a.clone()))
    }

    async fn account_with_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(Account, String)>, StoreError> {
        let accounts = self.accounts.read().await;
        Ok(accounts
            .iter()
            .find(|(a, _)| a.email == *email)
            .map(|(a, h)| (a.clone(), h.clone())))
    }

    async fn update_display_name(
        &self,
        id: AccountId,
        display_name: &str,
    ) -> Result<Account, StoreError> {
        let mut accounts = self.accounts.write().await;
        let Some((account, _)) = accounts.iter_mut().find(|(a, _)| a.id == id) else {
            return Err(StoreError::NotFound);
        };
        account.display_name = display_name.to_owned();
        Ok(account.clone())
    }

    async fn set_role(&self, id: AccountId, role: Role) -> Result<(), StoreError> {
        let mut accounts = self.accounts.write().await;
        let Some((account, _)) = accounts.iter_mut().find(|(a, _)| a.id == id) else {
            return Err(StoreError::NotFound);
        };
        account.role = role;
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// In-memory order store.
#[derive(Clone, Default)]
pub struct MemoryOrderStore {
    orders: Arc<RwLock<Vec<Order>>>,
}

impl MemoryOrderStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of orders stored.
    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn insert(&self, order: &Order) -> Result<(), StoreError> {
        let mut orders = self.orders.write().await;
        if orders.iter().any(|o| o.id == order.id) {
            return Err(StoreError::Conflict("order id already exists".to_owned()));
        }
        orders.push(order.clone());
        Ok(())
    }

    async fn by_id(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        let orders = self.orders.read().await;
        Ok(orders.iter().find(|o| o.id == id).cloned())
    }

    async fn owned_by(&self, owner: AccountId) -> Result<Vec<Order>, StoreError> {
        let orders = self.orders.read().await;
        let mut owned: Vec<Order> = orders
            .iter()
            .filter(|o| o.owner_account_id == owner)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }

    async fn all(&self) -> Result<Vec<Order>, StoreError> {
        let orders = self.orders.read().await;
        let mut all: Vec<Order> = orders.iter().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn compare_and_set_payment(
        &self,
        id: OrderId,
        from: PaymentStatus,
        to: PaymentStatus,
    ) -> Result<bool, StoreError> {
        let mut orders = self.orders.write().await;
        let Some(order) = orders.iter_mut().find(|o| o.id == id) else {
            return Ok(false);
        };
        if order.payment_status != from {
            return Ok(false);
        }
        order.payment_status = to;
        Ok(true)
    }

    async fn compare_and_set_fulfillment(
        &self,
        id: OrderId,
        from: FulfillmentStatus,
        to: FulfillmentStatus,
        refund_due: bool,
    ) -> Result<bool, StoreError> {
        let mut orders = self.orders.write().await;
        let Some(order) = orders.iter_mut().find(|o| o.id == id) else {
            return Ok(false);
        };
        if order.fulfillment_status != from {
            return Ok(false);
        }
        order.fulfillment_status = to;
        order.refund_due = refund_due;
        Ok(true)
    }
}
