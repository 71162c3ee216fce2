//! Credential store: account records and their password hashes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use orchard_core::{AccountId, Email, Role};

use super::StoreError;
use crate::models::Account;

/// Persistence contract for account records.
///
/// Implementations must keep the email column unique and must apply each
/// mutation atomically per record.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Create an account with the default `user` role.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` if the email is already registered.
    async fn create_account(
        &self,
        email: &Email,
        display_name: &str,
        password_hash: &str,
    ) -> Result<Account, StoreError>;

    /// Look up an account by ID.
    async fn account_by_id(&self, id: AccountId) -> Result<Option<Account>, StoreError>;

    /// Look up an account by email.
    async fn account_by_email(&self, email: &Email) -> Result<Option<Account>, StoreError>;

    /// Look up an account together with its password hash, for login.
    async fn account_with_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(Account, String)>, StoreError>;

    /// Update the display name - the only field an owner may change.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the account does not exist.
    async fn update_display_name(
        &self,
        id: AccountId,
        display_name: &str,
    ) -> Result<Account, StoreError>;

    /// Change an account's role. Reserved for operator tooling; not exposed
    /// over HTTP.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the account does not exist.
    async fn set_role(&self, id: AccountId, role: Role) -> Result<(), StoreError>;

    /// Cheap connectivity check for the readiness endpoint.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// `PostgreSQL`-backed credential store.
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    /// Create a new credential store over the given pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Raw `accounts` row, translated into [`Account`] after validation.
#[derive(sqlx::FromRow)]
struct AccountRow {
    id: Uuid,
    email: String,
    display_name: String,
    role: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<AccountRow> for Account {
    type Error = StoreError;

    fn try_from(row: AccountRow) -> Result<Self, StoreError> {
        let email = Email::parse(&row.email).map_err(|e| {
            StoreError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let role: Role = row.role.parse().map_err(|e| {
            StoreError::DataCorruption(format!("invalid role in database: {e}"))
        })?;

        Ok(Self {
            id: AccountId::new(row.id),
            email,
            display_name: row.display_name,
            role,
            created_at: row.created_at,
        })
    }
}

const ACCOUNT_COLUMNS: &str = "id, email, display_name, role, created_at";

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn create_account(
        &self,
        email: &Email,
        display_name: &str,
        password_hash: &str,
    ) -> Result<Account, StoreError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "INSERT INTO accounts (id, email, display_name, password_hash, role) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {ACCOUNT_COLUMNS}"
        ))
        .bind(AccountId::generate())
        .bind(email)
        .bind(display_name)
        .bind(password_hash)
        .bind(Role::User.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return StoreError::Conflict("email already exists".to_owned());
            }
            StoreError::Database(e)
        })?;

        row.try_into()
    }

    async fn account_by_id(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Account::try_from).transpose()
    }

    async fn account_by_email(&self, email: &Email) -> Result<Option<Account>, StoreError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Account::try_from).transpose()
    }

    async fn account_with_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(Account, String)>, StoreError> {
        #[derive(sqlx::FromRow)]
        struct AccountWithHashRow {
            #[sqlx(flatten)]
            account: AccountRow,
            password_hash: String,
        }

        let row = sqlx::query_as::<_, AccountWithHashRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS}, password_hash FROM accounts WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => {
                let account = Account::try_from(r.account)?;
                Ok(Some((account, r.password_hash)))
            }
            None => Ok(None),
        }
    }

    async fn update_display_name(
        &self,
        id: AccountId,
        display_name: &str,
    ) -> Result<Account, StoreError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "UPDATE accounts SET display_name = $1 WHERE id = $2 \
             RETURNING {ACCOUNT_COLUMNS}"
        ))
        .bind(display_name)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map_or(Err(StoreError::NotFound), Account::try_from)
    }

    async fn set_role(&self, id: AccountId, role: Role) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE accounts SET role = $1 WHERE id = $2")
            .bind(role.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}
