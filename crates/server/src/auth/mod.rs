//! Authentication service.
//!
//! Registration, login, and profile maintenance over the credential store,
//! with argon2 password hashing and bearer-token issuance.

mod error;
pub mod password;
pub mod token;

pub use error::AuthError;
pub use password::PasswordHasher;
pub use token::{Claims, TokenService};

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use orchard_core::{AccountId, Email};

use crate::db::{CredentialStore, StoreError};
use crate::models::Account;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Authentication service.
///
/// Hashing runs on the blocking pool, and every store and hasher call is
/// bounded by the configured timeout so a stuck dependency surfaces as
/// [`AuthError::Unavailable`] instead of hanging the request.
pub struct AuthService {
    accounts: Arc<dyn CredentialStore>,
    hasher: Arc<PasswordHasher>,
    tokens: Arc<TokenService>,
    call_timeout: Duration,
}

impl AuthService {
    /// Create a new authentication service.
    #[must_use]
    pub fn new(
        accounts: Arc<dyn CredentialStore>,
        hasher: Arc<PasswordHasher>,
        tokens: Arc<TokenService>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            accounts,
            hasher,
            tokens,
            call_timeout,
        }
    }

    /// Register a new account with email, display name, and password.
    ///
    /// The role is always `user`; there is no client-settable role.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password is too short.
    /// Returns `AuthError::AccountAlreadyExists` if the email is taken.
    pub async fn register(
        &self,
        email: &str,
        display_name: &str,
        password: &str,
    ) -> Result<Account, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;
        let display_name = validate_display_name(display_name)?;

        let password_hash = self.hash_password(password).await?;

        let account = self
            .store_call(
                self.accounts
                    .create_account(&email, &display_name, &password_hash),
            )
            .await
            .map_err(|e| match e {
                AuthError::Store(StoreError::Conflict(_)) => AuthError::AccountAlreadyExists,
                other => other,
            })?;

        tracing::info!(account_id = %account.id, "account registered");

        Ok(account)
    }

    /// Login with email and password, returning a bearer token and the
    /// account summary.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for an unknown email and for
    /// a wrong password alike.
    pub async fn login(&self, email: &str, password: &str) -> Result<(String, Account), AuthError> {
        // A malformed email cannot belong to a registered account; report
        // it the same way as any other failed credential.
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (account, password_hash) = self
            .store_call(self.accounts.account_with_password_hash(&email))
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !self.verify_password(password, password_hash).await? {
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.tokens.issue(&account)?;

        tracing::info!(account_id = %account.id, "login succeeded");

        Ok((token, account))
    }

    /// Fetch an account by ID.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::AccountNotFound` if the account does not exist.
    pub async fn profile(&self, id: AccountId) -> Result<Account, AuthError> {
        self.store_call(self.accounts.account_by_id(id))
            .await?
            .ok_or(AuthError::AccountNotFound)
    }

    /// Update the display name - the only profile field an owner may
    /// change.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::AccountNotFound` if the account does not exist.
    pub async fn update_display_name(
        &self,
        id: AccountId,
        display_name: &str,
    ) -> Result<Account, AuthError> {
        let display_name = validate_display_name(display_name)?;

        self.store_call(self.accounts.update_display_name(id, &display_name))
            .await
            .map_err(|e| match e {
                AuthError::Store(StoreError::NotFound) => AuthError::AccountNotFound,
                other => other,
            })
    }

    async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let hasher = Arc::clone(&self.hasher);
        let password = password.to_owned();
        let handle = tokio::task::spawn_blocking(move || hasher.hash(&password));

        tokio::time::timeout(self.call_timeout, handle)
            .await
            .map_err(|_| AuthError::Unavailable("password hashing timed out".to_owned()))?
            .map_err(|_| AuthError::Unavailable("password hashing task failed".to_owned()))?
            .map_err(|_| AuthError::PasswordHash)
    }

    async fn verify_password(&self, password: &str, record: String) -> Result<bool, AuthError> {
        let hasher = Arc::clone(&self.hasher);
        let password = password.to_owned();
        let handle = tokio::task::spawn_blocking(move || hasher.verify(&password, &record));

        tokio::time::timeout(self.call_timeout, handle)
            .await
            .map_err(|_| AuthError::Unavailable("password verification timed out".to_owned()))?
            .map_err(|_| AuthError::Unavailable("password verification task failed".to_owned()))
    }

    async fn store_call<T>(
        &self,
        fut: impl Future<Output = Result<T, StoreError>> + Send,
    ) -> Result<T, AuthError> {
        match tokio::time::timeout(self.call_timeout, fut).await {
            Ok(result) => result.map_err(AuthError::from),
            Err(_) => Err(AuthError::Unavailable(
                "credential store timed out".to_owned(),
            )),
        }
    }
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Validate and normalize a display name.
fn validate_display_name(display_name: &str) -> Result<String, AuthError> {
    let trimmed = display_name.trim();
    if trimmed.is_empty() {
        return Err(AuthError::InvalidDisplayName(
            "display name cannot be empty".to_owned(),
        ));
    }
    Ok(trimmed.to_owned())
}
