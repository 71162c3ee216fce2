//! Authentication error types.

use thiserror::Error;

use crate::auth::token::TokenError;
use crate::db::StoreError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] orchard_core::EmailError),

    /// Invalid credentials. Deliberately identical for an unknown email and
    /// a wrong password so callers cannot probe which emails exist.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Account not found.
    #[error("account not found")]
    AccountNotFound,

    /// An account with this email already exists.
    #[error("account already exists")]
    AccountAlreadyExists,

    /// Password too weak.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Display name failed validation.
    #[error("display name validation failed: {0}")]
    InvalidDisplayName(String),

    /// Store error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Token issuance failed.
    #[error("token error: {0}")]
    Token(#[from] TokenError),

    /// Password hashing failed.
    #[error("password hashing error")]
    PasswordHash,

    /// An external dependency (store, hasher) did not answer in time.
    #[error("unavailable: {0}")]
    Unavailable(String),
}
