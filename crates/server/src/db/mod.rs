//! Persistence for Orchard Market.
//!
//! # Tables
//!
//! - `accounts` - identity, password hash, role
//! - `orders` - immutable line-item snapshots plus the two status columns
//!
//! Both stores are expressed as traits so the server can run against
//! `PostgreSQL` in production and the in-memory twins in tests. Every
//! implementation must provide per-record atomicity: a status transition or
//! a password hash is never visible half-written.
//!
//! # Migrations
//!
//! Migrations live in `crates/server/migrations/` and run at startup via
//! [`MIGRATOR`].

pub mod accounts;
pub mod memory;
pub mod orders;

pub use accounts::CredentialStore;
pub use memory::{MemoryCredentialStore, MemoryOrderStore};
pub use orders::OrderStore;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

/// Embedded migrations, run against the pool at startup.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Errors surfaced by store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A unique constraint was violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The referenced record does not exist.
    #[error("record not found")]
    NotFound,

    /// A stored value could not be interpreted.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
