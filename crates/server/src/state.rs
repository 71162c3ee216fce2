//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;

use crate::auth::{AuthService, PasswordHasher, TokenService};
use crate::catalog::{HttpCatalog, ProductCatalog};
use crate::config::AppConfig;
use crate::db::{CredentialStore, OrderStore, accounts::PgCredentialStore, orders::PgOrderStore};
use crate::orders::OrderEngine;

/// Error constructing application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("invalid hash parameters: {0}")]
    HashParams(argon2::Error),
    #[error("failed to build catalog client: {0}")]
    Catalog(#[from] reqwest::Error),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. There are no ambient
/// singletons: the stores, catalog, and secrets are injected here at
/// startup and flow to every component from this one place.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    accounts: Arc<dyn CredentialStore>,
    tokens: Arc<TokenService>,
    auth: AuthService,
    engine: OrderEngine,
}

impl AppState {
    /// Create application state over explicit store and catalog
    /// implementations.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured hash parameters are out of range.
    pub fn new(
        config: AppConfig,
        accounts: Arc<dyn CredentialStore>,
        orders: Arc<dyn OrderStore>,
        catalog: Arc<dyn ProductCatalog>,
    ) -> Result<Self, StateError> {
        let tokens = Arc::new(TokenService::new(
            &config.token_secret,
            chrono::Duration::hours(config.token_ttl_hours),
        ));
        let hasher = Arc::new(
            PasswordHasher::new(config.hash_memory_kib, config.hash_iterations)
                .map_err(StateError::HashParams)?,
        );
        let call_timeout = Duration::from_millis(config.external_call_timeout_ms);

        let auth = AuthService::new(
            Arc::clone(&accounts),
            hasher,
            Arc::clone(&tokens),
            call_timeout,
        );
        let engine = OrderEngine::new(orders, Arc::clone(&accounts), catalog, call_timeout);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                accounts,
                tokens,
                auth,
                engine,
            }),
        })
    }

    /// Create application state backed by `PostgreSQL` stores and the HTTP
    /// catalog client.
    ///
    /// # Errors
    ///
    /// Returns an error if the hash parameters are out of range or the
    /// catalog client cannot be built.
    pub fn postgres(config: AppConfig, pool: PgPool) -> Result<Self, StateError> {
        let accounts: Arc<dyn CredentialStore> = Arc::new(PgCredentialStore::new(pool.clone()));
        let orders: Arc<dyn OrderStore> = Arc::new(PgOrderStore::new(pool));
        let catalog: Arc<dyn ProductCatalog> = Arc::new(HttpCatalog::new(
            config.catalog_url.clone(),
            Duration::from_millis(config.external_call_timeout_ms),
            config.catalog_cache_capacity,
            Duration::from_secs(config.catalog_cache_ttl_secs),
        )?);

        Self::new(config, accounts, orders, catalog)
    }

    /// Get a reference to the configuration.
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Get a reference to the credential store.
    #[must_use]
    pub fn accounts(&self) -> &Arc<dyn CredentialStore> {
        &self.inner.accounts
    }

    /// Get a reference to the token service.
    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.inner.tokens
    }

    /// Get a reference to the authentication service.
    #[must_use]
    pub fn auth(&self) -> &AuthService {
        &self.inner.auth
    }

    /// Get a reference to the order engine.
    #[must_use]
    pub fn engine(&self) -> &OrderEngine {
        &self.inner.engine
    }

    /// Upper bound on any single external call.
    #[must_use]
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.inner.config.external_call_timeout_ms)
    }
}
