//! Product catalog client.
//!
//! The catalog is an external collaborator: the order engine only asks it
//! to confirm price and availability for each line item at checkout time.
//! Listing and browsing live elsewhere.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use url::Url;

use orchard_core::ProductId;

/// The catalog's view of a product, as confirmed at checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogProduct {
    pub id: ProductId,
    pub title: String,
    pub price: Decimal,
    pub available: bool,
}

/// Errors from the catalog dependency.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The request could not be completed (connect, timeout, decode).
    #[error("catalog request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The catalog answered with an unexpected status.
    #[error("catalog returned status {0}")]
    UnexpectedStatus(u16),

    /// The product URL could not be built from the configured base.
    #[error("invalid catalog url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Price/availability confirmation for checkout.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Fetch the current catalog record for a product.
    ///
    /// Returns `Ok(None)` for a product the catalog does not know.
    async fn product(&self, id: ProductId) -> Result<Option<CatalogProduct>, CatalogError>;
}

/// HTTP catalog client with a short-lived read cache.
///
/// The cache TTL bounds how stale a confirmed price can be; checkout
/// re-validates against this client on every call.
pub struct HttpCatalog {
    client: reqwest::Client,
    base_url: Url,
    cache: Cache<ProductId, CatalogProduct>,
}

impl HttpCatalog {
    /// Create a catalog client.
    ///
    /// # Errors
    ///
    /// Returns `reqwest::Error` if the underlying HTTP client cannot be
    /// constructed.
    pub fn new(
        base_url: Url,
        request_timeout: Duration,
        cache_capacity: u64,
        cache_ttl: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(request_timeout).build()?;
        let cache = Cache::builder()
            .max_capacity(cache_capacity)
            .time_to_live(cache_ttl)
            .build();

        Ok(Self {
            client,
            base_url,
            cache,
        })
    }

    fn product_url(&self, id: ProductId) -> Result<Url, CatalogError> {
        Ok(self.base_url.join(&format!("products/{id}"))?)
    }
}

#[async_trait]
impl ProductCatalog for HttpCatalog {
    async fn product(&self, id: ProductId) -> Result<Option<CatalogProduct>, CatalogError> {
        if let Some(cached) = self.cache.get(&id).await {
            return Ok(Some(cached));
        }

        let url = self.product_url(id)?;
        let response = self.client.get(url).send().await?;

        match response.status() {
            StatusCode::OK => {
                let product: CatalogProduct = response.json().await?;
                self.cache.insert(id, product.clone()).await;
                Ok(Some(product))
            }
            StatusCode::NOT_FOUND => Ok(None),
            status => Err(CatalogError::UnexpectedStatus(status.as_u16())),
        }
    }
}

/// Fixed catalog for tests: products are seeded directly.
#[derive(Default)]
pub struct StaticCatalog {
    products: RwLock<HashMap<ProductId, CatalogProduct>>,
}

impl StaticCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed or replace a product.
    pub async fn put(&self, product: CatalogProduct) {
        self.products.write().await.insert(product.id, product);
    }

    /// Mark a seeded product unavailable.
    pub async fn set_available(&self, id: ProductId, available: bool) {
        if let Some(product) = self.products.write().await.get_mut(&id) {
            product.available = available;
        }
    }

    /// Change a seeded product's price (simulates a catalog update racing
    /// a checkout).
    pub async fn set_price(&self, id: ProductId, price: Decimal) {
        if let Some(product) = self.products.write().await.get_mut(&id) {
            product.price = price;
        }
    }
}

#[async_trait]
impl ProductCatalog for StaticCatalog {
    async fn product(&self, id: ProductId) -> Result<Option<CatalogProduct>, CatalogError> {
        Ok(self.products.read().await.get(&id).cloned())
    }
}
