//! Product catalog client.
//!
//! Rides on the authenticated [`ApiClient`], so mutations carry the session's
//! bearer token automatically. The backend rejects unauthenticated writes
//! with 401; this module does not pre-check.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::client::ApiClient;
use crate::error::ApiError;

pub const PRODUCTS_PATH: &str = "/products";
pub const HEALTH_PATH: &str = "/health";

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub stock_quantity: u32,
    pub category: String,
}

/// Body for `POST /products`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub stock_quantity: u32,
    pub category: String,
}

impl ProductDraft {
    /// # Errors
    ///
    /// Returns `ApiError::Invalid` for an empty name or a negative price.
    pub fn validate(&self) -> Result<(), ApiError> {
        validate_name(&self.name)?;
        validate_price(self.price)
    }
}

/// Partial body for `PUT /products/{id}`. Unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock_quantity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl ProductUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// # Errors
    ///
    /// Returns `ApiError::Invalid` for an empty patch, an empty name, or a
    /// negative price.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.is_empty() {
            return Err(ApiError::Invalid("update has no fields".into()));
        }
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(price) = self.price {
            validate_price(price)?;
        }
        Ok(())
    }
}

/// Query filters for `GET /products`. The backend applies `category` when
/// both are set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProductFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", with = "rust_decimal::serde::float_option")]
    pub max_price: Option<Decimal>,
}

/// `GET /health` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_service: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HealthStatus {
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

fn validate_name(name: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::Invalid("product name must not be empty".into()));
    }
    Ok(())
}

fn validate_price(price: Decimal) -> Result<(), ApiError> {
    if price < Decimal::ZERO {
        return Err(ApiError::Invalid(format!("price must not be negative: {price}")));
    }
    Ok(())
}

// =============================================================================
// CLIENT
// =============================================================================

#[derive(Clone, Debug)]
pub struct CatalogApi {
    client: ApiClient,
}

impl CatalogApi {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// # Errors
    ///
    /// Returns an error on transport failure or a non-success status.
    pub async fn health(&self) -> Result<HealthStatus, ApiError> {
        self.client.get_json(HEALTH_PATH).await
    }

    /// # Errors
    ///
    /// Returns an error on transport failure or a non-success status.
    pub async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>, ApiError> {
        self.client
            .get_json_with_query(PRODUCTS_PATH, filter)
            .await
    }

    /// # Errors
    ///
    /// Returns an error on transport failure or a non-success status; a
    /// missing product is `ApiError::Status` with 404.
    pub async fn get(&self, id: i64) -> Result<Product, ApiError> {
        self.client.get_json(&product_path(id)).await
    }

    /// # Errors
    ///
    /// Returns a validation error without sending, or any transport/status error.
    pub async fn create(&self, draft: &ProductDraft) -> Result<Product, ApiError> {
        draft.validate()?;
        let product: Product = self.client.post_json(PRODUCTS_PATH, draft).await?;
        tracing::info!(id = product.id, name = %product.name, "product created");
        Ok(product)
    }

    /// # Errors
    ///
    /// Returns a validation error without sending, or any transport/status error.
    pub async fn update(&self, id: i64, patch: &ProductUpdate) -> Result<Product, ApiError> {
        patch.validate()?;
        let product = self.client.put_json(&product_path(id), patch).await?;
        tracing::info!(id, "product updated");
        Ok(product)
    }

    /// # Errors
    ///
    /// Returns an error on transport failure or a non-success status.
    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        self.client.delete(&product_path(id)).await?;
        tracing::info!(id, "product deleted");
        Ok(())
    }
}

fn product_path(id: i64) -> String {
    format!("{PRODUCTS_PATH}/{id}")
}

#[cfg(test)]
#[path = "catalog_test.rs"]
mod tests;
