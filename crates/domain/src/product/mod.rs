//! Product catalog types.

mod entity;
mod service;

pub use entity::Product;
pub use service::{CatalogService, ProductInput};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Product identifier.
///
/// Opaque and client-supplied: orders may reference ids the catalog has
/// never seen, in which case a placeholder product is created under that id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Creates a new product ID from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the product ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ProductId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ProductId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for ProductId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Errors raised by product validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProductError {
    /// Product name is required.
    #[error("Product name is required")]
    InvalidProductName,

    /// Product price must be positive.
    #[error("Invalid product price: {price} cents (must be greater than 0)")]
    InvalidProductPrice { price: i64 },

    /// Stock would drop below zero.
    #[error("Insufficient stock: {available} available, change of {requested} requested")]
    InsufficientStock { available: i32, requested: i32 },
}
