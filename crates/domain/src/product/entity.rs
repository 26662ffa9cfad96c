//! Catalog product.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Money;

use super::{ProductError, ProductId};

/// A product in the catalog.
///
/// Orders snapshot the price at the moment an item is added, so later
/// changes to a product never alter existing line items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Money,
    pub stock: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Creates a new product with a generated id.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        price: Money,
        stock: i32,
    ) -> Result<Self, ProductError> {
        let now = Utc::now();
        let product = Self {
            id: ProductId::new(Uuid::new_v4().to_string()),
            name: name.into(),
            description: description.into(),
            price,
            stock,
            created_at: now,
            updated_at: now,
        };
        product.validate()?;
        Ok(product)
    }

    /// Synthesizes a catalog entry for a product id the catalog does not know.
    pub fn placeholder(id: ProductId, price: Money) -> Result<Self, ProductError> {
        let now = Utc::now();
        let product = Self {
            name: format!("Product {id}"),
            id,
            description: String::new(),
            price,
            stock: 0,
            created_at: now,
            updated_at: now,
        };
        product.validate()?;
        Ok(product)
    }

    /// Checks the name and price invariants.
    pub fn validate(&self) -> Result<(), ProductError> {
        if self.name.trim().is_empty() {
            return Err(ProductError::InvalidProductName);
        }
        if !self.price.is_positive() {
            return Err(ProductError::InvalidProductPrice {
                price: self.price.cents(),
            });
        }
        Ok(())
    }

    /// Replaces the editable fields, re-validating the result.
    ///
    /// On failure the product is left unchanged.
    pub fn update_details(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        price: Money,
        stock: i32,
    ) -> Result<(), ProductError> {
        let mut updated = self.clone();
        updated.name = name.into();
        updated.description = description.into();
        updated.price = price;
        updated.stock = stock;
        updated.validate()?;

        updated.updated_at = Utc::now();
        *self = updated;
        Ok(())
    }

    /// Adjusts stock by `delta`, which may be negative.
    pub fn update_stock(&mut self, delta: i32) -> Result<(), ProductError> {
        let new_stock = self
            .stock
            .checked_add(delta)
            .filter(|s| *s >= 0)
            .ok_or(ProductError::InsufficientStock {
                available: self.stock,
                requested: delta,
            })?;
        self.stock = new_stock;
        self.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_product() {
        let product = Product::new("Widget", "A widget", Money::from_cents(1000), 5).unwrap();
        assert_eq!(product.name, "Widget");
        assert_eq!(product.stock, 5);
        assert!(!product.id.as_str().is_empty());
    }

    #[test]
    fn test_new_product_requires_name() {
        let result = Product::new("  ", "", Money::from_cents(1000), 0);
        assert!(matches!(result, Err(ProductError::InvalidProductName)));
    }

    #[test]
    fn test_new_product_requires_positive_price() {
        let result = Product::new("Widget", "", Money::zero(), 0);
        assert!(matches!(
            result,
            Err(ProductError::InvalidProductPrice { price: 0 })
        ));
    }

    #[test]
    fn test_placeholder_derives_name_from_id() {
        let product = Product::placeholder(ProductId::new("SKU-9"), Money::from_cents(500)).unwrap();
        assert_eq!(product.id.as_str(), "SKU-9");
        assert_eq!(product.name, "Product SKU-9");
        assert_eq!(product.price.cents(), 500);
        assert_eq!(product.stock, 0);
    }

    #[test]
    fn test_placeholder_rejects_non_positive_price() {
        let result = Product::placeholder(ProductId::new("SKU-9"), Money::from_cents(-1));
        assert!(matches!(result, Err(ProductError::InvalidProductPrice { .. })));
    }

    #[test]
    fn test_update_stock() {
        let mut product = Product::new("Widget", "", Money::from_cents(1000), 3).unwrap();
        product.update_stock(2).unwrap();
        assert_eq!(product.stock, 5);
        product.update_stock(-5).unwrap();
        assert_eq!(product.stock, 0);
    }

    #[test]
    fn test_update_stock_below_zero_fails() {
        let mut product = Product::new("Widget", "", Money::from_cents(1000), 1).unwrap();
        let result = product.update_stock(-2);
        assert!(matches!(
            result,
            Err(ProductError::InsufficientStock {
                available: 1,
                requested: -2
            })
        ));
        assert_eq!(product.stock, 1);
    }

    #[test]
    fn test_update_details_is_atomic() {
        let mut product = Product::new("Widget", "", Money::from_cents(1000), 1).unwrap();
        let result = product.update_details("Gadget", "new", Money::zero(), 4);
        assert!(result.is_err());
        assert_eq!(product.name, "Widget");

        product
            .update_details("Gadget", "new", Money::from_cents(2000), 4)
            .unwrap();
        assert_eq!(product.name, "Gadget");
        assert_eq!(product.price.cents(), 2000);
    }
}
