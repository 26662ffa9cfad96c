//! Catalog administration.

use serde::Deserialize;
use tracing::info;

use crate::error::DomainError;
use crate::store::{Catalog, StoreError};
use crate::Money;

use super::{Product, ProductId};

/// Editable product fields.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Money,
    #[serde(default)]
    pub stock: i32,
}

/// Service for managing the product catalog.
pub struct CatalogService<C: Catalog> {
    catalog: C,
}

impl<C: Catalog> CatalogService<C> {
    pub fn new(catalog: C) -> Self {
        Self { catalog }
    }

    #[tracing::instrument(skip(self))]
    pub async fn create_product(&self, input: ProductInput) -> Result<Product, DomainError> {
        let product = Product::new(input.name, input.description, input.price, input.stock)?;
        self.catalog.create_product(&product).await?;

        info!(product_id = %product.id, name = %product.name, "Product created");
        Ok(product)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Product, DomainError> {
        self.catalog
            .find_product(id)
            .await?
            .ok_or_else(|| DomainError::ProductNotFound(id.clone()))
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<Product>, DomainError> {
        Ok(self.catalog.list_products().await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_product(
        &self,
        id: &ProductId,
        input: ProductInput,
    ) -> Result<Product, DomainError> {
        let mut product = self.get_product(id).await?;
        product.update_details(input.name, input.description, input.price, input.stock)?;
        self.catalog.update_product(&product).await?;

        info!(product_id = %id, "Product updated");
        Ok(product)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_product(&self, id: &ProductId) -> Result<(), DomainError> {
        self.catalog.delete_product(id).await.map_err(|e| match e {
            StoreError::NotFound { .. } => DomainError::ProductNotFound(id.clone()),
            other => DomainError::Store(other),
        })?;

        info!(product_id = %id, "Product deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::ProductError;
    use crate::store::InMemoryCatalog;

    fn input(name: &str, cents: i64) -> ProductInput {
        ProductInput {
            name: name.to_string(),
            description: "desc".to_string(),
            price: Money::from_cents(cents),
            stock: 3,
        }
    }

    #[tokio::test]
    async fn test_create_get_list() {
        let service = CatalogService::new(InMemoryCatalog::new());
        let created = service.create_product(input("Widget", 1000)).await.unwrap();
        service.create_product(input("Anvil", 5000)).await.unwrap();

        let fetched = service.get_product(&created.id).await.unwrap();
        assert_eq!(fetched, created);

        let names: Vec<_> = service
            .list_products()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Anvil", "Widget"]);
    }

    #[tokio::test]
    async fn test_create_invalid_product() {
        let service = CatalogService::new(InMemoryCatalog::new());
        let result = service.create_product(input("", 1000)).await;
        assert!(matches!(
            result,
            Err(DomainError::Product(ProductError::InvalidProductName))
        ));
    }

    #[tokio::test]
    async fn test_update_product() {
        let service = CatalogService::new(InMemoryCatalog::new());
        let created = service.create_product(input("Widget", 1000)).await.unwrap();

        let updated = service
            .update_product(&created.id, input("Widget Pro", 1500))
            .await
            .unwrap();
        assert_eq!(updated.price.cents(), 1500);

        let invalid = service
            .update_product(&created.id, input("Widget Pro", 0))
            .await;
        assert!(invalid.is_err());
        let stored = service.get_product(&created.id).await.unwrap();
        assert_eq!(stored.price.cents(), 1500);
    }

    #[tokio::test]
    async fn test_delete_product() {
        let service = CatalogService::new(InMemoryCatalog::new());
        let created = service.create_product(input("Widget", 1000)).await.unwrap();

        service.delete_product(&created.id).await.unwrap();
        assert!(matches!(
            service.get_product(&created.id).await,
            Err(DomainError::ProductNotFound(_))
        ));
        assert!(matches!(
            service.delete_product(&created.id).await,
            Err(DomainError::ProductNotFound(_))
        ));
    }
}
