//! Persistence contracts for orders, payments and the product catalog.
//!
//! Every write replaces a whole aggregate as one unit. `update` is
//! version-checked: the caller passes the aggregate as it was loaded and the
//! store rejects the write with `ConcurrencyConflict` if someone else has
//! written in between. On success the new version is returned and should be
//! stored back on the aggregate with `set_version`.

pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use common::{OrderId, PaymentId, Version};
use thiserror::Error;

use crate::order::Order;
use crate::payment::Payment;
use crate::product::{Product, ProductId};

pub use memory::{InMemoryCatalog, InMemoryOrderStore, InMemoryPaymentStore};

/// Errors raised by store implementations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("{entity} already exists: {id}")]
    AlreadyExists { entity: &'static str, id: String },

    /// The stored version did not match the version the caller loaded.
    #[error(
        "Concurrency conflict for {entity} {id}: expected version {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        entity: &'static str,
        id: String,
        expected: Version,
        actual: Version,
    },

    /// Storage backend failure (connection, query, decoding).
    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        StoreError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn already_exists(entity: &'static str, id: impl ToString) -> Self {
        StoreError::AlreadyExists {
            entity,
            id: id.to_string(),
        }
    }
}

/// Durable storage for orders and their line items.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists a new order with its items. Returns the first version.
    async fn create(&self, order: &Order) -> Result<Version, StoreError>;

    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, StoreError>;

    /// Returns all orders, oldest first.
    async fn find_all(&self) -> Result<Vec<Order>, StoreError>;

    /// Replaces the order and its item set as one unit.
    async fn update(&self, order: &Order) -> Result<Version, StoreError>;

    /// Deletes the order together with its items.
    async fn delete(&self, id: OrderId) -> Result<(), StoreError>;
}

/// Durable storage for payments.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    async fn create(&self, payment: &Payment) -> Result<Version, StoreError>;

    async fn find_by_id(&self, id: PaymentId) -> Result<Option<Payment>, StoreError>;

    /// Returns every payment recorded for an order, oldest first.
    async fn find_by_order_id(&self, order_id: OrderId) -> Result<Vec<Payment>, StoreError>;

    async fn find_all(&self) -> Result<Vec<Payment>, StoreError>;

    async fn update(&self, payment: &Payment) -> Result<Version, StoreError>;

    async fn delete(&self, id: PaymentId) -> Result<(), StoreError>;
}

/// Product catalog.
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn find_product(&self, id: &ProductId) -> Result<Option<Product>, StoreError>;

    async fn create_product(&self, product: &Product) -> Result<(), StoreError>;

    /// Returns all products ordered by name.
    async fn list_products(&self) -> Result<Vec<Product>, StoreError>;

    async fn update_product(&self, product: &Product) -> Result<(), StoreError>;

    async fn delete_product(&self, id: &ProductId) -> Result<(), StoreError>;
}

#[async_trait]
impl<T: OrderStore + ?Sized> OrderStore for Arc<T> {
    async fn create(&self, order: &Order) -> Result<Version, StoreError> {
        (**self).create(order).await
    }

    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        (**self).find_by_id(id).await
    }

    async fn find_all(&self) -> Result<Vec<Order>, StoreError> {
        (**self).find_all().await
    }

    async fn update(&self, order: &Order) -> Result<Version, StoreError> {
        (**self).update(order).await
    }

    async fn delete(&self, id: OrderId) -> Result<(), StoreError> {
        (**self).delete(id).await
    }
}

#[async_trait]
impl<T: PaymentStore + ?Sized> PaymentStore for Arc<T> {
    async fn create(&self, payment: &Payment) -> Result<Version, StoreError> {
        (**self).create(payment).await
    }

    async fn find_by_id(&self, id: PaymentId) -> Result<Option<Payment>, StoreError> {
        (**self).find_by_id(id).await
    }

    async fn find_by_order_id(&self, order_id: OrderId) -> Result<Vec<Payment>, StoreError> {
        (**self).find_by_order_id(order_id).await
    }

    async fn find_all(&self) -> Result<Vec<Payment>, StoreError> {
        (**self).find_all().await
    }

    async fn update(&self, payment: &Payment) -> Result<Version, StoreError> {
        (**self).update(payment).await
    }

    async fn delete(&self, id: PaymentId) -> Result<(), StoreError> {
        (**self).delete(id).await
    }
}

#[async_trait]
impl<T: Catalog + ?Sized> Catalog for Arc<T> {
    async fn find_product(&self, id: &ProductId) -> Result<Option<Product>, StoreError> {
        (**self).find_product(id).await
    }

    async fn create_product(&self, product: &Product) -> Result<(), StoreError> {
        (**self).create_product(product).await
    }

    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        (**self).list_products().await
    }

    async fn update_product(&self, product: &Product) -> Result<(), StoreError> {
        (**self).update_product(product).await
    }

    async fn delete_product(&self, id: &ProductId) -> Result<(), StoreError> {
        (**self).delete_product(id).await
    }
}
