//! In-memory store implementations.
//!
//! Each store keeps whole aggregates behind a single tokio `RwLock`, so an
//! order and its items are always replaced together.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{OrderId, PaymentId, Version};
use tokio::sync::RwLock;

use crate::order::Order;
use crate::payment::Payment;
use crate::product::{Product, ProductId};

use super::{Catalog, OrderStore, PaymentStore, StoreError};

const ORDER: &str = "order";
const PAYMENT: &str = "payment";
const PRODUCT: &str = "product";

/// In-memory order store for tests and database-less deployments.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored orders.
    pub async fn len(&self) -> usize {
        self.orders.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.orders.read().await.is_empty()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn create(&self, order: &Order) -> Result<Version, StoreError> {
        let mut orders = self.orders.write().await;
        if orders.contains_key(&order.id()) {
            return Err(StoreError::already_exists(ORDER, order.id()));
        }

        let version = Version::first();
        let mut stored = order.clone();
        stored.set_version(version);
        orders.insert(order.id(), stored);
        Ok(version)
    }

    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Order>, StoreError> {
        let mut orders: Vec<Order> = self.orders.read().await.values().cloned().collect();
        orders.sort_by_key(|order| order.created_at());
        Ok(orders)
    }

    async fn update(&self, order: &Order) -> Result<Version, StoreError> {
        let mut orders = self.orders.write().await;
        let current = orders
            .get(&order.id())
            .map(Order::version)
            .ok_or_else(|| StoreError::not_found(ORDER, order.id()))?;

        if current != order.version() {
            return Err(StoreError::ConcurrencyConflict {
                entity: ORDER,
                id: order.id().to_string(),
                expected: order.version(),
                actual: current,
            });
        }

        let version = current.next();
        let mut stored = order.clone();
        stored.set_version(version);
        orders.insert(order.id(), stored);
        Ok(version)
    }

    async fn delete(&self, id: OrderId) -> Result<(), StoreError> {
        self.orders
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found(ORDER, id))
    }
}

/// In-memory payment store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentStore {
    payments: Arc<RwLock<HashMap<PaymentId, Payment>>>,
}

impl InMemoryPaymentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.payments.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.payments.read().await.is_empty()
    }
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn create(&self, payment: &Payment) -> Result<Version, StoreError> {
        let mut payments = self.payments.write().await;
        if payments.contains_key(&payment.id()) {
            return Err(StoreError::already_exists(PAYMENT, payment.id()));
        }

        let version = Version::first();
        let mut stored = payment.clone();
        stored.set_version(version);
        payments.insert(payment.id(), stored);
        Ok(version)
    }

    async fn find_by_id(&self, id: PaymentId) -> Result<Option<Payment>, StoreError> {
        Ok(self.payments.read().await.get(&id).cloned())
    }

    async fn find_by_order_id(&self, order_id: OrderId) -> Result<Vec<Payment>, StoreError> {
        let mut payments: Vec<Payment> = self
            .payments
            .read()
            .await
            .values()
            .filter(|payment| payment.order_id() == order_id)
            .cloned()
            .collect();
        payments.sort_by_key(|payment| payment.created_at());
        Ok(payments)
    }

    async fn find_all(&self) -> Result<Vec<Payment>, StoreError> {
        let mut payments: Vec<Payment> = self.payments.read().await.values().cloned().collect();
        payments.sort_by_key(|payment| payment.created_at());
        Ok(payments)
    }

    async fn update(&self, payment: &Payment) -> Result<Version, StoreError> {
        let mut payments = self.payments.write().await;
        let current = payments
            .get(&payment.id())
            .map(Payment::version)
            .ok_or_else(|| StoreError::not_found(PAYMENT, payment.id()))?;

        if current != payment.version() {
            return Err(StoreError::ConcurrencyConflict {
                entity: PAYMENT,
                id: payment.id().to_string(),
                expected: payment.version(),
                actual: current,
            });
        }

        let version = current.next();
        let mut stored = payment.clone();
        stored.set_version(version);
        payments.insert(payment.id(), stored);
        Ok(version)
    }

    async fn delete(&self, id: PaymentId) -> Result<(), StoreError> {
        self.payments
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found(PAYMENT, id))
    }
}

/// In-memory product catalog.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    products: Arc<RwLock<HashMap<ProductId, Product>>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog pre-populated with the given products.
    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let map = products
            .into_iter()
            .map(|product| (product.id.clone(), product))
            .collect();
        Self {
            products: Arc::new(RwLock::new(map)),
        }
    }

    pub async fn len(&self) -> usize {
        self.products.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.products.read().await.is_empty()
    }
}

#[async_trait]
impl Catalog for InMemoryCatalog {
    async fn find_product(&self, id: &ProductId) -> Result<Option<Product>, StoreError> {
        Ok(self.products.read().await.get(id).cloned())
    }

    async fn create_product(&self, product: &Product) -> Result<(), StoreError> {
        let mut products = self.products.write().await;
        if products.contains_key(&product.id) {
            return Err(StoreError::already_exists(PRODUCT, &product.id));
        }
        products.insert(product.id.clone(), product.clone());
        Ok(())
    }

    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        let mut products: Vec<Product> = self.products.read().await.values().cloned().collect();
        products.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(products)
    }

    async fn update_product(&self, product: &Product) -> Result<(), StoreError> {
        let mut products = self.products.write().await;
        match products.get_mut(&product.id) {
            Some(stored) => {
                *stored = product.clone();
                Ok(())
            }
            None => Err(StoreError::not_found(PRODUCT, &product.id)),
        }
    }

    async fn delete_product(&self, id: &ProductId) -> Result<(), StoreError> {
        self.products
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found(PRODUCT, id))
    }
}
