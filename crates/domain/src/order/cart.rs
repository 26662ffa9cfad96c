//! Cart operations: an order in `pending` being filled before checkout.

use common::{ItemId, OrderId};
use tracing::{info, warn};

use crate::error::DomainError;
use crate::product::ProductId;
use crate::store::{Catalog, OrderStore};
use crate::Money;

use super::Order;

/// Service for building up an order item by item.
///
/// Unlike the fulfillment saga, adding an unknown product here is an error:
/// placeholder products are only synthesized during checkout.
pub struct CartService<O: OrderStore, C: Catalog> {
    orders: O,
    catalog: C,
}

impl<O: OrderStore, C: Catalog> CartService<O, C> {
    pub fn new(orders: O, catalog: C) -> Self {
        Self { orders, catalog }
    }

    /// Creates and persists an empty cart.
    #[tracing::instrument(skip(self))]
    pub async fn create_cart(&self) -> Result<Order, DomainError> {
        let mut order = Order::new();
        let version = self.orders.create(&order).await?;
        order.set_version(version);
        info!(order_id = %order.id(), "Cart created");
        Ok(order)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_cart(&self, order_id: OrderId) -> Result<Order, DomainError> {
        self.load(order_id).await
    }

    /// Adds `quantity` units of a catalog product to the cart.
    #[tracing::instrument(skip(self))]
    pub async fn add_item(
        &self,
        order_id: OrderId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Order, DomainError> {
        let mut order = self.load(order_id).await?;

        let product = self
            .catalog
            .find_product(&product_id)
            .await?
            .ok_or_else(|| DomainError::ProductNotFound(product_id.clone()))?;

        order.add_item(&product_id, Some(&product), quantity)?;
        self.save(&mut order).await?;

        info!(%order_id, %product_id, quantity, "Item added to cart");
        Ok(order)
    }

    #[tracing::instrument(skip(self))]
    pub async fn remove_item(
        &self,
        order_id: OrderId,
        item_id: ItemId,
    ) -> Result<Order, DomainError> {
        let mut order = self.load(order_id).await?;
        order.remove_item(item_id)?;
        self.save(&mut order).await?;

        info!(%order_id, %item_id, "Item removed from cart");
        Ok(order)
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_item_quantity(
        &self,
        order_id: OrderId,
        item_id: ItemId,
        quantity: u32,
    ) -> Result<Order, DomainError> {
        let mut order = self.load(order_id).await?;
        order.update_item_quantity(item_id, quantity)?;
        self.save(&mut order).await?;

        info!(%order_id, %item_id, quantity, "Item quantity updated");
        Ok(order)
    }

    /// Returns the amount that checkout would charge.
    ///
    /// Fails with `EmptyOrder` if the cart has no items. Nothing is persisted.
    #[tracing::instrument(skip(self))]
    pub async fn calculate_total(&self, order_id: OrderId) -> Result<(Order, Money), DomainError> {
        let mut order = self.load(order_id).await?;
        let total = order.prepare_for_payment().inspect_err(|e| {
            warn!(%order_id, error = %e, "Cart is not ready for payment");
        })?;
        Ok((order, total))
    }

    async fn load(&self, order_id: OrderId) -> Result<Order, DomainError> {
        self.orders
            .find_by_id(order_id)
            .await?
            .ok_or(DomainError::OrderNotFound(order_id))
    }

    async fn save(&self, order: &mut Order) -> Result<(), DomainError> {
        let version = self.orders.update(order).await?;
        order.set_version(version);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::OrderError;
    use crate::product::Product;
    use crate::store::{InMemoryCatalog, InMemoryOrderStore};

    async fn setup() -> (CartService<InMemoryOrderStore, InMemoryCatalog>, Product) {
        let widget = Product::new("Widget", "", Money::from_cents(1250), 10).unwrap();
        let catalog = InMemoryCatalog::with_products([widget.clone()]);
        (CartService::new(InMemoryOrderStore::new(), catalog), widget)
    }

    #[tokio::test]
    async fn test_create_and_get_cart() {
        let (service, _) = setup().await;
        let cart = service.create_cart().await.unwrap();
        let loaded = service.get_cart(cart.id()).await.unwrap();
        assert_eq!(loaded.id(), cart.id());
        assert!(loaded.is_empty());
    }

    #[tokio::test]
    async fn test_get_missing_cart() {
        let (service, _) = setup().await;
        let result = service.get_cart(OrderId::new()).await;
        assert!(matches!(result, Err(DomainError::OrderNotFound(_))));
    }

    #[tokio::test]
    async fn test_add_item_persists() {
        let (service, widget) = setup().await;
        let cart = service.create_cart().await.unwrap();

        service.add_item(cart.id(), widget.id.clone(), 2).await.unwrap();
        let order = service.add_item(cart.id(), widget.id.clone(), 1).await.unwrap();

        assert_eq!(order.item_count(), 1);
        assert_eq!(order.total().cents(), 3750);

        let loaded = service.get_cart(cart.id()).await.unwrap();
        assert_eq!(loaded.total_quantity(), 3);
        assert_eq!(loaded.version(), order.version());
    }

    #[tokio::test]
    async fn test_add_unknown_product_fails() {
        let (service, _) = setup().await;
        let cart = service.create_cart().await.unwrap();

        let result = service.add_item(cart.id(), ProductId::new("nope"), 1).await;
        assert!(matches!(result, Err(DomainError::ProductNotFound(_))));
    }

    #[tokio::test]
    async fn test_update_and_remove_item() {
        let (service, widget) = setup().await;
        let cart = service.create_cart().await.unwrap();
        let order = service.add_item(cart.id(), widget.id.clone(), 1).await.unwrap();
        let item_id = order.items()[0].id;

        let order = service
            .update_item_quantity(cart.id(), item_id, 4)
            .await
            .unwrap();
        assert_eq!(order.total().cents(), 5000);

        let order = service.remove_item(cart.id(), item_id).await.unwrap();
        assert!(order.is_empty());
        assert_eq!(order.total(), Money::zero());
    }

    #[tokio::test]
    async fn test_calculate_total() {
        let (service, widget) = setup().await;
        let cart = service.create_cart().await.unwrap();

        let empty = service.calculate_total(cart.id()).await;
        assert!(matches!(
            empty,
            Err(DomainError::Order(OrderError::EmptyOrder))
        ));

        service.add_item(cart.id(), widget.id.clone(), 2).await.unwrap();
        let (_, total) = service.calculate_total(cart.id()).await.unwrap();
        assert_eq!(total.cents(), 2500);
    }
}
