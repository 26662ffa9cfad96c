//! Order administration: lookup, status changes and deletion.

use common::OrderId;
use tracing::info;

use crate::error::DomainError;
use crate::store::{OrderStore, StoreError};

use super::{Order, OrderStatus};

/// Service for managing persisted orders.
pub struct OrderService<O: OrderStore> {
    orders: O,
}

impl<O: OrderStore> OrderService<O> {
    /// Creates a new order service backed by the given store.
    pub fn new(orders: O) -> Self {
        Self { orders }
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, order_id: OrderId) -> Result<Order, DomainError> {
        self.orders
            .find_by_id(order_id)
            .await?
            .ok_or(DomainError::OrderNotFound(order_id))
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_orders(&self) -> Result<Vec<Order>, DomainError> {
        Ok(self.orders.find_all().await?)
    }

    /// Sets the order status from its wire name.
    ///
    /// Only `pending`, `paid`, `canceled` and `completed` may be assigned.
    #[tracing::instrument(skip(self))]
    pub async fn update_status(
        &self,
        order_id: OrderId,
        status: &str,
    ) -> Result<Order, DomainError> {
        let status: OrderStatus = status.parse()?;

        let mut order = self.get_order(order_id).await?;
        order.transition_status(status)?;
        let version = self.orders.update(&order).await?;
        order.set_version(version);

        info!(%order_id, %status, "Order status updated");
        Ok(order)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_order(&self, order_id: OrderId) -> Result<(), DomainError> {
        self.orders.delete(order_id).await.map_err(|e| match e {
            StoreError::NotFound { .. } => DomainError::OrderNotFound(order_id),
            other => DomainError::Store(other),
        })?;

        info!(%order_id, "Order deleted");
        Ok(())
    }
}
