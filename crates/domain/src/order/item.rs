//! Order line items.

use common::{ItemId, OrderId};
use serde::{Deserialize, Serialize};

use crate::Money;
use crate::product::{Product, ProductId};

use super::OrderError;

/// A line in an order.
///
/// `unit_price` and `product_name` are snapshots taken when the item was
/// created; `total` always equals `unit_price * quantity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "LineItemRecord")]
pub struct LineItem {
    pub id: ItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub total: Money,
}

/// Decoded form of a line item; the total is always recomputed.
#[derive(Deserialize)]
struct LineItemRecord {
    id: ItemId,
    order_id: OrderId,
    product_id: ProductId,
    product_name: String,
    quantity: u32,
    unit_price: Money,
}

impl TryFrom<LineItemRecord> for LineItem {
    type Error = OrderError;

    fn try_from(record: LineItemRecord) -> Result<Self, Self::Error> {
        Self::restore(
            record.id,
            record.order_id,
            record.product_id,
            record.product_name,
            record.quantity,
            record.unit_price,
        )
    }
}

impl LineItem {
    /// Largest quantity a single line may hold. Matches the `INTEGER` column
    /// used by the PostgreSQL store.
    pub const MAX_QUANTITY: u32 = i32::MAX as u32;

    /// Creates a line item priced from the given product.
    pub fn new(
        order_id: OrderId,
        product_id: ProductId,
        product: Option<&Product>,
        quantity: u32,
    ) -> Result<Self, OrderError> {
        let product = product.ok_or(OrderError::InvalidProduct)?;

        if !product.price.is_positive() {
            return Err(OrderError::InvalidPrice {
                price: product.price.cents(),
            });
        }

        Self::restore(
            ItemId::new(),
            order_id,
            product_id,
            product.name.clone(),
            quantity,
            product.price,
        )
    }

    /// Rebuilds a persisted line item, recomputing its total.
    pub fn restore(
        id: ItemId,
        order_id: OrderId,
        product_id: ProductId,
        product_name: String,
        quantity: u32,
        unit_price: Money,
    ) -> Result<Self, OrderError> {
        Ok(Self {
            id,
            order_id,
            product_id,
            product_name,
            quantity,
            unit_price,
            total: line_total(unit_price, quantity)?,
        })
    }

    /// Sets a new quantity and recomputes the total.
    ///
    /// On error the line is left unchanged.
    pub fn update_quantity(&mut self, quantity: u32) -> Result<(), OrderError> {
        self.total = line_total(self.unit_price, quantity)?;
        self.quantity = quantity;
        Ok(())
    }
}

fn line_total(unit_price: Money, quantity: u32) -> Result<Money, OrderError> {
    if quantity == 0 || quantity > LineItem::MAX_QUANTITY {
        return Err(OrderError::InvalidQuantity { quantity });
    }
    unit_price
        .checked_mul(quantity)
        .ok_or(OrderError::AmountOverflow)
}
