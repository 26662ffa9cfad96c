//! Order aggregate implementation.

use chrono::{DateTime, Utc};
use common::{ItemId, OrderId, Version};
use serde::{Deserialize, Serialize};

use crate::Money;
use crate::product::{Product, ProductId};

use super::{LineItem, OrderError, OrderStatus};

/// Order aggregate root.
///
/// Owns its line items and a total that is recomputed after every mutation,
/// so `total == Σ item.unit_price × item.quantity` always holds. A mutation
/// whose total would overflow is rejected and leaves the order unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "OrderRecord")]
pub struct Order {
    /// Unique order identifier.
    id: OrderId,

    /// Version of the persisted row this order was loaded from.
    #[serde(default)]
    version: Version,

    /// Current status of the order.
    status: OrderStatus,

    /// Line items, in the order they were first added.
    items: Vec<LineItem>,

    /// Derived total of all items.
    total: Money,

    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Decoded form of an order. Any stored total is ignored.
#[derive(Deserialize)]
struct OrderRecord {
    id: OrderId,
    #[serde(default)]
    version: Version,
    status: OrderStatus,
    items: Vec<LineItem>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRecord> for Order {
    type Error = OrderError;

    fn try_from(record: OrderRecord) -> Result<Self, Self::Error> {
        Self::restore(
            record.id,
            record.version,
            record.status,
            record.items,
            record.created_at,
            record.updated_at,
        )
    }
}

impl Default for Order {
    fn default() -> Self {
        Self::new()
    }
}

impl Order {
    /// Creates a new, empty, pending order.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: OrderId::new(),
            version: Version::initial(),
            status: OrderStatus::Pending,
            items: Vec::new(),
            total: Money::zero(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuilds a persisted order. The total is recomputed from the items.
    pub fn restore(
        id: OrderId,
        version: Version,
        status: OrderStatus,
        items: Vec<LineItem>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, OrderError> {
        Ok(Self {
            id,
            version,
            status,
            total: sum_totals(&items)?,
            items,
            created_at,
            updated_at,
        })
    }
}

// Query methods
impl Order {
    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn version(&self) -> Version {
        self.version
    }

    /// Records the version assigned by the store after a write.
    pub fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// Returns all items in the order.
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Returns an item by its id.
    pub fn item(&self, item_id: ItemId) -> Option<&LineItem> {
        self.items.iter().find(|item| item.id == item_id)
    }

    /// Returns the number of distinct lines.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Returns the total quantity of all items.
    pub fn total_quantity(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    pub fn total(&self) -> Money {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

// Mutations
impl Order {
    /// Adds `quantity` units of a product to the order.
    ///
    /// If a line for `product_id` already exists its quantity is increased
    /// instead of appending a duplicate line. Returns the id of the line that
    /// holds the product.
    pub fn add_item(
        &mut self,
        product_id: &ProductId,
        product: Option<&Product>,
        quantity: u32,
    ) -> Result<ItemId, OrderError> {
        let item = LineItem::new(self.id, product_id.clone(), product, quantity)?;
        let mut items = self.items.clone();

        let id = match items
            .iter_mut()
            .find(|existing| existing.product_id == item.product_id)
        {
            Some(existing) => {
                existing.update_quantity(existing.quantity.saturating_add(item.quantity))?;
                existing.id
            }
            None => {
                let id = item.id;
                items.push(item);
                id
            }
        };

        self.replace_items(items)?;
        Ok(id)
    }

    /// Removes a line from the order.
    pub fn remove_item(&mut self, item_id: ItemId) -> Result<LineItem, OrderError> {
        let index = self
            .items
            .iter()
            .position(|item| item.id == item_id)
            .ok_or(OrderError::ItemNotFound { item_id })?;

        let mut items = self.items.clone();
        let removed = items.remove(index);
        self.replace_items(items)?;
        Ok(removed)
    }

    /// Sets the quantity of an existing line.
    pub fn update_item_quantity(
        &mut self,
        item_id: ItemId,
        quantity: u32,
    ) -> Result<(), OrderError> {
        let mut items = self.items.clone();
        let item = items
            .iter_mut()
            .find(|item| item.id == item_id)
            .ok_or(OrderError::ItemNotFound { item_id })?;

        item.update_quantity(quantity)?;
        self.replace_items(items)
    }

    /// Checks the order can be charged and returns the amount to charge.
    ///
    /// Item contents are never touched; only the total is recomputed.
    pub fn prepare_for_payment(&mut self) -> Result<Money, OrderError> {
        if self.items.is_empty() {
            return Err(OrderError::EmptyOrder);
        }
        self.total = sum_totals(&self.items)?;
        Ok(self.total)
    }

    /// Sets a client-assignable status, with no adjacency rules.
    pub fn transition_status(&mut self, status: OrderStatus) -> Result<(), OrderError> {
        if !status.is_assignable() {
            return Err(OrderError::InvalidOrderStatus {
                status: status.to_string(),
            });
        }
        self.status = status;
        self.touch();
        Ok(())
    }

    /// Records that the payment call failed before returning a verdict.
    pub fn mark_payment_failed(&mut self) {
        self.status = OrderStatus::PaymentFailed;
        self.touch();
    }

    fn replace_items(&mut self, items: Vec<LineItem>) -> Result<(), OrderError> {
        self.total = sum_totals(&items)?;
        self.items = items;
        self.touch();
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

fn sum_totals(items: &[LineItem]) -> Result<Money, OrderError> {
    Money::checked_sum(items.iter().map(|item| item.total)).ok_or(OrderError::AmountOverflow)
}
