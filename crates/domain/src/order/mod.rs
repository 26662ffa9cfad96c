//! Order aggregate and related types.

mod aggregate;
mod cart;
mod item;
mod service;
mod status;

pub use aggregate::Order;
pub use cart::CartService;
pub use item::LineItem;
pub use service::OrderService;
pub use status::OrderStatus;

use common::ItemId;
use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrderError {
    /// The referenced product could not be resolved.
    #[error("Invalid product: product is required")]
    InvalidProduct,

    /// Invalid quantity.
    #[error("Invalid quantity: {quantity} (must be between 1 and 2147483647)")]
    InvalidQuantity { quantity: u32 },

    /// Invalid price.
    #[error("Invalid price: {price} cents (must be greater than 0)")]
    InvalidPrice { price: i64 },

    /// A line or order total does not fit in the money representation.
    #[error("Amount overflow: order total is too large")]
    AmountOverflow,

    /// Item not found in order.
    #[error("Item not found: {item_id}")]
    ItemNotFound { item_id: ItemId },

    /// Order has no items.
    #[error("Order has no items")]
    EmptyOrder,

    /// Status is unknown or may not be assigned.
    #[error("Invalid order status: {status}")]
    InvalidOrderStatus { status: String },
}
