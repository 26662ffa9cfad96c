//! Domain error types.

use common::{OrderId, PaymentId};
use thiserror::Error;

use crate::order::OrderError;
use crate::payment::PaymentError;
use crate::product::{ProductError, ProductId};
use crate::store::StoreError;

/// Errors returned by the application services.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An error occurred in the order aggregate.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    #[error("Product error: {0}")]
    Product(#[from] ProductError),

    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    /// An error occurred in a store.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    #[error("Payment not found: {0}")]
    PaymentNotFound(PaymentId),
}
