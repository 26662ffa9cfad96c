//! Saga error types.

use common::OrderId;
use domain::{OrderError, PaymentError, ProductError, StoreError};
use thiserror::Error;

use crate::gateway::GatewayError;

/// Errors that can occur during saga operations.
#[derive(Debug, Error)]
pub enum SagaError {
    /// Order not found.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// A requested line was invalid; nothing was persisted.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// The payment details were invalid; nothing was persisted.
    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    /// A placeholder product could not be synthesized.
    #[error("Product error: {0}")]
    Product(#[from] ProductError),

    /// Store error. After pricing, the caller must re-query the order.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The payment call failed. The order was recorded as `payment_failed`.
    #[error("Payment failed for order {order_id}: {source}")]
    PaymentFailed {
        order_id: OrderId,
        #[source]
        source: GatewayError,
    },

    /// A detached store write did not run to completion.
    #[error("Store write aborted: {0}")]
    WriteAborted(String),
}

/// Convenience type alias for saga results.
pub type Result<T> = std::result::Result<T, SagaError>;
