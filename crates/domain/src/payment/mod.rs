//! Payment aggregate and the payment-processing service.

mod aggregate;
mod method;
mod service;
mod status;

pub use aggregate::{Payment, PaymentRecord};
pub use method::PaymentMethod;
pub use service::{ApprovalPolicy, PaymentService};
pub use status::PaymentStatus;

use thiserror::Error;

/// Errors that can occur during payment operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaymentError {
    #[error("order_id cannot be empty")]
    EmptyOrderId,

    #[error("Invalid amount: {amount} cents (must be greater than 0)")]
    InvalidAmount { amount: i64 },

    #[error("Invalid payment method: {method}")]
    InvalidPaymentMethod { method: String },

    #[error("Invalid payment status: {status}")]
    InvalidPaymentStatus { status: String },

    #[error("customer email cannot be empty")]
    EmptyCustomerEmail,

    /// Transition not allowed from the current status.
    #[error("Invalid payment transition: cannot {action} from {status}")]
    InvalidTransition {
        action: &'static str,
        status: PaymentStatus,
    },

    #[error("Payment cannot be canceled in status {status}")]
    PaymentCannotBeCanceled { status: PaymentStatus },
}
