//! Order fulfillment saga.
//!
//! Coordinates the order and payment aggregates, which share no transaction,
//! through two flows:
//!
//! 1. Create-with-payment: build and price the order, persist it, charge it
//!    through the payment gateway, then reconcile the order status with the
//!    verdict.
//! 2. Cancellation: ask the gateway to cancel the payment (best effort), then
//!    cancel the order regardless of the gateway's answer.

pub mod coordinator;
pub mod error;
pub mod gateway;
pub mod observer;
pub mod state;

pub use coordinator::{
    CancelOutcome, CreateOrderOutcome, CreateOrderRequest, DEFAULT_CANCEL_REASON,
    FulfillmentSaga, OrderLine, PaymentCancellation, order_status_for,
};
pub use error::SagaError;
pub use gateway::{
    CancellationReceipt, GatewayError, GatewayTimeouts, LocalPaymentGateway, PaymentGateway,
    PaymentReceipt, PaymentRequest,
};
pub use observer::{Observation, RecordingObserver, SagaObserver, TracingObserver};
pub use state::{CancelStep, CreateStep, SagaStep};
