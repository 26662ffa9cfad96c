//! Payment gateway contract and the in-process gateway.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use common::{OrderId, PaymentId};
use domain::{DomainError, Money, PaymentMethod, PaymentService, PaymentStatus, PaymentStore};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A request to charge an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub order_id: OrderId,
    pub amount: Money,
    pub method: PaymentMethod,
    pub customer_email: String,
    pub customer_name: String,
}

/// The gateway's answer to a charge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub payment_id: PaymentId,
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub message: String,
}

/// The gateway's answer to a cancellation.
///
/// `success == false` means the gateway was reached but refused, for
/// example because the payment was already approved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancellationReceipt {
    pub success: bool,
    pub message: String,
}

/// Failures talking to the gateway.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The gateway could not be reached or failed internally.
    #[error("Payment gateway unavailable: {0}")]
    Transport(String),

    /// The call did not complete within its deadline.
    #[error("Payment gateway timed out after {0:?}")]
    Timeout(Duration),

    /// The gateway refused the request as invalid.
    #[error("Payment gateway rejected the request: {0}")]
    Rejected(String),
}

/// Remote payment operations used by the fulfillment saga.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Charges an order and returns the verdict.
    async fn process_payment(
        &self,
        request: PaymentRequest,
    ) -> Result<PaymentReceipt, GatewayError>;

    /// Cancels a previously issued payment.
    async fn cancel_payment(
        &self,
        payment_id: PaymentId,
        reason: &str,
    ) -> Result<CancellationReceipt, GatewayError>;
}

#[async_trait]
impl<T: PaymentGateway + ?Sized> PaymentGateway for Arc<T> {
    async fn process_payment(
        &self,
        request: PaymentRequest,
    ) -> Result<PaymentReceipt, GatewayError> {
        (**self).process_payment(request).await
    }

    async fn cancel_payment(
        &self,
        payment_id: PaymentId,
        reason: &str,
    ) -> Result<CancellationReceipt, GatewayError> {
        (**self).cancel_payment(payment_id, reason).await
    }
}

/// Per-call deadlines enforced by the saga.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatewayTimeouts {
    pub process: Duration,
    pub cancel: Duration,
}

impl Default for GatewayTimeouts {
    fn default() -> Self {
        Self {
            process: Duration::from_secs(10),
            cancel: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Faults {
    fail_on_process: bool,
    fail_on_cancel: bool,
    latency: Duration,
}

/// Gateway that calls a [`PaymentService`] in the same process.
///
/// Carries fault-injection switches so callers can simulate an unreachable
/// or slow payment provider.
pub struct LocalPaymentGateway<P: PaymentStore> {
    service: Arc<PaymentService<P>>,
    faults: Arc<RwLock<Faults>>,
}

impl<P: PaymentStore> Clone for LocalPaymentGateway<P> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            faults: Arc::clone(&self.faults),
        }
    }
}

impl<P: PaymentStore> LocalPaymentGateway<P> {
    pub fn new(service: Arc<PaymentService<P>>) -> Self {
        Self {
            service,
            faults: Arc::default(),
        }
    }

    /// Returns the payment service behind the gateway.
    pub fn service(&self) -> &Arc<PaymentService<P>> {
        &self.service
    }

    /// Makes every charge fail with a transport error.
    pub fn set_fail_on_process(&self, fail: bool) {
        self.faults_mut(|f| f.fail_on_process = fail);
    }

    /// Makes every cancellation fail with a transport error.
    pub fn set_fail_on_cancel(&self, fail: bool) {
        self.faults_mut(|f| f.fail_on_cancel = fail);
    }

    /// Delays every call by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        self.faults_mut(|f| f.latency = latency);
    }

    fn faults(&self) -> Faults {
        *self.faults.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn faults_mut(&self, apply: impl FnOnce(&mut Faults)) {
        apply(&mut self.faults.write().unwrap_or_else(PoisonError::into_inner));
    }

    async fn simulate_latency(&self, latency: Duration) {
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl<P: PaymentStore> PaymentGateway for LocalPaymentGateway<P> {
    #[tracing::instrument(skip(self, request), fields(order_id = %request.order_id, amount = %request.amount))]
    async fn process_payment(
        &self,
        request: PaymentRequest,
    ) -> Result<PaymentReceipt, GatewayError> {
        let faults = self.faults();
        self.simulate_latency(faults.latency).await;
        if faults.fail_on_process {
            return Err(GatewayError::Transport("connection refused".to_string()));
        }

        let payment = self
            .service
            .process_payment(
                request.order_id,
                request.amount,
                request.method,
                &request.customer_email,
                &request.customer_name,
            )
            .await
            .map_err(|e| match e {
                DomainError::Payment(e) => GatewayError::Rejected(e.to_string()),
                other => GatewayError::Transport(other.to_string()),
            })?;

        let message = match payment.status() {
            PaymentStatus::Declined => "Payment was declined by the payment gateway",
            _ => "Payment processed successfully",
        };

        Ok(PaymentReceipt {
            payment_id: payment.id(),
            status: payment.status(),
            transaction_id: payment.transaction_id().map(str::to_string),
            message: message.to_string(),
        })
    }

    #[tracing::instrument(skip(self))]
    async fn cancel_payment(
        &self,
        payment_id: PaymentId,
        reason: &str,
    ) -> Result<CancellationReceipt, GatewayError> {
        let faults = self.faults();
        self.simulate_latency(faults.latency).await;
        if faults.fail_on_cancel {
            return Err(GatewayError::Transport("connection refused".to_string()));
        }

        match self.service.cancel_payment(payment_id, reason).await {
            Ok(_) => Ok(CancellationReceipt {
                success: true,
                message: "Payment canceled successfully".to_string(),
            }),
            Err(DomainError::Store(e)) => Err(GatewayError::Transport(e.to_string())),
            Err(e) => Ok(CancellationReceipt {
                success: false,
                message: e.to_string(),
            }),
        }
    }
}
