//! Payment processing: the payments side that the gateway fronts.

use common::{OrderId, PaymentId};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::DomainError;
use crate::store::PaymentStore;
use crate::Money;

use super::{Payment, PaymentMethod, PaymentStatus};

/// Decides whether a charge is approved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApprovalPolicy {
    /// Charges at or above this amount are declined.
    pub decline_threshold: Money,
}

impl ApprovalPolicy {
    pub const DEFAULT_DECLINE_THRESHOLD: Money = Money::from_cents(1_000_000);

    pub fn new(decline_threshold: Money) -> Self {
        Self { decline_threshold }
    }

    pub fn approves(&self, amount: Money) -> bool {
        amount.is_positive() && amount < self.decline_threshold
    }
}

impl Default for ApprovalPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DECLINE_THRESHOLD)
    }
}

/// Service that charges, cancels and refunds payments.
pub struct PaymentService<P: PaymentStore> {
    payments: P,
    policy: ApprovalPolicy,
}

impl<P: PaymentStore> PaymentService<P> {
    pub fn new(payments: P) -> Self {
        Self::with_policy(payments, ApprovalPolicy::default())
    }

    pub fn with_policy(payments: P, policy: ApprovalPolicy) -> Self {
        Self { payments, policy }
    }

    pub fn policy(&self) -> ApprovalPolicy {
        self.policy
    }

    /// Charges an order and records the verdict.
    ///
    /// The payment moves through `processing` under a fresh transaction id
    /// and ends `approved` or `declined`; a decline is not an error.
    #[tracing::instrument(skip(self, customer_email, customer_name))]
    pub async fn process_payment(
        &self,
        order_id: OrderId,
        amount: Money,
        method: PaymentMethod,
        customer_email: &str,
        customer_name: &str,
    ) -> Result<Payment, DomainError> {
        let mut payment = Payment::new(order_id, amount, method, customer_email, customer_name)?;

        payment.mark_processing(Uuid::new_v4().to_string())?;
        if self.verdict_for(amount) == PaymentStatus::Approved {
            payment.approve()?;
            info!(payment_id = %payment.id(), %order_id, %amount, "Payment approved");
        } else {
            payment.decline()?;
            warn!(payment_id = %payment.id(), %order_id, %amount, "Payment declined");
        }

        let version = self.payments.create(&payment).await?;
        payment.set_version(version);

        metrics::counter!("payments_processed_total", "status" => payment.status().as_str())
            .increment(1);

        Ok(payment)
    }

    /// Cancels a payment that has not been approved, canceled or refunded.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_payment(
        &self,
        payment_id: PaymentId,
        reason: &str,
    ) -> Result<Payment, DomainError> {
        let mut payment = self.get_payment(payment_id).await?;
        payment.cancel(reason)?;

        let version = self.payments.update(&payment).await?;
        payment.set_version(version);

        info!(%payment_id, "Payment canceled");
        Ok(payment)
    }

    /// Refunds an approved payment.
    #[tracing::instrument(skip(self))]
    pub async fn refund_payment(&self, payment_id: PaymentId) -> Result<Payment, DomainError> {
        let mut payment = self.get_payment(payment_id).await?;
        payment.refund()?;

        let version = self.payments.update(&payment).await?;
        payment.set_version(version);

        info!(%payment_id, "Payment refunded");
        Ok(payment)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_payment(&self, payment_id: PaymentId) -> Result<Payment, DomainError> {
        self.payments
            .find_by_id(payment_id)
            .await?
            .ok_or(DomainError::PaymentNotFound(payment_id))
    }

    /// Lists the payments recorded for an order.
    #[tracing::instrument(skip(self))]
    pub async fn list_payments(&self, order_id: OrderId) -> Result<Vec<Payment>, DomainError> {
        Ok(self.payments.find_by_order_id(order_id).await?)
    }

    /// Returns the status a charge of `amount` ends in.
    fn verdict_for(&self, amount: Money) -> PaymentStatus {
        if self.policy.approves(amount) {
            PaymentStatus::Approved
        } else {
            PaymentStatus::Declined
        }
    }
}
