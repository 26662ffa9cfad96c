//! Payment aggregate implementation.

use chrono::{DateTime, Utc};
use common::{OrderId, PaymentId, Version};
use serde::{Deserialize, Serialize};

use crate::Money;

use super::{PaymentError, PaymentMethod, PaymentStatus};

/// Persisted shape of a payment, used by stores to rebuild the aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: PaymentId,
    pub version: Version,
    pub order_id: OrderId,
    pub amount: Money,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub customer_email: String,
    pub customer_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub canceled_at: Option<DateTime<Utc>>,
    pub cancel_reason: Option<String>,
}

/// Payment aggregate root.
///
/// The only coupling to orders is `order_id`; the amount is fixed at creation
/// and must equal the order total at the moment payment was requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PaymentRecord", into = "PaymentRecord")]
pub struct Payment {
    record: PaymentRecord,
}

impl Payment {
    /// Creates a new pending payment.
    pub fn new(
        order_id: OrderId,
        amount: Money,
        method: PaymentMethod,
        customer_email: impl Into<String>,
        customer_name: impl Into<String>,
    ) -> Result<Self, PaymentError> {
        if order_id.as_uuid().is_nil() {
            return Err(PaymentError::EmptyOrderId);
        }
        if !amount.is_positive() {
            return Err(PaymentError::InvalidAmount {
                amount: amount.cents(),
            });
        }
        let customer_email = customer_email.into();
        if customer_email.trim().is_empty() {
            return Err(PaymentError::EmptyCustomerEmail);
        }

        let now = Utc::now();
        Ok(Self {
            record: PaymentRecord {
                id: PaymentId::new(),
                version: Version::initial(),
                order_id,
                amount,
                method,
                status: PaymentStatus::Pending,
                transaction_id: None,
                customer_email,
                customer_name: customer_name.into(),
                created_at: now,
                updated_at: now,
                canceled_at: None,
                cancel_reason: None,
            },
        })
    }

    /// Rebuilds a persisted payment.
    pub fn from_record(record: PaymentRecord) -> Self {
        Self { record }
    }

    pub fn record(&self) -> &PaymentRecord {
        &self.record
    }

    pub fn into_record(self) -> PaymentRecord {
        self.record
    }
}

impl From<PaymentRecord> for Payment {
    fn from(record: PaymentRecord) -> Self {
        Self::from_record(record)
    }
}

impl From<Payment> for PaymentRecord {
    fn from(payment: Payment) -> Self {
        payment.into_record()
    }
}

// Query methods
impl Payment {
    pub fn id(&self) -> PaymentId {
        self.record.id
    }

    pub fn version(&self) -> Version {
        self.record.version
    }

    pub fn set_version(&mut self, version: Version) {
        self.record.version = version;
    }

    pub fn order_id(&self) -> OrderId {
        self.record.order_id
    }

    pub fn amount(&self) -> Money {
        self.record.amount
    }

    pub fn method(&self) -> PaymentMethod {
        self.record.method
    }

    pub fn status(&self) -> PaymentStatus {
        self.record.status
    }

    pub fn transaction_id(&self) -> Option<&str> {
        self.record.transaction_id.as_deref()
    }

    pub fn customer_email(&self) -> &str {
        &self.record.customer_email
    }

    pub fn customer_name(&self) -> &str {
        &self.record.customer_name
    }

    pub fn canceled_at(&self) -> Option<DateTime<Utc>> {
        self.record.canceled_at
    }

    pub fn cancel_reason(&self) -> Option<&str> {
        self.record.cancel_reason.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.record.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.record.updated_at
    }

    /// Returns true while the payment may still be canceled.
    pub fn can_be_canceled(&self) -> bool {
        matches!(
            self.record.status,
            PaymentStatus::Pending | PaymentStatus::Processing | PaymentStatus::Declined
        )
    }

    /// Returns true once the payment has reached a verdict or been unwound.
    pub fn is_finalized(&self) -> bool {
        matches!(
            self.record.status,
            PaymentStatus::Approved
                | PaymentStatus::Declined
                | PaymentStatus::Canceled
                | PaymentStatus::Refunded
        )
    }
}

// State transitions
impl Payment {
    /// Starts processing under the given transaction reference.
    pub fn mark_processing(&mut self, transaction_id: impl Into<String>) -> Result<(), PaymentError> {
        self.require(PaymentStatus::Pending, "process")?;
        self.record.status = PaymentStatus::Processing;
        self.record.transaction_id = Some(transaction_id.into());
        self.touch();
        Ok(())
    }

    pub fn approve(&mut self) -> Result<(), PaymentError> {
        self.require(PaymentStatus::Processing, "approve")?;
        self.record.status = PaymentStatus::Approved;
        self.touch();
        Ok(())
    }

    pub fn decline(&mut self) -> Result<(), PaymentError> {
        self.require(PaymentStatus::Processing, "decline")?;
        self.record.status = PaymentStatus::Declined;
        self.touch();
        Ok(())
    }

    /// Cancels the payment, recording the reason and time.
    pub fn cancel(&mut self, reason: impl Into<String>) -> Result<(), PaymentError> {
        if !self.can_be_canceled() {
            return Err(PaymentError::PaymentCannotBeCanceled {
                status: self.record.status,
            });
        }
        let now = Utc::now();
        self.record.status = PaymentStatus::Canceled;
        self.record.cancel_reason = Some(reason.into());
        self.record.canceled_at = Some(now);
        self.record.updated_at = now;
        Ok(())
    }

    pub fn refund(&mut self) -> Result<(), PaymentError> {
        self.require(PaymentStatus::Approved, "refund")?;
        self.record.status = PaymentStatus::Refunded;
        self.touch();
        Ok(())
    }

    fn require(&self, expected: PaymentStatus, action: &'static str) -> Result<(), PaymentError> {
        if self.record.status != expected {
            return Err(PaymentError::InvalidTransition {
                action,
                status: self.record.status,
            });
        }
        Ok(())
    }

    fn touch(&mut self) {
        self.record.updated_at = Utc::now();
    }
}
