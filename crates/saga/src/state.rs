//! Fulfillment saga step machines.

use serde::{Deserialize, Serialize};

/// Steps of the create-with-payment flow.
///
/// ```text
/// Building ──► Priced ──► PaymentRequested ──┬──► Reconciled
///                                            └──► PaymentFailed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CreateStep {
    /// Lines resolved against the catalog and priced in memory.
    #[default]
    Building,

    /// Order persisted; the amount to charge is fixed.
    Priced,

    /// Waiting on the payment gateway.
    PaymentRequested,

    /// Gateway verdict applied to the order (terminal state).
    Reconciled,

    /// Gateway call failed; order recorded as `payment_failed` (terminal state).
    PaymentFailed,
}

impl CreateStep {
    /// Returns true if this is a terminal step.
    pub fn is_terminal(&self) -> bool {
        matches!(self, CreateStep::Reconciled | CreateStep::PaymentFailed)
    }

    /// Returns true if the flow may move from this step to `next`.
    pub fn can_advance_to(&self, next: CreateStep) -> bool {
        matches!(
            (self, next),
            (CreateStep::Building, CreateStep::Priced)
                | (CreateStep::Priced, CreateStep::PaymentRequested)
                | (CreateStep::PaymentRequested, CreateStep::Reconciled)
                | (CreateStep::PaymentRequested, CreateStep::PaymentFailed)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CreateStep::Building => "Building",
            CreateStep::Priced => "Priced",
            CreateStep::PaymentRequested => "PaymentRequested",
            CreateStep::Reconciled => "Reconciled",
            CreateStep::PaymentFailed => "PaymentFailed",
        }
    }
}

impl std::fmt::Display for CreateStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Steps of the cancellation flow.
///
/// ```text
/// Loaded ──► [PaymentCancelRequested] ──► Finalized
/// ```
///
/// `PaymentCancelRequested` is skipped when no payment id was supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CancelStep {
    #[default]
    Loaded,
    PaymentCancelRequested,
    /// Order canceled (terminal state).
    Finalized,
}

impl CancelStep {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CancelStep::Finalized)
    }

    pub fn can_advance_to(&self, next: CancelStep) -> bool {
        matches!(
            (self, next),
            (CancelStep::Loaded, CancelStep::PaymentCancelRequested)
                | (CancelStep::Loaded, CancelStep::Finalized)
                | (CancelStep::PaymentCancelRequested, CancelStep::Finalized)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CancelStep::Loaded => "Loaded",
            CancelStep::PaymentCancelRequested => "PaymentCancelRequested",
            CancelStep::Finalized => "Finalized",
        }
    }
}

impl std::fmt::Display for CancelStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A step of either flow, as reported to observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SagaStep {
    Create(CreateStep),
    Cancel(CancelStep),
}

impl SagaStep {
    pub fn is_terminal(&self) -> bool {
        match self {
            SagaStep::Create(step) => step.is_terminal(),
            SagaStep::Cancel(step) => step.is_terminal(),
        }
    }

    /// Returns true if `next` may follow this step. Steps never cross flows.
    pub fn can_advance_to(&self, next: SagaStep) -> bool {
        match (self, next) {
            (SagaStep::Create(from), SagaStep::Create(to)) => from.can_advance_to(to),
            (SagaStep::Cancel(from), SagaStep::Cancel(to)) => from.can_advance_to(to),
            _ => false,
        }
    }
}

impl std::fmt::Display for SagaStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SagaStep::Create(step) => write!(f, "create/{step}"),
            SagaStep::Cancel(step) => write!(f, "cancel/{step}"),
        }
    }
}

impl From<CreateStep> for SagaStep {
    fn from(step: CreateStep) -> Self {
        SagaStep::Create(step)
    }
}

impl From<CancelStep> for SagaStep {
    fn from(step: CancelStep) -> Self {
        SagaStep::Cancel(step)
    }
}
