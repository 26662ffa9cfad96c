//! Observers notified as a saga moves through its steps.

use std::sync::{Arc, Mutex, PoisonError};

use common::{OrderId, PaymentId};

use crate::state::SagaStep;

/// Receives step transitions and compensation failures from the saga.
pub trait SagaObserver: Send + Sync {
    /// Called each time a flow enters a step.
    fn on_step(&self, order_id: OrderId, step: SagaStep);

    /// Called when a payment could not be canceled while canceling an order.
    ///
    /// The order is still canceled; the payment needs out-of-band review.
    fn on_compensation_failure(&self, order_id: OrderId, payment_id: PaymentId, reason: &str);
}

/// Observer that emits structured `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl SagaObserver for TracingObserver {
    fn on_step(&self, order_id: OrderId, step: SagaStep) {
        if step.is_terminal() {
            tracing::info!(%order_id, %step, "saga step reached");
        } else {
            tracing::debug!(%order_id, %step, "saga step started");
        }
    }

    fn on_compensation_failure(&self, order_id: OrderId, payment_id: PaymentId, reason: &str) {
        tracing::warn!(
            %order_id,
            %payment_id,
            reason,
            "payment cancellation failed; order canceled with payment still active"
        );
    }
}

/// A recorded observer notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    Step {
        order_id: OrderId,
        step: SagaStep,
    },
    CompensationFailure {
        order_id: OrderId,
        payment_id: PaymentId,
        reason: String,
    },
}

/// Observer that records every notification, for tests.
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    observations: Arc<Mutex<Vec<Observation>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns everything recorded so far.
    pub fn observations(&self) -> Vec<Observation> {
        self.lock().clone()
    }

    /// Returns the steps recorded for one order, in order.
    pub fn steps_for(&self, order_id: OrderId) -> Vec<SagaStep> {
        self.lock()
            .iter()
            .filter_map(|o| match o {
                Observation::Step { order_id: id, step } if *id == order_id => Some(*step),
                _ => None,
            })
            .collect()
    }

    /// Returns the recorded compensation failures.
    pub fn compensation_failures(&self) -> Vec<Observation> {
        self.lock()
            .iter()
            .filter(|o| matches!(o, Observation::CompensationFailure { .. }))
            .cloned()
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Observation>> {
        self.observations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl SagaObserver for RecordingObserver {
    fn on_step(&self, order_id: OrderId, step: SagaStep) {
        self.lock().push(Observation::Step { order_id, step });
    }

    fn on_compensation_failure(&self, order_id: OrderId, payment_id: PaymentId, reason: &str) {
        self.lock().push(Observation::CompensationFailure {
            order_id,
            payment_id,
            reason: reason.to_string(),
        });
    }
}
