//! Fulfillment saga: create-with-payment and cancellation.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use common::{OrderId, PaymentId};
use domain::{
    Catalog, Money, Order, OrderStatus, OrderStore, PaymentError, PaymentMethod, PaymentStatus,
    Product, ProductId, StoreError,
};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SagaError};
use crate::gateway::{GatewayError, GatewayTimeouts, PaymentGateway, PaymentRequest};
use crate::observer::{SagaObserver, TracingObserver};
use crate::state::{CancelStep, CreateStep, SagaStep};

/// Reason sent to the gateway when an order is canceled without one.
pub const DEFAULT_CANCEL_REASON: &str = "order canceled";

/// One requested line of a new order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: u32,
    /// Price used if the product has to be synthesized.
    pub expected_price: Money,
}

/// Input to [`FulfillmentSaga::create_order_with_payment`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub customer_email: String,
    pub customer_name: String,
    pub items: Vec<OrderLine>,
    pub payment_method: PaymentMethod,
}

/// Result of a completed create-with-payment flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrderOutcome {
    pub order_id: OrderId,
    pub total: Money,
    pub status: OrderStatus,
    pub payment_id: PaymentId,
    pub payment_status: PaymentStatus,
    pub message: String,
}

/// What happened to the payment while canceling an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum PaymentCancellation {
    /// No payment id was supplied.
    NotRequested,
    /// The gateway canceled the payment.
    Canceled,
    /// The gateway could not cancel the payment; it needs out-of-band review.
    Failed { reason: String },
}

/// Result of the cancellation flow. `status` is always `canceled`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelOutcome {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub payment_cancellation: PaymentCancellation,
}

/// Products for the lines of one request, keyed by product id.
///
/// Placeholders for unknown ids are built while resolving but only written
/// once the whole request has been priced.
#[derive(Default)]
struct ResolvedProducts {
    products: HashMap<ProductId, Product>,
    placeholders: Vec<ProductId>,
}

/// Maps a payment verdict onto an order status.
pub fn order_status_for(payment: PaymentStatus) -> OrderStatus {
    match payment {
        PaymentStatus::Approved => OrderStatus::Paid,
        PaymentStatus::Declined => OrderStatus::Canceled,
        _ => OrderStatus::Pending,
    }
}

/// Orchestrates orders and payments.
///
/// Each flow runs its steps sequentially. Store writes are spawned onto
/// their own task, so dropping a flow's future while a write is in flight
/// never leaves an order half-written; gateway calls are bounded by
/// [`GatewayTimeouts`].
pub struct FulfillmentSaga<O, C, G>
where
    O: OrderStore + Clone + 'static,
    C: Catalog + Clone + 'static,
    G: PaymentGateway,
{
    orders: O,
    catalog: C,
    gateway: G,
    timeouts: GatewayTimeouts,
    observer: Arc<dyn SagaObserver>,
}

impl<O, C, G> FulfillmentSaga<O, C, G>
where
    O: OrderStore + Clone + 'static,
    C: Catalog + Clone + 'static,
    G: PaymentGateway,
{
    /// Creates a saga with default timeouts that reports to `tracing`.
    pub fn new(orders: O, catalog: C, gateway: G) -> Self {
        Self {
            orders,
            catalog,
            gateway,
            timeouts: GatewayTimeouts::default(),
            observer: Arc::new(TracingObserver),
        }
    }

    pub fn with_timeouts(mut self, timeouts: GatewayTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn SagaObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn timeouts(&self) -> GatewayTimeouts {
        self.timeouts
    }

    /// Builds, prices and charges a new order.
    ///
    /// Nothing is persisted if a line is invalid. Once the order is priced it
    /// is persisted before the gateway is called. A gateway failure leaves the
    /// order recorded as `payment_failed` and returns
    /// [`SagaError::PaymentFailed`]; a decline is not an error.
    #[tracing::instrument(skip(self, request), fields(items = request.items.len(), method = %request.payment_method))]
    pub async fn create_order_with_payment(
        &self,
        request: CreateOrderRequest,
    ) -> Result<CreateOrderOutcome> {
        metrics::counter!("saga_executions_total", "flow" => "create").increment(1);
        let saga_start = Instant::now();

        let result = self.run_create(request).await;

        match &result {
            Ok(outcome) => {
                metrics::counter!("saga_completed", "flow" => "create").increment(1);
                tracing::info!(
                    order_id = %outcome.order_id,
                    payment_id = %outcome.payment_id,
                    status = %outcome.status,
                    total = %outcome.total,
                    "order created with payment"
                );
            }
            Err(e) => {
                metrics::counter!("saga_failed", "flow" => "create").increment(1);
                tracing::error!(error = %e, "order creation failed");
            }
        }
        metrics::histogram!("saga_duration_seconds", "flow" => "create")
            .record(saga_start.elapsed().as_secs_f64());

        result
    }

    async fn run_create(&self, request: CreateOrderRequest) -> Result<CreateOrderOutcome> {
        if request.customer_email.trim().is_empty() {
            return Err(PaymentError::EmptyCustomerEmail.into());
        }

        // Building: every line is validated before anything is written.
        let mut resolved = self.resolve_products(&request.items).await?;
        let mut order = price_order(&request.items, &resolved.products)?;
        if self.persist_placeholders(&mut resolved).await? {
            order = price_order(&request.items, &resolved.products)?;
        }
        let order_id = order.id();
        let mut step = CreateStep::Building;
        self.step(order_id, step);

        // Priced
        self.persist_new(&mut order).await?;
        let total = order.total();
        step = self.advance(order_id, step, CreateStep::Priced);

        // PaymentRequested
        step = self.advance(order_id, step, CreateStep::PaymentRequested);
        let payment = PaymentRequest {
            order_id,
            amount: total,
            method: request.payment_method,
            customer_email: request.customer_email,
            customer_name: request.customer_name,
        };
        let receipt = match self.call_process(payment).await {
            Ok(receipt) => receipt,
            Err(source) => {
                order.mark_payment_failed();
                if let Err(e) = self.persist_update(&mut order).await {
                    tracing::error!(%order_id, error = %e, "could not record payment failure");
                }
                self.advance(order_id, step, CreateStep::PaymentFailed);
                return Err(SagaError::PaymentFailed { order_id, source });
            }
        };

        // Reconciled
        let status = order_status_for(receipt.status);
        order.transition_status(status)?;
        self.persist_update(&mut order).await?;
        self.advance(order_id, step, CreateStep::Reconciled);

        Ok(CreateOrderOutcome {
            order_id,
            total,
            status,
            payment_id: receipt.payment_id,
            payment_status: receipt.status,
            message: receipt.message,
        })
    }

    /// Cancels an order, asking the gateway to cancel its payment first.
    ///
    /// Only a missing order or a failed store write is returned as an error.
    /// A payment that could not be canceled is reported in the outcome and
    /// to the observer; the order is canceled regardless.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_order(
        &self,
        order_id: OrderId,
        payment_id: Option<PaymentId>,
        reason: Option<&str>,
    ) -> Result<CancelOutcome> {
        metrics::counter!("saga_executions_total", "flow" => "cancel").increment(1);
        let saga_start = Instant::now();

        let result = self.run_cancel(order_id, payment_id, reason).await;

        match &result {
            Ok(_) => metrics::counter!("saga_completed", "flow" => "cancel").increment(1),
            Err(_) => metrics::counter!("saga_failed", "flow" => "cancel").increment(1),
        }
        metrics::histogram!("saga_duration_seconds", "flow" => "cancel")
            .record(saga_start.elapsed().as_secs_f64());

        result
    }

    async fn run_cancel(
        &self,
        order_id: OrderId,
        payment_id: Option<PaymentId>,
        reason: Option<&str>,
    ) -> Result<CancelOutcome> {
        // Loaded
        let mut order = self
            .orders
            .find_by_id(order_id)
            .await?
            .ok_or(SagaError::OrderNotFound(order_id))?;
        let mut step = CancelStep::Loaded;
        self.step(order_id, step);

        // PaymentCancelRequested
        let payment_cancellation = match payment_id {
            None => PaymentCancellation::NotRequested,
            Some(payment_id) => {
                step = self.advance(order_id, step, CancelStep::PaymentCancelRequested);
                let reason = reason.unwrap_or(DEFAULT_CANCEL_REASON);
                let outcome = match self.call_cancel(payment_id, reason).await {
                    Ok(receipt) if receipt.success => PaymentCancellation::Canceled,
                    Ok(receipt) => PaymentCancellation::Failed {
                        reason: receipt.message,
                    },
                    Err(e) => PaymentCancellation::Failed {
                        reason: e.to_string(),
                    },
                };
                if let PaymentCancellation::Failed { reason } = &outcome {
                    metrics::counter!("saga_payment_cancel_failures_total").increment(1);
                    self.observer
                        .on_compensation_failure(order_id, payment_id, reason);
                }
                outcome
            }
        };

        // Finalized
        order.transition_status(OrderStatus::Canceled)?;
        self.persist_update(&mut order).await?;
        self.advance(order_id, step, CancelStep::Finalized);

        Ok(CancelOutcome {
            order_id,
            status: order.status(),
            payment_cancellation,
        })
    }

    /// Looks every line's product up, synthesizing a placeholder for each
    /// unknown id. Nothing is written.
    async fn resolve_products(&self, lines: &[OrderLine]) -> Result<ResolvedProducts> {
        let mut resolved = ResolvedProducts::default();

        for line in lines {
            if resolved.products.contains_key(&line.product_id) {
                continue;
            }
            let product = match self.catalog.find_product(&line.product_id).await? {
                Some(product) => product,
                None => {
                    resolved.placeholders.push(line.product_id.clone());
                    Product::placeholder(line.product_id.clone(), line.expected_price)?
                }
            };
            resolved.products.insert(line.product_id.clone(), product);
        }

        Ok(resolved)
    }

    /// Writes the placeholders of a priced request to the catalog.
    ///
    /// Returns true if another request created one of them first; the stored
    /// product then replaces ours and the order has to be repriced.
    async fn persist_placeholders(&self, resolved: &mut ResolvedProducts) -> Result<bool> {
        let mut replaced = false;

        for product_id in &resolved.placeholders {
            let Some(placeholder) = resolved.products.get(product_id).cloned() else {
                continue;
            };
            tracing::info!(%product_id, price = %placeholder.price, "creating placeholder product");

            let catalog = self.catalog.clone();
            let created = detached(async move {
                match catalog.create_product(&placeholder).await {
                    Ok(()) => Ok(true),
                    Err(StoreError::AlreadyExists { .. }) => Ok(false),
                    Err(e) => Err(e),
                }
            })
            .await?;

            if !created {
                let stored = self
                    .catalog
                    .find_product(product_id)
                    .await?
                    .ok_or_else(|| StoreError::not_found("product", product_id))?;
                resolved.products.insert(product_id.clone(), stored);
                replaced = true;
            }
        }

        Ok(replaced)
    }

    async fn call_process(
        &self,
        request: PaymentRequest,
    ) -> std::result::Result<crate::gateway::PaymentReceipt, GatewayError> {
        let limit = self.timeouts.process;
        tokio::time::timeout(limit, self.gateway.process_payment(request))
            .await
            .unwrap_or(Err(GatewayError::Timeout(limit)))
    }

    async fn call_cancel(
        &self,
        payment_id: PaymentId,
        reason: &str,
    ) -> std::result::Result<crate::gateway::CancellationReceipt, GatewayError> {
        let limit = self.timeouts.cancel;
        tokio::time::timeout(limit, self.gateway.cancel_payment(payment_id, reason))
            .await
            .unwrap_or(Err(GatewayError::Timeout(limit)))
    }

    async fn persist_new(&self, order: &mut Order) -> Result<()> {
        let orders = self.orders.clone();
        let snapshot = order.clone();
        let version = detached(async move { orders.create(&snapshot).await }).await?;
        order.set_version(version);
        Ok(())
    }

    async fn persist_update(&self, order: &mut Order) -> Result<()> {
        let orders = self.orders.clone();
        let snapshot = order.clone();
        let version = detached(async move { orders.update(&snapshot).await }).await?;
        order.set_version(version);
        Ok(())
    }

    fn step(&self, order_id: OrderId, step: impl Into<SagaStep>) {
        self.observer.on_step(order_id, step.into());
    }

    /// Reports `to`, which must be a legal successor of `from`.
    fn advance<S: Into<SagaStep> + Copy>(&self, order_id: OrderId, from: S, to: S) -> S {
        let (prev, next) = (from.into(), to.into());
        debug_assert!(prev.can_advance_to(next), "illegal saga step {prev} -> {next}");
        self.step(order_id, to);
        to
    }
}

/// Builds an order from resolved products. Fails on the first invalid line
/// or an empty request.
fn price_order(lines: &[OrderLine], products: &HashMap<ProductId, Product>) -> Result<Order> {
    let mut order = Order::new();
    for line in lines {
        order.add_item(&line.product_id, products.get(&line.product_id), line.quantity)?;
    }
    order.prepare_for_payment()?;
    Ok(order)
}

/// Runs a store write on its own task so it completes even if the caller's
/// future is dropped.
async fn detached<T, F>(write: F) -> Result<T>
where
    F: Future<Output = std::result::Result<T, StoreError>> + Send + 'static,
    T: Send + 'static,
{
    tokio::spawn(write)
        .await
        .map_err(|e| SagaError::WriteAborted(e.to_string()))?
        .map_err(SagaError::from)
}
