//! Order administration and fulfillment saga endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{ItemId, OrderId, PaymentId};
use domain::{
    DomainError, LineItem, Money, Order, OrderStatus, PaymentMethod, PaymentStatus, ProductId,
};
use saga::{CancelOutcome, CreateOrderRequest, OrderLine};
use serde::{Deserialize, Serialize};

use super::parse_id;
use super::payments::PaymentResponse;
use crate::error::ApiError;
use crate::state::AppState;

// -- Request types --

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Deserialize)]
pub struct CreateWithPaymentRequest {
    pub customer_email: String,
    #[serde(default)]
    pub customer_name: String,
    /// Wire code: 1 credit card, 2 debit card, 3 pix, 4 boleto, 5 paypal.
    pub payment_method: i32,
    pub items: Vec<OrderLineRequest>,
}

#[derive(Deserialize)]
pub struct OrderLineRequest {
    pub product_id: String,
    pub quantity: u32,
    /// Used only if the product is not in the catalog yet.
    pub price_cents: i64,
}

#[derive(Deserialize, Default)]
pub struct CancelOrderRequest {
    pub payment_id: Option<String>,
    pub reason: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
pub struct LineItemResponse {
    pub id: ItemId,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub total_cents: i64,
}

impl From<&LineItem> for LineItemResponse {
    fn from(item: &LineItem) -> Self {
        Self {
            id: item.id,
            product_id: item.product_id.clone(),
            product_name: item.product_name.clone(),
            quantity: item.quantity,
            unit_price_cents: item.unit_price.cents(),
            total_cents: item.total.cents(),
        }
    }
}

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: OrderId,
    pub status: OrderStatus,
    pub items: Vec<LineItemResponse>,
    pub total_cents: i64,
    pub total: String,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id(),
            status: order.status(),
            items: order.items().iter().map(LineItemResponse::from).collect(),
            total_cents: order.total().cents(),
            total: order.total().to_string(),
            version: order.version().as_i64(),
            created_at: order.created_at(),
            updated_at: order.updated_at(),
        }
    }
}

#[derive(Serialize)]
pub struct CreateWithPaymentResponse {
    pub order_id: OrderId,
    pub total_cents: i64,
    pub total: String,
    pub status: OrderStatus,
    pub payment_id: PaymentId,
    pub payment_status: PaymentStatus,
    pub message: String,
}

// -- Handlers --

/// GET /orders
#[tracing::instrument(skip(state))]
pub async fn list(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state.orders.list_orders().await?;
    Ok(Json(orders.iter().map(OrderResponse::from).collect()))
}

/// GET /orders/{id}
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state.orders.get_order(parse_id("order", &id)?).await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// PATCH /orders/{id}/status
#[tracing::instrument(skip(state, req))]
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state
        .orders
        .update_status(parse_id("order", &id)?, &req.status)
        .await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// DELETE /orders/{id}
#[tracing::instrument(skip(state))]
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.orders.delete_order(parse_id("order", &id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /orders/with-payment: build, price and charge a new order.
///
/// A declined payment still answers 201 with a `canceled` order. A gateway
/// failure answers 502 and carries the id of the `payment_failed` order.
#[tracing::instrument(skip(state, req), fields(items = req.items.len()))]
pub async fn create_with_payment(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateWithPaymentRequest>,
) -> Result<(StatusCode, Json<CreateWithPaymentResponse>), ApiError> {
    let payment_method = PaymentMethod::from_code(req.payment_method).map_err(DomainError::from)?;

    let request = CreateOrderRequest {
        customer_email: req.customer_email,
        customer_name: req.customer_name,
        payment_method,
        items: req
            .items
            .into_iter()
            .map(|line| OrderLine {
                product_id: ProductId::new(line.product_id),
                quantity: line.quantity,
                expected_price: Money::from_cents(line.price_cents),
            })
            .collect(),
    };

    let outcome = state.saga.create_order_with_payment(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateWithPaymentResponse {
            order_id: outcome.order_id,
            total_cents: outcome.total.cents(),
            total: outcome.total.to_string(),
            status: outcome.status,
            payment_id: outcome.payment_id,
            payment_status: outcome.payment_status,
            message: outcome.message,
        }),
    ))
}

/// POST /orders/{id}/cancel
///
/// The order always ends `canceled`; whether its payment was canceled too is
/// reported in `payment_cancellation`.
#[tracing::instrument(skip(state, req))]
pub async fn cancel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<CancelOrderRequest>,
) -> Result<Json<CancelOutcome>, ApiError> {
    let order_id: OrderId = parse_id("order", &id)?;
    let payment_id: Option<PaymentId> = req
        .payment_id
        .as_deref()
        .map(|raw| parse_id("payment", raw))
        .transpose()?;

    let outcome = state
        .saga
        .cancel_order(order_id, payment_id, req.reason.as_deref())
        .await?;
    Ok(Json(outcome))
}

/// GET /orders/{id}/payments
#[tracing::instrument(skip(state))]
pub async fn payments(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<PaymentResponse>>, ApiError> {
    let payments = state.payments.list_payments(parse_id("order", &id)?).await?;
    Ok(Json(payments.iter().map(PaymentResponse::from).collect()))
}
