//! Payment lookup and refund endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use chrono::{DateTime, Utc};
use common::{OrderId, PaymentId};
use domain::{Payment, PaymentMethod, PaymentStatus};
use serde::Serialize;

use super::parse_id;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct PaymentResponse {
    pub id: PaymentId,
    pub order_id: OrderId,
    pub amount_cents: i64,
    pub amount: String,
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

impl From<&Payment> for PaymentResponse {
    fn from(p: &Payment) -> Self {
        Self {
            id: p.id(),
            order_id: p.order_id(),
            amount_cents: p.amount().cents(),
            amount: p.amount().to_string(),
            method: p.method(),
            status: p.status(),
            transaction_id: p.transaction_id().map(str::to_string),
            customer_email: p.customer_email().to_string(),
            customer_name: p.customer_name().to_string(),
            created_at: p.created_at(),
            updated_at: p.updated_at(),
            canceled_at: p.canceled_at(),
            cancel_reason: p.cancel_reason().map(str::to_string),
        }
    }
}

/// GET /payments/{id}
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<PaymentResponse>, ApiError> {
    let payment = state.payments.get_payment(parse_id("payment", &id)?).await?;
    Ok(Json(PaymentResponse::from(&payment)))
}

/// POST /payments/{id}/refund
#[tracing::instrument(skip(state))]
pub async fn refund(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<PaymentResponse>, ApiError> {
    let payment = state
        .payments
        .refund_payment(parse_id("payment", &id)?)
        .await?;
    Ok(Json(PaymentResponse::from(&payment)))
}
