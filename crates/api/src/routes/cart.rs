//! Shopping cart endpoints. A cart is a `pending` order being assembled.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{ItemId, OrderId};
use domain::ProductId;
use serde::{Deserialize, Serialize};

use super::orders::OrderResponse;
use super::parse_id;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct AddItemRequest {
    pub product_id: String,
    pub quantity: u32,
}

#[derive(Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: u32,
}

#[derive(Serialize)]
pub struct CartTotalResponse {
    pub order_id: OrderId,
    pub item_count: usize,
    pub total_quantity: u32,
    pub total_cents: i64,
    pub total: String,
}

/// POST /cart
#[tracing::instrument(skip(state))]
pub async fn create(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let cart = state.carts.create_cart().await?;
    Ok((StatusCode::CREATED, Json(OrderResponse::from(&cart))))
}

/// GET /cart/{id}
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let cart = state.carts.get_cart(parse_id("cart", &id)?).await?;
    Ok(Json(OrderResponse::from(&cart)))
}

/// POST /cart/{id}/items
#[tracing::instrument(skip(state, req))]
pub async fn add_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<AddItemRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let cart = state
        .carts
        .add_item(
            parse_id("cart", &id)?,
            ProductId::new(req.product_id),
            req.quantity,
        )
        .await?;
    Ok(Json(OrderResponse::from(&cart)))
}

/// PUT /cart/{id}/items/{item_id}
#[tracing::instrument(skip(state, req))]
pub async fn update_item(
    State(state): State<Arc<AppState>>,
    Path((id, item_id)): Path<(String, String)>,
    Json(req): Json<UpdateQuantityRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let item_id: ItemId = parse_id("item", &item_id)?;
    let cart = state
        .carts
        .update_item_quantity(parse_id("cart", &id)?, item_id, req.quantity)
        .await?;
    Ok(Json(OrderResponse::from(&cart)))
}

/// DELETE /cart/{id}/items/{item_id}
#[tracing::instrument(skip(state))]
pub async fn remove_item(
    State(state): State<Arc<AppState>>,
    Path((id, item_id)): Path<(String, String)>,
) -> Result<Json<OrderResponse>, ApiError> {
    let item_id: ItemId = parse_id("item", &item_id)?;
    let cart = state
        .carts
        .remove_item(parse_id("cart", &id)?, item_id)
        .await?;
    Ok(Json(OrderResponse::from(&cart)))
}

/// GET /cart/{id}/calculate: the amount checkout would charge.
#[tracing::instrument(skip(state))]
pub async fn calculate(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CartTotalResponse>, ApiError> {
    let (cart, total) = state.carts.calculate_total(parse_id("cart", &id)?).await?;
    Ok(Json(CartTotalResponse {
        order_id: cart.id(),
        item_count: cart.item_count(),
        total_quantity: cart.total_quantity(),
        total_cents: total.cents(),
        total: total.to_string(),
    }))
}
