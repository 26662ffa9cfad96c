//! HTTP API server for orders, payments and the fulfillment saga.
//!
//! Provides REST endpoints for the catalog, carts, order administration and
//! the create-with-payment / cancel flows, with structured logging (tracing)
//! and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, patch, post, put};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::{cart, orders, payments, products, system};
pub use state::{AppState, Stores};

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(system::metrics))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(system::health))
        .route("/products", get(products::list).post(products::create))
        .route(
            "/products/{id}",
            get(products::get)
                .put(products::update)
                .delete(products::delete),
        )
        .route("/cart", post(cart::create))
        .route("/cart/{id}", get(cart::get))
        .route("/cart/{id}/items", post(cart::add_item))
        .route(
            "/cart/{id}/items/{item_id}",
            put(cart::update_item).delete(cart::remove_item),
        )
        .route("/cart/{id}/calculate", get(cart::calculate))
        .route("/orders", get(orders::list))
        .route("/orders/with-payment", post(orders::create_with_payment))
        .route("/orders/{id}", get(orders::get).delete(orders::delete))
        .route("/orders/{id}/status", patch(orders::update_status))
        .route("/orders/{id}/cancel", post(orders::cancel))
        .route("/orders/{id}/payments", get(orders::payments))
        .route("/payments/{id}", get(payments::get))
        .route("/payments/{id}/refund", post(payments::refund))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates application state over process-local stores.
pub fn create_in_memory_state(config: &config::Config) -> Arc<AppState> {
    Arc::new(AppState::new(Stores::in_memory(), config))
}
