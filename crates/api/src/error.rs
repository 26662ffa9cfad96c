//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{DomainError, OrderError, PaymentError, ProductError, StoreError};
use saga::SagaError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client.
    BadRequest(String),
    /// Application service error.
    Domain(DomainError),
    /// Saga execution error.
    Saga(SagaError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = serde_json::Map::new();

        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Domain(err) => (domain_status(&err), err.to_string()),
            ApiError::Saga(err) => {
                // The order was recorded before the gateway failed.
                if let SagaError::PaymentFailed { order_id, .. } = &err {
                    body.insert("order_id".into(), order_id.to_string().into());
                }
                (saga_status(&err), err.to_string())
            }
        };

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %message, "request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %message, "request rejected");
        }
        metrics::counter!("api_errors_total", "status" => status.as_u16().to_string())
            .increment(1);

        body.insert("error".into(), message.into());
        (status, axum::Json(serde_json::Value::Object(body))).into_response()
    }
}

fn domain_status(err: &DomainError) -> StatusCode {
    match err {
        DomainError::Order(e) => order_status(e),
        DomainError::Product(e) => product_status(e),
        DomainError::Payment(e) => payment_status(e),
        DomainError::Store(e) => store_status(e),
        DomainError::OrderNotFound(_)
        | DomainError::ProductNotFound(_)
        | DomainError::PaymentNotFound(_) => StatusCode::NOT_FOUND,
    }
}

fn saga_status(err: &SagaError) -> StatusCode {
    match err {
        SagaError::OrderNotFound(_) => StatusCode::NOT_FOUND,
        SagaError::Order(e) => order_status(e),
        SagaError::Payment(e) => payment_status(e),
        SagaError::Product(e) => product_status(e),
        SagaError::Store(e) => store_status(e),
        SagaError::PaymentFailed { .. } => StatusCode::BAD_GATEWAY,
        SagaError::WriteAborted(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn order_status(err: &OrderError) -> StatusCode {
    match err {
        OrderError::ItemNotFound { .. } => StatusCode::NOT_FOUND,
        _ => StatusCode::BAD_REQUEST,
    }
}

fn product_status(err: &ProductError) -> StatusCode {
    match err {
        ProductError::InsufficientStock { .. } => StatusCode::CONFLICT,
        _ => StatusCode::BAD_REQUEST,
    }
}

fn payment_status(err: &PaymentError) -> StatusCode {
    match err {
        PaymentError::InvalidTransition { .. } | PaymentError::PaymentCannotBeCanceled { .. } => {
            StatusCode::CONFLICT
        }
        _ => StatusCode::BAD_REQUEST,
    }
}

fn store_status(err: &StoreError) -> StatusCode {
    match err {
        StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
        StoreError::AlreadyExists { .. } | StoreError::ConcurrencyConflict { .. } => {
            StatusCode::CONFLICT
        }
        StoreError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

impl From<SagaError> for ApiError {
    fn from(err: SagaError) -> Self {
        ApiError::Saga(err)
    }
}

#[cfg(test)]
mod tests {
    use common::{OrderId, Version};
    use domain::PaymentStatus;
    use saga::GatewayError;

    use super::*;

    #[test]
    fn test_domain_statuses() {
        assert_eq!(
            domain_status(&DomainError::OrderNotFound(OrderId::new())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            domain_status(&OrderError::EmptyOrder.into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            domain_status(
                &PaymentError::PaymentCannotBeCanceled {
                    status: PaymentStatus::Approved
                }
                .into()
            ),
            StatusCode::CONFLICT
        );
        assert_eq!(
            domain_status(
                &StoreError::ConcurrencyConflict {
                    entity: "order",
                    id: "x".to_string(),
                    expected: Version::first(),
                    actual: Version::first().next(),
                }
                .into()
            ),
            StatusCode::CONFLICT
        );
        assert_eq!(
            domain_status(&StoreError::Backend("down".to_string()).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_saga_statuses() {
        assert_eq!(
            saga_status(&SagaError::PaymentFailed {
                order_id: OrderId::new(),
                source: GatewayError::Transport("refused".to_string()),
            }),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            saga_status(&SagaError::Order(OrderError::InvalidQuantity { quantity: 0 })),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            saga_status(&SagaError::OrderNotFound(OrderId::new())),
            StatusCode::NOT_FOUND
        );
    }
}
