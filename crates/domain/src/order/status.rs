//! Order status.

use serde::{Deserialize, Serialize};

use super::OrderError;

/// The status of an order in its lifecycle.
///
/// Any client-assignable status is reachable from any other; the order does
/// not enforce adjacency. `PaymentFailed` is only ever set by the fulfillment
/// saga when the payment gateway could not be reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Order created or awaiting a payment verdict.
    #[default]
    Pending,

    /// Payment approved.
    Paid,

    /// Order canceled, either by the customer or by a declined payment.
    Canceled,

    /// Order delivered.
    Completed,

    /// The payment call failed before a verdict was obtained.
    PaymentFailed,
}

impl OrderStatus {
    /// Statuses a client may assign through `Order::transition_status`.
    pub const ASSIGNABLE: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::Paid,
        OrderStatus::Canceled,
        OrderStatus::Completed,
    ];

    /// Returns true if clients may set this status directly.
    pub fn is_assignable(&self) -> bool {
        Self::ASSIGNABLE.contains(self)
    }

    /// Returns the status name as stored and shown on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Canceled => "canceled",
            OrderStatus::Completed => "completed",
            OrderStatus::PaymentFailed => "payment_failed",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "paid" => Ok(OrderStatus::Paid),
            "canceled" => Ok(OrderStatus::Canceled),
            "completed" => Ok(OrderStatus::Completed),
            "payment_failed" => Ok(OrderStatus::PaymentFailed),
            other => Err(OrderError::InvalidOrderStatus {
                status: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_status_is_pending() {
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
    }

    #[test]
    fn test_assignable() {
        for status in OrderStatus::ASSIGNABLE {
            assert!(status.is_assignable());
        }
        assert!(!OrderStatus::PaymentFailed.is_assignable());
    }

    #[test]
    fn test_parse_roundtrip() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Paid,
            OrderStatus::Canceled,
            OrderStatus::Completed,
            OrderStatus::PaymentFailed,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_parse_unknown_fails() {
        let result = "shipped".parse::<OrderStatus>();
        assert!(matches!(
            result,
            Err(OrderError::InvalidOrderStatus { status }) if status == "shipped"
        ));
    }

    #[test]
    fn test_serialization_uses_snake_case() {
        let json = serde_json::to_string(&OrderStatus::PaymentFailed).unwrap();
        assert_eq!(json, "\"payment_failed\"");
    }
}
