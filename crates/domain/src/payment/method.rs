//! Payment methods.

use serde::{Deserialize, Serialize};

use super::PaymentError;

/// The closed set of accepted payment methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CreditCard,
    DebitCard,
    Pix,
    Boleto,
    Paypal,
}

impl PaymentMethod {
    /// Resolves a wire code (1 through 5) to a method.
    pub fn from_code(code: i32) -> Result<Self, PaymentError> {
        match code {
            1 => Ok(PaymentMethod::CreditCard),
            2 => Ok(PaymentMethod::DebitCard),
            3 => Ok(PaymentMethod::Pix),
            4 => Ok(PaymentMethod::Boleto),
            5 => Ok(PaymentMethod::Paypal),
            other => Err(PaymentError::InvalidPaymentMethod {
                method: other.to_string(),
            }),
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            PaymentMethod::CreditCard => 1,
            PaymentMethod::DebitCard => 2,
            PaymentMethod::Pix => 3,
            PaymentMethod::Boleto => 4,
            PaymentMethod::Paypal => 5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::CreditCard => "credit_card",
            PaymentMethod::DebitCard => "debit_card",
            PaymentMethod::Pix => "pix",
            PaymentMethod::Boleto => "boleto",
            PaymentMethod::Paypal => "paypal",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "credit_card" => Ok(PaymentMethod::CreditCard),
            "debit_card" => Ok(PaymentMethod::DebitCard),
            "pix" => Ok(PaymentMethod::Pix),
            "boleto" => Ok(PaymentMethod::Boleto),
            "paypal" => Ok(PaymentMethod::Paypal),
            other => Err(PaymentError::InvalidPaymentMethod {
                method: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_map_to_methods() {
        assert_eq!(PaymentMethod::from_code(1).unwrap(), PaymentMethod::CreditCard);
        assert_eq!(PaymentMethod::from_code(3).unwrap(), PaymentMethod::Pix);
        assert_eq!(PaymentMethod::from_code(5).unwrap(), PaymentMethod::Paypal);
        assert_eq!(PaymentMethod::Boleto.code(), 4);
    }

    #[test]
    fn test_unknown_code_fails() {
        for code in [0, 6, -1] {
            assert!(matches!(
                PaymentMethod::from_code(code),
                Err(PaymentError::InvalidPaymentMethod { .. })
            ));
        }
    }

    #[test]
    fn test_parse_names() {
        assert_eq!(
            "debit_card".parse::<PaymentMethod>().unwrap(),
            PaymentMethod::DebitCard
        );
        assert!("cash".parse::<PaymentMethod>().is_err());
    }
}
