//! Application configuration loaded from environment variables.

use std::time::Duration;

use domain::{ApprovalPolicy, Money};
use saga::GatewayTimeouts;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `DATABASE_URL`: PostgreSQL URL; in-memory stores are used when unset
/// - `PAYMENT_TIMEOUT_SECS`: deadline for a charge (default: `10`)
/// - `CANCEL_TIMEOUT_SECS`: deadline for a payment cancellation (default: `5`)
/// - `PAYMENT_DECLINE_THRESHOLD_CENTS`: charges at or above this are declined
///   (default: `1000000`)
///
/// Unparseable numeric values fall back to their defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub payment_timeout: Duration,
    pub cancel_timeout: Duration,
    pub decline_threshold: Money,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let number = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());

        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            payment_timeout: number("PAYMENT_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.payment_timeout),
            cancel_timeout: number("CANCEL_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.cancel_timeout),
            decline_threshold: lookup("PAYMENT_DECLINE_THRESHOLD_CENTS")
                .and_then(|v| v.trim().parse::<i64>().ok())
                .filter(|cents| *cents > 0)
                .map(Money::from_cents)
                .unwrap_or(defaults.decline_threshold),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn gateway_timeouts(&self) -> GatewayTimeouts {
        GatewayTimeouts {
            process: self.payment_timeout,
            cancel: self.cancel_timeout,
        }
    }

    pub fn approval_policy(&self) -> ApprovalPolicy {
        ApprovalPolicy::new(self.decline_threshold)
    }
}

impl Default for Config {
    fn default() -> Self {
        let timeouts = GatewayTimeouts::default();
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            database_url: None,
            payment_timeout: timeouts.process,
            cancel_timeout: timeouts.cancel,
            decline_threshold: ApprovalPolicy::DEFAULT_DECLINE_THRESHOLD,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_level, "info");
        assert!(config.database_url.is_none());
        assert_eq!(config.payment_timeout, Duration::from_secs(10));
        assert_eq!(config.cancel_timeout, Duration::from_secs(5));
        assert_eq!(config.decline_threshold.cents(), 1_000_000);
    }

    #[test]
    fn test_empty_environment_uses_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.addr(), "0.0.0.0:3000");
        assert_eq!(config.gateway_timeouts(), GatewayTimeouts::default());
    }

    #[test]
    fn test_reads_overrides() {
        let config = config_from(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("DATABASE_URL", "postgres://localhost/orders"),
            ("PAYMENT_TIMEOUT_SECS", "3"),
            ("CANCEL_TIMEOUT_SECS", "1"),
            ("PAYMENT_DECLINE_THRESHOLD_CENTS", "50000"),
        ]);

        assert_eq!(config.addr(), "127.0.0.1:8080");
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/orders"));
        assert_eq!(config.gateway_timeouts().process, Duration::from_secs(3));
        assert_eq!(config.gateway_timeouts().cancel, Duration::from_secs(1));
        assert!(!config.approval_policy().approves(Money::from_cents(50_000)));
        assert!(config.approval_policy().approves(Money::from_cents(49_999)));
    }

    #[test]
    fn test_invalid_numbers_fall_back() {
        let config = config_from(&[
            ("PORT", "http"),
            ("PAYMENT_TIMEOUT_SECS", "soon"),
            ("PAYMENT_DECLINE_THRESHOLD_CENTS", "-5"),
            ("DATABASE_URL", "  "),
        ]);

        assert_eq!(config.port, 3000);
        assert_eq!(config.payment_timeout, Duration::from_secs(10));
        assert_eq!(config.decline_threshold.cents(), 1_000_000);
        assert!(config.database_url.is_none());
    }
}
