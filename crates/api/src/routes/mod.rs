//! HTTP route handlers.

pub mod cart;
pub mod orders;
pub mod payments;
pub mod products;
pub mod system;

use std::fmt::Display;
use std::str::FromStr;

use crate::error::ApiError;

/// Parses a path identifier, reporting `kind` in the error.
pub(crate) fn parse_id<T>(kind: &str, raw: &str) -> Result<T, ApiError>
where
    T: FromStr,
    T::Err: Display,
{
    raw.parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid {kind} ID '{raw}': {e}")))
}
