//! Shared identifiers and versioning used by every layer.

mod types;
mod version;

pub use types::{ItemId, OrderId, PaymentId};
pub use version::Version;
