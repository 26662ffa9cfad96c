//! Domain layer for order fulfillment.
//!
//! This crate provides:
//! - Order aggregate with line items and a derived total
//! - Payment aggregate with its status state machine
//! - Product catalog entries
//! - Store traits with in-memory implementations
//! - Application services for carts, orders, the catalog and payments

pub mod error;
pub mod money;
pub mod order;
pub mod payment;
pub mod product;
pub mod store;

pub use error::DomainError;
pub use money::Money;
pub use order::{CartService, LineItem, Order, OrderError, OrderService, OrderStatus};
pub use payment::{
    ApprovalPolicy, Payment, PaymentError, PaymentMethod, PaymentRecord,
    PaymentService, PaymentStatus,
};
pub use product::{CatalogService, Product, ProductError, ProductId, ProductInput};
pub use store::{Catalog, OrderStore, PaymentStore, StoreError};
