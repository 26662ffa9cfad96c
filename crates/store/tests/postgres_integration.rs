//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container and need a running Docker
//! daemon, so they are ignored by default. Run with:
//!
//! ```bash
//! cargo test -p store --test postgres_integration -- --ignored
//! ```

use std::sync::Arc;

use common::{OrderId, Version};
use domain::{
    Catalog, Money, Order, OrderStatus, OrderStore, Payment, PaymentMethod, PaymentStatus,
    PaymentStore, Product, ProductId, StoreError,
};
use serial_test::serial;
use sqlx::PgPool;
use store::{PostgresCatalog, PostgresOrderStore, PostgresPaymentStore};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            store::run_migrations(&temp_pool).await.unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh pool with cleared tables
async fn get_test_pool() -> PgPool {
    let info = get_container_info().await;
    let pool = store::connect(&info.connection_string, 5).await.unwrap();

    sqlx::query("TRUNCATE TABLE order_items, orders, payments, products")
        .execute(&pool)
        .await
        .unwrap();

    pool
}

fn product(id: &str, cents: i64) -> Product {
    Product::placeholder(ProductId::new(id), Money::from_cents(cents)).unwrap()
}

fn order_with(products: &[(&Product, u32)]) -> Order {
    let mut order = Order::new();
    for (product, qty) in products {
        order.add_item(&product.id, Some(product), *qty).unwrap();
    }
    order
}

#[tokio::test]
#[serial]
#[ignore = "requires Docker"]
async fn order_roundtrip_preserves_items_and_total() {
    let orders = PostgresOrderStore::new(get_test_pool().await);
    let x = product("X", 10_000);
    let y = product("Y", 5_000);
    let order = order_with(&[(&x, 2), (&y, 1)]);

    assert_eq!(orders.create(&order).await.unwrap(), Version::first());

    let loaded = orders.find_by_id(order.id()).await.unwrap().unwrap();
    assert_eq!(loaded.version(), Version::first());
    assert_eq!(loaded.total().to_string(), "250.00");
    assert_eq!(loaded.items().len(), 2);
    assert_eq!(loaded.items()[0].product_id, x.id);
    assert_eq!(loaded.items()[1].product_id, y.id);
    assert_eq!(loaded.status(), OrderStatus::Pending);
}

#[tokio::test]
#[serial]
#[ignore = "requires Docker"]
async fn order_update_replaces_items_and_bumps_version() {
    let orders = PostgresOrderStore::new(get_test_pool().await);
    let x = product("X", 1_000);
    let y = product("Y", 500);
    let mut order = order_with(&[(&x, 1)]);
    order.set_version(orders.create(&order).await.unwrap());

    let first_line = order.items()[0].id;
    order.remove_item(first_line).unwrap();
    order.add_item(&y.id, Some(&y), 3).unwrap();
    order.transition_status(OrderStatus::Paid).unwrap();

    let version = orders.update(&order).await.unwrap();
    assert_eq!(version, Version::new(2));

    let loaded = orders.find_by_id(order.id()).await.unwrap().unwrap();
    assert_eq!(loaded.items().len(), 1);
    assert_eq!(loaded.items()[0].product_id, y.id);
    assert_eq!(loaded.total().cents(), 1_500);
    assert_eq!(loaded.status(), OrderStatus::Paid);
}

#[tokio::test]
#[serial]
#[ignore = "requires Docker"]
async fn order_update_with_stale_version_conflicts() {
    let orders = PostgresOrderStore::new(get_test_pool().await);
    let mut order = order_with(&[(&product("X", 1_000), 1)]);
    order.set_version(orders.create(&order).await.unwrap());

    let mut stale = order.clone();
    order.mark_payment_failed();
    orders.update(&order).await.unwrap();

    stale.transition_status(OrderStatus::Canceled).unwrap();
    let result = orders.update(&stale).await;
    assert!(matches!(
        result,
        Err(StoreError::ConcurrencyConflict { actual, .. }) if actual == Version::new(2)
    ));

    let loaded = orders.find_by_id(order.id()).await.unwrap().unwrap();
    assert_eq!(loaded.status(), OrderStatus::PaymentFailed);
}

#[tokio::test]
#[serial]
#[ignore = "requires Docker"]
async fn order_missing_and_delete() {
    let orders = PostgresOrderStore::new(get_test_pool().await);
    assert!(orders.find_by_id(OrderId::new()).await.unwrap().is_none());
    assert!(matches!(
        orders.update(&Order::new()).await,
        Err(StoreError::NotFound { .. })
    ));

    let order = order_with(&[(&product("X", 1_000), 1)]);
    orders.create(&order).await.unwrap();
    assert!(matches!(
        orders.create(&order).await,
        Err(StoreError::AlreadyExists { .. })
    ));

    orders.delete(order.id()).await.unwrap();
    assert!(orders.find_by_id(order.id()).await.unwrap().is_none());
    assert!(orders.find_all().await.unwrap().is_empty());
    assert!(orders.delete(order.id()).await.is_err());
}

#[tokio::test]
#[serial]
#[ignore = "requires Docker"]
async fn payment_roundtrip_and_cancel() {
    let payments = PostgresPaymentStore::new(get_test_pool().await);
    let order_id = OrderId::new();
    let mut payment = Payment::new(
        order_id,
        Money::from_cents(25_000),
        PaymentMethod::Paypal,
        "jane@example.com",
        "Jane",
    )
    .unwrap();
    payment.mark_processing("txn-1").unwrap();
    payment.decline().unwrap();
    payment.set_version(payments.create(&payment).await.unwrap());

    payment.cancel("customer request").unwrap();
    payment.set_version(payments.update(&payment).await.unwrap());

    let loaded = payments.find_by_id(payment.id()).await.unwrap().unwrap();
    assert_eq!(loaded.status(), PaymentStatus::Canceled);
    assert_eq!(loaded.method(), PaymentMethod::Paypal);
    assert_eq!(loaded.transaction_id(), Some("txn-1"));
    assert_eq!(loaded.cancel_reason(), Some("customer request"));
    assert!(loaded.canceled_at().is_some());
    assert_eq!(loaded.version(), Version::new(2));

    let for_order = payments.find_by_order_id(order_id).await.unwrap();
    assert_eq!(for_order.len(), 1);
}

#[tokio::test]
#[serial]
#[ignore = "requires Docker"]
async fn catalog_crud() {
    let catalog = PostgresCatalog::new(get_test_pool().await);
    let mut widget = Product::new("Widget", "A widget", Money::from_cents(1_000), 3).unwrap();

    catalog.create_product(&widget).await.unwrap();
    assert!(matches!(
        catalog.create_product(&widget).await,
        Err(StoreError::AlreadyExists { .. })
    ));

    widget.update_stock(2).unwrap();
    catalog.update_product(&widget).await.unwrap();
    let loaded = catalog.find_product(&widget.id).await.unwrap().unwrap();
    assert_eq!(loaded.stock, 5);
    assert_eq!(loaded.description, "A widget");

    assert_eq!(catalog.list_products().await.unwrap().len(), 1);
    catalog.delete_product(&widget.id).await.unwrap();
    assert!(catalog.find_product(&widget.id).await.unwrap().is_none());
}
