//! Integration tests for the order, catalog and payment services.
//!
//! These tests exercise the services together over the in-memory stores,
//! covering the cart lifecycle, persistence round trips and optimistic
//! concurrency on concurrent writers.

use std::sync::Arc;

use domain::store::{InMemoryCatalog, InMemoryOrderStore, InMemoryPaymentStore};
use domain::{
    CartService, CatalogService, DomainError, Money, OrderError, OrderService, OrderStatus,
    OrderStore, PaymentMethod, PaymentService, PaymentStatus, ProductInput, StoreError,
};

struct Fixture {
    orders: InMemoryOrderStore,
    cart: CartService<InMemoryOrderStore, InMemoryCatalog>,
    admin: OrderService<InMemoryOrderStore>,
    catalog: CatalogService<InMemoryCatalog>,
}

fn fixture() -> Fixture {
    let orders = InMemoryOrderStore::new();
    let catalog = InMemoryCatalog::new();
    Fixture {
        cart: CartService::new(orders.clone(), catalog.clone()),
        admin: OrderService::new(orders.clone()),
        catalog: CatalogService::new(catalog),
        orders,
    }
}

fn product(name: &str, cents: i64) -> ProductInput {
    ProductInput {
        name: name.to_string(),
        description: String::new(),
        price: Money::from_cents(cents),
        stock: 10,
    }
}

mod cart_lifecycle {
    use super::*;

    #[tokio::test]
    async fn fill_checkout_and_complete() {
        let f = fixture();
        let x = f.catalog.create_product(product("X", 10_000)).await.unwrap();
        let y = f.catalog.create_product(product("Y", 5_000)).await.unwrap();

        let cart = f.cart.create_cart().await.unwrap();
        f.cart.add_item(cart.id(), x.id.clone(), 1).await.unwrap();
        f.cart.add_item(cart.id(), y.id.clone(), 1).await.unwrap();
        f.cart.add_item(cart.id(), x.id.clone(), 1).await.unwrap();

        let (order, total) = f.cart.calculate_total(cart.id()).await.unwrap();
        assert_eq!(order.item_count(), 2);
        assert_eq!(total.to_string(), "250.00");

        let order = f.admin.update_status(cart.id(), "paid").await.unwrap();
        assert_eq!(order.status(), OrderStatus::Paid);
        let order = f.admin.update_status(cart.id(), "completed").await.unwrap();
        assert_eq!(order.status(), OrderStatus::Completed);
    }

    #[tokio::test]
    async fn catalog_price_change_does_not_reprice_cart() {
        let f = fixture();
        let x = f.catalog.create_product(product("X", 1_000)).await.unwrap();
        let cart = f.cart.create_cart().await.unwrap();
        f.cart.add_item(cart.id(), x.id.clone(), 2).await.unwrap();

        f.catalog
            .update_product(&x.id, product("X", 9_000))
            .await
            .unwrap();

        let order = f.cart.get_cart(cart.id()).await.unwrap();
        assert_eq!(order.items()[0].unit_price.cents(), 1_000);
        assert_eq!(order.total().cents(), 2_000);
    }

    #[tokio::test]
    async fn deleting_order_removes_items_with_it() {
        let f = fixture();
        let x = f.catalog.create_product(product("X", 1_000)).await.unwrap();
        let cart = f.cart.create_cart().await.unwrap();
        f.cart.add_item(cart.id(), x.id.clone(), 2).await.unwrap();

        f.admin.delete_order(cart.id()).await.unwrap();

        assert!(f.orders.find_by_id(cart.id()).await.unwrap().is_none());
        assert!(matches!(
            f.cart.add_item(cart.id(), x.id.clone(), 1).await,
            Err(DomainError::OrderNotFound(_))
        ));
    }
}

mod concurrency {
    use super::*;

    #[tokio::test]
    async fn stale_writer_is_rejected() {
        let f = fixture();
        let cart = f.cart.create_cart().await.unwrap();

        let mut first = f.orders.find_by_id(cart.id()).await.unwrap().unwrap();
        let mut second = first.clone();

        first.transition_status(OrderStatus::Completed).unwrap();
        f.orders.update(&first).await.unwrap();

        second.transition_status(OrderStatus::Canceled).unwrap();
        let result = f.orders.update(&second).await;
        assert!(matches!(
            result,
            Err(StoreError::ConcurrencyConflict { .. })
        ));

        let stored = f.orders.find_by_id(cart.id()).await.unwrap().unwrap();
        assert_eq!(stored.status(), OrderStatus::Completed);
    }

    #[tokio::test]
    async fn racing_adds_never_lose_a_write_silently() {
        let f = fixture();
        let x = f.catalog.create_product(product("X", 100)).await.unwrap();
        let cart = f.cart.create_cart().await.unwrap();
        let service = Arc::new(f.cart);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let service = Arc::clone(&service);
            let product_id = x.id.clone();
            let order_id = cart.id();
            handles.push(tokio::spawn(async move {
                service.add_item(order_id, product_id, 1).await
            }));
        }

        let mut succeeded = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => succeeded += 1,
                Err(DomainError::Store(StoreError::ConcurrencyConflict { .. })) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        let order = service.get_cart(cart.id()).await.unwrap();
        assert_eq!(order.total_quantity(), succeeded);
        assert_eq!(order.total().cents(), 100 * i64::from(succeeded));
    }
}

mod error_handling {
    use super::*;

    #[tokio::test]
    async fn empty_cart_cannot_be_priced() {
        let f = fixture();
        let cart = f.cart.create_cart().await.unwrap();
        assert!(matches!(
            f.cart.calculate_total(cart.id()).await,
            Err(DomainError::Order(OrderError::EmptyOrder))
        ));
    }

    #[tokio::test]
    async fn zero_quantity_is_rejected_and_nothing_persisted() {
        let f = fixture();
        let x = f.catalog.create_product(product("X", 100)).await.unwrap();
        let cart = f.cart.create_cart().await.unwrap();

        let result = f.cart.add_item(cart.id(), x.id.clone(), 0).await;
        assert!(matches!(
            result,
            Err(DomainError::Order(OrderError::InvalidQuantity { .. }))
        ));
        assert!(f.cart.get_cart(cart.id()).await.unwrap().is_empty());
    }
}

mod payments {
    use super::*;
    use common::OrderId;

    #[tokio::test]
    async fn payment_lifecycle_through_service() {
        let service = PaymentService::new(InMemoryPaymentStore::new());
        let order_id = OrderId::new();

        let declined = service
            .process_payment(
                order_id,
                Money::from_cents(1_500_000),
                PaymentMethod::Boleto,
                "a@b.c",
                "A",
            )
            .await
            .unwrap();
        assert_eq!(declined.status(), PaymentStatus::Declined);

        let approved = service
            .process_payment(
                order_id,
                Money::from_cents(1_500),
                PaymentMethod::Pix,
                "a@b.c",
                "A",
            )
            .await
            .unwrap();
        assert_eq!(approved.status(), PaymentStatus::Approved);

        service.cancel_payment(declined.id(), "retry").await.unwrap();
        assert!(service.cancel_payment(approved.id(), "late").await.is_err());

        let statuses: Vec<_> = service
            .list_payments(order_id)
            .await
            .unwrap()
            .iter()
            .map(|p| p.status())
            .collect();
        assert_eq!(statuses.len(), 2);
        assert!(statuses.contains(&PaymentStatus::Canceled));
        assert!(statuses.contains(&PaymentStatus::Approved));
    }
}
