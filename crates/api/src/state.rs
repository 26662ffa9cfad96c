//! Shared application state and store wiring.

use std::sync::Arc;

use domain::store::{InMemoryCatalog, InMemoryOrderStore, InMemoryPaymentStore};
use domain::{
    CartService, Catalog, CatalogService, OrderService, OrderStore, PaymentService, PaymentStore,
};
use saga::{FulfillmentSaga, LocalPaymentGateway};
use store::{PgPool, PostgresCatalog, PostgresOrderStore, PostgresPaymentStore};

use crate::config::Config;

pub type SharedOrderStore = Arc<dyn OrderStore>;
pub type SharedCatalog = Arc<dyn Catalog>;
pub type SharedPaymentStore = Arc<dyn PaymentStore>;
pub type Gateway = LocalPaymentGateway<SharedPaymentStore>;
pub type Saga = FulfillmentSaga<SharedOrderStore, SharedCatalog, Gateway>;

/// The three stores behind the API.
#[derive(Clone)]
pub struct Stores {
    pub orders: SharedOrderStore,
    pub catalog: SharedCatalog,
    pub payments: SharedPaymentStore,
    pub backend: &'static str,
}

impl Stores {
    /// Process-local stores; contents are lost on restart.
    pub fn in_memory() -> Self {
        Self {
            orders: Arc::new(InMemoryOrderStore::new()),
            catalog: Arc::new(InMemoryCatalog::new()),
            payments: Arc::new(InMemoryPaymentStore::new()),
            backend: "memory",
        }
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self {
            orders: Arc::new(PostgresOrderStore::new(pool.clone())),
            catalog: Arc::new(PostgresCatalog::new(pool.clone())),
            payments: Arc::new(PostgresPaymentStore::new(pool)),
            backend: "postgres",
        }
    }
}

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub catalog: CatalogService<SharedCatalog>,
    pub carts: CartService<SharedOrderStore, SharedCatalog>,
    pub orders: OrderService<SharedOrderStore>,
    pub payments: Arc<PaymentService<SharedPaymentStore>>,
    pub gateway: Gateway,
    pub saga: Saga,
    pub backend: &'static str,
}

impl AppState {
    /// Builds the services, the in-process gateway and the saga over `stores`.
    pub fn new(stores: Stores, config: &Config) -> Self {
        let payments = Arc::new(PaymentService::with_policy(
            stores.payments,
            config.approval_policy(),
        ));
        let gateway = LocalPaymentGateway::new(Arc::clone(&payments));
        let saga = FulfillmentSaga::new(
            Arc::clone(&stores.orders),
            Arc::clone(&stores.catalog),
            gateway.clone(),
        )
        .with_timeouts(config.gateway_timeouts());

        Self {
            catalog: CatalogService::new(Arc::clone(&stores.catalog)),
            carts: CartService::new(Arc::clone(&stores.orders), stores.catalog),
            orders: OrderService::new(stores.orders),
            payments,
            gateway,
            saga,
            backend: stores.backend,
        }
    }
}
