//! PostgreSQL implementations of the domain store traits.
//!
//! Every write runs in its own transaction. Orders are stored as an `orders`
//! row plus their `order_items`; an update deletes and re-inserts the items
//! in the same transaction as the version-checked order row update.

mod catalog;
mod error;
mod orders;
mod payments;

pub use catalog::PostgresCatalog;
pub use error::SetupError;
pub use orders::PostgresOrderStore;
pub use payments::PostgresPaymentStore;
pub use sqlx::PgPool;

use sqlx::postgres::PgPoolOptions;

/// Opens a connection pool to the given database URL.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, SetupError> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Runs the database migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), SetupError> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    Ok(())
}
