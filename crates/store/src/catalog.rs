use async_trait::async_trait;
use domain::{Catalog, Money, Product, ProductId, StoreError};
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::error::{db_err, is_unique_violation};

const PRODUCT: &str = "product";

/// PostgreSQL-backed product catalog.
#[derive(Clone)]
pub struct PostgresCatalog {
    pool: PgPool,
}

impl PostgresCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_product(row: &PgRow) -> Result<Product, StoreError> {
        Ok(Product {
            id: ProductId::new(row.try_get::<String, _>("id").map_err(db_err)?),
            name: row.try_get("name").map_err(db_err)?,
            description: row.try_get("description").map_err(db_err)?,
            price: Money::from_cents(row.try_get("price_cents").map_err(db_err)?),
            stock: row.try_get("stock").map_err(db_err)?,
            created_at: row.try_get("created_at").map_err(db_err)?,
            updated_at: row.try_get("updated_at").map_err(db_err)?,
        })
    }
}

#[async_trait]
impl Catalog for PostgresCatalog {
    async fn find_product(&self, id: &ProductId) -> Result<Option<Product>, StoreError> {
        sqlx::query(
            r#"
            SELECT id, name, description, price_cents, stock, created_at, updated_at
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?
        .as_ref()
        .map(Self::row_to_product)
        .transpose()
    }

    async fn create_product(&self, product: &Product) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, description, price_cents, stock, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(product.id.as_str())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.cents())
        .bind(product.stock)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::already_exists(PRODUCT, &product.id)
            } else {
                db_err(e)
            }
        })?;

        Ok(())
    }

    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        sqlx::query(
            r#"
            SELECT id, name, description, price_cents, stock, created_at, updated_at
            FROM products
            ORDER BY name ASC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?
        .iter()
        .map(Self::row_to_product)
        .collect()
    }

    async fn update_product(&self, product: &Product) -> Result<(), StoreError> {
        let updated = sqlx::query(
            r#"
            UPDATE products
            SET name = $2, description = $3, price_cents = $4, stock = $5, updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(product.id.as_str())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.cents())
        .bind(product.stock)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?
        .rows_affected();

        if updated == 0 {
            return Err(StoreError::not_found(PRODUCT, &product.id));
        }
        Ok(())
    }

    async fn delete_product(&self, id: &ProductId) -> Result<(), StoreError> {
        let deleted = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(db_err)?
            .rows_affected();

        if deleted == 0 {
            return Err(StoreError::not_found(PRODUCT, id));
        }
        Ok(())
    }
}
