use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{ItemId, OrderId, Version};
use domain::{LineItem, Money, Order, OrderStatus, OrderStore, ProductId, StoreError};
use futures_util::TryStreamExt;
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};
use uuid::Uuid;

use crate::error::{db_err, decode_err, is_unique_violation};

const ORDER: &str = "order";

/// PostgreSQL-backed order store.
#[derive(Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_item(row: &PgRow) -> Result<LineItem, StoreError> {
        let quantity: i32 = row.try_get("quantity").map_err(db_err)?;
        let quantity = u32::try_from(quantity).map_err(|e| decode_err("quantity", e))?;

        LineItem::restore(
            ItemId::from_uuid(row.try_get::<Uuid, _>("id").map_err(db_err)?),
            OrderId::from_uuid(row.try_get::<Uuid, _>("order_id").map_err(db_err)?),
            ProductId::new(row.try_get::<String, _>("product_id").map_err(db_err)?),
            row.try_get("product_name").map_err(db_err)?,
            quantity,
            Money::from_cents(row.try_get("unit_price_cents").map_err(db_err)?),
        )
        .map_err(|e| decode_err("total_cents", e))
    }

    fn row_to_order(row: &PgRow, items: Vec<LineItem>) -> Result<Order, StoreError> {
        let status: String = row.try_get("status").map_err(db_err)?;
        let status: OrderStatus = status.parse().map_err(|e| decode_err("status", e))?;

        Order::restore(
            OrderId::from_uuid(row.try_get::<Uuid, _>("id").map_err(db_err)?),
            Version::new(row.try_get("version").map_err(db_err)?),
            status,
            items,
            row.try_get::<DateTime<Utc>, _>("created_at").map_err(db_err)?,
            row.try_get::<DateTime<Utc>, _>("updated_at").map_err(db_err)?,
        )
        .map_err(|e| decode_err("total_cents", e))
    }

    async fn insert_items(
        tx: &mut Transaction<'_, Postgres>,
        order: &Order,
    ) -> Result<(), StoreError> {
        for (position, item) in order.items().iter().enumerate() {
            let quantity = i32::try_from(item.quantity).map_err(|e| decode_err("quantity", e))?;
            let position = i32::try_from(position).map_err(|e| decode_err("position", e))?;

            sqlx::query(
                r#"
                INSERT INTO order_items
                    (id, order_id, position, product_id, product_name, quantity, unit_price_cents, total_cents)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(item.id.as_uuid())
            .bind(order.id().as_uuid())
            .bind(position)
            .bind(item.product_id.as_str())
            .bind(&item.product_name)
            .bind(quantity)
            .bind(item.unit_price.cents())
            .bind(item.total.cents())
            .execute(&mut **tx)
            .await
            .map_err(db_err)?;
        }
        Ok(())
    }

    async fn current_version(
        tx: &mut Transaction<'_, Postgres>,
        id: OrderId,
    ) -> Result<Option<Version>, StoreError> {
        let version: Option<i64> = sqlx::query_scalar("SELECT version FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&mut **tx)
            .await
            .map_err(db_err)?;
        Ok(version.map(Version::new))
    }
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    async fn create(&self, order: &Order) -> Result<Version, StoreError> {
        let version = Version::first();
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, version, status, total_cents, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(order.id().as_uuid())
        .bind(version.as_i64())
        .bind(order.status().as_str())
        .bind(order.total().cents())
        .bind(order.created_at())
        .bind(order.updated_at())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::already_exists(ORDER, order.id())
            } else {
                db_err(e)
            }
        })?;

        Self::insert_items(&mut tx, order).await?;
        tx.commit().await.map_err(db_err)?;

        tracing::debug!(order_id = %order.id(), items = order.item_count(), "Order inserted");
        Ok(version)
    }

    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        let Some(row) = sqlx::query(
            "SELECT id, version, status, created_at, updated_at FROM orders WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?
        else {
            return Ok(None);
        };

        let items = sqlx::query(
            r#"
            SELECT id, order_id, product_id, product_name, quantity, unit_price_cents
            FROM order_items
            WHERE order_id = $1
            ORDER BY position ASC
            "#,
        )
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?
        .iter()
        .map(Self::row_to_item)
        .collect::<Result<Vec<_>, _>>()?;

        Self::row_to_order(&row, items).map(Some)
    }

    async fn find_all(&self) -> Result<Vec<Order>, StoreError> {
        let mut items_by_order: HashMap<OrderId, Vec<LineItem>> = HashMap::new();
        let mut rows = sqlx::query(
            r#"
            SELECT id, order_id, product_id, product_name, quantity, unit_price_cents
            FROM order_items
            ORDER BY order_id, position ASC
            "#,
        )
        .fetch(&self.pool);

        while let Some(row) = rows.try_next().await.map_err(db_err)? {
            let item = Self::row_to_item(&row)?;
            items_by_order.entry(item.order_id).or_default().push(item);
        }

        sqlx::query(
            "SELECT id, version, status, created_at, updated_at FROM orders ORDER BY created_at ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?
        .iter()
        .map(|row| {
            let id = OrderId::from_uuid(row.try_get::<Uuid, _>("id").map_err(db_err)?);
            let items = items_by_order.remove(&id).unwrap_or_default();
            Self::row_to_order(row, items)
        })
        .collect()
    }

    async fn update(&self, order: &Order) -> Result<Version, StoreError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let updated: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE orders
            SET version = version + 1, status = $3, total_cents = $4, updated_at = $5
            WHERE id = $1 AND version = $2
            RETURNING version
            "#,
        )
        .bind(order.id().as_uuid())
        .bind(order.version().as_i64())
        .bind(order.status().as_str())
        .bind(order.total().cents())
        .bind(order.updated_at())
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err)?;

        let Some(new_version) = updated.map(Version::new) else {
            return match Self::current_version(&mut tx, order.id()).await? {
                Some(actual) => Err(StoreError::ConcurrencyConflict {
                    entity: ORDER,
                    id: order.id().to_string(),
                    expected: order.version(),
                    actual,
                }),
                None => Err(StoreError::not_found(ORDER, order.id())),
            };
        };

        sqlx::query("DELETE FROM order_items WHERE order_id = $1")
            .bind(order.id().as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        Self::insert_items(&mut tx, order).await?;

        tx.commit().await.map_err(db_err)?;
        Ok(new_version)
    }

    async fn delete(&self, id: OrderId) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        sqlx::query("DELETE FROM order_items WHERE order_id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        let deleted = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(db_err)?
            .rows_affected();

        if deleted == 0 {
            return Err(StoreError::not_found(ORDER, id));
        }

        tx.commit().await.map_err(db_err)?;
        Ok(())
    }
}
