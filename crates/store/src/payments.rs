use async_trait::async_trait;
use common::{OrderId, PaymentId, Version};
use domain::{Money, Payment, PaymentMethod, PaymentRecord, PaymentStatus, PaymentStore, StoreError};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::error::{db_err, decode_err, is_unique_violation};

const PAYMENT: &str = "payment";

const SELECT_PAYMENT: &str = r#"
    SELECT id, version, order_id, amount_cents, method, status, transaction_id,
           customer_email, customer_name, created_at, updated_at, canceled_at, cancel_reason
    FROM payments
"#;

/// PostgreSQL-backed payment store.
#[derive(Clone)]
pub struct PostgresPaymentStore {
    pool: PgPool,
}

impl PostgresPaymentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_payment(row: &PgRow) -> Result<Payment, StoreError> {
        let method: String = row.try_get("method").map_err(db_err)?;
        let status: String = row.try_get("status").map_err(db_err)?;

        Ok(Payment::from_record(PaymentRecord {
            id: PaymentId::from_uuid(row.try_get::<Uuid, _>("id").map_err(db_err)?),
            version: Version::new(row.try_get("version").map_err(db_err)?),
            order_id: OrderId::from_uuid(row.try_get::<Uuid, _>("order_id").map_err(db_err)?),
            amount: Money::from_cents(row.try_get("amount_cents").map_err(db_err)?),
            method: method
                .parse::<PaymentMethod>()
                .map_err(|e| decode_err("method", e))?,
            status: status
                .parse::<PaymentStatus>()
                .map_err(|e| decode_err("status", e))?,
            transaction_id: row.try_get("transaction_id").map_err(db_err)?,
            customer_email: row.try_get("customer_email").map_err(db_err)?,
            customer_name: row.try_get("customer_name").map_err(db_err)?,
            created_at: row.try_get("created_at").map_err(db_err)?,
            updated_at: row.try_get("updated_at").map_err(db_err)?,
            canceled_at: row.try_get("canceled_at").map_err(db_err)?,
            cancel_reason: row.try_get("cancel_reason").map_err(db_err)?,
        }))
    }
}

#[async_trait]
impl PaymentStore for PostgresPaymentStore {
    async fn create(&self, payment: &Payment) -> Result<Version, StoreError> {
        let version = Version::first();
        let p = payment.record();

        sqlx::query(
            r#"
            INSERT INTO payments
                (id, version, order_id, amount_cents, method, status, transaction_id,
                 customer_email, customer_name, created_at, updated_at, canceled_at, cancel_reason)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(p.id.as_uuid())
        .bind(version.as_i64())
        .bind(p.order_id.as_uuid())
        .bind(p.amount.cents())
        .bind(p.method.as_str())
        .bind(p.status.as_str())
        .bind(&p.transaction_id)
        .bind(&p.customer_email)
        .bind(&p.customer_name)
        .bind(p.created_at)
        .bind(p.updated_at)
        .bind(p.canceled_at)
        .bind(&p.cancel_reason)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::already_exists(PAYMENT, p.id)
            } else {
                db_err(e)
            }
        })?;

        Ok(version)
    }

    async fn find_by_id(&self, id: PaymentId) -> Result<Option<Payment>, StoreError> {
        sqlx::query(&format!("{SELECT_PAYMENT} WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .as_ref()
            .map(Self::row_to_payment)
            .transpose()
    }

    async fn find_by_order_id(&self, order_id: OrderId) -> Result<Vec<Payment>, StoreError> {
        sqlx::query(&format!(
            "{SELECT_PAYMENT} WHERE order_id = $1 ORDER BY created_at ASC"
        ))
        .bind(order_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?
        .iter()
        .map(Self::row_to_payment)
        .collect()
    }

    async fn find_all(&self) -> Result<Vec<Payment>, StoreError> {
        sqlx::query(&format!("{SELECT_PAYMENT} ORDER BY created_at ASC"))
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?
            .iter()
            .map(Self::row_to_payment)
            .collect()
    }

    async fn update(&self, payment: &Payment) -> Result<Version, StoreError> {
        let p = payment.record();
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let updated: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE payments
            SET version = version + 1, status = $3, transaction_id = $4, updated_at = $5,
                canceled_at = $6, cancel_reason = $7
            WHERE id = $1 AND version = $2
            RETURNING version
            "#,
        )
        .bind(p.id.as_uuid())
        .bind(p.version.as_i64())
        .bind(p.status.as_str())
        .bind(&p.transaction_id)
        .bind(p.updated_at)
        .bind(p.canceled_at)
        .bind(&p.cancel_reason)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err)?;

        if let Some(version) = updated {
            tx.commit().await.map_err(db_err)?;
            return Ok(Version::new(version));
        }

        let actual: Option<i64> = sqlx::query_scalar("SELECT version FROM payments WHERE id = $1")
            .bind(p.id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_err)?;

        match actual {
            Some(actual) => Err(StoreError::ConcurrencyConflict {
                entity: PAYMENT,
                id: p.id.to_string(),
                expected: p.version,
                actual: Version::new(actual),
            }),
            None => Err(StoreError::not_found(PAYMENT, p.id)),
        }
    }

    async fn delete(&self, id: PaymentId) -> Result<(), StoreError> {
        let deleted = sqlx::query("DELETE FROM payments WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(db_err)?
            .rows_affected();

        if deleted == 0 {
            return Err(StoreError::not_found(PAYMENT, id));
        }
        Ok(())
    }
}
