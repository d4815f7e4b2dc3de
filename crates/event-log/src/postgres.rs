use async_trait::async_trait;
use common::{OrderId, TransactionId};
use saga::SagaEvent;
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::Result;
use crate::log::EventLog;

/// PostgreSQL-backed event log implementation.
///
/// Each saved event version is one row; the full envelope is kept as a
/// JSONB document with the lookup keys extracted into indexed columns.
#[derive(Clone)]
pub struct PostgresEventLog {
    pool: PgPool,
}

impl PostgresEventLog {
    /// Creates a new PostgreSQL event log.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_event(row: PgRow) -> Result<SagaEvent> {
        let document: serde_json::Value = row.try_get("document")?;
        Ok(serde_json::from_value(document)?)
    }
}

#[async_trait]
impl EventLog for PostgresEventLog {
    async fn save(&self, event: &SagaEvent) -> Result<()> {
        let document = serde_json::to_value(event)?;

        sqlx::query(
            r#"
            INSERT INTO saga_events (event_id, order_id, transaction_id, document, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(event.id.as_uuid())
        .bind(event.order_id.as_uuid())
        .bind(event.transaction_id.as_uuid())
        .bind(document)
        .bind(event.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_latest_by_order_id(&self, order_id: OrderId) -> Result<Option<SagaEvent>> {
        let row = sqlx::query(
            r#"
            SELECT document
            FROM saga_events
            WHERE order_id = $1
            ORDER BY seq DESC
            LIMIT 1
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_event).transpose()
    }

    async fn find_latest_by_transaction_id(
        &self,
        transaction_id: TransactionId,
    ) -> Result<Option<SagaEvent>> {
        let row = sqlx::query(
            r#"
            SELECT document
            FROM saga_events
            WHERE transaction_id = $1
            ORDER BY seq DESC
            LIMIT 1
            "#,
        )
        .bind(transaction_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_event).transpose()
    }

    async fn find_all(&self) -> Result<Vec<SagaEvent>> {
        let rows = sqlx::query(
            r#"
            SELECT document
            FROM saga_events
            ORDER BY seq DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_event).collect()
    }
}
