use super::store::{RecordStore, Scope, StoredRecord, Table};
use crate::error::BackendError;
use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

#[derive(Debug, FromRow)]
struct RecordRow {
    id: i64,
    row_key: Option<String>,
    data: serde_json::Value,
}

impl From<RecordRow> for StoredRecord {
    fn from(row: RecordRow) -> Self {
        StoredRecord {
            id: row.id,
            row_key: row.row_key,
            data: row.data,
        }
    }
}

/// Postgres 记录存储, 所有分节共用 return_records 表
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for PgStore {
    async fn select(&self, table: Table, scope: &Scope) -> Result<Vec<StoredRecord>, BackendError> {
        let rows = sqlx::query_as::<_, RecordRow>(
            r#"
            SELECT id, row_key, data
            FROM return_records
            WHERE section = $1
              AND user_id = $2
              AND financial_year = $3
              AND quarter = $4
              AND period = $5
            ORDER BY id ASC
            "#,
        )
        .bind(table.name())
        .bind(&scope.user_id)
        .bind(&scope.period.financial_year)
        .bind(scope.period.quarter.as_str())
        .bind(&scope.period.period)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(StoredRecord::from).collect())
    }

    async fn insert(
        &self,
        table: Table,
        scope: &Scope,
        data: serde_json::Value,
    ) -> Result<i64, BackendError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO return_records (section, user_id, financial_year, quarter, period, data)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(table.name())
        .bind(&scope.user_id)
        .bind(&scope.period.financial_year)
        .bind(scope.period.quarter.as_str())
        .bind(&scope.period.period)
        .bind(data)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("inserted {} row {} for user {}", table, id, scope.user_id);
        Ok(id)
    }

    async fn update(
        &self,
        table: Table,
        scope: &Scope,
        id: i64,
        data: serde_json::Value,
    ) -> Result<bool, BackendError> {
        let result = sqlx::query(
            r#"
            UPDATE return_records
            SET data = $7, updated_at = now()
            WHERE id = $1
              AND section = $2
              AND user_id = $3
              AND financial_year = $4
              AND quarter = $5
              AND period = $6
            "#,
        )
        .bind(id)
        .bind(table.name())
        .bind(&scope.user_id)
        .bind(&scope.period.financial_year)
        .bind(scope.period.quarter.as_str())
        .bind(&scope.period.period)
        .bind(data)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn upsert(
        &self,
        table: Table,
        scope: &Scope,
        row_key: &str,
        data: serde_json::Value,
    ) -> Result<i64, BackendError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO return_records (section, user_id, financial_year, quarter, period, row_key, data)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (section, user_id, financial_year, quarter, period, row_key)
            DO UPDATE SET data = EXCLUDED.data, updated_at = now()
            RETURNING id
            "#,
        )
        .bind(table.name())
        .bind(&scope.user_id)
        .bind(&scope.period.financial_year)
        .bind(scope.period.quarter.as_str())
        .bind(&scope.period.period)
        .bind(row_key)
        .bind(data)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn delete(&self, table: Table, scope: &Scope, id: i64) -> Result<bool, BackendError> {
        let result = sqlx::query(
            r#"
            DELETE FROM return_records
            WHERE id = $1
              AND section = $2
              AND user_id = $3
              AND financial_year = $4
              AND quarter = $5
              AND period = $6
            "#,
        )
        .bind(id)
        .bind(table.name())
        .bind(&scope.user_id)
        .bind(&scope.period.financial_year)
        .bind(scope.period.quarter.as_str())
        .bind(&scope.period.period)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_all(&self, table: Table, scope: &Scope) -> Result<u64, BackendError> {
        let result = sqlx::query(
            r#"
            DELETE FROM return_records
            WHERE section = $1
              AND user_id = $2
              AND financial_year = $3
              AND quarter = $4
              AND period = $5
            "#,
        )
        .bind(table.name())
        .bind(&scope.user_id)
        .bind(&scope.period.financial_year)
        .bind(scope.period.quarter.as_str())
        .bind(&scope.period.period)
        .execute(&self.pool)
        .await?;

        tracing::info!(
            "deleted {} rows from {} for user {} ({})",
            result.rows_affected(),
            table,
            scope.user_id,
            scope.period
        );
        Ok(result.rows_affected())
    }
}
