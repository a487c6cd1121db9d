use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions, PgPool};
use std::str::FromStr;
use std::time::Duration;

/// 创建数据库连接池
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    let mut connect_options = PgConnectOptions::from_str(database_url)?;

    // 慢查询日志阈值 2 秒
    connect_options = connect_options.log_slow_statements(
        tracing::log::LevelFilter::Warn,
        Duration::from_secs(2),
    );

    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(connect_options)
        .await
}

const CREATE_RECORDS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS return_records (
    id             BIGSERIAL PRIMARY KEY,
    section        TEXT        NOT NULL,
    user_id        TEXT        NOT NULL,
    financial_year TEXT        NOT NULL,
    quarter        TEXT        NOT NULL,
    period         TEXT        NOT NULL,
    row_key        TEXT,
    data           JSONB       NOT NULL,
    created_at     TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at     TIMESTAMPTZ NOT NULL DEFAULT now()
)
"#;

// row_key 为 NULL 的明细行不参与唯一约束
const CREATE_RECORDS_KEY_INDEX: &str = r#"
CREATE UNIQUE INDEX IF NOT EXISTS return_records_row_key_idx
    ON return_records (section, user_id, financial_year, quarter, period, row_key)
"#;

/// 建表 (幂等)
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(CREATE_RECORDS_TABLE).execute(pool).await?;
    sqlx::query(CREATE_RECORDS_KEY_INDEX).execute(pool).await?;
    tracing::info!("return_records schema ready");
    Ok(())
}
