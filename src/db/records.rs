//! 类型化读写: 在 RecordStore 的 JSON 行与分节记录之间转换

use super::store::{RecordStore, Scope, Table};
use crate::error::{AppError, BackendError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// 带存储 id 的记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stored<T> {
    pub id: i64,
    #[serde(flatten)]
    pub record: T,
}

fn encode<T: Serialize>(table: Table, record: &T) -> Result<serde_json::Value, AppError> {
    serde_json::to_value(record).map_err(|e| {
        AppError::Backend(BackendError::Other(format!("cannot encode {} row: {}", table, e)))
    })
}

/// 读取分节全部记录; 无法解析的行记录警告并跳过
pub async fn list<T: DeserializeOwned>(
    store: &dyn RecordStore,
    table: Table,
    scope: &Scope,
) -> Result<Vec<Stored<T>>, AppError> {
    let rows = store.select(table, scope).await?;
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        match serde_json::from_value::<T>(row.data) {
            Ok(record) => out.push(Stored { id: row.id, record }),
            Err(e) => {
                tracing::warn!(
                    "skipping malformed {} row {} for user {}: {}",
                    table,
                    row.id,
                    scope.user_id,
                    e
                );
            }
        }
    }
    Ok(out)
}

/// 按行键读取单条; 缺失或无法解析时返回 None
pub async fn get_keyed<T: DeserializeOwned>(
    store: &dyn RecordStore,
    table: Table,
    scope: &Scope,
    row_key: &str,
) -> Result<Option<T>, AppError> {
    let rows = store.select(table, scope).await?;
    let Some(row) = rows
        .into_iter()
        .find(|r| r.row_key.as_deref() == Some(row_key))
    else {
        return Ok(None);
    };

    match serde_json::from_value::<T>(row.data) {
        Ok(record) => Ok(Some(record)),
        Err(e) => {
            tracing::warn!(
                "ignoring malformed {} row '{}' for user {}: {}",
                table,
                row_key,
                scope.user_id,
                e
            );
            Ok(None)
        }
    }
}

pub async fn insert<T: Serialize>(
    store: &dyn RecordStore,
    table: Table,
    scope: &Scope,
    record: &T,
) -> Result<i64, AppError> {
    let data = encode(table, record)?;
    Ok(store.insert(table, scope, data).await?)
}

/// 更新; 记录不存在时返回 NotFound
pub async fn update<T: Serialize>(
    store: &dyn RecordStore,
    table: Table,
    scope: &Scope,
    id: i64,
    record: &T,
) -> Result<(), AppError> {
    let data = encode(table, record)?;
    if store.update(table, scope, id, data).await? {
        Ok(())
    } else {
        Err(AppError::NotFound(format!("{} record {}", table, id)))
    }
}

pub async fn upsert<T: Serialize>(
    store: &dyn RecordStore,
    table: Table,
    scope: &Scope,
    row_key: &str,
    record: &T,
) -> Result<i64, AppError> {
    let data = encode(table, record)?;
    Ok(store.upsert(table, scope, row_key, data).await?)
}

pub async fn delete(
    store: &dyn RecordStore,
    table: Table,
    scope: &Scope,
    id: i64,
) -> Result<(), AppError> {
    if store.delete(table, scope, id).await? {
        Ok(())
    } else {
        Err(AppError::NotFound(format!("{} record {}", table, id)))
    }
}
