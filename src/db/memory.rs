use super::store::{RecordStore, Scope, StoreOp, StoredRecord, Table};
use crate::error::BackendError;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};

#[derive(Debug, Clone)]
struct MemoryRow {
    table: Table,
    scope: Scope,
    row_key: Option<String>,
    data: serde_json::Value,
}

/// 内存记录存储, 无数据库时使用, 支持按 (操作, 表) 注入一次性故障
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: DashMap<i64, MemoryRow>,
    next_id: AtomicI64,
    faults: DashMap<(StoreOp, Table), BackendError>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 下一次 `op` 作用于 `table` 时返回 `error`
    pub fn fail_next(&self, op: StoreOp, table: Table, error: BackendError) {
        self.faults.insert((op, table), error);
    }

    /// Total rows of `table` across all scopes.
    pub fn row_count(&self, table: Table) -> usize {
        self.rows.iter().filter(|r| r.table == table).count()
    }

    fn check_fault(&self, op: StoreOp, table: Table) -> Result<(), BackendError> {
        match self.faults.remove(&(op, table)) {
            Some((_, err)) => Err(err),
            None => Ok(()),
        }
    }

    fn find_id<F>(&self, table: Table, scope: &Scope, pred: F) -> Option<i64>
    where
        F: Fn(i64, &MemoryRow) -> bool,
    {
        self.rows
            .iter()
            .find(|r| r.table == table && r.scope == *scope && pred(*r.key(), r.value()))
            .map(|r| *r.key())
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn select(&self, table: Table, scope: &Scope) -> Result<Vec<StoredRecord>, BackendError> {
        self.check_fault(StoreOp::Select, table)?;
        let mut out: Vec<StoredRecord> = self
            .rows
            .iter()
            .filter(|r| r.table == table && r.scope == *scope)
            .map(|r| StoredRecord {
                id: *r.key(),
                row_key: r.row_key.clone(),
                data: r.data.clone(),
            })
            .collect();
        out.sort_by_key(|r| r.id);
        Ok(out)
    }

    async fn insert(
        &self,
        table: Table,
        scope: &Scope,
        data: serde_json::Value,
    ) -> Result<i64, BackendError> {
        self.check_fault(StoreOp::Insert, table)?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.rows.insert(
            id,
            MemoryRow {
                table,
                scope: scope.clone(),
                row_key: None,
                data,
            },
        );
        Ok(id)
    }

    async fn update(
        &self,
        table: Table,
        scope: &Scope,
        id: i64,
        data: serde_json::Value,
    ) -> Result<bool, BackendError> {
        self.check_fault(StoreOp::Update, table)?;
        match self.rows.get_mut(&id) {
            Some(mut row) if row.table == table && row.scope == *scope => {
                row.data = data;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn upsert(
        &self,
        table: Table,
        scope: &Scope,
        row_key: &str,
        data: serde_json::Value,
    ) -> Result<i64, BackendError> {
        self.check_fault(StoreOp::Upsert, table)?;
        let existing = self.find_id(table, scope, |_, r| r.row_key.as_deref() == Some(row_key));
        if let Some(id) = existing {
            if let Some(mut row) = self.rows.get_mut(&id) {
                row.data = data;
                return Ok(id);
            }
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.rows.insert(
            id,
            MemoryRow {
                table,
                scope: scope.clone(),
                row_key: Some(row_key.to_string()),
                data,
            },
        );
        Ok(id)
    }

    async fn delete(&self, table: Table, scope: &Scope, id: i64) -> Result<bool, BackendError> {
        self.check_fault(StoreOp::Delete, table)?;
        Ok(self
            .rows
            .remove_if(&id, |_, r| r.table == table && r.scope == *scope)
            .is_some())
    }

    async fn delete_all(&self, table: Table, scope: &Scope) -> Result<u64, BackendError> {
        self.check_fault(StoreOp::Delete, table)?;
        let mut removed = 0u64;
        self.rows.retain(|_, r| {
            let keep = !(r.table == table && r.scope == *scope);
            if !keep {
                removed += 1;
            }
            keep
        });
        Ok(removed)
    }
}
