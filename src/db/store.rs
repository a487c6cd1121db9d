use crate::error::BackendError;
use crate::models::FilingPeriod;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 记录所属分节 (物理上同一张表, 按 section 区分)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Gstr1B2b,
    Gstr1B2cs,
    Gstr1Hsn,
    Gstr1DocumentsIssued,
    Gstr1NilRated,
    Gstr3bSection31,
    Gstr3bEligibleItc,
    Gstr3bPaymentTax,
    Gstr3bSummary,
}

impl Table {
    pub fn name(&self) -> &'static str {
        match self {
            Table::Gstr1B2b => "gstr1_b2b",
            Table::Gstr1B2cs => "gstr1_b2cs",
            Table::Gstr1Hsn => "gstr1_hsn",
            Table::Gstr1DocumentsIssued => "gstr1_documents_issued",
            Table::Gstr1NilRated => "gstr1_nil_rated",
            Table::Gstr3bSection31 => "gstr3b_section_3_1",
            Table::Gstr3bEligibleItc => "gstr3b_eligible_itc",
            Table::Gstr3bPaymentTax => "gstr3b_payment_tax",
            Table::Gstr3bSummary => "gstr3b_summary",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 所有读写的过滤条件: 用户 + 申报期
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Scope {
    pub user_id: String,
    pub period: FilingPeriod,
}

impl Scope {
    pub fn new(user_id: impl Into<String>, period: FilingPeriod) -> Self {
        Self {
            user_id: user_id.into(),
            period,
        }
    }
}

/// 存储中的一行
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub id: i64,
    pub row_key: Option<String>,
    pub data: serde_json::Value,
}

/// 存储操作 (故障注入用)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Select,
    Insert,
    Update,
    Upsert,
    Delete,
}

/// 通用记录存储: 过滤查询 / 插入 / 更新 / 按键 upsert / 删除
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Rows of `table` in `scope`, oldest first.
    async fn select(&self, table: Table, scope: &Scope) -> Result<Vec<StoredRecord>, BackendError>;

    async fn insert(
        &self,
        table: Table,
        scope: &Scope,
        data: serde_json::Value,
    ) -> Result<i64, BackendError>;

    /// Replaces the payload of row `id`; `false` when no such row exists in scope.
    async fn update(
        &self,
        table: Table,
        scope: &Scope,
        id: i64,
        data: serde_json::Value,
    ) -> Result<bool, BackendError>;

    /// Idempotent write keyed by `(scope, row_key)`.
    async fn upsert(
        &self,
        table: Table,
        scope: &Scope,
        row_key: &str,
        data: serde_json::Value,
    ) -> Result<i64, BackendError>;

    async fn delete(&self, table: Table, scope: &Scope, id: i64) -> Result<bool, BackendError>;

    /// Deletes every row of `table` in `scope`, returns the number removed.
    async fn delete_all(&self, table: Table, scope: &Scope) -> Result<u64, BackendError>;
}
