use super::summary::SummaryService;
use super::{scope_for, watch_session};
use crate::db::{RecordStore, Scope, Table};
use crate::error::AppError;
use crate::models::{FilingPeriod, Session, SummaryTile};
use std::sync::Arc;
use tracing::info;

/// 重置时清空的 GSTR-3B 数据
const GSTR3B_TABLES: [Table; 4] = [
    Table::Gstr3bSummary,
    Table::Gstr3bSection31,
    Table::Gstr3bEligibleItc,
    Table::Gstr3bPaymentTax,
];

/// GSTR-3B 概览与整体重置
pub struct Gstr3bService {
    store: Arc<dyn RecordStore>,
    summary: SummaryService,
}

impl Gstr3bService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            summary: SummaryService::new(store.clone()),
            store,
        }
    }

    /// 概览磁贴; 未保存过的分节为 0
    pub async fn overview(
        &self,
        session: &Session,
        period: &FilingPeriod,
    ) -> Result<Vec<SummaryTile>, AppError> {
        let scope = scope_for(session, period)?;
        watch_session(session, self.summary.tiles(&scope).await)
    }

    /// 删除本期全部 GSTR-3B 数据 (GSTR-1 明细保留)
    pub async fn reset_all(&self, session: &Session, period: &FilingPeriod) -> Result<u64, AppError> {
        let scope = scope_for(session, period)?;
        let removed = watch_session(session, self.delete_all(&scope).await)?;
        info!(
            "GSTR-3B reset for user {} ({}), {} records removed",
            scope.user_id, scope.period, removed
        );
        Ok(removed)
    }

    async fn delete_all(&self, scope: &Scope) -> Result<u64, AppError> {
        let mut removed = 0;
        for table in GSTR3B_TABLES {
            removed += self.store.delete_all(table, scope).await?;
        }
        Ok(removed)
    }
}
