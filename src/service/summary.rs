use crate::db::{records, RecordStore, Scope, Table};
use crate::error::AppError;
use crate::models::{ConsolidatedSummary, SectionTotal, Session, SummarySection, SummaryTile};
use chrono::Utc;
use std::sync::Arc;

/// 汇总行的固定行键 (每个用户+申报期一条)
pub const SUMMARY_ROW_KEY: &str = "summary";

/// 合并一个分节, 其余分节保持原值 (纯函数)
///
/// 没有已有汇总时, 其他分节按 0 补齐。
pub fn merge_section(
    existing: Option<&ConsolidatedSummary>,
    scope: &Scope,
    section: SummarySection,
    total: SectionTotal,
) -> ConsolidatedSummary {
    let mut merged = match existing {
        Some(summary) => summary.clone(),
        None => ConsolidatedSummary::empty(&scope.user_id, &scope.period),
    };
    for known in SummarySection::ALL {
        merged.sections.entry(known).or_default();
    }
    merged.sections.insert(section, total);
    merged.updated_at = Utc::now();
    merged
}

/// 汇总写入结果: 明细为准, 汇总失败只给出警告
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeOutcome {
    pub summary: Option<ConsolidatedSummary>,
    pub warning: Option<String>,
}

/// 合并汇总服务 (读-改-写, 无并发控制, 后写覆盖)
pub struct SummaryService {
    store: Arc<dyn RecordStore>,
}

impl SummaryService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn load(&self, scope: &Scope) -> Result<Option<ConsolidatedSummary>, AppError> {
        records::get_keyed(
            self.store.as_ref(),
            Table::Gstr3bSummary,
            scope,
            SUMMARY_ROW_KEY,
        )
        .await
    }

    /// 读取汇总, 缺失时全部为 0
    pub async fn load_or_empty(&self, scope: &Scope) -> Result<ConsolidatedSummary, AppError> {
        Ok(self
            .load(scope)
            .await?
            .unwrap_or_else(|| ConsolidatedSummary::empty(&scope.user_id, &scope.period)))
    }

    /// 概览磁贴, 按分节顺序
    pub async fn tiles(&self, scope: &Scope) -> Result<Vec<SummaryTile>, AppError> {
        let summary = self.load_or_empty(scope).await?;
        Ok(SummarySection::ALL
            .into_iter()
            .map(|section| SummaryTile {
                section,
                title: section.title(),
                total: summary.section(section),
            })
            .collect())
    }

    /// 读取已有汇总, 替换 `section`, 按 (用户, 财年, 季度, 月份) upsert
    pub async fn upsert_section(
        &self,
        scope: &Scope,
        section: SummarySection,
        total: SectionTotal,
    ) -> Result<ConsolidatedSummary, AppError> {
        let existing = self.load(scope).await?;
        let merged = merge_section(existing.as_ref(), scope, section, total);
        records::upsert(
            self.store.as_ref(),
            Table::Gstr3bSummary,
            scope,
            SUMMARY_ROW_KEY,
            &merged,
        )
        .await?;
        tracing::info!(
            "summary {} updated for user {} ({})",
            section,
            scope.user_id,
            scope.period
        );
        Ok(merged)
    }

    /// 明细已提交后调用: 失败不回滚明细, 只记录警告
    pub async fn merge_after_commit(
        &self,
        session: &Session,
        scope: &Scope,
        section: SummarySection,
        total: SectionTotal,
    ) -> MergeOutcome {
        match self.upsert_section(scope, section, total).await {
            Ok(summary) => MergeOutcome {
                summary: Some(summary),
                warning: None,
            },
            Err(e) => {
                if matches!(e, AppError::SessionExpired) {
                    session.terminate();
                }
                tracing::warn!(
                    "summary {} merge failed for user {} ({}): {}",
                    section,
                    scope.user_id,
                    scope.period,
                    e
                );
                MergeOutcome {
                    summary: None,
                    warning: Some(format!("Saved, but the summary could not be updated: {}", e)),
                }
            }
        }
    }
}
