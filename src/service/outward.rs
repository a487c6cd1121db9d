//! 3.1 对外供应工作表: 从 GSTR-1 推导, 手工修改的行保持不变直到重置

use super::aggregator::{aggregate, combine};
use super::gstr1::NIL_RATED_ROW_KEY;
use super::summary::{MergeOutcome, SummaryService};
use super::{scope_for, watch_session, Saved};
use crate::db::{records, RecordStore, Scope, Table};
use crate::error::{AppError, ValidationCode, ValidationErrors};
use crate::models::{
    clamp2, B2bInvoice, B2csRow, FilingPeriod, NilRatedSupplies, OutwardColumn, OutwardRow,
    OutwardWorksheet, RowCode, RowSource, SavedOutwardRow, SectionTotal, Session, SummarySection,
};
use bigdecimal::{BigDecimal, Zero};
use std::sync::Arc;
use tracing::info;

/// IGST/CGST/SGST 视为 "有值" 的阈值
fn mix_tolerance() -> BigDecimal {
    BigDecimal::from(1) / BigDecimal::from(10_000)
}

/// CGST 与 SGST 允许的差额
fn mirror_tolerance() -> BigDecimal {
    BigDecimal::from(1) / BigDecimal::from(10)
}

/// 推导 3.1 所需的 GSTR-1 数据
#[derive(Debug, Clone, Default)]
pub struct OutwardSources {
    pub b2b: Vec<B2bInvoice>,
    pub b2cs: Vec<B2csRow>,
    pub nil: Option<NilRatedSupplies>,
}

/// 从 GSTR-1 明细推导全部行 (均为 AUTO)
///
/// (a) = B2B + B2CS 合计, (c) = 零税率 + 免税, (e) = 非 GST, (b)/(d) 为 0。
pub fn derive_rows(sources: &OutwardSources) -> OutwardWorksheet {
    let outward = combine(&aggregate(&sources.b2b), &aggregate(&sources.b2cs));
    let nil = sources.nil.clone().unwrap_or_default();

    let mut worksheet = OutwardWorksheet::default();
    worksheet.rows.insert(
        RowCode::A,
        OutwardRow {
            taxable: clamp2(&outward.taxable_value),
            igst: clamp2(&outward.igst),
            cgst: clamp2(&outward.cgst),
            sgst: clamp2(&outward.sgst),
            cess: clamp2(&outward.cess),
            source: RowSource::Auto,
        },
    );
    worksheet.rows.insert(
        RowCode::C,
        OutwardRow {
            taxable: clamp2(&(nil.nil_total() + nil.exempted_total())),
            ..OutwardRow::default()
        },
    );
    worksheet.rows.insert(
        RowCode::E,
        OutwardRow {
            taxable: clamp2(&nil.non_gst_total()),
            ..OutwardRow::default()
        },
    );
    worksheet
}

/// MANUAL 行原样使用, 其余行取推导值
pub fn reconcile(saved: &[SavedOutwardRow], derived: OutwardWorksheet) -> OutwardWorksheet {
    let mut worksheet = derived;
    for saved_row in saved.iter().filter(|r| r.row.source == RowSource::Manual) {
        worksheet.rows.insert(saved_row.row_code, saved_row.row.clone());
    }
    worksheet
}

/// 单元格编辑
///
/// 在 (a)/(d) 行修改税额列会把该行标记为 MANUAL:
/// 设置 IGST 清零 CGST 和 SGST; CGST 与 SGST 互相镜像。
pub fn apply_edit(
    worksheet: &mut OutwardWorksheet,
    code: RowCode,
    column: OutwardColumn,
    value: BigDecimal,
) -> OutwardRow {
    let row = worksheet.rows.entry(code).or_default();
    *row.get_mut(column) = value.clone();

    if code.is_tax_constrained() && column.is_tax() {
        row.source = RowSource::Manual;
        match column {
            OutwardColumn::Igst => {
                row.cgst = BigDecimal::zero();
                row.sgst = BigDecimal::zero();
            }
            OutwardColumn::Cgst => row.sgst = value,
            OutwardColumn::Sgst => row.cgst = value,
            OutwardColumn::Taxable | OutwardColumn::Cess => {}
        }
    }
    row.clone()
}

/// 保存前校验, 返回全部错误 (字段形如 `3.1(a).igst`)
pub fn validate(worksheet: &OutwardWorksheet) -> ValidationErrors {
    let zero = BigDecimal::zero();
    let mix = mix_tolerance();
    let mirror = mirror_tolerance();
    let mut errors = ValidationErrors::new();

    for (code, row) in worksheet.rows.iter().filter(|(c, _)| c.is_validated()) {
        for column in OutwardColumn::ALL {
            if row.get(column) < &zero {
                errors.push(
                    format!("{}.{}", code, column.as_str()),
                    ValidationCode::Negative,
                    format!("{} {} cannot be negative", code, column.as_str()),
                );
            }
        }

        if code.is_tax_constrained() && row.igst > mix && (row.cgst > mix || row.sgst > mix) {
            errors.push(
                format!("{}.igst", code),
                ValidationCode::MixedTax,
                format!("{}: IGST cannot coexist with CGST/SGST", code),
            );
        }

        if (&row.cgst - &row.sgst).abs() > mirror {
            errors.push(
                format!("{}.sgst", code),
                ValidationCode::CgstSgstMismatch,
                format!("{}: CGST and SGST must be equal", code),
            );
        }
    }
    errors
}

/// 所有行的合计 (写入 sec_3_1)
pub fn worksheet_total(worksheet: &OutwardWorksheet) -> SectionTotal {
    worksheet
        .rows
        .values()
        .fold(SectionTotal::default(), |mut total, row| {
            total.count += 1;
            total.taxable_value += &row.taxable;
            total.igst += &row.igst;
            total.cgst += &row.cgst;
            total.sgst += &row.sgst;
            total.cess += &row.cess;
            total
        })
}

/// 持久化前的规整: 补齐缺失行, 金额两位小数且不小于 0
fn normalize(worksheet: &OutwardWorksheet) -> OutwardWorksheet {
    let rows = RowCode::ALL
        .into_iter()
        .map(|code| {
            let row = worksheet.rows.get(&code).cloned().unwrap_or_default();
            let normalized = OutwardRow {
                taxable: clamp2(&row.taxable),
                igst: clamp2(&row.igst),
                cgst: clamp2(&row.cgst),
                sgst: clamp2(&row.sgst),
                cess: clamp2(&row.cess),
                source: row.source,
            };
            (code, normalized)
        })
        .collect();
    OutwardWorksheet { rows }
}

pub struct OutwardService {
    store: Arc<dyn RecordStore>,
    summary: SummaryService,
}

impl OutwardService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            summary: SummaryService::new(store.clone()),
            store,
        }
    }

    /// 读取 B2B / B2CS / 零税率数据; 无法解析的行已在读取时跳过
    pub async fn load_sources(&self, scope: &Scope) -> Result<OutwardSources, AppError> {
        let store = self.store.as_ref();
        let (b2b, b2cs, nil) = futures::try_join!(
            records::list::<B2bInvoice>(store, Table::Gstr1B2b, scope),
            records::list::<B2csRow>(store, Table::Gstr1B2cs, scope),
            records::get_keyed::<NilRatedSupplies>(
                store,
                Table::Gstr1NilRated,
                scope,
                NIL_RATED_ROW_KEY
            ),
        )?;

        Ok(OutwardSources {
            b2b: b2b.into_iter().map(|s| s.record).collect(),
            b2cs: b2cs.into_iter().map(|s| s.record).collect(),
            nil,
        })
    }

    /// 已保存行 + 新推导行的合并结果
    pub async fn worksheet_for(&self, scope: &Scope) -> Result<OutwardWorksheet, AppError> {
        let saved: Vec<SavedOutwardRow> =
            records::list::<SavedOutwardRow>(self.store.as_ref(), Table::Gstr3bSection31, scope)
                .await?
                .into_iter()
                .map(|s| s.record)
                .collect();
        let sources = self.load_sources(scope).await?;
        Ok(reconcile(&saved, derive_rows(&sources)))
    }

    pub async fn load(
        &self,
        session: &Session,
        period: &FilingPeriod,
    ) -> Result<OutwardWorksheet, AppError> {
        let scope = scope_for(session, period)?;
        watch_session(session, self.worksheet_for(&scope).await)
    }

    /// 校验通过后按行码 upsert 全部行, 再合并 sec_3_1
    pub async fn save(
        &self,
        session: &Session,
        period: &FilingPeriod,
        worksheet: &OutwardWorksheet,
    ) -> Result<Saved<OutwardWorksheet>, AppError> {
        let scope = scope_for(session, period)?;
        validate(worksheet).into_result()?;

        let normalized = normalize(worksheet);
        watch_session(session, self.persist(&scope, &normalized).await)?;
        info!(
            "3.1 saved for user {} ({}), manual rows: {}",
            scope.user_id,
            scope.period,
            normalized
                .rows
                .values()
                .filter(|r| r.source == RowSource::Manual)
                .count()
        );

        let outcome = self
            .summary
            .merge_after_commit(
                session,
                &scope,
                SummarySection::OutwardSupplies,
                worksheet_total(&normalized),
            )
            .await;
        Ok(Saved::new(normalized, outcome))
    }

    async fn persist(&self, scope: &Scope, worksheet: &OutwardWorksheet) -> Result<(), AppError> {
        for (code, row) in &worksheet.rows {
            let saved = SavedOutwardRow {
                row_code: *code,
                row: row.clone(),
            };
            records::upsert(
                self.store.as_ref(),
                Table::Gstr3bSection31,
                scope,
                code.as_str(),
                &saved,
            )
            .await?;
        }
        Ok(())
    }

    /// 丢弃全部手工行, 按当前 GSTR-1 数据重新推导
    pub async fn reset(
        &self,
        session: &Session,
        period: &FilingPeriod,
    ) -> Result<Saved<OutwardWorksheet>, AppError> {
        let scope = scope_for(session, period)?;
        let derived = watch_session(session, self.rederive(&scope).await)?;
        info!("3.1 reset to derived values for user {} ({})", scope.user_id, scope.period);

        let outcome = self
            .summary
            .merge_after_commit(
                session,
                &scope,
                SummarySection::OutwardSupplies,
                worksheet_total(&derived),
            )
            .await;
        Ok(Saved::new(derived, outcome))
    }

    async fn rederive(&self, scope: &Scope) -> Result<OutwardWorksheet, AppError> {
        let removed = self
            .store
            .delete_all(Table::Gstr3bSection31, scope)
            .await?;
        tracing::debug!("discarded {} saved 3.1 rows", removed);
        let sources = self.load_sources(scope).await?;
        Ok(derive_rows(&sources))
    }

    /// GSTR-1 变更后刷新 sec_3_1 (尽力而为)
    pub async fn refresh_summary(&self, session: &Session, scope: &Scope) -> MergeOutcome {
        match self.worksheet_for(scope).await {
            Ok(worksheet) => {
                self.summary
                    .merge_after_commit(
                        session,
                        scope,
                        SummarySection::OutwardSupplies,
                        worksheet_total(&worksheet),
                    )
                    .await
            }
            Err(e) => {
                if matches!(e, AppError::SessionExpired) {
                    session.terminate();
                }
                tracing::warn!(
                    "cannot re-derive 3.1 for user {} ({}): {}",
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NilAmounts;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn manual(code: RowCode, igst: &str) -> SavedOutwardRow {
        SavedOutwardRow {
            row_code: code,
            row: OutwardRow {
                igst: dec(igst),
                source: RowSource::Manual,
                ..OutwardRow::default()
            },
        }
    }

    #[test]
    fn derives_nil_rows_from_buckets() {
        let nil = NilRatedSupplies {
            intra_registered: NilAmounts {
                nil: dec("100"),
                exempted: dec("50"),
                non_gst: dec("7"),
            },
            inter_unregistered: NilAmounts {
                nil: dec("10"),
                ..NilAmounts::default()
            },
            ..NilRatedSupplies::default()
        };
        let sources = OutwardSources {
            nil: Some(nil),
            ..OutwardSources::default()
        };
        let ws = derive_rows(&sources);
        assert_eq!(ws.rows[&RowCode::C].taxable, dec("160"));
        assert_eq!(ws.rows[&RowCode::E].taxable, dec("7"));
        assert!(ws.rows[&RowCode::A].taxable.is_zero());
        assert_eq!(ws.rows.len(), 5);
    }

    #[test]
    fn manual_rows_win_over_derived() {
        let saved = vec![
            manual(RowCode::A, "42"),
            SavedOutwardRow {
                row_code: RowCode::D,
                row: OutwardRow {
                    igst: dec("9"),
                    ..OutwardRow::default()
                },
            },
        ];
        let ws = reconcile(&saved, OutwardWorksheet::default());
        assert_eq!(ws.rows[&RowCode::A].igst, dec("42"));
        assert_eq!(ws.rows[&RowCode::A].source, RowSource::Manual);
        // AUTO 行始终重新推导
        assert!(ws.rows[&RowCode::D].igst.is_zero());
    }

    #[test]
    fn igst_edit_clears_intra_taxes_and_flips_manual() {
        let mut ws = OutwardWorksheet::default();
        apply_edit(&mut ws, RowCode::A, OutwardColumn::Cgst, dec("5"));
        assert_eq!(ws.rows[&RowCode::A].sgst, dec("5"));

        let row = apply_edit(&mut ws, RowCode::A, OutwardColumn::Igst, dec("12"));
        assert_eq!(row.igst, dec("12"));
        assert!(row.cgst.is_zero() && row.sgst.is_zero());
        assert_eq!(row.source, RowSource::Manual);
    }

    #[test]
    fn taxable_edit_keeps_row_auto() {
        let mut ws = OutwardWorksheet::default();
        let row = apply_edit(&mut ws, RowCode::A, OutwardColumn::Taxable, dec("100"));
        assert_eq!(row.source, RowSource::Auto);

        let row = apply_edit(&mut ws, RowCode::C, OutwardColumn::Sgst, dec("3"));
        assert_eq!(row.source, RowSource::Auto);
        assert!(row.cgst.is_zero());
    }

    #[test]
    fn validation_reports_each_violation_by_field() {
        let mut ws = OutwardWorksheet::default();
        ws.rows[&RowCode::A].igst = dec("10");
        ws.rows[&RowCode::A].cgst = dec("5");
        ws.rows[&RowCode::A].sgst = dec("5");
        ws.rows[&RowCode::C].taxable = dec("-1");
        ws.rows[&RowCode::D].cgst = dec("3");
        ws.rows[&RowCode::D].sgst = dec("3.2");

        let errors = validate(&ws);
        assert!(errors.has("3.1(a).igst", ValidationCode::MixedTax));
        assert!(errors.has("3.1(c).taxable", ValidationCode::Negative));
        assert!(errors.has("3.1(d).sgst", ValidationCode::CgstSgstMismatch));
        assert_eq!(errors.errors().len(), 3);
    }

    #[test]
    fn mismatch_within_tolerance_passes() {
        let mut ws = OutwardWorksheet::default();
        ws.rows[&RowCode::A].cgst = dec("3");
        ws.rows[&RowCode::A].sgst = dec("3.1");
        assert!(validate(&ws).is_empty());
    }

    #[test]
    fn unvalidated_rows_are_not_checked() {
        let mut ws = OutwardWorksheet::default();
        ws.rows[&RowCode::B].igst = dec("-4");
        ws.rows[&RowCode::E].cgst = dec("1");
        assert!(validate(&ws).is_empty());
    }
}
