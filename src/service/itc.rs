use super::summary::SummaryService;
use super::{scope_for, watch_session, Saved};
use crate::db::{records, RecordStore, Scope, Table};
use crate::error::{AppError, ValidationCode, ValidationErrors};
use crate::models::{
    round2, FilingPeriod, ItcStatement, ItcWorksheet, SectionTotal, Session, SummarySection,
    TaxAmounts, TaxHead,
};
use bigdecimal::{BigDecimal, Zero};
use std::sync::Arc;
use tracing::info;

pub const ITC_ROW_KEY: &str = "itc";

/// 进项税净额 C = (A3 + A5) - (B1 + B2), 不截断
pub fn net_itc(worksheet: &ItcWorksheet) -> TaxAmounts {
    let available = worksheet.reverse_charge.add(&worksheet.other_itc);
    let reversed = worksheet.rule_reversal.add(&worksheet.other_reversal);
    available.sub(&reversed)
}

pub fn statement(worksheet: ItcWorksheet) -> ItcStatement {
    let net_itc = net_itc(&worksheet);
    ItcStatement { worksheet, net_itc }
}

/// 各行各税目均不得为负
pub fn validate(worksheet: &ItcWorksheet) -> ValidationErrors {
    let zero = BigDecimal::zero();
    let mut errors = ValidationErrors::new();
    let rows = [
        ("4.A(3)", &worksheet.reverse_charge),
        ("4.A(5)", &worksheet.other_itc),
        ("4.B(1)", &worksheet.rule_reversal),
        ("4.B(2)", &worksheet.other_reversal),
    ];
    for (label, amounts) in rows {
        for head in TaxHead::ALL {
            if amounts.get(head) < &zero {
                errors.push(
                    format!("{}.{}", label, head.as_str()),
                    ValidationCode::Negative,
                    format!("{} {} cannot be negative", label, head),
                );
            }
        }
    }
    errors
}

fn rounded(worksheet: &ItcWorksheet) -> ItcWorksheet {
    let round = |amounts: &TaxAmounts| amounts.map(|_, v| round2(v));
    ItcWorksheet {
        reverse_charge: round(&worksheet.reverse_charge),
        other_itc: round(&worksheet.other_itc),
        rule_reversal: round(&worksheet.rule_reversal),
        other_reversal: round(&worksheet.other_reversal),
    }
}

/// 4. 可抵扣进项税
pub struct ItcService {
    store: Arc<dyn RecordStore>,
    summary: SummaryService,
}

impl ItcService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            summary: SummaryService::new(store.clone()),
            store,
        }
    }

    /// 未保存过时各行为 0
    pub async fn worksheet_for(&self, scope: &Scope) -> Result<ItcWorksheet, AppError> {
        Ok(records::get_keyed::<ItcWorksheet>(
            self.store.as_ref(),
            Table::Gstr3bEligibleItc,
            scope,
            ITC_ROW_KEY,
        )
        .await?
        .unwrap_or_default())
    }

    pub async fn load(
        &self,
        session: &Session,
        period: &FilingPeriod,
    ) -> Result<ItcStatement, AppError> {
        let scope = scope_for(session, period)?;
        let worksheet = watch_session(session, self.worksheet_for(&scope).await)?;
        Ok(statement(worksheet))
    }

    pub async fn save(
        &self,
        session: &Session,
        period: &FilingPeriod,
        worksheet: &ItcWorksheet,
    ) -> Result<Saved<ItcStatement>, AppError> {
        let scope = scope_for(session, period)?;
        validate(worksheet).into_result()?;

        let worksheet = rounded(worksheet);
        watch_session(
            session,
            records::upsert(
                self.store.as_ref(),
                Table::Gstr3bEligibleItc,
                &scope,
                ITC_ROW_KEY,
                &worksheet,
            )
            .await,
        )?;

        let statement = statement(worksheet);
        info!(
            "ITC saved for user {} ({}), net: {}",
            scope.user_id,
            scope.period,
            statement.net_itc.total()
        );

        let outcome = self
            .summary
            .merge_after_commit(
                session,
                &scope,
                SummarySection::EligibleItc,
                SectionTotal::from_taxes(&statement.net_itc),
            )
            .await;
        Ok(Saved::new(statement, outcome))
    }
}
