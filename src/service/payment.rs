//! 6.1 缴税: 负债来自 3.1, 进项抵扣上限来自 4. 的净额

use super::itc::{net_itc, ItcService};
use super::outward::OutwardService;
use super::summary::SummaryService;
use super::{scope_for, watch_session, Saved};
use crate::db::{records, RecordStore, Scope, Table};
use crate::error::{AppError, ValidationCode, ValidationErrors};
use crate::models::{
    clamp2, floor_zero, round2, FilingPeriod, OutwardRow, PaymentInputs, PaymentWorksheet,
    RowCode, SectionTotal, Session, SummarySection, TaxAmounts, TaxHead,
};
use bigdecimal::{BigDecimal, Zero};
use std::sync::Arc;
use tracing::{info, warn};

pub const PAYMENT_ROW_KEY: &str = "payment";

/// 可用进项抵扣的税目 (CESS 进项列始终为 0)
const CREDIT_HEADS: [TaxHead; 3] = [TaxHead::Igst, TaxHead::Cgst, TaxHead::Sgst];

/// 计算缴税工作表
///
/// - 列 12 = max(0, 列 7 - (列 8 + 列 9 + 列 10 + 列 11))
/// - 列 13 = 列 6 (反向征收不可用进项抵扣)
/// - 列 19 = max(0, 列 12 + 列 13 - 列 18)
pub fn compute(
    tax_payable_reverse_charge: TaxAmounts,
    tax_payable_other: TaxAmounts,
    inputs: PaymentInputs,
    net_itc: &TaxAmounts,
) -> PaymentWorksheet {
    let itc_cess_used = TaxAmounts::default();

    let cash_paid_other = tax_payable_other.map(|head, payable| {
        let used = inputs.itc_igst_used.get(head)
            + inputs.itc_cgst_used.get(head)
            + inputs.itc_sgst_used.get(head)
            + itc_cess_used.get(head);
        clamp2(&(payable - used))
    });
    let cash_paid_reverse_charge = tax_payable_reverse_charge.clone();
    let additional_cash_required = cash_paid_other.map(|head, paid| {
        clamp2(&(paid + cash_paid_reverse_charge.get(head) - inputs.utilizable_cash_balance.get(head)))
    });
    let itc_available = net_itc.map(|_, v| floor_zero(v));

    PaymentWorksheet {
        tax_payable_reverse_charge,
        tax_payable_other,
        inputs,
        itc_cess_used,
        cash_paid_other,
        cash_paid_reverse_charge,
        additional_cash_required,
        itc_available,
    }
}

/// 可编辑输入均不得为负
pub fn validate_inputs(inputs: &PaymentInputs) -> ValidationErrors {
    let zero = BigDecimal::zero();
    let mut errors = ValidationErrors::new();
    let columns = [
        ("6.1.itc_igst_used", &inputs.itc_igst_used),
        ("6.1.itc_cgst_used", &inputs.itc_cgst_used),
        ("6.1.itc_sgst_used", &inputs.itc_sgst_used),
        ("6.1.utilizable_cash_balance", &inputs.utilizable_cash_balance),
    ];
    for (label, amounts) in columns {
        for head in TaxHead::ALL {
            if amounts.get(head) < &zero {
                errors.push(
                    format!("{}.{}", label, head.as_str()),
                    ValidationCode::Negative,
                    format!("{} for {} cannot be negative", label, head),
                );
            }
        }
    }
    errors
}

/// 提交前检查
///
/// 每个税目: 可用现金余额 <= 列 12 + 列 13 (相等可通过);
/// 每个进项税目: 已使用进项 <= 可用净额。
pub fn validate_proceed(worksheet: &PaymentWorksheet) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    for head in TaxHead::ALL {
        let liability = worksheet.cash_paid_other.get(head) + worksheet.cash_paid_reverse_charge.get(head);
        if worksheet.inputs.utilizable_cash_balance.get(head) > &liability {
            errors.push(
                format!("6.1.utilizable_cash_balance.{}", head.as_str()),
                ValidationCode::CashBalanceExceedsLiability,
                format!(
                    "Utilizable Cash Balance for {} cannot exceed Tax Liability",
                    head
                ),
            );
        }
    }

    for credit in CREDIT_HEADS {
        let consumed = worksheet.credit_consumed(credit);
        if &consumed > worksheet.itc_available.get(credit) {
            errors.push(
                format!("6.1.itc_{}_used", credit.as_str()),
                ValidationCode::ItcExceedsAvailable,
                format!(
                    "{} credit used ({}) exceeds ITC available ({})",
                    credit,
                    consumed,
                    worksheet.itc_available.get(credit)
                ),
            );
        }
    }
    errors
}

fn row_taxes(row: Option<&OutwardRow>) -> TaxAmounts {
    row.map(|r| r.taxes()).unwrap_or_default()
}

fn rounded(inputs: &PaymentInputs) -> PaymentInputs {
    let round = |amounts: &TaxAmounts| amounts.map(|_, v| round2(v));
    PaymentInputs {
        itc_igst_used: round(&inputs.itc_igst_used),
        itc_cgst_used: round(&inputs.itc_cgst_used),
        itc_sgst_used: round(&inputs.itc_sgst_used),
        utilizable_cash_balance: round(&inputs.utilizable_cash_balance),
    }
}

pub struct PaymentService {
    store: Arc<dyn RecordStore>,
    outward: OutwardService,
    itc: ItcService,
    summary: SummaryService,
}

impl PaymentService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            outward: OutwardService::new(store.clone()),
            itc: ItcService::new(store.clone()),
            summary: SummaryService::new(store.clone()),
            store,
        }
    }

    /// 用已保存输入 (或给定输入) 与最新负债/进项重新计算
    async fn worksheet_for(
        &self,
        scope: &Scope,
        inputs: Option<PaymentInputs>,
    ) -> Result<PaymentWorksheet, AppError> {
        let outward = self.outward.worksheet_for(scope).await?;
        let itc = self.itc.worksheet_for(scope).await?;
        let inputs = match inputs {
            Some(inputs) => inputs,
            None => records::get_keyed::<PaymentInputs>(
                self.store.as_ref(),
                Table::Gstr3bPaymentTax,
                scope,
                PAYMENT_ROW_KEY,
            )
            .await?
            .unwrap_or_default(),
        };

        Ok(compute(
            row_taxes(outward.rows.get(&RowCode::D)),
            row_taxes(outward.rows.get(&RowCode::A)),
            inputs,
            &net_itc(&itc),
        ))
    }

    pub async fn load(
        &self,
        session: &Session,
        period: &FilingPeriod,
    ) -> Result<PaymentWorksheet, AppError> {
        let scope = scope_for(session, period)?;
        watch_session(session, self.worksheet_for(&scope, None).await)
    }

    /// 保存输入, 合并 sec_6_1 (列 19)
    pub async fn save(
        &self,
        session: &Session,
        period: &FilingPeriod,
        inputs: &PaymentInputs,
    ) -> Result<Saved<PaymentWorksheet>, AppError> {
        let scope = scope_for(session, period)?;
        validate_inputs(inputs).into_result()?;
        let inputs = rounded(inputs);

        let worksheet = watch_session(session, self.persist(&scope, inputs).await)?;
        info!(
            "payment saved for user {} ({}), additional cash: {}",
            scope.user_id,
            scope.period,
            worksheet.additional_cash_required.total()
        );

        let outcome = self
            .summary
            .merge_after_commit(
                session,
                &scope,
                SummarySection::PaymentOfTax,
                SectionTotal::from_taxes(&worksheet.additional_cash_required),
            )
            .await;
        Ok(Saved::new(worksheet, outcome))
    }

    /// 提交: 任一税目不满足条件则整体拒绝, 不写入
    pub async fn proceed(
        &self,
        session: &Session,
        period: &FilingPeriod,
        inputs: &PaymentInputs,
    ) -> Result<Saved<PaymentWorksheet>, AppError> {
        let scope = scope_for(session, period)?;
        validate_inputs(inputs).into_result()?;
        let inputs = rounded(inputs);

        let preview = watch_session(session, self.worksheet_for(&scope, Some(inputs.clone())).await)?;
        let errors = validate_proceed(&preview);
        if !errors.is_empty() {
            warn!(
                "payment proceed blocked for user {} ({}): {}",
                scope.user_id, scope.period, errors
            );
            return Err(AppError::Validation(errors));
        }

        self.save(session, period, &inputs).await
    }

    async fn persist(
        &self,
        scope: &Scope,
        inputs: PaymentInputs,
    ) -> Result<PaymentWorksheet, AppError> {
        records::upsert(
            self.store.as_ref(),
            Table::Gstr3bPaymentTax,
            scope,
            PAYMENT_ROW_KEY,
            &inputs,
        )
        .await?;
        self.worksheet_for(scope, Some(inputs)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn amounts(igst: &str, cgst: &str, sgst: &str) -> TaxAmounts {
        TaxAmounts {
            igst: dec(igst),
            cgst: dec(cgst),
            sgst: dec(sgst),
            cess: BigDecimal::zero(),
        }
    }

    #[test]
    fn cash_columns_follow_liability_and_credit() {
        let inputs = PaymentInputs {
            itc_igst_used: amounts("300", "50", "0"),
            utilizable_cash_balance: amounts("100", "0", "0"),
            ..PaymentInputs::default()
        };
        let ws = compute(
            amounts("40", "0", "0"),
            amounts("1000", "100", "100"),
            inputs,
            &amounts("500", "0", "0"),
        );

        assert_eq!(ws.cash_paid_other.igst, dec("700"));
        assert_eq!(ws.cash_paid_other.cgst, dec("50"));
        assert_eq!(ws.cash_paid_reverse_charge.igst, dec("40"));
        assert_eq!(ws.additional_cash_required.igst, dec("640"));
        assert_eq!(ws.additional_cash_required.sgst, dec("100"));
    }

    #[test]
    fn over_utilised_credit_floors_cash_at_zero() {
        let inputs = PaymentInputs {
            itc_cgst_used: amounts("0", "500", "0"),
            ..PaymentInputs::default()
        };
        let ws = compute(TaxAmounts::default(), amounts("0", "100", "0"), inputs, &TaxAmounts::default());
        assert!(ws.cash_paid_other.cgst.is_zero());
    }

    #[test]
    fn negative_net_itc_gives_no_capacity() {
        let ws = compute(
            TaxAmounts::default(),
            TaxAmounts::default(),
            PaymentInputs::default(),
            &amounts("-20", "5", "0"),
        );
        assert!(ws.itc_available.igst.is_zero());
        assert_eq!(ws.itc_available.cgst, dec("5"));
    }

    #[test]
    fn proceed_gate_is_per_head_and_equal_passes() {
        let liability = amounts("100", "50", "50");
        let inputs = PaymentInputs {
            utilizable_cash_balance: amounts("100", "60", "50"),
            ..PaymentInputs::default()
        };
        let ws = compute(TaxAmounts::default(), liability, inputs, &TaxAmounts::default());
        let errors = validate_proceed(&ws);

        assert_eq!(errors.errors().len(), 1);
        assert!(errors.has(
            "6.1.utilizable_cash_balance.cgst",
            ValidationCode::CashBalanceExceedsLiability
        ));
        assert_eq!(
            errors.errors()[0].message,
            "Utilizable Cash Balance for CGST cannot exceed Tax Liability"
        );
    }

    #[test]
    fn credit_beyond_available_blocks_proceed() {
        let inputs = PaymentInputs {
            itc_igst_used: amounts("80", "30", "0"),
            ..PaymentInputs::default()
        };
        let ws = compute(
            TaxAmounts::default(),
            amounts("100", "50", "0"),
            inputs,
            &amounts("100", "0", "0"),
        );
        let errors = validate_proceed(&ws);
        assert!(errors.has("6.1.itc_igst_used", ValidationCode::ItcExceedsAvailable));
    }
}
