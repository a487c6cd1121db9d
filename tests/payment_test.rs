//! 6.1 payment worksheet: liabilities from 3.1, credit from 4. and the proceed gate.

mod common;

use common::{b2b_input, dec, dyn_store, period, scope, session, store, HOME_STATE};
use gst_return_rust::db::Table;
use gst_return_rust::models::{ItcWorksheet, PaymentInputs, SummarySection, TaxAmounts};
use gst_return_rust::service::{Gstr1Service, ItcService, PaymentService, SummaryService};
use gst_return_rust::{AppError, MemoryStore, ValidationCode};
use std::sync::Arc;

fn igst(value: &str) -> TaxAmounts {
    TaxAmounts {
        igst: dec(value),
        ..TaxAmounts::default()
    }
}

fn inputs(igst_credit: &str, cash: &str) -> PaymentInputs {
    PaymentInputs {
        itc_igst_used: igst(igst_credit),
        utilizable_cash_balance: igst(cash),
        ..PaymentInputs::default()
    }
}

/// IGST 负债 9000, 可用 IGST 进项 2000
async fn seeded() -> (Arc<MemoryStore>, PaymentService) {
    let store = store();
    let gstr1 = Gstr1Service::new(dyn_store(&store), HOME_STATE);
    let itc = ItcService::new(dyn_store(&store));
    let session = session();
    let period = period();

    gstr1
        .add_b2b(&session, &period, &b2b_input("29AAACB1234C1Z9", "27", "50000", 18))
        .await
        .unwrap();
    itc.save(
        &session,
        &period,
        &ItcWorksheet {
            other_itc: igst("2500"),
            other_reversal: igst("500"),
            ..ItcWorksheet::default()
        },
    )
    .await
    .unwrap();

    let payment = PaymentService::new(dyn_store(&store));
    (store, payment)
}

#[tokio::test]
async fn load_derives_liability_and_credit() {
    let (_store, payment) = seeded().await;

    let worksheet = payment.load(&session(), &period()).await.unwrap();
    assert_eq!(worksheet.tax_payable_other.igst, dec("9000"));
    assert_eq!(worksheet.tax_payable_reverse_charge.igst, dec("0"));
    assert_eq!(worksheet.itc_available.igst, dec("2000"));
    assert_eq!(worksheet.additional_cash_required.igst, dec("9000"));
}

#[tokio::test]
async fn cash_balance_above_liability_blocks_proceed() {
    let (store, payment) = seeded().await;

    let err = payment
        .proceed(&session(), &period(), &inputs("2000", "8000"))
        .await
        .unwrap_err();
    match err {
        AppError::Validation(errors) => {
            assert!(errors.has(
                "6.1.utilizable_cash_balance.igst",
                ValidationCode::CashBalanceExceedsLiability
            ));
            assert_eq!(
                errors.errors()[0].message,
                "Utilizable Cash Balance for IGST cannot exceed Tax Liability"
            );
        }
        other => panic!("expected validation error, got {:?}", other),
    }
    assert_eq!(store.row_count(Table::Gstr3bPaymentTax), 0);
}

#[tokio::test]
async fn credit_above_available_blocks_proceed() {
    let (store, payment) = seeded().await;

    let err = payment
        .proceed(&session(), &period(), &inputs("3000", "0"))
        .await
        .unwrap_err();
    match err {
        AppError::Validation(errors) => {
            assert!(errors.has("6.1.itc_igst_used", ValidationCode::ItcExceedsAvailable))
        }
        other => panic!("expected validation error, got {:?}", other),
    }
    assert_eq!(store.row_count(Table::Gstr3bPaymentTax), 0);
}

#[tokio::test]
async fn proceed_with_exact_balance_saves_and_merges() {
    let (store, payment) = seeded().await;
    let session = session();
    let period = period();

    let saved = payment
        .proceed(&session, &period, &inputs("2000", "7000"))
        .await
        .unwrap();
    assert!(saved.summary_warning.is_none());
    assert_eq!(saved.data.cash_paid_other.igst, dec("7000"));
    assert_eq!(saved.data.additional_cash_required.igst, dec("0"));
    assert_eq!(store.row_count(Table::Gstr3bPaymentTax), 1);

    let summary = SummaryService::new(dyn_store(&store))
        .load(&scope())
        .await
        .unwrap()
        .unwrap();
    assert!(summary.section(SummarySection::PaymentOfTax).is_zero());
    assert_eq!(summary.section(SummarySection::EligibleItc).igst, dec("2000"));

    let reloaded = payment.load(&session, &period).await.unwrap();
    assert_eq!(reloaded.inputs, inputs("2000", "7000"));
}

#[tokio::test]
async fn save_accepts_over_balance_but_rejects_negatives() {
    let (store, payment) = seeded().await;
    let session = session();
    let period = period();

    // 保存不做提交检查
    let saved = payment
        .save(&session, &period, &inputs("0", "10000"))
        .await
        .unwrap();
    assert_eq!(saved.data.additional_cash_required.igst, dec("0"));

    let err = payment
        .save(&session, &period, &inputs("-1", "0"))
        .await
        .unwrap_err();
    match err {
        AppError::Validation(errors) => {
            assert!(errors.has("6.1.itc_igst_used.igst", ValidationCode::Negative))
        }
        other => panic!("expected validation error, got {:?}", other),
    }
    assert_eq!(store.row_count(Table::Gstr3bPaymentTax), 1);
}
