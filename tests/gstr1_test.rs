//! GSTR-1 sections against the memory store: documents, nil rated, HSN, summary export and session expiry.

mod common;

use common::{b2b_input, b2cs_input, dec, dyn_store, period, session, store, HOME_STATE, USER_ID};
use gst_return_rust::db::{StoreOp, Table};
use gst_return_rust::models::{
    DocumentRangeInput, DocumentType, HsnInput, HsnTab, NilAmounts, NilRatedSupplies, RowCode,
    Session, SupplyType, TaxRate, Uqc,
};
use gst_return_rust::service::gstr1::export_summary_csv;
use gst_return_rust::service::{Gstr1Service, OutwardService};
use gst_return_rust::{AppError, BackendError, ValidationCode};

fn range(from: i64, to: i64, cancelled: i64) -> DocumentRangeInput {
    DocumentRangeInput {
        sr_from: from,
        sr_to: to,
        total: to - from + 1,
        cancelled,
    }
}

fn hsn(code: &str, taxable: &str, tab: HsnTab) -> HsnInput {
    HsnInput {
        hsn_code: code.to_string(),
        description: "Steel fasteners".to_string(),
        uqc: Uqc::Kilograms,
        total_quantity: dec("25"),
        taxable_value: dec(taxable),
        rate: TaxRate::percent(12).unwrap(),
        supply_type: SupplyType::IntraState,
        cess: dec("0"),
        tab,
    }
}

#[tokio::test]
async fn b2cs_uses_home_state_without_gstin() {
    let store = store();
    let gstr1 = Gstr1Service::new(dyn_store(&store), HOME_STATE);
    let session = Session::new(USER_ID, None);

    let view = gstr1
        .add_b2cs(&session, &period(), &b2cs_input("33", "1000", 5))
        .await
        .unwrap();
    assert_eq!(view.records[0].record.supply_type, SupplyType::IntraState);

    let view = gstr1
        .add_b2cs(&session, &period(), &b2cs_input("27", "1000", 5))
        .await
        .unwrap();
    assert_eq!(view.records[1].record.supply_type, SupplyType::InterState);
    assert_eq!(view.total.igst, dec("50"));
    assert_eq!(view.total.count, 2);
}

#[tokio::test]
async fn update_and_delete_recompute_totals() {
    let store = store();
    let gstr1 = Gstr1Service::new(dyn_store(&store), HOME_STATE);
    let session = session();
    let period = period();

    let view = gstr1
        .add_b2b(&session, &period, &b2b_input("29AAACB1234C1Z9", "27", "1000", 18))
        .await
        .unwrap();
    let id = view.records[0].id;

    let view = gstr1
        .update_b2b(&session, &period, id, &b2b_input("29AAACB1234C1Z9", "27", "2000", 18))
        .await
        .unwrap();
    assert_eq!(view.total.igst, dec("360"));

    let view = gstr1.delete_b2b(&session, &period, id).await.unwrap();
    assert!(view.records.is_empty());
    assert_eq!(view.total.igst, dec("0"));

    let err = gstr1.delete_b2b(&session, &period, id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn invalid_b2b_is_rejected_before_any_write() {
    let store = store();
    let gstr1 = Gstr1Service::new(dyn_store(&store), HOME_STATE);

    let mut input = b2b_input("29AAACB", "27", "1000", 18);
    input.pos_code = "7".to_string();
    let err = gstr1.add_b2b(&session(), &period(), &input).await.unwrap_err();
    match err {
        AppError::Validation(errors) => {
            assert!(errors.has("recipient_gstin", ValidationCode::InvalidFormat));
            assert!(errors.has("pos_code", ValidationCode::InvalidFormat));
        }
        other => panic!("expected validation error, got {:?}", other),
    }
    assert_eq!(store.row_count(Table::Gstr1B2b), 0);
}

#[tokio::test]
async fn documents_replace_only_their_type() {
    let store = store();
    let gstr1 = Gstr1Service::new(dyn_store(&store), HOME_STATE);
    let session = session();
    let period = period();

    gstr1
        .save_documents(&session, &period, DocumentType::CreditNote, &[range(1, 5, 0)])
        .await
        .unwrap();
    gstr1
        .save_documents(
            &session,
            &period,
            DocumentType::OutwardSupplyInvoice,
            &[range(1, 50, 2), range(51, 60, 0)],
        )
        .await
        .unwrap();
    let view = gstr1
        .save_documents(
            &session,
            &period,
            DocumentType::OutwardSupplyInvoice,
            &[range(1, 80, 5)],
        )
        .await
        .unwrap();

    assert_eq!(view.records.len(), 2);
    // net issued: 5 credit notes + 75 invoices
    assert_eq!(view.total.taxable_value, dec("80"));
}

#[tokio::test]
async fn document_insert_failure_leaves_type_cleared() {
    let store = store();
    let gstr1 = Gstr1Service::new(dyn_store(&store), HOME_STATE);
    let session = session();
    let period = period();

    gstr1
        .save_documents(&session, &period, DocumentType::DebitNote, &[range(1, 3, 0)])
        .await
        .unwrap();
    gstr1
        .save_documents(&session, &period, DocumentType::OutwardSupplyInvoice, &[range(1, 10, 0)])
        .await
        .unwrap();

    store.fail_next(
        StoreOp::Insert,
        Table::Gstr1DocumentsIssued,
        BackendError::Unavailable("timeout".to_string()),
    );
    let err = gstr1
        .save_documents(&session, &period, DocumentType::OutwardSupplyInvoice, &[range(1, 20, 0)])
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Backend(BackendError::Unavailable(_))));

    // 已删除的旧号段不会恢复, 其他类别不受影响
    let view = gstr1.list_documents(&session, &period).await.unwrap();
    assert_eq!(view.records.len(), 1);
    assert_eq!(view.records[0].record.document_type, DocumentType::DebitNote);
}

#[tokio::test]
async fn delete_document_removes_one_range() {
    let store = store();
    let gstr1 = Gstr1Service::new(dyn_store(&store), HOME_STATE);
    let session = session();
    let period = period();

    let view = gstr1
        .save_documents(
            &session,
            &period,
            DocumentType::OutwardSupplyInvoice,
            &[range(1, 50, 2), range(51, 60, 0)],
        )
        .await
        .unwrap();
    let id = view.records[0].id;

    let view = gstr1.delete_document(&session, &period, id).await.unwrap();
    assert_eq!(view.records.len(), 1);
    assert_eq!(view.total.taxable_value, dec("10"));
    assert_eq!(store.row_count(Table::Gstr1DocumentsIssued), 1);

    let err = gstr1.delete_document(&session, &period, id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn cancelled_above_total_is_rejected() {
    let store = store();
    let gstr1 = Gstr1Service::new(dyn_store(&store), HOME_STATE);

    let err = gstr1
        .save_documents(&session(), &period(), DocumentType::CreditNote, &[range(1, 2, 3)])
        .await
        .unwrap_err();
    match err {
        AppError::Validation(errors) => {
            assert!(errors.has("documents[0].cancelled", ValidationCode::CancelledExceedsTotal))
        }
        other => panic!("expected validation error, got {:?}", other),
    }
    assert_eq!(store.row_count(Table::Gstr1DocumentsIssued), 0);
}

#[tokio::test]
async fn nil_rated_feeds_rows_c_and_e() {
    let store = store();
    let gstr1 = Gstr1Service::new(dyn_store(&store), HOME_STATE);
    let outward = OutwardService::new(dyn_store(&store));
    let session = session();
    let period = period();

    let nil = NilRatedSupplies {
        intra_registered: NilAmounts {
            nil: dec("300"),
            exempted: dec("200"),
            non_gst: dec("0"),
        },
        inter_unregistered: NilAmounts {
            non_gst: dec("45.5"),
            ..NilAmounts::default()
        },
        ..NilRatedSupplies::default()
    };
    let saved = gstr1.save_nil(&session, &period, &nil).await.unwrap();
    assert!(saved.summary_warning.is_none());
    assert_eq!(gstr1.load_nil(&session, &period).await.unwrap(), nil);

    let worksheet = outward.load(&session, &period).await.unwrap();
    assert_eq!(worksheet.rows[&RowCode::C].taxable, dec("500"));
    assert_eq!(worksheet.rows[&RowCode::E].taxable, dec("45.50"));

    // 再次保存覆盖同一条记录
    gstr1.save_nil(&session, &period, &NilRatedSupplies::default()).await.unwrap();
    assert_eq!(store.row_count(Table::Gstr1NilRated), 1);
}

#[tokio::test]
async fn hsn_list_filters_by_tab() {
    let store = store();
    let gstr1 = Gstr1Service::new(dyn_store(&store), HOME_STATE);
    let session = session();
    let period = period();

    let view = gstr1
        .add_hsn(&session, &period, &hsn("7318", "1000", HsnTab::B2B))
        .await
        .unwrap();
    assert_eq!(view.total.cgst, dec("60"));
    gstr1
        .add_hsn(&session, &period, &hsn("73181500", "500", HsnTab::B2C))
        .await
        .unwrap();

    let b2c = gstr1.list_hsn(&session, &period, Some(HsnTab::B2C)).await.unwrap();
    assert_eq!(b2c.records.len(), 1);
    assert_eq!(b2c.total.taxable_value, dec("500"));

    let all = gstr1.list_hsn(&session, &period, None).await.unwrap();
    assert_eq!(all.total.taxable_value, dec("1500"));
}

#[tokio::test]
async fn summary_exports_to_csv_file() {
    let store = store();
    let gstr1 = Gstr1Service::new(dyn_store(&store), HOME_STATE);
    let session = session();
    let period = period();

    gstr1
        .add_b2b(&session, &period, &b2b_input("29AAACB1234C1Z9", "27", "50000", 18))
        .await
        .unwrap();
    gstr1
        .add_b2cs(&session, &period, &b2cs_input("33", "20000", 18))
        .await
        .unwrap();

    let summary = gstr1.summary(&session, &period).await.unwrap();
    assert_eq!(summary.rows[0].table, "4A");
    assert_eq!(summary.rows[0].value, dec("59000"));
    assert_eq!(summary.rows[1].table, "7");
    assert_eq!(summary.rows[1].cgst, dec("1800"));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gstr1-summary.csv");
    export_summary_csv(&summary, &path).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    let mut lines = content.lines();
    assert_eq!(
        lines.next(),
        Some("table,description,records,value,igst,cgst,sgst,cess")
    );
    let b2b_line = lines.next().unwrap();
    assert!(b2b_line.starts_with("4A,"));
    assert!(b2b_line.contains(",1,"));
    assert_eq!(content.lines().count(), summary.rows.len() + 1);
}

#[tokio::test]
async fn expired_auth_terminates_session() {
    let store = store();
    let gstr1 = Gstr1Service::new(dyn_store(&store), HOME_STATE);
    let session = session();
    let period = period();

    store.fail_next(
        StoreOp::Select,
        Table::Gstr1B2b,
        BackendError::from_message("Invalid Refresh Token: Already Used"),
    );
    let err = gstr1.list_b2b(&session, &period).await.unwrap_err();
    assert!(matches!(err, AppError::SessionExpired));
    assert!(session.is_terminated());

    // 会话终止后不再访问存储
    let err = gstr1
        .add_b2cs(&session, &period, &b2cs_input("33", "100", 5))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::SessionExpired));
    assert_eq!(store.row_count(Table::Gstr1B2cs), 0);
}
