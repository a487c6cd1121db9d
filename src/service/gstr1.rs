//! GSTR-1 分节: B2B / B2CS / HSN / 已开具单据 / 零税率, 以及 GSTR-1 汇总报表

use super::aggregator::aggregate;
use super::outward::OutwardService;
use super::splitter::{split_lines, split_tax};
use super::{scope_for, watch_session, Saved};
use crate::db::{records, RecordStore, Scope, Stored, Table};
use crate::error::{AppError, ValidationCode, ValidationErrors};
use crate::models::{
    round2, B2bInvoice, B2bInvoiceInput, B2csInput, B2csRow, DocumentRange, DocumentRangeInput,
    DocumentType, FilingPeriod, HsnInput, HsnRow, HsnTab, NilRatedSupplies, SectionTotal,
    Session, SupplyType, TaxLine,
};
use bigdecimal::{BigDecimal, Zero};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// 零税率记录的行键 (每个申报期一条)
pub const NIL_RATED_ROW_KEY: &str = "nil_rated";

const GSTIN_LEN: usize = 15;

/// 分节视图: 明细 + 重新计算的合计
#[derive(Debug, Clone, Serialize)]
pub struct SectionView<T> {
    pub records: Vec<Stored<T>>,
    pub total: SectionTotal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary_warning: Option<String>,
}

fn is_state_code(code: &str) -> bool {
    code.len() == 2 && code.chars().all(|c| c.is_ascii_digit())
}

fn check_state_code(errors: &mut ValidationErrors, field: &str, code: &str) {
    if code.is_empty() {
        errors.push(field, ValidationCode::Required, "Place of supply is required");
    } else if !is_state_code(code) {
        errors.push(
            field,
            ValidationCode::InvalidFormat,
            format!("'{}' is not a two digit state code", code),
        );
    }
}

fn check_non_negative(errors: &mut ValidationErrors, field: &str, value: &BigDecimal) {
    if *value < BigDecimal::zero() {
        errors.push(field, ValidationCode::Negative, format!("{} cannot be negative", field));
    }
}

fn check_positive(errors: &mut ValidationErrors, field: &str, value: &BigDecimal) {
    if *value <= BigDecimal::zero() {
        errors.push(
            field,
            ValidationCode::NonPositive,
            format!("{} must be greater than zero", field),
        );
    }
}

/// 校验 B2B 录入并计算税额
///
/// 供给类型按收票方 GSTIN 州代码与供货地比较。
pub fn build_b2b(input: &B2bInvoiceInput) -> Result<B2bInvoice, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let gstin = input.recipient_gstin.trim().to_uppercase();
    let pos = input.pos_code.trim();

    if gstin.is_empty() {
        errors.push("recipient_gstin", ValidationCode::Required, "Recipient GSTIN is required");
    } else if gstin.len() != GSTIN_LEN
        || !gstin.chars().all(|c| c.is_ascii_alphanumeric())
        || !is_state_code(&gstin[0..2])
    {
        errors.push(
            "recipient_gstin",
            ValidationCode::InvalidFormat,
            "GSTIN must be 15 characters starting with a state code",
        );
    }
    if input.invoice_number.trim().is_empty() {
        errors.push("invoice_number", ValidationCode::Required, "Invoice number is required");
    }
    check_positive(&mut errors, "total_invoice_value", &input.total_invoice_value);
    check_state_code(&mut errors, "pos_code", pos);
    if input.rate_lines.is_empty() {
        errors.push("rate_lines", ValidationCode::Required, "At least one rate line is required");
    }
    for (i, line) in input.rate_lines.iter().enumerate() {
        check_non_negative(&mut errors, &format!("rate_lines[{}].taxable_value", i), &line.taxable_value);
    }
    check_non_negative(&mut errors, "cess", &input.cess);
    if !errors.is_empty() {
        return Err(errors);
    }

    let supply_type = SupplyType::from_state_codes(&gstin[0..2], pos);
    let (taxable, split) = split_lines(
        input.rate_lines.iter().map(|l| (&l.taxable_value, &l.rate)),
        supply_type,
    );

    Ok(B2bInvoice {
        recipient_gstin: gstin,
        recipient_name: input.recipient_name.trim().to_string(),
        invoice_number: input.invoice_number.trim().to_string(),
        invoice_date: input.invoice_date,
        total_invoice_value: round2(&input.total_invoice_value),
        pos_code: pos.to_string(),
        supply_type,
        rate_lines: input.rate_lines.clone(),
        taxable_value: Some(round2(&taxable)),
        igst: Some(split.igst),
        cgst: Some(split.cgst),
        sgst: Some(split.sgst),
        cess: Some(round2(&input.cess)),
    })
}

/// 校验 B2C (其他) 录入; 供给类型按供货方州代码与供货地比较
pub fn build_b2cs(input: &B2csInput, supplier_state: &str) -> Result<B2csRow, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let pos = input.pos_code.trim();

    check_state_code(&mut errors, "pos_code", pos);
    check_positive(&mut errors, "taxable_value", &input.taxable_value);
    if input.rate.is_zero() {
        errors.push("rate", ValidationCode::InvalidRate, "Select a non-zero tax rate");
    }
    check_non_negative(&mut errors, "cess", &input.cess);
    if !errors.is_empty() {
        return Err(errors);
    }

    let supply_type = SupplyType::from_state_codes(supplier_state, pos);
    let split = split_tax(&input.taxable_value, &input.rate, supply_type);
    Ok(B2csRow {
        pos_code: pos.to_string(),
        supply_type,
        taxable_value: Some(round2(&input.taxable_value)),
        rate: input.rate.clone(),
        igst: Some(split.igst),
        cgst: Some(split.cgst),
        sgst: Some(split.sgst),
        cess: Some(round2(&input.cess)),
    })
}

pub fn build_hsn(input: &HsnInput) -> Result<HsnRow, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let code = input.hsn_code.trim();

    if code.is_empty() {
        errors.push("hsn_code", ValidationCode::Required, "HSN code is required");
    } else if !(4..=8).contains(&code.len()) || !code.chars().all(|c| c.is_ascii_digit()) {
        errors.push("hsn_code", ValidationCode::InvalidFormat, "HSN code must be 4 to 8 digits");
    }
    check_non_negative(&mut errors, "total_quantity", &input.total_quantity);
    check_non_negative(&mut errors, "taxable_value", &input.taxable_value);
    check_non_negative(&mut errors, "cess", &input.cess);
    if !errors.is_empty() {
        return Err(errors);
    }

    let split = split_tax(&input.taxable_value, &input.rate, input.supply_type);
    Ok(HsnRow {
        hsn_code: code.to_string(),
        description: input.description.trim().to_string(),
        uqc: input.uqc,
        total_quantity: input.total_quantity.clone(),
        taxable_value: Some(round2(&input.taxable_value)),
        rate: input.rate.clone(),
        supply_type: input.supply_type,
        igst: Some(split.igst),
        cgst: Some(split.cgst),
        sgst: Some(split.sgst),
        cess: Some(round2(&input.cess)),
        tab: input.tab,
    })
}

/// 单据号段: 数值不得为负, 作废数不得超过总数
pub fn validate_documents(rows: &[DocumentRangeInput]) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    for (i, row) in rows.iter().enumerate() {
        let fields = [
            ("sr_from", row.sr_from),
            ("sr_to", row.sr_to),
            ("total", row.total),
            ("cancelled", row.cancelled),
        ];
        for (name, value) in fields {
            if value < 0 {
                errors.push(
                    format!("documents[{}].{}", i, name),
                    ValidationCode::Negative,
                    format!("{} cannot be negative", name),
                );
            }
        }
        if row.cancelled > row.total {
            errors.push(
                format!("documents[{}].cancelled", i),
                ValidationCode::CancelledExceedsTotal,
                "Cancelled cannot exceed total number",
            );
        }
    }
    errors
}

pub fn validate_nil(nil: &NilRatedSupplies) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    for (bucket, amounts) in nil.buckets() {
        check_non_negative(&mut errors, &format!("{}.nil", bucket), &amounts.nil);
        check_non_negative(&mut errors, &format!("{}.exempted", bucket), &amounts.exempted);
        check_non_negative(&mut errors, &format!("{}.non_gst", bucket), &amounts.non_gst);
    }
    errors
}

/// GSTR-1 汇总报表的一行
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Gstr1SummaryRow {
    pub table: &'static str,
    pub description: &'static str,
    pub records: usize,
    pub value: BigDecimal,
    pub igst: BigDecimal,
    pub cgst: BigDecimal,
    pub sgst: BigDecimal,
    pub cess: BigDecimal,
}

impl Gstr1SummaryRow {
    fn from_total(table: &'static str, description: &'static str, value: BigDecimal, total: &SectionTotal) -> Self {
        Self {
            table,
            description,
            records: total.count,
            value,
            igst: total.igst.clone(),
            cgst: total.cgst.clone(),
            sgst: total.sgst.clone(),
            cess: total.cess.clone(),
        }
    }

    fn value_only(table: &'static str, description: &'static str, records: usize, value: BigDecimal) -> Self {
        Self::from_total(table, description, value, &SectionTotal { count: records, ..SectionTotal::default() })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Gstr1Summary {
    pub period: FilingPeriod,
    pub rows: Vec<Gstr1SummaryRow>,
}

/// GSTR-1 各分节数据
#[derive(Debug, Clone, Default)]
pub struct Gstr1Sections {
    pub b2b: Vec<B2bInvoice>,
    pub b2cs: Vec<B2csRow>,
    pub nil: NilRatedSupplies,
    pub hsn: Vec<HsnRow>,
    pub documents: Vec<DocumentRange>,
}

/// 组装汇总报表 (4A, 7, 8, 12, 13)
pub fn build_summary(period: &FilingPeriod, sections: &Gstr1Sections) -> Gstr1Summary {
    let b2b = aggregate(&sections.b2b);
    let b2b_value = sections
        .b2b
        .iter()
        .fold(BigDecimal::zero(), |acc, inv| acc + &inv.total_invoice_value);
    let b2cs = aggregate(&sections.b2cs);

    let hsn_b2b: Vec<&HsnRow> = sections.hsn.iter().filter(|r| r.tab == HsnTab::B2B).collect();
    let hsn_b2c: Vec<&HsnRow> = sections.hsn.iter().filter(|r| r.tab == HsnTab::B2C).collect();
    let hsn = aggregate(&sections.hsn);
    let hsn_b2b_total = aggregate(hsn_b2b.iter().copied());
    let hsn_b2c_total = aggregate(hsn_b2c.iter().copied());

    let docs = aggregate(&sections.documents);
    let nil = &sections.nil;
    let nil_records = nil
        .buckets()
        .iter()
        .filter(|(_, a)| !(a.nil.is_zero() && a.exempted.is_zero() && a.non_gst.is_zero()))
        .count();

    let rows = vec![
        Gstr1SummaryRow::from_total(
            "4A",
            "Taxable outward supplies made to registered persons",
            b2b_value,
            &b2b,
        ),
        Gstr1SummaryRow::from_total(
            "7",
            "Taxable supplies to unregistered persons (B2C Others)",
            b2cs.taxable_value.clone(),
            &b2cs,
        ),
        Gstr1SummaryRow::value_only("8", "Nil rated supplies", nil_records, nil.nil_total()),
        Gstr1SummaryRow::value_only("8", "Exempted supplies", nil_records, nil.exempted_total()),
        Gstr1SummaryRow::value_only("8", "Non-GST supplies", nil_records, nil.non_gst_total()),
        Gstr1SummaryRow::from_total("12", "HSN-wise summary of outward supplies", hsn.taxable_value.clone(), &hsn),
        Gstr1SummaryRow::from_total("12", "HSN summary - B2B", hsn_b2b_total.taxable_value.clone(), &hsn_b2b_total),
        Gstr1SummaryRow::from_total("12", "HSN summary - B2C", hsn_b2c_total.taxable_value.clone(), &hsn_b2c_total),
        Gstr1SummaryRow::value_only("13", "Documents issued (net of cancelled)", docs.count, docs.taxable_value),
    ];

    Gstr1Summary {
        period: period.clone(),
        rows,
    }
}

fn write_summary<W: std::io::Write>(
    summary: &Gstr1Summary,
    writer: &mut csv::Writer<W>,
) -> Result<(), csv::Error> {
    writer.write_record([
        "table", "description", "records", "value", "igst", "cgst", "sgst", "cess",
    ])?;
    for row in &summary.rows {
        writer.write_record(&[
            row.table.to_string(),
            row.description.to_string(),
            row.records.to_string(),
            row.value.to_string(),
            row.igst.to_string(),
            row.cgst.to_string(),
            row.sgst.to_string(),
            row.cess.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// 汇总报表导出为 CSV 文本
pub fn summary_csv(summary: &Gstr1Summary) -> Result<String, AppError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    write_summary(summary, &mut writer).map_err(|e| AppError::Export(e.to_string()))?;
    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::Export(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| AppError::Export(e.to_string()))
}

/// 导出汇总报表到 CSV 文件
pub fn export_summary_csv(
    summary: &Gstr1Summary,
    output_path: &Path,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    use csv::Writer;
    use std::fs::File;

    let file = File::create(output_path)?;
    let mut writer = Writer::from_writer(file);
    write_summary(summary, &mut writer)?;
    Ok(())
}

pub struct Gstr1Service {
    store: Arc<dyn RecordStore>,
    outward: OutwardService,
    home_state_code: String,
}

impl Gstr1Service {
    pub fn new(store: Arc<dyn RecordStore>, home_state_code: impl Into<String>) -> Self {
        Self {
            outward: OutwardService::new(store.clone()),
            store,
            home_state_code: home_state_code.into(),
        }
    }

    async fn view<T>(&self, scope: &Scope, table: Table) -> Result<SectionView<T>, AppError>
    where
        T: DeserializeOwned + TaxLine,
    {
        let records = records::list::<T>(self.store.as_ref(), table, scope).await?;
        let total = aggregate(records.iter().map(|s| &s.record));
        Ok(SectionView {
            records,
            total,
            summary_warning: None,
        })
    }

    /// 变更后的分节视图, 并刷新 sec_3_1
    async fn view_after_change<T>(
        &self,
        session: &Session,
        scope: &Scope,
        table: Table,
    ) -> Result<SectionView<T>, AppError>
    where
        T: DeserializeOwned + TaxLine,
    {
        let mut view = watch_session(session, self.view::<T>(scope, table).await)?;
        view.summary_warning = self.outward.refresh_summary(session, scope).await.warning;
        Ok(view)
    }

    // ---- B2B ----

    pub async fn list_b2b(
        &self,
        session: &Session,
        period: &FilingPeriod,
    ) -> Result<SectionView<B2bInvoice>, AppError> {
        let scope = scope_for(session, period)?;
        watch_session(session, self.view(&scope, Table::Gstr1B2b).await)
    }

    pub async fn add_b2b(
        &self,
        session: &Session,
        period: &FilingPeriod,
        input: &B2bInvoiceInput,
    ) -> Result<SectionView<B2bInvoice>, AppError> {
        let scope = scope_for(session, period)?;
        let invoice = build_b2b(input).map_err(AppError::Validation)?;
        let id = watch_session(
            session,
            records::insert(self.store.as_ref(), Table::Gstr1B2b, &scope, &invoice).await,
        )?;
        info!(
            "B2B invoice {} added as {} for user {} ({})",
            invoice.invoice_number, id, scope.user_id, scope.period
        );
        self.view_after_change(session, &scope, Table::Gstr1B2b).await
    }

    pub async fn update_b2b(
        &self,
        session: &Session,
        period: &FilingPeriod,
        id: i64,
        input: &B2bInvoiceInput,
    ) -> Result<SectionView<B2bInvoice>, AppError> {
        let scope = scope_for(session, period)?;
        let invoice = build_b2b(input).map_err(AppError::Validation)?;
        watch_session(
            session,
            records::update(self.store.as_ref(), Table::Gstr1B2b, &scope, id, &invoice).await,
        )?;
        info!("B2B invoice {} updated for user {}", id, scope.user_id);
        self.view_after_change(session, &scope, Table::Gstr1B2b).await
    }

    pub async fn delete_b2b(
        &self,
        session: &Session,
        period: &FilingPeriod,
        id: i64,
    ) -> Result<SectionView<B2bInvoice>, AppError> {
        let scope = scope_for(session, period)?;
        watch_session(
            session,
            records::delete(self.store.as_ref(), Table::Gstr1B2b, &scope, id).await,
        )?;
        info!("B2B invoice {} deleted for user {}", id, scope.user_id);
        self.view_after_change(session, &scope, Table::Gstr1B2b).await
    }

    // ---- B2CS ----

    pub async fn list_b2cs(
        &self,
        session: &Session,
        period: &FilingPeriod,
    ) -> Result<SectionView<B2csRow>, AppError> {
        let scope = scope_for(session, period)?;
        watch_session(session, self.view(&scope, Table::Gstr1B2cs).await)
    }

    pub async fn add_b2cs(
        &self,
        session: &Session,
        period: &FilingPeriod,
        input: &B2csInput,
    ) -> Result<SectionView<B2csRow>, AppError> {
        let scope = scope_for(session, period)?;
        let row = build_b2cs(input, session.supplier_state_code(&self.home_state_code))
            .map_err(AppError::Validation)?;
        watch_session(
            session,
            records::insert(self.store.as_ref(), Table::Gstr1B2cs, &scope, &row).await,
        )?;
        info!(
            "B2CS row for POS {} ({}) added for user {} ({})",
            row.pos_code, row.supply_type, scope.user_id, scope.period
        );
        self.view_after_change(session, &scope, Table::Gstr1B2cs).await
    }

    pub async fn update_b2cs(
        &self,
        session: &Session,
        period: &FilingPeriod,
        id: i64,
        input: &B2csInput,
    ) -> Result<SectionView<B2csRow>, AppError> {
        let scope = scope_for(session, period)?;
        let row = build_b2cs(input, session.supplier_state_code(&self.home_state_code))
            .map_err(AppError::Validation)?;
        watch_session(
            session,
            records::update(self.store.as_ref(), Table::Gstr1B2cs, &scope, id, &row).await,
        )?;
        info!("B2CS row {} updated for user {}", id, scope.user_id);
        self.view_after_change(session, &scope, Table::Gstr1B2cs).await
    }

    pub async fn delete_b2cs(
        &self,
        session: &Session,
        period: &FilingPeriod,
        id: i64,
    ) -> Result<SectionView<B2csRow>, AppError> {
        let scope = scope_for(session, period)?;
        watch_session(
            session,
            records::delete(self.store.as_ref(), Table::Gstr1B2cs, &scope, id).await,
        )?;
        info!("B2CS row {} deleted for user {}", id, scope.user_id);
        self.view_after_change(session, &scope, Table::Gstr1B2cs).await
    }

    // ---- HSN ----

    /// HSN 行, 可按页签过滤
    pub async fn list_hsn(
        &self,
        session: &Session,
        period: &FilingPeriod,
        tab: Option<HsnTab>,
    ) -> Result<SectionView<HsnRow>, AppError> {
        let scope = scope_for(session, period)?;
        let mut view = watch_session(session, self.view::<HsnRow>(&scope, Table::Gstr1Hsn).await)?;
        if let Some(tab) = tab {
            view.records.retain(|r| r.record.tab == tab);
            view.total = aggregate(view.records.iter().map(|s| &s.record));
        }
        Ok(view)
    }

    pub async fn add_hsn(
        &self,
        session: &Session,
        period: &FilingPeriod,
        input: &HsnInput,
    ) -> Result<SectionView<HsnRow>, AppError> {
        let scope = scope_for(session, period)?;
        let row = build_hsn(input).map_err(AppError::Validation)?;
        watch_session(
            session,
            records::insert(self.store.as_ref(), Table::Gstr1Hsn, &scope, &row).await,
        )?;
        info!("HSN {} added for user {} ({})", row.hsn_code, scope.user_id, scope.period);
        self.list_hsn(session, period, Some(row.tab)).await
    }

    pub async fn delete_hsn(
        &self,
        session: &Session,
        period: &FilingPeriod,
        id: i64,
    ) -> Result<SectionView<HsnRow>, AppError> {
        let scope = scope_for(session, period)?;
        watch_session(
            session,
            records::delete(self.store.as_ref(), Table::Gstr1Hsn, &scope, id).await,
        )?;
        info!("HSN row {} deleted for user {}", id, scope.user_id);
        self.list_hsn(session, period, None).await
    }

    // ---- 已开具单据 ----

    pub async fn list_documents(
        &self,
        session: &Session,
        period: &FilingPeriod,
    ) -> Result<SectionView<DocumentRange>, AppError> {
        let scope = scope_for(session, period)?;
        watch_session(session, self.view(&scope, Table::Gstr1DocumentsIssued).await)
    }

    /// 先删除该类别的全部号段再逐条插入
    ///
    /// 插入中途失败时已删除的号段不会恢复, 需要重新保存。
    pub async fn save_documents(
        &self,
        session: &Session,
        period: &FilingPeriod,
        document_type: DocumentType,
        rows: &[DocumentRangeInput],
    ) -> Result<SectionView<DocumentRange>, AppError> {
        let scope = scope_for(session, period)?;
        validate_documents(rows).into_result()?;

        watch_session(
            session,
            self.replace_documents(&scope, document_type, rows).await,
        )?;
        info!(
            "{} document ranges saved for '{}' (user {}, {})",
            rows.len(),
            document_type.label(),
            scope.user_id,
            scope.period
        );
        self.list_documents(session, period).await
    }

    async fn replace_documents(
        &self,
        scope: &Scope,
        document_type: DocumentType,
        rows: &[DocumentRangeInput],
    ) -> Result<(), AppError> {
        let store = self.store.as_ref();
        let existing = records::list::<DocumentRange>(store, Table::Gstr1DocumentsIssued, scope).await?;
        for stored in existing.iter().filter(|s| s.record.document_type == document_type) {
            records::delete(store, Table::Gstr1DocumentsIssued, scope, stored.id).await?;
        }
        for row in rows {
            let range = DocumentRange {
                document_type,
                sr_from: row.sr_from,
                sr_to: row.sr_to,
                total: row.total,
                cancelled: row.cancelled,
            };
            records::insert(store, Table::Gstr1DocumentsIssued, scope, &range).await?;
        }
        Ok(())
    }

    pub async fn delete_document(
        &self,
        session: &Session,
        period: &FilingPeriod,
        id: i64,
    ) -> Result<SectionView<DocumentRange>, AppError> {
        let scope = scope_for(session, period)?;
        watch_session(
            session,
            records::delete(self.store.as_ref(), Table::Gstr1DocumentsIssued, &scope, id).await,
        )?;
        info!("document range {} deleted for user {} ({})", id, scope.user_id, scope.period);
        self.list_documents(session, period).await
    }

    // ---- 零税率 / 免税 / 非 GST ----

    pub async fn load_nil(
        &self,
        session: &Session,
        period: &FilingPeriod,
    ) -> Result<NilRatedSupplies, AppError> {
        let scope = scope_for(session, period)?;
        let nil = watch_session(
            session,
            records::get_keyed::<NilRatedSupplies>(
                self.store.as_ref(),
                Table::Gstr1NilRated,
                &scope,
                NIL_RATED_ROW_KEY,
            )
            .await,
        )?;
        Ok(nil.unwrap_or_default())
    }

    pub async fn save_nil(
        &self,
        session: &Session,
        period: &FilingPeriod,
        nil: &NilRatedSupplies,
    ) -> Result<Saved<NilRatedSupplies>, AppError> {
        let scope = scope_for(session, period)?;
        validate_nil(nil).into_result()?;
        watch_session(
            session,
            records::upsert(
                self.store.as_ref(),
                Table::Gstr1NilRated,
                &scope,
                NIL_RATED_ROW_KEY,
                nil,
            )
            .await,
        )?;
        info!("nil rated supplies saved for user {} ({})", scope.user_id, scope.period);

        let outcome = self.outward.refresh_summary(session, &scope).await;
        Ok(Saved::new(nil.clone(), outcome))
    }

    // ---- 汇总报表 ----

    pub async fn summary(
        &self,
        session: &Session,
        period: &FilingPeriod,
    ) -> Result<Gstr1Summary, AppError> {
        let scope = scope_for(session, period)?;
        let sections = watch_session(session, self.load_sections(&scope).await)?;
        Ok(build_summary(period, &sections))
    }

    async fn load_sections(&self, scope: &Scope) -> Result<Gstr1Sections, AppError> {
        let store = self.store.as_ref();
        let (b2b, b2cs, hsn, documents, nil) = futures::try_join!(
            records::list::<B2bInvoice>(store, Table::Gstr1B2b, scope),
            records::list::<B2csRow>(store, Table::Gstr1B2cs, scope),
            records::list::<HsnRow>(store, Table::Gstr1Hsn, scope),
            records::list::<DocumentRange>(store, Table::Gstr1DocumentsIssued, scope),
            records::get_keyed::<NilRatedSupplies>(
                store,
                Table::Gstr1NilRated,
                scope,
                NIL_RATED_ROW_KEY
            ),
        )?;

        Ok(Gstr1Sections {
            b2b: b2b.into_iter().map(|s| s.record).collect(),
            b2cs: b2cs.into_iter().map(|s| s.record).collect(),
            nil: nil.unwrap_or_default(),
            hsn: hsn.into_iter().map(|s| s.record).collect(),
            documents: documents.into_iter().map(|s| s.record).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NilAmounts, RateLine, TaxRate, Uqc};
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn b2b_input(gstin: &str, pos: &str) -> B2bInvoiceInput {
        B2bInvoiceInput {
            recipient_gstin: gstin.to_string(),
            recipient_name: "Acme Traders".to_string(),
            invoice_number: "INV-001".to_string(),
            invoice_date: NaiveDate::from_ymd_opt(2025, 4, 10).unwrap(),
            total_invoice_value: dec("1180"),
            pos_code: pos.to_string(),
            rate_lines: vec![RateLine {
                rate: TaxRate::percent(18).unwrap(),
                taxable_value: dec("1000"),
            }],
            cess: BigDecimal::zero(),
        }
    }

    #[test]
    fn b2b_supply_type_from_recipient_state() {
        let inter = build_b2b(&b2b_input("29ABCDE1234F1Z5", "33")).unwrap();
        assert_eq!(inter.supply_type, SupplyType::InterState);
        assert_eq!(inter.igst, Some(dec("180.00")));

        let intra = build_b2b(&b2b_input("33ABCDE1234F1Z5", "33")).unwrap();
        assert_eq!(intra.supply_type, SupplyType::IntraState);
        assert_eq!(intra.cgst, Some(dec("90.00")));
        assert_eq!(intra.sgst, Some(dec("90.00")));
    }

    #[test]
    fn b2b_rejects_short_gstin_and_zero_value() {
        let mut input = b2b_input("29ABC", "33");
        input.total_invoice_value = BigDecimal::zero();
        let errors = build_b2b(&input).unwrap_err();
        assert!(errors.has("recipient_gstin", ValidationCode::InvalidFormat));
        assert!(errors.has("total_invoice_value", ValidationCode::NonPositive));
    }

    #[test]
    fn b2cs_requires_non_zero_rate() {
        let input = B2csInput {
            pos_code: "27".to_string(),
            taxable_value: dec("500"),
            rate: TaxRate::percent(0).unwrap(),
            cess: BigDecimal::zero(),
        };
        let errors = build_b2cs(&input, "33").unwrap_err();
        assert!(errors.has("rate", ValidationCode::InvalidRate));
    }

    #[test]
    fn b2cs_intra_state_when_pos_matches_supplier() {
        let input = B2csInput {
            pos_code: "33".to_string(),
            taxable_value: dec("2000"),
            rate: TaxRate::percent(5).unwrap(),
            cess: BigDecimal::zero(),
        };
        let row = build_b2cs(&input, "33").unwrap();
        assert_eq!(row.supply_type, SupplyType::IntraState);
        assert_eq!(row.cgst, Some(dec("50.00")));
        assert_eq!(row.igst, Some(BigDecimal::zero()));
    }

    #[test]
    fn hsn_code_must_be_digits() {
        let input = HsnInput {
            hsn_code: "12AB".to_string(),
            description: String::new(),
            uqc: Uqc::Numbers,
            total_quantity: dec("10"),
            taxable_value: dec("100"),
            rate: TaxRate::percent(12).unwrap(),
            supply_type: SupplyType::InterState,
            cess: BigDecimal::zero(),
            tab: HsnTab::B2B,
        };
        let errors = build_hsn(&input).unwrap_err();
        assert!(errors.has("hsn_code", ValidationCode::InvalidFormat));
    }

    #[test]
    fn cancelled_cannot_exceed_total() {
        let rows = vec![
            DocumentRangeInput { sr_from: 1, sr_to: 10, total: 10, cancelled: 2 },
            DocumentRangeInput { sr_from: 11, sr_to: 12, total: 2, cancelled: 3 },
        ];
        let errors = validate_documents(&rows);
        assert_eq!(errors.errors().len(), 1);
        assert!(errors.has("documents[1].cancelled", ValidationCode::CancelledExceedsTotal));
    }

    #[test]
    fn summary_report_rows() {
        let period = FilingPeriod::new("2025-2026", "Q1", "Apr").unwrap();
        let sections = Gstr1Sections {
            b2b: vec![build_b2b(&b2b_input("29ABCDE1234F1Z5", "33")).unwrap()],
            nil: NilRatedSupplies {
                inter_registered: NilAmounts {
                    exempted: dec("75"),
                    ..NilAmounts::default()
                },
                ..NilRatedSupplies::default()
            },
            documents: vec![DocumentRange {
                document_type: DocumentType::OutwardSupplyInvoice,
                sr_from: 1,
                sr_to: 20,
                total: 20,
                cancelled: 4,
            }],
            ..Gstr1Sections::default()
        };

        let summary = build_summary(&period, &sections);
        let b2b = &summary.rows[0];
        assert_eq!(b2b.table, "4A");
        assert_eq!(b2b.records, 1);
        assert_eq!(b2b.value, dec("1180"));
        assert_eq!(b2b.igst, dec("180.00"));

        let exempted = summary
            .rows
            .iter()
            .find(|r| r.description == "Exempted supplies")
            .unwrap();
        assert_eq!(exempted.value, dec("75"));

        let docs = summary.rows.last().unwrap();
        assert_eq!(docs.table, "13");
        assert_eq!(docs.value, dec("16"));
    }

    #[test]
    fn summary_csv_has_header_and_rows() {
        let period = FilingPeriod::new("2025-2026", "Q1", "Apr").unwrap();
        let summary = build_summary(&period, &Gstr1Sections::default());
        let csv = summary_csv(&summary).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "table,description,records,value,igst,cgst,sgst,cess");
        assert_eq!(lines.len(), summary.rows.len() + 1);
    }
}
