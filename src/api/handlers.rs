use super::extract::{Caller, PeriodQuery};
use super::AppState;
use crate::error::AppError;
use crate::models::{
    B2bInvoice, B2bInvoiceInput, B2csInput, B2csRow, DocumentRange, DocumentRangeInput,
    DocumentType, HsnInput, HsnRow, HsnTab, ItcStatement, ItcWorksheet, NilRatedSupplies,
    OutwardColumn, OutwardWorksheet, PaymentInputs, PaymentWorksheet, RowCode, SummaryTile,
};
use crate::service::gstr1::{self, Gstr1Summary, SectionView};
use crate::service::{outward, Saved};
use axum::{
    extract::{Json, Path, Query, State},
    http::header,
    response::IntoResponse,
};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

/// 响应体
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

fn ok<T>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        success: true,
        data,
    })
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, AppError>;

/// 健康检查
pub async fn health_check() -> &'static str {
    "OK"
}

// ---- GSTR-1 B2B ----

pub async fn list_b2b(
    State(state): State<AppState>,
    Caller(session): Caller,
    Query(query): Query<PeriodQuery>,
) -> ApiResult<SectionView<B2bInvoice>> {
    let period = query.period()?;
    Ok(ok(state.gstr1.list_b2b(&session, &period).await?))
}

pub async fn add_b2b(
    State(state): State<AppState>,
    Caller(session): Caller,
    Query(query): Query<PeriodQuery>,
    Json(input): Json<B2bInvoiceInput>,
) -> ApiResult<SectionView<B2bInvoice>> {
    let period = query.period()?;
    Ok(ok(state.gstr1.add_b2b(&session, &period, &input).await?))
}

pub async fn update_b2b(
    State(state): State<AppState>,
    Caller(session): Caller,
    Path(id): Path<i64>,
    Query(query): Query<PeriodQuery>,
    Json(input): Json<B2bInvoiceInput>,
) -> ApiResult<SectionView<B2bInvoice>> {
    let period = query.period()?;
    Ok(ok(state.gstr1.update_b2b(&session, &period, id, &input).await?))
}

pub async fn delete_b2b(
    State(state): State<AppState>,
    Caller(session): Caller,
    Path(id): Path<i64>,
    Query(query): Query<PeriodQuery>,
) -> ApiResult<SectionView<B2bInvoice>> {
    let period = query.period()?;
    Ok(ok(state.gstr1.delete_b2b(&session, &period, id).await?))
}

// ---- GSTR-1 B2CS ----

pub async fn list_b2cs(
    State(state): State<AppState>,
    Caller(session): Caller,
    Query(query): Query<PeriodQuery>,
) -> ApiResult<SectionView<B2csRow>> {
    let period = query.period()?;
    Ok(ok(state.gstr1.list_b2cs(&session, &period).await?))
}

pub async fn add_b2cs(
    State(state): State<AppState>,
    Caller(session): Caller,
    Query(query): Query<PeriodQuery>,
    Json(input): Json<B2csInput>,
) -> ApiResult<SectionView<B2csRow>> {
    let period = query.period()?;
    Ok(ok(state.gstr1.add_b2cs(&session, &period, &input).await?))
}

pub async fn update_b2cs(
    State(state): State<AppState>,
    Caller(session): Caller,
    Path(id): Path<i64>,
    Query(query): Query<PeriodQuery>,
    Json(input): Json<B2csInput>,
) -> ApiResult<SectionView<B2csRow>> {
    let period = query.period()?;
    Ok(ok(state.gstr1.update_b2cs(&session, &period, id, &input).await?))
}

pub async fn delete_b2cs(
    State(state): State<AppState>,
    Caller(session): Caller,
    Path(id): Path<i64>,
    Query(query): Query<PeriodQuery>,
) -> ApiResult<SectionView<B2csRow>> {
    let period = query.period()?;
    Ok(ok(state.gstr1.delete_b2cs(&session, &period, id).await?))
}

// ---- GSTR-1 HSN ----

#[derive(Debug, Deserialize)]
pub struct HsnQuery {
    pub tab: Option<HsnTab>,
}

pub async fn list_hsn(
    State(state): State<AppState>,
    Caller(session): Caller,
    Query(query): Query<PeriodQuery>,
    Query(filter): Query<HsnQuery>,
) -> ApiResult<SectionView<HsnRow>> {
    let period = query.period()?;
    Ok(ok(state.gstr1.list_hsn(&session, &period, filter.tab).await?))
}

pub async fn add_hsn(
    State(state): State<AppState>,
    Caller(session): Caller,
    Query(query): Query<PeriodQuery>,
    Json(input): Json<HsnInput>,
) -> ApiResult<SectionView<HsnRow>> {
    let period = query.period()?;
    Ok(ok(state.gstr1.add_hsn(&session, &period, &input).await?))
}

pub async fn delete_hsn(
    State(state): State<AppState>,
    Caller(session): Caller,
    Path(id): Path<i64>,
    Query(query): Query<PeriodQuery>,
) -> ApiResult<SectionView<HsnRow>> {
    let period = query.period()?;
    Ok(ok(state.gstr1.delete_hsn(&session, &period, id).await?))
}

// ---- GSTR-1 已开具单据 ----

/// 某一单据类别的全部号段
#[derive(Debug, Deserialize)]
pub struct DocumentsRequest {
    pub document_type: DocumentType,
    pub rows: Vec<DocumentRangeInput>,
}

pub async fn list_documents(
    State(state): State<AppState>,
    Caller(session): Caller,
    Query(query): Query<PeriodQuery>,
) -> ApiResult<SectionView<DocumentRange>> {
    let period = query.period()?;
    Ok(ok(state.gstr1.list_documents(&session, &period).await?))
}

pub async fn save_documents(
    State(state): State<AppState>,
    Caller(session): Caller,
    Query(query): Query<PeriodQuery>,
    Json(req): Json<DocumentsRequest>,
) -> ApiResult<SectionView<DocumentRange>> {
    let period = query.period()?;
    Ok(ok(state
        .gstr1
        .save_documents(&session, &period, req.document_type, &req.rows)
        .await?))
}

pub async fn delete_document(
    State(state): State<AppState>,
    Caller(session): Caller,
    Path(id): Path<i64>,
    Query(query): Query<PeriodQuery>,
) -> ApiResult<SectionView<DocumentRange>> {
    let period = query.period()?;
    Ok(ok(state.gstr1.delete_document(&session, &period, id).await?))
}

// ---- GSTR-1 零税率 ----

pub async fn load_nil(
    State(state): State<AppState>,
    Caller(session): Caller,
    Query(query): Query<PeriodQuery>,
) -> ApiResult<NilRatedSupplies> {
    let period = query.period()?;
    Ok(ok(state.gstr1.load_nil(&session, &period).await?))
}

pub async fn save_nil(
    State(state): State<AppState>,
    Caller(session): Caller,
    Query(query): Query<PeriodQuery>,
    Json(nil): Json<NilRatedSupplies>,
) -> ApiResult<Saved<NilRatedSupplies>> {
    let period = query.period()?;
    Ok(ok(state.gstr1.save_nil(&session, &period, &nil).await?))
}

// ---- GSTR-1 汇总 ----

pub async fn gstr1_summary(
    State(state): State<AppState>,
    Caller(session): Caller,
    Query(query): Query<PeriodQuery>,
) -> ApiResult<Gstr1Summary> {
    let period = query.period()?;
    Ok(ok(state.gstr1.summary(&session, &period).await?))
}

pub async fn gstr1_summary_csv(
    State(state): State<AppState>,
    Caller(session): Caller,
    Query(query): Query<PeriodQuery>,
) -> Result<impl IntoResponse, AppError> {
    let period = query.period()?;
    let summary = state.gstr1.summary(&session, &period).await?;
    let body = gstr1::summary_csv(&summary)?;
    Ok(([(header::CONTENT_TYPE, "text/csv; charset=utf-8")], body))
}

// ---- GSTR-3B ----

pub async fn gstr3b_overview(
    State(state): State<AppState>,
    Caller(session): Caller,
    Query(query): Query<PeriodQuery>,
) -> ApiResult<Vec<SummaryTile>> {
    let period = query.period()?;
    Ok(ok(state.gstr3b.overview(&session, &period).await?))
}

pub async fn gstr3b_reset_all(
    State(state): State<AppState>,
    Caller(session): Caller,
    Query(query): Query<PeriodQuery>,
) -> ApiResult<u64> {
    let period = query.period()?;
    Ok(ok(state.gstr3b.reset_all(&session, &period).await?))
}

pub async fn load_outward(
    State(state): State<AppState>,
    Caller(session): Caller,
    Query(query): Query<PeriodQuery>,
) -> ApiResult<OutwardWorksheet> {
    let period = query.period()?;
    Ok(ok(state.outward.load(&session, &period).await?))
}

pub async fn save_outward(
    State(state): State<AppState>,
    Caller(session): Caller,
    Query(query): Query<PeriodQuery>,
    Json(worksheet): Json<OutwardWorksheet>,
) -> ApiResult<Saved<OutwardWorksheet>> {
    let period = query.period()?;
    Ok(ok(state.outward.save(&session, &period, &worksheet).await?))
}

/// 单元格编辑请求: 返回应用约束后的工作表 (不持久化)
#[derive(Debug, Deserialize)]
pub struct EditRequest {
    pub worksheet: OutwardWorksheet,
    pub row_code: RowCode,
    pub column: OutwardColumn,
    pub value: BigDecimal,
}

pub async fn edit_outward(Json(req): Json<EditRequest>) -> ApiResult<OutwardWorksheet> {
    let mut worksheet = req.worksheet;
    outward::apply_edit(&mut worksheet, req.row_code, req.column, req.value);
    Ok(ok(worksheet))
}

pub async fn reset_outward(
    State(state): State<AppState>,
    Caller(session): Caller,
    Query(query): Query<PeriodQuery>,
) -> ApiResult<Saved<OutwardWorksheet>> {
    let period = query.period()?;
    Ok(ok(state.outward.reset(&session, &period).await?))
}

pub async fn load_itc(
    State(state): State<AppState>,
    Caller(session): Caller,
    Query(query): Query<PeriodQuery>,
) -> ApiResult<ItcStatement> {
    let period = query.period()?;
    Ok(ok(state.itc.load(&session, &period).await?))
}

pub async fn save_itc(
    State(state): State<AppState>,
    Caller(session): Caller,
    Query(query): Query<PeriodQuery>,
    Json(worksheet): Json<ItcWorksheet>,
) -> ApiResult<Saved<ItcStatement>> {
    let period = query.period()?;
    Ok(ok(state.itc.save(&session, &period, &worksheet).await?))
}

pub async fn load_payment(
    State(state): State<AppState>,
    Caller(session): Caller,
    Query(query): Query<PeriodQuery>,
) -> ApiResult<PaymentWorksheet> {
    let period = query.period()?;
    Ok(ok(state.payment.load(&session, &period).await?))
}

pub async fn save_payment(
    State(state): State<AppState>,
    Caller(session): Caller,
    Query(query): Query<PeriodQuery>,
    Json(inputs): Json<PaymentInputs>,
) -> ApiResult<Saved<PaymentWorksheet>> {
    let period = query.period()?;
    Ok(ok(state.payment.save(&session, &period, &inputs).await?))
}

pub async fn proceed_payment(
    State(state): State<AppState>,
    Caller(session): Caller,
    Query(query): Query<PeriodQuery>,
    Json(inputs): Json<PaymentInputs>,
) -> ApiResult<Saved<PaymentWorksheet>> {
    let period = query.period()?;
    Ok(ok(state.payment.proceed(&session, &period, &inputs).await?))
}
