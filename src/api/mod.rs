pub mod extract;
pub mod handlers;

pub use handlers::*;

use crate::config::AppConfig;
use crate::db::RecordStore;
use crate::service::{Gstr1Service, Gstr3bService, ItcService, OutwardService, PaymentService};
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;

/// 共享状态: 各申报服务共用一个记录存储
#[derive(Clone)]
pub struct AppState {
    pub gstr1: Arc<Gstr1Service>,
    pub outward: Arc<OutwardService>,
    pub itc: Arc<ItcService>,
    pub payment: Arc<PaymentService>,
    pub gstr3b: Arc<Gstr3bService>,
}

impl AppState {
    pub fn new(store: Arc<dyn RecordStore>, config: &AppConfig) -> Self {
        Self {
            gstr1: Arc::new(Gstr1Service::new(
                store.clone(),
                config.filing.home_state_code.clone(),
            )),
            outward: Arc::new(OutwardService::new(store.clone())),
            itc: Arc::new(ItcService::new(store.clone())),
            payment: Arc::new(PaymentService::new(store.clone())),
            gstr3b: Arc::new(Gstr3bService::new(store)),
        }
    }
}

/// 全部接口路由
pub fn router(state: AppState) -> Router {
    let gstr1_routes = Router::new()
        .route("/b2b", get(list_b2b).post(add_b2b))
        .route("/b2b/:id", put(update_b2b).delete(delete_b2b))
        .route("/b2cs", get(list_b2cs).post(add_b2cs))
        .route("/b2cs/:id", put(update_b2cs).delete(delete_b2cs))
        .route("/hsn", get(list_hsn).post(add_hsn))
        .route("/hsn/:id", delete(delete_hsn))
        .route("/documents", get(list_documents).put(save_documents))
        .route("/documents/:id", delete(delete_document))
        .route("/nil-rated", get(load_nil).put(save_nil))
        .route("/summary", get(gstr1_summary))
        .route("/summary.csv", get(gstr1_summary_csv));

    let gstr3b_routes = Router::new()
        .route("/", get(gstr3b_overview).delete(gstr3b_reset_all))
        .route("/outward", get(load_outward).put(save_outward))
        .route("/outward/edit", post(edit_outward))
        .route("/outward/reset", post(reset_outward))
        .route("/itc", get(load_itc).put(save_itc))
        .route("/payment", get(load_payment).put(save_payment))
        .route("/payment/proceed", post(proceed_payment));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/gstr1", gstr1_routes)
        .nest("/api/gstr3b", gstr3b_routes)
        .with_state(state)
}
