pub mod aggregator;
pub mod gstr1;
pub mod gstr3b;
pub mod itc;
pub mod outward;
pub mod payment;
pub mod splitter;
pub mod summary;

pub use aggregator::{aggregate, combine};
pub use gstr1::{Gstr1Service, Gstr1Summary, SectionView};
pub use gstr3b::Gstr3bService;
pub use itc::ItcService;
pub use outward::OutwardService;
pub use payment::PaymentService;
pub use splitter::{split_lines, split_tax};
pub use summary::{MergeOutcome, SummaryService};

use crate::db::Scope;
use crate::error::AppError;
use crate::models::{FilingPeriod, Session};
use serde::Serialize;

/// 保存结果: 明细数据 + 汇总合并警告 (如有)
#[derive(Debug, Clone, Serialize)]
pub struct Saved<T> {
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary_warning: Option<String>,
}

impl<T> Saved<T> {
    pub fn new(data: T, outcome: MergeOutcome) -> Self {
        Self {
            data,
            summary_warning: outcome.warning,
        }
    }
}

/// 会话有效时返回读写范围
pub(crate) fn scope_for(session: &Session, period: &FilingPeriod) -> Result<Scope, AppError> {
    if session.is_terminated() {
        return Err(AppError::SessionExpired);
    }
    Ok(Scope::new(&session.user_id, period.clone()))
}

/// 遇到会话过期时终止会话, 结果原样返回
pub(crate) fn watch_session<T>(session: &Session, result: Result<T, AppError>) -> Result<T, AppError> {
    if let Err(AppError::SessionExpired) = &result {
        tracing::warn!("session for user {} expired, signing out", session.user_id);
        session.terminate();
    }
    result
}
