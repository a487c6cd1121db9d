use crate::error::AppError;
use crate::models::{FilingPeriod, Session};
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use serde::Deserialize;

pub const USER_HEADER: &str = "x-user-id";
pub const GSTIN_HEADER: &str = "x-gstin";

/// 调用方会话 (来自请求头)
pub struct Caller(pub Session);

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let user_id = header(USER_HEADER).ok_or(AppError::SessionExpired)?;
        Ok(Caller(Session::new(user_id, header(GSTIN_HEADER))))
    }
}

/// 申报期查询参数 `?fy=2025-2026&q=Q1&p=Apr`
#[derive(Debug, Default, Deserialize)]
pub struct PeriodQuery {
    #[serde(default)]
    pub fy: String,
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub p: String,
}

impl PeriodQuery {
    pub fn period(&self) -> Result<FilingPeriod, AppError> {
        Ok(FilingPeriod::new(&self.fy, &self.q, &self.p)?)
    }
}
