use crate::models::period::PeriodError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// 校验错误码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationCode {
    Required,
    Negative,
    NonPositive,
    InvalidRate,
    InvalidFormat,
    MixedTax,
    CgstSgstMismatch,
    CancelledExceedsTotal,
    CashBalanceExceedsLiability,
    ItcExceedsAvailable,
}

/// 单个字段的校验错误
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub code: ValidationCode,
    pub message: String,
}

/// 一次保存的全部校验错误, 按发现顺序
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: impl Into<String>, code: ValidationCode, message: impl Into<String>) {
        self.0.push(FieldError {
            field: field.into(),
            code,
            message: message.into(),
        });
    }

    pub fn single(field: impl Into<String>, code: ValidationCode, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.push(field, code, message);
        errors
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    pub fn has(&self, field: &str, code: ValidationCode) -> bool {
        self.0.iter().any(|e| e.field == field && e.code == code)
    }

    /// 没有错误则 Ok
    pub fn into_result(self) -> Result<(), AppError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        f.write_str(&parts.join("; "))
    }
}

/// 记录存储错误分类
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("session expired: {0}")]
    AuthExpired(String),

    #[error("store error: {0}")]
    Other(String),
}

impl BackendError {
    /// Classifies a raw backend message, recognising auth-expiry signatures.
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();
        if lower.contains("invalid refresh token") || lower.contains("jwt expired") {
            BackendError::AuthExpired(message)
        } else {
            BackendError::Other(message)
        }
    }

    pub fn is_auth_expired(&self) -> bool {
        matches!(self, BackendError::AuthExpired(_))
    }
}

impl From<sqlx::Error> for BackendError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) => {
                // 23xxx: integrity constraint violation
                if db.code().map(|c| c.starts_with("23")).unwrap_or(false) {
                    BackendError::Constraint(db.message().to_string())
                } else {
                    BackendError::from_message(db.message())
                }
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                BackendError::Unavailable(err.to_string())
            }
            _ => BackendError::from_message(err.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Backend error: {0}")]
    Backend(BackendError),

    #[error("Session expired, please sign in again")]
    SessionExpired,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Export failed: {0}")]
    Export(String),
}

impl From<BackendError> for AppError {
    fn from(err: BackendError) -> Self {
        if err.is_auth_expired() {
            AppError::SessionExpired
        } else {
            AppError::Backend(err)
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::from(BackendError::from(err))
    }
}

impl From<PeriodError> for AppError {
    fn from(err: PeriodError) -> Self {
        let field = match err {
            PeriodError::FinancialYear(_) => "financial_year",
            PeriodError::Quarter(_) => "quarter",
            PeriodError::Period { .. } => "period",
        };
        AppError::Validation(ValidationErrors::single(
            field,
            ValidationCode::InvalidFormat,
            err.to_string(),
        ))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            success: bool,
            message: String,
            #[serde(skip_serializing_if = "Option::is_none")]
            errors: Option<ValidationErrors>,
        }

        let (status, message, errors) = match self {
            AppError::Validation(errs) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "Validation failed".to_string(),
                Some(errs),
            ),
            AppError::SessionExpired => (
                StatusCode::UNAUTHORIZED,
                "Session expired, please sign in again".to_string(),
                None,
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            AppError::Backend(BackendError::Unavailable(msg)) => (
                StatusCode::BAD_GATEWAY,
                format!("Store unavailable: {}", msg),
                None,
            ),
            AppError::Backend(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string(), None),
            AppError::Export(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Export failed: {}", msg),
                None,
            ),
        };

        (
            status,
            Json(ErrorResponse {
                success: false,
                message,
                errors,
            }),
        )
            .into_response()
    }
}
