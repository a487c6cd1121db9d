pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod service;

pub use api::AppState;
pub use config::AppConfig;
pub use db::{create_pool, ensure_schema, MemoryStore, PgStore, RecordStore};
pub use error::{AppError, BackendError, ValidationCode, ValidationErrors};
