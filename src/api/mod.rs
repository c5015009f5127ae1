// ==========================================
// Order Flow - API layer
// ==========================================

pub mod error;
pub mod import_api;

pub use error::{ApiError, ApiResult};
pub use import_api::{ImportApi, ImportDetailResponse, RowErrorDetail};
