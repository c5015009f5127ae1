// ==========================================
// Order Flow - API layer error types
// ==========================================
// Converts lower-layer errors into caller-facing messages.
// ==========================================

use crate::ingest::IngestError;
use crate::repository::RepositoryError;
use thiserror::Error;

/// API layer errors.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Result alias for the API layer.
pub type ApiResult<T> = Result<T, ApiError>;
