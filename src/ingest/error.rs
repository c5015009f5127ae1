// ==========================================
// Order Flow - ingest error types
// ==========================================
// Two severities exist in this pipeline: run-fatal errors surface
// through this enum; per-row validation failures never do — they
// are recorded as ImportRowError rows and processing continues.
// ==========================================

use crate::repository::RepositoryError;
use thiserror::Error;

/// Ingest layer errors. All variants abort the whole run.
#[derive(Error, Debug)]
pub enum IngestError {
    // ===== File / decode errors =====
    #[error("file read failed: {0}")]
    FileReadError(String),

    #[error("workbook decode failed: {0}")]
    ExcelDecodeError(String),

    #[error("delimited text decode failed: {0}")]
    CsvDecodeError(String),

    // ===== Configuration errors =====
    #[error("configuration read failed (key: {key}): {message}")]
    ConfigReadError { key: String, message: String },

    // ===== Storage errors =====
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    // ===== Generic =====
    #[error("internal error: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<std::io::Error> for IngestError {
    fn from(err: std::io::Error) -> Self {
        IngestError::FileReadError(err.to_string())
    }
}

impl From<csv::Error> for IngestError {
    fn from(err: csv::Error) -> Self {
        IngestError::CsvDecodeError(err.to_string())
    }
}

impl From<calamine::XlsxError> for IngestError {
    fn from(err: calamine::XlsxError) -> Self {
        IngestError::ExcelDecodeError(err.to_string())
    }
}

impl From<calamine::XlsError> for IngestError {
    fn from(err: calamine::XlsError) -> Self {
        IngestError::ExcelDecodeError(err.to_string())
    }
}

/// Result alias for the ingest layer.
pub type IngestResult<T> = Result<T, IngestError>;
