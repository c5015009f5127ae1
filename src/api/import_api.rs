// ==========================================
// Order Flow - import API
// ==========================================
// Thin facade over the ingest engine and the run ledger for
// callers (CLI, queue worker or a future transport layer).
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::IngestConfigReader;
use crate::domain::{ImportRunStatus, IngestOutcome};
use crate::ingest::OrderIngestor;
use crate::repository::OrderIngestRepository;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One failed row as reported to callers, newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowErrorDetail {
    pub row_index: i64,
    pub messages: Vec<String>,
}

/// Run metadata plus the most recent row-level errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportDetailResponse {
    pub run_id: String,
    pub file_name: String,
    pub import_date: DateTime<Utc>,
    pub status: ImportRunStatus,
    pub rows_total: i64,
    pub rows_ok: i64,
    pub rows_error: i64,
    pub source_system: Option<String>,
    pub errors: Vec<RowErrorDetail>,
}

// ==========================================
// ImportApi
// ==========================================
pub struct ImportApi<R: ?Sized, C>
where
    R: OrderIngestRepository,
    C: IngestConfigReader,
{
    repo: Arc<R>,
    config: Arc<C>,
    ingestor: OrderIngestor<R, C>,
}

impl<R: ?Sized, C> ImportApi<R, C>
where
    R: OrderIngestRepository,
    C: IngestConfigReader,
{
    pub fn new(repo: Arc<R>, config: Arc<C>) -> Self {
        let ingestor = OrderIngestor::new(repo.clone(), config.clone());
        Self {
            repo,
            config,
            ingestor,
        }
    }

    /// Ingest an uploaded file.
    pub async fn ingest_file(
        &self,
        bytes: &[u8],
        filename: &str,
        source_system: Option<&str>,
    ) -> ApiResult<IngestOutcome> {
        if filename.trim().is_empty() {
            return Err(ApiError::InvalidInput("filename must not be empty".to_string()));
        }
        Ok(self.ingestor.ingest(bytes, filename, source_system).await?)
    }

    /// Run metadata, terminal status and the newest page of
    /// row-level error records for one run.
    pub async fn get_import_detail(&self, run_id: &str) -> ApiResult<ImportDetailResponse> {
        let run = self
            .repo
            .get_run(run_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("import run {}", run_id)))?;

        let limit = self
            .config
            .get_row_error_page_size()
            .await
            .map_err(|e| ApiError::Internal(e.to_string()))?;
        let row_errors = self.repo.recent_row_errors(run_id, limit).await?;

        Ok(ImportDetailResponse {
            run_id: run.run_id,
            file_name: run.filename,
            import_date: run.uploaded_at,
            status: run.status,
            rows_total: run.rows_total,
            rows_ok: run.rows_ok,
            rows_error: run.rows_error,
            source_system: run.source_system,
            errors: row_errors
                .into_iter()
                .map(|e| RowErrorDetail {
                    row_index: e.row_index,
                    messages: e.errors,
                })
                .collect(),
        })
    }
}
