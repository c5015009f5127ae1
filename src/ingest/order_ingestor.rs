// ==========================================
// Order Flow - order ingest engine
// ==========================================
// Responsibility: the full ingestion pipeline over one uploaded
// file: dedup guard -> decode -> per-row normalize/validate ->
// order upsert -> derived-state append -> ledger finalization.
//
// Rows are processed strictly sequentially within a run. This
// preserves the 1-based row-index numbering in error records and
// guarantees that rows sharing an order key apply in file order,
// later rows winning.
// ==========================================

use crate::config::IngestConfigReader;
use crate::domain::{
    Alert, AlertKind, AlertSeverity, ImportRowError, ImportRun, ImportRunStatus, IngestOutcome,
    IngestSummary, OrderSectorStateEvent, OrderStatus, OrderStatusEvent,
};
use crate::ingest::error::{IngestError, IngestResult};
use crate::ingest::file_decoder::FileDecoder;
use crate::ingest::row_normalizer::{NormalizeOptions, RowNormalizer};
use crate::ingest::state_deriver::StateDeriver;
use crate::repository::{OrderIngestRepository, RunInsertOutcome};
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::sync::Arc;

// ==========================================
// OrderIngestor
// ==========================================
/// Ingest engine for order-management exports.
///
/// Generic over the repository and configuration seams so tests
/// can substitute in-memory implementations. May run inline with
/// the triggering request or inside a background worker; either
/// way at most one worker processes a given file.
pub struct OrderIngestor<R: ?Sized, C>
where
    R: OrderIngestRepository,
    C: IngestConfigReader,
{
    repo: Arc<R>,
    config: Arc<C>,
}

impl<R: ?Sized, C> OrderIngestor<R, C>
where
    R: OrderIngestRepository,
    C: IngestConfigReader,
{
    pub fn new(repo: Arc<R>, config: Arc<C>) -> Self {
        Self { repo, config }
    }

    /// Ingest one uploaded file (main entry point).
    ///
    /// # Returns
    /// - `IngestOutcome::Duplicate` when the byte-identical content
    ///   was ingested before, referencing the original run
    /// - `IngestOutcome::Done` with the terminal counters otherwise
    /// - `Err` on whole-file decode failure; the run created by the
    ///   dedup guard is left in `processing` for operator follow-up
    pub async fn ingest(
        &self,
        bytes: &[u8],
        filename: &str,
        source_system: Option<&str>,
    ) -> IngestResult<IngestOutcome> {
        let started = std::time::Instant::now();

        self.repo.ensure_sectors().await?;

        // === Dedup guard: digest before any parsing ===
        let content_hash = format!("{:x}", Sha256::digest(bytes));

        // Advisory fast path; exclusivity is the UNIQUE constraint
        // inside insert_run.
        if let Some(existing) = self.repo.find_run_by_hash(&content_hash).await? {
            tracing::info!(
                run_id = %existing.run_id,
                filename,
                "duplicate upload short-circuited"
            );
            return Ok(IngestOutcome::Duplicate {
                run_id: existing.run_id,
            });
        }

        let run = ImportRun::processing(filename, &content_hash, source_system);
        match self.repo.insert_run(&run).await? {
            RunInsertOutcome::Created => {}
            RunInsertOutcome::HashConflict(existing) => {
                tracing::info!(
                    run_id = %existing.run_id,
                    filename,
                    "lost dedup race to concurrent upload"
                );
                return Ok(IngestOutcome::Duplicate {
                    run_id: existing.run_id,
                });
            }
        }

        tracing::info!(run_id = %run.run_id, filename, "ingest run started");

        // === Decode: fatal for the whole run on failure ===
        let raw_rows = FileDecoder::decode(bytes, filename)?;

        let default_qty_open = self.config.get_default_qty_open().await.map_err(|e| {
            IngestError::ConfigReadError {
                key: crate::config::KEY_DEFAULT_QTY_OPEN.to_string(),
                message: e.to_string(),
            }
        })?;
        let options = NormalizeOptions { default_qty_open };

        // === Row loop: strictly sequential, fault-isolated ===
        let rows_total = raw_rows.len() as i64;
        let mut rows_ok: i64 = 0;
        let mut rows_error: i64 = 0;

        for (index, raw_row) in raw_rows.into_iter().enumerate() {
            let row_index = (index + 1) as i64; // 1-based, header excluded
            let normalized = RowNormalizer::normalize_keys(&raw_row);

            let validated = match RowNormalizer::validate(&normalized, &options) {
                Ok(row) => row,
                Err(errors) => {
                    tracing::warn!(
                        run_id = %run.run_id,
                        row_index,
                        ?errors,
                        "row validation failed"
                    );
                    self.repo
                        .insert_row_error(&ImportRowError {
                            run_id: run.run_id.clone(),
                            row_index,
                            raw_data: normalized,
                            errors,
                        })
                        .await?;
                    rows_error += 1;
                    continue;
                }
            };

            self.apply_row(&run, &validated).await?;
            rows_ok += 1;
        }

        // === Ledger: single terminal write ===
        let status = Self::terminal_status(rows_total, rows_ok, rows_error);
        self.repo
            .finalize_run(&run.run_id, status, rows_total, rows_ok, rows_error)
            .await?;

        let elapsed_ms = started.elapsed().as_millis() as i64;
        tracing::info!(
            run_id = %run.run_id,
            status = status.as_str(),
            rows_total,
            rows_ok,
            rows_error,
            elapsed_ms,
            "ingest run finished"
        );

        Ok(IngestOutcome::Done {
            run_id: run.run_id.clone(),
            summary: IngestSummary {
                status,
                rows_total,
                rows_ok,
                rows_error,
                elapsed_ms,
            },
        })
    }

    /// Upsert one validated row and append its derived state.
    async fn apply_row(
        &self,
        run: &ImportRun,
        row: &crate::domain::ValidatedRow,
    ) -> IngestResult<()> {
        let now = Utc::now();
        let order = self.repo.upsert_order(row, now).await?;
        let derived = StateDeriver::derive(&order, now);

        self.repo
            .append_status_event(&OrderStatusEvent {
                order_id: order.id,
                status: derived.status,
                status_reason: derived.status_reason.clone(),
                recorded_at: now,
                recorded_by: None,
                source_run_id: Some(run.run_id.clone()),
            })
            .await?;

        if let Some(sector_id) = self
            .repo
            .sector_id_by_code(derived.sector.code())
            .await?
        {
            self.repo
                .append_sector_event(&OrderSectorStateEvent {
                    order_id: order.id,
                    sector_id,
                    state: derived.sector_state,
                    start_date: order.issue_date,
                    due_date: order.requested_date,
                    end_date: match derived.status {
                        OrderStatus::Completed => Some(now),
                        _ => None,
                    },
                    notes: None,
                    recorded_at: now,
                    recorded_by: None,
                    source_run_id: Some(run.run_id.clone()),
                })
                .await?;
        }

        if let Some(message) = derived.late_alert_message {
            self.repo
                .insert_alert(&Alert {
                    kind: AlertKind::LateOrder,
                    severity: AlertSeverity::High,
                    order_id: Some(order.id),
                    sector_id: None,
                    message,
                    created_at: now,
                    resolved_at: None,
                })
                .await?;
        }

        Ok(())
    }

    /// Terminal ledger status from the final counters.
    fn terminal_status(rows_total: i64, rows_ok: i64, rows_error: i64) -> ImportRunStatus {
        if rows_error == 0 {
            ImportRunStatus::Done
        } else if rows_ok > 0 {
            ImportRunStatus::Partial
        } else {
            debug_assert!(rows_total > 0);
            ImportRunStatus::Error
        }
    }
}
