// ==========================================
// Order Flow - ingest repository trait
// ==========================================
// Data access interface for the ingest pipeline. No business
// rules here, only CRUD; derivation and validation stay in the
// ingest layer.
// ==========================================

use crate::domain::{
    Alert, ImportRowError, ImportRun, ImportRunStatus, Order, OrderSectorStateEvent,
    OrderStatusEvent, ValidatedRow,
};
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Result of attempting to register a new run under its content
/// hash. The UNIQUE constraint on the hash is the correctness
/// mechanism for dedup: a losing concurrent insert is reported as
/// `HashConflict` carrying the pre-existing run, never as an error.
#[derive(Debug, Clone)]
pub enum RunInsertOutcome {
    Created,
    HashConflict(ImportRun),
}

// ==========================================
// OrderIngestRepository trait
// ==========================================
// Implemented by OrderIngestRepositoryImpl (rusqlite). The ingest
// engine is generic over this trait so tests can substitute an
// in-memory dummy.
#[async_trait]
pub trait OrderIngestRepository: Send + Sync {
    // ===== Import runs (ledger) =====

    /// Look up a run by content hash. Advisory fast path for the
    /// dedup guard; exclusivity is enforced by `insert_run`.
    async fn find_run_by_hash(&self, content_hash: &str) -> RepositoryResult<Option<ImportRun>>;

    /// Insert a new run (status=processing). Maps a UNIQUE
    /// violation on content_hash to `HashConflict` with the run
    /// that won the race.
    async fn insert_run(&self, run: &ImportRun) -> RepositoryResult<RunInsertOutcome>;

    /// Single terminal write of status and final counters.
    async fn finalize_run(
        &self,
        run_id: &str,
        status: ImportRunStatus,
        rows_total: i64,
        rows_ok: i64,
        rows_error: i64,
    ) -> RepositoryResult<()>;

    async fn get_run(&self, run_id: &str) -> RepositoryResult<Option<ImportRun>>;

    // ===== Row errors =====

    /// Record one failed row. Immutable thereafter.
    async fn insert_row_error(&self, row_error: &ImportRowError) -> RepositoryResult<()>;

    /// Most recent row errors for a run, newest (highest row index)
    /// first.
    async fn recent_row_errors(
        &self,
        run_id: &str,
        limit: i64,
    ) -> RepositoryResult<Vec<ImportRowError>>;

    // ===== Orders =====

    /// Insert or fully overwrite the order identified by
    /// (doc_nr, item_nr), refreshing updated_at. Returns the
    /// post-write record including its id.
    async fn upsert_order(&self, row: &ValidatedRow, now: DateTime<Utc>)
        -> RepositoryResult<Order>;

    // ===== History (append-only) =====

    async fn append_status_event(&self, event: &OrderStatusEvent) -> RepositoryResult<()>;

    async fn append_sector_event(&self, event: &OrderSectorStateEvent) -> RepositoryResult<()>;

    async fn insert_alert(&self, alert: &Alert) -> RepositoryResult<()>;

    // ===== Sector reference data =====

    /// Seed the six fixed sectors if the table is empty. Idempotent.
    async fn ensure_sectors(&self) -> RepositoryResult<()>;

    async fn sector_id_by_code(&self, code: &str) -> RepositoryResult<Option<i64>>;
}
