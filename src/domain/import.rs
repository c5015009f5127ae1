// ==========================================
// Order Flow - import domain model
// ==========================================
// Entities of the ingest pipeline itself: the per-file run ledger,
// per-row error records and the in-flight row representations that
// travel between decoder, normalizer and upsert engine.
// ==========================================

use crate::domain::types::ImportRunStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Raw field map produced by the file decoder, one per data row.
/// Keys are the source headers as written in the file; values are
/// cell contents rendered as trimmed strings (missing cells become
/// empty strings, never absent keys).
pub type RawRow = HashMap<String, String>;

// ==========================================
// ImportRun - one execution of the pipeline over one file
// ==========================================
// Created at upload time with status=Processing, mutated exactly
// once more at completion. content_hash is unique across all runs
// and makes byte-identical re-ingestion idempotent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportRun {
    pub run_id: String, // uuid
    pub filename: String,
    pub uploaded_at: DateTime<Utc>,
    pub status: ImportRunStatus,
    pub rows_total: i64,
    pub rows_ok: i64,
    pub rows_error: i64,
    pub content_hash: String, // sha-256 hex of the raw bytes
    pub source_system: Option<String>,
}

impl ImportRun {
    /// New run in its initial Processing state, counters zeroed.
    pub fn processing(
        filename: &str,
        content_hash: &str,
        source_system: Option<&str>,
    ) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            filename: filename.to_string(),
            uploaded_at: Utc::now(),
            status: ImportRunStatus::Processing,
            rows_total: 0,
            rows_ok: 0,
            rows_error: 0,
            content_hash: content_hash.to_string(),
            source_system: source_system.map(|s| s.to_string()),
        }
    }
}

// ==========================================
// ImportRowError - one failed row within a run
// ==========================================
// row_index is 1-based and matches the position in the decoded
// sequence, excluding the header row. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportRowError {
    pub run_id: String,
    pub row_index: i64,
    pub raw_data: RawRow, // normalized field map as submitted
    pub errors: Vec<String>,
}

// ==========================================
// ValidatedRow - typed output of the normalizer
// ==========================================
// Field names are the canonical (normalized) header keys. Absent
// numerics default to zero, absent strings and dates to None; the
// open-quantity default is injected by configuration (inherited
// upstream behavior, see IngestConfigReader::default_qty_open).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidatedRow {
    // ===== Required =====
    pub doc_nr: String,
    pub item_nr: i64,

    // ===== Descriptive attributes =====
    pub client_code: Option<String>,
    pub client_name: Option<String>,
    pub po: Option<String>,
    pub article: Option<String>,
    pub unit: Option<String>,
    pub family: Option<String>,
    pub reference: Option<String>,
    pub color_code: Option<String>,
    pub color_name: Option<String>,
    pub size_code: Option<String>,
    pub size_name: Option<String>,
    pub ean: Option<String>,

    // ===== Quantities =====
    pub qty: f64,
    pub qty_invoiced: f64,
    pub qty_open: f64,

    // ===== Stage quantities =====
    pub felpo_cru: f64,
    pub tinturaria: f64,
    pub confeccao_roupoes: f64,
    pub confeccao_felpos: f64,
    pub emb_acab: f64,
    pub stock_cx: f64,

    // ===== Dates =====
    pub issue_date: Option<DateTime<Utc>>,
    pub requested_date: Option<DateTime<Utc>>,
    pub data_tec: Option<DateTime<Utc>>,
    pub data_felpo_cru: Option<DateTime<Utc>>,
    pub data_tint: Option<DateTime<Utc>>,
    pub data_conf: Option<DateTime<Utc>>,
    pub data_arm_exp: Option<DateTime<Utc>>,
    pub data_ent: Option<DateTime<Utc>>,
    pub data_especial: Option<DateTime<Utc>>,
    pub data_printer: Option<DateTime<Utc>>,
    pub data_debuxo: Option<DateTime<Utc>>,
    pub data_amostras: Option<DateTime<Utc>>,
    pub data_bordados: Option<DateTime<Utc>>,
}

// ==========================================
// IngestSummary / IngestOutcome - caller-facing results
// ==========================================

/// Final counters of a completed run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestSummary {
    pub status: ImportRunStatus,
    pub rows_total: i64,
    pub rows_ok: i64,
    pub rows_error: i64,
    pub elapsed_ms: i64,
}

/// Terminal outcome reported to the caller (or queue worker).
/// A whole-file decode failure is not an outcome but an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum IngestOutcome {
    /// Byte-identical content was ingested before; references the
    /// pre-existing run. No new run, no row processing.
    Duplicate { run_id: String },
    /// The run completed; its terminal status is in the summary.
    Done {
        run_id: String,
        summary: IngestSummary,
    },
}

impl IngestOutcome {
    pub fn run_id(&self) -> &str {
        match self {
            IngestOutcome::Duplicate { run_id } => run_id,
            IngestOutcome::Done { run_id, .. } => run_id,
        }
    }
}
