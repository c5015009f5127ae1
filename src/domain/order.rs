// ==========================================
// Order Flow - order domain model
// ==========================================
// orders are keyed by the natural composite key (doc_nr, item_nr)
// coming from the upstream order-management export. Every ingest
// touch fully overwrites the business fields (the export is the
// source of truth per snapshot) and appends to the history tables.
// ==========================================

use crate::domain::types::{AlertKind, AlertSeverity, OrderStatus, SectorState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// Order - canonical order line
// ==========================================
// Written only by the ingest pipeline. History lives in
// order_status_event / order_sector_state_event, never here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,

    // ===== Natural key =====
    pub doc_nr: String, // document number
    pub item_nr: i64,   // line-item number

    // ===== Client / article attributes =====
    pub client_code: Option<String>,
    pub client_name: Option<String>,
    pub po: Option<String>, // client purchase order
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
    pub qty: f64,          // requested quantity
    pub qty_invoiced: f64, // already invoiced
    pub qty_open: f64,     // outstanding (drives completion status)

    // ===== Stage quantities (cumulative output per production stage) =====
    pub felpo_cru: f64,         // raw toweling
    pub tinturaria: f64,        // dyeing
    pub confeccao_roupoes: f64, // sewing line A (bathrobes)
    pub confeccao_felpos: f64,  // sewing line B (towels)
    pub emb_acab: f64,          // finishing / packing
    pub stock_cx: f64,          // boxed stock awaiting shipping

    // ===== Order dates =====
    pub issue_date: Option<DateTime<Utc>>,
    pub requested_date: Option<DateTime<Utc>>,

    // ===== Stage timestamps and auxiliary process dates =====
    pub data_tec: Option<DateTime<Utc>>,       // weaving
    pub data_felpo_cru: Option<DateTime<Utc>>, // raw toweling
    pub data_tint: Option<DateTime<Utc>>,      // dyeing
    pub data_conf: Option<DateTime<Utc>>,      // sewing
    pub data_arm_exp: Option<DateTime<Utc>>,   // shipping warehouse
    pub data_ent: Option<DateTime<Utc>>,       // delivery
    pub data_especial: Option<DateTime<Utc>>,
    pub data_printer: Option<DateTime<Utc>>,
    pub data_debuxo: Option<DateTime<Utc>>,
    pub data_amostras: Option<DateTime<Utc>>,
    pub data_bordados: Option<DateTime<Utc>>,

    // ===== Audit =====
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>, // refreshed on every write
}

// ==========================================
// Sector - fixed pipeline stage (reference data)
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sector {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub order_index: i64,
}

// ==========================================
// OrderStatusEvent - append-only status history
// ==========================================
// One row per ingest touch of the order. Sole source of the
// status timeline; never mutated or compacted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatusEvent {
    pub order_id: i64,
    pub status: OrderStatus,
    pub status_reason: Option<String>,
    pub recorded_at: DateTime<Utc>,
    pub recorded_by: Option<String>,
    pub source_run_id: Option<String>,
}

// ==========================================
// OrderSectorStateEvent - append-only sector history
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSectorStateEvent {
    pub order_id: i64,
    pub sector_id: i64,
    pub state: SectorState,
    pub start_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub recorded_at: DateTime<Utc>,
    pub recorded_by: Option<String>,
    pub source_run_id: Option<String>,
}

// ==========================================
// Alert - standalone notice raised by the deriver
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub kind: AlertKind,
    pub severity: AlertSeverity,
    pub order_id: Option<i64>,
    pub sector_id: Option<i64>,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}
