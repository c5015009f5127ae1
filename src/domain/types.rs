// ==========================================
// Order Flow - core domain enums
// ==========================================
// Shared value types used across the ingest pipeline,
// the repository layer and the API layer.
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// ImportRunStatus - lifecycle of one ingestion run
// ==========================================
// A run is created as Processing and mutated exactly once more,
// at completion, to its terminal value. Duplicate is reported to
// callers but never stored on a new run (the pre-existing run is
// referenced instead).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportRunStatus {
    Processing,
    Done,
    Partial,
    Error,
    Duplicate,
}

impl ImportRunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportRunStatus::Processing => "processing",
            ImportRunStatus::Done => "done",
            ImportRunStatus::Partial => "partial",
            ImportRunStatus::Error => "error",
            ImportRunStatus::Duplicate => "duplicate",
        }
    }

    pub fn parse(raw: &str) -> Self {
        match raw {
            "done" => ImportRunStatus::Done,
            "partial" => ImportRunStatus::Partial,
            "error" => ImportRunStatus::Error,
            "duplicate" => ImportRunStatus::Duplicate,
            _ => ImportRunStatus::Processing,
        }
    }
}

// ==========================================
// OrderStatus - derived production status
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Completed,
    Delayed,
    InProgress,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Completed => "completed",
            OrderStatus::Delayed => "delayed",
            OrderStatus::InProgress => "in-progress",
        }
    }
}

// ==========================================
// SectorState - lifecycle state within one pipeline stage
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SectorState {
    OnTime,
    Late,
    Done,
}

impl SectorState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SectorState::OnTime => "on_time",
            SectorState::Late => "late",
            SectorState::Done => "done",
        }
    }
}

// ==========================================
// SectorCode - the six fixed production stages
// ==========================================
// Ordered 1..6, upstream to downstream. Static reference data,
// seeded once into the sector table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SectorCode {
    Tecelagem,
    FelpoCru,
    Tinturaria,
    Confeccao,
    Embalagem,
    Expedicao,
}

impl SectorCode {
    /// All sectors in pipeline order (order_index 1..6).
    pub const ALL: [SectorCode; 6] = [
        SectorCode::Tecelagem,
        SectorCode::FelpoCru,
        SectorCode::Tinturaria,
        SectorCode::Confeccao,
        SectorCode::Embalagem,
        SectorCode::Expedicao,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            SectorCode::Tecelagem => "tecelagem",
            SectorCode::FelpoCru => "felpo-cru",
            SectorCode::Tinturaria => "tinturaria",
            SectorCode::Confeccao => "confeccao",
            SectorCode::Embalagem => "embalagem",
            SectorCode::Expedicao => "expedicao",
        }
    }

    /// Display name as seeded into the sector table.
    pub fn name(&self) -> &'static str {
        match self {
            SectorCode::Tecelagem => "Tecelagem",
            SectorCode::FelpoCru => "Felpo Cru",
            SectorCode::Tinturaria => "Tinturaria",
            SectorCode::Confeccao => "Confecção",
            SectorCode::Embalagem => "Embalagem/Acab.",
            SectorCode::Expedicao => "Expedição",
        }
    }

    pub fn order_index(&self) -> i64 {
        match self {
            SectorCode::Tecelagem => 1,
            SectorCode::FelpoCru => 2,
            SectorCode::Tinturaria => 3,
            SectorCode::Confeccao => 4,
            SectorCode::Embalagem => 5,
            SectorCode::Expedicao => 6,
        }
    }
}

// ==========================================
// Alert taxonomy
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertKind {
    LateOrder,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::LateOrder => "late-order",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Low => "low",
            AlertSeverity::Medium => "medium",
            AlertSeverity::High => "high",
        }
    }
}
