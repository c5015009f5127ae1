// ==========================================
// Order Flow - core library
// ==========================================
// Textile production order tracking: ingests spreadsheet/CSV
// exports from the upstream order-management system and derives
// production status, pipeline-stage placement and delay alerts.
// Stack: Rust + SQLite.
// ==========================================

// ==========================================
// Module declarations
// ==========================================

// Domain layer - entities and types
pub mod domain;

// Repository layer - data access
pub mod repository;

// Ingest layer - the import pipeline
pub mod ingest;

// Configuration layer
pub mod config;

// Database infrastructure (connection setup / unified PRAGMA)
pub mod db;

// Logging
pub mod logging;

// API layer - caller-facing interfaces
pub mod api;

// ==========================================
// Re-exports
// ==========================================

// Domain types
pub use domain::types::{
    AlertKind, AlertSeverity, ImportRunStatus, OrderStatus, SectorCode, SectorState,
};

// Domain entities
pub use domain::{
    Alert, ImportRowError, ImportRun, IngestOutcome, IngestSummary, Order,
    OrderSectorStateEvent, OrderStatusEvent, Sector, ValidatedRow,
};

// Pipeline
pub use ingest::{FileDecoder, IngestError, OrderIngestor, RowNormalizer, StateDeriver};

// API
pub use api::ImportApi;

// ==========================================
// Constants
// ==========================================

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const APP_NAME: &str = "Order Flow";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
