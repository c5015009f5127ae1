// ==========================================
// Order Flow - domain layer
// ==========================================
// Entities and value types. No I/O, no business rules here;
// derivation lives in the ingest layer, persistence in the
// repository layer.
// ==========================================

pub mod import;
pub mod order;
pub mod types;

// Re-export core entities
pub use import::{
    ImportRowError, ImportRun, IngestOutcome, IngestSummary, RawRow, ValidatedRow,
};
pub use order::{Alert, Order, OrderSectorStateEvent, OrderStatusEvent, Sector};
pub use types::{
    AlertKind, AlertSeverity, ImportRunStatus, OrderStatus, SectorCode, SectorState,
};
