// ==========================================
// Order Flow - ingest layer
// ==========================================
// Responsibility: turning uploaded order-management exports into
// canonical orders, append-only history and alerts. No UI logic;
// all persistence goes through the repository layer.
// ==========================================

pub mod error;
pub mod file_decoder;
pub mod order_ingestor;
pub mod row_normalizer;
pub mod state_deriver;

pub use error::{IngestError, IngestResult};
pub use file_decoder::FileDecoder;
pub use order_ingestor::OrderIngestor;
pub use row_normalizer::{NormalizeOptions, RowNormalizer};
pub use state_deriver::{DerivedState, StateDeriver, REASON_DEADLINE_PASSED};
