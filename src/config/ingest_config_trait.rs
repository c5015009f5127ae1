// ==========================================
// Order Flow - ingest configuration trait
// ==========================================
// Read-only configuration interface for the ingest pipeline.
// No writes, no business logic.
// ==========================================

use async_trait::async_trait;
use std::error::Error;

// ==========================================
// IngestConfigReader Trait
// ==========================================
// Implemented by ConfigManager (reads from the config_kv table).
#[async_trait]
pub trait IngestConfigReader: Send + Sync {
    /// Default value applied when a row omits the open-quantity
    /// field.
    ///
    /// Inherited upstream behavior: the default of 0.0 makes a
    /// fresh order with no qty_open column derive as completed.
    /// Kept explicit and configurable rather than silently changed
    /// to the requested quantity.
    ///
    /// # Default
    /// - 0.0
    async fn get_default_qty_open(&self) -> Result<f64, Box<dyn Error>>;

    /// Page size for the newest-first row-error listing returned
    /// by the import detail query.
    ///
    /// # Default
    /// - 50
    async fn get_row_error_page_size(&self) -> Result<i64, Box<dyn Error>>;
}
