// ==========================================
// Order Flow - configuration layer
// ==========================================

pub mod config_manager;
pub mod ingest_config_trait;

pub use config_manager::{ConfigManager, KEY_DEFAULT_QTY_OPEN, KEY_ROW_ERROR_PAGE_SIZE};
pub use ingest_config_trait::IngestConfigReader;
