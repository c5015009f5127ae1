// ==========================================
// Order Flow - data repository layer
// ==========================================
// Responsibility: data access behind trait seams, no business
// logic. All queries are parameterized.
// ==========================================

pub mod error;
pub mod order_ingest_repo;
pub mod order_ingest_repo_impl;

pub use error::{RepositoryError, RepositoryResult};
pub use order_ingest_repo::{OrderIngestRepository, RunInsertOutcome};
pub use order_ingest_repo_impl::OrderIngestRepositoryImpl;
