// ==========================================
// Order Flow - configuration manager
// ==========================================
// Responsibility: configuration load/query.
// Storage: config_kv table (key-value).
// ==========================================

use crate::config::ingest_config_trait::IngestConfigReader;
use crate::db::open_sqlite_connection;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::error::Error;
use std::sync::{Arc, Mutex};

/// Configuration keys.
pub const KEY_DEFAULT_QTY_OPEN: &str = "ingest.default_qty_open";
pub const KEY_ROW_ERROR_PAGE_SIZE: &str = "ingest.row_error_page_size";

// ==========================================
// ConfigManager
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Build from an existing connection. Re-applies the unified
    /// PRAGMA set (idempotent) so connection behavior stays uniform.
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let guard = conn
                .lock()
                .map_err(|e| format!("lock acquisition failed: {}", e))?;
            crate::db::configure_sqlite_connection(&guard)?;
        }
        Ok(Self { conn })
    }

    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| format!("lock acquisition failed: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// Upsert a configuration value.
    pub fn set_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| format!("lock acquisition failed: {}", e))?;

        conn.execute(
            r#"
            INSERT INTO config_kv (key, value, updated_at)
            VALUES (?1, ?2, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![key, value],
        )?;
        Ok(())
    }
}

#[async_trait]
impl IngestConfigReader for ConfigManager {
    async fn get_default_qty_open(&self) -> Result<f64, Box<dyn Error>> {
        match self.get_config_value(KEY_DEFAULT_QTY_OPEN)? {
            Some(raw) => Ok(raw.trim().parse::<f64>()?),
            None => Ok(0.0),
        }
    }

    async fn get_row_error_page_size(&self) -> Result<i64, Box<dyn Error>> {
        match self.get_config_value(KEY_ROW_ERROR_PAGE_SIZE)? {
            Some(raw) => Ok(raw.trim().parse::<i64>()?),
            None => Ok(50),
        }
    }
}
