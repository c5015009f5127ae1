// ==========================================
// Order Flow - SQLite connection setup
// ==========================================
// Goals:
// - one place for Connection::open PRAGMA behavior, so foreign keys
//   are either on everywhere or nowhere
// - one busy_timeout for all connections, reducing sporadic busy
//   errors under concurrent runs
// - schema bootstrap shared by the binary and the test helpers
// ==========================================

use rusqlite::Connection;

/// Default busy_timeout in milliseconds.
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Apply the unified PRAGMA set to a connection.
///
/// foreign_keys and busy_timeout are per-connection settings and
/// must be applied on every open.
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(std::time::Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// Open a SQLite connection with the unified configuration.
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// Create all tables if absent.
///
/// Constraints that carry correctness guarantees:
/// - import_run.content_hash UNIQUE enforces file-level dedup even
///   under concurrent submission (the application lookup is only an
///   optimization)
/// - orders UNIQUE(doc_nr, item_nr) makes the upsert deterministic
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS import_run (
            run_id        TEXT PRIMARY KEY,
            filename      TEXT NOT NULL,
            uploaded_at   TEXT NOT NULL,
            status        TEXT NOT NULL,
            rows_total    INTEGER NOT NULL DEFAULT 0,
            rows_ok       INTEGER NOT NULL DEFAULT 0,
            rows_error    INTEGER NOT NULL DEFAULT 0,
            content_hash  TEXT NOT NULL UNIQUE,
            source_system TEXT
        );

        CREATE TABLE IF NOT EXISTS import_row_error (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            run_id    TEXT NOT NULL REFERENCES import_run(run_id),
            row_index INTEGER NOT NULL,
            raw_data  TEXT NOT NULL,
            errors    TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_import_row_error_run
            ON import_row_error(run_id, row_index);

        CREATE TABLE IF NOT EXISTS orders (
            id                 INTEGER PRIMARY KEY AUTOINCREMENT,
            doc_nr             TEXT NOT NULL,
            item_nr            INTEGER NOT NULL,
            client_code        TEXT,
            client_name        TEXT,
            po                 TEXT,
            article            TEXT,
            unit               TEXT,
            family             TEXT,
            reference          TEXT,
            color_code         TEXT,
            color_name         TEXT,
            size_code          TEXT,
            size_name          TEXT,
            ean                TEXT,
            qty                REAL NOT NULL DEFAULT 0,
            qty_invoiced       REAL NOT NULL DEFAULT 0,
            qty_open           REAL NOT NULL DEFAULT 0,
            felpo_cru          REAL NOT NULL DEFAULT 0,
            tinturaria         REAL NOT NULL DEFAULT 0,
            confeccao_roupoes  REAL NOT NULL DEFAULT 0,
            confeccao_felpos   REAL NOT NULL DEFAULT 0,
            emb_acab           REAL NOT NULL DEFAULT 0,
            stock_cx           REAL NOT NULL DEFAULT 0,
            issue_date         TEXT,
            requested_date     TEXT,
            data_tec           TEXT,
            data_felpo_cru     TEXT,
            data_tint          TEXT,
            data_conf          TEXT,
            data_arm_exp       TEXT,
            data_ent           TEXT,
            data_especial      TEXT,
            data_printer       TEXT,
            data_debuxo        TEXT,
            data_amostras      TEXT,
            data_bordados      TEXT,
            created_at         TEXT NOT NULL,
            updated_at         TEXT NOT NULL,
            UNIQUE(doc_nr, item_nr)
        );
        CREATE INDEX IF NOT EXISTS idx_orders_requested_date
            ON orders(requested_date);

        CREATE TABLE IF NOT EXISTS order_status_event (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            order_id      INTEGER NOT NULL REFERENCES orders(id),
            status        TEXT NOT NULL,
            status_reason TEXT,
            recorded_at   TEXT NOT NULL,
            recorded_by   TEXT,
            source_run_id TEXT REFERENCES import_run(run_id)
        );
        CREATE INDEX IF NOT EXISTS idx_order_status_event_order
            ON order_status_event(order_id, recorded_at);

        CREATE TABLE IF NOT EXISTS sector (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            code        TEXT NOT NULL UNIQUE,
            name        TEXT NOT NULL,
            order_index INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS order_sector_state_event (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            order_id      INTEGER NOT NULL REFERENCES orders(id),
            sector_id     INTEGER NOT NULL REFERENCES sector(id),
            state         TEXT NOT NULL,
            start_date    TEXT,
            due_date      TEXT,
            end_date      TEXT,
            notes         TEXT,
            recorded_at   TEXT NOT NULL,
            recorded_by   TEXT,
            source_run_id TEXT REFERENCES import_run(run_id)
        );
        CREATE INDEX IF NOT EXISTS idx_order_sector_state_event_order
            ON order_sector_state_event(order_id, sector_id, recorded_at);

        CREATE TABLE IF NOT EXISTS alert (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            type        TEXT NOT NULL,
            severity    TEXT NOT NULL,
            order_id    INTEGER REFERENCES orders(id),
            sector_id   INTEGER REFERENCES sector(id),
            message     TEXT NOT NULL,
            created_at  TEXT NOT NULL,
            resolved_at TEXT
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            key        TEXT PRIMARY KEY,
            value      TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        "#,
    )?;
    Ok(())
}
