// ==========================================
// Order Flow - ingest repository implementation (rusqlite)
// ==========================================
// All statements are parameterized. Timestamps are stored as
// RFC 3339 text via the rusqlite chrono feature. Raw row maps and
// error lists are persisted as JSON text.
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::{
    Alert, ImportRowError, ImportRun, ImportRunStatus, Order, OrderSectorStateEvent,
    OrderStatusEvent, SectorCode, ValidatedRow,
};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::order_ingest_repo::{OrderIngestRepository, RunInsertOutcome};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// OrderIngestRepositoryImpl
// ==========================================
pub struct OrderIngestRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

const RUN_COLUMNS: &str = "run_id, filename, uploaded_at, status, rows_total, rows_ok, \
                           rows_error, content_hash, source_system";

const ORDER_COLUMNS: &str = "id, doc_nr, item_nr, client_code, client_name, po, article, \
    unit, family, reference, color_code, color_name, size_code, size_name, ean, \
    qty, qty_invoiced, qty_open, \
    felpo_cru, tinturaria, confeccao_roupoes, confeccao_felpos, emb_acab, stock_cx, \
    issue_date, requested_date, \
    data_tec, data_felpo_cru, data_tint, data_conf, data_arm_exp, data_ent, \
    data_especial, data_printer, data_debuxo, data_amostras, data_bordados, \
    created_at, updated_at";

impl OrderIngestRepositoryImpl {
    /// Open a repository over the database at `db_path`.
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Build a repository over an existing connection.
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_run_row(row: &Row<'_>) -> rusqlite::Result<ImportRun> {
        let status: String = row.get(3)?;
        Ok(ImportRun {
            run_id: row.get(0)?,
            filename: row.get(1)?,
            uploaded_at: row.get(2)?,
            status: ImportRunStatus::parse(&status),
            rows_total: row.get(4)?,
            rows_ok: row.get(5)?,
            rows_error: row.get(6)?,
            content_hash: row.get(7)?,
            source_system: row.get(8)?,
        })
    }

    fn map_order_row(row: &Row<'_>) -> rusqlite::Result<Order> {
        Ok(Order {
            id: row.get(0)?,
            doc_nr: row.get(1)?,
            item_nr: row.get(2)?,
            client_code: row.get(3)?,
            client_name: row.get(4)?,
            po: row.get(5)?,
            article: row.get(6)?,
            unit: row.get(7)?,
            family: row.get(8)?,
            reference: row.get(9)?,
            color_code: row.get(10)?,
            color_name: row.get(11)?,
            size_code: row.get(12)?,
            size_name: row.get(13)?,
            ean: row.get(14)?,
            qty: row.get(15)?,
            qty_invoiced: row.get(16)?,
            qty_open: row.get(17)?,
            felpo_cru: row.get(18)?,
            tinturaria: row.get(19)?,
            confeccao_roupoes: row.get(20)?,
            confeccao_felpos: row.get(21)?,
            emb_acab: row.get(22)?,
            stock_cx: row.get(23)?,
            issue_date: row.get(24)?,
            requested_date: row.get(25)?,
            data_tec: row.get(26)?,
            data_felpo_cru: row.get(27)?,
            data_tint: row.get(28)?,
            data_conf: row.get(29)?,
            data_arm_exp: row.get(30)?,
            data_ent: row.get(31)?,
            data_especial: row.get(32)?,
            data_printer: row.get(33)?,
            data_debuxo: row.get(34)?,
            data_amostras: row.get(35)?,
            data_bordados: row.get(36)?,
            created_at: row.get(37)?,
            updated_at: row.get(38)?,
        })
    }

    fn select_run_by_hash(
        conn: &Connection,
        content_hash: &str,
    ) -> RepositoryResult<Option<ImportRun>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {RUN_COLUMNS} FROM import_run WHERE content_hash = ?1 LIMIT 1"
        ))?;
        let mut rows = stmt.query_map(params![content_hash], Self::map_run_row)?;
        match rows.next() {
            Some(run) => Ok(Some(run?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl OrderIngestRepository for OrderIngestRepositoryImpl {
    async fn find_run_by_hash(&self, content_hash: &str) -> RepositoryResult<Option<ImportRun>> {
        let conn = self.get_conn()?;
        Self::select_run_by_hash(&conn, content_hash)
    }

    async fn insert_run(&self, run: &ImportRun) -> RepositoryResult<RunInsertOutcome> {
        let conn = self.get_conn()?;
        let result = conn.execute(
            r#"
            INSERT INTO import_run (
                run_id, filename, uploaded_at, status,
                rows_total, rows_ok, rows_error, content_hash, source_system
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                run.run_id,
                run.filename,
                run.uploaded_at,
                run.status.as_str(),
                run.rows_total,
                run.rows_ok,
                run.rows_error,
                run.content_hash,
                run.source_system,
            ],
        );

        match result {
            Ok(_) => Ok(RunInsertOutcome::Created),
            Err(err) => match RepositoryError::from(err) {
                RepositoryError::UniqueConstraintViolation(_) => {
                    // Lost the race against a concurrent upload of the
                    // same bytes; surface the winning run.
                    match Self::select_run_by_hash(&conn, &run.content_hash)? {
                        Some(existing) => Ok(RunInsertOutcome::HashConflict(existing)),
                        None => Err(RepositoryError::InternalError(format!(
                            "unique violation on content_hash {} but no run found",
                            run.content_hash
                        ))),
                    }
                }
                other => Err(other),
            },
        }
    }

    async fn finalize_run(
        &self,
        run_id: &str,
        status: ImportRunStatus,
        rows_total: i64,
        rows_ok: i64,
        rows_error: i64,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let updated = conn.execute(
            r#"
            UPDATE import_run
            SET status = ?2, rows_total = ?3, rows_ok = ?4, rows_error = ?5
            WHERE run_id = ?1
            "#,
            params![run_id, status.as_str(), rows_total, rows_ok, rows_error],
        )?;

        if updated == 0 {
            return Err(RepositoryError::NotFound {
                entity: "ImportRun".to_string(),
                id: run_id.to_string(),
            });
        }
        Ok(())
    }

    async fn get_run(&self, run_id: &str) -> RepositoryResult<Option<ImportRun>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {RUN_COLUMNS} FROM import_run WHERE run_id = ?1 LIMIT 1"
        ))?;
        let mut rows = stmt.query_map(params![run_id], Self::map_run_row)?;
        match rows.next() {
            Some(run) => Ok(Some(run?)),
            None => Ok(None),
        }
    }

    async fn insert_row_error(&self, row_error: &ImportRowError) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO import_row_error (run_id, row_index, raw_data, errors)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                row_error.run_id,
                row_error.row_index,
                serde_json::to_string(&row_error.raw_data)?,
                serde_json::to_string(&row_error.errors)?,
            ],
        )?;
        Ok(())
    }

    async fn recent_row_errors(
        &self,
        run_id: &str,
        limit: i64,
    ) -> RepositoryResult<Vec<ImportRowError>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT run_id, row_index, raw_data, errors
            FROM import_row_error
            WHERE run_id = ?1
            ORDER BY row_index DESC
            LIMIT ?2
            "#,
        )?;

        let rows = stmt.query_map(params![run_id, limit], |row| {
            let raw_data: String = row.get(2)?;
            let errors: String = row.get(3)?;
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?, raw_data, errors))
        })?;

        let mut result = Vec::new();
        for row in rows {
            let (run_id, row_index, raw_data, errors) = row?;
            result.push(ImportRowError {
                run_id,
                row_index,
                raw_data: serde_json::from_str(&raw_data)?,
                errors: serde_json::from_str(&errors)?,
            });
        }
        Ok(result)
    }

    async fn upsert_order(
        &self,
        row: &ValidatedRow,
        now: DateTime<Utc>,
    ) -> RepositoryResult<Order> {
        let conn = self.get_conn()?;

        // Full overwrite on conflict: the upstream export is the
        // source of truth per snapshot, no partial merge. created_at
        // is kept from first sighting; updated_at refreshed always.
        conn.execute(
            r#"
            INSERT INTO orders (
                doc_nr, item_nr, client_code, client_name, po, article,
                unit, family, reference, color_code, color_name, size_code,
                size_name, ean, qty, qty_invoiced, qty_open,
                felpo_cru, tinturaria, confeccao_roupoes, confeccao_felpos,
                emb_acab, stock_cx, issue_date, requested_date,
                data_tec, data_felpo_cru, data_tint, data_conf, data_arm_exp,
                data_ent, data_especial, data_printer, data_debuxo,
                data_amostras, data_bordados, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12,
                ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23,
                ?24, ?25, ?26, ?27, ?28, ?29, ?30, ?31, ?32, ?33, ?34,
                ?35, ?36, ?37, ?38
            )
            ON CONFLICT(doc_nr, item_nr) DO UPDATE SET
                client_code = excluded.client_code,
                client_name = excluded.client_name,
                po = excluded.po,
                article = excluded.article,
                unit = excluded.unit,
                family = excluded.family,
                reference = excluded.reference,
                color_code = excluded.color_code,
                color_name = excluded.color_name,
                size_code = excluded.size_code,
                size_name = excluded.size_name,
                ean = excluded.ean,
                qty = excluded.qty,
                qty_invoiced = excluded.qty_invoiced,
                qty_open = excluded.qty_open,
                felpo_cru = excluded.felpo_cru,
                tinturaria = excluded.tinturaria,
                confeccao_roupoes = excluded.confeccao_roupoes,
                confeccao_felpos = excluded.confeccao_felpos,
                emb_acab = excluded.emb_acab,
                stock_cx = excluded.stock_cx,
                issue_date = excluded.issue_date,
                requested_date = excluded.requested_date,
                data_tec = excluded.data_tec,
                data_felpo_cru = excluded.data_felpo_cru,
                data_tint = excluded.data_tint,
                data_conf = excluded.data_conf,
                data_arm_exp = excluded.data_arm_exp,
                data_ent = excluded.data_ent,
                data_especial = excluded.data_especial,
                data_printer = excluded.data_printer,
                data_debuxo = excluded.data_debuxo,
                data_amostras = excluded.data_amostras,
                data_bordados = excluded.data_bordados,
                updated_at = excluded.updated_at
            "#,
            params![
                row.doc_nr,
                row.item_nr,
                row.client_code,
                row.client_name,
                row.po,
                row.article,
                row.unit,
                row.family,
                row.reference,
                row.color_code,
                row.color_name,
                row.size_code,
                row.size_name,
                row.ean,
                row.qty,
                row.qty_invoiced,
                row.qty_open,
                row.felpo_cru,
                row.tinturaria,
                row.confeccao_roupoes,
                row.confeccao_felpos,
                row.emb_acab,
                row.stock_cx,
                row.issue_date,
                row.requested_date,
                row.data_tec,
                row.data_felpo_cru,
                row.data_tint,
                row.data_conf,
                row.data_arm_exp,
                row.data_ent,
                row.data_especial,
                row.data_printer,
                row.data_debuxo,
                row.data_amostras,
                row.data_bordados,
                now,
                now,
            ],
        )?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE doc_nr = ?1 AND item_nr = ?2 LIMIT 1"
        ))?;
        let order = stmt.query_row(params![row.doc_nr, row.item_nr], Self::map_order_row)?;
        Ok(order)
    }

    async fn append_status_event(&self, event: &OrderStatusEvent) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO order_status_event (
                order_id, status, status_reason, recorded_at, recorded_by, source_run_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                event.order_id,
                event.status.as_str(),
                event.status_reason,
                event.recorded_at,
                event.recorded_by,
                event.source_run_id,
            ],
        )?;
        Ok(())
    }

    async fn append_sector_event(&self, event: &OrderSectorStateEvent) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO order_sector_state_event (
                order_id, sector_id, state, start_date, due_date, end_date,
                notes, recorded_at, recorded_by, source_run_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                event.order_id,
                event.sector_id,
                event.state.as_str(),
                event.start_date,
                event.due_date,
                event.end_date,
                event.notes,
                event.recorded_at,
                event.recorded_by,
                event.source_run_id,
            ],
        )?;
        Ok(())
    }

    async fn insert_alert(&self, alert: &Alert) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO alert (type, severity, order_id, sector_id, message, created_at, resolved_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                alert.kind.as_str(),
                alert.severity.as_str(),
                alert.order_id,
                alert.sector_id,
                alert.message,
                alert.created_at,
                alert.resolved_at,
            ],
        )?;
        Ok(())
    }

    async fn ensure_sectors(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM sector", [], |row| row.get(0))?;
        if count > 0 {
            return Ok(());
        }

        let tx = conn.unchecked_transaction()?;
        for sector in SectorCode::ALL {
            // INSERT OR IGNORE so two concurrent seeders cannot fail
            // each other on the code UNIQUE constraint.
            tx.execute(
                "INSERT OR IGNORE INTO sector (code, name, order_index) VALUES (?1, ?2, ?3)",
                params![sector.code(), sector.name(), sector.order_index()],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    async fn sector_id_by_code(&self, code: &str) -> RepositoryResult<Option<i64>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT id FROM sector WHERE code = ?1 LIMIT 1")?;
        let mut rows = stmt.query_map(params![code], |row| row.get::<_, i64>(0))?;
        match rows.next() {
            Some(id) => Ok(Some(id?)),
            None => Ok(None),
        }
    }
}
