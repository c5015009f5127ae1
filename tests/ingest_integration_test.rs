// ==========================================
// Ingest pipeline integration tests
// ==========================================
// End-to-end coverage of the import pipeline: decode, dedup,
// per-row validation, order upsert, derived history and the
// terminal ledger write.
// ==========================================


use order_flow::domain::{ImportRunStatus, IngestOutcome};
use order_flow::logging;
use test_helpers::{count_rows, create_test_api, create_test_db, open_raw};

const CLEAN_CSV: &[u8] =
    b"doc_nr;item_nr;client_name;qty;qty_open;stock_cx\nA1;1;Alfa;100;50;0\nA2;1;Beta;80;0;80\n";

#[tokio::test]
async fn test_clean_file_ingests_done_with_counts() {
    logging::init_test();
    let (_temp, db_path) = create_test_db().expect("test db");
    let api = create_test_api(&db_path);

    let outcome = api
        .ingest_file(CLEAN_CSV, "orders.csv", Some("erp-x"))
        .await
        .expect("ingest should succeed");

    let (run_id, summary) = match outcome {
        IngestOutcome::Done { run_id, summary } => (run_id, summary),
        other => panic!("expected Done, got {:?}", other),
    };
    assert_eq!(summary.status, ImportRunStatus::Done);
    assert_eq!(summary.rows_total, 2);
    assert_eq!(summary.rows_ok, 2);
    assert_eq!(summary.rows_error, 0);

    let conn = open_raw(&db_path);
    assert_eq!(count_rows(&conn, "orders", None), 2);
    assert_eq!(count_rows(&conn, "order_status_event", None), 2);
    assert_eq!(count_rows(&conn, "order_sector_state_event", None), 2);
    assert_eq!(count_rows(&conn, "sector", None), 6);

    let detail = api.get_import_detail(&run_id).await.unwrap();
    assert_eq!(detail.status, ImportRunStatus::Done);
    assert_eq!(detail.file_name, "orders.csv");
    assert_eq!(detail.source_system.as_deref(), Some("erp-x"));
    assert!(detail.errors.is_empty());
}

#[tokio::test]
async fn test_duplicate_upload_references_original_run() {
    logging::init_test();
    let (_temp, db_path) = create_test_db().expect("test db");
    let api = create_test_api(&db_path);

    let first = api
        .ingest_file(CLEAN_CSV, "orders.csv", None)
        .await
        .unwrap();
    let first_run_id = first.run_id().to_string();
    assert!(matches!(first, IngestOutcome::Done { .. }));

    let conn = open_raw(&db_path);
    let updated_before: String = conn
        .query_row(
            "SELECT updated_at FROM orders WHERE doc_nr='A1' AND item_nr=1",
            [],
            |row| row.get(0),
        )
        .unwrap();
    let events_before = count_rows(&conn, "order_status_event", None);

    // Same bytes, different filename: content decides, not the name.
    let second = api
        .ingest_file(CLEAN_CSV, "orders_resent.csv", None)
        .await
        .unwrap();
    match second {
        IngestOutcome::Duplicate { run_id } => assert_eq!(run_id, first_run_id),
        other => panic!("expected Duplicate, got {:?}", other),
    }

    // No second run, no order mutation, no new history.
    assert_eq!(count_rows(&conn, "import_run", None), 1);
    let updated_after: String = conn
        .query_row(
            "SELECT updated_at FROM orders WHERE doc_nr='A1' AND item_nr=1",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(updated_before, updated_after);
    assert_eq!(count_rows(&conn, "order_status_event", None), events_before);
}

#[tokio::test]
async fn test_same_key_rows_apply_in_file_order_last_write_wins() {
    logging::init_test();
    let (_temp, db_path) = create_test_db().expect("test db");
    let api = create_test_api(&db_path);

    let csv = b"doc_nr;item_nr;qty\nA1;1;100\nA1;1;150\n";
    let outcome = api.ingest_file(csv, "orders.csv", None).await.unwrap();
    assert!(matches!(outcome, IngestOutcome::Done { .. }));

    let conn = open_raw(&db_path);
    assert_eq!(count_rows(&conn, "orders", None), 1);
    let qty: f64 = conn
        .query_row(
            "SELECT qty FROM orders WHERE doc_nr='A1' AND item_nr=1",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(qty, 150.0);

    // Both touches left history: exactly two status events.
    assert_eq!(count_rows(&conn, "order_status_event", None), 2);
}

#[tokio::test]
async fn test_row_failures_are_isolated_and_recorded() {
    logging::init_test();
    let (_temp, db_path) = create_test_db().expect("test db");
    let api = create_test_api(&db_path);

    // Row 1 ok, row 2 missing doc_nr, row 3 non-numeric qty.
    let csv = b"doc_nr;item_nr;qty\nA1;1;10\n;2;10\nA3;3;lots\n";
    let outcome = api.ingest_file(csv, "orders.csv", None).await.unwrap();

    let summary = match outcome {
        IngestOutcome::Done { summary, .. } => summary,
        other => panic!("expected Done, got {:?}", other),
    };
    assert_eq!(summary.status, ImportRunStatus::Partial);
    assert_eq!(summary.rows_total, 3);
    assert_eq!(summary.rows_ok, 1);
    assert_eq!(summary.rows_error, 2);

    let conn = open_raw(&db_path);
    assert_eq!(count_rows(&conn, "orders", None), 1);
    assert_eq!(count_rows(&conn, "import_row_error", None), 2);

    // Newest (highest row index) first; 1-based indexing excluding
    // the header.
    let detail = api
        .get_import_detail(&single_run_id(&db_path))
        .await
        .unwrap();
    assert_eq!(detail.errors.len(), 2);
    assert_eq!(detail.errors[0].row_index, 3);
    assert_eq!(detail.errors[1].row_index, 2);
    assert!(detail.errors[1].messages[0].contains("doc_nr"));
    assert!(detail.errors[0].messages[0].contains("qty"));
}

/// Fetch the single run id in the ledger.
fn single_run_id(db_path: &str) -> String {
    let conn = open_raw(db_path);
    conn.query_row("SELECT run_id FROM import_run LIMIT 1", [], |row| row.get(0))
        .unwrap()
}

#[tokio::test]
async fn test_all_rows_failing_yields_error_status() {
    logging::init_test();
    let (_temp, db_path) = create_test_db().expect("test db");
    let api = create_test_api(&db_path);

    let csv = b"doc_nr;item_nr\n;1\n;2\n";
    let outcome = api.ingest_file(csv, "orders.csv", None).await.unwrap();

    match outcome {
        IngestOutcome::Done { summary, .. } => {
            assert_eq!(summary.status, ImportRunStatus::Error);
            assert_eq!(summary.rows_ok, 0);
            assert_eq!(summary.rows_error, 2);
        }
        other => panic!("expected Done, got {:?}", other),
    }
}

#[tokio::test]
async fn test_delayed_order_appends_alert_every_touch() {
    logging::init_test();
    let (_temp, db_path) = create_test_db().expect("test db");
    let api = create_test_api(&db_path);

    // Open quantity with a requested date long past.
    let first = b"doc_nr;item_nr;qty;qty_open;requested_date\nA1;1;100;40;2020-01-01\n";
    api.ingest_file(first, "late1.csv", None).await.unwrap();

    let conn = open_raw(&db_path);
    assert_eq!(count_rows(&conn, "alert", Some("type='late-order'")), 1);
    let status: String = conn
        .query_row("SELECT status FROM order_status_event", [], |row| row.get(0))
        .unwrap();
    assert_eq!(status, "delayed");
    let state: String = conn
        .query_row("SELECT state FROM order_sector_state_event", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(state, "late");

    // Different bytes, same late order: a second alert accumulates
    // with no dedup against the unresolved first one.
    let second = b"doc_nr;item_nr;qty;qty_open;requested_date\nA1;1;100;30;2020-01-01\n";
    api.ingest_file(second, "late2.csv", None).await.unwrap();
    assert_eq!(count_rows(&conn, "alert", Some("type='late-order'")), 2);
}

#[tokio::test]
async fn test_completed_order_closes_sector_history() {
    logging::init_test();
    let (_temp, db_path) = create_test_db().expect("test db");
    let api = create_test_api(&db_path);

    // qty_open omitted: inherited default of zero derives completed.
    let csv = b"doc_nr;item_nr;qty;stock_cx\nA1;1;100;100\n";
    api.ingest_file(csv, "done.csv", None).await.unwrap();

    let conn = open_raw(&db_path);
    let (state, end_date, sector_code): (String, Option<String>, String) = conn
        .query_row(
            r#"
            SELECT e.state, e.end_date, s.code
            FROM order_sector_state_event e JOIN sector s ON s.id = e.sector_id
            "#,
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .unwrap();
    assert_eq!(state, "done");
    assert!(end_date.is_some());
    assert_eq!(sector_code, "expedicao");
    assert_eq!(count_rows(&conn, "alert", None), 0);
}

#[tokio::test]
async fn test_undecodable_workbook_leaves_run_processing() {
    logging::init_test();
    let (_temp, db_path) = create_test_db().expect("test db");
    let api = create_test_api(&db_path);

    let result = api
        .ingest_file(b"definitely not a workbook", "orders.xlsx", None)
        .await;
    assert!(result.is_err());

    // The dedup guard already registered the run; a decode failure
    // leaves it stuck at processing for operator follow-up.
    let conn = open_raw(&db_path);
    let status: String = conn
        .query_row("SELECT status FROM import_run", [], |row| row.get(0))
        .unwrap();
    assert_eq!(status, "processing");
    assert_eq!(count_rows(&conn, "orders", None), 0);
}

#[tokio::test]
async fn test_header_variants_map_to_same_columns() {
    logging::init_test();
    let (_temp, db_path) = create_test_db().expect("test db");
    let api = create_test_api(&db_path);

    let csv = b"Doc NR;Item NR;CLIENT-NAME;Qty\nA1;1;Alfa Lda;42\n";
    let outcome = api.ingest_file(csv, "orders.csv", None).await.unwrap();
    assert!(matches!(outcome, IngestOutcome::Done { .. }));

    let conn = open_raw(&db_path);
    let (client, qty): (String, f64) = conn
        .query_row(
            "SELECT client_name, qty FROM orders WHERE doc_nr='A1'",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(client, "Alfa Lda");
    assert_eq!(qty, 42.0);
}

#[tokio::test]
async fn test_sector_seed_is_idempotent_across_runs() {
    logging::init_test();
    let (_temp, db_path) = create_test_db().expect("test db");
    let api = create_test_api(&db_path);

    api.ingest_file(CLEAN_CSV, "a.csv", None).await.unwrap();
    api.ingest_file(b"doc_nr;item_nr\nB1;1\n", "b.csv", None)
        .await
        .unwrap();

    let conn = open_raw(&db_path);
    assert_eq!(count_rows(&conn, "sector", None), 6);
    let first_code: String = conn
        .query_row(
            "SELECT code FROM sector WHERE order_index = 1",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(first_code, "tecelagem");
}
