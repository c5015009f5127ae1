// ==========================================
// Repository integration tests
// ==========================================
// Direct coverage of the rusqlite repository: dedup constraint
// branch, upsert overwrite semantics and row-error paging.
// ==========================================


use chrono::{Duration, Utc};
use order_flow::domain::{ImportRowError, ImportRun, ImportRunStatus, ValidatedRow};
use order_flow::repository::{
    OrderIngestRepository, OrderIngestRepositoryImpl, RepositoryError, RunInsertOutcome,
};
use std::collections::HashMap;
use test_helpers::create_test_db;

fn test_repo(db_path: &str) -> OrderIngestRepositoryImpl {
    OrderIngestRepositoryImpl::new(db_path).expect("Failed to create repository")
}

fn row(doc_nr: &str, item_nr: i64, qty: f64) -> ValidatedRow {
    ValidatedRow {
        doc_nr: doc_nr.to_string(),
        item_nr,
        qty,
        ..ValidatedRow::default()
    }
}

#[tokio::test]
async fn test_insert_run_maps_hash_conflict_to_existing_run() {
    let (_temp, db_path) = create_test_db().expect("test db");
    let repo = test_repo(&db_path);

    let first = ImportRun::processing("a.csv", "deadbeef", None);
    assert!(matches!(
        repo.insert_run(&first).await.unwrap(),
        RunInsertOutcome::Created
    ));

    // Different run id, same digest: the UNIQUE constraint decides.
    let second = ImportRun::processing("b.csv", "deadbeef", None);
    match repo.insert_run(&second).await.unwrap() {
        RunInsertOutcome::HashConflict(existing) => {
            assert_eq!(existing.run_id, first.run_id);
            assert_eq!(existing.filename, "a.csv");
        }
        other => panic!("expected HashConflict, got {:?}", other),
    }
}

#[tokio::test]
async fn test_finalize_run_is_single_terminal_write() {
    let (_temp, db_path) = create_test_db().expect("test db");
    let repo = test_repo(&db_path);

    let run = ImportRun::processing("a.csv", "cafe01", None);
    repo.insert_run(&run).await.unwrap();

    repo.finalize_run(&run.run_id, ImportRunStatus::Partial, 10, 7, 3)
        .await
        .unwrap();

    let stored = repo.get_run(&run.run_id).await.unwrap().unwrap();
    assert_eq!(stored.status, ImportRunStatus::Partial);
    assert_eq!(stored.rows_total, 10);
    assert_eq!(stored.rows_ok, 7);
    assert_eq!(stored.rows_error, 3);
}

#[tokio::test]
async fn test_finalize_unknown_run_is_not_found() {
    let (_temp, db_path) = create_test_db().expect("test db");
    let repo = test_repo(&db_path);

    let result = repo
        .finalize_run("no-such-run", ImportRunStatus::Done, 0, 0, 0)
        .await;
    assert!(matches!(result, Err(RepositoryError::NotFound { .. })));
}

#[tokio::test]
async fn test_upsert_overwrites_all_fields_and_keeps_identity() {
    let (_temp, db_path) = create_test_db().expect("test db");
    let repo = test_repo(&db_path);

    let t0 = Utc::now();
    let mut first = row("A1", 1, 100.0);
    first.client_name = Some("Alfa".to_string());
    first.qty_open = 60.0;
    let created = repo.upsert_order(&first, t0).await.unwrap();

    // Second sighting: full overwrite, refreshed updated_at, but
    // the surrogate id and created_at survive (history rows point
    // at the id).
    let t1 = t0 + Duration::seconds(5);
    let mut second = row("A1", 1, 150.0);
    second.qty_open = 0.0;
    let updated = repo.upsert_order(&second, t1).await.unwrap();

    assert_eq!(updated.id, created.id);
    assert_eq!(updated.created_at, created.created_at);
    assert_eq!(updated.qty, 150.0);
    assert_eq!(updated.qty_open, 0.0);
    assert_eq!(updated.client_name, None); // no partial merge
    assert!(updated.updated_at > created.updated_at);
}

#[tokio::test]
async fn test_upsert_distinguishes_item_numbers_within_document() {
    let (_temp, db_path) = create_test_db().expect("test db");
    let repo = test_repo(&db_path);
    let now = Utc::now();

    let a = repo.upsert_order(&row("A1", 1, 10.0), now).await.unwrap();
    let b = repo.upsert_order(&row("A1", 2, 20.0), now).await.unwrap();
    assert_ne!(a.id, b.id);
}

#[tokio::test]
async fn test_recent_row_errors_newest_first_with_limit() {
    let (_temp, db_path) = create_test_db().expect("test db");
    let repo = test_repo(&db_path);

    let run = ImportRun::processing("a.csv", "beef02", None);
    repo.insert_run(&run).await.unwrap();

    for row_index in 1..=5 {
        repo.insert_row_error(&ImportRowError {
            run_id: run.run_id.clone(),
            row_index,
            raw_data: HashMap::from([("doc_nr".to_string(), String::new())]),
            errors: vec![format!("row {} failed", row_index)],
        })
        .await
        .unwrap();
    }

    let page = repo.recent_row_errors(&run.run_id, 3).await.unwrap();
    let indexes: Vec<i64> = page.iter().map(|e| e.row_index).collect();
    assert_eq!(indexes, vec![5, 4, 3]);
    assert_eq!(page[0].errors, vec!["row 5 failed".to_string()]);
}

#[tokio::test]
async fn test_sector_lookup_after_seed() {
    let (_temp, db_path) = create_test_db().expect("test db");
    let repo = test_repo(&db_path);

    repo.ensure_sectors().await.unwrap();
    repo.ensure_sectors().await.unwrap(); // idempotent

    assert!(repo.sector_id_by_code("expedicao").await.unwrap().is_some());
    assert!(repo.sector_id_by_code("tecelagem").await.unwrap().is_some());
    assert!(repo.sector_id_by_code("smelting").await.unwrap().is_none());
}
