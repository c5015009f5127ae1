// ==========================================
// Order Flow - CLI entry point
// ==========================================
// Ingests one order-management export file into the local
// database and prints the outcome.
// ==========================================

use order_flow::api::ImportApi;
use order_flow::config::ConfigManager;
use order_flow::db;
use order_flow::repository::OrderIngestRepositoryImpl;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

/// Database location: ORDER_FLOW_DB_PATH wins, otherwise the user
/// data directory, otherwise the working directory.
fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var("ORDER_FLOW_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./order_flow.db");
    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("order-flow");
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("order_flow.db");
        }
    }
    path.to_string_lossy().to_string()
}

fn usage() -> ExitCode {
    eprintln!("usage: order-flow <file.xlsx|file.xls|file.csv> [--source <tag>]");
    ExitCode::from(2)
}

#[tokio::main]
async fn main() -> ExitCode {
    order_flow::logging::init();

    tracing::info!("==================================================");
    tracing::info!("{} - import ingestion pipeline", order_flow::APP_NAME);
    tracing::info!("version: {}", order_flow::VERSION);
    tracing::info!("==================================================");

    let mut args = std::env::args().skip(1);
    let file_path = match args.next() {
        Some(p) => p,
        None => return usage(),
    };
    let source_system = match (args.next().as_deref(), args.next()) {
        (Some("--source"), Some(tag)) => Some(tag),
        (None, _) => None,
        _ => return usage(),
    };

    let db_path = get_default_db_path();
    tracing::info!("using database: {}", db_path);

    let bytes = match std::fs::read(&file_path) {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::error!("cannot read {}: {}", file_path, err);
            return ExitCode::FAILURE;
        }
    };
    let filename = PathBuf::from(&file_path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or(file_path.clone());

    // Bootstrap schema before anything opens the database.
    let schema_result = db::open_sqlite_connection(&db_path).and_then(|conn| db::init_schema(&conn));
    if let Err(err) = schema_result {
        tracing::error!("schema initialization failed: {}", err);
        return ExitCode::FAILURE;
    }

    let repo = match OrderIngestRepositoryImpl::new(&db_path) {
        Ok(repo) => Arc::new(repo),
        Err(err) => {
            tracing::error!("cannot open repository: {}", err);
            return ExitCode::FAILURE;
        }
    };
    let config = match ConfigManager::new(&db_path) {
        Ok(config) => Arc::new(config),
        Err(err) => {
            tracing::error!("cannot open configuration: {}", err);
            return ExitCode::FAILURE;
        }
    };

    let api = ImportApi::new(repo, config);
    match api
        .ingest_file(&bytes, &filename, source_system.as_deref())
        .await
    {
        Ok(outcome) => {
            match serde_json::to_string_pretty(&outcome) {
                Ok(json) => println!("{}", json),
                Err(_) => println!("{:?}", outcome),
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!("ingest failed: {}", err);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_default_db_path() {
        let path = get_default_db_path();
        assert!(!path.is_empty());
        assert!(path.ends_with(".db"));
    }
}
