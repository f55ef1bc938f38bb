use emotion_core::config::AppConfig;
use emotion_core::store::StoreError;
use emotion_core::transfer::{self, TransferSummary};

/// Copies the SQLite file into PostgreSQL.
///
/// `sqlite_path` defaults to the configured database path and
/// `database_url` to the configured connection string.
pub async fn run_migration(
    cfg: &AppConfig,
    sqlite_path: Option<&str>,
    database_url: Option<&str>,
) -> Result<TransferSummary, StoreError> {
    let url = database_url
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .or_else(|| cfg.database_url())
        .ok_or(StoreError::MissingDatabaseUrl)?;
    let source = sqlite_path.unwrap_or(&cfg.database.path);
    transfer::sqlite_to_postgres(source, url).await
}
