//! One-time copy of usage records from the local SQLite file into PostgreSQL.

use crate::models::NewUsageRecord;
use crate::store::{PostgresStore, SqliteStore, StoreError, UsageStore};
use serde::Serialize;
use storage::redact_url;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransferSummary {
    pub copied: usize,
    pub destination_before: i64,
    pub destination_after: i64,
}

/// Copies every source record into `destination`.
///
/// Source ids are dropped and the destination assigns new ones. All rows go
/// in one transaction, so a failure leaves the destination untouched. There
/// is no duplicate detection: running twice copies everything twice.
pub async fn transfer(
    source: &dyn UsageStore,
    destination: &dyn UsageStore,
) -> Result<TransferSummary, StoreError> {
    let destination_before = destination.count().await?;
    if destination_before > 0 {
        warn!(
            existing = destination_before,
            "destination already has records; copied rows are added alongside them"
        );
    }

    let rows = source.all().await?;
    info!(
        rows = rows.len(),
        from = %source.backend(),
        to = %destination.backend(),
        "copying usage records"
    );
    let records: Vec<NewUsageRecord> = rows.into_iter().map(NewUsageRecord::from).collect();
    let copied = destination.insert_all(records).await?;

    let destination_after = destination.count().await?;
    Ok(TransferSummary {
        copied,
        destination_before,
        destination_after,
    })
}

pub async fn sqlite_to_postgres(
    sqlite_path: &str,
    database_url: &str,
) -> Result<TransferSummary, StoreError> {
    let source = SqliteStore::open_source(sqlite_path).await?;
    info!(url = %redact_url(database_url), "connecting to destination");
    let destination = PostgresStore::open(database_url).await?;
    transfer(&source, &destination).await
}
