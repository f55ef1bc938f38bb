//! Record store: the `UsageStore` seam and its SQLite/PostgreSQL implementations.

use crate::models::{NewUsageRecord, UsageRecord};
use crate::selector::Backend;
use sqlx::{PgPool, SqlitePool};
use storage::StorageError;
use thiserror::Error;
use tracing::{debug, info};

/// Upper bound on rows returned by [`UsageStore::recent`].
pub const RECENT_LIMIT: i64 = 100;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("query failed: {0}")]
    Query(#[from] sqlx::Error),
    #[error("invalid record: {0}")]
    Invalid(String),
    #[error("DATABASE_URL is not set; a PostgreSQL connection string is required")]
    MissingDatabaseUrl,
}

#[async_trait::async_trait]
pub trait UsageStore: Send + Sync {
    fn backend(&self) -> Backend;

    /// Inserts one record and returns the id the database assigned.
    async fn insert(&self, record: NewUsageRecord) -> Result<i64, StoreError>;

    /// Inserts records one at a time inside a single transaction. Rows are
    /// written verbatim; nothing is committed unless every insert succeeds.
    async fn insert_all(&self, records: Vec<NewUsageRecord>) -> Result<usize, StoreError>;

    /// The newest records, `ORDER BY id DESC LIMIT 100`.
    async fn recent(&self) -> Result<Vec<UsageRecord>, StoreError>;

    /// Every record, oldest first.
    async fn all(&self) -> Result<Vec<UsageRecord>, StoreError>;

    async fn count(&self) -> Result<i64, StoreError>;
}

fn check(record: &NewUsageRecord) -> Result<(), StoreError> {
    record.validate().map_err(StoreError::Invalid)
}

const SQLITE_INSERT: &str =
    "INSERT INTO usage (name, timestamp, image, emotion, confidence) VALUES (?1, ?2, ?3, ?4, ?5)";
const SQLITE_SELECT: &str = "SELECT id, name, timestamp, image, emotion, confidence FROM usage";

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connects to the file (or `sqlite:` URL) and applies the schema.
    pub async fn open(database: &str) -> Result<Self, StoreError> {
        let pool = storage::connect_sqlite(database).await?;
        storage::migrate_sqlite(&pool).await?;
        Ok(Self::new(pool))
    }

    /// Opens an existing database read-only without touching its schema.
    pub async fn open_source(database: &str) -> Result<Self, StoreError> {
        let pool = storage::open_sqlite_source(database).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl UsageStore for SqliteStore {
    fn backend(&self) -> Backend {
        Backend::Sqlite
    }

    async fn insert(&self, record: NewUsageRecord) -> Result<i64, StoreError> {
        check(&record)?;
        let id = sqlx::query(SQLITE_INSERT)
            .bind(record.name)
            .bind(record.timestamp)
            .bind(record.image)
            .bind(record.emotion)
            .bind(record.confidence)
            .execute(&self.pool)
            .await?
            .last_insert_rowid();
        debug!(id, "saved usage record");
        Ok(id)
    }

    async fn insert_all(&self, records: Vec<NewUsageRecord>) -> Result<usize, StoreError> {
        let total = records.len();
        let mut tx = self.pool.begin().await?;
        for record in records {
            sqlx::query(SQLITE_INSERT)
                .bind(record.name)
                .bind(record.timestamp)
                .bind(record.image)
                .bind(record.emotion)
                .bind(record.confidence)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        info!(rows = total, "committed usage records");
        Ok(total)
    }

    async fn recent(&self) -> Result<Vec<UsageRecord>, StoreError> {
        let rows = sqlx::query_as::<_, UsageRecord>(&format!(
            "{SQLITE_SELECT} ORDER BY id DESC LIMIT ?1"
        ))
        .bind(RECENT_LIMIT)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn all(&self) -> Result<Vec<UsageRecord>, StoreError> {
        let rows = sqlx::query_as::<_, UsageRecord>(&format!("{SQLITE_SELECT} ORDER BY id ASC"))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn count(&self) -> Result<i64, StoreError> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM usage")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }
}

const PG_INSERT: &str = "INSERT INTO usage (name, timestamp, image, emotion, confidence) VALUES ($1, $2, $3, $4, $5) RETURNING id::BIGINT";
// SERIAL is INT4; widen so rows decode into the same record type as SQLite.
const PG_SELECT: &str =
    "SELECT id::BIGINT AS id, name, timestamp, image, emotion, confidence FROM usage";

pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects with the given connection string and applies the schema.
    pub async fn open(database_url: &str) -> Result<Self, StoreError> {
        let pool = storage::connect_postgres(database_url).await?;
        storage::migrate_postgres(&pool).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl UsageStore for PostgresStore {
    fn backend(&self) -> Backend {
        Backend::Postgres
    }

    async fn insert(&self, record: NewUsageRecord) -> Result<i64, StoreError> {
        check(&record)?;
        let id: i64 = sqlx::query_scalar(PG_INSERT)
            .bind(record.name)
            .bind(record.timestamp)
            .bind(record.image)
            .bind(record.emotion)
            .bind(record.confidence)
            .fetch_one(&self.pool)
            .await?;
        debug!(id, "saved usage record");
        Ok(id)
    }

    async fn insert_all(&self, records: Vec<NewUsageRecord>) -> Result<usize, StoreError> {
        let total = records.len();
        let mut tx = self.pool.begin().await?;
        for record in records {
            sqlx::query(PG_INSERT)
                .bind(record.name)
                .bind(record.timestamp)
                .bind(record.image)
                .bind(record.emotion)
                .bind(record.confidence)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        info!(rows = total, "committed usage records");
        Ok(total)
    }

    async fn recent(&self) -> Result<Vec<UsageRecord>, StoreError> {
        let rows = sqlx::query_as::<_, UsageRecord>(&format!(
            "{PG_SELECT} ORDER BY id DESC LIMIT $1"
        ))
        .bind(RECENT_LIMIT)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn all(&self) -> Result<Vec<UsageRecord>, StoreError> {
        let rows = sqlx::query_as::<_, UsageRecord>(&format!("{PG_SELECT} ORDER BY id ASC"))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn count(&self) -> Result<i64, StoreError> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM usage")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_store() -> SqliteStore {
        SqliteStore::open("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn insert_then_recent_returns_record_unchanged() {
        let store = memory_store().await;
        let image = vec![0x89, b'P', b'N', b'G', 0, 1, 2];
        let id = store
            .insert(
                NewUsageRecord::new("Alice", image.clone(), "happy", 0.92)
                    .with_timestamp("2024-05-01T12:30:45.123456"),
            )
            .await
            .unwrap();

        let rows = store.recent().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0],
            UsageRecord {
                id,
                name: "Alice".into(),
                timestamp: "2024-05-01T12:30:45.123456".into(),
                image,
                emotion: "happy".into(),
                confidence: 0.92,
            }
        );
    }

    #[tokio::test]
    async fn recent_is_capped_and_newest_first() {
        let store = memory_store().await;
        let records = (0..120)
            .map(|i| NewUsageRecord::new(format!("user{i}"), vec![i as u8], "neutral", 0.5))
            .collect();
        store.insert_all(records).await.unwrap();

        let rows = store.recent().await.unwrap();
        assert_eq!(rows.len(), RECENT_LIMIT as usize);
        assert!(rows.windows(2).all(|w| w[0].id > w[1].id));
        assert_eq!(rows[0].name, "user119");
        assert_eq!(store.count().await.unwrap(), 120);
    }

    #[tokio::test]
    async fn invalid_record_is_not_written() {
        let store = memory_store().await;
        let err = store
            .insert(NewUsageRecord::new("", vec![1], "happy", 0.3))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Invalid(_)));
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn failed_insert_rolls_back_whole_batch() {
        let store = memory_store().await;
        sqlx::query(
            "CREATE TRIGGER reject_marker BEFORE INSERT ON usage WHEN NEW.name = 'reject' BEGIN SELECT RAISE(ABORT, 'rejected'); END",
        )
        .execute(store.pool())
        .await
        .unwrap();

        let batch = vec![
            NewUsageRecord::new("Alice", vec![1], "happy", 0.9),
            NewUsageRecord::new("reject", vec![2], "sad", 0.4),
            NewUsageRecord::new("Carol", vec![3], "angry", 0.7),
        ];
        assert!(store.insert_all(batch).await.is_err());
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn ids_are_not_reused() {
        let store = memory_store().await;
        let first = store
            .insert(NewUsageRecord::new("Alice", vec![1], "happy", 0.9))
            .await
            .unwrap();
        sqlx::query("DELETE FROM usage").execute(store.pool()).await.unwrap();
        let second = store
            .insert(NewUsageRecord::new("Bob", vec![2], "sad", 0.1))
            .await
            .unwrap();
        assert!(second > first);
    }
}
