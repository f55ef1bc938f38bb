use crate::config::AppConfig;
use crate::store::{PostgresStore, SqliteStore, StoreError, UsageStore};
use serde::Serialize;
use std::fmt;
use storage::redact_url;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Sqlite,
    Postgres,
}

impl Backend {
    /// PostgreSQL when a non-blank connection string is present, SQLite otherwise.
    pub fn from_database_url(url: Option<&str>) -> Self {
        match url.map(str::trim) {
            Some(u) if !u.is_empty() => Backend::Postgres,
            _ => Backend::Sqlite,
        }
    }

    pub fn select(cfg: &AppConfig) -> Self {
        Self::from_database_url(cfg.database_url())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Sqlite => "sqlite",
            Backend::Postgres => "postgres",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opens the store for the selected backend and applies its schema.
///
/// The choice is made once. A PostgreSQL connection failure is returned as
/// is; the local SQLite file is never used as a fallback.
pub async fn open_store(cfg: &AppConfig) -> Result<Box<dyn UsageStore>, StoreError> {
    match cfg.database_url() {
        Some(url) => {
            info!(url = %redact_url(url), "using PostgreSQL backend");
            Ok(Box::new(PostgresStore::open(url).await?))
        }
        None => {
            info!(path = %cfg.database.path, "using SQLite backend");
            Ok(Box::new(SqliteStore::open(&cfg.database.path).await?))
        }
    }
}
