use serde::{Deserialize, Serialize};

/// Environment variable whose presence switches storage to PostgreSQL.
pub const DATABASE_URL_VAR: &str = "DATABASE_URL";

pub const DEFAULT_SQLITE_PATH: &str = "emotion_app.db";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file (or `sqlite:` URL) used when no connection string is set.
    pub path: String,
    /// PostgreSQL connection string.
    #[serde(default)]
    pub url: Option<String>,
}

impl AppConfig {
    pub fn sqlite(path: impl Into<String>) -> Self {
        Self {
            database: DatabaseConfig {
                path: path.into(),
                url: None,
            },
        }
    }

    /// Connection string, treating a blank value as unset.
    pub fn database_url(&self) -> Option<&str> {
        self.database
            .url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
    }
}

/// Loads config from the given file (or `config/default` if present) and
/// applies `DATABASE_URL` from the process environment on top.
pub fn load(path: Option<&str>) -> anyhow::Result<AppConfig> {
    load_with_url(path, std::env::var(DATABASE_URL_VAR).ok())
}

pub fn load_with_url(path: Option<&str>, database_url: Option<String>) -> anyhow::Result<AppConfig> {
    let mut settings = config::Config::builder().set_default("database.path", DEFAULT_SQLITE_PATH)?;
    if let Some(p) = path {
        settings = settings.add_source(config::File::with_name(p));
    } else {
        settings = settings.add_source(config::File::with_name("config/default").required(false));
    }
    settings = settings.set_override_option("database.url", database_url)?;
    let cfg = settings.build()?;
    Ok(cfg.try_deserialize()?)
}
