use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cli::history;
use cli::migrate;
use cli::save::{self, SaveRequest};
use emotion_core::config;
use emotion_core::config::AppConfig;
use emotion_core::selector::{self, Backend};
use std::path::PathBuf;
use storage::redact_url;

#[tokio::main]
async fn main() -> Result<()> {
    // Local stand-in for the hosting platform's secrets store.
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let cfg = config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Backend { json } => run_backend(&cfg, json),
        Commands::Init => run_init(&cfg).await,
        Commands::Save {
            name,
            image,
            emotion,
            confidence,
            timestamp,
        } => {
            run_save(
                &cfg,
                SaveRequest {
                    name,
                    image_path: image,
                    emotion,
                    confidence,
                    timestamp,
                },
            )
            .await
        }
        Commands::History { json } => run_history(&cfg, json).await,
        Commands::Migrate {
            sqlite_path,
            database_url,
            json,
        } => run_migrate(&cfg, sqlite_path.as_deref(), database_url.as_deref(), json).await,
    }
}

#[derive(Parser)]
#[command(name = "emotion-store")]
#[command(about = "Usage-record storage for the emotion detection app", long_about = None)]
struct Cli {
    /// Path to config TOML
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show which storage backend DATABASE_URL selects
    Backend {
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
    /// Connect and create the usage table and indexes
    Init,
    /// Save one prediction result
    Save {
        /// Name of the person in the photo
        #[arg(long)]
        name: String,
        /// Image file whose bytes are stored with the record
        #[arg(long)]
        image: PathBuf,
        /// Predicted emotion label
        #[arg(long)]
        emotion: String,
        /// Classifier confidence for the label
        #[arg(long)]
        confidence: f32,
        /// Override the creation timestamp (defaults to now, UTC)
        #[arg(long)]
        timestamp: Option<String>,
    },
    /// Show the 100 most recent records
    History {
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
    /// Copy every record from the SQLite file into PostgreSQL
    Migrate {
        /// Source SQLite file; defaults to database.path
        #[arg(long)]
        sqlite_path: Option<String>,
        /// Destination connection string; defaults to DATABASE_URL
        #[arg(long)]
        database_url: Option<String>,
        /// Output JSON summary
        #[arg(long)]
        json: bool,
    },
}

fn run_backend(cfg: &AppConfig, json: bool) -> Result<()> {
    let backend = Backend::select(cfg);
    let target = match cfg.database_url() {
        Some(url) => redact_url(url),
        None => cfg.database.path.clone(),
    };
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "backend": backend,
                "target": target,
            }))?
        );
    } else {
        println!("backend: {} ({})", backend, target);
    }
    Ok(())
}

async fn run_init(cfg: &AppConfig) -> Result<()> {
    let store = selector::open_store(cfg).await?;
    let count = store.count().await?;
    println!("{} schema ready, {} record(s)", store.backend(), count);
    Ok(())
}

async fn run_save(cfg: &AppConfig, req: SaveRequest) -> Result<()> {
    let store = selector::open_store(cfg).await?;
    let id = save::save_result(store.as_ref(), req).await?;
    println!("saved record {}", id);
    Ok(())
}

async fn run_history(cfg: &AppConfig, json: bool) -> Result<()> {
    let store = selector::open_store(cfg).await?;
    println!("{}", history::render_history(store.as_ref(), json).await?);
    Ok(())
}

async fn run_migrate(
    cfg: &AppConfig,
    sqlite_path: Option<&str>,
    database_url: Option<&str>,
    json: bool,
) -> Result<()> {
    let summary = migrate::run_migration(cfg, sqlite_path, database_url)
        .await
        .context("migrate sqlite to postgres")?;
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "copied {} record(s); destination now holds {} (was {})",
            summary.copied, summary.destination_after, summary.destination_before
        );
    }
    Ok(())
}
