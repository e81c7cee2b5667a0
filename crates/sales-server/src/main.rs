//! sales-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) and either loads
//! the dataset CSVs into SQLite or serves the JSON API over HTTP.
//!
//! ```text
//! sales-server load --data-dir data
//! sales-server serve
//! ```

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use sales_api::AppState;
use sales_core::store::SalesStore;
use sales_server::{ServerConfig, loader};
use sales_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Retail sales explorer")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml", global = true)]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Ingest the dataset CSVs into the database and print a summary.
  Load {
    /// Directory holding the CSV files.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Database file name, created inside the data directory.
    #[arg(long)]
    db_name: Option<String>,
  },
  /// Serve the JSON API (the default).
  Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let mut cfg = ServerConfig::load(&cli.config)
    .with_context(|| format!("failed to read config from {}", cli.config.display()))?;

  match cli.command.unwrap_or(Command::Serve) {
    Command::Load { data_dir, db_name } => {
      if let Some(dir) = data_dir {
        cfg.data_dir = dir;
      }
      if let Some(name) = db_name {
        cfg.db_name = name;
      }
      load(&cfg).await
    }
    Command::Serve => serve(cfg).await,
  }
}

async fn load(cfg: &ServerConfig) -> anyhow::Result<()> {
  let db_path = cfg.db_path();
  let summary = loader::load_dir(&cfg.data_dir, &db_path)
    .await
    .with_context(|| format!("failed to load {} into {}", cfg.data_dir.display(), db_path.display()))?;

  print!("{summary}");
  tracing::info!(db = %db_path.display(), "database ready");
  Ok(())
}

async fn serve(cfg: ServerConfig) -> anyhow::Result<()> {
  let db_path = cfg.db_path();
  if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {}", parent.display()))?;
  }

  let store = SqliteStore::open(&db_path)
    .await
    .with_context(|| format!("failed to open store at {}", db_path.display()))?;

  if !store.has_table("train").await.context("failed to inspect store")? {
    tracing::warn!(
      db = %db_path.display(),
      "no sales data loaded; analytics will use sample data until `sales-server load` runs"
    );
  }

  let state = AppState::new(Arc::new(store), cfg.api_settings());
  let app = sales_server::router(state);
  let address = cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
