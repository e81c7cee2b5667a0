//! Server and batch loader for the sales explorer.
//!
//! Wires the CSV ingestor, the SQLite store and the JSON API together behind
//! a [`ServerConfig`].

pub mod error;
pub mod loader;

pub use error::{Error, Result};

use std::path::{Path, PathBuf};

use axum::Router;
use sales_api::{ApiSettings, AppState, DEFAULT_MAX_UPLOAD_BYTES};
use sales_core::{store::SalesStore, table::QueryOptions};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime configuration, deserialised from `config.toml` and `SALES_*`
/// environment variables. Every field has a default.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:              String,
  pub port:              u16,
  /// Directory holding `train.csv`, `stores.csv` and friends.
  pub data_dir:          PathBuf,
  /// Database file name, created inside `data_dir`.
  pub db_name:           String,
  /// Reject custom SQL that would write to the database.
  pub read_only_queries: bool,
  pub max_rows:          usize,
  pub train_limit:       usize,
  pub features_limit:    usize,
  /// Largest `/api/upload` request body, in bytes.
  pub max_upload_bytes:  usize,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:              "127.0.0.1".to_string(),
      port:              8501,
      data_dir:          PathBuf::from("data"),
      db_name:           "walmart_sales.db".to_string(),
      read_only_queries: false,
      max_rows:          10_000,
      train_limit:       10_000,
      features_limit:    5_000,
      max_upload_bytes:  DEFAULT_MAX_UPLOAD_BYTES,
    }
  }
}

impl ServerConfig {
  /// Read `path` (if it exists) layered under `SALES_*` environment
  /// variables.
  pub fn load(path: &Path) -> Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("SALES").try_parsing(true))
      .build()?;
    Ok(settings.try_deserialize()?)
  }

  pub fn db_path(&self) -> PathBuf { self.data_dir.join(&self.db_name) }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn api_settings(&self) -> ApiSettings {
    ApiSettings {
      query:            QueryOptions {
        max_rows:  self.max_rows,
        read_only: self.read_only_queries,
      },
      train_limit:      self.train_limit,
      features_limit:   self.features_limit,
      max_upload_bytes: self.max_upload_bytes,
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// The full application: the API under `/api`, with request tracing.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: SalesStore + 'static,
{
  Router::new()
    .nest("/api", sales_api::api_router(state))
    .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
  use std::{fs, sync::Arc};

  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use sales_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  use super::*;

  #[test]
  fn missing_config_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = ServerConfig::load(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(cfg.port, 8501);
    assert_eq!(cfg.db_path(), PathBuf::from("data/walmart_sales.db"));
    assert!(!cfg.read_only_queries);
    assert_eq!(cfg.max_upload_bytes, 200 * 1024 * 1024);
  }

  #[test]
  fn config_file_overrides_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
      &path,
      "port = 9000\nread_only_queries = true\ndata_dir = \"/srv/sales\"\nmax_rows = 50\n\
       max_upload_bytes = 1048576\n",
    )
    .unwrap();
    let cfg = ServerConfig::load(&path).unwrap();
    assert_eq!(cfg.address(), "127.0.0.1:9000");
    assert_eq!(cfg.db_path(), PathBuf::from("/srv/sales/walmart_sales.db"));

    let settings = cfg.api_settings();
    assert!(settings.query.read_only);
    assert_eq!(settings.query.max_rows, 50);
    assert_eq!(settings.train_limit, 10_000);
    assert_eq!(settings.max_upload_bytes, 1_048_576);
  }

  #[tokio::test]
  async fn api_is_nested_under_prefix() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let state = AppState::new(Arc::new(store), ServerConfig::default().api_settings());

    let req = Request::builder().uri("/api/status").body(Body::empty()).unwrap();
    let resp = router(state.clone()).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let req = Request::builder().uri("/status").body(Body::empty()).unwrap();
    let resp = router(state).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }
}
