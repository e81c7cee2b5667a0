//! JSON REST API for the sales explorer.
//!
//! Exposes an axum [`Router`] backed by any [`sales_core::store::SalesStore`].
//! Listening, tracing layers and configuration are the caller's
//! responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", sales_api::api_router(state))
//! ```

pub mod analytics;
pub mod error;
pub mod queries;
pub mod status;
pub mod upload;

use std::sync::Arc;

use axum::{
  Router,
  extract::DefaultBodyLimit,
  routing::{get, post},
};
use sales_core::{
  model::SalesData,
  sample,
  store::SalesStore,
  table::{Dataset, QueryOptions},
};
use serde::Serialize;

pub use error::ApiError;

// ─── State ───────────────────────────────────────────────────────────────────

/// Limits applied by the handlers.
#[derive(Debug, Clone, Copy)]
pub struct ApiSettings {
  /// Passed to every query the API runs.
  pub query:            QueryOptions,
  /// Rows of `train` read for the derived analytics.
  pub train_limit:      usize,
  /// Rows of `features` read for the derived analytics.
  pub features_limit:   usize,
  /// Largest request body `/upload` accepts.
  pub max_upload_bytes: usize,
}

/// 200 MiB, enough for the full reference dataset.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 200 * 1024 * 1024;

impl Default for ApiSettings {
  fn default() -> Self {
    Self {
      query:            QueryOptions::default(),
      train_limit:      10_000,
      features_limit:   5_000,
      max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
    }
  }
}

/// Shared state threaded through all handlers.
pub struct AppState<S> {
  pub store:    Arc<S>,
  /// Synthetic dataset served by the analytics while `train` is absent.
  pub sample:   Arc<SalesData>,
  pub settings: ApiSettings,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:    Arc::clone(&self.store),
      sample:   Arc::clone(&self.sample),
      settings: self.settings,
    }
  }
}

impl<S> AppState<S> {
  /// State with a freshly generated sample dataset.
  pub fn new(store: Arc<S>, settings: ApiSettings) -> Self {
    Self { store, sample: Arc::new(sample::generate(sample::DEFAULT_SEED)), settings }
  }
}

/// Where the analytics read their records from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
  Database,
  Sample,
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: SalesStore + 'static,
{
  Router::new()
    .route("/status", get(status::handler::<S>))
    // Query runner
    .route("/queries", get(queries::list))
    .route("/queries/{name}", get(queries::run_named::<S>))
    .route("/sql", post(queries::run_sql::<S>))
    .route("/schema", get(queries::schema::<S>))
    .route("/tables", get(queries::tables::<S>))
    // Loader
    .route(
      "/upload",
      post(upload::handler::<S>)
        .layer(DefaultBodyLimit::max(state.settings.max_upload_bytes)),
    )
    // Derived analytics
    .route("/analytics/overview", get(analytics::overview::<S>))
    .route("/analytics/trend", get(analytics::trend::<S>))
    .route("/analytics/stores", get(analytics::stores::<S>))
    .route("/analytics/departments", get(analytics::departments::<S>))
    .route("/analytics/seasonality", get(analytics::seasonality::<S>))
    .route("/analytics/moving-average", get(analytics::moving_average::<S>))
    .route("/analytics/correlation", get(analytics::correlation::<S>))
    .route("/analytics/consistency", get(analytics::consistency::<S>))
    .with_state(state)
}

// ─── Shared helpers ──────────────────────────────────────────────────────────

/// `true` once any known dataset table exists.
pub(crate) async fn database_loaded<S: SalesStore>(store: &S) -> Result<bool, ApiError> {
  for dataset in Dataset::ALL {
    if store.has_table(dataset.table_name()).await.map_err(ApiError::store)? {
      return Ok(true);
    }
  }
  Ok(false)
}

pub(crate) async fn require_database<S: SalesStore>(store: &S) -> Result<(), ApiError> {
  if database_loaded(store).await? {
    Ok(())
  } else {
    Err(ApiError::database_unavailable())
  }
}
