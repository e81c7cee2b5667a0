//! Handlers for `/analytics/*`: summaries computed in memory from typed
//! records.
//!
//! Records come from the store when `train` exists (capped by the configured
//! row limits) and from the synthetic sample otherwise, or when the stored
//! rows cannot be read. Every response names its `source`.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use sales_core::{
  analytics::{
    self, Correlation, DepartmentPerformance, Growth, MovingAveragePoint, Overview, Period,
    Seasonality, StoreConsistency, StorePerformance, StoreTypeTotals, TrendPoint,
  },
  model::SalesData,
  store::SalesStore,
};
use serde::{Deserialize, Serialize};

use crate::{ApiSettings, AppState, DataSource, error::ApiError};

const DEFAULT_WINDOW: usize = 4;

/// A response body tagged with where its records came from.
#[derive(Debug, Serialize)]
pub struct Sourced<T> {
  pub source: DataSource,
  #[serde(flatten)]
  pub data:   T,
}

async fn load<S>(state: &AppState<S>) -> Result<(DataSource, Arc<SalesData>), ApiError>
where
  S: SalesStore,
{
  let store = state.store.as_ref();
  if !store.has_table("train").await.map_err(ApiError::store)? {
    tracing::warn!("train table not found, using sample data");
    return Ok((DataSource::Sample, Arc::clone(&state.sample)));
  }

  match load_database(store, state.settings).await {
    Ok(data) => Ok((DataSource::Database, Arc::new(data))),
    Err(e) => {
      tracing::warn!(error = %e, "cannot read sales data from the database, using sample data");
      Ok((DataSource::Sample, Arc::clone(&state.sample)))
    }
  }
}

async fn load_database<S>(store: &S, settings: ApiSettings) -> Result<SalesData, S::Error>
where
  S: SalesStore,
{
  let sales = store.load_sales(Some(settings.train_limit)).await?;
  let stores = if store.has_table("stores").await? {
    store.load_stores().await?
  } else {
    Vec::new()
  };
  let features = if store.has_table("features").await? {
    store.load_features(Some(settings.features_limit)).await?
  } else {
    Vec::new()
  };
  Ok(SalesData { sales, stores, features })
}

// ─── Overview ────────────────────────────────────────────────────────────────

/// `GET /analytics/overview`
pub async fn overview<S>(
  State(state): State<AppState<S>>,
) -> Result<Json<Sourced<Overview>>, ApiError>
where
  S: SalesStore + 'static,
{
  let (source, data) = load(&state).await?;
  Ok(Json(Sourced { source, data: analytics::overview(&data.sales) }))
}

// ─── Trend ───────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct TrendParams {
  pub period: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Trend {
  pub period: Period,
  pub points: Vec<TrendPoint>,
  pub growth: Option<Growth>,
}

/// `GET /analytics/trend[?period=weekly|monthly|quarterly|yearly]`
pub async fn trend<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<TrendParams>,
) -> Result<Json<Sourced<Trend>>, ApiError>
where
  S: SalesStore + 'static,
{
  let period = match params.period.as_deref() {
    Some(p) => p.parse()?,
    None => Period::default(),
  };
  let (source, data) = load(&state).await?;
  let points = analytics::sales_trend(&data.sales, period);
  let growth = analytics::growth(&points);
  Ok(Json(Sourced { source, data: Trend { period, points, growth } }))
}

// ─── Stores and departments ──────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct Stores {
  pub stores:  Vec<StorePerformance>,
  pub by_type: Vec<StoreTypeTotals>,
}

/// `GET /analytics/stores`
pub async fn stores<S>(State(state): State<AppState<S>>) -> Result<Json<Sourced<Stores>>, ApiError>
where
  S: SalesStore + 'static,
{
  let (source, data) = load(&state).await?;
  Ok(Json(Sourced {
    source,
    data: Stores {
      stores:  analytics::store_performance(&data.sales, &data.stores),
      by_type: analytics::store_type_totals(&data.sales, &data.stores),
    },
  }))
}

#[derive(Debug, Serialize)]
pub struct Departments {
  pub departments: Vec<DepartmentPerformance>,
}

/// `GET /analytics/departments`
pub async fn departments<S>(
  State(state): State<AppState<S>>,
) -> Result<Json<Sourced<Departments>>, ApiError>
where
  S: SalesStore + 'static,
{
  let (source, data) = load(&state).await?;
  Ok(Json(Sourced {
    source,
    data: Departments { departments: analytics::department_performance(&data.sales) },
  }))
}

// ─── Seasonality ─────────────────────────────────────────────────────────────

/// `GET /analytics/seasonality`
pub async fn seasonality<S>(
  State(state): State<AppState<S>>,
) -> Result<Json<Sourced<Seasonality>>, ApiError>
where
  S: SalesStore + 'static,
{
  let (source, data) = load(&state).await?;
  Ok(Json(Sourced { source, data: analytics::seasonality(&data.sales) }))
}

// ─── Moving average ──────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct WindowParams {
  pub window: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct MovingAverage {
  pub window: usize,
  pub points: Vec<MovingAveragePoint>,
}

/// `GET /analytics/moving-average[?window=N]`
pub async fn moving_average<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<WindowParams>,
) -> Result<Json<Sourced<MovingAverage>>, ApiError>
where
  S: SalesStore + 'static,
{
  let window = params.window.unwrap_or(DEFAULT_WINDOW);
  let (source, data) = load(&state).await?;
  let points = analytics::moving_average(&data.sales, window)?;
  Ok(Json(Sourced { source, data: MovingAverage { window, points } }))
}

// ─── Correlation and consistency ─────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct CorrelationReport {
  /// `None` when no sales row matched a feature row.
  pub correlation: Option<Correlation>,
}

/// `GET /analytics/correlation`
pub async fn correlation<S>(
  State(state): State<AppState<S>>,
) -> Result<Json<Sourced<CorrelationReport>>, ApiError>
where
  S: SalesStore + 'static,
{
  let (source, data) = load(&state).await?;
  let correlation = analytics::correlation(&data.sales, &data.features);
  Ok(Json(Sourced { source, data: CorrelationReport { correlation } }))
}

#[derive(Debug, Serialize)]
pub struct Consistency {
  pub stores: Vec<StoreConsistency>,
}

/// `GET /analytics/consistency`
pub async fn consistency<S>(
  State(state): State<AppState<S>>,
) -> Result<Json<Sourced<Consistency>>, ApiError>
where
  S: SalesStore + 'static,
{
  let (source, data) = load(&state).await?;
  Ok(Json(Sourced { source, data: Consistency { stores: analytics::store_consistency(&data.sales) } }))
}
