//! `GET /status`: whether a database is loaded and where analytics read from.

use axum::{Json, extract::State};
use sales_core::store::SalesStore;
use serde::Serialize;

use crate::{AppState, DataSource, database_loaded, error::ApiError};

#[derive(Debug, Serialize)]
pub struct Status {
  pub data_loaded: bool,
  pub source:      DataSource,
}

/// `GET /status`
pub async fn handler<S>(State(state): State<AppState<S>>) -> Result<Json<Status>, ApiError>
where
  S: SalesStore + 'static,
{
  let data_loaded = database_loaded(state.store.as_ref()).await?;
  let source = if state.store.has_table("train").await.map_err(ApiError::store)? {
    DataSource::Database
  } else {
    DataSource::Sample
  };
  Ok(Json(Status { data_loaded, source }))
}
