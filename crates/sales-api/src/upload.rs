//! `POST /upload`: replace dataset tables from uploaded CSV files.
//!
//! Multipart form fields are named after the dataset they carry: `train` and
//! `stores` are required, `features` and `test` are optional. Every file is
//! parsed before anything is written, so a malformed upload leaves the
//! existing tables untouched.

use axum::{
  Json,
  extract::{Multipart, State, multipart::MultipartError},
  http::StatusCode,
};
use sales_core::{
  store::{SalesStore, TableLoad},
  table::{Dataset, Table},
};
use serde::Serialize;

use crate::{AppState, error::ApiError};

const REQUIRED: [Dataset; 2] = [Dataset::Train, Dataset::Stores];

fn multipart_error(e: MultipartError) -> ApiError {
  if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
    ApiError::TooLarge(e.body_text())
  } else {
    ApiError::BadRequest(format!("multipart error: {}", e.body_text()))
  }
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
  pub tables:  Vec<TableLoad>,
  pub indexes: Vec<String>,
}

/// `POST /upload`
pub async fn handler<S>(
  State(state): State<AppState<S>>,
  mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError>
where
  S: SalesStore + 'static,
{
  let mut tables: Vec<Table> = Vec::new();

  while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
    let Some(dataset) = field.name().and_then(Dataset::from_table_name) else {
      tracing::warn!(field = ?field.name(), "ignoring unknown upload field");
      continue;
    };
    let bytes = field.bytes().await.map_err(multipart_error)?;
    let table = sales_csv::read_table_bytes(dataset.table_name(), &bytes)
      .map_err(|e| ApiError::BadRequest(format!("{}: {e}", dataset.file_name())))?;
    tracing::info!(table = %dataset, rows = table.len(), "parsed upload");

    tables.retain(|t| t.name != table.name);
    tables.push(table);
  }

  let missing: Vec<&str> = REQUIRED
    .iter()
    .filter(|d| !tables.iter().any(|t| t.name == d.table_name()))
    .map(|d| d.file_name())
    .collect();
  if !missing.is_empty() {
    return Err(ApiError::BadRequest(format!(
      "missing required files: {}",
      missing.join(", ")
    )));
  }

  let loads = state.store.replace_tables(tables).await.map_err(ApiError::store)?;
  let indexes = state.store.create_indexes().await.map_err(ApiError::store)?;
  Ok(Json(UploadResponse { tables: loads, indexes }))
}
