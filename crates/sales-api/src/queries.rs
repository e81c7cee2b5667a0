//! Handlers for the query runner.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/queries` | The catalog: name, title and SQL of each aggregate |
//! | `GET`  | `/queries/{name}` | Optional `?format=csv`; 404 for unknown names |
//! | `POST` | `/sql` | Body: `{"query":"SELECT ..."}` |
//! | `GET`  | `/schema` | Tables and their `CREATE` statements |
//! | `GET`  | `/tables` | Row counts and declared column types |
//!
//! Everything except `/queries` and `/tables` answers 503 until a table
//! exists.

use axum::{
  Json,
  extract::{Path, Query, State},
  http::header,
  response::{IntoResponse, Response},
};
use sales_core::{
  catalog::{CatalogEntry, QueryKind, catalog},
  store::{SalesStore, TableInfo},
  table::QueryResult,
};
use serde::Deserialize;

use crate::{AppState, error::ApiError, require_database};

// ─── Catalog ─────────────────────────────────────────────────────────────────

/// `GET /queries`
pub async fn list() -> Json<Vec<CatalogEntry>> { Json(catalog()) }

#[derive(Debug, Default, Deserialize)]
pub struct FormatParams {
  pub format: Option<String>,
}

/// `GET /queries/{name}[?format=csv]`
pub async fn run_named<S>(
  State(state): State<AppState<S>>,
  Path(name): Path<String>,
  Query(params): Query<FormatParams>,
) -> Result<Response, ApiError>
where
  S: SalesStore + 'static,
{
  let kind: QueryKind = name.parse()?;
  require_database(state.store.as_ref()).await?;

  let result = state
    .store
    .run_query(kind.sql(), state.settings.query)
    .await
    .map_err(ApiError::store)?;

  match params.format.as_deref() {
    Some("csv") => {
      let body = sales_csv::result_to_csv(&result).map_err(ApiError::store)?;
      let disposition = format!("attachment; filename=\"{}.csv\"", kind.name());
      Ok(
        (
          [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_owned()),
            (header::CONTENT_DISPOSITION, disposition),
          ],
          body,
        )
          .into_response(),
      )
    }
    Some("json") | None => Ok(Json(result).into_response()),
    Some(other) => Err(ApiError::BadRequest(format!("unsupported format: {other:?}"))),
  }
}

// ─── Custom SQL ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SqlBody {
  pub query: String,
}

/// `POST /sql`: body `{"query":"..."}`
///
/// The statement runs verbatim. Failures are reported as a bad request since
/// they almost always come from the submitted text.
pub async fn run_sql<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<SqlBody>,
) -> Result<Json<QueryResult>, ApiError>
where
  S: SalesStore + 'static,
{
  if body.query.trim().is_empty() {
    return Err(ApiError::BadRequest("Please enter a SQL query".into()));
  }
  require_database(state.store.as_ref()).await?;

  tracing::debug!(query = %body.query, "running custom query");
  let result = state
    .store
    .run_query(&body.query, state.settings.query)
    .await
    .map_err(|e| ApiError::BadRequest(format!("query failed: {e}")))?;
  Ok(Json(result))
}

// ─── Introspection ───────────────────────────────────────────────────────────

/// `GET /schema`
pub async fn schema<S>(State(state): State<AppState<S>>) -> Result<Json<QueryResult>, ApiError>
where
  S: SalesStore + 'static,
{
  require_database(state.store.as_ref()).await?;
  let result = state
    .store
    .run_query(QueryKind::Schema.sql(), state.settings.query)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(result))
}

/// `GET /tables`
pub async fn tables<S>(State(state): State<AppState<S>>) -> Result<Json<Vec<TableInfo>>, ApiError>
where
  S: SalesStore + 'static,
{
  let info = state.store.table_info().await.map_err(ApiError::store)?;
  Ok(Json(info))
}
