//! The `SalesStore` trait and its report types.
//!
//! The trait is implemented by storage backends (e.g. `sales-store-sqlite`).
//! The API and the loader depend on this abstraction, not on any concrete
//! backend.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::{
  model::{FeatureRecord, SalesRecord, Store},
  table::{QueryOptions, QueryResult, Table},
};

// ─── Report types ────────────────────────────────────────────────────────────

/// Row count of a table after it was (re)written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableLoad {
  pub table: String,
  pub rows:  usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
  pub name:      String,
  pub decl_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableInfo {
  pub name:      String,
  pub row_count: usize,
  pub columns:   Vec<ColumnInfo>,
}

/// Headline numbers for the `train` table, checked after every load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationSummary {
  pub total_records:      usize,
  pub unique_stores:      usize,
  pub unique_departments: usize,
  pub earliest_date:      Option<String>,
  pub latest_date:        Option<String>,
  pub total_sales:        Option<f64>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the relational store holding the ingested dataset.
///
/// Tables are replaced wholesale; there are no incremental writes.
pub trait SalesStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Builder ───────────────────────────────────────────────────────────

  /// Drop and recreate every table in `tables`, then bulk insert its rows.
  ///
  /// All tables are written in one transaction: either every table is
  /// replaced or none is. Tables not named in `tables` are left untouched.
  fn replace_tables(
    &self,
    tables: Vec<Table>,
  ) -> impl Future<Output = Result<Vec<TableLoad>, Self::Error>> + Send + '_;

  /// Create the secondary indexes on `train`, `features` and `stores`.
  /// Indexes whose table does not exist are skipped. Returns the index
  /// names that now exist.
  fn create_indexes(
    &self,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + '_;

  // ── Query runner ──────────────────────────────────────────────────────

  /// Run `sql` verbatim and collect its rows.
  fn run_query<'a>(
    &'a self,
    sql: &'a str,
    options: QueryOptions,
  ) -> impl Future<Output = Result<QueryResult, Self::Error>> + Send + 'a;

  // ── Introspection ─────────────────────────────────────────────────────

  fn has_table<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Every table with its row count and declared columns.
  fn table_info(
    &self,
  ) -> impl Future<Output = Result<Vec<TableInfo>, Self::Error>> + Send + '_;

  /// Headline numbers for `train`. Fails if `train` does not exist.
  fn validation_summary(
    &self,
  ) -> impl Future<Output = Result<ValidationSummary, Self::Error>> + Send + '_;

  // ── Typed reads ───────────────────────────────────────────────────────

  /// The first `limit` rows of `train` (all rows when `None`).
  fn load_sales(
    &self,
    limit: Option<usize>,
  ) -> impl Future<Output = Result<Vec<SalesRecord>, Self::Error>> + Send + '_;

  fn load_stores(
    &self,
  ) -> impl Future<Output = Result<Vec<Store>, Self::Error>> + Send + '_;

  /// The first `limit` rows of `features` (all rows when `None`).
  fn load_features(
    &self,
    limit: Option<usize>,
  ) -> impl Future<Output = Result<Vec<FeatureRecord>, Self::Error>> + Send + '_;
}
