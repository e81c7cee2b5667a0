//! Generic tabular structures shared by the ingestor, the store and the API.
//!
//! A [`Table`] is what the CSV ingestor produces and what the store builder
//! writes. A [`QueryResult`] is what the query runner hands back: cells are
//! already JSON values so the API can serialise them without knowing SQLite.

use std::{fmt, str::FromStr};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result};

// ─── Known datasets ──────────────────────────────────────────────────────────

/// The CSV files the loader knows about, each mapped to one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dataset {
  Train,
  Test,
  Features,
  Stores,
}

impl Dataset {
  /// Load order used by the batch loader.
  pub const ALL: [Dataset; 4] =
    [Dataset::Train, Dataset::Test, Dataset::Features, Dataset::Stores];

  /// Table name in the relational store.
  pub fn table_name(self) -> &'static str {
    match self {
      Dataset::Train => "train",
      Dataset::Test => "test",
      Dataset::Features => "features",
      Dataset::Stores => "stores",
    }
  }

  /// File name expected in the data directory.
  pub fn file_name(self) -> &'static str {
    match self {
      Dataset::Train => "train.csv",
      Dataset::Test => "test.csv",
      Dataset::Features => "features.csv",
      Dataset::Stores => "stores.csv",
    }
  }

  /// Columns a file must carry to be accepted for this dataset.
  pub fn required_columns(self) -> &'static [&'static str] {
    match self {
      Dataset::Train => &["Store", "Dept", "Date", "Weekly_Sales", "IsHoliday"],
      Dataset::Test => &["Store", "Dept", "Date", "IsHoliday"],
      Dataset::Features => &[
        "Store",
        "Date",
        "Temperature",
        "Fuel_Price",
        "CPI",
        "Unemployment",
      ],
      Dataset::Stores => &["Store", "Type", "Size"],
    }
  }

  /// Look up a dataset by table name; `None` for custom tables.
  pub fn from_table_name(name: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|d| d.table_name() == name)
  }
}

impl fmt::Display for Dataset {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.table_name())
  }
}

impl FromStr for Dataset {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    Self::from_table_name(s).ok_or_else(|| Error::InvalidTableName(s.to_owned()))
  }
}

/// Name of the column that is normalised to a calendar date on ingest.
pub const DATE_COLUMN: &str = "Date";

/// `true` if `name` is usable as an unquoted-safe SQL identifier:
/// `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_valid_table_name(name: &str) -> bool {
  let mut chars = name.chars();
  match chars.next() {
    Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
    _ => return false,
  }
  chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

// ─── Cells and columns ───────────────────────────────────────────────────────

/// One value in a [`Table`].
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
  Null,
  Integer(i64),
  Real(f64),
  Text(String),
  Bool(bool),
  Date(NaiveDate),
}

impl Cell {
  pub fn is_null(&self) -> bool { matches!(self, Cell::Null) }
}

/// The inferred type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
  Integer,
  Real,
  Text,
  Bool,
  Date,
}

impl ColumnType {
  /// Declared type used in `CREATE TABLE`. Booleans are stored as 0/1.
  pub fn sql_type(self) -> &'static str {
    match self {
      ColumnType::Integer | ColumnType::Bool => "INTEGER",
      ColumnType::Real => "REAL",
      ColumnType::Text => "TEXT",
      ColumnType::Date => "DATE",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
  pub name: String,
  pub kind: ColumnType,
}

// ─── Table ───────────────────────────────────────────────────────────────────

/// An in-memory table: ordered typed columns and rows of cells.
///
/// Every row has exactly `columns.len()` cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
  pub name:    String,
  pub columns: Vec<Column>,
  pub rows:    Vec<Vec<Cell>>,
}

impl Table {
  pub fn len(&self) -> usize { self.rows.len() }

  pub fn is_empty(&self) -> bool { self.rows.is_empty() }

  pub fn column_index(&self, name: &str) -> Option<usize> {
    self.columns.iter().position(|c| c.name == name)
  }
}

// ─── Query results ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlColumn {
  pub name:   String,
  /// Storage class of the first non-null value, or `NULL` if none.
  #[serde(rename = "type")]
  pub r#type: String,
}

/// Rows returned by the query runner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
  pub columns:       Vec<SqlColumn>,
  pub rows:          Vec<Vec<Value>>,
  pub row_count:     usize,
  /// Set when rows beyond the configured limit were dropped.
  pub truncated:     bool,
  /// Populated for statements that return no columns.
  pub rows_affected: Option<usize>,
}

impl QueryResult {
  pub fn column_index(&self, name: &str) -> Option<usize> {
    self.columns.iter().position(|c| c.name == name)
  }

  /// Convenience accessor used by reports: the cell at `(row, column)`.
  pub fn cell(&self, row: usize, column: &str) -> Option<&Value> {
    let idx = self.column_index(column)?;
    self.rows.get(row).and_then(|r| r.get(idx))
  }
}

/// Limits applied when running a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
  pub max_rows:  usize,
  /// Reject statements SQLite reports as writing to the database.
  pub read_only: bool,
}

impl Default for QueryOptions {
  fn default() -> Self {
    Self { max_rows: 10_000, read_only: false }
  }
}
