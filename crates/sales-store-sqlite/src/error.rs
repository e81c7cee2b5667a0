//! Error type for `sales-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] sales_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("invalid table name: {0:?}")]
  InvalidTableName(String),

  #[error("table {0:?} has no columns")]
  NoColumns(String),

  #[error("table not found: {0}")]
  TableNotFound(String),

  #[error("query is empty")]
  EmptyQuery,

  #[error("only one statement can be executed at a time")]
  MultipleStatements,

  /// The store only accepts read-only statements and this one writes.
  #[error("query rejected: only read-only statements are allowed")]
  WriteRejected,

  #[error("cannot decode {column} value {value:?}")]
  Decode { column: &'static str, value: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
