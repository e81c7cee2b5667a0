//! Error types for the CSV ingestor.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("cannot open {path}: {source}")]
  Open {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("malformed CSV: {0}")]
  Csv(#[from] csv::Error),

  #[error("file has no header row")]
  Empty,

  #[error("invalid table name: {0:?}")]
  InvalidTableName(String),

  #[error("duplicate column {0:?}")]
  DuplicateColumn(String),

  #[error("{table} is missing required columns: {}", missing.join(", "))]
  MissingColumns { table: String, missing: Vec<String> },

  #[error("line {line}: invalid date {value:?}")]
  InvalidDate { line: u64, value: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
