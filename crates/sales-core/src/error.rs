//! Error types for `sales-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown query: {0:?}")]
  UnknownQuery(String),

  #[error("unknown aggregation period: {0:?}")]
  UnknownPeriod(String),

  #[error("moving average window must be between {min} and {max}, got {got}")]
  InvalidWindow { got: usize, min: usize, max: usize },

  #[error("invalid table name: {0:?}")]
  InvalidTableName(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
