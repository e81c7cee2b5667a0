//! Error type for `sales-server`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("configuration error: {0}")]
  Config(#[from] config::ConfigError),

  #[error("data directory {0} does not exist")]
  DataDir(PathBuf),

  #[error("no dataset files found in {0}")]
  NoDatasets(PathBuf),

  #[error("cannot create {path}: {source}")]
  CreateDir {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error(transparent)]
  Store(#[from] sales_store_sqlite::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
