//! CSV ingestor for the sales explorer.
//!
//! Reads delimited text into [`sales_core::table::Table`]s. Any `Date`
//! column is normalised to a calendar date; other columns get the narrowest
//! type that fits every value. Pure synchronous; no database dependencies.
//!
//! # Quick start
//!
//! ```no_run
//! let report = sales_csv::ingest_dir("data");
//! for failure in &report.failed {
//!   eprintln!("{}: {}", failure.file, failure.error);
//! }
//! println!("{} tables ready", report.tables.len());
//! ```

pub mod error;
mod export;
mod parse;

use std::{fs::File, io::Read, path::Path};

pub use error::{Error, Result};
pub use export::{result_to_csv, write_result_csv};
use sales_core::table::{Dataset, Table, is_valid_table_name};
use serde_json::json;

// ─── Single tables ───────────────────────────────────────────────────────────

/// Parse CSV from `reader` into a table called `name`.
///
/// If `name` is a known dataset, its required columns must be present.
pub fn read_table<R: Read>(name: &str, reader: R) -> Result<Table> {
  if !is_valid_table_name(name) {
    return Err(Error::InvalidTableName(name.to_owned()));
  }
  parse::parse_table(name, reader)
}

/// Parse an uploaded byte stream.
pub fn read_table_bytes(name: &str, bytes: &[u8]) -> Result<Table> {
  read_table(name, bytes)
}

/// Parse the file at `path`.
pub fn read_table_file(name: &str, path: impl AsRef<Path>) -> Result<Table> {
  let path = path.as_ref();
  let file = File::open(path).map_err(|source| Error::Open {
    path: path.to_path_buf(),
    source,
  })?;
  read_table(name, file)
}

// ─── Directory ingest ────────────────────────────────────────────────────────

/// A dataset file that was parsed successfully.
#[derive(Debug, Clone)]
pub struct LoadedFile {
  pub table:   String,
  pub file:    String,
  pub rows:    usize,
  pub columns: usize,
}

/// A dataset file that was present but could not be ingested.
#[derive(Debug)]
pub struct FailedFile {
  pub table: String,
  pub file:  String,
  pub error: Error,
}

/// Outcome of [`ingest_dir`]. Failures never prevent other files loading.
#[derive(Debug, Default)]
pub struct IngestReport {
  pub tables:  Vec<Table>,
  pub loaded:  Vec<LoadedFile>,
  /// File names that were not found.
  pub missing: Vec<String>,
  pub failed:  Vec<FailedFile>,
}

impl IngestReport {
  pub fn is_empty(&self) -> bool { self.tables.is_empty() }

  /// JSON summary for API responses and logs; tables are reduced to counts.
  pub fn summary(&self) -> serde_json::Value {
    json!({
      "loaded": self.loaded.iter().map(|l| json!({
        "table": l.table, "file": l.file, "rows": l.rows, "columns": l.columns,
      })).collect::<Vec<_>>(),
      "missing": self.missing,
      "failed": self.failed.iter().map(|f| json!({
        "table": f.table, "file": f.file, "error": f.error.to_string(),
      })).collect::<Vec<_>>(),
    })
  }

  /// Record the outcome of ingesting one file.
  pub fn record(&mut self, table: &str, file: &str, outcome: Result<Table>) {
    match outcome {
      Ok(t) => {
        tracing::info!(
          table, file, rows = t.len(), columns = t.columns.len(), "loaded CSV"
        );
        self.loaded.push(LoadedFile {
          table:   table.to_owned(),
          file:    file.to_owned(),
          rows:    t.len(),
          columns: t.columns.len(),
        });
        self.tables.push(t);
      }
      Err(error) => {
        tracing::warn!(table, file, %error, "failed to load CSV");
        self.failed.push(FailedFile {
          table: table.to_owned(),
          file: file.to_owned(),
          error,
        });
      }
    }
  }
}

/// Ingest every known dataset file (`train.csv`, `test.csv`, `features.csv`,
/// `stores.csv`) found in `dir`.
pub fn ingest_dir(dir: impl AsRef<Path>) -> IngestReport {
  let dir = dir.as_ref();
  let mut report = IngestReport::default();

  for dataset in Dataset::ALL {
    let file = dataset.file_name();
    let path = dir.join(file);
    if !path.exists() {
      tracing::warn!(file, dir = %dir.display(), "file not found");
      report.missing.push(file.to_owned());
      continue;
    }
    tracing::info!(file, "loading");
    report.record(dataset.table_name(), file, read_table_file(dataset.table_name(), &path));
  }

  report
}
