//! The batch loader: ingest the dataset CSVs in a directory into the
//! database, build indexes and read back the headline numbers.

use std::{fmt, fs, path::Path};

use sales_core::store::{SalesStore, TableInfo, TableLoad, ValidationSummary};
use sales_csv::IngestReport;
use sales_store_sqlite::SqliteStore;

use crate::{Error, Result};

/// Everything the loader did, for printing.
#[derive(Debug)]
pub struct LoadSummary {
  pub ingest:     IngestReport,
  pub tables:     Vec<TableLoad>,
  pub indexes:    Vec<String>,
  /// `None` when no `train.csv` was loaded.
  pub validation: Option<ValidationSummary>,
  pub table_info: Vec<TableInfo>,
}

/// Ingest every dataset file in `data_dir` into the database at `db_path`.
///
/// Files that fail to parse are reported and skipped; tables that already
/// exist for them are left as they were. Fails if `data_dir` is missing or
/// holds no dataset that could be parsed.
pub async fn load_dir(data_dir: &Path, db_path: &Path) -> Result<LoadSummary> {
  if !data_dir.is_dir() {
    return Err(Error::DataDir(data_dir.to_path_buf()));
  }

  let mut ingest = sales_csv::ingest_dir(data_dir);
  if ingest.is_empty() {
    return Err(Error::NoDatasets(data_dir.to_path_buf()));
  }

  if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
    fs::create_dir_all(parent).map_err(|source| Error::CreateDir {
      path: parent.to_path_buf(),
      source,
    })?;
  }

  tracing::info!(db = %db_path.display(), "opening database");
  let store = SqliteStore::open(db_path).await?;

  let tables = store.replace_tables(std::mem::take(&mut ingest.tables)).await?;
  let indexes = store.create_indexes().await?;
  let validation = if store.has_table("train").await? {
    Some(store.validation_summary().await?)
  } else {
    None
  };
  let table_info = store.table_info().await?;

  Ok(LoadSummary { ingest, tables, indexes, validation, table_info })
}

impl fmt::Display for LoadSummary {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for load in &self.tables {
      writeln!(f, "loaded {:<10} {:>10} rows", load.table, load.rows)?;
    }
    for file in &self.ingest.missing {
      writeln!(f, "missing {file}")?;
    }
    for failed in &self.ingest.failed {
      writeln!(f, "failed {}: {}", failed.file, failed.error)?;
    }
    writeln!(f, "indexes: {}", self.indexes.len())?;

    if let Some(v) = &self.validation {
      writeln!(f)?;
      writeln!(f, "Total records:      {}", v.total_records)?;
      writeln!(f, "Unique stores:      {}", v.unique_stores)?;
      writeln!(f, "Unique departments: {}", v.unique_departments)?;
      writeln!(
        f,
        "Date range:         {} to {}",
        v.earliest_date.as_deref().unwrap_or("-"),
        v.latest_date.as_deref().unwrap_or("-"),
      )?;
      match v.total_sales {
        Some(total) => writeln!(f, "Total sales:        ${total:.2}")?,
        None => writeln!(f, "Total sales:        -")?,
      }
    }

    writeln!(f)?;
    for table in &self.table_info {
      let columns: Vec<String> = table
        .columns
        .iter()
        .map(|c| format!("{} {}", c.name, c.decl_type))
        .collect();
      writeln!(f, "{} ({} rows): {}", table.name, table.row_count, columns.join(", "))?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const TRAIN: &str = "\
Store,Dept,Date,Weekly_Sales,IsHoliday
1,1,2010-02-05,24924.5,FALSE
1,1,2010-02-12,46039.49,TRUE
2,1,2010-02-05,50605.27,FALSE
";

  #[tokio::test]
  async fn loads_directory_and_validates() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("train.csv"), TRAIN).unwrap();
    fs::write(dir.path().join("stores.csv"), "Store,Type,Size\n1,A,151315\n").unwrap();
    // Missing most required columns.
    fs::write(dir.path().join("features.csv"), "Store,Date\n1\n").unwrap();

    let db = dir.path().join("out").join("sales.db");
    let summary = load_dir(dir.path(), &db).await.unwrap();

    assert!(db.exists());
    assert_eq!(summary.tables.len(), 2);
    assert_eq!(summary.ingest.failed.len(), 1);
    assert_eq!(summary.ingest.missing, vec!["test.csv".to_string()]);

    let v = summary.validation.as_ref().unwrap();
    assert_eq!(v.total_records, 3);
    assert_eq!(v.unique_stores, 2);
    assert_eq!(v.earliest_date.as_deref(), Some("2010-02-05"));

    let text = summary.to_string();
    assert!(text.contains("Total records:      3"));
    assert!(text.contains("failed features.csv"));
  }

  #[tokio::test]
  async fn reloading_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("train.csv"), TRAIN).unwrap();
    let db = dir.path().join("sales.db");

    let first = load_dir(dir.path(), &db).await.unwrap();
    let second = load_dir(dir.path(), &db).await.unwrap();
    assert_eq!(first.tables, second.tables);
    assert_eq!(second.validation.unwrap().total_records, 3);
  }

  #[tokio::test]
  async fn empty_directory_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_dir(dir.path(), &dir.path().join("sales.db")).await.unwrap_err();
    assert!(matches!(err, Error::NoDatasets(_)));

    let missing = dir.path().join("nope");
    let err = load_dir(&missing, &dir.path().join("sales.db")).await.unwrap_err();
    assert!(matches!(err, Error::DataDir(_)));
  }
}
