//! [`SqliteStore`]: the SQLite implementation of [`SalesStore`].

use std::path::Path;

use rusqlite::{OptionalExtension as _, types::Type};

use sales_core::{
  catalog::validation,
  model::{FeatureRecord, SalesRecord, Store},
  store::{ColumnInfo, SalesStore, TableInfo, TableLoad, ValidationSummary},
  table::{QueryOptions, QueryResult, SqlColumn, Table, is_valid_table_name},
};

use crate::{
  Error, Result,
  encode::{RawFeature, RawSales, RawStore, encode_cell, storage_class, value_to_json},
  schema::{
    CONNECTION_SETUP, INDEXES, count_sql, create_table_sql, drop_table_sql, insert_sql,
    quote_ident,
  },
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// The sales dataset held in a single SQLite database.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

/// What the query runner's closure hands back. Rejections are decided on the
/// database thread but reported as a store error outside it.
enum QueryOutcome {
  Rows(QueryResult),
  Empty,
  MultipleStatements,
  WriteRejected,
}

fn limit_param(limit: Option<usize>) -> i64 {
  limit.map(|n| i64::try_from(n).unwrap_or(i64::MAX)).unwrap_or(-1)
}

/// Strip surrounding whitespace and trailing semicolons.
fn normalize_sql(sql: &str) -> &str {
  sql.trim().trim_end_matches(';').trim_end()
}

impl SqliteStore {
  /// Open (or create) a store at `path`.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init().await?;
    Ok(store)
  }

  async fn init(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(CONNECTION_SETUP)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Names of all user tables, in creation order.
  pub async fn table_names(&self) -> Result<Vec<String>> {
    let names = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT name FROM sqlite_master
           WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
           ORDER BY rowid",
        )?;
        let names = stmt
          .query_map([], |row| row.get::<_, String>(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(names)
      })
      .await?;
    Ok(names)
  }
}

// ─── SalesStore impl ─────────────────────────────────────────────────────────

impl SalesStore for SqliteStore {
  type Error = Error;

  // ── Builder ───────────────────────────────────────────────────────────────

  async fn replace_tables(&self, tables: Vec<Table>) -> Result<Vec<TableLoad>> {
    for table in &tables {
      if !is_valid_table_name(&table.name) {
        return Err(Error::InvalidTableName(table.name.clone()));
      }
      if table.columns.is_empty() {
        return Err(Error::NoColumns(table.name.clone()));
      }
    }

    let loads = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut loads = Vec::with_capacity(tables.len());
        for table in tables {
          tx.execute(&drop_table_sql(&table.name), [])?;
          tx.execute(&create_table_sql(&table), [])?;
          {
            let mut stmt = tx.prepare(&insert_sql(&table))?;
            for row in table.rows {
              stmt.execute(rusqlite::params_from_iter(row.into_iter().map(encode_cell)))?;
            }
          }
          let rows: i64 = tx.query_row(&count_sql(&table.name), [], |r| r.get(0))?;
          loads.push(TableLoad { table: table.name, rows: rows as usize });
        }
        tx.commit()?;
        Ok(loads)
      })
      .await?;

    for load in &loads {
      tracing::info!(table = %load.table, rows = load.rows, "table written");
    }
    Ok(loads)
  }

  async fn create_indexes(&self) -> Result<Vec<String>> {
    let created = self
      .conn
      .call(|conn| {
        let mut created = Vec::new();
        for index in INDEXES {
          let exists = conn
            .query_row(
              "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
              rusqlite::params![index.table],
              |_| Ok(()),
            )
            .optional()?
            .is_some();
          if !exists {
            continue;
          }
          conn.execute(&index.create_sql(), [])?;
          created.push(index.name.to_owned());
        }
        Ok(created)
      })
      .await?;

    tracing::info!(count = created.len(), "indexes created");
    Ok(created)
  }

  // ── Query runner ──────────────────────────────────────────────────────────

  async fn run_query(&self, sql: &str, options: QueryOptions) -> Result<QueryResult> {
    let sql = normalize_sql(sql).to_owned();
    if sql.is_empty() {
      return Err(Error::EmptyQuery);
    }
    let QueryOptions { max_rows, read_only } = options;

    let outcome = self
      .conn
      .call(move |conn| {
        // Compiling the remainder never runs it; anything left over is refused.
        let mut batch = rusqlite::Batch::new(conn, &sql);
        let Some(mut stmt) = batch.next()? else {
          return Ok(QueryOutcome::Empty);
        };
        if batch.next()?.is_some() {
          return Ok(QueryOutcome::MultipleStatements);
        }
        if read_only && !stmt.readonly() {
          return Ok(QueryOutcome::WriteRejected);
        }

        let column_count = stmt.column_count();
        if column_count == 0 {
          let affected = stmt.execute([])?;
          return Ok(QueryOutcome::Rows(QueryResult {
            rows_affected: Some(affected),
            ..Default::default()
          }));
        }

        let names: Vec<String> =
          stmt.column_names().into_iter().map(str::to_owned).collect();
        let mut types: Vec<Option<&'static str>> = vec![None; column_count];
        let mut out: Vec<Vec<serde_json::Value>> = Vec::new();
        let mut truncated = false;

        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
          if out.len() == max_rows {
            truncated = true;
            break;
          }
          let mut cells = Vec::with_capacity(column_count);
          for (idx, ty) in types.iter_mut().enumerate() {
            let value = row.get_ref(idx)?;
            if ty.is_none() && value.data_type() != Type::Null {
              *ty = Some(storage_class(value.data_type()));
            }
            cells.push(value_to_json(value));
          }
          out.push(cells);
        }

        let columns = names
          .into_iter()
          .zip(types)
          .map(|(name, ty)| SqlColumn {
            name,
            r#type: ty.unwrap_or("NULL").to_owned(),
          })
          .collect();

        Ok(QueryOutcome::Rows(QueryResult {
          columns,
          row_count: out.len(),
          rows: out,
          truncated,
          rows_affected: None,
        }))
      })
      .await?;

    match outcome {
      QueryOutcome::Rows(result) => {
        tracing::debug!(rows = result.row_count, truncated = result.truncated, "query ran");
        Ok(result)
      }
      QueryOutcome::Empty => Err(Error::EmptyQuery),
      QueryOutcome::MultipleStatements => Err(Error::MultipleStatements),
      QueryOutcome::WriteRejected => Err(Error::WriteRejected),
    }
  }

  // ── Introspection ─────────────────────────────────────────────────────────

  async fn has_table(&self, name: &str) -> Result<bool> {
    let name = name.to_owned();
    let exists = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
              rusqlite::params![name],
              |_| Ok(()),
            )
            .optional()?
            .is_some(),
        )
      })
      .await?;
    Ok(exists)
  }

  async fn table_info(&self) -> Result<Vec<TableInfo>> {
    let names = self.table_names().await?;

    let infos = self
      .conn
      .call(move |conn| {
        let mut infos = Vec::with_capacity(names.len());
        for name in names {
          let rows: i64 = conn.query_row(&count_sql(&name), [], |r| r.get(0))?;
          let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote_ident(&name)))?;
          let columns = stmt
            .query_map([], |row| {
              Ok(ColumnInfo { name: row.get(1)?, decl_type: row.get(2)? })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          infos.push(TableInfo { name, row_count: rows as usize, columns });
        }
        Ok(infos)
      })
      .await?;
    Ok(infos)
  }

  async fn validation_summary(&self) -> Result<ValidationSummary> {
    if !self.has_table("train").await? {
      return Err(Error::TableNotFound("train".into()));
    }

    let summary = self
      .conn
      .call(|conn| {
        let count = |sql: &str| -> rusqlite::Result<usize> {
          conn.query_row(sql, [], |r| r.get::<_, i64>(0)).map(|n| n as usize)
        };
        let total_records = count(validation::TOTAL_RECORDS)?;
        let unique_stores = count(validation::UNIQUE_STORES)?;
        let unique_departments = count(validation::UNIQUE_DEPARTMENTS)?;
        let (earliest_date, latest_date): (Option<String>, Option<String>) =
          conn.query_row(validation::DATE_RANGE, [], |r| Ok((r.get(0)?, r.get(1)?)))?;
        let total_sales: Option<f64> = conn.query_row(validation::TOTAL_SALES, [], |r| r.get(0))?;
        Ok(ValidationSummary {
          total_records,
          unique_stores,
          unique_departments,
          earliest_date,
          latest_date,
          total_sales,
        })
      })
      .await?;
    Ok(summary)
  }

  // ── Typed reads ───────────────────────────────────────────────────────────

  async fn load_sales(&self, limit: Option<usize>) -> Result<Vec<SalesRecord>> {
    let limit = limit_param(limit);
    let raws: Vec<RawSales> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT Store, Dept, Date, Weekly_Sales, IsHoliday FROM train LIMIT ?1",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![limit], |row| {
            Ok(RawSales {
              store:        row.get(0)?,
              dept:         row.get(1)?,
              date:         row.get(2)?,
              weekly_sales: row.get(3)?,
              is_holiday:   row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let read = raws.len();
    let mut records = Vec::with_capacity(read);
    for raw in raws {
      if let Some(record) = raw.into_record()? {
        records.push(record);
      }
    }
    if records.len() < read {
      tracing::warn!(skipped = read - records.len(), "skipped train rows with missing values");
    }
    Ok(records)
  }

  async fn load_stores(&self) -> Result<Vec<Store>> {
    let raws: Vec<RawStore> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare("SELECT Store, Type, Size FROM stores")?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawStore {
              store:      row.get(0)?,
              store_type: row.get(1)?,
              size:       row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let read = raws.len();
    let stores: Vec<Store> = raws.into_iter().filter_map(RawStore::into_store).collect();
    if stores.len() < read {
      tracing::warn!(skipped = read - stores.len(), "skipped stores rows with missing values");
    }
    Ok(stores)
  }

  async fn load_features(&self, limit: Option<usize>) -> Result<Vec<FeatureRecord>> {
    let limit = limit_param(limit);
    let raws: Vec<RawFeature> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT Store, Date, Temperature, Fuel_Price, CPI, Unemployment
           FROM features LIMIT ?1",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![limit], |row| {
            Ok(RawFeature {
              store:        row.get(0)?,
              date:         row.get(1)?,
              temperature:  row.get(2)?,
              fuel_price:   row.get(3)?,
              cpi:          row.get(4)?,
              unemployment: row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let read = raws.len();
    let mut records = Vec::with_capacity(read);
    for raw in raws {
      if let Some(record) = raw.into_record()? {
        records.push(record);
      }
    }
    if records.len() < read {
      tracing::warn!(skipped = read - records.len(), "skipped features rows with missing values");
    }
    Ok(records)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn normalize_strips_trailing_semicolons() {
    assert_eq!(normalize_sql("  SELECT 1;;  \n"), "SELECT 1");
    assert_eq!(normalize_sql(" ; "), "");
  }

  #[test]
  fn unlimited_reads_use_negative_limit() {
    assert_eq!(limit_param(None), -1);
    assert_eq!(limit_param(Some(5)), 5);
  }
}
