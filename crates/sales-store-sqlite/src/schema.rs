//! DDL for the sales store.
//!
//! Table layouts are not fixed: each table is created from the columns of the
//! [`Table`] being written. Only the connection pragmas and the secondary
//! indexes are static.

use sales_core::table::Table;

/// Executed once when a connection is opened.
pub const CONNECTION_SETUP: &str = "
PRAGMA journal_mode = WAL;
";

/// A secondary index on a commonly filtered column set.
#[derive(Debug, Clone, Copy)]
pub struct IndexDef {
  pub name:    &'static str,
  pub table:   &'static str,
  pub columns: &'static [&'static str],
}

/// Indexes built after every load; each is skipped if its table is absent.
pub const INDEXES: &[IndexDef] = &[
  IndexDef { name: "idx_train_store",      table: "train",    columns: &["Store"] },
  IndexDef { name: "idx_train_dept",       table: "train",    columns: &["Dept"] },
  IndexDef { name: "idx_train_date",       table: "train",    columns: &["Date"] },
  IndexDef { name: "idx_train_store_dept", table: "train",    columns: &["Store", "Dept"] },
  IndexDef { name: "idx_features_store",   table: "features", columns: &["Store"] },
  IndexDef { name: "idx_features_date",    table: "features", columns: &["Date"] },
  IndexDef { name: "idx_stores_type",      table: "stores",   columns: &["Type"] },
];

impl IndexDef {
  pub fn create_sql(&self) -> String {
    let cols: Vec<String> = self.columns.iter().map(|c| quote_ident(c)).collect();
    format!(
      "CREATE INDEX IF NOT EXISTS {} ON {}({})",
      quote_ident(self.name),
      quote_ident(self.table),
      cols.join(", "),
    )
  }
}

/// Double-quote an identifier, doubling any embedded quotes.
pub fn quote_ident(name: &str) -> String {
  format!("\"{}\"", name.replace('"', "\"\""))
}

pub fn drop_table_sql(table: &str) -> String {
  format!("DROP TABLE IF EXISTS {}", quote_ident(table))
}

pub fn create_table_sql(table: &Table) -> String {
  let cols: Vec<String> = table
    .columns
    .iter()
    .map(|c| format!("{} {}", quote_ident(&c.name), c.kind.sql_type()))
    .collect();
  format!("CREATE TABLE {} ({})", quote_ident(&table.name), cols.join(", "))
}

pub fn insert_sql(table: &Table) -> String {
  let cols: Vec<String> = table.columns.iter().map(|c| quote_ident(&c.name)).collect();
  let params: Vec<String> = (1..=table.columns.len()).map(|i| format!("?{i}")).collect();
  format!(
    "INSERT INTO {} ({}) VALUES ({})",
    quote_ident(&table.name),
    cols.join(", "),
    params.join(", "),
  )
}

pub fn count_sql(table: &str) -> String {
  format!("SELECT COUNT(*) FROM {}", quote_ident(table))
}

#[cfg(test)]
mod tests {
  use sales_core::table::{Column, ColumnType};

  use super::*;

  #[test]
  fn ddl_quotes_identifiers() {
    let table = Table {
      name:    "stores".into(),
      columns: vec![
        Column { name: "Store".into(), kind: ColumnType::Integer },
        Column { name: "odd \"name\"".into(), kind: ColumnType::Text },
      ],
      rows:    vec![],
    };
    assert_eq!(
      create_table_sql(&table),
      "CREATE TABLE \"stores\" (\"Store\" INTEGER, \"odd \"\"name\"\"\" TEXT)"
    );
    assert_eq!(
      insert_sql(&table),
      "INSERT INTO \"stores\" (\"Store\", \"odd \"\"name\"\"\") VALUES (?1, ?2)"
    );
  }

  #[test]
  fn composite_index_sql() {
    let idx = INDEXES.iter().find(|i| i.name == "idx_train_store_dept").unwrap();
    assert_eq!(
      idx.create_sql(),
      "CREATE INDEX IF NOT EXISTS \"idx_train_store_dept\" ON \"train\"(\"Store\", \"Dept\")"
    );
  }
}
