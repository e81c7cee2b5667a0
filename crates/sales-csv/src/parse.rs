//! CSV → [`Table`] parser.
//!
//! Pipeline:
//!   reader
//!     └─ csv::Reader (strict field counts, trimmed)  → raw rows
//!          └─ check_required()                       → schema gate
//!               └─ infer_column() per column         → typed cells

use std::{collections::HashSet, io::Read};

use chrono::{NaiveDate, NaiveDateTime};
use sales_core::table::{Cell, Column, ColumnType, DATE_COLUMN, Dataset, Table};

use crate::error::{Error, Result};

/// Accepted date layouts, tried in order.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y", "%Y/%m/%d"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

// ─── Field helpers ───────────────────────────────────────────────────────────

/// Markers a dataframe reader treats as missing.
fn is_missing(field: &str) -> bool {
  matches!(field, "" | "NA" | "N/A" | "NaN" | "nan" | "null" | "NULL")
}

fn parse_bool(field: &str) -> Option<bool> {
  match field {
    "True" | "true" | "TRUE" => Some(true),
    "False" | "false" | "FALSE" => Some(false),
    _ => None,
  }
}

/// Parse a date in any accepted layout. Datetimes are truncated to the day.
pub(crate) fn parse_date(field: &str) -> Option<NaiveDate> {
  DATE_FORMATS
    .iter()
    .find_map(|f| NaiveDate::parse_from_str(field, f).ok())
    .or_else(|| {
      DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(field, f).ok())
        .map(|dt| dt.date())
    })
}

// ─── Type inference ──────────────────────────────────────────────────────────

/// Pick the narrowest type every non-missing value fits. A column with no
/// values at all is treated as real, like an all-NaN dataframe column.
fn infer_type(values: &[&str]) -> ColumnType {
  let present: Vec<&str> = values.iter().copied().filter(|v| !is_missing(v)).collect();
  if present.is_empty() {
    ColumnType::Real
  } else if present.iter().all(|v| v.parse::<i64>().is_ok()) {
    ColumnType::Integer
  } else if present.iter().all(|v| v.parse::<f64>().is_ok()) {
    ColumnType::Real
  } else if present.iter().all(|v| parse_bool(v).is_some()) {
    ColumnType::Bool
  } else {
    ColumnType::Text
  }
}

fn to_cell(kind: ColumnType, field: &str) -> Cell {
  if is_missing(field) {
    return Cell::Null;
  }
  match kind {
    ColumnType::Integer => field.parse().map(Cell::Integer).unwrap_or(Cell::Null),
    ColumnType::Real => field.parse().map(Cell::Real).unwrap_or(Cell::Null),
    ColumnType::Bool => parse_bool(field).map(Cell::Bool).unwrap_or(Cell::Null),
    ColumnType::Date => parse_date(field).map(Cell::Date).unwrap_or(Cell::Null),
    ColumnType::Text => Cell::Text(field.to_owned()),
  }
}

// ─── Schema gate ─────────────────────────────────────────────────────────────

fn check_headers(table: &str, headers: &[String]) -> Result<()> {
  let mut seen = HashSet::new();
  for h in headers {
    if !seen.insert(h.as_str()) {
      return Err(Error::DuplicateColumn(h.clone()));
    }
  }

  let Some(dataset) = Dataset::from_table_name(table) else {
    return Ok(());
  };
  let missing: Vec<String> = dataset
    .required_columns()
    .iter()
    .filter(|c| !seen.contains(**c))
    .map(|c| (*c).to_owned())
    .collect();
  if missing.is_empty() {
    Ok(())
  } else {
    Err(Error::MissingColumns { table: table.to_owned(), missing })
  }
}

// ─── Entry point ─────────────────────────────────────────────────────────────

pub(crate) fn parse_table<R: Read>(table: &str, reader: R) -> Result<Table> {
  let mut rdr = csv::ReaderBuilder::new()
    .has_headers(true)
    .trim(csv::Trim::All)
    .from_reader(reader);

  let headers: Vec<String> = rdr.headers()?.iter().map(str::to_owned).collect();
  if headers.is_empty() || headers.iter().all(String::is_empty) {
    return Err(Error::Empty);
  }
  check_headers(table, &headers)?;

  let mut raw: Vec<(u64, csv::StringRecord)> = Vec::new();
  for record in rdr.records() {
    let record = record?;
    let line = record.position().map(|p| p.line()).unwrap_or_default();
    raw.push((line, record));
  }

  let mut columns = Vec::with_capacity(headers.len());
  for (idx, name) in headers.iter().enumerate() {
    let kind = if name == DATE_COLUMN {
      // Every present value must be a date; a bad one fails the file.
      for (line, record) in &raw {
        let field = record.get(idx).unwrap_or_default();
        if !is_missing(field) && parse_date(field).is_none() {
          return Err(Error::InvalidDate { line: *line, value: field.to_owned() });
        }
      }
      ColumnType::Date
    } else {
      let values: Vec<&str> =
        raw.iter().map(|(_, r)| r.get(idx).unwrap_or_default()).collect();
      infer_type(&values)
    };
    columns.push(Column { name: name.clone(), kind });
  }

  let rows = raw
    .iter()
    .map(|(_, record)| {
      columns
        .iter()
        .enumerate()
        .map(|(idx, col)| to_cell(col.kind, record.get(idx).unwrap_or_default()))
        .collect()
    })
    .collect();

  Ok(Table { name: table.to_owned(), columns, rows })
}

#[cfg(test)]
mod tests {
  use super::*;

  fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
  }

  const TRAIN: &str = "\
Store,Dept,Date,Weekly_Sales,IsHoliday
1,1,2010-02-05,24924.5,FALSE
1,1,2010-02-12,46039.49,TRUE
1,2,2010-02-05,50605.27,FALSE
";

  #[test]
  fn parses_train_with_inferred_types() {
    let table = parse_table("train", TRAIN.as_bytes()).unwrap();
    assert_eq!(table.len(), 3);
    let kinds: Vec<_> = table.columns.iter().map(|c| c.kind).collect();
    assert_eq!(
      kinds,
      vec![
        ColumnType::Integer,
        ColumnType::Integer,
        ColumnType::Date,
        ColumnType::Real,
        ColumnType::Bool,
      ]
    );
    assert_eq!(table.rows[1][2], Cell::Date(d(2010, 2, 12)));
    assert_eq!(table.rows[1][4], Cell::Bool(true));
    assert_eq!(table.rows[0][3], Cell::Real(24924.5));
  }

  #[test]
  fn na_markers_become_null() {
    let csv = "\
Store,Date,Temperature,Fuel_Price,MarkDown1,CPI,Unemployment,IsHoliday
1,2010-02-05,42.31,2.572,NA,211.0963582,8.106,FALSE
1,2010-02-12,38.51,2.548,,211.2421698,NA,TRUE
";
    let table = parse_table("features", csv.as_bytes()).unwrap();
    let markdown = table.column_index("MarkDown1").unwrap();
    assert_eq!(table.columns[markdown].kind, ColumnType::Real);
    assert!(table.rows.iter().all(|r| r[markdown].is_null()));
    let unemployment = table.column_index("Unemployment").unwrap();
    assert_eq!(table.rows[0][unemployment], Cell::Real(8.106));
    assert!(table.rows[1][unemployment].is_null());
  }

  #[test]
  fn text_columns_stay_text() {
    let csv = "Store,Type,Size\n1,A,151315\n2,B,202307\n";
    let table = parse_table("stores", csv.as_bytes()).unwrap();
    assert_eq!(table.columns[1].kind, ColumnType::Text);
    assert_eq!(table.rows[1][1], Cell::Text("B".into()));
    assert_eq!(table.rows[1][2], Cell::Integer(202307));
  }

  #[test]
  fn accepts_alternative_date_layouts() {
    assert_eq!(parse_date("2010-02-05 00:00:00"), Some(d(2010, 2, 5)));
    assert_eq!(parse_date("02/05/2010"), Some(d(2010, 2, 5)));
    assert_eq!(parse_date("25/12/2010"), Some(d(2010, 12, 25)));
    assert_eq!(parse_date("yesterday"), None);
  }

  #[test]
  fn missing_required_columns_are_reported() {
    let csv = "Store,Dept,Weekly_Sales\n1,1,10.0\n";
    let err = parse_table("train", csv.as_bytes()).unwrap_err();
    match err {
      Error::MissingColumns { table, missing } => {
        assert_eq!(table, "train");
        assert_eq!(missing, vec!["Date".to_string(), "IsHoliday".to_string()]);
      }
      other => panic!("unexpected error: {other}"),
    }
  }

  #[test]
  fn custom_tables_have_no_required_columns() {
    let csv = "a,b\n1,x\n";
    let table = parse_table("scratch", csv.as_bytes()).unwrap();
    assert_eq!(table.len(), 1);
  }

  #[test]
  fn ragged_rows_are_malformed() {
    let csv = "Store,Type,Size\n1,A\n";
    assert!(matches!(parse_table("stores", csv.as_bytes()), Err(Error::Csv(_))));
  }

  #[test]
  fn bad_date_names_the_line() {
    let csv = "Store,Date\n1,2010-02-05\n1,not-a-date\n";
    match parse_table("scratch", csv.as_bytes()).unwrap_err() {
      Error::InvalidDate { line, value } => {
        assert_eq!(line, 3);
        assert_eq!(value, "not-a-date");
      }
      other => panic!("unexpected error: {other}"),
    }
  }

  #[test]
  fn empty_input_is_rejected() {
    assert!(matches!(parse_table("train", "".as_bytes()), Err(Error::Empty)));
  }

  #[test]
  fn duplicate_headers_are_rejected() {
    let csv = "Store,Store\n1,2\n";
    assert!(matches!(
      parse_table("scratch", csv.as_bytes()),
      Err(Error::DuplicateColumn(c)) if c == "Store"
    ));
  }

  #[test]
  fn header_only_file_yields_empty_table() {
    let table = parse_table("stores", "Store,Type,Size\n".as_bytes()).unwrap();
    assert!(table.is_empty());
    assert_eq!(table.columns.len(), 3);
  }
}
