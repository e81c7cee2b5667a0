//! [`QueryResult`] → CSV.

use std::io::Write;

use sales_core::table::QueryResult;
use serde_json::Value;

use crate::error::Result;

fn field(value: &Value) -> String {
  match value {
    Value::Null => String::new(),
    Value::String(s) => s.clone(),
    other => other.to_string(),
  }
}

/// Write `result` as CSV: one header row of column names, then each row.
pub fn write_result_csv<W: Write>(result: &QueryResult, writer: W) -> Result<()> {
  let mut wtr = csv::Writer::from_writer(writer);
  wtr.write_record(result.columns.iter().map(|c| c.name.as_str()))?;
  for row in &result.rows {
    wtr.write_record(row.iter().map(field))?;
  }
  wtr.flush()?;
  Ok(())
}

/// Render `result` as a CSV string.
pub fn result_to_csv(result: &QueryResult) -> Result<String> {
  let mut buf = Vec::new();
  write_result_csv(result, &mut buf)?;
  Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[cfg(test)]
mod tests {
  use sales_core::table::SqlColumn;
  use serde_json::json;

  use super::*;

  #[test]
  fn renders_header_and_rows() {
    let result = QueryResult {
      columns: vec![
        SqlColumn { name: "Store".into(), r#type: "INTEGER".into() },
        SqlColumn { name: "note".into(), r#type: "TEXT".into() },
        SqlColumn { name: "total_sales".into(), r#type: "REAL".into() },
      ],
      rows: vec![
        vec![json!(1), json!("a, b"), json!(12.5)],
        vec![json!(2), Value::Null, json!(3.0)],
      ],
      row_count: 2,
      ..Default::default()
    };
    let csv = result_to_csv(&result).unwrap();
    assert_eq!(csv, "Store,note,total_sales\n1,\"a, b\",12.5\n2,,3.0\n");
  }
}
