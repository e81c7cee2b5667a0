//! Integration tests for `SqliteStore` against an in-memory database.

use sales_core::{
  catalog::QueryKind,
  store::SalesStore,
  table::{QueryOptions, Table},
};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

const WEEKS: [&str; 4] = ["2010-02-12", "2010-02-19", "2010-02-26", "2010-03-05"];

/// Two stores by two departments by four weeks. Sales are
/// `store * 1000 + dept * 100 + week` so every sum is exact.
fn train_csv() -> String {
  let mut csv = String::from("Store,Dept,Date,Weekly_Sales,IsHoliday\n");
  for store in 1..=2_i64 {
    for dept in 1..=2_i64 {
      for (week, date) in WEEKS.iter().enumerate() {
        let sales = store * 1000 + dept * 100 + week as i64;
        let holiday = if week == 0 { "TRUE" } else { "FALSE" };
        csv.push_str(&format!("{store},{dept},{date},{sales}.0,{holiday}\n"));
      }
    }
  }
  csv
}

const STORES_CSV: &str = "Store,Type,Size\n1,A,151315\n2,B,202307\n";

const FEATURES_CSV: &str = "\
Store,Date,Temperature,Fuel_Price,MarkDown1,CPI,Unemployment,IsHoliday
1,2010-02-12,38.51,2.548,NA,211.24,8.106,TRUE
2,2010-02-12,40.19,2.548,,210.89,8.324,TRUE
";

fn table(name: &str, csv: &str) -> Table {
  sales_csv::read_table_bytes(name, csv.as_bytes()).expect("fixture parses")
}

async fn loaded() -> SqliteStore {
  let s = store().await;
  s.replace_tables(vec![
    table("train", &train_csv()),
    table("stores", STORES_CSV),
    table("features", FEATURES_CSV),
  ])
  .await
  .unwrap();
  s
}

fn f64_at(result: &sales_core::table::QueryResult, row: usize, col: &str) -> f64 {
  result.cell(row, col).and_then(|v| v.as_f64()).expect("numeric cell")
}

// ─── Builder ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn replace_reports_row_counts() {
  let s = store().await;
  let loads = s
    .replace_tables(vec![table("train", &train_csv()), table("stores", STORES_CSV)])
    .await
    .unwrap();
  assert_eq!(loads.len(), 2);
  assert_eq!(loads[0].table, "train");
  assert_eq!(loads[0].rows, 16);
  assert_eq!(loads[1].rows, 2);
}

#[tokio::test]
async fn reloading_replaces_instead_of_appending() {
  let s = loaded().await;
  s.replace_tables(vec![table("train", &train_csv())]).await.unwrap();
  s.replace_tables(vec![table("train", &train_csv())]).await.unwrap();

  let summary = s.validation_summary().await.unwrap();
  assert_eq!(summary.total_records, 16);
  // Untouched tables survive a partial reload.
  assert!(s.has_table("stores").await.unwrap());
}

#[tokio::test]
async fn invalid_table_names_are_rejected() {
  let s = store().await;
  let mut t = table("stores", STORES_CSV);
  t.name = "stores; DROP TABLE train".into();
  let err = s.replace_tables(vec![t]).await.unwrap_err();
  assert!(matches!(err, Error::InvalidTableName(_)));
}

#[tokio::test]
async fn malformed_csv_leaves_existing_tables_intact() {
  let s = loaded().await;
  let bad = sales_csv::read_table_bytes("train", b"Store,Dept\n1\n");
  assert!(bad.is_err());

  let summary = s.validation_summary().await.unwrap();
  assert_eq!(summary.total_records, 16);
}

#[tokio::test]
async fn indexes_skip_absent_tables() {
  let s = store().await;
  s.replace_tables(vec![table("train", &train_csv())]).await.unwrap();
  let created = s.create_indexes().await.unwrap();
  assert_eq!(
    created,
    vec!["idx_train_store", "idx_train_dept", "idx_train_date", "idx_train_store_dept"]
  );

  let s = loaded().await;
  assert_eq!(s.create_indexes().await.unwrap().len(), crate::INDEXES.len());
  // Idempotent.
  assert_eq!(s.create_indexes().await.unwrap().len(), crate::INDEXES.len());
}

// ─── Catalog queries ─────────────────────────────────────────────────────────

#[tokio::test]
async fn overview_counts_every_record() {
  let s = loaded().await;
  let result = s
    .run_query(QueryKind::Overview.sql(), QueryOptions::default())
    .await
    .unwrap();
  assert_eq!(result.row_count, 1);
  assert_eq!(result.cell(0, "total_records"), Some(&serde_json::json!(16)));
  assert_eq!(result.cell(0, "unique_stores"), Some(&serde_json::json!(2)));
  assert_eq!(result.cell(0, "earliest_date"), Some(&serde_json::json!("2010-02-12")));
  assert_eq!(result.cell(0, "latest_date"), Some(&serde_json::json!("2010-03-05")));
  assert_eq!(f64_at(&result, 0, "total_sales"), 26424.0);
}

#[tokio::test]
async fn store_totals_partition_the_global_total() {
  let s = loaded().await;
  let result = s
    .run_query(QueryKind::TopStores.sql(), QueryOptions::default())
    .await
    .unwrap();
  assert_eq!(result.row_count, 2);
  // Ordered by total descending.
  assert_eq!(result.cell(0, "Store"), Some(&serde_json::json!(2)));
  assert_eq!(f64_at(&result, 0, "total_sales"), 17212.0);
  assert_eq!(f64_at(&result, 1, "total_sales"), 9212.0);
  let sum: f64 = (0..result.row_count).map(|r| f64_at(&result, r, "total_sales")).sum();
  assert_eq!(sum, 26424.0);
}

#[tokio::test]
async fn departments_without_records_are_absent() {
  let s = loaded().await;
  let result = s
    .run_query(QueryKind::DepartmentPerformance.sql(), QueryOptions::default())
    .await
    .unwrap();
  let depts: Vec<_> = result.rows.iter().map(|r| r[0].clone()).collect();
  assert_eq!(depts, vec![serde_json::json!(2), serde_json::json!(1)]);
  assert!(!depts.contains(&serde_json::json!(3)));
}

#[tokio::test]
async fn monthly_trend_sums_are_exact() {
  let s = loaded().await;
  let result = s
    .run_query(QueryKind::MonthlyTrend.sql(), QueryOptions::default())
    .await
    .unwrap();
  assert_eq!(result.row_count, 2);
  assert_eq!(result.cell(0, "month_year"), Some(&serde_json::json!("2010-02")));
  assert_eq!(f64_at(&result, 0, "monthly_sales"), 19812.0);
  assert_eq!(result.cell(1, "month_year"), Some(&serde_json::json!("2010-03")));
  assert_eq!(f64_at(&result, 1, "monthly_sales"), 6612.0);
}

#[tokio::test]
async fn holiday_impact_groups_stored_booleans() {
  let s = loaded().await;
  let result = s
    .run_query(QueryKind::HolidayImpact.sql(), QueryOptions::default())
    .await
    .unwrap();
  assert_eq!(result.row_count, 2);
  assert_eq!(result.cell(0, "IsHoliday"), Some(&serde_json::json!(0)));
  assert_eq!(result.cell(0, "record_count"), Some(&serde_json::json!(12)));
  assert_eq!(result.cell(1, "record_count"), Some(&serde_json::json!(4)));
}

#[tokio::test]
async fn schema_query_lists_tables() {
  let s = loaded().await;
  let result = s
    .run_query(QueryKind::Schema.sql(), QueryOptions::default())
    .await
    .unwrap();
  let names: Vec<_> = result.rows.iter().filter_map(|r| r[0].as_str()).collect();
  assert_eq!(names, vec!["train", "stores", "features"]);
}

// ─── Query runner ────────────────────────────────────────────────────────────

#[tokio::test]
async fn column_types_come_from_first_non_null_value() {
  let s = store().await;
  let result = s
    .run_query("SELECT NULL AS a, 1 AS b UNION ALL SELECT 'x', 2.5;", QueryOptions::default())
    .await
    .unwrap();
  assert_eq!(result.columns[0].r#type, "TEXT");
  assert_eq!(result.columns[1].r#type, "INTEGER");
  assert_eq!(result.rows[0][0], serde_json::Value::Null);
}

#[tokio::test]
async fn results_are_truncated_at_max_rows() {
  let s = loaded().await;
  let options = QueryOptions { max_rows: 5, ..Default::default() };
  let result = s.run_query("SELECT * FROM train", options).await.unwrap();
  assert_eq!(result.row_count, 5);
  assert!(result.truncated);

  let options = QueryOptions { max_rows: 16, ..Default::default() };
  let result = s.run_query("SELECT * FROM train", options).await.unwrap();
  assert!(!result.truncated);
}

#[tokio::test]
async fn empty_query_is_rejected() {
  let s = store().await;
  let err = s.run_query("  ;  ", QueryOptions::default()).await.unwrap_err();
  assert!(matches!(err, Error::EmptyQuery));
  let err = s.run_query("-- nothing here", QueryOptions::default()).await.unwrap_err();
  assert!(matches!(err, Error::EmptyQuery));
}

#[tokio::test]
async fn trailing_statements_are_refused_not_dropped() {
  let s = loaded().await;
  let err = s
    .run_query("SELECT COUNT(*) FROM train; DROP TABLE train", QueryOptions::default())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::MultipleStatements));
  assert!(s.has_table("train").await.unwrap());

  let result = s
    .run_query("SELECT COUNT(*) AS n FROM train; -- done", QueryOptions::default())
    .await
    .unwrap();
  assert_eq!(f64_at(&result, 0, "n"), 16.0);
}

#[tokio::test]
async fn bad_sql_surfaces_database_error() {
  let s = loaded().await;
  let err = s
    .run_query("SELECT nope FROM train", QueryOptions::default())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Database(_)));
}

#[tokio::test]
async fn writes_run_unless_read_only() {
  let s = loaded().await;
  let result = s
    .run_query("DELETE FROM stores WHERE Store = 2", QueryOptions::default())
    .await
    .unwrap();
  assert_eq!(result.rows_affected, Some(1));
  assert!(result.columns.is_empty());

  let read_only = QueryOptions { read_only: true, ..Default::default() };
  let err = s.run_query("DROP TABLE train", read_only).await.unwrap_err();
  assert!(matches!(err, Error::WriteRejected));
  assert!(s.has_table("train").await.unwrap());
  assert!(s.run_query("SELECT 1", read_only).await.is_ok());
}

// ─── Introspection and typed reads ───────────────────────────────────────────

#[tokio::test]
async fn validation_requires_train() {
  let s = store().await;
  let err = s.validation_summary().await.unwrap_err();
  assert!(matches!(err, Error::TableNotFound(ref t) if t == "train"));
}

#[tokio::test]
async fn validation_summary_matches_fixture() {
  let s = loaded().await;
  let summary = s.validation_summary().await.unwrap();
  assert_eq!(summary.unique_stores, 2);
  assert_eq!(summary.unique_departments, 2);
  assert_eq!(summary.earliest_date.as_deref(), Some("2010-02-12"));
  assert_eq!(summary.total_sales, Some(26424.0));
}

#[tokio::test]
async fn table_info_reports_declared_types() {
  let s = loaded().await;
  let info = s.table_info().await.unwrap();
  let train = info.iter().find(|t| t.name == "train").unwrap();
  assert_eq!(train.row_count, 16);
  let types: Vec<_> = train.columns.iter().map(|c| c.decl_type.as_str()).collect();
  assert_eq!(types, vec!["INTEGER", "INTEGER", "DATE", "REAL", "INTEGER"]);
}

#[tokio::test]
async fn typed_loaders_decode_rows() {
  let s = loaded().await;
  let sales = s.load_sales(None).await.unwrap();
  assert_eq!(sales.len(), 16);
  assert!(sales[0].is_holiday);
  assert_eq!(sales[0].date.to_string(), "2010-02-12");
  assert_eq!(s.load_sales(Some(3)).await.unwrap().len(), 3);

  let stores = s.load_stores().await.unwrap();
  assert_eq!(stores[1].store_type, "B");
  assert_eq!(stores[1].size, 202307);

  let features = s.load_features(Some(10)).await.unwrap();
  assert_eq!(features.len(), 2);
  assert_eq!(features[0].unemployment, Some(8.106));
}

#[tokio::test]
async fn null_sales_rows_are_skipped() {
  let s = store().await;
  let csv = "Store,Dept,Date,Weekly_Sales,IsHoliday\n1,1,2010-02-12,NA,FALSE\n1,2,2010-02-12,5.0,FALSE\n";
  s.replace_tables(vec![table("train", csv)]).await.unwrap();
  let sales = s.load_sales(None).await.unwrap();
  assert_eq!(sales.len(), 1);
  assert_eq!(sales[0].dept, 2);
}

#[tokio::test]
async fn rows_missing_key_columns_are_skipped() {
  let s = store().await;
  let train = "\
Store,Dept,Date,Weekly_Sales,IsHoliday
1,1,2010-02-12,10.0,FALSE
1,2,,200.0,FALSE
NA,1,2010-02-12,250.0,TRUE
1,,2010-02-19,30.0,FALSE
";
  let stores = "Store,Type,Size\n1,A,151315\n2,,202307\n3,C,NA\n";
  let features = "\
Store,Date,Temperature,Fuel_Price,CPI,Unemployment
1,2010-02-12,38.51,2.548,211.24,8.106
1,NA,40.19,2.548,210.89,8.324
";
  s.replace_tables(vec![
    table("train", train),
    table("stores", stores),
    table("features", features),
  ])
  .await
  .unwrap();

  let sales = s.load_sales(None).await.unwrap();
  assert_eq!(sales.len(), 1);
  assert_eq!(sales[0].weekly_sales, 10.0);
  let stores = s.load_stores().await.unwrap();
  assert_eq!(stores.len(), 1);
  assert_eq!(stores[0].store_type, "A");
  assert_eq!(s.load_features(None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn file_store_persists_across_opens() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("sales.db");
  {
    let s = SqliteStore::open(&path).await.unwrap();
    s.replace_tables(vec![table("stores", STORES_CSV)]).await.unwrap();
  }
  let s = SqliteStore::open(&path).await.unwrap();
  assert_eq!(s.table_names().await.unwrap(), vec!["stores".to_string()]);
}
