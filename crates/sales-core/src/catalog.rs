//! The fixed catalog of read-only aggregate queries.
//!
//! Every query targets the `train` table except [`QueryKind::Schema`], which
//! lists the tables in the database.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A named query from the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
  Overview,
  TopStores,
  DepartmentPerformance,
  MonthlyTrend,
  HolidayImpact,
  Schema,
}

/// Serialisable view of one catalog entry.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogEntry {
  pub name:  QueryKind,
  pub title: &'static str,
  pub sql:   &'static str,
}

impl QueryKind {
  /// The five aggregate queries, in presentation order. The schema query is
  /// reachable by name but not listed here.
  pub const AGGREGATES: [QueryKind; 5] = [
    QueryKind::Overview,
    QueryKind::TopStores,
    QueryKind::DepartmentPerformance,
    QueryKind::MonthlyTrend,
    QueryKind::HolidayImpact,
  ];

  pub fn name(self) -> &'static str {
    match self {
      QueryKind::Overview => "overview",
      QueryKind::TopStores => "top_stores",
      QueryKind::DepartmentPerformance => "department_performance",
      QueryKind::MonthlyTrend => "monthly_trend",
      QueryKind::HolidayImpact => "holiday_impact",
      QueryKind::Schema => "schema",
    }
  }

  pub fn title(self) -> &'static str {
    match self {
      QueryKind::Overview => "Basic Overview",
      QueryKind::TopStores => "Top 10 Stores",
      QueryKind::DepartmentPerformance => "Department Performance",
      QueryKind::MonthlyTrend => "Monthly Sales Trend",
      QueryKind::HolidayImpact => "Holiday Impact",
      QueryKind::Schema => "Database Schema",
    }
  }

  pub fn sql(self) -> &'static str {
    match self {
      QueryKind::Overview => OVERVIEW_SQL,
      QueryKind::TopStores => TOP_STORES_SQL,
      QueryKind::DepartmentPerformance => DEPARTMENT_PERFORMANCE_SQL,
      QueryKind::MonthlyTrend => MONTHLY_TREND_SQL,
      QueryKind::HolidayImpact => HOLIDAY_IMPACT_SQL,
      QueryKind::Schema => SCHEMA_SQL,
    }
  }

  pub fn entry(self) -> CatalogEntry {
    CatalogEntry { name: self, title: self.title(), sql: self.sql() }
  }
}

impl FromStr for QueryKind {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    QueryKind::AGGREGATES
      .into_iter()
      .chain([QueryKind::Schema])
      .find(|k| k.name() == s)
      .ok_or_else(|| Error::UnknownQuery(s.to_owned()))
  }
}

/// The listed catalog, one entry per aggregate query.
pub fn catalog() -> Vec<CatalogEntry> {
  QueryKind::AGGREGATES.into_iter().map(QueryKind::entry).collect()
}

// ─── SQL text ────────────────────────────────────────────────────────────────

const OVERVIEW_SQL: &str = "SELECT
    COUNT(*) AS total_records,
    COUNT(DISTINCT Store) AS unique_stores,
    COUNT(DISTINCT Dept) AS unique_departments,
    MIN(Date) AS earliest_date,
    MAX(Date) AS latest_date,
    ROUND(SUM(Weekly_Sales), 2) AS total_sales,
    ROUND(AVG(Weekly_Sales), 2) AS avg_weekly_sales
FROM train";

const TOP_STORES_SQL: &str = "SELECT
    Store,
    COUNT(*) AS records,
    ROUND(SUM(Weekly_Sales), 2) AS total_sales,
    ROUND(AVG(Weekly_Sales), 2) AS avg_sales
FROM train
GROUP BY Store
ORDER BY total_sales DESC
LIMIT 10";

const DEPARTMENT_PERFORMANCE_SQL: &str = "SELECT
    Dept,
    COUNT(*) AS records,
    COUNT(DISTINCT Store) AS stores,
    ROUND(SUM(Weekly_Sales), 2) AS total_sales,
    ROUND(AVG(Weekly_Sales), 2) AS avg_sales
FROM train
GROUP BY Dept
ORDER BY total_sales DESC
LIMIT 15";

const MONTHLY_TREND_SQL: &str = "SELECT
    strftime('%Y-%m', Date) AS month_year,
    ROUND(SUM(Weekly_Sales), 2) AS monthly_sales,
    ROUND(AVG(Weekly_Sales), 2) AS avg_weekly_sales,
    COUNT(DISTINCT Store) AS active_stores
FROM train
GROUP BY strftime('%Y-%m', Date)
ORDER BY month_year";

const HOLIDAY_IMPACT_SQL: &str = "SELECT
    IsHoliday,
    COUNT(*) AS record_count,
    ROUND(AVG(Weekly_Sales), 2) AS avg_sales,
    ROUND(SUM(Weekly_Sales), 2) AS total_sales
FROM train
GROUP BY IsHoliday";

const SCHEMA_SQL: &str = "SELECT name, sql FROM sqlite_master WHERE type = 'table'";

/// Load-time sanity checks printed by the batch loader.
pub mod validation {
  pub const TOTAL_RECORDS: &str = "SELECT COUNT(*) FROM train";
  pub const UNIQUE_STORES: &str = "SELECT COUNT(DISTINCT Store) FROM train";
  pub const UNIQUE_DEPARTMENTS: &str = "SELECT COUNT(DISTINCT Dept) FROM train";
  pub const DATE_RANGE: &str = "SELECT MIN(Date), MAX(Date) FROM train";
  pub const TOTAL_SALES: &str = "SELECT ROUND(SUM(Weekly_Sales), 2) FROM train";
}
