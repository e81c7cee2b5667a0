//! Typed records for the three entity sets in the sales dataset.
//!
//! Records are immutable once loaded. A re-ingestion replaces every record of
//! a table wholesale; nothing is ever updated in place.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ─── Sales ───────────────────────────────────────────────────────────────────

/// One (store, department, week) observation of revenue.
///
/// Natural key: `(store, dept, date)`. The store id is expected to exist in
/// the `stores` table but this is not enforced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
  #[serde(rename = "Store")]
  pub store:        i64,
  #[serde(rename = "Dept")]
  pub dept:         i64,
  #[serde(rename = "Date")]
  pub date:         NaiveDate,
  #[serde(rename = "Weekly_Sales")]
  pub weekly_sales: f64,
  #[serde(rename = "IsHoliday")]
  pub is_holiday:   bool,
}

// ─── Stores ──────────────────────────────────────────────────────────────────

/// A physical store. Natural key: `store`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Store {
  #[serde(rename = "Store")]
  pub store:      i64,
  /// Category letter (`A`, `B` or `C` in the reference dataset).
  #[serde(rename = "Type")]
  pub store_type: String,
  #[serde(rename = "Size")]
  pub size:       i64,
}

// ─── Features ────────────────────────────────────────────────────────────────

/// Regional context for a store in a given week. Natural key: `(store, date)`.
///
/// Every measurement is optional; the reference dataset marks gaps as `NA`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
  #[serde(rename = "Store")]
  pub store:        i64,
  #[serde(rename = "Date")]
  pub date:         NaiveDate,
  #[serde(rename = "Temperature")]
  pub temperature:  Option<f64>,
  #[serde(rename = "Fuel_Price")]
  pub fuel_price:   Option<f64>,
  #[serde(rename = "CPI")]
  pub cpi:          Option<f64>,
  #[serde(rename = "Unemployment")]
  pub unemployment: Option<f64>,
}

// ─── Bundle ──────────────────────────────────────────────────────────────────

/// Everything the derived analytics need, loaded together.
#[derive(Debug, Clone, Default)]
pub struct SalesData {
  pub sales:    Vec<SalesRecord>,
  pub stores:   Vec<Store>,
  pub features: Vec<FeatureRecord>,
}
