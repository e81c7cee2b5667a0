//! Encoding and decoding helpers between domain types and SQLite values.
//!
//! Dates are stored as `YYYY-MM-DD` text so `strftime` works on them
//! directly. Booleans are stored as 0/1 integers. Query results are decoded
//! into JSON values; blobs become lowercase hex strings.

use chrono::NaiveDate;
use rusqlite::types::{Type, Value, ValueRef};
use sales_core::{
  model::{FeatureRecord, SalesRecord, Store},
  table::Cell,
};

use crate::{Error, Result};

// ─── Cells ───────────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn encode_cell(cell: Cell) -> Value {
  match cell {
    Cell::Null => Value::Null,
    Cell::Integer(i) => Value::Integer(i),
    Cell::Real(f) => Value::Real(f),
    Cell::Text(s) => Value::Text(s),
    Cell::Bool(b) => Value::Integer(i64::from(b)),
    Cell::Date(d) => Value::Text(encode_date(d)),
  }
}

// ─── Query results ───────────────────────────────────────────────────────────

pub fn storage_class(t: Type) -> &'static str {
  match t {
    Type::Null => "NULL",
    Type::Integer => "INTEGER",
    Type::Real => "REAL",
    Type::Text => "TEXT",
    Type::Blob => "BLOB",
  }
}

pub fn value_to_json(v: ValueRef<'_>) -> serde_json::Value {
  match v {
    ValueRef::Null => serde_json::Value::Null,
    ValueRef::Integer(i) => serde_json::Value::from(i),
    ValueRef::Real(f) => serde_json::Number::from_f64(f)
      .map(serde_json::Value::Number)
      .unwrap_or(serde_json::Value::Null),
    ValueRef::Text(t) => serde_json::Value::String(String::from_utf8_lossy(t).into_owned()),
    ValueRef::Blob(b) => serde_json::Value::String(hex::encode(b)),
  }
}

// ─── Scalars ─────────────────────────────────────────────────────────────────

/// Accepts `YYYY-MM-DD` optionally followed by a time, as written by other
/// dataframe tools.
pub fn decode_date(s: &str) -> Result<NaiveDate> {
  let day = s.get(..10).unwrap_or(s);
  NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|_| Error::Decode {
    column: "Date",
    value:  s.to_owned(),
  })
}

pub fn decode_bool(v: &Value) -> Result<bool> {
  match v {
    Value::Null => Ok(false),
    Value::Integer(i) => Ok(*i != 0),
    Value::Real(f) => Ok(*f != 0.0),
    Value::Text(s) => match s.as_str() {
      "1" | "True" | "true" | "TRUE" => Ok(true),
      "0" | "False" | "false" | "FALSE" => Ok(false),
      _ => Err(Error::Decode { column: "IsHoliday", value: s.clone() }),
    },
    Value::Blob(_) => Err(Error::Decode { column: "IsHoliday", value: "<blob>".into() }),
  }
}

// ─── Raw row structs ─────────────────────────────────────────────────────────

/// A `train` row as read from SQLite, before date/bool decoding.
pub struct RawSales {
  pub store:        Option<i64>,
  pub dept:         Option<i64>,
  pub date:         Option<String>,
  pub weekly_sales: Option<f64>,
  pub is_holiday:   Value,
}

impl RawSales {
  /// `None` when the store, department, date or sales amount is missing.
  pub fn into_record(self) -> Result<Option<SalesRecord>> {
    let (Some(store), Some(dept), Some(date), Some(weekly_sales)) =
      (self.store, self.dept, self.date, self.weekly_sales)
    else {
      return Ok(None);
    };
    Ok(Some(SalesRecord {
      store,
      dept,
      date: decode_date(&date)?,
      weekly_sales,
      is_holiday: decode_bool(&self.is_holiday)?,
    }))
  }
}

pub struct RawStore {
  pub store:      Option<i64>,
  pub store_type: Option<String>,
  pub size:       Option<i64>,
}

impl RawStore {
  /// `None` when any column is missing.
  pub fn into_store(self) -> Option<Store> {
    Some(Store { store: self.store?, store_type: self.store_type?, size: self.size? })
  }
}

pub struct RawFeature {
  pub store:        Option<i64>,
  pub date:         Option<String>,
  pub temperature:  Option<f64>,
  pub fuel_price:   Option<f64>,
  pub cpi:          Option<f64>,
  pub unemployment: Option<f64>,
}

impl RawFeature {
  /// `None` when the store or date is missing.
  pub fn into_record(self) -> Result<Option<FeatureRecord>> {
    let (Some(store), Some(date)) = (self.store, self.date) else {
      return Ok(None);
    };
    Ok(Some(FeatureRecord {
      store,
      date: decode_date(&date)?,
      temperature: self.temperature,
      fuel_price: self.fuel_price,
      cpi: self.cpi,
      unemployment: self.unemployment,
    }))
  }
}
