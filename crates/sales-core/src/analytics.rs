//! Derived aggregates computed over loaded records.
//!
//! These feed the dashboard's charts: trends by period, store and department
//! rankings, seasonality, rolling means and correlations. Monetary values are
//! rounded to two decimals where a table would display them.

use std::{
  collections::{BTreeMap, BTreeSet, HashMap},
  str::FromStr,
};

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  model::{FeatureRecord, SalesRecord, Store},
};

/// Smallest and largest moving-average window, in weeks.
pub const MIN_WINDOW: usize = 2;
pub const MAX_WINDOW: usize = 12;

/// Stores with fewer records are left out of the consistency ranking.
pub const MIN_CONSISTENCY_RECORDS: usize = 10;

// ─── Small statistics helpers ────────────────────────────────────────────────

fn round2(x: f64) -> f64 { (x * 100.0).round() / 100.0 }

fn mean(values: &[f64]) -> Option<f64> {
  if values.is_empty() {
    None
  } else {
    Some(values.iter().sum::<f64>() / values.len() as f64)
  }
}

/// Sample standard deviation (n - 1 denominator). `None` below two values.
fn std_dev(values: &[f64]) -> Option<f64> {
  if values.len() < 2 {
    return None;
  }
  let m = mean(values)?;
  let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>()
    / (values.len() - 1) as f64;
  Some(var.sqrt())
}

/// Coefficient of variation in percent.
fn cv_percent(std: Option<f64>, mean: f64) -> Option<f64> {
  std.filter(|_| mean != 0.0).map(|s| s / mean * 100.0)
}

/// Pearson correlation over the pairs where both sides are present.
fn pearson(xs: &[Option<f64>], ys: &[Option<f64>]) -> Option<f64> {
  let pairs: Vec<(f64, f64)> = xs
    .iter()
    .zip(ys)
    .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
    .collect();
  if pairs.len() < 2 {
    return None;
  }
  let n = pairs.len() as f64;
  let mx = pairs.iter().map(|p| p.0).sum::<f64>() / n;
  let my = pairs.iter().map(|p| p.1).sum::<f64>() / n;
  let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
  for (x, y) in &pairs {
    sxy += (x - mx) * (y - my);
    sxx += (x - mx).powi(2);
    syy += (y - my).powi(2);
  }
  let denom = (sxx * syy).sqrt();
  if denom == 0.0 { None } else { Some(sxy / denom) }
}

// ─── Overview ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overview {
  pub total_sales:        f64,
  pub avg_weekly_sales:   Option<f64>,
  /// Days between the earliest and latest record.
  pub period_days:        i64,
  pub total_records:      usize,
  pub unique_stores:      usize,
  pub unique_departments: usize,
}

pub fn overview(sales: &[SalesRecord]) -> Overview {
  let values: Vec<f64> = sales.iter().map(|r| r.weekly_sales).collect();
  let first = sales.iter().map(|r| r.date).min();
  let last = sales.iter().map(|r| r.date).max();
  let period_days = match (first, last) {
    (Some(a), Some(b)) => (b - a).num_days(),
    _ => 0,
  };
  Overview {
    total_sales: values.iter().sum(),
    avg_weekly_sales: mean(&values),
    period_days,
    total_records: sales.len(),
    unique_stores: sales.iter().map(|r| r.store).collect::<BTreeSet<_>>().len(),
    unique_departments: sales.iter().map(|r| r.dept).collect::<BTreeSet<_>>().len(),
  }
}

// ─── Trends ──────────────────────────────────────────────────────────────────

/// Aggregation period for the sales trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
  Weekly,
  #[default]
  Monthly,
  Quarterly,
  Yearly,
}

impl Period {
  /// Sortable label of the period containing `date`.
  pub fn label(self, date: NaiveDate) -> String {
    match self {
      Period::Weekly => date.format("%Y-%m-%d").to_string(),
      Period::Monthly => date.format("%Y-%m").to_string(),
      Period::Quarterly => format!("{}Q{}", date.year(), quarter(date)),
      Period::Yearly => date.year().to_string(),
    }
  }
}

impl FromStr for Period {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s.to_ascii_lowercase().as_str() {
      "weekly" => Ok(Period::Weekly),
      "monthly" => Ok(Period::Monthly),
      "quarterly" => Ok(Period::Quarterly),
      "yearly" => Ok(Period::Yearly),
      _ => Err(Error::UnknownPeriod(s.to_owned())),
    }
  }
}

fn quarter(date: NaiveDate) -> u32 { (date.month() - 1) / 3 + 1 }

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
  pub period: String,
  pub sales:  f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Growth {
  /// Change from the first to the last period, in percent.
  pub rate_pct: Option<f64>,
  pub peak:     f64,
  pub lowest:   f64,
}

/// Total sales per period, in chronological order.
pub fn sales_trend(sales: &[SalesRecord], period: Period) -> Vec<TrendPoint> {
  let mut totals: BTreeMap<String, f64> = BTreeMap::new();
  for r in sales {
    *totals.entry(period.label(r.date)).or_default() += r.weekly_sales;
  }
  totals
    .into_iter()
    .map(|(period, sales)| TrendPoint { period, sales })
    .collect()
}

/// Growth over a trend series. `None` unless there are at least two points.
pub fn growth(points: &[TrendPoint]) -> Option<Growth> {
  if points.len() < 2 {
    return None;
  }
  let first = points.first()?.sales;
  let last = points.last()?.sales;
  let rate_pct = (first != 0.0).then(|| (last - first) / first * 100.0);
  let peak = points.iter().map(|p| p.sales).fold(f64::MIN, f64::max);
  let lowest = points.iter().map(|p| p.sales).fold(f64::MAX, f64::min);
  Some(Growth { rate_pct, peak, lowest })
}

// ─── Store performance ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorePerformance {
  pub store:        i64,
  pub store_type:   String,
  pub size:         i64,
  pub total_sales:  f64,
  pub avg_sales:    f64,
  pub record_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreTypeTotals {
  pub store_type: String,
  pub sum:        f64,
  pub mean:       f64,
  pub count:      usize,
}

/// Per-store totals for stores present in both `sales` and `stores`,
/// ordered by total sales descending.
pub fn store_performance(
  sales: &[SalesRecord],
  stores: &[Store],
) -> Vec<StorePerformance> {
  let by_id: HashMap<i64, &Store> = stores.iter().map(|s| (s.store, s)).collect();
  let mut groups: BTreeMap<i64, Vec<f64>> = BTreeMap::new();
  for r in sales.iter().filter(|r| by_id.contains_key(&r.store)) {
    groups.entry(r.store).or_default().push(r.weekly_sales);
  }

  let mut out: Vec<StorePerformance> = groups
    .into_iter()
    .filter_map(|(id, values)| {
      let store = by_id.get(&id)?;
      Some(StorePerformance {
        store:        id,
        store_type:   store.store_type.clone(),
        size:         store.size,
        total_sales:  round2(values.iter().sum()),
        avg_sales:    round2(mean(&values)?),
        record_count: values.len(),
      })
    })
    .collect();
  out.sort_by(|a, b| b.total_sales.total_cmp(&a.total_sales));
  out
}

/// Sales by store type, for stores present in both inputs.
pub fn store_type_totals(
  sales: &[SalesRecord],
  stores: &[Store],
) -> Vec<StoreTypeTotals> {
  let types: HashMap<i64, &str> =
    stores.iter().map(|s| (s.store, s.store_type.as_str())).collect();
  let mut groups: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
  for r in sales {
    if let Some(t) = types.get(&r.store) {
      groups.entry(t).or_default().push(r.weekly_sales);
    }
  }
  groups
    .into_iter()
    .filter_map(|(t, values)| {
      Some(StoreTypeTotals {
        store_type: t.to_owned(),
        sum:        values.iter().sum(),
        mean:       mean(&values)?,
        count:      values.len(),
      })
    })
    .collect()
}

// ─── Department performance ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartmentPerformance {
  pub dept:         i64,
  pub total_sales:  f64,
  pub avg_sales:    f64,
  pub sales_std:    Option<f64>,
  pub record_count: usize,
  pub store_count:  usize,
  /// Coefficient of variation, percent.
  pub cv:           Option<f64>,
}

/// One row per department that has at least one record, ordered by total
/// sales descending.
pub fn department_performance(sales: &[SalesRecord]) -> Vec<DepartmentPerformance> {
  let mut groups: BTreeMap<i64, (Vec<f64>, BTreeSet<i64>)> = BTreeMap::new();
  for r in sales {
    let entry = groups.entry(r.dept).or_default();
    entry.0.push(r.weekly_sales);
    entry.1.insert(r.store);
  }

  let mut out: Vec<DepartmentPerformance> = groups
    .into_iter()
    .filter_map(|(dept, (values, stores))| {
      let avg = round2(mean(&values)?);
      let std = std_dev(&values).map(round2);
      Some(DepartmentPerformance {
        dept,
        total_sales: round2(values.iter().sum()),
        avg_sales: avg,
        sales_std: std,
        record_count: values.len(),
        store_count: stores.len(),
        cv: cv_percent(std, avg).map(round2),
      })
    })
    .collect();
  out.sort_by(|a, b| b.total_sales.total_cmp(&a.total_sales));
  out
}

// ─── Seasonality ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthPattern {
  pub month:     u32,
  pub name:      String,
  pub avg_sales: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekdayPattern {
  pub weekday:   String,
  pub avg_sales: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuarterPattern {
  pub quarter:   u32,
  /// Mean over dates in the quarter of the all-store total for that date.
  pub avg_sales: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStat {
  pub avg_sales: f64,
  pub count:     usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HolidayImpact {
  pub holiday:     Option<GroupStat>,
  pub non_holiday: Option<GroupStat>,
  /// Holiday average relative to non-holiday average, percent.
  pub impact_pct:  Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Seasonality {
  pub monthly:  Vec<MonthPattern>,
  pub weekdays: Vec<WeekdayPattern>,
  pub quarters: Vec<QuarterPattern>,
  pub holiday:  HolidayImpact,
}

const WEEKDAYS: [Weekday; 7] = [
  Weekday::Mon,
  Weekday::Tue,
  Weekday::Wed,
  Weekday::Thu,
  Weekday::Fri,
  Weekday::Sat,
  Weekday::Sun,
];

fn weekday_name(day: Weekday) -> &'static str {
  match day {
    Weekday::Mon => "Monday",
    Weekday::Tue => "Tuesday",
    Weekday::Wed => "Wednesday",
    Weekday::Thu => "Thursday",
    Weekday::Fri => "Friday",
    Weekday::Sat => "Saturday",
    Weekday::Sun => "Sunday",
  }
}

fn month_name(month: u32) -> &'static str {
  const NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
  ];
  NAMES.get(month.wrapping_sub(1) as usize).copied().unwrap_or("?")
}

pub fn holiday_impact(sales: &[SalesRecord]) -> HolidayImpact {
  let stat = |holiday: bool| {
    let values: Vec<f64> = sales
      .iter()
      .filter(|r| r.is_holiday == holiday)
      .map(|r| r.weekly_sales)
      .collect();
    mean(&values).map(|avg_sales| GroupStat { avg_sales, count: values.len() })
  };
  let holiday = stat(true);
  let non_holiday = stat(false);
  let impact_pct = match (&holiday, &non_holiday) {
    (Some(h), Some(n)) if n.avg_sales != 0.0 => {
      Some((h.avg_sales - n.avg_sales) / n.avg_sales * 100.0)
    }
    _ => None,
  };
  HolidayImpact { holiday, non_holiday, impact_pct }
}

pub fn seasonality(sales: &[SalesRecord]) -> Seasonality {
  let mut by_month: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
  let mut by_weekday: HashMap<Weekday, Vec<f64>> = HashMap::new();
  let mut by_date: BTreeMap<NaiveDate, f64> = BTreeMap::new();
  for r in sales {
    by_month.entry(r.date.month()).or_default().push(r.weekly_sales);
    by_weekday.entry(r.date.weekday()).or_default().push(r.weekly_sales);
    *by_date.entry(r.date).or_default() += r.weekly_sales;
  }

  let monthly = by_month
    .into_iter()
    .filter_map(|(month, values)| {
      Some(MonthPattern {
        month,
        name: month_name(month).to_owned(),
        avg_sales: mean(&values)?,
      })
    })
    .collect();

  let weekdays = WEEKDAYS
    .into_iter()
    .filter_map(|day| {
      let values = by_weekday.get(&day)?;
      Some(WeekdayPattern {
        weekday:   weekday_name(day).to_owned(),
        avg_sales: mean(values)?,
      })
    })
    .collect();

  let mut by_quarter: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
  for (date, total) in by_date {
    by_quarter.entry(quarter(date)).or_default().push(total);
  }
  let quarters = by_quarter
    .into_iter()
    .filter_map(|(quarter, totals)| {
      Some(QuarterPattern { quarter, avg_sales: mean(&totals)? })
    })
    .collect();

  Seasonality { monthly, weekdays, quarters, holiday: holiday_impact(sales) }
}

// ─── Moving average ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovingAveragePoint {
  pub date:    NaiveDate,
  pub sales:   f64,
  /// `None` until `window` weeks of history exist.
  pub average: Option<f64>,
}

/// Weekly all-store totals with a trailing `window`-week mean.
pub fn moving_average(
  sales: &[SalesRecord],
  window: usize,
) -> Result<Vec<MovingAveragePoint>> {
  if !(MIN_WINDOW..=MAX_WINDOW).contains(&window) {
    return Err(Error::InvalidWindow { got: window, min: MIN_WINDOW, max: MAX_WINDOW });
  }

  let mut weekly: BTreeMap<NaiveDate, f64> = BTreeMap::new();
  for r in sales {
    *weekly.entry(r.date).or_default() += r.weekly_sales;
  }
  let totals: Vec<(NaiveDate, f64)> = weekly.into_iter().collect();

  Ok(
    totals
      .iter()
      .enumerate()
      .map(|(i, &(date, sales))| {
        let average = (i + 1 >= window).then(|| {
          totals[i + 1 - window..=i].iter().map(|t| t.1).sum::<f64>() / window as f64
        });
        MovingAveragePoint { date, sales, average }
      })
      .collect(),
  )
}

// ─── Correlation ─────────────────────────────────────────────────────────────

/// Columns compared in the correlation matrix; sales first.
pub const CORRELATION_COLUMNS: [&str; 5] =
  ["Weekly_Sales", "Temperature", "Fuel_Price", "CPI", "Unemployment"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorCorrelation {
  pub factor:      String,
  pub correlation: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correlation {
  pub columns:    Vec<String>,
  /// Row-major Pearson coefficients; `None` where undefined.
  pub matrix:     Vec<Vec<Option<f64>>>,
  /// Correlation of each external factor with sales, strongest first.
  pub with_sales: Vec<FactorCorrelation>,
  /// Rows that survived the (store, date) join.
  pub joined:     usize,
}

/// Join sales to features on `(store, date)` and correlate. `None` when the
/// join is empty.
pub fn correlation(
  sales: &[SalesRecord],
  features: &[FeatureRecord],
) -> Option<Correlation> {
  let mut by_key: HashMap<(i64, NaiveDate), &FeatureRecord> = HashMap::new();
  for f in features {
    by_key.entry((f.store, f.date)).or_insert(f);
  }

  let mut series: [Vec<Option<f64>>; 5] = Default::default();
  for r in sales {
    let Some(f) = by_key.get(&(r.store, r.date)) else { continue };
    series[0].push(Some(r.weekly_sales));
    series[1].push(f.temperature);
    series[2].push(f.fuel_price);
    series[3].push(f.cpi);
    series[4].push(f.unemployment);
  }
  let joined = series[0].len();
  if joined == 0 {
    return None;
  }

  let matrix: Vec<Vec<Option<f64>>> = series
    .iter()
    .map(|a| series.iter().map(|b| pearson(a, b)).collect())
    .collect();

  let mut with_sales: Vec<FactorCorrelation> = CORRELATION_COLUMNS
    .iter()
    .enumerate()
    .skip(1)
    .map(|(i, name)| FactorCorrelation {
      factor:      (*name).to_owned(),
      correlation: matrix[0][i],
    })
    .collect();
  with_sales.sort_by(|a, b| match (a.correlation, b.correlation) {
    (Some(x), Some(y)) => y.abs().total_cmp(&x.abs()),
    (Some(_), None) => std::cmp::Ordering::Less,
    (None, Some(_)) => std::cmp::Ordering::Greater,
    (None, None) => std::cmp::Ordering::Equal,
  });

  Some(Correlation {
    columns: CORRELATION_COLUMNS.iter().map(|c| (*c).to_owned()).collect(),
    matrix,
    with_sales,
    joined,
  })
}

// ─── Store consistency ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConsistency {
  pub store: i64,
  pub mean:  f64,
  pub std:   Option<f64>,
  pub count: usize,
  pub cv:    Option<f64>,
}

/// Stores with at least [`MIN_CONSISTENCY_RECORDS`] records, least variable
/// first.
pub fn store_consistency(sales: &[SalesRecord]) -> Vec<StoreConsistency> {
  let mut groups: BTreeMap<i64, Vec<f64>> = BTreeMap::new();
  for r in sales {
    groups.entry(r.store).or_default().push(r.weekly_sales);
  }
  let mut out: Vec<StoreConsistency> = groups
    .into_iter()
    .filter(|(_, values)| values.len() >= MIN_CONSISTENCY_RECORDS)
    .filter_map(|(store, values)| {
      let mean = mean(&values)?;
      let std = std_dev(&values);
      Some(StoreConsistency {
        store,
        mean,
        std,
        count: values.len(),
        cv: cv_percent(std, mean),
      })
    })
    .collect();
  out.sort_by(|a, b| match (a.cv, b.cv) {
    (Some(x), Some(y)) => x.total_cmp(&y),
    (Some(_), None) => std::cmp::Ordering::Less,
    (None, Some(_)) => std::cmp::Ordering::Greater,
    (None, None) => a.store.cmp(&b.store),
  });
  out
}
