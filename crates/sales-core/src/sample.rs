//! Synthetic sample data used when no database has been loaded yet.
//!
//! Generation is seeded, so the same seed always yields the same dataset.

use chrono::{Datelike, Days, NaiveDate};
use rand::{Rng, SeedableRng, rngs::StdRng};
use rand_distr::StandardNormal;

use crate::model::{FeatureRecord, SalesData, SalesRecord, Store};

pub const DEFAULT_SEED: u64 = 42;

const STORE_COUNT: i64 = 45;
const SAMPLED_STORES: i64 = 10;
const SAMPLED_DEPARTMENTS: i64 = 20;
const WEEKS: u64 = 52;

/// First Sunday of the reference dataset's range (2010-02-01 onward).
fn first_week() -> NaiveDate {
  NaiveDate::from_ymd_opt(2010, 2, 7).unwrap_or_default()
}

/// One draw from N(mean, std).
fn normal(rng: &mut StdRng, mean: f64, std: f64) -> f64 {
  let z: f64 = rng.sample(StandardNormal);
  mean + std * z
}

fn store_type(rng: &mut StdRng) -> &'static str {
  let u: f64 = rng.r#gen();
  if u < 0.3 {
    "A"
  } else if u < 0.7 {
    "B"
  } else {
    "C"
  }
}

/// Build the sample dataset: 45 stores, and a year of weekly sales for the
/// first 10 stores × 20 departments with a 1.2× lift in November/December.
pub fn generate(seed: u64) -> SalesData {
  let mut rng = StdRng::seed_from_u64(seed);

  let stores = (1..=STORE_COUNT)
    .map(|store| Store {
      store,
      store_type: store_type(&mut rng).to_owned(),
      size:       rng.gen_range(50_000..200_000),
    })
    .collect();

  let dates: Vec<NaiveDate> = (0..WEEKS)
    .filter_map(|w| first_week().checked_add_days(Days::new(7 * w)))
    .collect();

  let mut sales = Vec::new();
  for store in 1..=SAMPLED_STORES {
    for dept in 1..=SAMPLED_DEPARTMENTS {
      for &date in &dates {
        let base = normal(&mut rng, 15_000.0, 5_000.0);
        let seasonal = if matches!(date.month(), 11 | 12) { 1.2 } else { 1.0 };
        let weekly_sales = (base * seasonal + normal(&mut rng, 0.0, 2_000.0)).max(0.0);
        sales.push(SalesRecord {
          store,
          dept,
          date,
          weekly_sales,
          is_holiday: rng.gen_bool(0.1),
        });
      }
    }
  }

  let mut features = Vec::new();
  for store in 1..=SAMPLED_STORES {
    for &date in &dates {
      features.push(FeatureRecord {
        store,
        date,
        temperature:  Some(normal(&mut rng, 70.0, 20.0)),
        fuel_price:   Some(normal(&mut rng, 3.5, 0.5)),
        cpi:          Some(normal(&mut rng, 200.0, 20.0)),
        unemployment: Some(normal(&mut rng, 8.0, 2.0)),
      });
    }
  }

  SalesData { sales, stores, features }
}
