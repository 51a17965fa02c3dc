//! Rate, ranking and smoothing computations over country aggregates.
//!
//! Everything here is a pure function of its inputs. [`CovidService`]
//! (crate::service::CovidService) feeds these with rows fetched from a store.

use std::{collections::BTreeMap, fmt, str::FromStr};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{Error, record::CountryAggregate};

/// Minimum confirmed count before a country enters an ascending rate ranking.
pub const SIGNIFICANCE_THRESHOLD: u64 = 1000;

/// Width of the moving-average window, in days. Must be odd.
pub const MOVING_AVERAGE_WINDOW: usize = 7;

// ─── Per-country snapshot ────────────────────────────────────────────────────

/// The aggregate row at a country's latest date, plus derived rates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatestCountryStat {
  pub country_region:  String,
  pub date:            NaiveDate,
  pub confirmed:       u64,
  pub deaths:          u64,
  pub recovered:       u64,
  pub confirmed_daily: u64,
  pub deaths_daily:    u64,
  pub recovered_daily: u64,
  /// Percentage, two decimals; 0 when `confirmed` is 0.
  pub mortality_rate:  f64,
  /// Percentage, two decimals; 0 when `confirmed` is 0.
  pub recovery_rate:   f64,
}

impl From<CountryAggregate> for LatestCountryStat {
  fn from(a: CountryAggregate) -> Self {
    Self {
      mortality_rate:  rate(a.deaths, a.confirmed),
      recovery_rate:   rate(a.recovered, a.confirmed),
      country_region:  a.country_region,
      date:            a.date,
      confirmed:       a.confirmed,
      deaths:          a.deaths,
      recovered:       a.recovered,
      confirmed_daily: a.confirmed_daily,
      deaths_daily:    a.deaths_daily,
      recovered_daily: a.recovered_daily,
    }
  }
}

/// World totals over every country's latest snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalSummary {
  pub confirmed:      u64,
  pub deaths:         u64,
  pub recovered:      u64,
  pub mortality_rate: f64,
  pub recovery_rate:  f64,
  /// Latest date seen across all countries; `None` on an empty table.
  pub last_update:    Option<NaiveDate>,
}

// ─── Metrics ─────────────────────────────────────────────────────────────────

/// A column of [`LatestCountryStat`] that countries can be ranked by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
  Confirmed,
  Deaths,
  Recovered,
  MortalityRate,
  RecoveryRate,
}

impl Metric {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Confirmed => "confirmed",
      Self::Deaths => "deaths",
      Self::Recovered => "recovered",
      Self::MortalityRate => "mortality_rate",
      Self::RecoveryRate => "recovery_rate",
    }
  }

  pub fn is_rate(self) -> bool {
    matches!(self, Self::MortalityRate | Self::RecoveryRate)
  }

  pub fn value(self, stat: &LatestCountryStat) -> MetricValue {
    match self {
      Self::Confirmed => MetricValue::Count(stat.confirmed),
      Self::Deaths => MetricValue::Count(stat.deaths),
      Self::Recovered => MetricValue::Count(stat.recovered),
      Self::MortalityRate => MetricValue::Rate(stat.mortality_rate),
      Self::RecoveryRate => MetricValue::Rate(stat.recovery_rate),
    }
  }

  /// The unrounded reading, for filtering and ordering.
  pub fn exact(self, stat: &LatestCountryStat) -> f64 {
    match self {
      Self::Confirmed => stat.confirmed as f64,
      Self::Deaths => stat.deaths as f64,
      Self::Recovered => stat.recovered as f64,
      Self::MortalityRate => raw_rate(stat.deaths, stat.confirmed),
      Self::RecoveryRate => raw_rate(stat.recovered, stat.confirmed),
    }
  }
}

impl fmt::Display for Metric {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Metric {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "confirmed" => Ok(Self::Confirmed),
      "deaths" => Ok(Self::Deaths),
      "recovered" => Ok(Self::Recovered),
      "mortality_rate" => Ok(Self::MortalityRate),
      "recovery_rate" => Ok(Self::RecoveryRate),
      other => Err(Error::InvalidParameter(format!("unknown metric: {other:?}"))),
    }
  }
}

/// A metric reading: integral for counts, fractional for rates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
  Count(u64),
  Rate(f64),
}

/// One entry of a ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopCountry {
  pub country_region: String,
  pub metric:         Metric,
  pub metric_value:   MetricValue,
  pub confirmed:      u64,
  pub deaths:         u64,
  pub recovered:      u64,
}

// ─── Daily series ────────────────────────────────────────────────────────────

/// A single day of a country's daily-case curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPoint {
  pub date:           NaiveDate,
  /// New confirmed cases on `date`.
  pub daily_value:    u64,
  pub daily_deaths:   u64,
  /// Centered 7-day mean of `daily_value`; `None` near either end.
  pub moving_average: Option<f64>,
}

// ─── Computations ────────────────────────────────────────────────────────────

pub fn round2(value: f64) -> f64 { (value * 100.0).round() / 100.0 }

/// `part / whole * 100`, unrounded, or 0 when `whole` is 0.
pub fn raw_rate(part: u64, whole: u64) -> f64 {
  if whole == 0 {
    return 0.0;
  }
  part as f64 / whole as f64 * 100.0
}

/// [`raw_rate`] rounded to two decimals.
pub fn rate(part: u64, whole: u64) -> f64 { round2(raw_rate(part, whole)) }

/// Keep each country's row with the greatest date.
pub fn latest_by_country(
  aggregates: impl IntoIterator<Item = CountryAggregate>,
) -> BTreeMap<String, LatestCountryStat> {
  let mut latest: BTreeMap<String, CountryAggregate> = BTreeMap::new();
  for row in aggregates {
    match latest.get(&row.country_region) {
      Some(current) if current.date >= row.date => {}
      _ => {
        latest.insert(row.country_region.clone(), row);
      }
    }
  }
  latest
    .into_iter()
    .map(|(country, row)| (country, LatestCountryStat::from(row)))
    .collect()
}

pub fn global_summary<'a>(
  latest: impl IntoIterator<Item = &'a LatestCountryStat>,
) -> GlobalSummary {
  let mut confirmed = 0u64;
  let mut deaths = 0u64;
  let mut recovered = 0u64;
  let mut last_update: Option<NaiveDate> = None;

  for stat in latest {
    confirmed += stat.confirmed;
    deaths += stat.deaths;
    recovered += stat.recovered;
    last_update = last_update.max(Some(stat.date));
  }

  GlobalSummary {
    confirmed,
    deaths,
    recovered,
    mortality_rate: rate(deaths, confirmed),
    recovery_rate: rate(recovered, confirmed),
    last_update,
  }
}

/// Exact top (or bottom, if `ascending`) `n` countries by `metric`.
///
/// Countries whose metric is zero are excluded. Ascending rate rankings
/// also exclude countries below [`SIGNIFICANCE_THRESHOLD`] confirmed cases.
/// Filtering and ordering use the unrounded value ([`Metric::exact`]); only
/// the reported `metric_value` is rounded. Ties keep the iteration order of
/// `latest`.
pub fn rank<'a>(
  latest: impl IntoIterator<Item = &'a LatestCountryStat>,
  metric: Metric,
  n: usize,
  ascending: bool,
) -> Vec<TopCountry> {
  let mut candidates: Vec<(&LatestCountryStat, f64)> = latest
    .into_iter()
    .filter(|s| !(ascending && metric.is_rate()) || s.confirmed >= SIGNIFICANCE_THRESHOLD)
    .map(|s| (s, metric.exact(s)))
    .filter(|(_, v)| *v > 0.0)
    .collect();

  // `sort_by` is stable, so equal values stay in input order.
  candidates.sort_by(|(_, a), (_, b)| {
    let ord = a.total_cmp(b);
    if ascending { ord } else { ord.reverse() }
  });
  candidates.truncate(n);

  candidates
    .into_iter()
    .map(|(s, _)| TopCountry {
      country_region: s.country_region.clone(),
      metric,
      metric_value: metric.value(s),
      confirmed: s.confirmed,
      deaths: s.deaths,
      recovered: s.recovered,
    })
    .collect()
}

/// Centered moving average over `window` days.
///
/// Position `i` is the mean of `values[i - window/2 ..= i + window/2]`; it is
/// `None` wherever that range would leave the slice.
pub fn centered_moving_average(values: &[u64], window: usize) -> Vec<Option<f64>> {
  debug_assert!(window % 2 == 1, "centered window must be odd");
  let half = window / 2;
  (0..values.len())
    .map(|i| {
      if i < half || i + half >= values.len() {
        return None;
      }
      let sum: u64 = values[i - half..=i + half].iter().sum();
      Some(sum as f64 / window as f64)
    })
    .collect()
}

/// Build a daily-case curve from one country's aggregates, in date order.
pub fn daily_series(rows: &[CountryAggregate]) -> Vec<DailyPoint> {
  let daily: Vec<u64> = rows.iter().map(|r| r.confirmed_daily).collect();
  let smoothed = centered_moving_average(&daily, MOVING_AVERAGE_WINDOW);

  rows
    .iter()
    .zip(smoothed)
    .map(|(row, moving_average)| DailyPoint {
      date: row.date,
      daily_value: row.confirmed_daily,
      daily_deaths: row.deaths_daily,
      moving_average,
    })
    .collect()
}

/// The earliest day carrying the maximum `daily_value`.
pub fn peak(points: &[DailyPoint]) -> Option<&DailyPoint> {
  points.iter().fold(None, |best: Option<&DailyPoint>, p| match best {
    Some(b) if b.daily_value >= p.daily_value => Some(b),
    _ => Some(p),
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  fn day(d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(2020, 3, d).unwrap() }

  fn agg(country: &str, d: u32, confirmed: u64, deaths: u64, recovered: u64) -> CountryAggregate {
    CountryAggregate {
      country_region: country.into(),
      date: day(d),
      confirmed,
      deaths,
      recovered,
      confirmed_daily: 0,
      deaths_daily: 0,
      recovered_daily: 0,
    }
  }

  fn latest(rows: Vec<CountryAggregate>) -> BTreeMap<String, LatestCountryStat> {
    latest_by_country(rows)
  }

  #[test]
  fn rate_is_zero_without_confirmed_cases() {
    assert_eq!(rate(0, 0), 0.0);
    assert_eq!(rate(5, 0), 0.0);
  }

  #[test]
  fn rate_rounds_to_two_decimals() {
    assert_eq!(rate(1, 3), 33.33);
    assert_eq!(rate(2, 3), 66.67);
    assert_eq!(rate(50, 1000), 5.0);
  }

  #[test]
  fn latest_picks_max_date_regardless_of_order() {
    let map = latest(vec![
      agg("A", 3, 30, 3, 0),
      agg("A", 1, 10, 1, 0),
      agg("B", 2, 200, 0, 20),
      agg("A", 2, 20, 2, 0),
    ]);
    assert_eq!(map.len(), 2);
    assert_eq!(map["A"].date, day(3));
    assert_eq!(map["A"].confirmed, 30);
    assert_eq!(map["A"].mortality_rate, 10.0);
    assert_eq!(map["B"].recovery_rate, 10.0);
  }

  #[test]
  fn global_confirmed_is_sum_of_latest() {
    let map = latest(vec![
      agg("A", 1, 10, 1, 0),
      agg("A", 2, 40, 4, 8),
      agg("B", 2, 60, 6, 12),
      agg("C", 1, 0, 0, 0),
    ]);
    let global = global_summary(map.values());
    let expected: u64 = map.values().map(|s| s.confirmed).sum();
    assert_eq!(global.confirmed, expected);
    assert_eq!(global.confirmed, 100);
    assert_eq!(global.deaths, 10);
    assert_eq!(global.recovered, 20);
    assert_eq!(global.mortality_rate, 10.0);
    assert_eq!(global.recovery_rate, 20.0);
    assert_eq!(global.last_update, Some(day(2)));
  }

  #[test]
  fn global_summary_of_nothing_is_zero() {
    let global = global_summary(std::iter::empty());
    assert_eq!(global.confirmed, 0);
    assert_eq!(global.mortality_rate, 0.0);
    assert_eq!(global.last_update, None);
  }

  #[test]
  fn rank_confirmed_descending() {
    let rows = (1..=8u64)
      .map(|i| agg(&format!("C{i}"), 1, i * 100, i, 0))
      .collect();
    let top = rank(latest(rows).values(), Metric::Confirmed, 5, false);
    assert_eq!(top.len(), 5);
    assert!(top.windows(2).all(|w| w[0].confirmed >= w[1].confirmed));
    assert!(top.iter().all(|t| t.confirmed > 0));
    assert_eq!(top[0].country_region, "C8");
    assert_eq!(top[0].metric_value, MetricValue::Count(800));
  }

  #[test]
  fn rank_skips_zero_metric() {
    let mut rows: Vec<CountryAggregate> =
      (0..9).map(|i| agg(&format!("Z{i}"), 1, 0, 0, 0)).collect();
    rows.push(agg("Big", 1, 5000, 10, 0));
    let top = rank(latest(rows).values(), Metric::Confirmed, 10, false);
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].country_region, "Big");
  }

  #[test]
  fn ascending_rate_ranking_requires_significance() {
    let map = latest(vec![
      agg("Tiny", 1, 10, 1, 0),     // 10%, below threshold
      agg("Small", 1, 999, 1, 0),   // below threshold
      agg("Mid", 1, 1000, 20, 0),   // 2%
      agg("Large", 1, 50000, 500, 0), // 1%
    ]);
    let low = rank(map.values(), Metric::MortalityRate, 5, true);
    let names: Vec<&str> = low.iter().map(|t| t.country_region.as_str()).collect();
    assert_eq!(names, ["Large", "Mid"]);
    assert!(low.iter().all(|t| t.confirmed >= SIGNIFICANCE_THRESHOLD));

    // Descending rate rankings do not apply the threshold.
    let high = rank(map.values(), Metric::MortalityRate, 5, false);
    assert_eq!(high[0].country_region, "Tiny");
    assert_eq!(high[0].metric_value, MetricValue::Rate(10.0));
  }

  #[test]
  fn tiny_rate_that_rounds_to_zero_is_still_ranked() {
    let map = latest(vec![
      agg("Huge", 1, 1_000_000, 1, 0), // 0.0001%, rounds to 0.00
      agg("Mid", 1, 10_000, 100, 0),   // 1%
    ]);
    let low = rank(map.values(), Metric::MortalityRate, 5, true);
    let names: Vec<&str> = low.iter().map(|t| t.country_region.as_str()).collect();
    assert_eq!(names, ["Huge", "Mid"]);
    assert_eq!(low[0].metric_value, MetricValue::Rate(0.0));
  }

  #[test]
  fn rates_equal_after_rounding_rank_by_exact_value() {
    let map = latest(vec![
      agg("A", 1, 100_000, 1_004, 0), // 1.004%
      agg("B", 1, 100_000, 1_001, 0), // 1.001%
    ]);
    let low = rank(map.values(), Metric::MortalityRate, 1, true);
    assert_eq!(low[0].country_region, "B");
    assert_eq!(low[0].metric_value, MetricValue::Rate(1.0));

    let high = rank(map.values(), Metric::MortalityRate, 1, false);
    assert_eq!(high[0].country_region, "A");
  }

  #[test]
  fn raw_rate_is_unrounded() {
    assert_eq!(raw_rate(1, 4), 25.0);
    assert_eq!(raw_rate(5, 0), 0.0);
    assert!((raw_rate(1_004, 100_000) - 1.004).abs() < 1e-9);
  }

  #[test]
  fn rank_ties_keep_input_order() {
    let map = latest(vec![
      agg("Alpha", 1, 100, 0, 0),
      agg("Bravo", 1, 100, 0, 0),
      agg("Charlie", 1, 100, 0, 0),
    ]);
    let top = rank(map.values(), Metric::Confirmed, 2, false);
    let names: Vec<&str> = top.iter().map(|t| t.country_region.as_str()).collect();
    assert_eq!(names, ["Alpha", "Bravo"]);
  }

  #[test]
  fn metric_parses_snake_case() {
    assert_eq!("mortality_rate".parse::<Metric>().unwrap(), Metric::MortalityRate);
    assert!(matches!("mortality".parse::<Metric>(), Err(Error::InvalidParameter(_))));
  }

  #[test]
  fn metric_value_serializes_by_kind() {
    assert_eq!(serde_json::to_string(&MetricValue::Count(42)).unwrap(), "42");
    assert_eq!(serde_json::to_string(&MetricValue::Rate(1.5)).unwrap(), "1.5");
  }

  #[test]
  fn centered_average_is_undefined_at_edges() {
    let values: Vec<u64> = (1..=10).collect();
    let ma = centered_moving_average(&values, 7);
    assert_eq!(ma.len(), 10);
    assert!(ma[..3].iter().all(Option::is_none));
    assert!(ma[7..].iter().all(Option::is_none));
    assert_eq!(ma[3], Some(4.0));
    assert_eq!(ma[6], Some(7.0));
  }

  #[test]
  fn centered_average_of_short_series_is_all_none() {
    let ma = centered_moving_average(&[5, 5, 5, 5, 5, 5], 7);
    assert!(ma.iter().all(Option::is_none));
    assert!(centered_moving_average(&[], 7).is_empty());
  }

  #[test]
  fn peak_prefers_earliest_maximum() {
    let rows: Vec<CountryAggregate> = [3u64, 9, 4, 9, 1]
      .iter()
      .enumerate()
      .map(|(i, v)| CountryAggregate {
        confirmed_daily: *v,
        ..agg("A", i as u32 + 1, 0, 0, 0)
      })
      .collect();
    let series = daily_series(&rows);
    let p = peak(&series).unwrap();
    assert_eq!(p.daily_value, 9);
    assert_eq!(p.date, day(2));
    assert!(peak(&[]).is_none());
  }
}
