//! Joining the three melted series and deriving daily deltas.

use std::collections::HashMap;

use chrono::NaiveDate;
use covid_core::record::UnifiedRecord;

use crate::melt::{MeltedRow, Region};

fn index(rows: &[MeltedRow]) -> HashMap<(&Region, NaiveDate), u64> {
  rows.iter().map(|r| ((&r.region, r.date), r.value)).collect()
}

/// Left-join deaths and recovered onto confirmed by identity and date.
///
/// Cells missing from either right-hand side read as zero ("not yet
/// reported"). The result is sorted by country, province and date, with
/// daily deltas filled in.
pub fn unify(
  confirmed: &[MeltedRow],
  deaths: &[MeltedRow],
  recovered: &[MeltedRow],
) -> Vec<UnifiedRecord> {
  let deaths = index(deaths);
  let recovered = index(recovered);

  let mut records: Vec<UnifiedRecord> = confirmed
    .iter()
    .map(|row| {
      let key = (&row.region, row.date);
      UnifiedRecord {
        country_region:  row.region.country_region.clone(),
        province_state:  row.region.province_state.clone(),
        lat:             row.region.lat,
        long:            row.region.long,
        date:            row.date,
        confirmed:       row.value,
        deaths:          deaths.get(&key).copied().unwrap_or(0),
        recovered:       recovered.get(&key).copied().unwrap_or(0),
        confirmed_daily: 0,
        deaths_daily:    0,
        recovered_daily: 0,
      }
    })
    .collect();
  tracing::info!(records = records.len(), "joined confirmed, deaths and recovered");

  records.sort_by(|a, b| {
    a.country_region
      .cmp(&b.country_region)
      .then_with(|| a.province_state.cmp(&b.province_state))
      .then(a.date.cmp(&b.date))
  });

  let clamped = fill_daily_deltas(&mut records);
  tracing::info!(clamped, "computed daily deltas");
  records
}

fn delta(previous: u64, current: u64, clamped: &mut usize) -> u64 {
  if current < previous {
    *clamped += 1;
  }
  current.saturating_sub(previous)
}

/// Fill the `*_daily` columns of `records`, which must already be sorted by
/// `(country_region, province_state, date)`.
///
/// The first day of each series is 0. A cumulative value that goes down
/// yields 0 rather than a negative delta. Returns how many deltas were
/// clamped that way.
pub fn fill_daily_deltas(records: &mut [UnifiedRecord]) -> usize {
  let mut clamped = 0;
  for i in 0..records.len() {
    let (before, rest) = records.split_at_mut(i);
    let current = &mut rest[0];

    match before.last() {
      Some(prev)
        if prev.country_region == current.country_region
          && prev.province_state == current.province_state =>
      {
        current.confirmed_daily = delta(prev.confirmed, current.confirmed, &mut clamped);
        current.deaths_daily = delta(prev.deaths, current.deaths, &mut clamped);
        current.recovered_daily = delta(prev.recovered, current.recovered, &mut clamped);
      }
      _ => {
        current.confirmed_daily = 0;
        current.deaths_daily = 0;
        current.recovered_daily = 0;
      }
    }
  }
  clamped
}
