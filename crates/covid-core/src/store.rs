//! The `CovidStore` trait.
//!
//! Implemented by storage backends (e.g. `covid-store-sqlite`). The service
//! layer and the HTTP API depend on this abstraction, never on a concrete
//! backend or a process-wide connection handle.

use std::future::Future;

use crate::record::{
  CalendarEntry, CountryAggregate, DatasetOverview, LoadSummary, UnifiedRecord,
};

/// Access to the persisted unified and calendar tables.
///
/// Reads never mutate. The only write is [`CovidStore::replace_dataset`],
/// which swaps both tables wholesale.
pub trait CovidStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Load ──────────────────────────────────────────────────────────────

  /// Drop and recreate both tables, then insert `records` and `calendar`.
  ///
  /// Not incremental: prior contents are discarded.
  fn replace_dataset(
    &self,
    records: Vec<UnifiedRecord>,
    calendar: Vec<CalendarEntry>,
  ) -> impl Future<Output = Result<LoadSummary, Self::Error>> + Send + '_;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Unified rows summed per `(country_region, date)`, ordered by country
  /// then date.
  fn country_aggregates(
    &self,
  ) -> impl Future<Output = Result<Vec<CountryAggregate>, Self::Error>> + Send + '_;

  /// As [`CovidStore::country_aggregates`], restricted to one country.
  /// Empty when the country has no rows.
  fn country_series<'a>(
    &'a self,
    country_region: &'a str,
  ) -> impl Future<Output = Result<Vec<CountryAggregate>, Self::Error>> + Send + 'a;

  /// Every unified row, ordered by country, province and date.
  fn unified_records(
    &self,
  ) -> impl Future<Output = Result<Vec<UnifiedRecord>, Self::Error>> + Send + '_;

  /// The calendar table in date order.
  fn calendar(
    &self,
  ) -> impl Future<Output = Result<Vec<CalendarEntry>, Self::Error>> + Send + '_;

  /// Row count, country count and date range; `None` when the table is empty.
  fn overview(
    &self,
  ) -> impl Future<Output = Result<Option<DatasetOverview>, Self::Error>> + Send + '_;
}
