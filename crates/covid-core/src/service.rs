//! [`CovidService`]: the aggregation and rate service.
//!
//! Every operation is a pure function of the store's current contents. There
//! is no cache and no state shared between calls.

use std::{collections::BTreeMap, sync::Arc};

use crate::{
  Error, Result,
  record::{
    CalendarEntry, CountryAggregate, DatasetOverview, LoadSummary, UnifiedRecord,
  },
  stats::{self, DailyPoint, GlobalSummary, LatestCountryStat, Metric, TopCountry},
  store::CovidStore,
};

/// Read-side statistics over an injected [`CovidStore`].
///
/// Cloning is cheap; the store is reference-counted.
pub struct CovidService<S> {
  store: Arc<S>,
}

impl<S> Clone for CovidService<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store) }
  }
}

impl<S: CovidStore> CovidService<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  /// Replace both tables with a freshly built dataset.
  pub async fn load(
    &self,
    records: Vec<UnifiedRecord>,
    calendar: Vec<CalendarEntry>,
  ) -> Result<LoadSummary> {
    let summary = self
      .store
      .replace_dataset(records, calendar)
      .await
      .map_err(Error::store)?;
    tracing::info!(
      records = summary.records,
      calendar_days = summary.calendar_days,
      "dataset replaced"
    );
    Ok(summary)
  }

  pub async fn country_aggregates(&self) -> Result<Vec<CountryAggregate>> {
    self.store.country_aggregates().await.map_err(Error::store)
  }

  /// Each country's aggregate at its own latest date, keyed by country.
  pub async fn latest_country_stats(&self) -> Result<BTreeMap<String, LatestCountryStat>> {
    let aggregates = self.country_aggregates().await?;
    Ok(stats::latest_by_country(aggregates))
  }

  pub async fn global_stats(&self) -> Result<GlobalSummary> {
    let latest = self.latest_country_stats().await?;
    Ok(stats::global_summary(latest.values()))
  }

  /// The `n` countries with the highest (or lowest, if `ascending`) `metric`.
  pub async fn top_countries(
    &self,
    metric: Metric,
    n: usize,
    ascending: bool,
  ) -> Result<Vec<TopCountry>> {
    let latest = self.latest_country_stats().await?;
    let ranked = stats::rank(latest.values(), metric, n, ascending);
    tracing::debug!(%metric, n, ascending, returned = ranked.len(), "ranked countries");
    Ok(ranked)
  }

  /// Daily new cases with a centered 7-day moving average.
  ///
  /// `None` when the country has no rows at all.
  pub async fn country_daily_series(&self, country_region: &str) -> Result<Option<Vec<DailyPoint>>> {
    let rows = self
      .store
      .country_series(country_region)
      .await
      .map_err(Error::store)?;
    if rows.is_empty() {
      return Ok(None);
    }
    Ok(Some(stats::daily_series(&rows)))
  }

  /// The first day with the highest number of new cases for a country.
  pub async fn peak_daily(&self, country_region: &str) -> Result<Option<DailyPoint>> {
    let series = self.country_daily_series(country_region).await?;
    Ok(series.and_then(|points| stats::peak(&points).cloned()))
  }

  pub async fn dataset_overview(&self) -> Result<Option<DatasetOverview>> {
    self.store.overview().await.map_err(Error::store)
  }

  pub async fn unified_records(&self) -> Result<Vec<UnifiedRecord>> {
    self.store.unified_records().await.map_err(Error::store)
  }
}
