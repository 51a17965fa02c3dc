//! [`SqliteStore`], the SQLite implementation of [`CovidStore`].

use std::path::Path;

use covid_core::{
  record::{CalendarEntry, CountryAggregate, DatasetOverview, LoadSummary, UnifiedRecord},
  store::CovidStore,
};

use crate::{
  Error, Result,
  encode::{
    RawAggregate, RawCalendar, RawOverview, RawRecord, encode_count, encode_date,
  },
  schema::{
    CALENDAR_COLUMNS, CALENDAR_TABLE, CREATE_CALENDAR, CREATE_INDEXES, CREATE_UNIFIED,
    INSERT_CALENDAR, INSERT_UNIFIED, PRAGMAS, SELECT_AGGREGATE, UNIFIED_COLUMNS, UNIFIED_TABLE,
  },
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A COVID-19 statistics store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path`, creating missing tables and
  /// checking that existing ones use the expected column names.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store. Useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open `path` without creating or checking any table.
  ///
  /// For loaders that are about to call
  /// [`CovidStore::replace_dataset`], which rebuilds both tables anyway and
  /// so can repair a database whose layout [`SqliteStore::open`] rejects.
  pub async fn open_unchecked(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Ok(Self { conn })
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(PRAGMAS)?;
        conn.execute_batch(CREATE_UNIFIED)?;
        conn.execute_batch(CREATE_CALENDAR)?;
        Ok(())
      })
      .await?;

    self.verify_columns(UNIFIED_TABLE, &UNIFIED_COLUMNS).await?;
    self.verify_columns(CALENDAR_TABLE, &CALENDAR_COLUMNS).await?;

    self
      .conn
      .call(|conn| {
        conn.execute_batch(CREATE_INDEXES)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Compare the live column names of `table` against `expected`, exactly
  /// and in order.
  async fn verify_columns(&self, table: &'static str, expected: &[&'static str]) -> Result<()> {
    let found: Vec<String> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
        let names = stmt
          .query_map([], |row| row.get::<_, String>(1))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(names)
      })
      .await?;

    if found.iter().map(String::as_str).eq(expected.iter().copied()) {
      return Ok(());
    }
    tracing::error!(table, ?found, "table layout does not match the expected columns");
    Err(Error::Schema { table, expected: expected.to_vec(), found })
  }

  async fn query_aggregates(&self, country: Option<String>) -> Result<Vec<CountryAggregate>> {
    let raws: Vec<RawAggregate> = self
      .conn
      .call(move |conn| {
        let rows = if let Some(country) = country {
          let mut stmt = conn.prepare(&format!(
            "{SELECT_AGGREGATE} WHERE country_region = ?1 \
             GROUP BY country_region, date ORDER BY country_region, date"
          ))?;
          stmt
            .query_map(rusqlite::params![country], RawAggregate::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        } else {
          let mut stmt = conn.prepare(&format!(
            "{SELECT_AGGREGATE} GROUP BY country_region, date ORDER BY country_region, date"
          ))?;
          stmt
            .query_map([], RawAggregate::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAggregate::into_aggregate).collect()
  }
}

// ─── CovidStore impl ─────────────────────────────────────────────────────────

impl CovidStore for SqliteStore {
  type Error = Error;

  // ── Load ──────────────────────────────────────────────────────────────────

  async fn replace_dataset(
    &self,
    records: Vec<UnifiedRecord>,
    calendar: Vec<CalendarEntry>,
  ) -> Result<LoadSummary> {
    // Each table is swapped in its own transaction: a failure part-way
    // leaves that table as it was.
    let summary = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute_batch("DROP TABLE IF EXISTS covid_data_unified;")?;
        tx.execute_batch(CREATE_UNIFIED)?;
        tx.execute_batch(CREATE_INDEXES)?;
        {
          let mut stmt = tx.prepare(INSERT_UNIFIED)?;
          for r in &records {
            stmt.execute(rusqlite::params![
              r.country_region,
              r.province_state,
              r.lat,
              r.long,
              encode_date(r.date),
              encode_count(r.confirmed),
              encode_count(r.deaths),
              encode_count(r.recovered),
              encode_count(r.confirmed_daily),
              encode_count(r.deaths_daily),
              encode_count(r.recovered_daily),
            ])?;
          }
        }
        tx.commit()?;

        let tx = conn.transaction()?;
        tx.execute_batch("DROP TABLE IF EXISTS calendar;")?;
        tx.execute_batch(CREATE_CALENDAR)?;
        {
          let mut stmt = tx.prepare(INSERT_CALENDAR)?;
          for c in &calendar {
            stmt.execute(rusqlite::params![
              encode_date(c.date),
              c.year,
              c.month,
              c.day,
              c.day_of_week,
              c.week_of_year,
              c.month_name,
              c.quarter,
            ])?;
          }
        }
        tx.commit()?;

        Ok(LoadSummary {
          records:       records.len() as u64,
          calendar_days: calendar.len() as u64,
        })
      })
      .await?;

    tracing::debug!(
      records = summary.records,
      calendar_days = summary.calendar_days,
      "replaced unified and calendar tables"
    );
    Ok(summary)
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn country_aggregates(&self) -> Result<Vec<CountryAggregate>> {
    self.query_aggregates(None).await
  }

  async fn country_series<'a>(&'a self, country_region: &'a str) -> Result<Vec<CountryAggregate>> {
    self.query_aggregates(Some(country_region.to_owned())).await
  }

  async fn unified_records(&self) -> Result<Vec<UnifiedRecord>> {
    let raws: Vec<RawRecord> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT country_region, province_state, lat, long, date,
                  confirmed, deaths, recovered,
                  confirmed_daily, deaths_daily, recovered_daily
           FROM covid_data_unified
           ORDER BY country_region, province_state, date",
        )?;
        let rows = stmt
          .query_map([], RawRecord::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRecord::into_record).collect()
  }

  async fn calendar(&self) -> Result<Vec<CalendarEntry>> {
    let raws: Vec<RawCalendar> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT date, year, month, day, day_of_week, week_of_year, month_name, quarter
           FROM calendar
           ORDER BY date",
        )?;
        let rows = stmt
          .query_map([], RawCalendar::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCalendar::into_entry).collect()
  }

  async fn overview(&self) -> Result<Option<DatasetOverview>> {
    let raw: RawOverview = self
      .conn
      .call(|conn| {
        let raw = conn.query_row(
          "SELECT COUNT(*), COUNT(DISTINCT country_region), MIN(date), MAX(date)
           FROM covid_data_unified",
          [],
          |row| {
            Ok(RawOverview {
              records:    row.get(0)?,
              countries:  row.get(1)?,
              first_date: row.get(2)?,
              last_date:  row.get(3)?,
            })
          },
        )?;
        Ok(raw)
      })
      .await?;

    raw.into_overview()
  }
}
