//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::NaiveDate;
use covid_core::{
  record::{CalendarEntry, UnifiedRecord},
  store::CovidStore,
};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn d(day: u32) -> NaiveDate { NaiveDate::from_ymd_opt(2020, 3, day).unwrap() }

fn record(country: &str, province: Option<&str>, day: u32, confirmed: u64, daily: u64) -> UnifiedRecord {
  UnifiedRecord {
    country_region:  country.into(),
    province_state:  province.map(Into::into),
    lat:             Some(1.5),
    long:            None,
    date:            d(day),
    confirmed,
    deaths:          confirmed / 10,
    recovered:       confirmed / 2,
    confirmed_daily: daily,
    deaths_daily:    daily / 10,
    recovered_daily: daily / 2,
  }
}

fn sample() -> (Vec<UnifiedRecord>, Vec<CalendarEntry>) {
  let records = vec![
    record("Canada", Some("Ontario"), 1, 100, 0),
    record("Canada", Some("Ontario"), 2, 150, 50),
    record("Canada", Some("Quebec"), 1, 40, 0),
    record("Canada", Some("Quebec"), 2, 60, 20),
    record("Mexico", None, 1, 10, 0),
    record("Mexico", None, 2, 30, 20),
  ];
  let calendar = vec![CalendarEntry::from_date(d(1)), CalendarEntry::from_date(d(2))];
  (records, calendar)
}

async fn loaded() -> SqliteStore {
  let s = store().await;
  let (records, calendar) = sample();
  s.replace_dataset(records, calendar).await.unwrap();
  s
}

// ─── Load ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn replace_then_read_back() {
  let s = store().await;
  let (records, calendar) = sample();
  let summary = s.replace_dataset(records.clone(), calendar.clone()).await.unwrap();
  assert_eq!(summary.records, 6);
  assert_eq!(summary.calendar_days, 2);

  let mut expected = records;
  expected.sort_by(|a, b| {
    a.country_region
      .cmp(&b.country_region)
      .then_with(|| a.province_state.cmp(&b.province_state))
      .then(a.date.cmp(&b.date))
  });
  assert_eq!(s.unified_records().await.unwrap(), expected);
  assert_eq!(s.calendar().await.unwrap(), calendar);
}

#[tokio::test]
async fn replace_discards_previous_contents() {
  let s = loaded().await;
  s.replace_dataset(vec![record("Peru", None, 5, 7, 0)], vec![CalendarEntry::from_date(d(5))])
    .await
    .unwrap();

  let records = s.unified_records().await.unwrap();
  assert_eq!(records.len(), 1);
  assert_eq!(records[0].country_region, "Peru");

  let calendar = s.calendar().await.unwrap();
  assert_eq!(calendar.len(), 1);
  assert_eq!(calendar[0].date, d(5));
}

#[tokio::test]
async fn empty_store_reads_empty() {
  let s = store().await;
  assert!(s.unified_records().await.unwrap().is_empty());
  assert!(s.country_aggregates().await.unwrap().is_empty());
  assert!(s.overview().await.unwrap().is_none());
}

// ─── Aggregates ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn aggregates_sum_over_provinces() {
  let s = loaded().await;
  let aggregates = s.country_aggregates().await.unwrap();
  assert_eq!(aggregates.len(), 4);

  let canada_day2 = &aggregates[1];
  assert_eq!(canada_day2.country_region, "Canada");
  assert_eq!(canada_day2.date, d(2));
  assert_eq!(canada_day2.confirmed, 210);
  assert_eq!(canada_day2.deaths, 15 + 6);
  assert_eq!(canada_day2.recovered, 75 + 30);
  assert_eq!(canada_day2.confirmed_daily, 70);

  assert_eq!(aggregates[2].country_region, "Mexico");
  assert_eq!(aggregates[2].date, d(1));
}

#[tokio::test]
async fn country_series_filters_by_name() {
  let s = loaded().await;
  let mexico = s.country_series("Mexico").await.unwrap();
  assert_eq!(mexico.len(), 2);
  assert!(mexico.iter().all(|a| a.country_region == "Mexico"));
  assert_eq!(mexico[1].confirmed_daily, 20);

  assert!(s.country_series("Nowhereland").await.unwrap().is_empty());
}

#[tokio::test]
async fn overview_reports_shape() {
  let s = loaded().await;
  let overview = s.overview().await.unwrap().unwrap();
  assert_eq!(overview.records, 6);
  assert_eq!(overview.countries, 2);
  assert_eq!(overview.first_date, d(1));
  assert_eq!(overview.last_date, d(2));
}

// ─── Schema ──────────────────────────────────────────────────────────────────

fn temp_db(name: &str) -> std::path::PathBuf {
  let path = std::env::temp_dir().join(format!("covid-store-{}-{name}.db", std::process::id()));
  let _ = std::fs::remove_file(&path);
  path
}

fn remove_db(path: &std::path::Path) {
  for suffix in ["", "-wal", "-shm"] {
    let _ = std::fs::remove_file(format!("{}{suffix}", path.display()));
  }
}

fn create_legacy_table(path: &std::path::Path) {
  let conn = rusqlite::Connection::open(path).unwrap();
  conn
    .execute_batch(
      "CREATE TABLE covid_data_unified (
         Country_Region TEXT, Province_State TEXT, Lat REAL, Long REAL, Date TEXT,
         Confirmed INTEGER, Deaths INTEGER, Recovered INTEGER,
         Confirmed_Daily INTEGER, Deaths_Daily INTEGER, Recovered_Daily INTEGER
       );",
    )
    .unwrap();
}

#[tokio::test]
async fn legacy_column_casing_is_rejected_at_open() {
  let path = temp_db("legacy");
  create_legacy_table(&path);

  let result = SqliteStore::open(&path).await;
  remove_db(&path);
  match result {
    Err(Error::Schema { table, found, .. }) => {
      assert_eq!(table, "covid_data_unified");
      assert_eq!(found[0], "Country_Region");
    }
    Err(other) => panic!("unexpected error: {other}"),
    Ok(_) => panic!("legacy table accepted"),
  }
}

#[tokio::test]
async fn replace_repairs_legacy_table() {
  let path = temp_db("repair");
  create_legacy_table(&path);

  let s = SqliteStore::open_unchecked(&path).await.unwrap();
  let (records, calendar) = sample();
  s.replace_dataset(records, calendar).await.unwrap();
  drop(s);

  let reopened = SqliteStore::open(&path).await;
  let overview = match reopened {
    Ok(s) => s.overview().await.unwrap(),
    Err(e) => {
      remove_db(&path);
      panic!("reopen failed: {e}");
    }
  };
  remove_db(&path);
  assert_eq!(overview.map(|o| o.records), Some(6));
}

#[tokio::test]
async fn reopening_keeps_data() {
  let path = temp_db("reopen");
  {
    let s = SqliteStore::open(&path).await.unwrap();
    let (records, calendar) = sample();
    s.replace_dataset(records, calendar).await.unwrap();
  }
  let s = SqliteStore::open(&path).await.unwrap();
  let count = s.unified_records().await.unwrap().len();
  remove_db(&path);
  assert_eq!(count, 6);
}
