//! SQL schema for the COVID-19 SQLite store.
//!
//! All identifiers are lower-case snake_case. Dates are ISO 8601 `YYYY-MM-DD`
//! text, so lexical order is chronological order.

pub const UNIFIED_TABLE: &str = "covid_data_unified";
pub const CALENDAR_TABLE: &str = "calendar";

/// Column order of [`UNIFIED_TABLE`], as created by [`CREATE_UNIFIED`].
pub const UNIFIED_COLUMNS: [&str; 11] = [
  "country_region",
  "province_state",
  "lat",
  "long",
  "date",
  "confirmed",
  "deaths",
  "recovered",
  "confirmed_daily",
  "deaths_daily",
  "recovered_daily",
];

/// Column order of [`CALENDAR_TABLE`], as created by [`CREATE_CALENDAR`].
pub const CALENDAR_COLUMNS: [&str; 8] = [
  "date",
  "year",
  "month",
  "day",
  "day_of_week",
  "week_of_year",
  "month_name",
  "quarter",
];

pub const CREATE_UNIFIED: &str = "
CREATE TABLE IF NOT EXISTS covid_data_unified (
    country_region  TEXT    NOT NULL,
    province_state  TEXT,              -- NULL for country-level rows
    lat             REAL,
    long            REAL,
    date            TEXT    NOT NULL,  -- YYYY-MM-DD
    confirmed       INTEGER NOT NULL DEFAULT 0,
    deaths          INTEGER NOT NULL DEFAULT 0,
    recovered       INTEGER NOT NULL DEFAULT 0,
    confirmed_daily INTEGER NOT NULL DEFAULT 0,
    deaths_daily    INTEGER NOT NULL DEFAULT 0,
    recovered_daily INTEGER NOT NULL DEFAULT 0
);
";

/// Run after the column check, so a legacy table reports a schema mismatch
/// instead of failing on an unknown index column.
pub const CREATE_INDEXES: &str = "
CREATE INDEX IF NOT EXISTS unified_country_date_idx ON covid_data_unified(country_region, date);
CREATE INDEX IF NOT EXISTS unified_date_idx         ON covid_data_unified(date);
";

pub const CREATE_CALENDAR: &str = "
CREATE TABLE IF NOT EXISTS calendar (
    date         TEXT    PRIMARY KEY,  -- YYYY-MM-DD
    year         INTEGER NOT NULL,
    month        INTEGER NOT NULL,
    day          INTEGER NOT NULL,
    day_of_week  INTEGER NOT NULL,     -- Monday = 0
    week_of_year INTEGER NOT NULL,     -- ISO week
    month_name   TEXT    NOT NULL,
    quarter      INTEGER NOT NULL
);
";

pub const PRAGMAS: &str = "
PRAGMA journal_mode = WAL;
";

pub const INSERT_UNIFIED: &str = "
INSERT INTO covid_data_unified (
    country_region, province_state, lat, long, date,
    confirmed, deaths, recovered,
    confirmed_daily, deaths_daily, recovered_daily
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)";

pub const INSERT_CALENDAR: &str = "
INSERT INTO calendar (
    date, year, month, day, day_of_week, week_of_year, month_name, quarter
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)";

/// Shared SELECT list for country aggregates; callers append WHERE/GROUP BY.
pub const SELECT_AGGREGATE: &str = "
SELECT country_region,
       date,
       SUM(confirmed),
       SUM(deaths),
       SUM(recovered),
       SUM(confirmed_daily),
       SUM(deaths_daily),
       SUM(recovered_daily)
FROM covid_data_unified";
