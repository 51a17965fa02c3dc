//! Error type for `covid-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  /// A table exists but its columns differ from the canonical layout.
  #[error("schema mismatch in table {table}: expected columns {expected:?}, found {found:?}")]
  Schema {
    table:    &'static str,
    expected: Vec<&'static str>,
    found:    Vec<String>,
  },

  #[error("date parse error: {0}")]
  DateParse(String),

  #[error("value out of range in column {column}: {value}")]
  OutOfRange { column: &'static str, value: i64 },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
