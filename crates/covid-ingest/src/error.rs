//! Error types for the covid-ingest pipeline.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// An input does not have the expected column layout.
  #[error("schema error in {input}: {message}")]
  Schema { input: String, message: String },

  #[error("invalid value {value:?} in {input}, line {line}, column {column:?}")]
  InvalidValue {
    input:  String,
    line:   u64,
    column: String,
    value:  String,
  },

  #[error("unknown cumulative field: {0:?}")]
  UnknownField(String),

  #[error("CSV error: {0}")]
  Csv(#[from] csv::Error),

  #[error("I/O error on {}: {error}", .path.display())]
  Io {
    path:  std::path::PathBuf,
    #[source]
    error: std::io::Error,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
