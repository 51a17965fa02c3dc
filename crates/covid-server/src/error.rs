//! Error type for the server's batch operations (load, export, report).

use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Core(#[from] covid_core::Error),

  #[error(transparent)]
  Ingest(#[from] covid_ingest::Error),

  #[error(transparent)]
  Store(#[from] covid_store_sqlite::Error),

  #[error(transparent)]
  Chart(#[from] covid_api::ApiError),

  #[error("JSON encoding error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("I/O error on {}: {error}", .path.display())]
  Io {
    path:  PathBuf,
    #[source]
    error: io::Error,
  },

  #[error("background task failed: {0}")]
  Task(#[from] tokio::task::JoinError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
