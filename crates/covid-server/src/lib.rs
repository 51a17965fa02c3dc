//! Server and batch commands for the COVID-19 statistics service.
//!
//! The `covid` binary is a thin clap front-end over this crate: it reads a
//! [`ServerConfig`], then either serves [`app`] over HTTP or runs one of the
//! batch operations ([`load_dataset`], [`export_csv`], [`report`]).

pub mod error;
pub mod report;

use std::{
  fs::File,
  io::BufWriter,
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::Router;
use covid_core::{CovidService, record::LoadSummary, store::CovidStore};
use covid_ingest::{CumulativeField, SourceFiles, pivot_wide, write_wide_csv};
use covid_store_sqlite::SqliteStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

pub use error::{Error, Result};

/// Where the JSON API is mounted.
pub const API_PREFIX: &str = "/api/covid";

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime configuration, deserialised from `config.toml` and `COVID_*`
/// environment variables. Every field has a default.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:            String,
  pub port:            u16,
  pub store_path:      PathBuf,
  /// Directory holding the three JHU time-series CSVs.
  pub data_dir:        PathBuf,
  /// Country featured by `report` when none is given.
  pub default_country: String,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:            "127.0.0.1".to_owned(),
      port:            5000,
      store_path:      PathBuf::from("covid.db"),
      data_dir:        PathBuf::from("."),
      default_country: "Mexico".to_owned(),
    }
  }
}

impl ServerConfig {
  /// Read `path` (optional) layered under `COVID_*` environment variables,
  /// then expand `~` in the path fields.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("COVID"))
      .build()?;
    let mut cfg: Self = settings.try_deserialize()?;
    cfg.store_path = expand_tilde(&cfg.store_path);
    cfg.data_dir = expand_tilde(&cfg.data_dir);
    Ok(cfg)
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The API under [`API_PREFIX`], with request tracing.
pub fn app<S: CovidStore + 'static>(store: Arc<S>) -> Router {
  Router::new()
    .nest(API_PREFIX, covid_api::api_router(store))
    .layer(TraceLayer::new_for_http())
}

// ─── Batch operations ────────────────────────────────────────────────────────

/// Run the reshape pipeline over `files` and replace the store's tables.
///
/// The store is opened without the column check so that a database written
/// with another column layout is rebuilt instead of rejected.
pub async fn load_dataset(store_path: &Path, files: SourceFiles) -> Result<LoadSummary> {
  tracing::info!(confirmed = %files.confirmed.display(), "loading time series");
  let dataset = tokio::task::spawn_blocking(move || covid_ingest::load_files(&files)).await??;

  let store = SqliteStore::open_unchecked(store_path).await?;
  let summary = CovidService::new(Arc::new(store))
    .load(dataset.records, dataset.calendar)
    .await?;
  Ok(summary)
}

/// Pivot the stored unified table back to one-column-per-day CSV at `out`.
///
/// Returns the number of region rows written.
pub async fn export_csv<S: CovidStore>(
  service: &CovidService<S>,
  field: CumulativeField,
  out: &Path,
) -> Result<usize> {
  let records = service.unified_records().await?;
  let table = pivot_wide(&records, field);

  let file = File::create(out).map_err(|error| Error::Io { path: out.to_path_buf(), error })?;
  write_wide_csv(&table, BufWriter::new(file))?;
  tracing::info!(%field, rows = table.rows.len(), days = table.dates.len(), "exported wide CSV");
  Ok(table.rows.len())
}
