//! Reshape-and-load pipeline for the JHU COVID-19 global time series.
//!
//! Reads the wide confirmed / deaths / recovered CSVs, melts them to long
//! form, joins them, derives daily deltas and a calendar dimension. Pure
//! synchronous; persisting the result is the caller's job (see
//! [`covid_core::store::CovidStore::replace_dataset`]).
//!
//! # Quick start
//!
//! ```no_run
//! use covid_ingest::{SourceFiles, load_files};
//!
//! let dataset = load_files(&SourceFiles::in_dir("data")).unwrap();
//! println!("{} records, {} days", dataset.records.len(), dataset.calendar.len());
//! ```

mod calendar;
pub mod error;
pub mod melt;
mod pivot;
mod unify;

use std::{
  fs::File,
  io::BufReader,
  path::{Path, PathBuf},
};

pub use calendar::{calendar_for, calendar_range};
use covid_core::record::{CalendarEntry, UnifiedRecord};
pub use error::{Error, Result};
pub use melt::{MeltedRow, Region, melt};
pub use pivot::{CumulativeField, WideRow, WideTable, pivot_wide, write_wide_csv};
pub use unify::{fill_daily_deltas, unify};

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Paths of the three wide time-series files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFiles {
  pub confirmed: PathBuf,
  pub deaths:    PathBuf,
  pub recovered: PathBuf,
}

impl SourceFiles {
  pub const CONFIRMED_FILE: &'static str = "time_series_covid19_confirmed_global.csv";
  pub const DEATHS_FILE: &'static str = "time_series_covid19_deaths_global.csv";
  pub const RECOVERED_FILE: &'static str = "time_series_covid19_recovered_global.csv";

  /// The standard file names inside `dir`.
  pub fn in_dir(dir: impl AsRef<Path>) -> Self {
    let dir = dir.as_ref();
    Self {
      confirmed: dir.join(Self::CONFIRMED_FILE),
      deaths:    dir.join(Self::DEATHS_FILE),
      recovered: dir.join(Self::RECOVERED_FILE),
    }
  }
}

// ─── Output ──────────────────────────────────────────────────────────────────

/// The two tables produced by one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
  pub records:  Vec<UnifiedRecord>,
  pub calendar: Vec<CalendarEntry>,
}

/// Join already-melted series into the unified table and its calendar.
pub fn build_dataset(
  confirmed: &[MeltedRow],
  deaths: &[MeltedRow],
  recovered: &[MeltedRow],
) -> Dataset {
  let records = unify(confirmed, deaths, recovered);
  let calendar = calendar_for(&records);
  Dataset { records, calendar }
}

/// Melt the CSV at `path`.
pub fn melt_file(path: &Path) -> Result<Vec<MeltedRow>> {
  let file = File::open(path).map_err(|error| Error::Io { path: path.to_path_buf(), error })?;
  melt(&path.display().to_string(), BufReader::new(file))
}

/// Run the whole reshape over the three files.
///
/// Aborts on the first error; nothing is partially returned.
pub fn load_files(files: &SourceFiles) -> Result<Dataset> {
  let confirmed = melt_file(&files.confirmed)?;
  let deaths = melt_file(&files.deaths)?;
  let recovered = melt_file(&files.recovered)?;
  Ok(build_dataset(&confirmed, &deaths, &recovered))
}
