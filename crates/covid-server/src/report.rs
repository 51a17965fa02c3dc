//! The text summary printed by `covid report`, and the chart-data files it
//! can write alongside.

use std::{
  fmt, fs,
  path::{Path, PathBuf},
};

use covid_api::{
  ApiError,
  charts::{BAR_CHART_SIZE, ChartData, ChartKind, build_chart, daily_chart},
};
use covid_core::{
  CovidService,
  record::DatasetOverview,
  stats::{self, DailyPoint, GlobalSummary, LatestCountryStat, Metric, MetricValue, TopCountry},
  store::CovidStore,
};

use crate::{Error, Result};

const RULE_WIDTH: usize = 60;

/// Everything the summary shows, gathered in one pass over the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
  pub overview:      Option<DatasetOverview>,
  pub global:        GlobalSummary,
  pub top_confirmed: Vec<TopCountry>,
  pub top_deaths:    Vec<TopCountry>,
  pub top_mortality: Vec<TopCountry>,
  pub low_mortality: Vec<TopCountry>,
  pub top_recovery:  Vec<TopCountry>,
  pub country:       String,
  pub peak:          Option<DailyPoint>,
  pub latest:        Option<LatestCountryStat>,
}

impl Report {
  pub async fn gather<S: CovidStore>(service: &CovidService<S>, country: &str) -> Result<Self> {
    let overview = service.dataset_overview().await?;
    let latest = service.latest_country_stats().await?;
    let rank = |metric, ascending| stats::rank(latest.values(), metric, BAR_CHART_SIZE, ascending);

    Ok(Self {
      overview,
      global: stats::global_summary(latest.values()),
      top_confirmed: rank(Metric::Confirmed, false),
      top_deaths: rank(Metric::Deaths, false),
      top_mortality: rank(Metric::MortalityRate, false),
      low_mortality: rank(Metric::MortalityRate, true),
      top_recovery: rank(Metric::RecoveryRate, false),
      country: country.to_owned(),
      peak: service.peak_daily(country).await?,
      latest: latest.get(country).cloned(),
    })
  }
}

/// `1234567` → `"1,234,567"`.
pub fn thousands(n: u64) -> String {
  let digits = n.to_string();
  let mut out = String::with_capacity(digits.len() + digits.len() / 3);
  for (i, c) in digits.chars().enumerate() {
    if i > 0 && (digits.len() - i) % 3 == 0 {
      out.push(',');
    }
    out.push(c);
  }
  out
}

fn ranking(f: &mut fmt::Formatter<'_>, title: &str, rows: &[TopCountry], unit: &str) -> fmt::Result {
  writeln!(f, "\n{title}")?;
  if rows.is_empty() {
    return writeln!(f, "  (none)");
  }
  for (i, row) in rows.iter().enumerate() {
    match row.metric_value {
      MetricValue::Count(n) => {
        writeln!(f, "{:2}. {:<24} {:>14} {unit}", i + 1, row.country_region, thousands(n))?
      }
      MetricValue::Rate(r) => writeln!(f, "{:2}. {:<24} {r:>8.2}%", i + 1, row.country_region)?,
    }
  }
  Ok(())
}

impl fmt::Display for Report {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let rule = "=".repeat(RULE_WIDTH);
    writeln!(f, "{rule}\nCOVID-19 ANALYSIS REPORT\n{rule}")?;

    match &self.overview {
      Some(o) => writeln!(
        f,
        "{} records across {} countries, {} to {}",
        thousands(o.records),
        o.countries,
        o.first_date,
        o.last_date
      )?,
      None => writeln!(f, "No data loaded.")?,
    }

    let g = &self.global;
    writeln!(f, "\nGLOBAL STATISTICS")?;
    writeln!(f, "Confirmed:      {}", thousands(g.confirmed))?;
    writeln!(f, "Deaths:         {}", thousands(g.deaths))?;
    writeln!(f, "Recovered:      {}", thousands(g.recovered))?;
    writeln!(f, "Mortality rate: {:.2}%", g.mortality_rate)?;
    writeln!(f, "Recovery rate:  {:.2}%", g.recovery_rate)?;

    ranking(f, "TOP 10 COUNTRIES BY CONFIRMED CASES", &self.top_confirmed, "cases")?;
    ranking(f, "TOP 10 COUNTRIES BY DEATHS", &self.top_deaths, "deaths")?;
    ranking(f, "TOP 10 COUNTRIES BY MORTALITY RATE", &self.top_mortality, "")?;
    ranking(
      f,
      &format!("LOWEST 10 MORTALITY RATES (>= {} cases)", thousands(stats::SIGNIFICANCE_THRESHOLD)),
      &self.low_mortality,
      "",
    )?;
    ranking(f, "TOP 10 COUNTRIES BY RECOVERY RATE", &self.top_recovery, "")?;

    writeln!(f, "\n{}", self.country.to_uppercase())?;
    match (&self.peak, &self.latest) {
      (Some(peak), Some(latest)) => {
        writeln!(f, "Peak daily cases: {} on {}", thousands(peak.daily_value), peak.date)?;
        writeln!(f, "Confirmed:      {}", thousands(latest.confirmed))?;
        writeln!(f, "Deaths:         {}", thousands(latest.deaths))?;
        writeln!(f, "Recovered:      {}", thousands(latest.recovered))?;
        writeln!(f, "Mortality rate: {:.2}%", latest.mortality_rate)?;
        writeln!(f, "Recovery rate:  {:.2}%", latest.recovery_rate)?;
      }
      _ => writeln!(f, "No data for {}", self.country)?,
    }

    writeln!(f, "\n{rule}")
  }
}

// ─── Chart files ─────────────────────────────────────────────────────────────

fn slug(country: &str) -> String {
  country
    .chars()
    .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
    .collect()
}

fn write_json(path: PathBuf, data: &ChartData) -> Result<PathBuf> {
  let json = serde_json::to_vec_pretty(data)?;
  fs::write(&path, json).map_err(|error| Error::Io { path: path.clone(), error })?;
  Ok(path)
}

/// Write one `<chart>.json` per bar chart, plus `<country>-daily.json`,
/// into `dir`. The daily file is skipped when `country` has no data.
pub async fn write_charts<S: CovidStore>(
  service: &CovidService<S>,
  country: &str,
  dir: &Path,
) -> Result<Vec<PathBuf>> {
  fs::create_dir_all(dir).map_err(|error| Error::Io { path: dir.to_path_buf(), error })?;

  let mut written = Vec::new();
  for kind in ChartKind::ALL.into_iter().filter(|k| *k != ChartKind::MexicoDaily) {
    let data = build_chart(service, kind).await?;
    written.push(write_json(dir.join(format!("{kind}.json")), &data)?);
  }

  match daily_chart(service, country).await {
    Ok(chart) => {
      let path = dir.join(format!("{}-daily.json", slug(country)));
      written.push(write_json(path, &ChartData::Daily(chart))?);
    }
    Err(ApiError::NotFound(message)) => tracing::warn!(%message, "skipping daily chart"),
    Err(e) => return Err(e.into()),
  }

  tracing::info!(files = written.len(), dir = %dir.display(), "wrote chart data");
  Ok(written)
}
