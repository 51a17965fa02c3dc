//! Chart-ready data: `GET /chart-data/{chart_type}`.
//!
//! Bar charts carry the top ten countries for one metric; the daily chart
//! carries a country's new-case curve with its moving average.

use std::{fmt, str::FromStr};

use axum::{
  Json,
  extract::{Path, State},
};
use chrono::NaiveDate;
use covid_core::{
  CovidService,
  stats::{Metric, MetricValue},
  store::CovidStore,
};
use serde::{Deserialize, Serialize};

use crate::{
  daily::{MEXICO, series_or_not_found},
  error::ApiError,
};

/// Countries shown in each bar chart.
pub const BAR_CHART_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
  TopConfirmed,
  TopDeaths,
  TopMortality,
  LowMortality,
  TopRecovery,
  MexicoDaily,
}

impl ChartKind {
  pub const ALL: [ChartKind; 6] = [
    Self::TopConfirmed,
    Self::TopDeaths,
    Self::TopMortality,
    Self::LowMortality,
    Self::TopRecovery,
    Self::MexicoDaily,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      Self::TopConfirmed => "top-confirmed",
      Self::TopDeaths => "top-deaths",
      Self::TopMortality => "top-mortality",
      Self::LowMortality => "low-mortality",
      Self::TopRecovery => "top-recovery",
      Self::MexicoDaily => "mexico-daily",
    }
  }

  /// Ranking behind a bar chart; `None` for the daily chart.
  fn ranking(self) -> Option<(Metric, bool, &'static str)> {
    match self {
      Self::TopConfirmed => Some((Metric::Confirmed, false, "Top 10 Countries - Confirmed Cases")),
      Self::TopDeaths => Some((Metric::Deaths, false, "Top 10 Countries - Deaths")),
      Self::TopMortality => {
        Some((Metric::MortalityRate, false, "Top 10 Countries - Mortality Rate (%)"))
      }
      Self::LowMortality => {
        Some((Metric::MortalityRate, true, "Lowest 10 Countries - Mortality Rate (%)"))
      }
      Self::TopRecovery => {
        Some((Metric::RecoveryRate, false, "Top 10 Countries - Recovery Rate (%)"))
      }
      Self::MexicoDaily => None,
    }
  }
}

impl fmt::Display for ChartKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for ChartKind {
  type Err = ApiError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::ALL
      .into_iter()
      .find(|k| k.as_str() == s)
      .ok_or_else(|| ApiError::BadRequest(format!("invalid chart type: {s:?}")))
  }
}

// ─── Payloads ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarChart {
  pub labels: Vec<String>,
  pub values: Vec<MetricValue>,
  pub title:  String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyChart {
  pub dates:          Vec<NaiveDate>,
  pub daily_cases:    Vec<u64>,
  /// Days outside the centered window are 0 here, not null.
  pub moving_average: Vec<f64>,
  pub title:          String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChartData {
  Bar(BarChart),
  Daily(DailyChart),
}

// ─── Builders ────────────────────────────────────────────────────────────────

pub async fn bar_chart<S: CovidStore>(
  service: &CovidService<S>,
  metric: Metric,
  ascending: bool,
  title: &str,
) -> Result<BarChart, ApiError> {
  let top = service.top_countries(metric, BAR_CHART_SIZE, ascending).await?;
  Ok(BarChart {
    labels: top.iter().map(|t| t.country_region.clone()).collect(),
    values: top.iter().map(|t| t.metric_value).collect(),
    title:  title.to_owned(),
  })
}

/// The daily chart for any country; 404 when it has no rows.
pub async fn daily_chart<S: CovidStore>(
  service: &CovidService<S>,
  country: &str,
) -> Result<DailyChart, ApiError> {
  let points = series_or_not_found(service, country).await?;
  Ok(DailyChart {
    dates:          points.iter().map(|p| p.date).collect(),
    daily_cases:    points.iter().map(|p| p.daily_value).collect(),
    moving_average: points.iter().map(|p| p.moving_average.unwrap_or(0.0)).collect(),
    title:          format!("Daily COVID-19 Cases - {country}"),
  })
}

pub async fn build_chart<S: CovidStore>(
  service: &CovidService<S>,
  kind: ChartKind,
) -> Result<ChartData, ApiError> {
  match kind.ranking() {
    Some((metric, ascending, title)) => {
      Ok(ChartData::Bar(bar_chart(service, metric, ascending, title).await?))
    }
    None => Ok(ChartData::Daily(daily_chart(service, MEXICO).await?)),
  }
}

/// `GET /chart-data/{chart_type}`
pub async fn handler<S: CovidStore>(
  State(service): State<CovidService<S>>,
  Path(chart_type): Path<String>,
) -> Result<Json<ChartData>, ApiError> {
  let kind: ChartKind = chart_type.parse()?;
  Ok(Json(build_chart(&service, kind).await?))
}
