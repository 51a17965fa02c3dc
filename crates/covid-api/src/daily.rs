//! Handlers for per-country daily curves.

use axum::{
  Json,
  extract::{Path, State},
};
use chrono::NaiveDate;
use covid_core::{CovidService, stats::DailyPoint, store::CovidStore};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

pub const MEXICO: &str = "Mexico";

/// A country's daily curve as parallel arrays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryDaily {
  pub country:        String,
  pub dates:          Vec<NaiveDate>,
  pub daily_cases:    Vec<u64>,
  pub daily_deaths:   Vec<u64>,
  /// `null` where the centered window does not fit.
  pub moving_average: Vec<Option<f64>>,
}

impl CountryDaily {
  pub fn new(country: &str, points: &[DailyPoint]) -> Self {
    Self {
      country:        country.to_owned(),
      dates:          points.iter().map(|p| p.date).collect(),
      daily_cases:    points.iter().map(|p| p.daily_value).collect(),
      daily_deaths:   points.iter().map(|p| p.daily_deaths).collect(),
      moving_average: points.iter().map(|p| p.moving_average).collect(),
    }
  }
}

/// The daily series for `country`, or 404.
pub async fn series_or_not_found<S: CovidStore>(
  service: &CovidService<S>,
  country: &str,
) -> Result<Vec<DailyPoint>, ApiError> {
  service
    .country_daily_series(country)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("no data for country {country:?}")))
}

/// `GET /mexico-daily`
pub async fn mexico<S: CovidStore>(
  State(service): State<CovidService<S>>,
) -> Result<Json<CountryDaily>, ApiError> {
  let points = series_or_not_found(&service, MEXICO).await?;
  Ok(Json(CountryDaily::new(MEXICO, &points)))
}

/// `GET /country-daily/{name}`
pub async fn country<S: CovidStore>(
  State(service): State<CovidService<S>>,
  Path(name): Path<String>,
) -> Result<Json<CountryDaily>, ApiError> {
  let points = series_or_not_found(&service, &name).await?;
  Ok(Json(CountryDaily::new(&name, &points)))
}
