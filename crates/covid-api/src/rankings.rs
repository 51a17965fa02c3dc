//! Handlers for the global summary and the country rankings.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/global-stats` | |
//! | `GET`  | `/top-confirmed` | `?n=` (default 10) |
//! | `GET`  | `/top-deaths` | `?n=` |
//! | `GET`  | `/top-mortality` | `?n=` |
//! | `GET`  | `/low-mortality` | `?n=`; countries under 1000 confirmed are skipped |
//! | `GET`  | `/top-recovery` | `?n=` |

use axum::{
  Json,
  extract::{Query, State},
};
use covid_core::{
  CovidService,
  stats::{GlobalSummary, Metric, TopCountry},
  store::CovidStore,
};
use serde::Deserialize;

use crate::error::ApiError;

pub const DEFAULT_N: usize = 10;
pub const MAX_N: usize = 1000;

#[derive(Debug, Deserialize)]
pub struct RankParams {
  /// Kept as text so a malformed value becomes a JSON 400 rather than an
  /// extractor rejection.
  pub n: Option<String>,
}

impl RankParams {
  /// The requested count, defaulting to [`DEFAULT_N`] and capped at [`MAX_N`].
  pub fn n(&self) -> Result<usize, ApiError> {
    let Some(raw) = self.n.as_deref() else {
      return Ok(DEFAULT_N);
    };
    let n: usize = raw
      .trim()
      .parse()
      .map_err(|_| ApiError::BadRequest(format!("n must be a non-negative integer, got {raw:?}")))?;
    Ok(n.min(MAX_N))
  }
}

/// `GET /global-stats`
pub async fn global<S: CovidStore>(
  State(service): State<CovidService<S>>,
) -> Result<Json<GlobalSummary>, ApiError> {
  Ok(Json(service.global_stats().await?))
}

async fn ranked<S: CovidStore>(
  service: &CovidService<S>,
  params: &RankParams,
  metric: Metric,
  ascending: bool,
) -> Result<Json<Vec<TopCountry>>, ApiError> {
  let n = params.n()?;
  Ok(Json(service.top_countries(metric, n, ascending).await?))
}

/// `GET /top-confirmed[?n=<n>]`
pub async fn top_confirmed<S: CovidStore>(
  State(service): State<CovidService<S>>,
  Query(params): Query<RankParams>,
) -> Result<Json<Vec<TopCountry>>, ApiError> {
  ranked(&service, &params, Metric::Confirmed, false).await
}

/// `GET /top-deaths[?n=<n>]`
pub async fn top_deaths<S: CovidStore>(
  State(service): State<CovidService<S>>,
  Query(params): Query<RankParams>,
) -> Result<Json<Vec<TopCountry>>, ApiError> {
  ranked(&service, &params, Metric::Deaths, false).await
}

/// `GET /top-mortality[?n=<n>]`
pub async fn top_mortality<S: CovidStore>(
  State(service): State<CovidService<S>>,
  Query(params): Query<RankParams>,
) -> Result<Json<Vec<TopCountry>>, ApiError> {
  ranked(&service, &params, Metric::MortalityRate, false).await
}

/// `GET /low-mortality[?n=<n>]`
pub async fn low_mortality<S: CovidStore>(
  State(service): State<CovidService<S>>,
  Query(params): Query<RankParams>,
) -> Result<Json<Vec<TopCountry>>, ApiError> {
  ranked(&service, &params, Metric::MortalityRate, true).await
}

/// `GET /top-recovery[?n=<n>]`
pub async fn top_recovery<S: CovidStore>(
  State(service): State<CovidService<S>>,
  Query(params): Query<RankParams>,
) -> Result<Json<Vec<TopCountry>>, ApiError> {
  ranked(&service, &params, Metric::RecoveryRate, false).await
}
