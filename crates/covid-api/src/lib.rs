//! JSON REST API for the COVID-19 statistics service.
//!
//! Exposes an axum [`Router`] backed by any [`covid_core::store::CovidStore`].
//! Tracing, TLS and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api/covid", covid_api::api_router(store.clone()))
//! ```

pub mod charts;
pub mod daily;
pub mod error;
pub mod rankings;

use std::sync::Arc;

use axum::{Router, routing::get};
use covid_core::{CovidService, store::CovidStore};

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: CovidStore + 'static,
{
  Router::new()
    // Summary and rankings
    .route("/global-stats", get(rankings::global::<S>))
    .route("/top-confirmed", get(rankings::top_confirmed::<S>))
    .route("/top-deaths", get(rankings::top_deaths::<S>))
    .route("/top-mortality", get(rankings::top_mortality::<S>))
    .route("/low-mortality", get(rankings::low_mortality::<S>))
    .route("/top-recovery", get(rankings::top_recovery::<S>))
    // Daily curves
    .route("/mexico-daily", get(daily::mexico::<S>))
    .route("/country-daily/{name}", get(daily::country::<S>))
    // Charts
    .route("/chart-data/{chart_type}", get(charts::handler::<S>))
    .with_state(CovidService::new(store))
}
