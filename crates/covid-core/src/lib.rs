//! Core types and trait definitions for the COVID-19 statistics workspace.
//!
//! This crate has no HTTP, CSV or database dependencies.
//! The ingest pipeline, the SQLite backend and the JSON API all depend on it.

// Store methods declare `+ Send` futures explicitly.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod record;
pub mod service;
pub mod stats;
pub mod store;

pub use error::{Error, Result};
pub use service::CovidService;
