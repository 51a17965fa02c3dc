//! `covid`: load the JHU time series, serve the statistics API, print the
//! summary report or export wide CSV.
//!
//! Reads `config.toml` (or the path given with `--config`) and `COVID_*`
//! environment variables; see [`ServerConfig`] for the keys.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use covid_core::CovidService;
use covid_ingest::{CumulativeField, SourceFiles};
use covid_server::{ServerConfig, report::Report};
use covid_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "COVID-19 statistics pipeline and API server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml", global = true)]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the JSON API under /api/covid.
  Serve,
  /// Rebuild the store from the confirmed, deaths and recovered CSVs.
  Load(LoadArgs),
  /// Print the summary report.
  Report {
    /// Country for the daily-curve section (defaults to `default_country`).
    #[arg(long)]
    country: Option<String>,
    /// Also write chart-data JSON files into this directory.
    #[arg(long)]
    out: Option<PathBuf>,
  },
  /// Write one cumulative column of the store back out as wide CSV.
  Export {
    /// confirmed, deaths or recovered.
    #[arg(long)]
    metric: CumulativeField,
    #[arg(long)]
    out: PathBuf,
  },
}

#[derive(Args)]
struct LoadArgs {
  /// Directory with the standard JHU file names (defaults to `data_dir`).
  #[arg(long, conflicts_with_all = ["confirmed", "deaths", "recovered"])]
  data_dir: Option<PathBuf>,
  #[arg(long, requires_all = ["deaths", "recovered"])]
  confirmed: Option<PathBuf>,
  #[arg(long, requires_all = ["confirmed", "recovered"])]
  deaths: Option<PathBuf>,
  #[arg(long, requires_all = ["confirmed", "deaths"])]
  recovered: Option<PathBuf>,
}

impl LoadArgs {
  fn source_files(self, cfg: &ServerConfig) -> SourceFiles {
    match (self.confirmed, self.deaths, self.recovered) {
      (Some(confirmed), Some(deaths), Some(recovered)) => {
        SourceFiles { confirmed, deaths, recovered }
      }
      _ => SourceFiles::in_dir(self.data_dir.as_ref().unwrap_or(&cfg.data_dir)),
    }
  }
}

async fn open_store(cfg: &ServerConfig) -> anyhow::Result<Arc<SqliteStore>> {
  let store = SqliteStore::open(&cfg.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", cfg.store_path))?;
  Ok(Arc::new(store))
}

async fn open_service(cfg: &ServerConfig) -> anyhow::Result<CovidService<SqliteStore>> {
  Ok(CovidService::new(open_store(cfg).await?))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let cfg = ServerConfig::load(&cli.config)
    .with_context(|| format!("failed to read configuration from {:?}", cli.config))?;

  match cli.command {
    Command::Serve => {
      let app = covid_server::app(open_store(&cfg).await?);
      let address = cfg.address();

      tracing::info!("Listening on http://{address}{}", covid_server::API_PREFIX);
      let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
      axum::serve(listener, app).await.context("server error")?;
    }

    Command::Load(args) => {
      let files = args.source_files(&cfg);
      let summary = covid_server::load_dataset(&cfg.store_path, files)
        .await
        .context("load failed")?;
      println!(
        "Loaded {} records and {} calendar days into {}",
        summary.records,
        summary.calendar_days,
        cfg.store_path.display()
      );
    }

    Command::Report { country, out } => {
      let service = open_service(&cfg).await?;
      let country = country.unwrap_or_else(|| cfg.default_country.clone());
      let report = Report::gather(&service, &country)
        .await
        .context("failed to build report")?;
      print!("{report}");

      if let Some(dir) = out {
        let written = covid_server::report::write_charts(&service, &country, &dir)
          .await
          .with_context(|| format!("failed to write charts to {}", dir.display()))?;
        for path in written {
          println!("wrote {}", path.display());
        }
      }
    }

    Command::Export { metric, out } => {
      let service = open_service(&cfg).await?;
      let rows = covid_server::export_csv(&service, metric, &out)
        .await
        .with_context(|| format!("failed to export to {}", out.display()))?;
      println!("Wrote {rows} regions of {metric} to {}", out.display());
    }
  }

  Ok(())
}
