//! CLI entry point for the weather favorability rater.
//!
//! Provides subcommands for running the full pipeline, rating an existing
//! normalized directory, and listing the configured cities.

use anyhow::Result;
use clap::{Parser, Subcommand};
use forecast_rater::cities;
use forecast_rater::fetch::{self, HttpSource};
use forecast_rater::pipeline::{self, PipelineOptions};
use forecast_rater::rating::rank::most_favorable;
use forecast_rater::rating::rate::rate_all;
use forecast_rater::transform::{BuiltinTransformer, CommandTransformer, Transformer};
use std::ffi::OsStr;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Exit status for the failed connectivity precondition.
const EXIT_NO_CONNECTIVITY: i32 = 2;

const DEFAULT_PROBE_URL: &str = "https://code.s3.yandex.net";

#[derive(Parser)]
#[command(name = "forecast_rater")]
#[command(about = "Ranks cities by weather favorability", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full fetch/transform/rate/rank pipeline
    Run {
        /// Report file to write
        #[arg(short, long, default_value = "weather_report.csv")]
        output: String,

        /// Directory for the staging subdirectories
        #[arg(short = 'd', long, default_value = "stage")]
        work_dir: String,

        /// Parallelism of the I/O-bound stages (default: cores + 4)
        #[arg(short, long)]
        concurrency: Option<usize>,

        /// Transform worker pool size (default: cores)
        #[arg(short, long)]
        workers: Option<usize>,

        /// External transformer program; invoked with the raw payload path
        /// and the normalized record path. Built-in reduction when unset.
        #[arg(short, long)]
        transformer: Option<String>,
    },
    /// Rate an existing directory of normalized records
    Rate {
        /// Directory containing per-city normalized JSON records
        #[arg(value_name = "NORMALIZED_DIR")]
        dir: String,

        /// Parallelism (default: cores + 4)
        #[arg(short, long)]
        concurrency: Option<usize>,
    },
    /// List the configured cities
    ListCities,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/forecast_rater.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("forecast_rater.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            output,
            work_dir,
            concurrency,
            workers,
            transformer,
        } => {
            let probe_url = std::env::var("CONNECTIVITY_PROBE_URL")
                .unwrap_or_else(|_| DEFAULT_PROBE_URL.to_string());
            if !fetch::connectivity_ok(&probe_url).await {
                error!(probe_url = %probe_url, "No connectivity, aborting");
                std::process::exit(EXIT_NO_CONNECTIVITY);
            }

            let source = Arc::new(HttpSource::new()?);
            let transformer: Arc<dyn Transformer> = match transformer {
                Some(program) => {
                    info!(program = %program, "Using external transformer");
                    Arc::new(CommandTransformer::new(program))
                }
                None => Arc::new(BuiltinTransformer),
            };

            let mut options = PipelineOptions::default();
            if let Some(concurrency) = concurrency {
                options.concurrency = concurrency;
            }
            if let Some(workers) = workers {
                options.workers = workers;
            }

            let outcome = pipeline::run(
                source,
                transformer,
                &cities::all_keys(),
                Path::new(&work_dir),
                Path::new(&output),
                &options,
            )
            .await?;

            info!(
                report = %output,
                cities = outcome.rows.len(),
                "Most favorable: {}",
                outcome.most_favorable.join(", ")
            );
        }
        Commands::Rate { dir, concurrency } => {
            let concurrency = concurrency.unwrap_or_else(fetch::default_concurrency);
            let scores = rate_all(Path::new(&dir), concurrency).await?;

            let mut entries: Vec<_> = scores.values().collect();
            entries.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.city.cmp(&b.city)));

            for entry in &entries {
                info!(
                    city = %entry.city,
                    avg_temp = entry.avg_temp,
                    avg_cond_hours = entry.avg_cond_hours,
                    score = entry.score,
                    "Score"
                );
            }

            info!(
                scored = entries.len(),
                "Most favorable: {}",
                most_favorable(&scores).join(", ")
            );
        }
        Commands::ListCities => {
            for (key, url) in cities::CITIES.iter().copied() {
                info!(city = key, name = cities::display_name(key), url, "City");
            }
            info!(total = cities::CITIES.len(), "City list");
        }
    }

    Ok(())
}
