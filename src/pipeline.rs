//! The four-stage pipeline: fetch, transform, rate, aggregate/rank.
//!
//! Stages run with strict barriers between them. Per-city failures are
//! contained inside their stage; a city that fails anywhere is simply
//! absent from the report and the most-favorable answer.

use anyhow::{Result, bail};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::fetch::{self, ForecastSource};
use crate::rating::rank::{build_rows, most_favorable};
use crate::rating::rate::rate_all;
use crate::rating::types::RankedRow;
use crate::report::{ReportSettings, ReportTable};
use crate::staging::StagingDirs;
use crate::transform::{Transformer, run_pool};

/// Tuning knobs for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Parallelism of the I/O-bound stages (fetch, rate, aggregate).
    pub concurrency: usize,
    /// Transform worker pool size.
    pub workers: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            concurrency: fetch::default_concurrency(),
            workers: crate::transform::default_workers(),
        }
    }
}

/// Result of a full pipeline run.
#[derive(Debug)]
pub struct PipelineOutcome {
    /// One row per city that survived every stage, unordered.
    pub rows: Vec<RankedRow>,
    /// Display names of every city sharing the top score.
    pub most_favorable: Vec<String>,
}

/// Runs the full pipeline for `city_keys` and persists the report at
/// `report_path`.
///
/// # Errors
///
/// Fails if the staging directories cannot be prepared, if no city
/// survives fetch and transform (nothing to rank), or if the report
/// cannot be written. Per-city failures never surface here.
#[tracing::instrument(skip_all, fields(city_count = city_keys.len()))]
pub async fn run<S>(
    source: Arc<S>,
    transformer: Arc<dyn Transformer>,
    city_keys: &[String],
    work_dir: &Path,
    report_path: &Path,
    options: &PipelineOptions,
) -> Result<PipelineOutcome>
where
    S: ForecastSource + 'static,
{
    let start = std::time::Instant::now();

    let dirs = StagingDirs::new(work_dir);
    dirs.create_fresh()?;

    // Stage 1: fetch everything, then drop the cities that failed.
    let records = fetch::fetch_all(source, city_keys, options.concurrency).await;
    let fetched: Vec<_> = records.into_iter().filter(|r| r.payload.is_some()).collect();
    info!(
        fetched = fetched.len(),
        failed = city_keys.len() - fetched.len(),
        "Fetch stage complete"
    );

    if fetched.is_empty() {
        bail!("no city produced a payload; nothing to rank");
    }

    // Stage 2: worker pool drains the queue, persisting normalized records.
    let transformed = run_pool(fetched, transformer, &dirs, options.workers).await;
    info!(transformed = transformed.len(), "Transform stage complete");
    dirs.remove_raw()?;

    if transformed.is_empty() {
        bail!("no city produced a normalized record; nothing to rank");
    }

    // Stage 3: score every persisted record.
    let scores = rate_all(dirs.normalized_dir(), options.concurrency).await?;
    info!(scored = scores.len(), "Rate stage complete");

    if scores.is_empty() {
        bail!("no city produced a score; nothing to rank");
    }

    // Stage 4: rank, build rows, render the report.
    let rows = build_rows(dirs.normalized_dir(), &scores, options.concurrency).await;
    let best = most_favorable(&scores);

    let table = ReportTable::new(report_path, ReportSettings::default(), rows.len());
    table.write(&rows)?;

    dirs.remove_normalized()?;

    info!(
        elapsed_secs = start.elapsed().as_secs_f32(),
        cities = rows.len(),
        most_favorable = ?best,
        "Pipeline complete"
    );

    Ok(PipelineOutcome {
        rows,
        most_favorable: best,
    })
}
