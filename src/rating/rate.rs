//! Rate stage: one score per city from its persisted normalized record.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{Instrument, error, warn};

use super::types::ScoreEntry;
use super::utility::{mean_defined, round1};
use crate::forecast::{NormalizedRecord, parse_normalized};

/// Computes the [`ScoreEntry`] for one city's normalized record.
///
/// Null or missing day values are excluded from the means. A record with
/// zero eligible days for either metric is an error; the caller excludes
/// that city and the run continues.
pub fn score_record(city: &str, record: &NormalizedRecord) -> Result<ScoreEntry> {
    let avg_temp = mean_defined(record.days.iter().map(|d| d.temp_avg))
        .with_context(|| format!("{city}: no day has a temperature value"))?;
    let avg_cond_hours = mean_defined(record.days.iter().map(|d| d.relevant_cond_hours))
        .with_context(|| format!("{city}: no day has a condition-hours value"))?;

    let avg_temp = round1(avg_temp);
    let avg_cond_hours = round1(avg_cond_hours);
    let score = (avg_temp * avg_cond_hours).round() as i64;

    Ok(ScoreEntry {
        city: city.to_string(),
        avg_temp,
        avg_cond_hours,
        score,
    })
}

/// Scores every normalized record in `normalized_dir` with at most
/// `concurrency` tasks in flight, merging results after the join.
///
/// A record that cannot be read, parsed, or scored excludes only its own
/// city. Re-running over an unchanged directory yields identical entries.
#[tracing::instrument(skip(normalized_dir), fields(concurrency))]
pub async fn rate_all(
    normalized_dir: &Path,
    concurrency: usize,
) -> Result<HashMap<String, ScoreEntry>> {
    let mut record_paths: Vec<(String, PathBuf)> = Vec::new();
    for entry in std::fs::read_dir(normalized_dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        if let Some(city) = path.file_stem().and_then(|s| s.to_str()) {
            record_paths.push((city.to_string(), path.clone()));
        }
    }

    let semaphore = Arc::new(tokio::sync::Semaphore::new(concurrency.max(1)));

    let mut tasks = Vec::with_capacity(record_paths.len());
    for (city, path) in record_paths {
        let sem = semaphore.clone();
        let city_span = tracing::info_span!("rate_city", city = %city);

        tasks.push(tokio::spawn(
            async move {
                let _permit = sem.acquire().await.expect("semaphore closed");

                let entry = score_city_file(&city, &path).await;
                (city, entry)
            }
            .instrument(city_span),
        ));
    }

    // Single collector after the join: no shared mutable map during the
    // parallel phase.
    let mut scores = HashMap::new();
    for task in tasks {
        match task.await {
            Ok((city, Ok(entry))) => {
                scores.insert(city, entry);
            }
            Ok((city, Err(e))) => {
                warn!(city = %city, error = %e, "City excluded from rating");
            }
            Err(e) => {
                error!(error = %e, "Rate task aborted");
            }
        }
    }

    Ok(scores)
}

async fn score_city_file(city: &str, path: &Path) -> Result<ScoreEntry> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read normalized record {}", path.display()))?;
    let record = parse_normalized(&bytes)?;
    score_record(city, &record)
}
