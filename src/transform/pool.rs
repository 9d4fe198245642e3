use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};
use tracing::{Instrument, debug, error, info, warn};

use super::Transformer;
use crate::fetch::RawRecord;
use crate::staging::StagingDirs;

/// How long a worker waits on an empty queue before treating it as
/// drained. The producer finishes enqueuing before workers start, so this
/// is a completion signal, not a retry backoff.
const QUEUE_IDLE_TIMEOUT: Duration = Duration::from_millis(500);

/// Default pool size for the transform stage: one worker per core.
pub fn default_workers() -> usize {
    std::thread::available_parallelism().map_or(2, |n| n.get())
}

/// Drains the queued records through `workers` long-lived workers.
///
/// Each item is delivered to exactly one worker, which persists the raw
/// payload, invokes the transformer against it, and expects a normalized
/// record at the durable path. A failed transform drops its city; the pool
/// keeps going. Returns the cities that produced a normalized record,
/// in no particular order.
#[tracing::instrument(skip(records, transformer, dirs), fields(item_count = records.len(), workers))]
pub async fn run_pool(
    records: Vec<RawRecord>,
    transformer: Arc<dyn Transformer>,
    dirs: &StagingDirs,
    workers: usize,
) -> Vec<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    for record in records {
        // Send only fails once the receiver is dropped, which cannot
        // happen before the workers below are spawned.
        let _ = tx.send(record);
    }
    drop(tx);

    let rx = Arc::new(Mutex::new(rx));

    let mut tasks = Vec::with_capacity(workers.max(1));
    for worker_id in 0..workers.max(1) {
        let rx = rx.clone();
        let transformer = transformer.clone();
        let dirs = dirs.clone();

        let worker_span = tracing::info_span!("transform_worker", worker_id);

        tasks.push(tokio::spawn(
            async move {
                let mut completed = Vec::new();

                loop {
                    // Holding the lock across the pop makes the dequeue
                    // atomic: no record is ever delivered twice.
                    let record = {
                        let mut rx = rx.lock().await;
                        match tokio::time::timeout(QUEUE_IDLE_TIMEOUT, rx.recv()).await {
                            Ok(Some(record)) => record,
                            Ok(None) => break,
                            Err(_) => {
                                debug!("Queue idle past timeout, worker done");
                                break;
                            }
                        }
                    };

                    match process_record(&record, transformer.as_ref(), &dirs).await {
                        Ok(()) => {
                            info!(city = %record.city, "City transformed");
                            completed.push(record.city);
                        }
                        Err(e) => {
                            warn!(city = %record.city, error = %e, "Transform failed, dropping city");
                        }
                    }
                }

                completed
            }
            .instrument(worker_span),
        ));
    }

    let mut completed = Vec::new();
    for task in tasks {
        match task.await {
            Ok(cities) => completed.extend(cities),
            Err(e) => error!(error = %e, "Transform worker aborted"),
        }
    }

    completed
}

async fn process_record(
    record: &RawRecord,
    transformer: &dyn Transformer,
    dirs: &StagingDirs,
) -> Result<()> {
    let payload = record
        .payload
        .as_ref()
        .context("record reached the pool without a payload")?;

    let raw_path = dirs.raw_path(&record.city);
    tokio::fs::write(&raw_path, serde_json::to_vec(payload)?)
        .await
        .with_context(|| format!("failed to stage raw payload {}", raw_path.display()))?;

    let normalized_path = dirs.normalized_path(&record.city);
    transformer.transform(&raw_path, &normalized_path).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use async_trait::async_trait;
    use serde_json::json;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingTransformer {
        calls: AtomicUsize,
        fail_for: Option<String>,
    }

    impl CountingTransformer {
        fn new(fail_for: Option<&str>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_for: fail_for.map(str::to_string),
            }
        }
    }

    #[async_trait]
    impl Transformer for CountingTransformer {
        async fn transform(&self, input: &Path, output: &Path) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);

            let stem = input.file_stem().unwrap().to_str().unwrap();
            if self.fail_for.as_deref() == Some(stem) {
                bail!("simulated transform failure");
            }

            tokio::fs::write(output, b"{\"days\":[]}").await?;
            Ok(())
        }
    }

    fn fresh_dirs(name: &str) -> StagingDirs {
        let work_dir = std::env::temp_dir().join(format!("forecast_rater_pool_{name}"));
        let dirs = StagingDirs::new(&work_dir);
        dirs.create_fresh().unwrap();
        dirs
    }

    fn records(cities: &[&str]) -> Vec<RawRecord> {
        cities
            .iter()
            .map(|c| RawRecord {
                city: (*c).to_string(),
                payload: Some(json!({"forecasts": []})),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_two_workers_drain_five_items_exactly_once() {
        let dirs = fresh_dirs("drain");
        let transformer = Arc::new(CountingTransformer::new(None));
        let cities = ["A", "B", "C", "D", "E"];

        let mut completed =
            run_pool(records(&cities), transformer.clone(), &dirs, 2).await;
        completed.sort();

        // No item dropped, none delivered twice.
        assert_eq!(completed, vec!["A", "B", "C", "D", "E"]);
        assert_eq!(transformer.calls.load(Ordering::SeqCst), 5);
        for city in cities {
            assert!(dirs.normalized_path(city).exists());
        }
    }

    #[tokio::test]
    async fn test_failed_transform_drops_only_that_city() {
        let dirs = fresh_dirs("drop");
        let transformer = Arc::new(CountingTransformer::new(Some("B")));

        let mut completed =
            run_pool(records(&["A", "B", "C"]), transformer, &dirs, 2).await;
        completed.sort();

        assert_eq!(completed, vec!["A", "C"]);
        assert!(!dirs.normalized_path("B").exists());
    }

    #[tokio::test]
    async fn test_more_workers_than_items() {
        let dirs = fresh_dirs("surplus");
        let transformer = Arc::new(CountingTransformer::new(None));

        let completed = run_pool(records(&["A"]), transformer.clone(), &dirs, 4).await;

        assert_eq!(completed, vec!["A"]);
        assert_eq!(transformer.calls.load(Ordering::SeqCst), 1);
    }
}
