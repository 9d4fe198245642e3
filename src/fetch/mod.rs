//! Parallel retrieval of raw forecast payloads.
//!
//! One bounded task per city; a city's fetch failure yields an absent
//! payload and never aborts the batch. The stage returns only after every
//! city has been attempted.

mod http;
mod source;

pub use http::HttpSource;
pub use source::ForecastSource;

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Instrument, debug, error, warn};

/// Raw fetch result for one city. `payload: None` marks a failed fetch.
#[derive(Debug, Clone)]
pub struct RawRecord {
    pub city: String,
    pub payload: Option<Value>,
}

/// Default parallelism for the I/O-bound stages: hardware concurrency
/// plus headroom, since tasks spend most of their time suspended.
pub fn default_concurrency() -> usize {
    std::thread::available_parallelism().map_or(8, |n| n.get() + 4)
}

/// Fetches raw payloads for every city, at most `concurrency` in flight.
///
/// Completion order is unspecified. Every city appears exactly once in the
/// result; failed fetches carry an absent payload.
#[tracing::instrument(skip(source, cities), fields(city_count = cities.len(), concurrency))]
pub async fn fetch_all<S: ForecastSource + 'static>(
    source: Arc<S>,
    cities: &[String],
    concurrency: usize,
) -> Vec<RawRecord> {
    let semaphore = Arc::new(tokio::sync::Semaphore::new(concurrency.max(1)));

    let mut tasks = Vec::with_capacity(cities.len());

    for city in cities {
        let sem = semaphore.clone();
        let source = source.clone();
        let city = city.clone();

        let city_span = tracing::info_span!("fetch_city", city = %city);
        let join_city = city.clone();

        let task = tokio::spawn(
            async move {
                let _permit = sem.acquire().await.expect("semaphore closed");

                match source.fetch(&city).await {
                    Ok(payload) => {
                        debug!("Payload fetched");
                        RawRecord {
                            city,
                            payload: Some(payload),
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "City fetch failed");
                        RawRecord {
                            city,
                            payload: None,
                        }
                    }
                }
            }
            .instrument(city_span),
        );

        tasks.push((join_city, task));
    }

    let mut records = Vec::with_capacity(cities.len());
    for (city, task) in tasks {
        match task.await {
            Ok(record) => records.push(record),
            Err(e) => {
                error!(city = %city, error = %e, "Fetch task aborted");
                records.push(RawRecord {
                    city,
                    payload: None,
                });
            }
        }
    }

    records
}

/// Probes a URL once to confirm connectivity before the pipeline starts.
pub async fn connectivity_ok(probe_url: &str) -> bool {
    let client = match reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
    {
        Ok(client) => client,
        Err(_) => return false,
    };

    client.get(probe_url).send().await.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use async_trait::async_trait;
    use serde_json::json;

    struct StubSource;

    #[async_trait]
    impl ForecastSource for StubSource {
        async fn fetch(&self, city: &str) -> anyhow::Result<Value> {
            if city == "BROKEN" {
                bail!("simulated remote error");
            }
            Ok(json!({"forecasts": []}))
        }
    }

    #[tokio::test]
    async fn test_fetch_all_attempts_every_city() {
        let cities = vec![
            "MOSCOW".to_string(),
            "BROKEN".to_string(),
            "PARIS".to_string(),
        ];

        let records = fetch_all(Arc::new(StubSource), &cities, 2).await;

        assert_eq!(records.len(), 3);
        let broken = records.iter().find(|r| r.city == "BROKEN").unwrap();
        assert!(broken.payload.is_none());
        let ok = records.iter().filter(|r| r.payload.is_some()).count();
        assert_eq!(ok, 2);
    }

    #[tokio::test]
    async fn test_fetch_all_one_failure_does_not_abort_others() {
        let cities: Vec<String> = (0..10)
            .map(|i| if i == 4 { "BROKEN".into() } else { format!("C{i}") })
            .collect();

        let records = fetch_all(Arc::new(StubSource), &cities, 3).await;

        let present = records.iter().filter(|r| r.payload.is_some()).count();
        assert_eq!(present, 9);
    }

    #[test]
    fn test_default_concurrency_positive() {
        assert!(default_concurrency() >= 1);
    }
}
