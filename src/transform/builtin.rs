use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::Path;

use super::Transformer;
use crate::forecast::{DayForecast, DayMetric, NormalizedRecord, RawForecast, parse_payload};
use crate::rating::utility::mean;

/// Hours of day (inclusive) considered for the per-day reduction.
const DAY_WINDOW: (u8, u8) = (9, 19);

/// Conditions without precipitation.
static DRY_CONDITIONS: &[&str] = &["clear", "partly-cloudy", "cloudy", "overcast"];

/// In-process [`Transformer`] performing the per-day reduction directly:
/// mean temperature over the 09:00–19:00 window and the count of dry hours
/// in that window.
pub struct BuiltinTransformer;

impl BuiltinTransformer {
    fn reduce_day(day: &DayForecast) -> DayMetric {
        let window: Vec<_> = day
            .hours
            .iter()
            .filter(|h| {
                h.hour_num()
                    .is_some_and(|n| n >= DAY_WINDOW.0 && n <= DAY_WINDOW.1)
            })
            .collect();

        if window.is_empty() {
            // Trailing partial days carry no usable hours; the rate stage
            // excludes null metrics from its means.
            return DayMetric {
                date: day.date.clone(),
                temp_avg: None,
                relevant_cond_hours: None,
            };
        }

        let temps: Vec<f64> = window.iter().map(|h| h.temp).collect();
        let dry_hours = window
            .iter()
            .filter(|h| DRY_CONDITIONS.contains(&h.condition.as_str()))
            .count();

        DayMetric {
            date: day.date.clone(),
            temp_avg: Some(mean(&temps)),
            relevant_cond_hours: Some(dry_hours as f64),
        }
    }

    /// Reduces a parsed payload into a normalized record.
    pub fn reduce(payload: &RawForecast) -> NormalizedRecord {
        NormalizedRecord {
            days: payload.forecasts.iter().map(Self::reduce_day).collect(),
        }
    }
}

#[async_trait]
impl Transformer for BuiltinTransformer {
    async fn transform(&self, input: &Path, output: &Path) -> Result<()> {
        let bytes = tokio::fs::read(input)
            .await
            .with_context(|| format!("failed to read raw payload {}", input.display()))?;

        let payload = parse_payload(&bytes)?;
        let record = Self::reduce(&payload);

        let json = serde_json::to_vec(&record)?;
        tokio::fs::write(output, json)
            .await
            .with_context(|| format!("failed to write normalized record {}", output.display()))?;

        Ok(())
    }
}
