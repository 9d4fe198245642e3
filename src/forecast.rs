//! Data models for raw forecast payloads and normalized per-day metrics.

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Raw multi-day forecast payload for one city, as returned by the remote
/// source. Fields beyond the forecast list are ignored.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawForecast {
    pub forecasts: Vec<DayForecast>,
}

/// One forecast day with its hourly readings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DayForecast {
    pub date: String,
    #[serde(default)]
    pub hours: Vec<HourForecast>,
}

/// A single hourly reading. The source encodes the hour as a string
/// (`"0"`..`"23"`).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HourForecast {
    pub hour: String,
    pub temp: f64,
    pub condition: String,
}

impl HourForecast {
    /// Numeric hour of day, `None` if the source value is not a number.
    pub fn hour_num(&self) -> Option<u8> {
        self.hour.parse().ok()
    }
}

/// Normalized per-city record persisted by the transform stage and consumed
/// by the rate and aggregate stages. Never mutated after being written.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NormalizedRecord {
    pub days: Vec<DayMetric>,
}

/// Reduced metrics for one forecast day. A metric is `None` when the day
/// had no usable hours for it.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DayMetric {
    pub date: String,
    pub temp_avg: Option<f64>,
    pub relevant_cond_hours: Option<f64>,
}

/// Decodes a raw payload into a [`RawForecast`].
///
/// # Errors
///
/// Returns an error if the bytes do not match the expected payload shape.
pub fn parse_payload(bytes: &[u8]) -> Result<RawForecast> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Decodes a persisted [`NormalizedRecord`] from raw bytes.
///
/// # Errors
///
/// Returns an error if the bytes are not valid JSON for a record.
pub fn parse_normalized(bytes: &[u8]) -> Result<NormalizedRecord> {
    Ok(serde_json::from_slice(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_payload_minimal() {
        let payload = json!({
            "forecasts": [
                {
                    "date": "2022-05-26",
                    "hours": [
                        {"hour": "9", "temp": 17.0, "condition": "clear"},
                        {"hour": "10", "temp": 19.0, "condition": "rain"}
                    ]
                }
            ]
        });

        let parsed = parse_payload(&serde_json::to_vec(&payload).unwrap()).unwrap();
        assert_eq!(parsed.forecasts.len(), 1);
        assert_eq!(parsed.forecasts[0].date, "2022-05-26");
        assert_eq!(parsed.forecasts[0].hours.len(), 2);
        assert_eq!(parsed.forecasts[0].hours[0].hour_num(), Some(9));
    }

    #[test]
    fn test_parse_payload_ignores_extra_fields() {
        let payload = json!({
            "info": {"tzinfo": {"name": "Europe/Moscow"}},
            "forecasts": [{"date": "2022-05-26", "hours": []}]
        });

        let parsed = parse_payload(&serde_json::to_vec(&payload).unwrap()).unwrap();
        assert!(parsed.forecasts[0].hours.is_empty());
    }

    #[test]
    fn test_parse_payload_wrong_shape() {
        assert!(parse_payload(br#"{"forecasts": "not-a-list"}"#).is_err());
    }

    #[test]
    fn test_parse_normalized_with_nulls() {
        let bytes = br#"{
            "days": [
                {"date": "2022-05-26", "temp_avg": 17.5, "relevant_cond_hours": 7.0},
                {"date": "2022-05-27", "temp_avg": null, "relevant_cond_hours": null}
            ]
        }"#;

        let record = parse_normalized(bytes).unwrap();
        assert_eq!(record.days.len(), 2);
        assert_eq!(record.days[0].temp_avg, Some(17.5));
        assert!(record.days[1].temp_avg.is_none());
    }

    #[test]
    fn test_parse_normalized_invalid_bytes() {
        assert!(parse_normalized(b"not json").is_err());
    }

    #[test]
    fn test_hour_num_non_numeric() {
        let hour = HourForecast {
            hour: "noon".to_string(),
            temp: 20.0,
            condition: "clear".to_string(),
        };
        assert!(hour.hour_num().is_none());
    }
}
