//! Data types produced by the rate and rank stages.

use crate::forecast::DayMetric;

/// Favorability score for one city. `avg_temp` and `avg_cond_hours` are
/// rounded to one decimal; `score` is their rounded product.
#[derive(Debug, Clone)]
pub struct ScoreEntry {
    pub city: String,
    pub avg_temp: f64,
    pub avg_cond_hours: f64,
    pub score: i64,
}

/// One final report line: display name, the per-day metrics, the averages,
/// and the 1-based tie-resolved rank.
#[derive(Debug, Clone)]
pub struct RankedRow {
    pub city: String,
    pub days: Vec<DayMetric>,
    pub avg_temp: f64,
    pub avg_cond_hours: f64,
    pub score: i64,
    pub rank: usize,
}
