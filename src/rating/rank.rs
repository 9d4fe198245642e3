//! Rank stage: order cities by score, resolve ties, build report rows.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{Instrument, error, warn};

use super::types::{RankedRow, ScoreEntry};
use crate::cities;
use crate::forecast::parse_normalized;

/// All scores sorted descending. A city's rank is one plus the first
/// position of its score, so tied scores share the rank of the
/// first-sorted entry.
#[derive(Debug)]
pub struct RankTable {
    sorted: Vec<i64>,
}

impl RankTable {
    pub fn new(scores: &HashMap<String, ScoreEntry>) -> Self {
        let mut sorted: Vec<i64> = scores.values().map(|e| e.score).collect();
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        Self { sorted }
    }

    /// 1-based rank of a score, `None` if the score is not in the table.
    pub fn rank_of(&self, score: i64) -> Option<usize> {
        self.sorted.iter().position(|&s| s == score).map(|i| i + 1)
    }

    pub fn top_score(&self) -> Option<i64> {
        self.sorted.first().copied()
    }
}

/// Display names of every city sharing the maximum score, sorted for a
/// stable answer.
pub fn most_favorable(scores: &HashMap<String, ScoreEntry>) -> Vec<String> {
    let table = RankTable::new(scores);
    let Some(top) = table.top_score() else {
        return Vec::new();
    };

    let mut names: Vec<String> = scores
        .values()
        .filter(|e| e.score == top)
        .map(|e| cities::display_name(&e.city).to_string())
        .collect();
    names.sort();
    names
}

/// Builds one [`RankedRow`] per scored city by pairing its normalized
/// record with its score and rank, one bounded task per city.
///
/// A city whose record can no longer be read is excluded rather than
/// emitted as a partial row. The returned collection is unordered.
#[tracing::instrument(skip(normalized_dir, scores), fields(city_count = scores.len(), concurrency))]
pub async fn build_rows(
    normalized_dir: &Path,
    scores: &HashMap<String, ScoreEntry>,
    concurrency: usize,
) -> Vec<RankedRow> {
    let table = Arc::new(RankTable::new(scores));
    let semaphore = Arc::new(tokio::sync::Semaphore::new(concurrency.max(1)));

    let mut tasks = Vec::with_capacity(scores.len());
    for entry in scores.values() {
        let sem = semaphore.clone();
        let table = table.clone();
        let entry = entry.clone();
        let path = normalized_dir.join(format!("{}.json", entry.city));

        let city_span = tracing::info_span!("build_row", city = %entry.city);

        tasks.push(tokio::spawn(
            async move {
                let _permit = sem.acquire().await.expect("semaphore closed");

                let city = entry.city.clone();
                (city, build_row(&entry, &path, &table).await)
            }
            .instrument(city_span),
        ));
    }

    let mut rows = Vec::with_capacity(scores.len());
    for task in tasks {
        match task.await {
            Ok((_, Ok(row))) => rows.push(row),
            Ok((city, Err(e))) => {
                warn!(city = %city, error = %e, "City excluded from report");
            }
            Err(e) => error!(error = %e, "Row task aborted"),
        }
    }

    rows
}

async fn build_row(entry: &ScoreEntry, path: &Path, table: &RankTable) -> Result<RankedRow> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read normalized record {}", path.display()))?;
    let record = parse_normalized(&bytes)?;

    let rank = table
        .rank_of(entry.score)
        .context("score missing from rank table")?;

    Ok(RankedRow {
        city: cities::display_name(&entry.city).to_string(),
        days: record.days,
        avg_temp: entry.avg_temp,
        avg_cond_hours: entry.avg_cond_hours,
        score: entry.score,
        rank,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(city: &str, score: i64) -> (String, ScoreEntry) {
        (
            city.to_string(),
            ScoreEntry {
                city: city.to_string(),
                avg_temp: 0.0,
                avg_cond_hours: 0.0,
                score,
            },
        )
    }

    #[test]
    fn test_tied_scores_share_first_match_rank() {
        let scores: HashMap<_, _> =
            [entry("A", 50), entry("B", 80), entry("C", 80)].into();
        let table = RankTable::new(&scores);

        assert_eq!(table.rank_of(80), Some(1));
        assert_eq!(table.rank_of(50), Some(3));
        assert_eq!(table.top_score(), Some(80));
    }

    #[test]
    fn test_rank_is_one_plus_count_of_strictly_greater() {
        let scores: HashMap<_, _> = [
            entry("A", 90),
            entry("B", 70),
            entry("C", 70),
            entry("D", 70),
            entry("E", 10),
        ]
        .into();
        let table = RankTable::new(&scores);

        assert_eq!(table.rank_of(70), Some(2));
        assert_eq!(table.rank_of(10), Some(5));
    }

    #[test]
    fn test_rank_of_unknown_score() {
        let scores: HashMap<_, _> = [entry("A", 50)].into();
        let table = RankTable::new(&scores);
        assert_eq!(table.rank_of(99), None);
    }

    #[test]
    fn test_most_favorable_includes_all_tied_cities() {
        let scores: HashMap<_, _> =
            [entry("A", 50), entry("B", 80), entry("C", 80)].into();

        assert_eq!(most_favorable(&scores), vec!["B", "C"]);
    }

    #[test]
    fn test_most_favorable_empty_scores() {
        let scores = HashMap::new();
        assert!(most_favorable(&scores).is_empty());
    }

    #[test]
    fn test_most_favorable_uses_display_names() {
        let scores: HashMap<_, _> = [entry("SPETERSBURG", 42)].into();
        assert_eq!(most_favorable(&scores), vec!["Saint Petersburg"]);
    }

    #[tokio::test]
    async fn test_build_rows_ranks_within_bounds() {
        let dir = std::env::temp_dir().join("forecast_rater_build_rows");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();

        let record =
            br#"{"days": [{"date": "2022-05-26", "temp_avg": 20.0, "relevant_cond_hours": 5.0}]}"#;
        for city in ["A", "B", "C"] {
            std::fs::write(dir.join(format!("{city}.json")), record).unwrap();
        }

        let scores: HashMap<_, _> =
            [entry("A", 50), entry("B", 80), entry("C", 80)].into();

        let rows = build_rows(&dir, &scores, 4).await;

        assert_eq!(rows.len(), 3);
        for row in &rows {
            assert!(row.rank >= 1 && row.rank <= 3);
        }
        let a = rows.iter().find(|r| r.city == "A").unwrap();
        assert_eq!(a.rank, 3);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_build_rows_excludes_missing_record() {
        let dir = std::env::temp_dir().join("forecast_rater_build_rows_missing");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();

        std::fs::write(
            dir.join("A.json"),
            br#"{"days": [{"date": "2022-05-26", "temp_avg": 20.0, "relevant_cond_hours": 5.0}]}"#,
        )
        .unwrap();

        // B was scored but its record file is gone.
        let scores: HashMap<_, _> = [entry("A", 50), entry("B", 80)].into();

        let rows = build_rows(&dir, &scores, 2).await;

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].city, "A");

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
