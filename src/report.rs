//! Report rendering and persistence.
//!
//! Consumes the unordered ranked-row collection and persists a CSV
//! spreadsheet artifact: two lines per city, one for the per-day
//! temperatures and one for the per-day dry hours.

use anyhow::Result;
use chrono::NaiveDate;
use csv::WriterBuilder;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::rating::types::RankedRow;

/// Column and line labels for the report table.
#[derive(Debug, Clone)]
pub struct ReportSettings {
    pub city_column: String,
    pub average_column: String,
    pub rank_column: String,
    pub temp_line_label: String,
    pub cond_line_label: String,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            city_column: "City/day".to_string(),
            average_column: "Average".to_string(),
            rank_column: "Rating".to_string(),
            temp_line_label: "Temperature, avg".to_string(),
            cond_line_label: "No precipitation, hours".to_string(),
        }
    }
}

/// Report table pre-provisioned for a known number of records.
pub struct ReportTable {
    path: PathBuf,
    settings: ReportSettings,
    records_amount: usize,
}

impl ReportTable {
    pub fn new(path: impl Into<PathBuf>, settings: ReportSettings, records_amount: usize) -> Self {
        Self {
            path: path.into(),
            settings,
            records_amount,
        }
    }

    /// Fills the table with the given rows and persists it.
    ///
    /// Rows are written in rank order (ties broken by display name) so the
    /// artifact is stable across runs.
    pub fn write(&self, rows: &[RankedRow]) -> Result<()> {
        if rows.len() != self.records_amount {
            warn!(
                expected = self.records_amount,
                actual = rows.len(),
                "Report row count differs from the provisioned amount"
            );
        }

        let mut rows: Vec<&RankedRow> = rows.iter().collect();
        rows.sort_by(|a, b| a.rank.cmp(&b.rank).then_with(|| a.city.cmp(&b.city)));

        let labels = rows.first().map_or_else(Vec::new, |r| day_labels(r));
        debug!(path = %self.path.display(), days = labels.len(), "Writing report");

        // Cities can carry differing day counts; don't reject ragged lines.
        let mut writer = WriterBuilder::new().flexible(true).from_path(&self.path)?;

        let mut header = vec![self.settings.city_column.clone(), String::new()];
        header.extend(labels.iter().cloned());
        header.push(self.settings.average_column.clone());
        header.push(self.settings.rank_column.clone());
        writer.write_record(&header)?;

        for row in rows {
            let mut temp_line = vec![row.city.clone(), self.settings.temp_line_label.clone()];
            for day in &row.days {
                temp_line.push(day.temp_avg.map_or_else(String::new, |t| format!("{t:.1}")));
            }
            temp_line.push(format!("{:.1}", row.avg_temp));
            temp_line.push(row.rank.to_string());
            writer.write_record(&temp_line)?;

            let mut cond_line = vec![String::new(), self.settings.cond_line_label.clone()];
            for day in &row.days {
                cond_line.push(
                    day.relevant_cond_hours
                        .map_or_else(String::new, |h| format!("{h:.0}")),
                );
            }
            cond_line.push(format!("{:.1}", row.avg_cond_hours));
            cond_line.push(String::new());
            writer.write_record(&cond_line)?;
        }

        writer.flush()?;
        info!(path = %self.path.display(), "Report written");
        Ok(())
    }
}

/// Day column labels from the row's dates, `26-05` style. Dates that do
/// not parse are used verbatim.
fn day_labels(row: &RankedRow) -> Vec<String> {
    row.days
        .iter()
        .map(|d| {
            NaiveDate::parse_from_str(&d.date, "%Y-%m-%d")
                .map_or_else(|_| d.date.clone(), |date| date.format("%d-%m").to_string())
        })
        .collect()
}
