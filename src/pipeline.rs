//! Orchestrator for the daily production metrics run.
//!
//! Sequences the stages strictly forward: parse the production dump, load
//! the sensor telemetry, await the one weather fetch for the discovered date
//! range, run the transform, then hand the finished rows to the sink. Source
//! file problems surface before any network or destination I/O happens, and
//! every failure reaches the caller as a typed [`PipelineError`] so a
//! scheduler can tell a failed run from an empty one.

use std::path::Path;

use chrono::NaiveDate;

use crate::error::{PipelineError, Result};
use crate::models::ProductionRecord;
use crate::sink::MetricsSink;
use crate::weather::WeatherClient;
use crate::{aggregate, log_parser, sensor_loader};

// ---

/// One ETL run: two input files in, upserted metric rows out.
pub struct Pipeline {
    // ---
    weather: WeatherClient,
    sink: Box<dyn MetricsSink>,
    metrics_table: String,
}

impl Pipeline {
    pub fn new(weather: WeatherClient, sink: Box<dyn MetricsSink>, metrics_table: String) -> Self {
        // ---
        Self {
            weather,
            sink,
            metrics_table,
        }
    }

    /// Execute the full extract-transform-load sequence.
    ///
    /// Returns the number of rows written. An empty production dump is a
    /// valid run that writes nothing and returns `Ok(0)`.
    pub async fn run(&mut self, production_dump: &Path, sensors_csv: &Path) -> Result<usize> {
        // ---
        let production = log_parser::load_production_dump(production_dump)?;

        let Some((start, end)) = date_range(&production) else {
            tracing::info!("No production data found; nothing to load");
            return Ok(0);
        };

        let sensors = sensor_loader::load_sensor_csv(sensors_csv)?;

        // The single suspension point of the run: the transform needs the
        // full weather set before it can merge on date.
        let weather = self.weather.fetch_range(start, end).await;

        let rows = aggregate::compute_daily_metrics(&production, &sensors, &weather);

        self.sink.connect().await.map_err(PipelineError::Sink)?;
        let inserted = self
            .sink
            .insert(&rows, &self.metrics_table)
            .await
            .map_err(PipelineError::Sink);
        if let Err(e) = self.sink.close().await {
            tracing::warn!("Sink close failed: {e:#}");
        }
        inserted?;

        Ok(rows.len())
    }
}

/// Inclusive (min, max) date span of the production data, used to
/// parameterize the weather fetch.
fn date_range(production: &[ProductionRecord]) -> Option<(NaiveDate, NaiveDate)> {
    // ---
    let start = production.iter().map(|r| r.date).min()?;
    let end = production.iter().map(|r| r.date).max()?;
    Some((start, end))
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    fn record(day: u32) -> ProductionRecord {
        // ---
        ProductionRecord {
            date: NaiveDate::from_ymd_opt(2025, 5, day).unwrap(),
            mine_id: 1,
            shift: "A".to_string(),
            tons_extracted: 10.0,
            quality_grade: 3.0,
        }
    }

    #[test]
    fn test_date_range_spans_min_to_max() {
        // ---
        let production = vec![record(14), record(12), record(13)];
        assert_eq!(
            date_range(&production),
            Some((
                NaiveDate::from_ymd_opt(2025, 5, 12).unwrap(),
                NaiveDate::from_ymd_opt(2025, 5, 14).unwrap()
            ))
        );
    }

    #[test]
    fn test_date_range_empty_is_none() {
        // ---
        assert_eq!(date_range(&[]), None);
    }
}
