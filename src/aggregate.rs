//! The transform stage: production, telemetry, and weather in, one
//! denormalized [`DailyMetric`] row per (date, mine) out.
//!
//! Everything here is pure (no I/O beyond logging) and total: once the
//! sources are parsed into typed records the transform cannot fail, so the
//! caller distinguishes an empty-but-valid run from a failed one through the
//! pipeline's `Result`, not through logs.
//!
//! Date-level aggregates (`equipment_utilization`, `fuel_efficiency`,
//! rainfall) are broadcast across every mine sharing the date: the sensor
//! and weather sources are not keyed by mine. Utilization is first computed
//! per (date, equipment) and then averaged across equipment so the date-only
//! join stays one-to-one.

use std::collections::{BTreeMap, HashMap, VecDeque};

use chrono::NaiveDate;

use crate::models::{DailyMetric, ProductionRecord, SensorRecord, WeatherRecord};

// ---

/// Trailing window size for the production rolling mean.
const ROLLING_WINDOW: usize = 3;

/// Running totals for one (date, mine) production group.
#[derive(Default)]
struct ProductionGroup {
    // ---
    tons: f64,
    quality_sum: f64,
    count: u32,
}

/// Status tally for one (date, equipment) telemetry group.
#[derive(Default)]
struct StatusCounts {
    // ---
    active: u32,
    total: u32,
}

// ---

/// Compute the full daily metrics set.
///
/// Returns rows in date-ascending order (mine-ascending within a date).
/// Empty production input yields an empty output.
pub fn compute_daily_metrics(
    production: &[ProductionRecord],
    sensors: &[SensorRecord],
    weather: &[WeatherRecord],
) -> Vec<DailyMetric> {
    // ---
    if production.is_empty() {
        return Vec::new();
    }

    // Group production by (date, mine): clamped tonnage sum and quality mean.
    // Negative tonnage counts as zero, the row itself is never discarded.
    let mut by_date_mine: BTreeMap<(NaiveDate, u32), ProductionGroup> = BTreeMap::new();
    let mut tons_by_date: HashMap<NaiveDate, f64> = HashMap::new();
    for record in production {
        let tons = record.tons_extracted.max(0.0);
        let group = by_date_mine
            .entry((record.date, record.mine_id))
            .or_default();
        group.tons += tons;
        group.quality_sum += record.quality_grade;
        group.count += 1;
        *tons_by_date.entry(record.date).or_default() += tons;
    }

    // Telemetry: derive the date from each timestamp, dropping rows that do
    // not parse, then tally per (date, equipment) and fuel per date.
    let mut by_date_equipment: HashMap<(NaiveDate, String), StatusCounts> = HashMap::new();
    let mut fuel_by_date: HashMap<NaiveDate, f64> = HashMap::new();
    let mut dropped = 0usize;
    for sensor in sensors {
        let Some(date) = sensor.observation_date() else {
            dropped += 1;
            continue;
        };
        let counts = by_date_equipment
            .entry((date, sensor.equipment_id.clone()))
            .or_default();
        if sensor.is_active() {
            counts.active += 1;
        }
        counts.total += 1;
        *fuel_by_date.entry(date).or_default() += sensor.fuel_consumption;
    }
    if dropped > 0 {
        tracing::warn!("Dropped {dropped} sensor rows with unparsable timestamps");
    }

    let utilization_by_date = utilization_per_date(&by_date_equipment);
    let rainfall_by_date: HashMap<NaiveDate, f64> = weather
        .iter()
        .map(|w| (w.date, w.precipitation_sum))
        .collect();

    // Assemble: production is the base, everything else left-joins onto it.
    let mut rows = Vec::with_capacity(by_date_mine.len());
    for ((date, mine_id), group) in by_date_mine {
        let fuel_efficiency = fuel_by_date.get(&date).and_then(|fuel| {
            let tons = tons_by_date[&date];
            (tons > 0.0).then(|| fuel / tons)
        });

        rows.push(DailyMetric {
            date,
            mine_id,
            total_production_daily: group.tons,
            average_quality_grade: group.quality_sum / f64::from(group.count),
            equipment_utilization: utilization_by_date.get(&date).copied(),
            fuel_efficiency,
            rainfall_mm: rainfall_by_date.get(&date).copied().unwrap_or(0.0),
            weather_impact: 0.0,
        });
    }

    apply_weather_impact(&mut rows);

    tracing::info!("Computed {} daily metric rows", rows.len());
    rows
}

// ---

/// One utilization percentage per date: the per-(date, equipment) active
/// ratio, averaged across all equipment reporting that date.
fn utilization_per_date(
    by_date_equipment: &HashMap<(NaiveDate, String), StatusCounts>,
) -> HashMap<NaiveDate, f64> {
    // ---
    let mut sums: HashMap<NaiveDate, (f64, u32)> = HashMap::new();
    for ((date, _), counts) in by_date_equipment {
        let pct = f64::from(counts.active) / f64::from(counts.total) * 100.0;
        let entry = sums.entry(*date).or_default();
        entry.0 += pct;
        entry.1 += 1;
    }

    sums.into_iter()
        .map(|(date, (pct_sum, n))| (date, pct_sum / f64::from(n)))
        .collect()
}

/// Fill in `weather_impact` over the date-ordered rows.
///
/// The trailing rolling mean of `total_production_daily` (window 3, minimum
/// one sample) runs over the final row sequence as-is; when several mines
/// share a date their rows all enter the window. The impact is the deviation
/// from that mean on days with nonzero rainfall, zero otherwise.
fn apply_weather_impact(rows: &mut [DailyMetric]) {
    // ---
    let mut window: VecDeque<f64> = VecDeque::with_capacity(ROLLING_WINDOW);
    for row in rows {
        window.push_back(row.total_production_daily);
        if window.len() > ROLLING_WINDOW {
            window.pop_front();
        }

        let rolling_mean = window.iter().sum::<f64>() / window.len() as f64;
        row.weather_impact = if row.rainfall_mm > 0.0 {
            row.total_production_daily - rolling_mean
        } else {
            0.0
        };
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    const EPS: f64 = 1e-9;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, day).unwrap()
    }

    fn production(day: u32, mine_id: u32, shift: &str, tons: f64, quality: f64) -> ProductionRecord {
        // ---
        ProductionRecord {
            date: date(day),
            mine_id,
            shift: shift.to_string(),
            tons_extracted: tons,
            quality_grade: quality,
        }
    }

    fn sensor(day: u32, equipment_id: &str, status: &str, fuel: f64) -> SensorRecord {
        // ---
        SensorRecord {
            timestamp: format!("2025-05-{day:02} 08:00:00"),
            equipment_id: equipment_id.to_string(),
            status: status.to_string(),
            fuel_consumption: fuel,
        }
    }

    fn weather(day: u32, precipitation: f64) -> WeatherRecord {
        // ---
        WeatherRecord {
            date: date(day),
            temperature_mean: 27.0,
            precipitation_sum: precipitation,
        }
    }

    #[test]
    fn test_end_to_end_scenario() {
        // ---
        // Two shifts at mine 1, three sensor readings (two active), dry day.
        let production = vec![
            production(12, 1, "A", 100.0, 3.5),
            production(12, 1, "B", 50.0, 4.0),
        ];
        let sensors = vec![
            sensor(12, "EXC-01", "active", 40.0),
            sensor(12, "EXC-02", "active", 35.0),
            sensor(12, "EXC-03", "inactive", 0.0),
        ];
        let rows = compute_daily_metrics(&production, &sensors, &[weather(12, 0.0)]);

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.date, date(12));
        assert_eq!(row.mine_id, 1);
        assert!((row.total_production_daily - 150.0).abs() < EPS);
        assert!((row.average_quality_grade - 3.75).abs() < EPS);
        assert!((row.equipment_utilization.unwrap() - 66.6666666667).abs() < 0.01);
        assert!((row.fuel_efficiency.unwrap() - 0.5).abs() < EPS);
        assert_eq!(row.rainfall_mm, 0.0);
        assert_eq!(row.weather_impact, 0.0);
    }

    #[test]
    fn test_empty_production_yields_no_rows() {
        // ---
        let sensors = vec![sensor(12, "EXC-01", "active", 40.0)];
        assert!(compute_daily_metrics(&[], &sensors, &[]).is_empty());
    }

    #[test]
    fn test_negative_tonnage_clamps_to_zero() {
        // ---
        let rows = compute_daily_metrics(
            &[
                production(12, 1, "A", -30.0, 2.0),
                production(12, 1, "B", 80.0, 4.0),
            ],
            &[],
            &[],
        );

        // -30 contributes 0, never a negative amount
        assert!((rows[0].total_production_daily - 80.0).abs() < EPS);
        // Quality still averages over both rows
        assert!((rows[0].average_quality_grade - 3.0).abs() < EPS);
    }

    #[test]
    fn test_utilization_averages_across_equipment() {
        // ---
        // EXC-01: 1 of 2 active (50%), EXC-02: 1 of 1 active (100%) -> 75%
        let sensors = vec![
            sensor(12, "EXC-01", "active", 10.0),
            sensor(12, "EXC-01", "idle", 10.0),
            sensor(12, "EXC-02", "active", 10.0),
        ];
        let rows = compute_daily_metrics(&[production(12, 1, "A", 10.0, 3.0)], &sensors, &[]);

        assert!((rows[0].equipment_utilization.unwrap() - 75.0).abs() < EPS);
    }

    #[test]
    fn test_unparsable_timestamps_are_dropped() {
        // ---
        let mut bad = sensor(12, "EXC-01", "inactive", 99.0);
        bad.timestamp = "yesterday-ish".to_string();
        let sensors = vec![bad, sensor(12, "EXC-02", "active", 10.0)];

        let rows = compute_daily_metrics(&[production(12, 1, "A", 10.0, 3.0)], &sensors, &[]);

        // Only the parseable active row counts: 100% utilization, its fuel only
        assert!((rows[0].equipment_utilization.unwrap() - 100.0).abs() < EPS);
        assert!((rows[0].fuel_efficiency.unwrap() - 1.0).abs() < EPS);
    }

    #[test]
    fn test_no_sensor_data_leaves_nulls() {
        // ---
        let rows = compute_daily_metrics(&[production(12, 1, "A", 10.0, 3.0)], &[], &[]);
        assert_eq!(rows[0].equipment_utilization, None);
        assert_eq!(rows[0].fuel_efficiency, None);
    }

    #[test]
    fn test_fuel_efficiency_undefined_when_tons_zero() {
        // ---
        let rows = compute_daily_metrics(
            &[production(12, 1, "A", -5.0, 3.0)],
            &[sensor(12, "EXC-01", "active", 40.0)],
            &[],
        );
        assert_eq!(rows[0].fuel_efficiency, None);
    }

    #[test]
    fn test_rainfall_defaults_to_zero_without_weather_match() {
        // ---
        let rows = compute_daily_metrics(
            &[production(12, 1, "A", 10.0, 3.0), production(13, 1, "A", 20.0, 3.0)],
            &[],
            &[weather(13, 4.2)],
        );

        assert_eq!(rows[0].rainfall_mm, 0.0);
        assert_eq!(rows[1].rainfall_mm, 4.2);
    }

    #[test]
    fn test_weather_impact_rolling_deviation() {
        // ---
        let production = vec![
            production(12, 1, "A", 100.0, 3.0),
            production(13, 1, "A", 200.0, 3.0),
            production(14, 1, "A", 300.0, 3.0),
            production(15, 1, "A", 400.0, 3.0),
        ];
        let weather = vec![
            weather(12, 5.0),
            weather(13, 5.0),
            weather(14, 0.0),
            weather(15, 5.0),
        ];
        let rows = compute_daily_metrics(&production, &[], &weather);

        // Day 1: window {100}, deviation 0 even though it rained
        assert!((rows[0].weather_impact - 0.0).abs() < EPS);
        // Day 2: window {100, 200}, mean 150 -> +50
        assert!((rows[1].weather_impact - 50.0).abs() < EPS);
        // Day 3: dry -> exactly 0 regardless of deviation
        assert_eq!(rows[2].weather_impact, 0.0);
        // Day 4: window {200, 300, 400}, mean 300 -> +100
        assert!((rows[3].weather_impact - 100.0).abs() < EPS);
    }

    #[test]
    fn test_date_level_aggregates_broadcast_across_mines() {
        // ---
        let production = vec![
            production(12, 1, "A", 100.0, 3.0),
            production(12, 2, "A", 50.0, 4.0),
        ];
        let sensors = vec![
            sensor(12, "EXC-01", "active", 30.0),
            sensor(12, "EXC-02", "inactive", 15.0),
        ];
        let rows = compute_daily_metrics(&production, &sensors, &[]);

        assert_eq!(rows.len(), 2);
        // Same date-level utilization and fuel efficiency on both mine rows;
        // fuel efficiency divides by tonnage across all mines (45 / 150)
        for row in &rows {
            assert!((row.equipment_utilization.unwrap() - 50.0).abs() < EPS);
            assert!((row.fuel_efficiency.unwrap() - 0.3).abs() < EPS);
        }
        // Rows are date-ascending, mine-ascending within the date
        assert_eq!((rows[0].mine_id, rows[1].mine_id), (1, 2));
    }

    #[test]
    fn test_rolling_window_mixes_mines_sharing_a_date() {
        // ---
        // Two mines on day 12, one on day 13: the day-13 window holds all
        // three rows, in output order.
        let production = vec![
            production(12, 1, "A", 100.0, 3.0),
            production(12, 2, "A", 200.0, 3.0),
            production(13, 1, "A", 300.0, 3.0),
        ];
        let weather = vec![weather(13, 8.0)];
        let rows = compute_daily_metrics(&production, &[], &weather);

        // mean(100, 200, 300) = 200 -> impact +100 on the rainy day
        assert!((rows[2].weather_impact - 100.0).abs() < EPS);
    }
}
